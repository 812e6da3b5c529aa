use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::{BoardRow, CardRow, ColumnRow, UserRow};
use crate::{BoardResult, Database};

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password: &str) -> BoardResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> BoardResult<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn count_users(&self) -> BoardResult<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
    })
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<CardRow> {
    Ok(CardRow {
        id: row.get(0)?,
        column_id: row.get(1)?,
        title: row.get(2)?,
        details: row.get(3)?,
        position: row.get(4)?,
        created_by_id: row.get(5)?,
        assigned_to_id: row.get(6)?,
    })
}

pub(crate) fn query_user_by_username(conn: &Connection, username: &str) -> BoardResult<Option<UserRow>> {
    let row = conn
        .query_row(
            "SELECT id, username, password FROM users WHERE username = ?1",
            [username],
            user_from_row,
        )
        .optional()?;

    Ok(row)
}

pub(crate) fn query_user_by_id(conn: &Connection, id: &str) -> BoardResult<Option<UserRow>> {
    let row = conn
        .query_row(
            "SELECT id, username, password FROM users WHERE id = ?1",
            [id],
            user_from_row,
        )
        .optional()?;

    Ok(row)
}

pub(crate) fn query_board(conn: &Connection, board_id: &str) -> BoardResult<Option<BoardRow>> {
    let row = conn
        .query_row(
            "SELECT id, title, owner_id FROM boards WHERE id = ?1",
            [board_id],
            |row| {
                Ok(BoardRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    owner_id: row.get(2)?,
                })
            },
        )
        .optional()?;

    Ok(row)
}

pub(crate) fn query_is_member(conn: &Connection, board_id: &str, user_id: &str) -> BoardResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM board_members WHERE board_id = ?1 AND user_id = ?2",
            [board_id, user_id],
            |_| Ok(()),
        )
        .optional()?;

    Ok(found.is_some())
}

pub(crate) fn query_columns(conn: &Connection, board_id: &str) -> BoardResult<Vec<ColumnRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, position FROM kanban_columns
         WHERE board_id = ?1
         ORDER BY position, id",
    )?;

    let rows = stmt
        .query_map([board_id], |row| {
            Ok(ColumnRow {
                id: row.get(0)?,
                title: row.get(1)?,
                position: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// All cards whose column belongs to `board_id`, ordered by position.
pub(crate) fn query_board_cards(conn: &Connection, board_id: &str) -> BoardResult<Vec<CardRow>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.column_id, c.title, c.details, c.position, c.created_by_id, c.assigned_to_id
         FROM kanban_cards c
         JOIN kanban_columns col ON c.column_id = col.id
         WHERE col.board_id = ?1
         ORDER BY c.position, c.id",
    )?;

    let rows = stmt
        .query_map([board_id], card_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub(crate) fn query_board_card(
    conn: &Connection,
    board_id: &str,
    card_id: &str,
) -> BoardResult<Option<CardRow>> {
    let row = conn
        .query_row(
            "SELECT c.id, c.column_id, c.title, c.details, c.position, c.created_by_id, c.assigned_to_id
             FROM kanban_cards c
             JOIN kanban_columns col ON c.column_id = col.id
             WHERE col.board_id = ?1 AND c.id = ?2",
            [board_id, card_id],
            card_from_row,
        )
        .optional()?;

    Ok(row)
}

/// Batch-resolve user ids to usernames. Unknown ids are absent from the map.
pub(crate) fn query_usernames(conn: &Connection, user_ids: &[&str]) -> BoardResult<HashMap<String, String>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=user_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT id, username FROM users WHERE id IN ({})",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn ToSql> = user_ids.iter().map(|id| id as &dyn ToSql).collect();

    let map = stmt
        .query_map(params.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<HashMap<String, String>, _>>()?;

    Ok(map)
}
