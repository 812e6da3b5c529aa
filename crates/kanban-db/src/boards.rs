use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use kanban_types::board::CardDoc;
use kanban_types::models::BoardSummary;

use crate::guard::{require_member, require_owner};
use crate::queries::{query_board_card, query_user_by_id, query_user_by_username, query_usernames};
use crate::{BoardError, BoardResult, DEFAULT_COLUMNS, Database};

impl Database {
    /// Create a board owned by `owner_id`, with the owner as its first member
    /// and the default columns at positions 0..5.
    pub fn create_board(&self, title: &str, owner_id: &str) -> BoardResult<BoardSummary> {
        let summary = self.with_tx(|tx| {
            let owner = query_user_by_id(tx, owner_id)?.ok_or(BoardError::NotFound("User"))?;
            let board_id = Uuid::new_v4().to_string();

            tx.execute(
                "INSERT INTO boards (id, title, owner_id) VALUES (?1, ?2, ?3)",
                (&board_id, title, owner_id),
            )?;
            tx.execute(
                "INSERT INTO board_members (board_id, user_id) VALUES (?1, ?2)",
                (&board_id, owner_id),
            )?;

            for (position, column_title) in DEFAULT_COLUMNS.iter().enumerate() {
                tx.execute(
                    "INSERT INTO kanban_columns (id, board_id, title, position) VALUES (?1, ?2, ?3, ?4)",
                    (Uuid::new_v4().to_string(), &board_id, column_title, position as i64),
                )?;
            }

            Ok(BoardSummary {
                id: board_id,
                title: title.to_string(),
                owner_username: owner.username,
            })
        })?;

        info!(board_id = %summary.id, owner = %summary.owner_username, "Board created");
        Ok(summary)
    }

    /// Delete a board with all of its columns, cards and memberships. Owner only.
    pub fn delete_board(&self, board_id: &str, user_id: &str) -> BoardResult<()> {
        self.with_tx(|tx| {
            require_owner(tx, board_id, user_id)?;
            delete_board_rows(tx, board_id)
        })?;

        info!(board_id, "Board deleted");
        Ok(())
    }

    /// Boards `user_id` is a member of, with owner names, ordered by title.
    pub fn list_boards(&self, user_id: &str) -> BoardResult<Vec<BoardSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT b.id, b.title, u.username
                 FROM boards b
                 JOIN board_members m ON m.board_id = b.id
                 JOIN users u ON u.id = b.owner_id
                 WHERE m.user_id = ?1
                 ORDER BY b.title, b.id",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(BoardSummary {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        owner_username: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Set or clear (`username = None`) the assignee of a card on `board_id`.
    /// Requires membership; returns the card with creator and assignee resolved.
    pub fn assign_card(
        &self,
        board_id: &str,
        card_id: &str,
        username: Option<&str>,
        user_id: &str,
    ) -> BoardResult<CardDoc> {
        self.with_tx(|tx| {
            require_member(tx, board_id, user_id)?;
            let card = query_board_card(tx, board_id, card_id)?.ok_or(BoardError::NotFound("Card"))?;

            let assignee_id = match username {
                Some(name) => Some(
                    query_user_by_username(tx, name)?
                        .ok_or(BoardError::NotFound("User"))?
                        .id,
                ),
                None => None,
            };

            tx.execute(
                "UPDATE kanban_cards SET assigned_to_id = ?1 WHERE id = ?2",
                (&assignee_id, card_id),
            )?;

            let ids: Vec<&str> = [card.created_by_id.as_deref(), assignee_id.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            let names = query_usernames(tx, &ids)?;

            Ok(CardDoc {
                created_by: card.created_by_id.as_ref().and_then(|id| names.get(id).cloned()),
                assigned_to: assignee_id.as_ref().and_then(|id| names.get(id).cloned()),
                id: card.id,
                title: card.title,
                details: card.details,
            })
        })
    }
}

/// Explicit cascade in dependency order: cards, columns, memberships, board.
fn delete_board_rows(conn: &Connection, board_id: &str) -> BoardResult<()> {
    conn.execute(
        "DELETE FROM kanban_cards
         WHERE column_id IN (SELECT id FROM kanban_columns WHERE board_id = ?1)",
        [board_id],
    )?;
    conn.execute("DELETE FROM kanban_columns WHERE board_id = ?1", [board_id])?;
    conn.execute("DELETE FROM board_members WHERE board_id = ?1", [board_id])?;
    conn.execute("DELETE FROM boards WHERE id = ?1", [board_id])?;
    Ok(())
}
