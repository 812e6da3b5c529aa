//! Conversion between the normalized column/card tables and the nested
//! [`BoardDocument`] clients read and write.

use std::collections::{BTreeMap, HashMap, HashSet};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use kanban_types::board::{BoardDocument, CardDoc, ColumnDoc};

use crate::guard::require_member;
use crate::queries::{query_board_cards, query_columns, query_usernames};
use crate::{BoardError, BoardResult, Database};

/// Row counts touched by one [`reconcile`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub columns_inserted: usize,
    pub columns_updated: usize,
    pub columns_deleted: usize,
    pub cards_inserted: usize,
    pub cards_updated: usize,
    pub cards_deleted: usize,
}

impl Database {
    /// Read a board as a document. Requires membership.
    pub fn get_board_document(&self, board_id: &str, user_id: &str) -> BoardResult<BoardDocument> {
        self.with_tx(|tx| {
            require_member(tx, board_id, user_id)?;
            project_board(tx, board_id)
        })
    }

    /// Replace a board's structure with `doc` and return the stored result.
    /// Requires membership. Guard, write and read-back share one transaction.
    pub fn replace_board(
        &self,
        board_id: &str,
        user_id: &str,
        doc: &BoardDocument,
    ) -> BoardResult<BoardDocument> {
        self.with_tx(|tx| {
            require_member(tx, board_id, user_id)?;
            let stats = reconcile(tx, board_id, doc, user_id)?;
            info!(board_id, ?stats, "Board reconciled");
            project_board(tx, board_id)
        })
    }
}

pub fn project_board(conn: &Connection, board_id: &str) -> BoardResult<BoardDocument> {
    let columns = query_columns(conn, board_id)?;
    if columns.is_empty() {
        return Ok(BoardDocument::default());
    }

    // Load order is position order; grouping keeps it.
    let cards = query_board_cards(conn, board_id)?;
    let mut by_column: HashMap<&str, Vec<String>> = HashMap::new();
    for card in &cards {
        by_column
            .entry(card.column_id.as_str())
            .or_default()
            .push(card.id.clone());
    }

    let mut user_ids: Vec<&str> = cards
        .iter()
        .flat_map(|c| [c.created_by_id.as_deref(), c.assigned_to_id.as_deref()])
        .flatten()
        .collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let usernames = query_usernames(conn, &user_ids)?;
    let resolve = |id: &Option<String>| id.as_ref().and_then(|id| usernames.get(id).cloned());

    let columns: Vec<ColumnDoc> = columns
        .into_iter()
        .map(|col| ColumnDoc {
            card_ids: by_column.remove(col.id.as_str()).unwrap_or_default(),
            id: col.id,
            title: col.title,
        })
        .collect();

    let cards: BTreeMap<String, CardDoc> = cards
        .iter()
        .map(|card| {
            let doc = CardDoc {
                id: card.id.clone(),
                title: card.title.clone(),
                details: card.details.clone(),
                created_by: resolve(&card.created_by_id),
                assigned_to: resolve(&card.assigned_to_id),
            };
            (card.id.clone(), doc)
        })
        .collect();

    Ok(BoardDocument { columns, cards })
}

/// Make storage for `board_id` match `doc`.
///
/// Columns take the position of their index in the document, cards the
/// position of their index among the written ids of their column's `cardIds`.
/// Ids listed in `cardIds` without an entry in the card map are skipped, as
/// are all but the last listing of an id that appears in several columns.
/// Creator and assignee are never taken from the document; new cards are
/// credited to `acting_user_id`. Stored columns and cards the document no
/// longer mentions are deleted, cards of a deleted column with it.
///
/// Callers must run this inside a transaction: an error leaves partial writes
/// that only a rollback undoes.
pub fn reconcile(
    conn: &Connection,
    board_id: &str,
    doc: &BoardDocument,
    acting_user_id: &str,
) -> BoardResult<ReconcileStats> {
    let stored_columns: HashSet<String> = query_columns(conn, board_id)?
        .into_iter()
        .map(|c| c.id)
        .collect();
    let stored_cards: HashSet<String> = query_board_cards(conn, board_id)?
        .into_iter()
        .map(|c| c.id)
        .collect();

    let incoming_columns: HashSet<&str> = doc.columns.iter().map(|c| c.id.as_str()).collect();
    let incoming_cards: HashSet<&str> = doc.cards.keys().map(String::as_str).collect();

    let mut stats = ReconcileStats::default();

    for (position, col) in doc.columns.iter().enumerate() {
        let position = position as i64;
        match column_board(conn, &col.id)? {
            Some(owner) if owner == board_id => {
                conn.execute(
                    "UPDATE kanban_columns SET title = ?1, position = ?2 WHERE id = ?3",
                    (&col.title, position, &col.id),
                )?;
                stats.columns_updated += 1;
            }
            Some(_) => {
                return Err(BoardError::Validation(format!(
                    "column {} belongs to another board",
                    col.id
                )));
            }
            None => {
                conn.execute(
                    "INSERT INTO kanban_columns (id, board_id, title, position) VALUES (?1, ?2, ?3, ?4)",
                    (&col.id, board_id, &col.title, position),
                )?;
                stats.columns_inserted += 1;
            }
        }
    }

    // A card listed in several columns lands in the last one.
    let mut home: HashMap<&str, usize> = HashMap::new();
    for (index, col) in doc.columns.iter().enumerate() {
        for card_id in &col.card_ids {
            home.insert(card_id.as_str(), index);
        }
    }

    let mut placed: HashSet<&str> = HashSet::new();
    for (index, col) in doc.columns.iter().enumerate() {
        let mut position: i64 = 0;
        for card_id in &col.card_ids {
            let Some(card) = doc.cards.get(card_id) else {
                debug!(board_id, card_id = %card_id, "Skipping dangling card reference");
                continue;
            };
            if home.get(card_id.as_str()) != Some(&index) || !placed.insert(card_id.as_str()) {
                debug!(board_id, card_id = %card_id, "Skipping earlier listing of duplicated card");
                continue;
            }

            match card_board(conn, card_id)? {
                Some(owner) if owner == board_id => {
                    conn.execute(
                        "UPDATE kanban_cards SET title = ?1, details = ?2, column_id = ?3, position = ?4
                         WHERE id = ?5",
                        (&card.title, &card.details, &col.id, position, card_id),
                    )?;
                    stats.cards_updated += 1;
                }
                Some(_) => {
                    return Err(BoardError::Validation(format!(
                        "card {} belongs to another board",
                        card_id
                    )));
                }
                None => {
                    conn.execute(
                        "INSERT INTO kanban_cards (id, column_id, title, details, position, created_by_id)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        (card_id, &col.id, &card.title, &card.details, position, acting_user_id),
                    )?;
                    stats.cards_inserted += 1;
                }
            }
            position += 1;
        }
    }

    for id in stored_columns
        .iter()
        .filter(|id| !incoming_columns.contains(id.as_str()))
    {
        stats.cards_deleted += conn.execute("DELETE FROM kanban_cards WHERE column_id = ?1", [id])?;
        conn.execute("DELETE FROM kanban_columns WHERE id = ?1", [id])?;
        stats.columns_deleted += 1;
    }

    for id in stored_cards
        .iter()
        .filter(|id| !incoming_cards.contains(id.as_str()))
    {
        stats.cards_deleted += conn.execute("DELETE FROM kanban_cards WHERE id = ?1", [id])?;
    }

    Ok(stats)
}

fn column_board(conn: &Connection, column_id: &str) -> BoardResult<Option<String>> {
    let owner = conn
        .query_row(
            "SELECT board_id FROM kanban_columns WHERE id = ?1",
            [column_id],
            |row| row.get(0),
        )
        .optional()?;

    Ok(owner)
}

fn card_board(conn: &Connection, card_id: &str) -> BoardResult<Option<String>> {
    let owner = conn
        .query_row(
            "SELECT col.board_id FROM kanban_cards c
             JOIN kanban_columns col ON c.column_id = col.id
             WHERE c.id = ?1",
            [card_id],
            |row| row.get(0),
        )
        .optional()?;

    Ok(owner)
}
