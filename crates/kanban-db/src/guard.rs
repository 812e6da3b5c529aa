//! Membership and ownership checks that gate every board-scoped operation.
//!
//! Existence is always checked first, so a missing board is reported as
//! `NotFound` to everyone, members or not.

use rusqlite::Connection;

use crate::models::BoardRow;
use crate::queries::{query_board, query_is_member};
use crate::{BoardError, BoardResult, Database};

impl Database {
    /// Standalone membership check, for callers that do their board work in a
    /// later transaction.
    pub fn check_member(&self, board_id: &str, user_id: &str) -> BoardResult<BoardRow> {
        self.with_tx(|tx| require_member(tx, board_id, user_id))
    }
}

pub fn require_exists(conn: &Connection, board_id: &str) -> BoardResult<BoardRow> {
    query_board(conn, board_id)?.ok_or(BoardError::NotFound("Board"))
}

pub fn require_member(conn: &Connection, board_id: &str, user_id: &str) -> BoardResult<BoardRow> {
    let board = require_exists(conn, board_id)?;
    if !query_is_member(conn, board_id, user_id)? {
        return Err(BoardError::Forbidden("Not a member of this board"));
    }
    Ok(board)
}

pub fn require_owner(conn: &Connection, board_id: &str, user_id: &str) -> BoardResult<BoardRow> {
    let board = require_member(conn, board_id, user_id)?;
    if board.owner_id != user_id {
        return Err(BoardError::Forbidden("Only the board owner can perform this action"));
    }
    Ok(board)
}
