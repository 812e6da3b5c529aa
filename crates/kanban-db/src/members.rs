use tracing::info;

use kanban_types::models::Member;

use crate::guard::{require_member, require_owner};
use crate::queries::{query_is_member, query_user_by_id, query_user_by_username};
use crate::{BoardError, BoardResult, Database};

impl Database {
    /// Members of a board ordered by username. Requires membership.
    pub fn list_members(&self, board_id: &str, user_id: &str) -> BoardResult<Vec<Member>> {
        self.with_tx(|tx| {
            require_member(tx, board_id, user_id)?;

            let mut stmt = tx.prepare(
                "SELECT u.id, u.username
                 FROM users u
                 JOIN board_members m ON m.user_id = u.id
                 WHERE m.board_id = ?1
                 ORDER BY u.username",
            )?;

            let rows = stmt
                .query_map([board_id], |row| {
                    Ok(Member {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Add `username` to a board. Owner only; the user must exist and must
    /// not already be a member.
    pub fn invite_member(&self, board_id: &str, username: &str, user_id: &str) -> BoardResult<Member> {
        let member = self.with_tx(|tx| {
            require_owner(tx, board_id, user_id)?;
            let target = query_user_by_username(tx, username)?.ok_or(BoardError::NotFound("User"))?;

            if query_is_member(tx, board_id, &target.id)? {
                return Err(BoardError::Conflict("User is already a member"));
            }

            tx.execute(
                "INSERT INTO board_members (board_id, user_id) VALUES (?1, ?2)",
                (board_id, &target.id),
            )?;

            Ok(Member {
                user_id: target.id,
                username: target.username,
            })
        })?;

        info!(board_id, member = %member.username, "Member invited");
        Ok(member)
    }

    /// Remove `username` from a board. Owner only, and the owner cannot remove
    /// themselves. Removing a user who is not a member is a no-op.
    pub fn remove_member(&self, board_id: &str, username: &str, user_id: &str) -> BoardResult<()> {
        let removed = self.with_tx(|tx| {
            require_owner(tx, board_id, user_id)?;

            let owner = query_user_by_id(tx, user_id)?.ok_or(BoardError::NotFound("User"))?;
            if owner.username == username {
                return Err(BoardError::Validation(
                    "Owner cannot remove themselves from the board".to_string(),
                ));
            }

            let target = query_user_by_username(tx, username)?.ok_or(BoardError::NotFound("User"))?;
            let removed = tx.execute(
                "DELETE FROM board_members WHERE board_id = ?1 AND user_id = ?2",
                (board_id, &target.id),
            )?;

            Ok(removed)
        })?;

        if removed > 0 {
            info!(board_id, member = username, "Member removed");
        }
        Ok(())
    }
}
