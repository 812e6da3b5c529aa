use tracing::{error, info};

use crate::{BoardResult, Database};

const DEMO_USERS: [(&str, &str); 3] = [("user-1", "user"), ("user-2", "alice"), ("user-3", "bob")];

const DEMO_COLUMNS: [(&str, &str); 5] = [
    ("col-backlog", "Backlog"),
    ("col-discovery", "Discovery"),
    ("col-progress", "In Progress"),
    ("col-review", "Review"),
    ("col-done", "Done"),
];

/// (id, title, details, column, position)
const DEMO_CARDS: [(&str, &str, &str, &str, i64); 8] = [
    ("card-1", "Align roadmap themes", "Draft quarterly themes with impact statements and metrics.", "col-backlog", 0),
    ("card-2", "Gather customer signals", "Review support tags, sales notes, and churn feedback.", "col-backlog", 1),
    ("card-3", "Prototype analytics view", "Sketch initial dashboard layout and key drill-downs.", "col-discovery", 0),
    ("card-4", "Refine status language", "Standardize column labels and tone across the board.", "col-progress", 0),
    ("card-5", "Design card layout", "Add hierarchy and spacing for scanning dense lists.", "col-progress", 1),
    ("card-6", "QA micro-interactions", "Verify hover, focus, and loading states.", "col-review", 0),
    ("card-7", "Ship marketing page", "Final copy approved and asset pack delivered.", "col-done", 0),
    ("card-8", "Close onboarding sprint", "Document release notes and share internally.", "col-done", 1),
];

impl Database {
    /// Populate an empty database with demo users and the shared "Main Board".
    /// Does nothing when any user already exists.
    pub fn seed_demo_data(&self) -> BoardResult<bool> {
        if self.count_users()? > 0 {
            return Ok(false);
        }

        let result = self.with_tx(|tx| {
            for (id, username) in DEMO_USERS {
                tx.execute(
                    "INSERT INTO users (id, username, password) VALUES (?1, ?2, 'password')",
                    (id, username),
                )?;
            }

            tx.execute(
                "INSERT INTO boards (id, title, owner_id) VALUES ('board-1', 'Main Board', 'user-1')",
                [],
            )?;

            for (user_id, _) in DEMO_USERS {
                tx.execute(
                    "INSERT INTO board_members (board_id, user_id) VALUES ('board-1', ?1)",
                    [user_id],
                )?;
            }

            for (position, (id, title)) in DEMO_COLUMNS.iter().enumerate() {
                tx.execute(
                    "INSERT INTO kanban_columns (id, board_id, title, position) VALUES (?1, 'board-1', ?2, ?3)",
                    (id, title, position as i64),
                )?;
            }

            for (id, title, details, column_id, position) in DEMO_CARDS {
                tx.execute(
                    "INSERT INTO kanban_cards (id, column_id, title, details, position, created_by_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, 'user-1')",
                    (id, column_id, title, details, position),
                )?;
            }

            Ok(())
        });

        match result {
            Ok(()) => {
                info!("Seeded demo data ({} users, 1 board)", DEMO_USERS.len());
                Ok(true)
            }
            Err(e) => {
                error!("Failed to seed database: {}", e);
                Err(e)
            }
        }
    }
}
