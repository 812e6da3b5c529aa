use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS boards (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS board_members (
            board_id    TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (board_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_board_members_user
            ON board_members(user_id);

        CREATE TABLE IF NOT EXISTS kanban_columns (
            id          TEXT PRIMARY KEY,
            board_id    TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
            title       TEXT NOT NULL,
            position    INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_columns_board
            ON kanban_columns(board_id, position);

        CREATE TABLE IF NOT EXISTS kanban_cards (
            id              TEXT PRIMARY KEY,
            column_id       TEXT NOT NULL REFERENCES kanban_columns(id) ON DELETE CASCADE,
            title           TEXT NOT NULL,
            details         TEXT NOT NULL DEFAULT '',
            position        INTEGER NOT NULL,
            created_by_id   TEXT REFERENCES users(id) ON DELETE SET NULL,
            assigned_to_id  TEXT REFERENCES users(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cards_column
            ON kanban_cards(column_id, position);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
