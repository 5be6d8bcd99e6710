use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- One code per user, ever, until explicitly deleted.
        CREATE TABLE IF NOT EXISTS codes (
            user_id     TEXT PRIMARY KEY,
            code        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS posts (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Local directory of usernames, filled in from trigger payloads.
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL
        );

        -- Out-of-band private messages ('your code is ready').
        CREATE TABLE IF NOT EXISTS inbox (
            id          TEXT PRIMARY KEY,
            to_user_id  TEXT NOT NULL,
            subject     TEXT NOT NULL,
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_inbox_recipient
            ON inbox(to_user_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
