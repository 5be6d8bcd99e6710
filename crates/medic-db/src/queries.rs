use crate::Database;
use crate::models::{InboxRow, PostRow};
use anyhow::Result;
use rusqlite::OptionalExtension;

impl Database {
    // -- Codes --

    pub fn get_code(&self, user_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let code = conn
                .query_row(
                    "SELECT code FROM codes WHERE user_id = ?1",
                    [user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(code)
        })
    }

    /// Atomic insert-if-absent. Two concurrent issuances for the same user
    /// both land here; INSERT OR IGNORE guarantees only the first write
    /// sticks, and both callers read back the same stored code.
    ///
    /// Returns (stored code, whether this call created it).
    pub fn insert_code_if_absent(&self, user_id: &str, code: &str) -> Result<(String, bool)> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO codes (user_id, code) VALUES (?1, ?2)",
                (user_id, code),
            )?;

            let stored: String = conn.query_row(
                "SELECT code FROM codes WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;

            Ok((stored, inserted > 0))
        })
    }

    /// Deleting an absent code is a no-op, not an error.
    pub fn delete_code(&self, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM codes WHERE user_id = ?1", [user_id])?;
            Ok(())
        })
    }

    // -- Posts --

    pub fn create_post(&self, id: &str, title: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, title) VALUES (?1, ?2)",
                (id, title),
            )?;
            Ok(())
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, created_at FROM posts WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(PostRow {
                            id: row.get(0)?,
                            title: row.get(1)?,
                            created_at: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Users --

    /// Remember the latest username observed for a user. Trigger payloads
    /// are the only source of usernames, so keep whatever they last said.
    pub fn upsert_user(&self, id: &str, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET username = excluded.username",
                (id, username),
            )?;
            Ok(())
        })
    }

    pub fn get_username_by_id(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let username = conn
                .query_row("SELECT username FROM users WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(username)
        })
    }

    // -- Inbox --

    pub fn insert_inbox_message(
        &self,
        id: &str,
        to_user_id: &str,
        subject: &str,
        body: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO inbox (id, to_user_id, subject, body) VALUES (?1, ?2, ?3, ?4)",
                (id, to_user_id, subject, body),
            )?;
            Ok(())
        })
    }

    pub fn get_inbox_for_user(&self, to_user_id: &str) -> Result<Vec<InboxRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, to_user_id, subject, body, created_at
                 FROM inbox
                 WHERE to_user_id = ?1
                 ORDER BY created_at DESC",
            )?;

            let rows = stmt
                .query_map([to_user_id], |row| {
                    Ok(InboxRow {
                        id: row.get(0)?,
                        to_user_id: row.get(1)?,
                        subject: row.get(2)?,
                        body: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}
