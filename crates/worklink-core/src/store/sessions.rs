//! Session token store.

use super::{lock_conn, now_rfc3339};
use crate::config::AuthConfig;
use crate::models::Session;
use crate::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct SessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SessionStore {
    pub fn new(db: &super::Database) -> Self {
        Self { conn: db.handle() }
    }

    /// Issue a new token for a user, expiring after `AuthConfig::SESSION_TTL`.
    pub fn create(&self, user_id: &str) -> Result<Session> {
        let conn = lock_conn(&self.conn)?;
        let token = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires = now + AuthConfig::SESSION_TTL;

        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at, last_seen)
             VALUES (?1, ?2, ?3, ?4, ?3)",
            params![token, user_id, now.to_rfc3339(), expires.to_rfc3339()],
        )?;

        debug!("Issued session for user {}", user_id);

        Ok(Session {
            token,
            user_id: user_id.to_string(),
            created_at: now.to_rfc3339(),
            expires_at: expires.to_rfc3339(),
            last_seen: now.to_rfc3339(),
        })
    }

    pub fn get(&self, token: &str) -> Result<Option<Session>> {
        let conn = lock_conn(&self.conn)?;
        let result = conn
            .query_row(
                "SELECT token, user_id, created_at, expires_at, last_seen
                 FROM sessions WHERE token = ?1",
                params![token],
                row_to_session,
            )
            .optional()?;
        Ok(result)
    }

    pub fn touch(&self, token: &str) -> Result<()> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "UPDATE sessions SET last_seen = ?1 WHERE token = ?2",
            params![now_rfc3339(), token],
        )?;
        Ok(())
    }

    pub fn delete(&self, token: &str) -> Result<bool> {
        let conn = lock_conn(&self.conn)?;
        let rows = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(rows > 0)
    }

    /// Drop every session of one user (used when blocking an account).
    pub fn delete_for_user(&self, user_id: &str) -> Result<usize> {
        let conn = lock_conn(&self.conn)?;
        let rows = conn.execute(
            "DELETE FROM sessions WHERE user_id = ?1",
            params![user_id],
        )?;
        if rows > 0 {
            debug!("Deleted {} session(s) for user {}", rows, user_id);
        }
        Ok(rows)
    }

    /// Force a token into the past; test setup only.
    #[cfg(test)]
    pub(crate) fn backdate(&self, token: &str) {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE sessions SET expires_at = '2000-01-01T00:00:00+00:00' WHERE token = ?1",
            params![token],
        )
        .unwrap();
    }

    /// Remove expired sessions. Returns how many were purged.
    pub fn cleanup_expired(&self) -> Result<usize> {
        let conn = lock_conn(&self.conn)?;
        let rows = conn.execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            params![now_rfc3339()],
        )?;
        if rows > 0 {
            debug!("Purged {} expired session(s)", rows);
        }
        Ok(rows)
    }
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        token: row.get(0)?,
        user_id: row.get(1)?,
        created_at: row.get(2)?,
        expires_at: row.get(3)?,
        last_seen: row.get(4)?,
    })
}
