//! SQLite-backed persistence.
//!
//! One database file holds every table. [`Database`] owns the connection
//! (WAL mode, shared `Arc<Mutex<Connection>>`) and creates the schema; the
//! per-table stores in this module borrow the connection handle. Multi-table
//! lifecycle effects go through `workflow`, which runs them in a single
//! transaction on the same connection.

mod applications;
mod payments;
mod performance;
mod projects;
mod sessions;
mod users;
mod works;

pub use applications::{ApplicationStore, NewApplication};
pub use payments::PaymentStore;
pub use performance::PerformanceStore;
pub use projects::ProjectStore;
pub use sessions::SessionStore;
pub use users::{CredentialRow, NewUser, UserStore};
pub use works::WorkStore;

pub(crate) use works::{row_to_work, WORK_COLUMNS};

use crate::config::StoreConfig;
use crate::{Result, WorklinkError};
use chrono::Utc;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Current timestamp in the format every table stores.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Lock a shared connection handle, mapping a poisoned mutex to a database error.
pub(crate) fn lock_conn(
    conn: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| WorklinkError::Database {
        message: "Failed to acquire database connection lock".to_string(),
        source: None,
    })
}

/// Handle to the Worklink database.
///
/// Cloning is cheap; all clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database inside a data directory.
    pub fn open(data_dir: &Path) -> Result<Self> {
        if !data_dir.exists() {
            std::fs::create_dir_all(data_dir)
                .map_err(|e| WorklinkError::io_with_path(e, data_dir))?;
        }
        Self::open_at(&data_dir.join(StoreConfig::DB_FILE_NAME))
    }

    /// Open (or create) the database at a specific path.
    pub fn open_at(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| WorklinkError::io_with_path(e, parent))?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::configure_connection(&conn)?;
        Self::ensure_schema(&conn)?;

        debug!("Opened database at {}", db_path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;\n\
             PRAGMA busy_timeout={};\n\
             PRAGMA synchronous=NORMAL;\n\
             PRAGMA foreign_keys=ON;\n\
             PRAGMA temp_store=MEMORY;",
            StoreConfig::BUSY_TIMEOUT_MS,
        ))?;
        Ok(())
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                role TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT,
                password_digest TEXT NOT NULL,
                password_salt TEXT NOT NULL,
                blocked INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                last_login TEXT,
                skills_json TEXT NOT NULL DEFAULT '[]',
                upi_id TEXT,
                bio TEXT,
                organization TEXT
            );

            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                last_seen TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

            CREATE TABLE IF NOT EXISTS applications (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                password_digest TEXT NOT NULL,
                password_salt TEXT NOT NULL,
                skills_json TEXT NOT NULL DEFAULT '[]',
                resume_ref TEXT,
                cover_note TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                submitted_at TEXT NOT NULL,
                reviewed_by TEXT,
                reviewed_at TEXT,
                review_note TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status);

            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                client_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                budget INTEGER NOT NULL,
                deadline TEXT NOT NULL,
                skills_json TEXT NOT NULL DEFAULT '[]',
                attachments_json TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'open',
                assigned_student TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_projects_client ON projects(client_id);
            CREATE INDEX IF NOT EXISTS idx_projects_status ON projects(status);

            CREATE TABLE IF NOT EXISTS works (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                client_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                stage TEXT NOT NULL DEFAULT 'in_progress',
                approved_at TEXT NOT NULL,
                completion_note TEXT,
                deliverable_ref TEXT,
                completion_submitted_at TEXT,
                deliverable_unlocked INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                cancel_reason TEXT,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_works_project ON works(project_id);
            CREATE INDEX IF NOT EXISTS idx_works_student ON works(student_id);
            CREATE INDEX IF NOT EXISTS idx_works_client ON works(client_id);
            CREATE INDEX IF NOT EXISTS idx_works_stage ON works(stage);

            CREATE TABLE IF NOT EXISTS payment_proofs (
                id TEXT PRIMARY KEY,
                work_id TEXT NOT NULL,
                submitted_by TEXT NOT NULL,
                upi_reference TEXT NOT NULL,
                payer_upi TEXT NOT NULL,
                payee_upi TEXT NOT NULL,
                amount INTEGER NOT NULL,
                note TEXT,
                screenshot_ref TEXT,
                status TEXT NOT NULL DEFAULT 'submitted',
                submitted_at TEXT NOT NULL,
                resolved_by TEXT,
                resolved_at TEXT,
                resolution_note TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_proofs_work ON payment_proofs(work_id);

            CREATE TABLE IF NOT EXISTS student_performance (
                student_id TEXT PRIMARY KEY,
                assigned_count INTEGER NOT NULL DEFAULT 0,
                completed_count INTEGER NOT NULL DEFAULT 0,
                cancelled_count INTEGER NOT NULL DEFAULT 0,
                disputed_count INTEGER NOT NULL DEFAULT 0,
                on_time_count INTEGER NOT NULL DEFAULT 0,
                total_earnings INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Shared connection handle for stores and the workflow engine.
    pub(crate) fn handle(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    /// Lock the connection directly.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        lock_conn(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_data_dir_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let _db = Database::open(&data_dir).unwrap();

        assert!(data_dir.join(StoreConfig::DB_FILE_NAME).exists());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("worklink.sqlite");

        let _first = Database::open_at(&db_path).unwrap();
        let second = Database::open_at(&db_path).unwrap();

        // Tables exist and are queryable after a reopen.
        let conn = second.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_two_handles_share_one_connection() {
        let db = Database::open_in_memory().unwrap();
        let other = db.clone();

        db.lock()
            .unwrap()
            .execute(
                "INSERT INTO student_performance (student_id, updated_at) VALUES ('s-1', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();

        let count: i64 = other
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM student_performance", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
