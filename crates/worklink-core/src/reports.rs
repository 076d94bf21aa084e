//! Admin dashboard aggregations.

use crate::store::{lock_conn, now_rfc3339, Database};
use crate::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Snapshot of platform-wide counts for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub users_by_role: HashMap<String, i64>,
    pub projects_by_status: HashMap<String, i64>,
    pub works_by_stage: HashMap<String, i64>,
    pub pending_applications: i64,
    /// Whole rupees across all verified proofs.
    pub verified_payment_volume: i64,
    pub disputed_works: i64,
    pub blocked_users: i64,
    pub generated_at: String,
}

pub struct Reporter {
    conn: Arc<Mutex<Connection>>,
}

impl Reporter {
    pub fn new(db: &Database) -> Self {
        Self { conn: db.handle() }
    }

    pub fn dashboard(&self) -> Result<DashboardReport> {
        let conn = lock_conn(&self.conn)?;

        let users_by_role = group_count(&conn, "SELECT role, COUNT(*) FROM users GROUP BY role")?;
        let projects_by_status =
            group_count(&conn, "SELECT status, COUNT(*) FROM projects GROUP BY status")?;
        let works_by_stage =
            group_count(&conn, "SELECT stage, COUNT(*) FROM works GROUP BY stage")?;

        let pending_applications: i64 = conn.query_row(
            "SELECT COUNT(*) FROM applications WHERE status = 'pending'",
            [],
            |row| row.get(0),
        )?;
        let verified_payment_volume: i64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM payment_proofs WHERE status = 'verified'",
            [],
            |row| row.get(0),
        )?;
        let disputed_works: i64 = conn.query_row(
            "SELECT COUNT(*) FROM works WHERE stage = 'payment_disputed'",
            [],
            |row| row.get(0),
        )?;
        let blocked_users: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE blocked = 1",
            [],
            |row| row.get(0),
        )?;

        Ok(DashboardReport {
            users_by_role,
            projects_by_status,
            works_by_stage,
            pending_applications,
            verified_payment_volume,
            disputed_works,
            blocked_users,
            generated_at: now_rfc3339(),
        })
    }
}

fn group_count(conn: &Connection, sql: &str) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

    let mut counts = HashMap::new();
    for row in rows {
        let (key, count) = row?;
        counts.insert(key, count);
    }
    Ok(counts)
}
