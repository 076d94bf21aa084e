//! Work record store.
//!
//! Reads only: every write to a work row is a lifecycle transition and goes
//! through the workflow engine's transactions.

use super::lock_conn;
use crate::models::{Work, WorkStage};
use crate::{Result, WorklinkError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub(crate) const WORK_COLUMNS: &str =
    "id, project_id, client_id, student_id, stage, approved_at, completion_note, \
     deliverable_ref, completion_submitted_at, deliverable_unlocked, completed_at, \
     cancel_reason, updated_at";

pub struct WorkStore {
    conn: Arc<Mutex<Connection>>,
}

impl WorkStore {
    pub fn new(db: &super::Database) -> Self {
        Self { conn: db.handle() }
    }

    pub fn get(&self, work_id: &str) -> Result<Option<Work>> {
        let conn = lock_conn(&self.conn)?;
        let result = conn
            .query_row(
                &format!("SELECT {} FROM works WHERE id = ?1", WORK_COLUMNS),
                params![work_id],
                row_to_work,
            )
            .optional()?;
        Ok(result)
    }

    /// Fetch a work or fail with `WorkNotFound`.
    pub fn require(&self, work_id: &str) -> Result<Work> {
        self.get(work_id)?.ok_or_else(|| WorklinkError::WorkNotFound {
            work_id: work_id.to_string(),
        })
    }

    /// Newest engagement for a project. Earlier rows can exist when a
    /// cancelled work led to a reassignment.
    pub fn get_by_project(&self, project_id: &str) -> Result<Option<Work>> {
        let conn = lock_conn(&self.conn)?;
        let result = conn
            .query_row(
                &format!(
                    "SELECT {} FROM works WHERE project_id = ?1
                     ORDER BY approved_at DESC, rowid DESC LIMIT 1",
                    WORK_COLUMNS
                ),
                params![project_id],
                row_to_work,
            )
            .optional()?;
        Ok(result)
    }

    pub fn list_all(&self, stage: Option<WorkStage>) -> Result<Vec<Work>> {
        self.list_where("1=1", &[], stage)
    }

    pub fn list_for_student(
        &self,
        student_id: &str,
        stage: Option<WorkStage>,
    ) -> Result<Vec<Work>> {
        self.list_where("student_id = ?1", &[student_id], stage)
    }

    pub fn list_for_client(&self, client_id: &str, stage: Option<WorkStage>) -> Result<Vec<Work>> {
        self.list_where("client_id = ?1", &[client_id], stage)
    }

    fn list_where(
        &self,
        clause: &str,
        binds: &[&str],
        stage: Option<WorkStage>,
    ) -> Result<Vec<Work>> {
        let conn = lock_conn(&self.conn)?;
        let mut sql = format!("SELECT {} FROM works WHERE {}", WORK_COLUMNS, clause);
        if stage.is_some() {
            sql.push_str(&format!(" AND stage = ?{}", binds.len() + 1));
        }
        sql.push_str(" ORDER BY updated_at DESC");

        let stage_str = stage.map(|s| s.as_str().to_string());
        let mut all_binds: Vec<&dyn rusqlite::ToSql> =
            binds.iter().map(|b| b as &dyn rusqlite::ToSql).collect();
        if let Some(ref s) = stage_str {
            all_binds.push(s);
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<Work> = stmt
            .query_map(all_binds.as_slice(), row_to_work)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }
}

pub(crate) fn row_to_work(row: &Row<'_>) -> rusqlite::Result<Work> {
    Ok(Work {
        id: row.get(0)?,
        project_id: row.get(1)?,
        client_id: row.get(2)?,
        student_id: row.get(3)?,
        stage: row.get(4)?,
        approved_at: row.get(5)?,
        completion_note: row.get(6)?,
        deliverable_ref: row.get(7)?,
        completion_submitted_at: row.get(8)?,
        deliverable_unlocked: row.get(9)?,
        completed_at: row.get(10)?,
        cancel_reason: row.get(11)?,
        updated_at: row.get(12)?,
    })
}
