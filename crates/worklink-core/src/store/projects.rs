//! Project store.
//!
//! Status flips are guarded twice: the current status is checked under the
//! connection lock, and the UPDATE repeats the guard in its WHERE clause so a
//! row can never skip a stage.

use super::{lock_conn, now_rfc3339};
use crate::models::{Project, ProjectSpec, ProjectStatus, ProjectUpdate};
use crate::{Result, WorklinkError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const PROJECT_COLUMNS: &str =
    "id, client_id, title, description, budget, deadline, skills_json, attachments_json, \
     status, assigned_student, created_at, updated_at";

pub struct ProjectStore {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectStore {
    pub fn new(db: &super::Database) -> Self {
        Self { conn: db.handle() }
    }

    pub fn create(&self, client_id: &str, spec: &ProjectSpec) -> Result<Project> {
        let conn = lock_conn(&self.conn)?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let skills_json = serde_json::to_string(&spec.skills_required)?;
        let attachments_json = serde_json::to_string(&spec.attachment_refs)?;

        conn.execute(
            "INSERT INTO projects (id, client_id, title, description, budget, deadline,
                                   skills_json, attachments_json, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'open', ?9, ?9)",
            params![
                id,
                client_id,
                spec.title,
                spec.description,
                spec.budget,
                spec.deadline,
                skills_json,
                attachments_json,
                now,
            ],
        )?;

        debug!("Created project {} for client {}", id, client_id);
        drop(conn);

        self.get(&id)?.ok_or_else(|| WorklinkError::Database {
            message: "Project disappeared after insert".to_string(),
            source: None,
        })
    }

    pub fn get(&self, project_id: &str) -> Result<Option<Project>> {
        let conn = lock_conn(&self.conn)?;
        let result = conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
                params![project_id],
                row_to_project,
            )
            .optional()?;
        Ok(result)
    }

    /// Fetch a project or fail with `ProjectNotFound`.
    pub fn require(&self, project_id: &str) -> Result<Project> {
        self.get(project_id)?
            .ok_or_else(|| WorklinkError::ProjectNotFound {
                project_id: project_id.to_string(),
            })
    }

    pub fn list_all(&self, status: Option<ProjectStatus>) -> Result<Vec<Project>> {
        self.list_where("1=1", &[], status)
    }

    pub fn list_for_client(
        &self,
        client_id: &str,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>> {
        self.list_where("client_id = ?1", &[client_id], status)
    }

    /// Projects visible to a student: open ones plus their own assignments.
    pub fn list_for_student(
        &self,
        student_id: &str,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>> {
        self.list_where(
            "(status = 'open' OR assigned_student = ?1)",
            &[student_id],
            status,
        )
    }

    fn list_where(
        &self,
        clause: &str,
        binds: &[&str],
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>> {
        let conn = lock_conn(&self.conn)?;
        let mut sql = format!(
            "SELECT {} FROM projects WHERE {}",
            PROJECT_COLUMNS, clause
        );
        if status.is_some() {
            sql.push_str(&format!(" AND status = ?{}", binds.len() + 1));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let status_str = status.map(|s| s.as_str().to_string());
        let mut all_binds: Vec<&dyn rusqlite::ToSql> =
            binds.iter().map(|b| b as &dyn rusqlite::ToSql).collect();
        if let Some(ref s) = status_str {
            all_binds.push(s);
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<Project> = stmt
            .query_map(all_binds.as_slice(), row_to_project)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    /// Apply a partial update to an `open` project.
    pub fn update(&self, project_id: &str, update: &ProjectUpdate) -> Result<Project> {
        let current = self.require(project_id)?;
        if current.status != ProjectStatus::Open {
            return Err(WorklinkError::InvalidTransition {
                from: current.status.to_string(),
                action: "update_project".to_string(),
            });
        }

        let title = update.title.as_deref().unwrap_or(&current.title);
        let description = update
            .description
            .as_deref()
            .unwrap_or(&current.description);
        let budget = update.budget.unwrap_or(current.budget);
        let deadline = update.deadline.as_deref().unwrap_or(&current.deadline);
        let skills = update
            .skills_required
            .as_ref()
            .unwrap_or(&current.skills_required);
        let attachments = update
            .attachment_refs
            .as_ref()
            .unwrap_or(&current.attachment_refs);
        let skills_json = serde_json::to_string(skills)?;
        let attachments_json = serde_json::to_string(attachments)?;

        let conn = lock_conn(&self.conn)?;
        let rows = conn.execute(
            "UPDATE projects SET title = ?1, description = ?2, budget = ?3, deadline = ?4,
                                 skills_json = ?5, attachments_json = ?6, updated_at = ?7
             WHERE id = ?8 AND status = 'open'",
            params![
                title,
                description,
                budget,
                deadline,
                skills_json,
                attachments_json,
                now_rfc3339(),
                project_id,
            ],
        )?;
        drop(conn);

        if rows == 0 {
            // Raced with an assignment; re-read for the accurate stage.
            let current = self.require(project_id)?;
            return Err(WorklinkError::InvalidTransition {
                from: current.status.to_string(),
                action: "update_project".to_string(),
            });
        }

        self.require(project_id)
    }

    /// Admin proposes a student: `open -> assigned`.
    pub fn assign(&self, project_id: &str, student_id: &str) -> Result<Project> {
        self.guarded_flip(
            project_id,
            "assign_project",
            "UPDATE projects SET status = 'assigned', assigned_student = ?1, updated_at = ?2
             WHERE id = ?3 AND status = 'open'",
            params![student_id, now_rfc3339(), project_id],
        )?;
        info!("Assigned project {} to student {}", project_id, student_id);
        self.require(project_id)
    }

    /// Client declines the proposal: `assigned -> open`.
    pub fn clear_assignment(&self, project_id: &str) -> Result<Project> {
        self.guarded_flip(
            project_id,
            "reject_assignment",
            "UPDATE projects SET status = 'open', assigned_student = NULL, updated_at = ?1
             WHERE id = ?2 AND status = 'assigned'",
            params![now_rfc3339(), project_id],
        )?;
        info!("Cleared assignment on project {}", project_id);
        self.require(project_id)
    }

    /// Owner or admin cancels: `open | assigned -> cancelled`.
    pub fn cancel(&self, project_id: &str) -> Result<Project> {
        self.guarded_flip(
            project_id,
            "cancel_project",
            "UPDATE projects SET status = 'cancelled', assigned_student = NULL, updated_at = ?1
             WHERE id = ?2 AND status IN ('open', 'assigned')",
            params![now_rfc3339(), project_id],
        )?;
        info!("Cancelled project {}", project_id);
        self.require(project_id)
    }

    /// Run a guarded UPDATE; zero affected rows means the project is missing
    /// or in the wrong status.
    fn guarded_flip(
        &self,
        project_id: &str,
        action: &str,
        sql: &str,
        binds: impl rusqlite::Params,
    ) -> Result<()> {
        let conn = lock_conn(&self.conn)?;
        let rows = conn.execute(sql, binds)?;
        drop(conn);

        if rows == 0 {
            let current = self.require(project_id)?;
            return Err(WorklinkError::InvalidTransition {
                from: current.status.to_string(),
                action: action.to_string(),
            });
        }
        Ok(())
    }
}

pub(crate) fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    let skills_json: String = row.get(6)?;
    let attachments_json: String = row.get(7)?;
    Ok(Project {
        id: row.get(0)?,
        client_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        budget: row.get(4)?,
        deadline: row.get(5)?,
        skills_required: serde_json::from_str(&skills_json).unwrap_or_default(),
        attachment_refs: serde_json::from_str(&attachments_json).unwrap_or_default(),
        status: row.get(8)?,
        assigned_student: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}
