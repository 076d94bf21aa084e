//! Student application store.
//!
//! Approval mints the student account from the credential material captured
//! at application time; the status flip, the user insert, and the zeroed
//! performance row are one transaction.

use super::users::row_to_user;
use super::{lock_conn, now_rfc3339};
use crate::models::{Application, ApplicationStatus, User};
use crate::{Result, WorklinkError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const APPLICATION_COLUMNS: &str =
    "id, name, email, skills_json, resume_ref, cover_note, status, submitted_at, \
     reviewed_by, reviewed_at, review_note";

/// Fields for submitting an application.
pub struct NewApplication {
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub password_salt: String,
    pub skills: Vec<String>,
    pub resume_ref: Option<String>,
    pub cover_note: Option<String>,
}

pub struct ApplicationStore {
    conn: Arc<Mutex<Connection>>,
}

impl ApplicationStore {
    pub fn new(db: &super::Database) -> Self {
        Self { conn: db.handle() }
    }

    /// Insert a pending application.
    ///
    /// Rejects emails already held by an account or by another pending
    /// application.
    pub fn create(&self, new_app: NewApplication) -> Result<Application> {
        let conn = lock_conn(&self.conn)?;
        let email = new_app.email.to_lowercase();

        let taken: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE email = ?1
                 UNION
                 SELECT id FROM applications WHERE email = ?1 AND status = 'pending'",
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(WorklinkError::EmailTaken { email });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let skills_json = serde_json::to_string(&new_app.skills)?;

        conn.execute(
            "INSERT INTO applications (id, name, email, password_digest, password_salt,
                                       skills_json, resume_ref, cover_note, status, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending', ?9)",
            params![
                id,
                new_app.name,
                email,
                new_app.password_digest,
                new_app.password_salt,
                skills_json,
                new_app.resume_ref,
                new_app.cover_note,
                now,
            ],
        )?;

        debug!("Received application {} from {}", id, email);
        drop(conn);

        self.get(&id)?.ok_or_else(|| WorklinkError::Database {
            message: "Application disappeared after insert".to_string(),
            source: None,
        })
    }

    pub fn get(&self, application_id: &str) -> Result<Option<Application>> {
        let conn = lock_conn(&self.conn)?;
        let result = conn
            .query_row(
                &format!(
                    "SELECT {} FROM applications WHERE id = ?1",
                    APPLICATION_COLUMNS
                ),
                params![application_id],
                row_to_application,
            )
            .optional()?;
        Ok(result)
    }

    pub fn list(&self, status: Option<ApplicationStatus>) -> Result<Vec<Application>> {
        let conn = lock_conn(&self.conn)?;
        let mut sql = format!("SELECT {} FROM applications", APPLICATION_COLUMNS);
        if status.is_some() {
            sql.push_str(" WHERE status = ?1");
        }
        sql.push_str(" ORDER BY submitted_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<Application> = match status {
            Some(s) => stmt
                .query_map(params![s], row_to_application)?
                .collect::<rusqlite::Result<_>>()?,
            None => stmt
                .query_map([], row_to_application)?
                .collect::<rusqlite::Result<_>>()?,
        };
        Ok(rows)
    }

    /// Approve a pending application, minting the student account.
    pub fn approve(
        &self,
        application_id: &str,
        reviewer_id: &str,
        note: Option<&str>,
    ) -> Result<(Application, User)> {
        let mut conn = lock_conn(&self.conn)?;
        let tx = conn.transaction()?;

        let app = tx
            .query_row(
                &format!(
                    "SELECT {} FROM applications WHERE id = ?1",
                    APPLICATION_COLUMNS
                ),
                params![application_id],
                row_to_application,
            )
            .optional()?
            .ok_or_else(|| WorklinkError::ApplicationNotFound {
                application_id: application_id.to_string(),
            })?;

        if app.status != ApplicationStatus::Pending {
            return Err(WorklinkError::InvalidTransition {
                from: app.status.to_string(),
                action: "approve_application".to_string(),
            });
        }

        // The email may have been taken by a client signup since submission.
        let taken: Option<String> = tx
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![app.email],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(WorklinkError::EmailTaken {
                email: app.email.clone(),
            });
        }

        let (digest, salt): (String, String) = tx.query_row(
            "SELECT password_digest, password_salt FROM applications WHERE id = ?1",
            params![application_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let user_id = uuid::Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let skills_json = serde_json::to_string(&app.skills)?;

        tx.execute(
            "INSERT INTO users (id, role, name, email, phone, password_digest, password_salt,
                                blocked, created_at, skills_json)
             VALUES (?1, 'student', ?2, ?3, NULL, ?4, ?5, 0, ?6, ?7)",
            params![user_id, app.name, app.email, digest, salt, now, skills_json],
        )?;
        tx.execute(
            "INSERT INTO student_performance (student_id, updated_at) VALUES (?1, ?2)",
            params![user_id, now],
        )?;
        tx.execute(
            "UPDATE applications SET status = 'approved', reviewed_by = ?1, reviewed_at = ?2,
                                     review_note = ?3
             WHERE id = ?4",
            params![reviewer_id, now, note, application_id],
        )?;

        tx.commit()?;
        info!(
            "Approved application {} -> student account {}",
            application_id, user_id
        );
        drop(conn);

        let app = self.get(application_id)?.ok_or_else(|| WorklinkError::Database {
            message: "Application disappeared after approval".to_string(),
            source: None,
        })?;
        let conn = lock_conn(&self.conn)?;
        let user = conn.query_row(
            "SELECT id, role, name, email, phone, blocked, created_at, last_login,
                    skills_json, upi_id, bio, organization
             FROM users WHERE id = ?1",
            params![user_id],
            row_to_user,
        )?;
        Ok((app, user))
    }

    /// Reject a pending application.
    pub fn reject(
        &self,
        application_id: &str,
        reviewer_id: &str,
        note: Option<&str>,
    ) -> Result<Application> {
        let conn = lock_conn(&self.conn)?;

        let status: Option<ApplicationStatus> = conn
            .query_row(
                "SELECT status FROM applications WHERE id = ?1",
                params![application_id],
                |row| row.get(0),
            )
            .optional()?;
        let status = status.ok_or_else(|| WorklinkError::ApplicationNotFound {
            application_id: application_id.to_string(),
        })?;
        if status != ApplicationStatus::Pending {
            return Err(WorklinkError::InvalidTransition {
                from: status.to_string(),
                action: "reject_application".to_string(),
            });
        }

        conn.execute(
            "UPDATE applications SET status = 'rejected', reviewed_by = ?1, reviewed_at = ?2,
                                     review_note = ?3
             WHERE id = ?4",
            params![reviewer_id, now_rfc3339(), note, application_id],
        )?;
        info!("Rejected application {}", application_id);
        drop(conn);

        self.get(application_id)?
            .ok_or_else(|| WorklinkError::Database {
                message: "Application disappeared after rejection".to_string(),
                source: None,
            })
    }
}

fn row_to_application(row: &Row<'_>) -> rusqlite::Result<Application> {
    let skills_json: String = row.get(3)?;
    Ok(Application {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        skills: serde_json::from_str(&skills_json).unwrap_or_default(),
        resume_ref: row.get(4)?,
        cover_note: row.get(5)?,
        status: row.get(6)?,
        submitted_at: row.get(7)?,
        reviewed_by: row.get(8)?,
        reviewed_at: row.get(9)?,
        review_note: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Role;
    use crate::store::users::{NewUser, UserStore};
    use crate::store::Database;

    fn new_app(email: &str) -> NewApplication {
        NewApplication {
            name: "Ravi Student".into(),
            email: email.into(),
            password_digest: "digest".into(),
            password_salt: "salt".into(),
            skills: vec!["rust".into(), "sql".into()],
            resume_ref: Some("resumes/ravi.pdf".into()),
            cover_note: None,
        }
    }

    #[test]
    fn test_submit_and_list_pending() {
        let db = Database::open_in_memory().unwrap();
        let store = ApplicationStore::new(&db);

        let app = store.create(new_app("ravi@example.com")).unwrap();
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert_eq!(app.skills.len(), 2);

        let pending = store.list(Some(ApplicationStatus::Pending)).unwrap();
        assert_eq!(pending.len(), 1);
        assert!(store
            .list(Some(ApplicationStatus::Approved))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_duplicate_pending_email_rejected() {
        let db = Database::open_in_memory().unwrap();
        let store = ApplicationStore::new(&db);

        store.create(new_app("ravi@example.com")).unwrap();
        let err = store.create(new_app("Ravi@Example.com")).unwrap_err();
        assert!(matches!(err, WorklinkError::EmailTaken { .. }));
    }

    #[test]
    fn test_approve_mints_student_with_performance_row() {
        let db = Database::open_in_memory().unwrap();
        let store = ApplicationStore::new(&db);
        let users = UserStore::new(&db);

        let app = store.create(new_app("ravi@example.com")).unwrap();
        let (app, user) = store.approve(&app.id, "admin-1", Some("solid resume")).unwrap();

        assert_eq!(app.status, ApplicationStatus::Approved);
        assert_eq!(app.reviewed_by.as_deref(), Some("admin-1"));
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.email, "ravi@example.com");
        assert_eq!(user.skills, vec!["rust".to_string(), "sql".to_string()]);

        // Credential material carried over: the student can be looked up for login.
        let creds = users.credentials_by_email("ravi@example.com").unwrap().unwrap();
        assert_eq!(creds.digest, "digest");

        // Zeroed performance row exists.
        let count: i64 = db
            .lock()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM student_performance WHERE student_id = ?1",
                params![user.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_approve_twice_is_invalid_transition() {
        let db = Database::open_in_memory().unwrap();
        let store = ApplicationStore::new(&db);

        let app = store.create(new_app("ravi@example.com")).unwrap();
        store.approve(&app.id, "admin-1", None).unwrap();

        let err = store.approve(&app.id, "admin-1", None).unwrap_err();
        assert!(matches!(err, WorklinkError::InvalidTransition { .. }));
    }

    #[test]
    fn test_approve_fails_when_email_taken_since_submission() {
        let db = Database::open_in_memory().unwrap();
        let store = ApplicationStore::new(&db);
        let users = UserStore::new(&db);

        let app = store.create(new_app("ravi@example.com")).unwrap();
        users
            .create(NewUser {
                role: Role::Client,
                name: "Squatter".into(),
                email: "ravi@example.com".into(),
                phone: None,
                password_digest: "d".into(),
                password_salt: "s".into(),
                skills: vec![],
                organization: None,
            })
            .unwrap();

        let err = store.approve(&app.id, "admin-1", None).unwrap_err();
        assert!(matches!(err, WorklinkError::EmailTaken { .. }));

        // Application stays pending for a later decision.
        let app = store.get(&app.id).unwrap().unwrap();
        assert_eq!(app.status, ApplicationStatus::Pending);
    }

    #[test]
    fn test_reject() {
        let db = Database::open_in_memory().unwrap();
        let store = ApplicationStore::new(&db);

        let app = store.create(new_app("ravi@example.com")).unwrap();
        let app = store.reject(&app.id, "admin-1", Some("no portfolio")).unwrap();

        assert_eq!(app.status, ApplicationStatus::Rejected);
        assert_eq!(app.review_note.as_deref(), Some("no portfolio"));
    }

    #[test]
    fn test_review_unknown_application() {
        let db = Database::open_in_memory().unwrap();
        let store = ApplicationStore::new(&db);

        let err = store.reject("missing", "admin-1", None).unwrap_err();
        assert!(matches!(err, WorklinkError::ApplicationNotFound { .. }));
    }
}
