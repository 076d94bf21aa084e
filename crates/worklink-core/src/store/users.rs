//! Account store.

use super::{lock_conn, now_rfc3339};
use crate::config::Role;
use crate::models::User;
use crate::{Result, WorklinkError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

const USER_COLUMNS: &str = "id, role, name, email, phone, blocked, created_at, last_login, \
                            skills_json, upi_id, bio, organization";

/// Fields for inserting an account row.
///
/// Built by the API layer (client self-registration) and by application
/// approval (student accounts).
pub struct NewUser {
    pub role: Role,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_digest: String,
    pub password_salt: String,
    pub skills: Vec<String>,
    pub organization: Option<String>,
}

/// Stored credential material for one account.
pub struct CredentialRow {
    pub user_id: String,
    pub digest: String,
    pub salt: String,
}

pub struct UserStore {
    conn: Arc<Mutex<Connection>>,
}

impl UserStore {
    pub fn new(db: &super::Database) -> Self {
        Self { conn: db.handle() }
    }

    /// Insert an account. Fails with `EmailTaken` on a duplicate email.
    pub fn create(&self, new_user: NewUser) -> Result<User> {
        let conn = lock_conn(&self.conn)?;
        let email = new_user.email.to_lowercase();

        let exists: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(WorklinkError::EmailTaken { email });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let skills_json = serde_json::to_string(&new_user.skills)?;

        conn.execute(
            "INSERT INTO users (id, role, name, email, phone, password_digest, password_salt,
                                blocked, created_at, skills_json, upi_id, bio, organization)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, NULL, NULL, ?10)",
            params![
                id,
                new_user.role,
                new_user.name,
                email,
                new_user.phone,
                new_user.password_digest,
                new_user.password_salt,
                now,
                skills_json,
                new_user.organization,
            ],
        )?;

        debug!("Created {} account {} ({})", new_user.role, id, email);
        drop(conn);

        self.get(&id)?.ok_or_else(|| WorklinkError::Database {
            message: "User disappeared after insert".to_string(),
            source: None,
        })
    }

    pub fn get(&self, user_id: &str) -> Result<Option<User>> {
        let conn = lock_conn(&self.conn)?;
        let result = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![user_id],
                row_to_user,
            )
            .optional()?;
        Ok(result)
    }

    pub fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = lock_conn(&self.conn)?;
        let result = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email.to_lowercase()],
                row_to_user,
            )
            .optional()?;
        Ok(result)
    }

    /// Credential material for a login attempt.
    pub fn credentials_by_email(&self, email: &str) -> Result<Option<CredentialRow>> {
        let conn = lock_conn(&self.conn)?;
        let result = conn
            .query_row(
                "SELECT id, password_digest, password_salt FROM users WHERE email = ?1",
                params![email.to_lowercase()],
                |row| {
                    Ok(CredentialRow {
                        user_id: row.get(0)?,
                        digest: row.get(1)?,
                        salt: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    /// Credential material for a password change.
    pub fn credentials_by_id(&self, user_id: &str) -> Result<Option<CredentialRow>> {
        let conn = lock_conn(&self.conn)?;
        let result = conn
            .query_row(
                "SELECT id, password_digest, password_salt FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(CredentialRow {
                        user_id: row.get(0)?,
                        digest: row.get(1)?,
                        salt: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    pub fn set_password(&self, user_id: &str, digest: &str, salt: &str) -> Result<bool> {
        let conn = lock_conn(&self.conn)?;
        let rows = conn.execute(
            "UPDATE users SET password_digest = ?1, password_salt = ?2 WHERE id = ?3",
            params![digest, salt, user_id],
        )?;
        Ok(rows > 0)
    }

    pub fn touch_last_login(&self, user_id: &str) -> Result<()> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![now_rfc3339(), user_id],
        )?;
        Ok(())
    }

    pub fn set_blocked(&self, user_id: &str, blocked: bool) -> Result<bool> {
        let conn = lock_conn(&self.conn)?;
        let rows = conn.execute(
            "UPDATE users SET blocked = ?1 WHERE id = ?2",
            params![blocked, user_id],
        )?;
        if rows > 0 {
            debug!("Set blocked={} for user {}", blocked, user_id);
        }
        Ok(rows > 0)
    }

    pub fn list(&self, role: Option<Role>, include_blocked: bool) -> Result<Vec<User>> {
        let conn = lock_conn(&self.conn)?;
        let mut sql = format!("SELECT {} FROM users WHERE 1=1", USER_COLUMNS);
        if role.is_some() {
            sql.push_str(" AND role = ?1");
        }
        if !include_blocked {
            sql.push_str(" AND blocked = 0");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<User> = match role {
            Some(r) => stmt
                .query_map(params![r], row_to_user)?
                .collect::<rusqlite::Result<_>>()?,
            None => stmt
                .query_map([], row_to_user)?
                .collect::<rusqlite::Result<_>>()?,
        };
        Ok(rows)
    }

    /// Update student-side profile fields; `None` leaves a field untouched.
    pub fn update_student_profile(
        &self,
        user_id: &str,
        skills: Option<&[String]>,
        upi_id: Option<&str>,
        bio: Option<&str>,
    ) -> Result<()> {
        let conn = lock_conn(&self.conn)?;
        if let Some(skills) = skills {
            let skills_json = serde_json::to_string(skills)?;
            conn.execute(
                "UPDATE users SET skills_json = ?1 WHERE id = ?2",
                params![skills_json, user_id],
            )?;
        }
        if let Some(upi_id) = upi_id {
            conn.execute(
                "UPDATE users SET upi_id = ?1 WHERE id = ?2",
                params![upi_id, user_id],
            )?;
        }
        if let Some(bio) = bio {
            conn.execute(
                "UPDATE users SET bio = ?1 WHERE id = ?2",
                params![bio, user_id],
            )?;
        }
        Ok(())
    }

    /// Update client-side profile fields; `None` leaves a field untouched.
    pub fn update_client_profile(
        &self,
        user_id: &str,
        organization: Option<&str>,
        phone: Option<&str>,
    ) -> Result<()> {
        let conn = lock_conn(&self.conn)?;
        if let Some(organization) = organization {
            conn.execute(
                "UPDATE users SET organization = ?1 WHERE id = ?2",
                params![organization, user_id],
            )?;
        }
        if let Some(phone) = phone {
            conn.execute(
                "UPDATE users SET phone = ?1 WHERE id = ?2",
                params![phone, user_id],
            )?;
        }
        Ok(())
    }

    pub fn email_in_use(&self, email: &str) -> Result<bool> {
        let conn = lock_conn(&self.conn)?;
        let exists: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![email.to_lowercase()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }
}

pub(crate) fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let skills_json: String = row.get(8)?;
    Ok(User {
        id: row.get(0)?,
        role: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        blocked: row.get(5)?,
        created_at: row.get(6)?,
        last_login: row.get(7)?,
        skills: serde_json::from_str(&skills_json).unwrap_or_default(),
        upi_id: row.get(9)?,
        bio: row.get(10)?,
        organization: row.get(11)?,
    })
}
