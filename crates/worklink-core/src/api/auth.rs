//! Account and session methods on WorklinkApi.

use crate::auth;
use crate::config::Role;
use crate::error::{Result, WorklinkError};
use crate::models::{AuthContext, Session, User};
use crate::store::NewUser;
use crate::WorklinkApi;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

impl WorklinkApi {
    // ========================================
    // Registration & login
    // ========================================

    /// Register a client account. Students enter via `submit_application`.
    pub fn register_client(
        &self,
        name: &str,
        email: &str,
        password: &str,
        organization: Option<&str>,
    ) -> Result<User> {
        if name.trim().is_empty() {
            return Err(WorklinkError::validation("name", "must not be empty"));
        }
        auth::validate_email(email)?;
        auth::validate_password(password)?;

        let hashed = auth::hash_password(password);
        let user = self.users.create(NewUser {
            role: Role::Client,
            name: name.trim().to_string(),
            email: email.to_string(),
            phone: None,
            password_digest: hashed.digest,
            password_salt: hashed.salt,
            skills: vec![],
            organization: organization.map(String::from),
        })?;

        info!("Registered client {}", user.email);
        Ok(user)
    }

    /// Verify credentials and issue a session.
    pub fn login(&self, email: &str, password: &str) -> Result<(Session, User)> {
        let creds = self
            .users
            .credentials_by_email(email)?
            .ok_or(WorklinkError::InvalidCredentials)?;

        if !auth::verify_password(password, &creds.salt, &creds.digest) {
            debug!("Failed login attempt for {}", email);
            return Err(WorklinkError::InvalidCredentials);
        }

        let user = self
            .users
            .get(&creds.user_id)?
            .ok_or(WorklinkError::InvalidCredentials)?;
        if user.blocked {
            warn!("Blocked account {} attempted login", user.email);
            return Err(WorklinkError::AccountBlocked);
        }

        let session = self.sessions.create(&user.id)?;
        self.users.touch_last_login(&user.id)?;
        info!("User {} logged in", user.email);

        Ok((session, user))
    }

    /// Invalidate a session token.
    pub fn logout(&self, token: &str) -> Result<bool> {
        self.sessions.delete(token)
    }

    /// Resolve a session token into an authenticated caller.
    ///
    /// Expired sessions are deleted on sight; blocked accounts fail even
    /// with a live token.
    pub fn authenticate(&self, token: &str) -> Result<AuthContext> {
        let session = self
            .sessions
            .get(token)?
            .ok_or(WorklinkError::SessionNotFound)?;

        if is_expired(&session.expires_at) {
            let _ = self.sessions.delete(token);
            return Err(WorklinkError::SessionExpired);
        }

        let user = self
            .users
            .get(&session.user_id)?
            .ok_or(WorklinkError::SessionNotFound)?;
        if user.blocked {
            return Err(WorklinkError::AccountBlocked);
        }

        self.sessions.touch(token)?;
        Ok(AuthContext {
            user_id: user.id,
            role: user.role,
        })
    }

    /// The account behind a session token.
    pub fn current_user(&self, token: &str) -> Result<User> {
        let ctx = self.authenticate(token)?;
        self.users
            .get(&ctx.user_id)?
            .ok_or(WorklinkError::SessionNotFound)
    }

    /// Change the caller's password, re-checking the old one.
    pub fn change_password(&self, ctx: &AuthContext, old: &str, new: &str) -> Result<bool> {
        auth::validate_password(new)?;

        let creds = self
            .users
            .credentials_by_id(&ctx.user_id)?
            .ok_or_else(|| WorklinkError::UserNotFound {
                user_id: ctx.user_id.clone(),
            })?;
        if !auth::verify_password(old, &creds.salt, &creds.digest) {
            return Err(WorklinkError::InvalidCredentials);
        }

        let hashed = auth::hash_password(new);
        self.users
            .set_password(&ctx.user_id, &hashed.digest, &hashed.salt)
    }

    // ========================================
    // Profiles
    // ========================================

    /// Update the caller's student profile fields.
    pub fn update_student_profile(
        &self,
        ctx: &AuthContext,
        skills: Option<&[String]>,
        upi_id: Option<&str>,
        bio: Option<&str>,
    ) -> Result<User> {
        if ctx.role != Role::Student {
            return Err(WorklinkError::forbidden("update_student_profile"));
        }
        if let Some(upi) = upi_id {
            auth::validate_upi_handle(upi)?;
        }

        self.users
            .update_student_profile(&ctx.user_id, skills, upi_id, bio)?;
        self.users
            .get(&ctx.user_id)?
            .ok_or_else(|| WorklinkError::UserNotFound {
                user_id: ctx.user_id.clone(),
            })
    }

    /// Update the caller's client profile fields.
    pub fn update_client_profile(
        &self,
        ctx: &AuthContext,
        organization: Option<&str>,
        phone: Option<&str>,
    ) -> Result<User> {
        if ctx.role != Role::Client {
            return Err(WorklinkError::forbidden("update_client_profile"));
        }

        self.users
            .update_client_profile(&ctx.user_id, organization, phone)?;
        self.users
            .get(&ctx.user_id)?
            .ok_or_else(|| WorklinkError::UserNotFound {
                user_id: ctx.user_id.clone(),
            })
    }
}

fn is_expired(expires_at: &str) -> bool {
    match DateTime::parse_from_rfc3339(expires_at) {
        Ok(expiry) => expiry < Utc::now(),
        Err(_) => {
            warn!("Unparseable session expiry {:?}; treating as expired", expires_at);
            true
        }
    }
}
