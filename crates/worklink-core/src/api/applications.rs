//! Student application intake methods on WorklinkApi.

use crate::auth;
use crate::error::{Result, WorklinkError};
use crate::models::{Application, ApplicationStatus, AuthContext};
use crate::store::NewApplication;
use crate::WorklinkApi;
use tracing::info;

impl WorklinkApi {
    /// Submit a student application. No session required.
    pub fn submit_application(
        &self,
        name: &str,
        email: &str,
        password: &str,
        skills: Vec<String>,
        resume_ref: Option<&str>,
        cover_note: Option<&str>,
    ) -> Result<Application> {
        if name.trim().is_empty() {
            return Err(WorklinkError::validation("name", "must not be empty"));
        }
        auth::validate_email(email)?;
        auth::validate_password(password)?;

        let hashed = auth::hash_password(password);
        let application = self.applications.create(NewApplication {
            name: name.trim().to_string(),
            email: email.to_string(),
            password_digest: hashed.digest,
            password_salt: hashed.salt,
            skills,
            resume_ref: resume_ref.map(String::from),
            cover_note: cover_note.map(String::from),
        })?;

        info!("Application {} submitted", application.id);
        Ok(application)
    }

    /// List applications, optionally by status. Admin only.
    pub fn list_applications(
        &self,
        ctx: &AuthContext,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>> {
        if !ctx.is_admin() {
            return Err(WorklinkError::forbidden("list_applications"));
        }
        self.applications.list(status)
    }

    /// Fetch one application. Admin only.
    pub fn get_application(&self, ctx: &AuthContext, application_id: &str) -> Result<Application> {
        if !ctx.is_admin() {
            return Err(WorklinkError::forbidden("get_application"));
        }
        self.applications
            .get(application_id)?
            .ok_or_else(|| WorklinkError::ApplicationNotFound {
                application_id: application_id.to_string(),
            })
    }

    /// Approve or reject a pending application. Admin only.
    ///
    /// Approval mints the student account from the applicant's stored
    /// credential material.
    pub fn review_application(
        &self,
        ctx: &AuthContext,
        application_id: &str,
        approve: bool,
        note: Option<&str>,
    ) -> Result<Application> {
        if !ctx.is_admin() {
            return Err(WorklinkError::forbidden("review_application"));
        }

        if approve {
            let (application, _student) =
                self.applications.approve(application_id, &ctx.user_id, note)?;
            Ok(application)
        } else {
            self.applications.reject(application_id, &ctx.user_id, note)
        }
    }
}
