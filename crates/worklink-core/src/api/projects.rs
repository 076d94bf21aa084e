//! Project methods on WorklinkApi.

use crate::config::Role;
use crate::error::{Result, WorklinkError};
use crate::models::{AuthContext, Project, ProjectSpec, ProjectStatus, ProjectUpdate, Work};
use crate::WorklinkApi;
use chrono::DateTime;
use tracing::info;

impl WorklinkApi {
    // ========================================
    // CRUD
    // ========================================

    /// Post a project. Client only.
    pub fn create_project(&self, ctx: &AuthContext, spec: &ProjectSpec) -> Result<Project> {
        if ctx.role != Role::Client {
            return Err(WorklinkError::forbidden("create_project"));
        }
        validate_spec(spec)?;

        self.projects.create(&ctx.user_id, spec)
    }

    /// Fetch a project the caller is allowed to see.
    pub fn get_project(&self, ctx: &AuthContext, project_id: &str) -> Result<Project> {
        let project = self.projects.require(project_id)?;
        if !can_see(ctx, &project) {
            // Users are not told about projects outside their scope.
            return Err(WorklinkError::ProjectNotFound {
                project_id: project_id.to_string(),
            });
        }
        Ok(project)
    }

    /// List projects in the caller's scope, optionally by status.
    ///
    /// Admins see everything, clients their own postings, students the open
    /// board plus their own assignments.
    pub fn list_projects(
        &self,
        ctx: &AuthContext,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>> {
        match ctx.role {
            Role::Admin => self.projects.list_all(status),
            Role::Client => self.projects.list_for_client(&ctx.user_id, status),
            Role::Student => self.projects.list_for_student(&ctx.user_id, status),
        }
    }

    /// Edit an `open` project. Owning client only.
    pub fn update_project(
        &self,
        ctx: &AuthContext,
        project_id: &str,
        update: &ProjectUpdate,
    ) -> Result<Project> {
        let project = self.projects.require(project_id)?;
        if !(ctx.is_admin() || (ctx.role == Role::Client && project.client_id == ctx.user_id)) {
            return Err(WorklinkError::forbidden("update_project"));
        }
        if let Some(budget) = update.budget {
            validate_budget(budget)?;
        }
        if let Some(ref deadline) = update.deadline {
            validate_deadline(deadline)?;
        }

        self.projects.update(project_id, update)
    }

    /// Cancel an `open` or `assigned` project. Owner or admin.
    pub fn cancel_project(&self, ctx: &AuthContext, project_id: &str) -> Result<Project> {
        let project = self.projects.require(project_id)?;
        if !(ctx.is_admin() || (ctx.role == Role::Client && project.client_id == ctx.user_id)) {
            return Err(WorklinkError::forbidden("cancel_project"));
        }
        self.projects.cancel(project_id)
    }

    // ========================================
    // Assignment
    // ========================================

    /// Propose a student for an open project. Admin only.
    pub fn assign_project(
        &self,
        ctx: &AuthContext,
        project_id: &str,
        student_id: &str,
    ) -> Result<Project> {
        if !ctx.is_admin() {
            return Err(WorklinkError::forbidden("assign_project"));
        }

        let student = self
            .users
            .get(student_id)?
            .ok_or_else(|| WorklinkError::UserNotFound {
                user_id: student_id.to_string(),
            })?;
        if student.role != Role::Student {
            return Err(WorklinkError::validation(
                "student_id",
                "user is not a student",
            ));
        }
        if student.blocked {
            return Err(WorklinkError::validation("student_id", "student is blocked"));
        }

        self.projects.assign(project_id, student_id)
    }

    /// Client approves the proposed student; the work record is created.
    pub fn approve_assignment(&self, ctx: &AuthContext, project_id: &str) -> Result<Work> {
        self.workflow.approve_assignment(ctx, project_id)
    }

    /// Client declines the proposed student; the project reopens.
    pub fn reject_assignment(&self, ctx: &AuthContext, project_id: &str) -> Result<Project> {
        let project = self.projects.require(project_id)?;
        if !(ctx.is_admin() || (ctx.role == Role::Client && project.client_id == ctx.user_id)) {
            return Err(WorklinkError::forbidden("reject_assignment"));
        }
        let project = self.projects.clear_assignment(project_id)?;
        info!("Assignment rejected on project {}", project_id);
        Ok(project)
    }
}

fn can_see(ctx: &AuthContext, project: &Project) -> bool {
    match ctx.role {
        Role::Admin => true,
        Role::Client => project.client_id == ctx.user_id,
        Role::Student => {
            project.status == ProjectStatus::Open
                || project.assigned_student.as_deref() == Some(ctx.user_id.as_str())
        }
    }
}

fn validate_spec(spec: &ProjectSpec) -> Result<()> {
    if spec.title.trim().is_empty() {
        return Err(WorklinkError::validation("title", "must not be empty"));
    }
    if spec.description.trim().is_empty() {
        return Err(WorklinkError::validation("description", "must not be empty"));
    }
    validate_budget(spec.budget)?;
    validate_deadline(&spec.deadline)
}

fn validate_budget(budget: i64) -> Result<()> {
    if budget <= 0 {
        return Err(WorklinkError::validation("budget", "must be positive"));
    }
    Ok(())
}

fn validate_deadline(deadline: &str) -> Result<()> {
    DateTime::parse_from_rfc3339(deadline)
        .map(|_| ())
        .map_err(|_| WorklinkError::validation("deadline", "not an RFC 3339 timestamp"))
}
