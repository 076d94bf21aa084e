//! User administration and dashboard methods on WorklinkApi.

use crate::config::Role;
use crate::error::{Result, WorklinkError};
use crate::models::{AuthContext, User};
use crate::reports::DashboardReport;
use crate::WorklinkApi;
use tracing::info;

impl WorklinkApi {
    /// List accounts. Admin only.
    pub fn list_users(
        &self,
        ctx: &AuthContext,
        role: Option<Role>,
        include_blocked: bool,
    ) -> Result<Vec<User>> {
        if !ctx.is_admin() {
            return Err(WorklinkError::forbidden("list_users"));
        }
        self.users.list(role, include_blocked)
    }

    /// Block an account and kill its sessions. Admin only; admins cannot be
    /// blocked, including the caller themselves.
    pub fn block_user(&self, ctx: &AuthContext, user_id: &str) -> Result<User> {
        if !ctx.is_admin() {
            return Err(WorklinkError::forbidden("block_user"));
        }
        let user = self
            .users
            .get(user_id)?
            .ok_or_else(|| WorklinkError::UserNotFound {
                user_id: user_id.to_string(),
            })?;
        if user.role == Role::Admin {
            return Err(WorklinkError::forbidden("block_user: target is an admin"));
        }

        self.users.set_blocked(user_id, true)?;
        self.sessions.delete_for_user(user_id)?;
        info!("Blocked user {} ({})", user_id, user.email);

        self.users
            .get(user_id)?
            .ok_or_else(|| WorklinkError::UserNotFound {
                user_id: user_id.to_string(),
            })
    }

    /// Lift a block. Admin only.
    pub fn unblock_user(&self, ctx: &AuthContext, user_id: &str) -> Result<User> {
        if !ctx.is_admin() {
            return Err(WorklinkError::forbidden("unblock_user"));
        }
        let unblocked = self.users.set_blocked(user_id, false)?;
        if !unblocked {
            return Err(WorklinkError::UserNotFound {
                user_id: user_id.to_string(),
            });
        }
        info!("Unblocked user {}", user_id);

        self.users
            .get(user_id)?
            .ok_or_else(|| WorklinkError::UserNotFound {
                user_id: user_id.to_string(),
            })
    }

    /// Platform-wide aggregate counts. Admin only.
    pub fn get_dashboard(&self, ctx: &AuthContext) -> Result<DashboardReport> {
        if !ctx.is_admin() {
            return Err(WorklinkError::forbidden("get_dashboard"));
        }
        self.reporter.dashboard()
    }
}
