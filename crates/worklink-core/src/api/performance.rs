//! Student performance methods on WorklinkApi.

use crate::config::{ReportsConfig, Role};
use crate::error::{Result, WorklinkError};
use crate::models::{AuthContext, StudentPerformance};
use crate::WorklinkApi;

impl WorklinkApi {
    /// A student's counters: the student themselves, or any admin or client
    /// (clients vet students before approving an assignment).
    pub fn get_student_performance(
        &self,
        ctx: &AuthContext,
        student_id: &str,
    ) -> Result<StudentPerformance> {
        let allowed = match ctx.role {
            Role::Admin | Role::Client => true,
            Role::Student => ctx.user_id == student_id,
        };
        if !allowed {
            return Err(WorklinkError::forbidden("get_student_performance"));
        }
        self.performance.get(student_id)
    }

    /// Leaderboard of students by completion rate, then earnings.
    pub fn top_students(
        &self,
        _ctx: &AuthContext,
        limit: Option<usize>,
    ) -> Result<Vec<StudentPerformance>> {
        let limit = limit.unwrap_or(ReportsConfig::LEADERBOARD_DEFAULT_LIMIT);
        self.performance.top_students(limit)
    }
}
