//! Project types.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a project.
///
/// `assigned` means an admin has proposed a student; `active` means the
/// client approved the proposal and a work record exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Open,
    Assigned,
    Active,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Open => "open",
            ProjectStatus::Assigned => "assigned",
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(ProjectStatus::Open),
            "assigned" => Some(ProjectStatus::Assigned),
            "active" => Some(ProjectStatus::Active),
            "completed" => Some(ProjectStatus::Completed),
            "cancelled" => Some(ProjectStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl rusqlite::types::ToSql for ProjectStatus {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for ProjectStatus {
    fn column_result(
        value: rusqlite::types::ValueRef<'_>,
    ) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        ProjectStatus::from_str(s).ok_or(rusqlite::types::FromSqlError::InvalidType)
    }
}

/// A client-posted project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub client_id: String,
    pub title: String,
    pub description: String,
    /// Whole rupees.
    pub budget: i64,
    /// RFC 3339 deadline.
    pub deadline: String,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub attachment_refs: Vec<String>,
    pub status: ProjectStatus,
    pub assigned_student: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for creating a project.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSpec {
    pub title: String,
    pub description: String,
    pub budget: i64,
    pub deadline: String,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub attachment_refs: Vec<String>,
}

/// Partial update applied to an `open` project; `None` fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub budget: Option<i64>,
    pub deadline: Option<String>,
    pub skills_required: Option<Vec<String>>,
    pub attachment_refs: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ProjectStatus::Open,
            ProjectStatus::Assigned,
            ProjectStatus::Active,
            ProjectStatus::Completed,
            ProjectStatus::Cancelled,
        ] {
            assert_eq!(ProjectStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ProjectStatus::from_str("archived"), None);
    }
}
