//! Work lifecycle types.

use serde::{Deserialize, Serialize};

/// Stage of a work record.
///
/// Stages advance only through the workflow engine; see `workflow` for the
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStage {
    InProgress,
    CompletionSubmitted,
    PaymentSubmitted,
    PaymentConfirmed,
    PaymentDisputed,
    Delivered,
    Cancelled,
}

impl WorkStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStage::InProgress => "in_progress",
            WorkStage::CompletionSubmitted => "completion_submitted",
            WorkStage::PaymentSubmitted => "payment_submitted",
            WorkStage::PaymentConfirmed => "payment_confirmed",
            WorkStage::PaymentDisputed => "payment_disputed",
            WorkStage::Delivered => "delivered",
            WorkStage::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(WorkStage::InProgress),
            "completion_submitted" => Some(WorkStage::CompletionSubmitted),
            "payment_submitted" => Some(WorkStage::PaymentSubmitted),
            "payment_confirmed" => Some(WorkStage::PaymentConfirmed),
            "payment_disputed" => Some(WorkStage::PaymentDisputed),
            "delivered" => Some(WorkStage::Delivered),
            "cancelled" => Some(WorkStage::Cancelled),
            _ => None,
        }
    }

    /// True for stages that still need somebody to act.
    pub fn is_live(&self) -> bool {
        !matches!(self, WorkStage::Delivered | WorkStage::Cancelled)
    }
}

impl std::fmt::Display for WorkStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl rusqlite::types::ToSql for WorkStage {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for WorkStage {
    fn column_result(
        value: rusqlite::types::ValueRef<'_>,
    ) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        WorkStage::from_str(s).ok_or(rusqlite::types::FromSqlError::InvalidType)
    }
}

/// The tracked engagement created when a client approves an assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Work {
    pub id: String,
    pub project_id: String,
    pub client_id: String,
    pub student_id: String,
    pub stage: WorkStage,
    pub approved_at: String,
    pub completion_note: Option<String>,
    /// Opaque reference to the deliverable; gated by `deliverable_unlocked`.
    pub deliverable_ref: Option<String>,
    pub completion_submitted_at: Option<String>,
    pub deliverable_unlocked: bool,
    pub completed_at: Option<String>,
    pub cancel_reason: Option<String>,
    pub updated_at: String,
}
