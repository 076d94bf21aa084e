//! Payment proof types.

use serde::{Deserialize, Serialize};

/// State of a single payment proof row.
///
/// Rows are immutable history: rejection or verification marks the row and
/// later submissions append new rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofStatus {
    Submitted,
    Confirmed,
    Disputed,
    Verified,
    Rejected,
}

impl ProofStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofStatus::Submitted => "submitted",
            ProofStatus::Confirmed => "confirmed",
            ProofStatus::Disputed => "disputed",
            ProofStatus::Verified => "verified",
            ProofStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(ProofStatus::Submitted),
            "confirmed" => Some(ProofStatus::Confirmed),
            "disputed" => Some(ProofStatus::Disputed),
            "verified" => Some(ProofStatus::Verified),
            "rejected" => Some(ProofStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl rusqlite::types::ToSql for ProofStatus {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for ProofStatus {
    fn column_result(
        value: rusqlite::types::ValueRef<'_>,
    ) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        ProofStatus::from_str(s).ok_or(rusqlite::types::FromSqlError::InvalidType)
    }
}

/// A client-submitted record of a UPI transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProof {
    pub id: String,
    pub work_id: String,
    pub submitted_by: String,
    /// 12-digit UTR of the transfer.
    pub upi_reference: String,
    pub payer_upi: String,
    pub payee_upi: String,
    /// Whole rupees.
    pub amount: i64,
    pub note: Option<String>,
    pub screenshot_ref: Option<String>,
    pub status: ProofStatus,
    pub submitted_at: String,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<String>,
    pub resolution_note: Option<String>,
}

/// Fields for submitting a payment proof.
#[derive(Debug, Clone, Deserialize)]
pub struct ProofSpec {
    pub upi_reference: String,
    pub payer_upi: String,
    pub payee_upi: String,
    pub amount: i64,
    pub note: Option<String>,
    pub screenshot_ref: Option<String>,
}
