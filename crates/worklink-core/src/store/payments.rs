//! Payment proof store.
//!
//! Proof rows are immutable history; inserts and status marks happen inside
//! workflow transactions. This store serves reads.

use super::lock_conn;
use crate::models::PaymentProof;
use crate::{Result, WorklinkError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub(crate) const PROOF_COLUMNS: &str =
    "id, work_id, submitted_by, upi_reference, payer_upi, payee_upi, amount, note, \
     screenshot_ref, status, submitted_at, resolved_by, resolved_at, resolution_note";

pub struct PaymentStore {
    conn: Arc<Mutex<Connection>>,
}

impl PaymentStore {
    pub fn new(db: &super::Database) -> Self {
        Self { conn: db.handle() }
    }

    /// All proofs of a work, newest first.
    pub fn list_for_work(&self, work_id: &str) -> Result<Vec<PaymentProof>> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM payment_proofs WHERE work_id = ?1
             ORDER BY submitted_at DESC, rowid DESC",
            PROOF_COLUMNS
        ))?;
        let rows: Vec<PaymentProof> = stmt
            .query_map(params![work_id], row_to_proof)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    /// The live proof of a work: its newest row.
    pub fn latest_for_work(&self, work_id: &str) -> Result<Option<PaymentProof>> {
        let conn = lock_conn(&self.conn)?;
        let result = conn
            .query_row(
                &format!(
                    "SELECT {} FROM payment_proofs WHERE work_id = ?1
                     ORDER BY submitted_at DESC, rowid DESC LIMIT 1",
                    PROOF_COLUMNS
                ),
                params![work_id],
                row_to_proof,
            )
            .optional()?;
        Ok(result)
    }

    /// The live proof, or `ProofNotFound`.
    pub fn require_latest(&self, work_id: &str) -> Result<PaymentProof> {
        self.latest_for_work(work_id)?
            .ok_or_else(|| WorklinkError::ProofNotFound {
                work_id: work_id.to_string(),
            })
    }
}

pub(crate) fn row_to_proof(row: &Row<'_>) -> rusqlite::Result<PaymentProof> {
    Ok(PaymentProof {
        id: row.get(0)?,
        work_id: row.get(1)?,
        submitted_by: row.get(2)?,
        upi_reference: row.get(3)?,
        payer_upi: row.get(4)?,
        payee_upi: row.get(5)?,
        amount: row.get(6)?,
        note: row.get(7)?,
        screenshot_ref: row.get(8)?,
        status: row.get(9)?,
        submitted_at: row.get(10)?,
        resolved_by: row.get(11)?,
        resolved_at: row.get(12)?,
        resolution_note: row.get(13)?,
    })
}
