//! Work lifecycle methods on WorklinkApi.
//!
//! Stage and actor guards live in the workflow engine; this layer adds input
//! validation and read-side scoping.

use crate::auth;
use crate::config::Role;
use crate::error::{Result, WorklinkError};
use crate::models::{AuthContext, PaymentProof, ProofSpec, Work, WorkStage};
use crate::WorklinkApi;

impl WorklinkApi {
    // ========================================
    // Reads
    // ========================================

    /// Fetch a work the caller participates in (or any, for admins).
    pub fn get_work(&self, ctx: &AuthContext, work_id: &str) -> Result<Work> {
        let work = self.works.require(work_id)?;
        if !is_participant(ctx, &work) {
            return Err(WorklinkError::WorkNotFound {
                work_id: work_id.to_string(),
            });
        }
        Ok(work)
    }

    /// List works in the caller's scope, optionally by stage.
    pub fn list_works(&self, ctx: &AuthContext, stage: Option<WorkStage>) -> Result<Vec<Work>> {
        match ctx.role {
            Role::Admin => self.works.list_all(stage),
            Role::Client => self.works.list_for_client(&ctx.user_id, stage),
            Role::Student => self.works.list_for_student(&ctx.user_id, stage),
        }
    }

    /// Payment proof history of a work, newest first. Participants and admins.
    pub fn list_payment_proofs(
        &self,
        ctx: &AuthContext,
        work_id: &str,
    ) -> Result<Vec<PaymentProof>> {
        let work = self.works.require(work_id)?;
        if !is_participant(ctx, &work) {
            return Err(WorklinkError::WorkNotFound {
                work_id: work_id.to_string(),
            });
        }
        self.payments.list_for_work(work_id)
    }

    /// The deliverable reference, gated by the delivery lock.
    ///
    /// The work's student always sees their own deliverable; the client (and
    /// admins) only once the work is `delivered` and unlocked.
    pub fn get_deliverable(&self, ctx: &AuthContext, work_id: &str) -> Result<String> {
        let work = self.get_work(ctx, work_id)?;
        let deliverable =
            work.deliverable_ref
                .clone()
                .ok_or_else(|| WorklinkError::DeliverableLocked {
                    work_id: work_id.to_string(),
                })?;

        if ctx.role == Role::Student && work.student_id == ctx.user_id {
            return Ok(deliverable);
        }
        if work.stage == WorkStage::Delivered && work.deliverable_unlocked {
            return Ok(deliverable);
        }
        Err(WorklinkError::DeliverableLocked {
            work_id: work_id.to_string(),
        })
    }

    // ========================================
    // Transitions
    // ========================================

    /// Student hands in the finished work.
    pub fn submit_completion(
        &self,
        ctx: &AuthContext,
        work_id: &str,
        note: Option<&str>,
        deliverable_ref: &str,
    ) -> Result<Work> {
        if deliverable_ref.trim().is_empty() {
            return Err(WorklinkError::validation(
                "deliverable_ref",
                "must not be empty",
            ));
        }
        self.workflow
            .submit_completion(ctx, work_id, note, deliverable_ref)
    }

    /// Client records the UPI transfer they made.
    pub fn submit_payment_proof(
        &self,
        ctx: &AuthContext,
        work_id: &str,
        spec: &ProofSpec,
    ) -> Result<Work> {
        if spec.amount <= 0 {
            return Err(WorklinkError::validation("amount", "must be positive"));
        }
        auth::validate_utr(&spec.upi_reference)?;
        auth::validate_upi_handle(&spec.payer_upi)?;
        auth::validate_upi_handle(&spec.payee_upi)?;

        self.workflow.submit_payment_proof(ctx, work_id, spec)
    }

    /// Student attests the money arrived.
    pub fn confirm_payment(&self, ctx: &AuthContext, work_id: &str) -> Result<Work> {
        self.workflow.confirm_payment(ctx, work_id)
    }

    /// Student reports a missing or wrong transfer.
    pub fn dispute_payment(
        &self,
        ctx: &AuthContext,
        work_id: &str,
        reason: &str,
    ) -> Result<Work> {
        if reason.trim().is_empty() {
            return Err(WorklinkError::validation("reason", "must not be empty"));
        }
        self.workflow.dispute_payment(ctx, work_id, reason)
    }

    /// Admin arbitration: the payment is good.
    pub fn verify_payment(
        &self,
        ctx: &AuthContext,
        work_id: &str,
        note: Option<&str>,
    ) -> Result<Work> {
        self.workflow.verify_payment(ctx, work_id, note)
    }

    /// Admin arbitration: the proof is bad, client must resubmit.
    pub fn reject_payment(&self, ctx: &AuthContext, work_id: &str, note: &str) -> Result<Work> {
        if note.trim().is_empty() {
            return Err(WorklinkError::validation("note", "must not be empty"));
        }
        self.workflow.reject_payment(ctx, work_id, note)
    }

    /// Admin cancels a running work; the project reopens.
    pub fn cancel_work(&self, ctx: &AuthContext, work_id: &str, reason: &str) -> Result<Work> {
        if reason.trim().is_empty() {
            return Err(WorklinkError::validation("reason", "must not be empty"));
        }
        self.workflow.cancel_work(ctx, work_id, reason)
    }

    /// Admin re-locks a delivered work's deliverable.
    pub fn lock_delivery(&self, ctx: &AuthContext, work_id: &str) -> Result<Work> {
        self.workflow.set_delivery_lock(ctx, work_id, false)
    }

    /// Admin unlocks a delivered work's deliverable.
    pub fn unlock_delivery(&self, ctx: &AuthContext, work_id: &str) -> Result<Work> {
        self.workflow.set_delivery_lock(ctx, work_id, true)
    }
}

fn is_participant(ctx: &AuthContext, work: &Work) -> bool {
    ctx.is_admin() || work.client_id == ctx.user_id || work.student_id == ctx.user_id
}
