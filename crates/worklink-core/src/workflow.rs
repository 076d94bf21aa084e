//! The work lifecycle engine.
//!
//! All writes to `works` (and the project/performance side effects they
//! carry) happen here, inside one SQLite transaction per transition. Each
//! transition checks the actor (the work's own student or client; admins may
//! act on any work) and the current stage before touching a row.
//!
//! Transition table:
//!
//! | action                 | actor   | from                                                  | to                     |
//! |------------------------|---------|-------------------------------------------------------|------------------------|
//! | `approve_assignment`   | client  | project `assigned`                                    | work `in_progress`     |
//! | `submit_completion`    | student | `in_progress`                                         | `completion_submitted` |
//! | `submit_payment_proof` | client  | `completion_submitted`, `payment_disputed`            | `payment_submitted`    |
//! | `confirm_payment`      | student | `payment_submitted`                                   | `payment_confirmed`    |
//! | `dispute_payment`      | student | `payment_submitted`                                   | `payment_disputed`     |
//! | `verify_payment`       | admin   | `payment_confirmed`, `payment_disputed`               | `delivered`            |
//! | `reject_payment`       | admin   | `payment_submitted`, `payment_confirmed`, `payment_disputed` | `completion_submitted` |
//! | `cancel_work`          | admin   | `in_progress`                                         | `cancelled`            |

use crate::config::Role;
use crate::models::{AuthContext, ProofSpec, ProjectStatus, Work, WorkStage};
use crate::store::{lock_conn, now_rfc3339, row_to_work, Database, WORK_COLUMNS};
use crate::{Result, WorklinkError};
use chrono::DateTime;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub struct WorkflowEngine {
    conn: Arc<Mutex<Connection>>,
}

impl WorkflowEngine {
    pub fn new(db: &Database) -> Self {
        Self { conn: db.handle() }
    }

    /// Client approves an admin's assignment: the project goes `active` and
    /// the work record is born in `in_progress`.
    pub fn approve_assignment(&self, ctx: &AuthContext, project_id: &str) -> Result<Work> {
        let work_id = {
            let mut conn = lock_conn(&self.conn)?;
            let tx = conn.transaction()?;

            let (client_id, student_id, status): (String, Option<String>, ProjectStatus) = tx
                .query_row(
                    "SELECT client_id, assigned_student, status FROM projects WHERE id = ?1",
                    params![project_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?
                .ok_or_else(|| WorklinkError::ProjectNotFound {
                    project_id: project_id.to_string(),
                })?;

            ensure_actor(ctx, Role::Client, &client_id, "approve_assignment")?;
            if status != ProjectStatus::Assigned {
                return Err(WorklinkError::InvalidTransition {
                    from: status.to_string(),
                    action: "approve_assignment".to_string(),
                });
            }
            let student_id = student_id.ok_or_else(|| WorklinkError::Database {
                message: format!("Assigned project {} has no student", project_id),
                source: None,
            })?;

            let work_id = uuid::Uuid::new_v4().to_string();
            let now = now_rfc3339();

            tx.execute(
                "INSERT INTO works (id, project_id, client_id, student_id, stage, approved_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 'in_progress', ?5, ?5)",
                params![work_id, project_id, client_id, student_id, now],
            )?;
            tx.execute(
                "UPDATE projects SET status = 'active', updated_at = ?1 WHERE id = ?2",
                params![now, project_id],
            )?;
            bump_performance(
                &tx,
                &student_id,
                "assigned_count = assigned_count + 1",
                "assigned_count",
                &now,
            )?;

            tx.commit()?;
            info!(
                "Approved assignment: project {} -> work {} (student {})",
                project_id, work_id, student_id
            );
            work_id
        };

        self.fetch(&work_id)
    }

    /// Student hands in the finished work.
    pub fn submit_completion(
        &self,
        ctx: &AuthContext,
        work_id: &str,
        note: Option<&str>,
        deliverable_ref: &str,
    ) -> Result<Work> {
        {
            let mut conn = lock_conn(&self.conn)?;
            let tx = conn.transaction()?;
            let work = fetch_work_tx(&tx, work_id)?;

            ensure_actor(ctx, Role::Student, &work.student_id, "submit_completion")?;
            guard_stage(&work, &[WorkStage::InProgress], "submit_completion")?;

            let now = now_rfc3339();
            tx.execute(
                "UPDATE works SET stage = 'completion_submitted', completion_note = ?1,
                                  deliverable_ref = ?2, completion_submitted_at = ?3,
                                  updated_at = ?3
                 WHERE id = ?4",
                params![note, deliverable_ref, now, work_id],
            )?;

            tx.commit()?;
            info!("Completion submitted for work {}", work_id);
        }
        self.fetch(work_id)
    }

    /// Client records a UPI transfer; the proof row is appended and the work
    /// waits on the student's confirmation.
    pub fn submit_payment_proof(
        &self,
        ctx: &AuthContext,
        work_id: &str,
        spec: &ProofSpec,
    ) -> Result<Work> {
        {
            let mut conn = lock_conn(&self.conn)?;
            let tx = conn.transaction()?;
            let work = fetch_work_tx(&tx, work_id)?;

            ensure_actor(ctx, Role::Client, &work.client_id, "submit_payment_proof")?;
            guard_stage(
                &work,
                &[WorkStage::CompletionSubmitted, WorkStage::PaymentDisputed],
                "submit_payment_proof",
            )?;

            let proof_id = uuid::Uuid::new_v4().to_string();
            let now = now_rfc3339();
            tx.execute(
                "INSERT INTO payment_proofs (id, work_id, submitted_by, upi_reference, payer_upi,
                                             payee_upi, amount, note, screenshot_ref, status,
                                             submitted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'submitted', ?10)",
                params![
                    proof_id,
                    work_id,
                    ctx.user_id,
                    spec.upi_reference,
                    spec.payer_upi,
                    spec.payee_upi,
                    spec.amount,
                    spec.note,
                    spec.screenshot_ref,
                    now,
                ],
            )?;
            tx.execute(
                "UPDATE works SET stage = 'payment_submitted', updated_at = ?1 WHERE id = ?2",
                params![now, work_id],
            )?;

            tx.commit()?;
            info!(
                "Payment proof {} submitted for work {} (amount {})",
                proof_id, work_id, spec.amount
            );
        }
        self.fetch(work_id)
    }

    /// Student attests the UPI credit arrived.
    pub fn confirm_payment(&self, ctx: &AuthContext, work_id: &str) -> Result<Work> {
        self.student_payment_response(
            ctx,
            work_id,
            "confirm_payment",
            WorkStage::PaymentConfirmed,
            "confirmed",
            None,
        )
    }

    /// Student reports the money never arrived (or the proof is wrong).
    pub fn dispute_payment(
        &self,
        ctx: &AuthContext,
        work_id: &str,
        reason: &str,
    ) -> Result<Work> {
        self.student_payment_response(
            ctx,
            work_id,
            "dispute_payment",
            WorkStage::PaymentDisputed,
            "disputed",
            Some(reason),
        )
    }

    fn student_payment_response(
        &self,
        ctx: &AuthContext,
        work_id: &str,
        action: &str,
        target: WorkStage,
        proof_status: &str,
        reason: Option<&str>,
    ) -> Result<Work> {
        {
            let mut conn = lock_conn(&self.conn)?;
            let tx = conn.transaction()?;
            let work = fetch_work_tx(&tx, work_id)?;

            ensure_actor(ctx, Role::Student, &work.student_id, action)?;
            guard_stage(&work, &[WorkStage::PaymentSubmitted], action)?;

            let now = now_rfc3339();
            let proof_id = latest_proof_id(&tx, work_id)?;
            tx.execute(
                "UPDATE payment_proofs SET status = ?1, resolved_by = ?2, resolved_at = ?3,
                                           resolution_note = ?4
                 WHERE id = ?5",
                params![proof_status, ctx.user_id, now, reason, proof_id],
            )?;
            tx.execute(
                "UPDATE works SET stage = ?1, updated_at = ?2 WHERE id = ?3",
                params![target, now, work_id],
            )?;
            if target == WorkStage::PaymentDisputed {
                bump_performance(
                    &tx,
                    &work.student_id,
                    "disputed_count = disputed_count + 1",
                    "disputed_count",
                    &now,
                )?;
            }

            tx.commit()?;
            info!("Work {} payment {} by student", work_id, proof_status);
        }
        self.fetch(work_id)
    }

    /// Admin rules the payment good: proof verified, deliverable unlocked,
    /// project completed, performance credited.
    pub fn verify_payment(
        &self,
        ctx: &AuthContext,
        work_id: &str,
        note: Option<&str>,
    ) -> Result<Work> {
        {
            let mut conn = lock_conn(&self.conn)?;
            let tx = conn.transaction()?;
            let work = fetch_work_tx(&tx, work_id)?;

            ensure_admin(ctx, "verify_payment")?;
            guard_stage(
                &work,
                &[WorkStage::PaymentConfirmed, WorkStage::PaymentDisputed],
                "verify_payment",
            )?;

            let now = now_rfc3339();
            let proof_id = latest_proof_id(&tx, work_id)?;
            let amount: i64 = tx.query_row(
                "SELECT amount FROM payment_proofs WHERE id = ?1",
                params![proof_id],
                |row| row.get(0),
            )?;
            tx.execute(
                "UPDATE payment_proofs SET status = 'verified', resolved_by = ?1,
                                           resolved_at = ?2, resolution_note = ?3
                 WHERE id = ?4",
                params![ctx.user_id, now, note, proof_id],
            )?;
            tx.execute(
                "UPDATE works SET stage = 'delivered', deliverable_unlocked = 1,
                                  completed_at = ?1, updated_at = ?1
                 WHERE id = ?2",
                params![now, work_id],
            )?;
            tx.execute(
                "UPDATE projects SET status = 'completed', updated_at = ?1 WHERE id = ?2",
                params![now, work.project_id],
            )?;

            let deadline: String = tx.query_row(
                "SELECT deadline FROM projects WHERE id = ?1",
                params![work.project_id],
                |row| row.get(0),
            )?;
            let on_time = verified_before_deadline(&now, &deadline);

            tx.execute(
                "INSERT INTO student_performance
                     (student_id, completed_count, on_time_count, total_earnings, updated_at)
                 VALUES (?1, 1, ?2, ?3, ?4)
                 ON CONFLICT(student_id) DO UPDATE SET
                     completed_count = completed_count + 1,
                     on_time_count = on_time_count + excluded.on_time_count,
                     total_earnings = total_earnings + excluded.total_earnings,
                     updated_at = excluded.updated_at",
                params![work.student_id, if on_time { 1 } else { 0 }, amount, now],
            )?;

            tx.commit()?;
            info!(
                "Payment verified for work {}: delivered, earnings +{}, on_time={}",
                work_id, amount, on_time
            );
        }
        self.fetch(work_id)
    }

    /// Admin rules the proof bad: the row is marked rejected and the client
    /// must submit a fresh one.
    pub fn reject_payment(&self, ctx: &AuthContext, work_id: &str, note: &str) -> Result<Work> {
        {
            let mut conn = lock_conn(&self.conn)?;
            let tx = conn.transaction()?;
            let work = fetch_work_tx(&tx, work_id)?;

            ensure_admin(ctx, "reject_payment")?;
            guard_stage(
                &work,
                &[
                    WorkStage::PaymentSubmitted,
                    WorkStage::PaymentConfirmed,
                    WorkStage::PaymentDisputed,
                ],
                "reject_payment",
            )?;

            let now = now_rfc3339();
            let proof_id = latest_proof_id(&tx, work_id)?;
            tx.execute(
                "UPDATE payment_proofs SET status = 'rejected', resolved_by = ?1,
                                           resolved_at = ?2, resolution_note = ?3
                 WHERE id = ?4",
                params![ctx.user_id, now, note, proof_id],
            )?;
            tx.execute(
                "UPDATE works SET stage = 'completion_submitted', updated_at = ?1 WHERE id = ?2",
                params![now, work_id],
            )?;

            tx.commit()?;
            info!("Payment rejected for work {}: back to completion_submitted", work_id);
        }
        self.fetch(work_id)
    }

    /// Admin cancels a running work; the project reopens for reassignment.
    pub fn cancel_work(&self, ctx: &AuthContext, work_id: &str, reason: &str) -> Result<Work> {
        {
            let mut conn = lock_conn(&self.conn)?;
            let tx = conn.transaction()?;
            let work = fetch_work_tx(&tx, work_id)?;

            ensure_admin(ctx, "cancel_work")?;
            guard_stage(&work, &[WorkStage::InProgress], "cancel_work")?;

            let now = now_rfc3339();
            tx.execute(
                "UPDATE works SET stage = 'cancelled', cancel_reason = ?1, updated_at = ?2
                 WHERE id = ?3",
                params![reason, now, work_id],
            )?;
            tx.execute(
                "UPDATE projects SET status = 'open', assigned_student = NULL, updated_at = ?1
                 WHERE id = ?2 AND status = 'active'",
                params![now, work.project_id],
            )?;
            bump_performance(
                &tx,
                &work.student_id,
                "cancelled_count = cancelled_count + 1",
                "cancelled_count",
                &now,
            )?;

            tx.commit()?;
            info!("Cancelled work {}: {}", work_id, reason);
        }
        self.fetch(work_id)
    }

    /// Admin toggles the delivery gate on a delivered work.
    pub fn set_delivery_lock(
        &self,
        ctx: &AuthContext,
        work_id: &str,
        unlocked: bool,
    ) -> Result<Work> {
        {
            let mut conn = lock_conn(&self.conn)?;
            let tx = conn.transaction()?;
            let work = fetch_work_tx(&tx, work_id)?;

            let action = if unlocked { "unlock_delivery" } else { "lock_delivery" };
            ensure_admin(ctx, action)?;
            guard_stage(&work, &[WorkStage::Delivered], action)?;

            tx.execute(
                "UPDATE works SET deliverable_unlocked = ?1, updated_at = ?2 WHERE id = ?3",
                params![unlocked, now_rfc3339(), work_id],
            )?;

            tx.commit()?;
            info!("Delivery {} for work {}", action, work_id);
        }
        self.fetch(work_id)
    }

    fn fetch(&self, work_id: &str) -> Result<Work> {
        let conn = lock_conn(&self.conn)?;
        conn.query_row(
            &format!("SELECT {} FROM works WHERE id = ?1", WORK_COLUMNS),
            params![work_id],
            row_to_work,
        )
        .optional()?
        .ok_or_else(|| WorklinkError::WorkNotFound {
            work_id: work_id.to_string(),
        })
    }
}

fn fetch_work_tx(tx: &Transaction<'_>, work_id: &str) -> Result<Work> {
    tx.query_row(
        &format!("SELECT {} FROM works WHERE id = ?1", WORK_COLUMNS),
        params![work_id],
        row_to_work,
    )
    .optional()?
    .ok_or_else(|| WorklinkError::WorkNotFound {
        work_id: work_id.to_string(),
    })
}

fn latest_proof_id(tx: &Transaction<'_>, work_id: &str) -> Result<String> {
    tx.query_row(
        "SELECT id FROM payment_proofs WHERE work_id = ?1
         ORDER BY submitted_at DESC, rowid DESC LIMIT 1",
        params![work_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| WorklinkError::ProofNotFound {
        work_id: work_id.to_string(),
    })
}

/// Upsert-style counter bump so accounts predating the table still count.
fn bump_performance(
    tx: &Transaction<'_>,
    student_id: &str,
    update_clause: &str,
    insert_column: &str,
    now: &str,
) -> Result<()> {
    tx.execute(
        &format!(
            "INSERT INTO student_performance (student_id, {}, updated_at) VALUES (?1, 1, ?2)
             ON CONFLICT(student_id) DO UPDATE SET {}, updated_at = excluded.updated_at",
            insert_column, update_clause
        ),
        params![student_id, now],
    )?;
    Ok(())
}

/// The caller must be the named participant, or an admin.
fn ensure_actor(
    ctx: &AuthContext,
    expected_role: Role,
    participant_id: &str,
    action: &str,
) -> Result<()> {
    if ctx.is_admin() {
        return Ok(());
    }
    if ctx.role == expected_role && ctx.user_id == participant_id {
        return Ok(());
    }
    Err(WorklinkError::forbidden(action))
}

fn ensure_admin(ctx: &AuthContext, action: &str) -> Result<()> {
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(WorklinkError::forbidden(action))
    }
}

fn guard_stage(work: &Work, allowed: &[WorkStage], action: &str) -> Result<()> {
    if allowed.contains(&work.stage) {
        Ok(())
    } else {
        Err(WorklinkError::InvalidTransition {
            from: work.stage.to_string(),
            action: action.to_string(),
        })
    }
}

/// On-time means the verification timestamp is not past the project deadline.
fn verified_before_deadline(now: &str, deadline: &str) -> bool {
    let (Ok(now), Ok(deadline)) = (
        DateTime::parse_from_rfc3339(now),
        DateTime::parse_from_rfc3339(deadline),
    ) else {
        warn!("Unparseable timestamp comparing deadline; counting as late");
        return false;
    };
    now <= deadline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectSpec, ProofStatus};
    use crate::store::{PaymentStore, PerformanceStore, ProjectStore};

    struct Fixture {
        db: Database,
        engine: WorkflowEngine,
        projects: ProjectStore,
        client: AuthContext,
        student: AuthContext,
        admin: AuthContext,
    }

    fn ctx(user_id: &str, role: Role) -> AuthContext {
        AuthContext {
            user_id: user_id.to_string(),
            role,
        }
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        Fixture {
            engine: WorkflowEngine::new(&db),
            projects: ProjectStore::new(&db),
            client: ctx("client-1", Role::Client),
            student: ctx("student-1", Role::Student),
            admin: ctx("admin-1", Role::Admin),
            db,
        }
    }

    fn assigned_project(f: &Fixture, deadline: &str) -> String {
        let project = f
            .projects
            .create(
                "client-1",
                &ProjectSpec {
                    title: "Landing page".into(),
                    description: "Build it".into(),
                    budget: 5_000,
                    deadline: deadline.into(),
                    skills_required: vec![],
                    attachment_refs: vec![],
                },
            )
            .unwrap();
        f.projects.assign(&project.id, "student-1").unwrap();
        project.id
    }

    fn proof_spec(amount: i64) -> ProofSpec {
        ProofSpec {
            upi_reference: "123456789012".into(),
            payer_upi: "client@okbank".into(),
            payee_upi: "student@okbank".into(),
            amount,
            note: None,
            screenshot_ref: Some("proofs/shot.png".into()),
        }
    }

    /// Drive a work to `payment_submitted`.
    fn work_with_proof(f: &Fixture) -> Work {
        let project_id = assigned_project(f, "2099-01-01T00:00:00+00:00");
        let work = f.engine.approve_assignment(&f.client, &project_id).unwrap();
        f.engine
            .submit_completion(&f.student, &work.id, Some("done"), "deliverables/site.zip")
            .unwrap();
        f.engine
            .submit_payment_proof(&f.client, &work.id, &proof_spec(5_000))
            .unwrap()
    }

    #[test]
    fn test_approve_assignment_creates_work_and_activates_project() {
        let f = fixture();
        let project_id = assigned_project(&f, "2099-01-01T00:00:00+00:00");

        let work = f.engine.approve_assignment(&f.client, &project_id).unwrap();
        assert_eq!(work.stage, WorkStage::InProgress);
        assert_eq!(work.student_id, "student-1");

        let project = f.projects.get(&project_id).unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Active);

        let perf = PerformanceStore::new(&f.db).get("student-1").unwrap();
        assert_eq!(perf.assigned_count, 1);
    }

    #[test]
    fn test_approve_assignment_requires_owning_client() {
        let f = fixture();
        let project_id = assigned_project(&f, "2099-01-01T00:00:00+00:00");

        let stranger = ctx("client-2", Role::Client);
        let err = f.engine.approve_assignment(&stranger, &project_id).unwrap_err();
        assert!(matches!(err, WorklinkError::Forbidden { .. }));

        let err = f.engine.approve_assignment(&f.student, &project_id).unwrap_err();
        assert!(matches!(err, WorklinkError::Forbidden { .. }));
    }

    #[test]
    fn test_approve_assignment_requires_assigned_status() {
        let f = fixture();
        let project = f
            .projects
            .create(
                "client-1",
                &ProjectSpec {
                    title: "Open".into(),
                    description: "d".into(),
                    budget: 100,
                    deadline: "2099-01-01T00:00:00+00:00".into(),
                    skills_required: vec![],
                    attachment_refs: vec![],
                },
            )
            .unwrap();

        let err = f.engine.approve_assignment(&f.client, &project.id).unwrap_err();
        assert!(matches!(err, WorklinkError::InvalidTransition { .. }));
    }

    #[test]
    fn test_full_happy_path_to_delivered() {
        let f = fixture();
        let work = work_with_proof(&f);
        assert_eq!(work.stage, WorkStage::PaymentSubmitted);

        let work = f.engine.confirm_payment(&f.student, &work.id).unwrap();
        assert_eq!(work.stage, WorkStage::PaymentConfirmed);

        let work = f
            .engine
            .verify_payment(&f.admin, &work.id, Some("UTR checked"))
            .unwrap();
        assert_eq!(work.stage, WorkStage::Delivered);
        assert!(work.deliverable_unlocked);
        assert!(work.completed_at.is_some());

        // Project completed.
        let project = f.projects.get(&work.project_id).unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Completed);

        // Proof marked verified.
        let proof = PaymentStore::new(&f.db).require_latest(&work.id).unwrap();
        assert_eq!(proof.status, ProofStatus::Verified);
        assert_eq!(proof.resolved_by.as_deref(), Some("admin-1"));

        // Performance credited, on time against the 2099 deadline.
        let perf = PerformanceStore::new(&f.db).get("student-1").unwrap();
        assert_eq!(perf.completed_count, 1);
        assert_eq!(perf.on_time_count, 1);
        assert_eq!(perf.total_earnings, 5_000);
        assert_eq!(perf.completion_rate(), 100.0);
    }

    #[test]
    fn test_late_verification_is_not_on_time() {
        let f = fixture();
        let project_id = assigned_project(&f, "2001-01-01T00:00:00+00:00");
        let work = f.engine.approve_assignment(&f.client, &project_id).unwrap();
        f.engine
            .submit_completion(&f.student, &work.id, None, "deliverables/out.zip")
            .unwrap();
        f.engine
            .submit_payment_proof(&f.client, &work.id, &proof_spec(5_000))
            .unwrap();
        f.engine.confirm_payment(&f.student, &work.id).unwrap();
        f.engine.verify_payment(&f.admin, &work.id, None).unwrap();

        let perf = PerformanceStore::new(&f.db).get("student-1").unwrap();
        assert_eq!(perf.completed_count, 1);
        assert_eq!(perf.on_time_count, 0);
    }

    #[test]
    fn test_dispute_then_resubmit_then_verify() {
        let f = fixture();
        let work = work_with_proof(&f);

        let work = f
            .engine
            .dispute_payment(&f.student, &work.id, "nothing arrived")
            .unwrap();
        assert_eq!(work.stage, WorkStage::PaymentDisputed);

        let perf = PerformanceStore::new(&f.db).get("student-1").unwrap();
        assert_eq!(perf.disputed_count, 1);

        // Client tries again with a corrected proof.
        let work = f
            .engine
            .submit_payment_proof(&f.client, &work.id, &proof_spec(5_000))
            .unwrap();
        assert_eq!(work.stage, WorkStage::PaymentSubmitted);

        let proofs = PaymentStore::new(&f.db).list_for_work(&work.id).unwrap();
        assert_eq!(proofs.len(), 2);

        f.engine.confirm_payment(&f.student, &work.id).unwrap();
        let work = f.engine.verify_payment(&f.admin, &work.id, None).unwrap();
        assert_eq!(work.stage, WorkStage::Delivered);
    }

    #[test]
    fn test_admin_can_verify_straight_from_dispute() {
        let f = fixture();
        let work = work_with_proof(&f);
        f.engine
            .dispute_payment(&f.student, &work.id, "wrong amount shown")
            .unwrap();

        // Admin checked the bank statement and sides with the client.
        let work = f.engine.verify_payment(&f.admin, &work.id, Some("statement ok")).unwrap();
        assert_eq!(work.stage, WorkStage::Delivered);
    }

    #[test]
    fn test_reject_payment_returns_to_completion_submitted() {
        let f = fixture();
        let work = work_with_proof(&f);
        f.engine.confirm_payment(&f.student, &work.id).unwrap();

        let work = f
            .engine
            .reject_payment(&f.admin, &work.id, "UTR does not exist")
            .unwrap();
        assert_eq!(work.stage, WorkStage::CompletionSubmitted);

        let proof = PaymentStore::new(&f.db).require_latest(&work.id).unwrap();
        assert_eq!(proof.status, ProofStatus::Rejected);

        // Nothing was credited.
        let perf = PerformanceStore::new(&f.db).get("student-1").unwrap();
        assert_eq!(perf.completed_count, 0);
        assert_eq!(perf.total_earnings, 0);
    }

    #[test]
    fn test_stage_guards_reject_out_of_order_actions() {
        let f = fixture();
        let project_id = assigned_project(&f, "2099-01-01T00:00:00+00:00");
        let work = f.engine.approve_assignment(&f.client, &project_id).unwrap();

        // Cannot pay before completion.
        let err = f
            .engine
            .submit_payment_proof(&f.client, &work.id, &proof_spec(5_000))
            .unwrap_err();
        assert!(matches!(err, WorklinkError::InvalidTransition { .. }));

        // Cannot confirm before a proof exists.
        let err = f.engine.confirm_payment(&f.student, &work.id).unwrap_err();
        assert!(matches!(err, WorklinkError::InvalidTransition { .. }));

        // Cannot submit completion twice.
        f.engine
            .submit_completion(&f.student, &work.id, None, "deliverables/v1.zip")
            .unwrap();
        let err = f
            .engine
            .submit_completion(&f.student, &work.id, None, "deliverables/v2.zip")
            .unwrap_err();
        assert!(matches!(err, WorklinkError::InvalidTransition { .. }));
    }

    #[test]
    fn test_actor_guards_reject_wrong_participants() {
        let f = fixture();
        let work = work_with_proof(&f);

        // The client cannot confirm on the student's behalf.
        let err = f.engine.confirm_payment(&f.client, &work.id).unwrap_err();
        assert!(matches!(err, WorklinkError::Forbidden { .. }));

        // Another student cannot touch this work.
        let other = ctx("student-2", Role::Student);
        let err = f.engine.confirm_payment(&other, &work.id).unwrap_err();
        assert!(matches!(err, WorklinkError::Forbidden { .. }));

        // Only admins arbitrate.
        let err = f.engine.verify_payment(&f.client, &work.id, None).unwrap_err();
        assert!(matches!(err, WorklinkError::Forbidden { .. }));
    }

    #[test]
    fn test_cancel_work_reopens_project() {
        let f = fixture();
        let project_id = assigned_project(&f, "2099-01-01T00:00:00+00:00");
        let work = f.engine.approve_assignment(&f.client, &project_id).unwrap();

        let work = f
            .engine
            .cancel_work(&f.admin, &work.id, "student unresponsive")
            .unwrap();
        assert_eq!(work.stage, WorkStage::Cancelled);
        assert_eq!(work.cancel_reason.as_deref(), Some("student unresponsive"));

        let project = f.projects.get(&project_id).unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Open);
        assert!(project.assigned_student.is_none());

        let perf = PerformanceStore::new(&f.db).get("student-1").unwrap();
        assert_eq!(perf.cancelled_count, 1);

        // A delivered-or-cancelled work cannot be cancelled again.
        let err = f
            .engine
            .cancel_work(&f.admin, &work.id, "again")
            .unwrap_err();
        assert!(matches!(err, WorklinkError::InvalidTransition { .. }));
    }

    #[test]
    fn test_delivery_lock_toggle() {
        let f = fixture();
        let work = work_with_proof(&f);
        f.engine.confirm_payment(&f.student, &work.id).unwrap();
        let work = f.engine.verify_payment(&f.admin, &work.id, None).unwrap();
        assert!(work.deliverable_unlocked);

        let work = f.engine.set_delivery_lock(&f.admin, &work.id, false).unwrap();
        assert!(!work.deliverable_unlocked);

        let work = f.engine.set_delivery_lock(&f.admin, &work.id, true).unwrap();
        assert!(work.deliverable_unlocked);

        // Only on delivered works.
        let project_id = assigned_project(&f, "2099-01-01T00:00:00+00:00");
        let fresh = f.engine.approve_assignment(&f.client, &project_id).unwrap();
        let err = f
            .engine
            .set_delivery_lock(&f.admin, &fresh.id, false)
            .unwrap_err();
        assert!(matches!(err, WorklinkError::InvalidTransition { .. }));
    }

    #[test]
    fn test_failed_transition_writes_nothing() {
        let f = fixture();
        let work = work_with_proof(&f);

        // A forbidden confirm leaves the stage and proof untouched.
        let _ = f.engine.confirm_payment(&f.client, &work.id);
        let work = f.engine.fetch(&work.id).unwrap();
        assert_eq!(work.stage, WorkStage::PaymentSubmitted);

        let proof = PaymentStore::new(&f.db).require_latest(&work.id).unwrap();
        assert_eq!(proof.status, ProofStatus::Submitted);
    }
}
