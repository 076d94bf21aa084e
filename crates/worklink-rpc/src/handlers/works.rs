//! Work lifecycle handlers.

use super::{authenticate, get_i64_param, get_str_param, require_str_param};
use crate::server::AppState;
use serde_json::{json, Value};
use worklink::models::{ProofSpec, WorkStage};

pub async fn get_work(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let work_id = require_str_param(params, "work_id", "workId")?;

    let work = state.api.get_work(&ctx, &work_id)?;
    Ok(serde_json::to_value(work)?)
}

pub async fn list_works(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let stage = get_str_param(params, "stage", "stage").and_then(WorkStage::from_str);

    let works = state.api.list_works(&ctx, stage)?;
    Ok(serde_json::to_value(works)?)
}

pub async fn submit_completion(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let work_id = require_str_param(params, "work_id", "workId")?;
    let deliverable_ref = require_str_param(params, "deliverable_ref", "deliverableRef")?;
    let note = get_str_param(params, "note", "note");

    let work = state
        .api
        .submit_completion(&ctx, &work_id, note, &deliverable_ref)?;
    Ok(serde_json::to_value(work)?)
}

pub async fn submit_payment_proof(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let work_id = require_str_param(params, "work_id", "workId")?;
    let spec = ProofSpec {
        upi_reference: require_str_param(params, "upi_reference", "upiReference")?,
        payer_upi: require_str_param(params, "payer_upi", "payerUpi")?,
        payee_upi: require_str_param(params, "payee_upi", "payeeUpi")?,
        amount: get_i64_param(params, "amount", "amount").unwrap_or(0),
        note: get_str_param(params, "note", "note").map(String::from),
        screenshot_ref: get_str_param(params, "screenshot_ref", "screenshotRef")
            .map(String::from),
    };

    let work = state.api.submit_payment_proof(&ctx, &work_id, &spec)?;
    Ok(serde_json::to_value(work)?)
}

pub async fn confirm_payment(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let work_id = require_str_param(params, "work_id", "workId")?;

    let work = state.api.confirm_payment(&ctx, &work_id)?;
    Ok(serde_json::to_value(work)?)
}

pub async fn dispute_payment(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let work_id = require_str_param(params, "work_id", "workId")?;
    let reason = require_str_param(params, "reason", "reason")?;

    let work = state.api.dispute_payment(&ctx, &work_id, &reason)?;
    Ok(serde_json::to_value(work)?)
}

pub async fn verify_payment(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let work_id = require_str_param(params, "work_id", "workId")?;
    let note = get_str_param(params, "note", "note");

    let work = state.api.verify_payment(&ctx, &work_id, note)?;
    Ok(serde_json::to_value(work)?)
}

pub async fn reject_payment(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let work_id = require_str_param(params, "work_id", "workId")?;
    let note = require_str_param(params, "note", "note")?;

    let work = state.api.reject_payment(&ctx, &work_id, &note)?;
    Ok(serde_json::to_value(work)?)
}

pub async fn cancel_work(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let work_id = require_str_param(params, "work_id", "workId")?;
    let reason = require_str_param(params, "reason", "reason")?;

    let work = state.api.cancel_work(&ctx, &work_id, &reason)?;
    Ok(serde_json::to_value(work)?)
}

pub async fn lock_delivery(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let work_id = require_str_param(params, "work_id", "workId")?;

    let work = state.api.lock_delivery(&ctx, &work_id)?;
    Ok(serde_json::to_value(work)?)
}

pub async fn unlock_delivery(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let work_id = require_str_param(params, "work_id", "workId")?;

    let work = state.api.unlock_delivery(&ctx, &work_id)?;
    Ok(serde_json::to_value(work)?)
}

pub async fn get_deliverable(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let work_id = require_str_param(params, "work_id", "workId")?;

    match state.api.get_deliverable(&ctx, &work_id) {
        Ok(deliverable_ref) => Ok(json!({
            "success": true,
            "deliverable_ref": deliverable_ref
        })),
        Err(e @ worklink::WorklinkError::DeliverableLocked { .. }) => Ok(json!({
            "success": false,
            "locked": true,
            "error": e.to_string()
        })),
        Err(e) => Err(e),
    }
}

pub async fn list_payment_proofs(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let work_id = require_str_param(params, "work_id", "workId")?;

    let proofs = state.api.list_payment_proofs(&ctx, &work_id)?;
    Ok(serde_json::to_value(proofs)?)
}
