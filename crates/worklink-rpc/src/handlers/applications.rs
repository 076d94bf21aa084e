//! Student application handlers.

use super::{authenticate, get_bool_param, get_str_list_param, get_str_param, require_str_param};
use crate::server::AppState;
use serde_json::Value;
use worklink::models::ApplicationStatus;

pub async fn submit_application(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let name = require_str_param(params, "name", "name")?;
    let email = require_str_param(params, "email", "email")?;
    let password = require_str_param(params, "password", "password")?;
    let skills = get_str_list_param(params, "skills", "skills").unwrap_or_default();
    let resume_ref = get_str_param(params, "resume_ref", "resumeRef");
    let cover_note = get_str_param(params, "cover_note", "coverNote");

    let application = state
        .api
        .submit_application(&name, &email, &password, skills, resume_ref, cover_note)?;
    Ok(serde_json::to_value(application)?)
}

pub async fn list_applications(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let status = get_str_param(params, "status", "status").and_then(ApplicationStatus::from_str);

    let applications = state.api.list_applications(&ctx, status)?;
    Ok(serde_json::to_value(applications)?)
}

pub async fn get_application(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let application_id = require_str_param(params, "application_id", "applicationId")?;

    let application = state.api.get_application(&ctx, &application_id)?;
    Ok(serde_json::to_value(application)?)
}

pub async fn review_application(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let application_id = require_str_param(params, "application_id", "applicationId")?;
    let approve = get_bool_param(params, "approve", "approve").ok_or_else(|| {
        worklink::WorklinkError::InvalidParams {
            message: "Missing required parameter: approve".to_string(),
        }
    })?;
    let note = get_str_param(params, "note", "note");

    let application = state
        .api
        .review_application(&ctx, &application_id, approve, note)?;
    Ok(serde_json::to_value(application)?)
}
