//! Account and session handlers.

use super::{authenticate, get_str_list_param, get_str_param, require_str_param};
use crate::server::AppState;
use serde_json::{json, Value};

pub async fn register_client(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let name = require_str_param(params, "name", "name")?;
    let email = require_str_param(params, "email", "email")?;
    let password = require_str_param(params, "password", "password")?;
    let organization = get_str_param(params, "organization", "organization");

    let user = state
        .api
        .register_client(&name, &email, &password, organization)?;
    Ok(serde_json::to_value(user)?)
}

pub async fn login(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let email = require_str_param(params, "email", "email")?;
    let password = require_str_param(params, "password", "password")?;

    match state.api.login(&email, &password) {
        Ok((session, user)) => Ok(json!({
            "success": true,
            "token": session.token,
            "expires_at": session.expires_at,
            "user": user
        })),
        Err(e) if e.is_client_error() => Ok(json!({
            "success": false,
            "error": e.to_string()
        })),
        Err(e) => Err(e),
    }
}

pub async fn logout(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let token = require_str_param(params, "token", "token")?;
    let removed = state.api.logout(&token)?;
    Ok(json!(removed))
}

pub async fn get_current_user(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let token = require_str_param(params, "token", "token")?;
    let user = state.api.current_user(&token)?;
    Ok(serde_json::to_value(user)?)
}

pub async fn change_password(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let old = require_str_param(params, "old_password", "oldPassword")?;
    let new = require_str_param(params, "new_password", "newPassword")?;

    let changed = state.api.change_password(&ctx, &old, &new)?;
    Ok(json!(changed))
}

pub async fn update_student_profile(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let skills = get_str_list_param(params, "skills", "skills");
    let upi_id = get_str_param(params, "upi_id", "upiId");
    let bio = get_str_param(params, "bio", "bio");

    let user = state
        .api
        .update_student_profile(&ctx, skills.as_deref(), upi_id, bio)?;
    Ok(serde_json::to_value(user)?)
}

pub async fn update_client_profile(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let organization = get_str_param(params, "organization", "organization");
    let phone = get_str_param(params, "phone", "phone");

    let user = state.api.update_client_profile(&ctx, organization, phone)?;
    Ok(serde_json::to_value(user)?)
}
