//! User administration and dashboard handlers.

use super::{authenticate, get_bool_param, get_str_param, require_str_param};
use crate::server::AppState;
use serde_json::Value;
use worklink::Role;

pub async fn list_users(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let role = get_str_param(params, "role", "role").and_then(Role::from_str);
    let include_blocked =
        get_bool_param(params, "include_blocked", "includeBlocked").unwrap_or(false);

    let users = state.api.list_users(&ctx, role, include_blocked)?;
    Ok(serde_json::to_value(users)?)
}

pub async fn block_user(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let user_id = require_str_param(params, "user_id", "userId")?;

    let user = state.api.block_user(&ctx, &user_id)?;
    Ok(serde_json::to_value(user)?)
}

pub async fn unblock_user(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let user_id = require_str_param(params, "user_id", "userId")?;

    let user = state.api.unblock_user(&ctx, &user_id)?;
    Ok(serde_json::to_value(user)?)
}

pub async fn get_dashboard(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let report = state.api.get_dashboard(&ctx)?;
    Ok(serde_json::to_value(report)?)
}
