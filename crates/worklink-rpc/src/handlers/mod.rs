//! JSON-RPC request handlers, split by domain.

mod admin;
mod applications;
mod auth;
mod performance;
mod projects;
mod works;

use crate::server::AppState;
use crate::wrapper::wrap_response;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};
use worklink::models::AuthContext;

// ============================================================================
// JSON-RPC types
// ============================================================================

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
            id,
        }
    }
}

// ============================================================================
// Parameter extraction helpers
// ============================================================================

/// Extract an optional string parameter, supporting both snake_case and camelCase.
pub(crate) fn get_str_param<'a>(params: &'a Value, snake: &str, camel: &str) -> Option<&'a str> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_str())
}

/// Extract a required string parameter or return an error.
pub(crate) fn require_str_param(
    params: &Value,
    snake: &str,
    camel: &str,
) -> worklink::Result<String> {
    get_str_param(params, snake, camel)
        .map(String::from)
        .ok_or_else(|| worklink::WorklinkError::InvalidParams {
            message: format!("Missing required parameter: {}", snake),
        })
}

/// Extract an optional bool parameter, supporting both snake_case and camelCase.
pub(crate) fn get_bool_param(params: &Value, snake: &str, camel: &str) -> Option<bool> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_bool())
}

/// Extract an optional i64 parameter, supporting both snake_case and camelCase.
pub(crate) fn get_i64_param(params: &Value, snake: &str, camel: &str) -> Option<i64> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_i64())
}

/// Extract an optional string-array parameter.
pub(crate) fn get_str_list_param(
    params: &Value,
    snake: &str,
    camel: &str,
) -> Option<Vec<String>> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Resolve the caller's session token into an authenticated context.
pub(crate) fn authenticate(state: &AppState, params: &Value) -> worklink::Result<AuthContext> {
    let token = require_str_param(params, "token", "token")?;
    state.api.authenticate(&token)
}

// ============================================================================
// HTTP endpoints
// ============================================================================

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Main JSON-RPC handler.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let method = &request.method;
    let params = request.params.unwrap_or(Value::Object(Default::default()));
    let id = request.id.clone();

    debug!("RPC call: {}", method);

    if method == "health_check" {
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::success(id, json!({"status": "ok"}))),
        );
    }

    let result = dispatch_method(&state, method, &params).await;

    match result {
        Ok(value) => {
            let wrapped = wrap_response(method, value);
            (StatusCode::OK, Json(JsonRpcResponse::success(id, wrapped)))
        }
        Err(e) => {
            if e.is_client_error() {
                debug!("RPC rejection for {}: {}", method, e);
            } else {
                error!("RPC error for {}: {}", method, e);
            }
            let code = e.to_rpc_error_code();
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(id, code, e.to_string())),
            )
        }
    }
}

// ============================================================================
// Method dispatcher
// ============================================================================

/// Dispatch a method call to the appropriate domain handler.
async fn dispatch_method(
    state: &AppState,
    method: &str,
    params: &Value,
) -> worklink::Result<Value> {
    match method {
        // Accounts & sessions
        "register_client" => auth::register_client(state, params).await,
        "login" => auth::login(state, params).await,
        "logout" => auth::logout(state, params).await,
        "get_current_user" => auth::get_current_user(state, params).await,
        "change_password" => auth::change_password(state, params).await,
        "update_student_profile" => auth::update_student_profile(state, params).await,
        "update_client_profile" => auth::update_client_profile(state, params).await,

        // Student applications
        "submit_application" => applications::submit_application(state, params).await,
        "list_applications" => applications::list_applications(state, params).await,
        "get_application" => applications::get_application(state, params).await,
        "review_application" => applications::review_application(state, params).await,

        // Projects
        "create_project" => projects::create_project(state, params).await,
        "get_project" => projects::get_project(state, params).await,
        "list_projects" => projects::list_projects(state, params).await,
        "update_project" => projects::update_project(state, params).await,
        "cancel_project" => projects::cancel_project(state, params).await,
        "assign_project" => projects::assign_project(state, params).await,
        "approve_assignment" => projects::approve_assignment(state, params).await,
        "reject_assignment" => projects::reject_assignment(state, params).await,

        // Work lifecycle
        "get_work" => works::get_work(state, params).await,
        "list_works" => works::list_works(state, params).await,
        "submit_completion" => works::submit_completion(state, params).await,
        "submit_payment_proof" => works::submit_payment_proof(state, params).await,
        "confirm_payment" => works::confirm_payment(state, params).await,
        "dispute_payment" => works::dispute_payment(state, params).await,
        "verify_payment" => works::verify_payment(state, params).await,
        "reject_payment" => works::reject_payment(state, params).await,
        "cancel_work" => works::cancel_work(state, params).await,
        "lock_delivery" => works::lock_delivery(state, params).await,
        "unlock_delivery" => works::unlock_delivery(state, params).await,
        "get_deliverable" => works::get_deliverable(state, params).await,
        "list_payment_proofs" => works::list_payment_proofs(state, params).await,

        // Performance
        "get_student_performance" => performance::get_student_performance(state, params).await,
        "top_students" => performance::top_students(state, params).await,

        // Administration
        "list_users" => admin::list_users(state, params).await,
        "block_user" => admin::block_user(state, params).await,
        "unblock_user" => admin::unblock_user(state, params).await,
        "get_dashboard" => admin::get_dashboard(state, params).await,

        // Unknown method
        _ => {
            warn!("Method not found: {}", method);
            Err(worklink::WorklinkError::Other(format!(
                "Method not found: {}",
                method
            )))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_rpc_response_success() {
        let response = JsonRpcResponse::success(Some(json!(1)), json!({"data": "test"}));
        assert!(response.error.is_none());
        assert!(response.result.is_some());
    }

    #[test]
    fn test_json_rpc_response_error() {
        let response = JsonRpcResponse::error(Some(json!(1)), -32000, "Test error".into());
        assert!(response.error.is_some());
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32000);
    }

    #[test]
    fn test_param_helpers_accept_both_casings() {
        let params = json!({"projectId": "p-1", "include_blocked": true, "limit": 5});
        assert_eq!(
            get_str_param(&params, "project_id", "projectId"),
            Some("p-1")
        );
        assert_eq!(get_bool_param(&params, "include_blocked", "includeBlocked"), Some(true));
        assert_eq!(get_i64_param(&params, "limit", "limit"), Some(5));
        assert!(require_str_param(&params, "token", "token").is_err());
    }

    #[test]
    fn test_str_list_param() {
        let params = json!({"skills": ["rust", "sql"]});
        assert_eq!(
            get_str_list_param(&params, "skills", "skills"),
            Some(vec!["rust".to_string(), "sql".to_string()])
        );
        assert_eq!(get_str_list_param(&params, "missing", "missing"), None);
    }
}
