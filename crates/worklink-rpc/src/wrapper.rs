//! Response wrapping for frontend compatibility.
//!
//! The frontend expects responses in the format `{success: bool, <key>: ...}`
//! but most handlers return the raw domain object. This pass wraps them by
//! method name; handlers that already build an envelope are passed through.

use serde_json::{json, Value};

/// Wrap API responses to match the frontend's expected format.
pub fn wrap_response(method: &str, result: Value) -> Value {
    match method {
        // List wrappers
        "list_projects" => json!({
            "success": true,
            "projects": if result.is_null() { json!([]) } else { result }
        }),
        "list_works" => json!({
            "success": true,
            "works": if result.is_null() { json!([]) } else { result }
        }),
        "list_applications" => json!({
            "success": true,
            "applications": if result.is_null() { json!([]) } else { result }
        }),
        "list_users" => json!({
            "success": true,
            "users": if result.is_null() { json!([]) } else { result }
        }),
        "list_payment_proofs" => json!({
            "success": true,
            "proofs": if result.is_null() { json!([]) } else { result }
        }),
        "top_students" => json!({
            "success": true,
            "students": if result.is_null() { json!([]) } else { result }
        }),

        // Single-object wrappers
        "register_client"
        | "get_current_user"
        | "update_student_profile"
        | "update_client_profile"
        | "block_user"
        | "unblock_user" => json!({
            "success": true,
            "user": result
        }),

        "submit_application" | "get_application" | "review_application" => json!({
            "success": true,
            "application": result
        }),

        "create_project"
        | "get_project"
        | "update_project"
        | "cancel_project"
        | "assign_project"
        | "reject_assignment" => json!({
            "success": true,
            "project": result
        }),

        "approve_assignment"
        | "get_work"
        | "submit_completion"
        | "submit_payment_proof"
        | "confirm_payment"
        | "dispute_payment"
        | "verify_payment"
        | "reject_payment"
        | "cancel_work"
        | "lock_delivery"
        | "unlock_delivery" => json!({
            "success": true,
            "work": result
        }),

        "get_student_performance" => json!({
            "success": true,
            "performance": result
        }),

        "get_dashboard" => json!({
            "success": true,
            "dashboard": result
        }),

        // Bool methods
        "logout" | "change_password" => json!({
            "success": result.as_bool().unwrap_or(false)
        }),

        // Envelope built by the handler
        "login" | "get_deliverable" => result,

        // Default: return as-is (for methods not explicitly handled)
        _ => result,
    }
}
