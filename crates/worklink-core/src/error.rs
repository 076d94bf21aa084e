//! Error types for Worklink.
//!
//! This module defines the error types shared by every subsystem and the
//! mapping onto JSON-RPC application error codes used by the RPC server.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the Worklink library.
#[derive(Debug, Error)]
pub enum WorklinkError {
    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Authentication errors
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Session expired")]
    SessionExpired,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Account is blocked")]
    AccountBlocked,

    // Authorization errors
    #[error("Forbidden: {action}")]
    Forbidden { action: String },

    // Lookup errors
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Project not found: {project_id}")]
    ProjectNotFound { project_id: String },

    #[error("Work not found: {work_id}")]
    WorkNotFound { work_id: String },

    #[error("Application not found: {application_id}")]
    ApplicationNotFound { application_id: String },

    #[error("Payment proof not found for work: {work_id}")]
    ProofNotFound { work_id: String },

    // Lifecycle errors
    #[error("Cannot {action} while in stage {from}")]
    InvalidTransition { from: String, action: String },

    #[error("Deliverable is locked for work: {work_id}")]
    DeliverableLocked { work_id: String },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Email already in use: {email}")]
    EmailTaken { email: String },

    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Worklink operations.
pub type Result<T> = std::result::Result<T, WorklinkError>;

// Conversion implementations for common error types

impl From<std::io::Error> for WorklinkError {
    fn from(err: std::io::Error) -> Self {
        WorklinkError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for WorklinkError {
    fn from(err: serde_json::Error) -> Self {
        WorklinkError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for WorklinkError {
    fn from(err: rusqlite::Error) -> Self {
        WorklinkError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl WorklinkError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        WorklinkError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        WorklinkError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a forbidden error.
    pub fn forbidden(action: impl Into<String>) -> Self {
        WorklinkError::Forbidden {
            action: action.into(),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Standard JSON-RPC error codes:
    /// - -32700: Parse error
    /// - -32600: Invalid Request
    /// - -32601: Method not found
    /// - -32603: Internal error
    ///
    /// Custom error codes (application-defined, -32000 to -32099):
    /// - -32000: Authentication failure
    /// - -32001: Forbidden
    /// - -32002: Not found
    /// - -32003: Lifecycle violation
    /// - -32005: Validation error
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            WorklinkError::InvalidCredentials
            | WorklinkError::SessionExpired
            | WorklinkError::SessionNotFound
            | WorklinkError::AccountBlocked => -32000,

            WorklinkError::Forbidden { .. } => -32001,

            WorklinkError::UserNotFound { .. }
            | WorklinkError::ProjectNotFound { .. }
            | WorklinkError::WorkNotFound { .. }
            | WorklinkError::ApplicationNotFound { .. }
            | WorklinkError::ProofNotFound { .. } => -32002,

            WorklinkError::InvalidTransition { .. }
            | WorklinkError::DeliverableLocked { .. } => -32003,

            WorklinkError::Validation { .. }
            | WorklinkError::EmailTaken { .. }
            | WorklinkError::InvalidParams { .. } => -32005,

            // All other errors are internal errors
            _ => -32603,
        }
    }

    /// Check if this error is caused by the caller rather than the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            WorklinkError::Database { .. }
                | WorklinkError::Io { .. }
                | WorklinkError::Json { .. }
                | WorklinkError::Other(_)
        )
    }
}
