//! Account, session, and authentication context types.

use crate::config::Role;
use serde::{Deserialize, Serialize};

/// A registered account.
///
/// Profile fields are role-specific: `skills`, `upi_id`, and `bio` are only
/// populated for students; `organization` only for clients. The credential
/// digest never leaves the store layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub blocked: bool,
    pub created_at: String,
    pub last_login: Option<String>,
    // Student profile
    #[serde(default)]
    pub skills: Vec<String>,
    pub upi_id: Option<String>,
    pub bio: Option<String>,
    // Client profile
    pub organization: Option<String>,
}

/// A live session token entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: String,
    pub expires_at: String,
    pub last_seen: String,
}

/// The resolved identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub role: Role,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when the caller is `user_id` themselves.
    pub fn is_self(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
