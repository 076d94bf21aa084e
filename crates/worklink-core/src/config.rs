//! Centralized configuration for Worklink.
//!
//! This module provides configuration constants for authentication, storage,
//! reporting, and other system parameters.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "Worklink";
    pub const CURRENCY: &'static str = "INR";
}

/// Authentication and session parameters.
pub struct AuthConfig;

impl AuthConfig {
    /// Lifetime of a session token from issuance.
    pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    /// Minimum accepted password length.
    pub const MIN_PASSWORD_LEN: usize = 8;
    /// Iterations of the salted digest loop.
    pub const HASH_ITERATIONS: u32 = 10_000;
    /// Bytes of random salt per credential.
    pub const SALT_LEN: usize = 16;
}

/// Storage parameters.
pub struct StoreConfig;

impl StoreConfig {
    pub const BUSY_TIMEOUT_MS: u32 = 5_000;
    pub const DB_FILE_NAME: &'static str = "worklink.sqlite";
}

/// Shared directory and path configurations.
pub struct PathsConfig;

impl PathsConfig {
    pub const DATA_DIR_NAME: &'static str = "worklink-data";
}

/// Reporting and leaderboard parameters.
pub struct ReportsConfig;

impl ReportsConfig {
    /// Minimum assignments before a student appears on the leaderboard.
    pub const LEADERBOARD_MIN_ASSIGNED: i64 = 3;
    pub const LEADERBOARD_DEFAULT_LIMIT: usize = 10;
}

/// Account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "client" => Some(Role::Client),
            "student" => Some(Role::Student),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Role::from_str(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown role: {}", s)))
    }
}

impl rusqlite::types::ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for Role {
    fn column_result(
        value: rusqlite::types::ValueRef<'_>,
    ) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        Role::from_str(s).ok_or(rusqlite::types::FromSqlError::InvalidType)
    }
}
