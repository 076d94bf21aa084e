//! Worklink Core - Headless library for the student marketplace backend.
//!
//! This crate provides the domain logic for a marketplace connecting clients
//! (who post projects) with students (who complete them), with admin
//! oversight and an escrow-like UPI payment-verification workflow. It can be
//! used programmatically without any HTTP/RPC layer; the `worklink-rpc`
//! crate exposes it over JSON-RPC.
//!
//! # Example
//!
//! ```rust,ignore
//! use worklink::WorklinkApi;
//!
//! fn main() -> worklink::Result<()> {
//!     let api = WorklinkApi::open("/path/to/data")?;
//!
//!     let client = api.register_client("Asha", "asha@example.com", "s3cret-pass", None)?;
//!     let (session, _user) = api.login("asha@example.com", "s3cret-pass")?;
//!     let ctx = api.authenticate(&session.token)?;
//!
//!     let projects = api.list_projects(&ctx, None)?;
//!     println!("{} visible projects for {}", projects.len(), client.name);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod reports;
pub mod store;
pub mod workflow;

mod api;

// Re-export commonly used types
pub use config::Role;
pub use error::{Result, WorklinkError};
pub use models::{
    Application, ApplicationStatus, AuthContext, PaymentProof, Project, ProjectSpec,
    ProjectStatus, ProjectUpdate, ProofSpec, ProofStatus, Session, StudentPerformance, User,
    Work, WorkStage,
};
pub use reports::DashboardReport;

use std::path::{Path, PathBuf};
use store::{
    ApplicationStore, Database, PaymentStore, PerformanceStore, ProjectStore, SessionStore,
    UserStore, WorkStore,
};
use workflow::WorkflowEngine;

/// Main API struct for Worklink operations.
///
/// This is the primary entry point for programmatic access. It owns the
/// database handle, the per-table stores, and the work lifecycle engine;
/// every method resolves authorization itself, so callers only ever hold a
/// session token or an [`AuthContext`].
pub struct WorklinkApi {
    data_root: PathBuf,
    pub(crate) users: UserStore,
    pub(crate) sessions: SessionStore,
    pub(crate) applications: ApplicationStore,
    pub(crate) projects: ProjectStore,
    pub(crate) works: WorkStore,
    pub(crate) payments: PaymentStore,
    pub(crate) performance: PerformanceStore,
    pub(crate) workflow: WorkflowEngine,
    pub(crate) reporter: reports::Reporter,
}

impl WorklinkApi {
    /// Open (or create) the backend state under a data directory.
    pub fn open(data_root: impl Into<PathBuf>) -> Result<Self> {
        let data_root = data_root.into();
        let db = Database::open(&data_root)?;
        let api = Self::from_db(data_root, &db);

        // Best-effort housekeeping; a failure here is not fatal.
        match api.sessions.cleanup_expired() {
            Ok(0) => {}
            Ok(n) => tracing::info!("Startup session sweep removed {} token(s)", n),
            Err(e) => tracing::warn!("Startup session sweep failed: {}", e),
        }

        Ok(api)
    }

    /// Fully in-memory instance, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::from_db(PathBuf::from(":memory:"), &db))
    }

    fn from_db(data_root: PathBuf, db: &Database) -> Self {
        Self {
            users: UserStore::new(db),
            sessions: SessionStore::new(db),
            applications: ApplicationStore::new(db),
            projects: ProjectStore::new(db),
            works: WorkStore::new(db),
            payments: PaymentStore::new(db),
            performance: PerformanceStore::new(db),
            workflow: WorkflowEngine::new(db),
            reporter: reports::Reporter::new(db),
            data_root,
        }
    }

    /// Get the data root directory.
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Create the first admin account if none exists yet.
    ///
    /// Returns `None` when an admin is already present; used by the server
    /// binary to seed a fresh deployment from the environment.
    pub fn bootstrap_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<User>> {
        let admins = self.users.list(Some(Role::Admin), true)?;
        if !admins.is_empty() {
            return Ok(None);
        }

        auth::validate_email(email)?;
        auth::validate_password(password)?;
        let hashed = auth::hash_password(password);
        let user = self.users.create(store::NewUser {
            role: Role::Admin,
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            password_digest: hashed.digest,
            password_salt: hashed.salt,
            skills: vec![],
            organization: None,
        })?;
        tracing::info!("Bootstrapped admin account {}", user.email);
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let api = WorklinkApi::open(temp_dir.path()).unwrap();

        assert_eq!(api.data_root(), temp_dir.path());
        assert!(temp_dir
            .path()
            .join(config::StoreConfig::DB_FILE_NAME)
            .exists());
    }

    #[test]
    fn test_bootstrap_admin_runs_once() {
        let api = WorklinkApi::open_in_memory().unwrap();

        let first = api
            .bootstrap_admin("Root", "root@worklink.app", "super-secret")
            .unwrap();
        assert!(first.is_some());
        assert_eq!(first.unwrap().role, Role::Admin);

        let second = api
            .bootstrap_admin("Root", "other@worklink.app", "super-secret")
            .unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        {
            let api = WorklinkApi::open(temp_dir.path()).unwrap();
            api.bootstrap_admin("Root", "root@worklink.app", "super-secret")
                .unwrap();
        }

        let api = WorklinkApi::open(temp_dir.path()).unwrap();
        let admins = api.users.list(Some(Role::Admin), true).unwrap();
        assert_eq!(admins.len(), 1);
    }
}
