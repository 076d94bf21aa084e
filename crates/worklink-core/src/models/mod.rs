//! Domain model types shared across stores, the workflow engine, and the API.

mod application;
mod payment;
mod performance;
mod project;
mod user;
mod work;

pub use application::{Application, ApplicationStatus};
pub use payment::{PaymentProof, ProofSpec, ProofStatus};
pub use performance::StudentPerformance;
pub use project::{Project, ProjectSpec, ProjectStatus, ProjectUpdate};
pub use user::{AuthContext, Session, User};
pub use work::{Work, WorkStage};
