//! API implementation submodules.
//!
//! Each submodule contains `impl WorklinkApi` blocks that extend the public
//! API with domain-specific methods. The struct definition remains in
//! `lib.rs`.

mod admin;
mod applications;
mod auth;
mod performance;
mod projects;
mod works;
