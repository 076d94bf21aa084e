//! Credential hashing and input validation.
//!
//! Passwords are stored as an iterated salted SHA-256 digest (hex-encoded)
//! with a per-user random salt. Email addresses and UPI handles are
//! shape-checked here before they reach a store.

use crate::config::AuthConfig;
use crate::{Result, WorklinkError};
use rand::RngCore;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Salt and digest pair for a new credential, both hex-encoded.
#[derive(Debug, Clone)]
pub struct HashedPassword {
    pub digest: String,
    pub salt: String,
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> HashedPassword {
    let mut salt = [0u8; AuthConfig::SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);
    HashedPassword {
        digest: digest_with_salt(password, &salt_hex),
        salt: salt_hex,
    }
}

/// Check a password attempt against a stored digest.
pub fn verify_password(password: &str, salt_hex: &str, expected_digest: &str) -> bool {
    let computed = digest_with_salt(password, salt_hex);
    // Same-length hex strings; compare without short-circuiting on the
    // first differing byte.
    if computed.len() != expected_digest.len() {
        return false;
    }
    computed
        .bytes()
        .zip(expected_digest.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn digest_with_salt(password: &str, salt_hex: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    let mut digest = hasher.finalize();

    for _ in 1..AuthConfig::HASH_ITERATIONS {
        let mut hasher = Sha256::new();
        hasher.update(digest);
        digest = hasher.finalize();
    }

    hex::encode(digest)
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"))
}

fn upi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]{2,}@[A-Za-z]{2,}$").expect("static regex"))
}

fn utr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{12}$").expect("static regex"))
}

/// Validate an email address shape.
pub fn validate_email(email: &str) -> Result<()> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(WorklinkError::validation("email", "not a valid email address"))
    }
}

/// Validate a password against the policy.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < AuthConfig::MIN_PASSWORD_LEN {
        return Err(WorklinkError::validation(
            "password",
            format!(
                "must be at least {} characters",
                AuthConfig::MIN_PASSWORD_LEN
            ),
        ));
    }
    Ok(())
}

/// Validate a UPI handle (`name@bank`).
pub fn validate_upi_handle(upi: &str) -> Result<()> {
    if upi_regex().is_match(upi) {
        Ok(())
    } else {
        Err(WorklinkError::validation("upi_id", "not a valid UPI handle"))
    }
}

/// Validate a UPI transaction reference (12-digit UTR).
pub fn validate_utr(reference: &str) -> Result<()> {
    if utr_regex().is_match(reference) {
        Ok(())
    } else {
        Err(WorklinkError::validation(
            "upi_reference",
            "not a 12-digit UTR",
        ))
    }
}
