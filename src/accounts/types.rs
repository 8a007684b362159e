//! Core types for the account lifecycle manager
//!
//! Outcomes are explicit tagged enums: the continuation token, wait seconds
//! and failure tags all carry their own variants instead of sharing one
//! loosely-typed message string.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A managed external messaging session keyed by phone number
///
/// The database layer owns the record lifecycle; the lifecycle service only
/// reads these fields and reports connection state back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    /// Unique external identifier, digits with optional leading `+`
    pub phone: String,
    pub api_id: i64,
    /// 32-character provider secret
    pub api_hash: String,
    /// Path to the opaque session artifact (`<phone>.session`)
    pub session_path: PathBuf,
}

/// Transient state of an in-flight auth handshake
///
/// Lives only in the Telegram dialogue state for one conversation; never
/// persisted, never survives a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeState {
    pub phone: String,
    pub api_id: i64,
    pub api_hash: String,
    pub session_path: PathBuf,
    /// Continuation token returned by the code request
    pub phone_code_hash: String,
    /// Set once the provider has asked for the 2FA password
    pub pending_password: bool,
}

/// Failure tags for auth operations
///
/// Validation tags are produced before any I/O; the rest map provider
/// responses. Each is independently testable and maps to a distinct
/// user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    InvalidPhone,
    InvalidApiId,
    InvalidApiHash,
    InvalidSessionPath,
    InvalidCode,
    CodeExpired,
    /// Provider-side ban; terminal for this account
    Banned,
    RateLimited {
        wait_secs: u64,
    },
    /// Anything unclassified, with the logged detail
    Provider {
        message: String,
    },
}

impl AuthFailure {
    /// Stable machine-checkable tag, used in logs and tests
    pub fn tag(&self) -> &'static str {
        match self {
            AuthFailure::InvalidPhone => "invalid_phone",
            AuthFailure::InvalidApiId => "invalid_api_id",
            AuthFailure::InvalidApiHash => "invalid_api_hash",
            AuthFailure::InvalidSessionPath => "invalid_path",
            AuthFailure::InvalidCode => "invalid_code",
            AuthFailure::CodeExpired => "code_expired",
            AuthFailure::Banned => "banned",
            AuthFailure::RateLimited { .. } => "rate_limited",
            AuthFailure::Provider { .. } => "provider_error",
        }
    }

    /// Distinct user-facing message per tag; generic wording only for the
    /// unclassified fallback
    pub fn user_message(&self) -> String {
        match self {
            AuthFailure::InvalidPhone => {
                "Phone number must be digits, with an optional leading +.".to_string()
            }
            AuthFailure::InvalidApiId => "API ID must be a positive number.".to_string(),
            AuthFailure::InvalidApiHash => {
                "API hash must be exactly 32 characters.".to_string()
            }
            AuthFailure::InvalidSessionPath => {
                "Session path must end with .session.".to_string()
            }
            AuthFailure::InvalidCode => {
                "That code is not valid. Check it and send again.".to_string()
            }
            AuthFailure::CodeExpired => {
                "The code expired. Request a new one with Connect.".to_string()
            }
            AuthFailure::Banned => {
                "This phone number is banned by the provider. The account cannot be connected."
                    .to_string()
            }
            AuthFailure::RateLimited { wait_secs } => {
                format!("Rate limited by the provider. Wait {}s and retry.", wait_secs)
            }
            AuthFailure::Provider { .. } => "Something went wrong on the provider side.".to_string(),
        }
    }
}

/// Outcome of a verification-code request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeRequestOutcome {
    /// The session on disk is already authorized; no code was sent
    AlreadyAuthorized,
    /// Code sent; the caller must stash the continuation token
    CodeSent { phone_code_hash: String },
    Failed(AuthFailure),
}

/// Outcome of a sign-in attempt (code or 2FA password)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// Session is now durably authorized on disk
    Authorized,
    /// Provider wants the 2FA password; not a hard failure
    PasswordRequired,
    Failed(AuthFailure),
}

/// Outcome of a lifecycle connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// An existing session resumed; worker is live, no auth needed
    Connected { pid: i32 },
    /// Code flow started; conversation must continue with the code
    CodeNeeded { handshake: HandshakeState },
    /// The stored session is already authorized but the worker would not
    /// come up; surfaced so the operator can check the launcher
    WorkerUnavailable,
    Failed(AuthFailure),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_tags_are_distinct() {
        let tags = [
            AuthFailure::InvalidPhone.tag(),
            AuthFailure::InvalidApiId.tag(),
            AuthFailure::InvalidApiHash.tag(),
            AuthFailure::InvalidSessionPath.tag(),
            AuthFailure::InvalidCode.tag(),
            AuthFailure::CodeExpired.tag(),
            AuthFailure::Banned.tag(),
            AuthFailure::RateLimited { wait_secs: 1 }.tag(),
            AuthFailure::Provider {
                message: "x".to_string(),
            }
            .tag(),
        ];
        let unique: std::collections::HashSet<_> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
    }

    #[test]
    fn rate_limit_message_names_the_wait() {
        let msg = AuthFailure::RateLimited { wait_secs: 42 }.user_message();
        assert!(msg.contains("42"));
    }
}
