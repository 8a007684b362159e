//! Auth handshake coordination
//!
//! Drives the three-step handshake (request code → submit code → optional
//! 2FA password) through the transport seam. Every entry point validates
//! its inputs first and fails fast with a tagged outcome before any I/O
//! happens.
//!
//! The state machine itself is conversation-scoped and caller-driven: the
//! Telegram dialogue holds the `HandshakeState` and re-invokes `submit_code`
//! with the password set when `PasswordRequired` comes back.

use crate::accounts::transport::{AuthTransport, CodeRequest, ProviderReply, SignInRequest};
use crate::accounts::types::{AuthFailure, CodeRequestOutcome, SignInOutcome};
use crate::logger::{self, LogTag};
use crate::paths::SESSION_SUFFIX;
use std::path::Path;
use std::sync::Arc;

/// Coordinates the auth handshake against the external protocol client
pub struct AuthSessionCoordinator {
    transport: Arc<dyn AuthTransport>,
}

impl AuthSessionCoordinator {
    pub fn new(transport: Arc<dyn AuthTransport>) -> Self {
        Self { transport }
    }

    /// Step one: ask the provider to send a verification code
    ///
    /// Short-circuits to `AlreadyAuthorized` when the session artifact is
    /// already valid. On success the returned continuation token must be
    /// stashed in conversation state for `submit_code`.
    pub async fn request_code(
        &self,
        phone: &str,
        api_id: i64,
        api_hash: &str,
        session_path: &Path,
    ) -> CodeRequestOutcome {
        if let Some(failure) = validate_inputs(phone, api_id, api_hash, session_path) {
            logger::warning(
                LogTag::Auth,
                &format!("Rejected code request for {:?}: {}", phone, failure.tag()),
            );
            return CodeRequestOutcome::Failed(failure);
        }

        let req = CodeRequest {
            phone: phone.to_string(),
            api_id,
            api_hash: api_hash.to_string(),
            session_path: session_path.to_path_buf(),
        };

        let reply = match self.transport.request_code(&req).await {
            Ok(reply) => reply,
            Err(e) => {
                logger::error(LogTag::Auth, &format!("Code request for {}: {}", phone, e));
                return CodeRequestOutcome::Failed(AuthFailure::Provider {
                    message: e.to_string(),
                });
            }
        };

        match reply {
            ProviderReply::AlreadyAuthorized => {
                logger::info(LogTag::Auth, &format!("{} is already authorized", phone));
                CodeRequestOutcome::AlreadyAuthorized
            }
            ProviderReply::CodeSent { phone_code_hash } => {
                // Helper output is untrusted; take a char prefix, not a byte
                // slice, so a multibyte hash cannot split a code point.
                let prefix: String = phone_code_hash.chars().take(8).collect();
                logger::info(
                    LogTag::Auth,
                    &format!("Code sent to {}, hash {}...", phone, prefix),
                );
                CodeRequestOutcome::CodeSent { phone_code_hash }
            }
            ProviderReply::InvalidPhone => {
                CodeRequestOutcome::Failed(AuthFailure::InvalidPhone)
            }
            ProviderReply::Banned => {
                logger::warning(LogTag::Auth, &format!("{} is banned by the provider", phone));
                CodeRequestOutcome::Failed(AuthFailure::Banned)
            }
            ProviderReply::FloodWait { seconds } => {
                logger::warning(
                    LogTag::Auth,
                    &format!("Flood wait for {}: {}s", phone, seconds),
                );
                CodeRequestOutcome::Failed(AuthFailure::RateLimited { wait_secs: seconds })
            }
            ProviderReply::Error { message } => {
                logger::error(LogTag::Auth, &format!("Code request for {}: {}", phone, message));
                CodeRequestOutcome::Failed(AuthFailure::Provider { message })
            }
            unexpected => {
                logger::error(
                    LogTag::Auth,
                    &format!("Unexpected reply to code request: {:?}", unexpected),
                );
                CodeRequestOutcome::Failed(AuthFailure::Provider {
                    message: format!("unexpected reply {:?}", unexpected),
                })
            }
        }
    }

    /// Steps two and three: sign in with the code, or with the 2FA password
    ///
    /// When the provider answers `PasswordRequired` the caller re-invokes
    /// this operation with `password` set; the code fields are ignored for
    /// the provider call in that case.
    #[allow(clippy::too_many_arguments)]
    pub async fn submit_code(
        &self,
        phone: &str,
        code: &str,
        api_id: i64,
        api_hash: &str,
        phone_code_hash: &str,
        password: Option<&str>,
        session_path: &Path,
    ) -> SignInOutcome {
        if let Some(failure) = validate_inputs(phone, api_id, api_hash, session_path) {
            logger::warning(
                LogTag::Auth,
                &format!("Rejected sign-in for {:?}: {}", phone, failure.tag()),
            );
            return SignInOutcome::Failed(failure);
        }

        let req = SignInRequest {
            phone: phone.to_string(),
            api_id,
            api_hash: api_hash.to_string(),
            session_path: session_path.to_path_buf(),
            code: code.trim().to_string(),
            phone_code_hash: phone_code_hash.to_string(),
            password: password.map(|p| p.to_string()),
        };

        let reply = match self.transport.sign_in(&req).await {
            Ok(reply) => reply,
            Err(e) => {
                logger::error(LogTag::Auth, &format!("Sign-in for {}: {}", phone, e));
                return SignInOutcome::Failed(AuthFailure::Provider {
                    message: e.to_string(),
                });
            }
        };

        match reply {
            ProviderReply::Authorized | ProviderReply::AlreadyAuthorized => {
                logger::info(LogTag::Auth, &format!("{} authorized", phone));
                SignInOutcome::Authorized
            }
            ProviderReply::PasswordRequired => {
                logger::info(LogTag::Auth, &format!("{} requires the 2FA password", phone));
                SignInOutcome::PasswordRequired
            }
            ProviderReply::InvalidCode => {
                logger::warning(LogTag::Auth, &format!("Invalid code for {}", phone));
                SignInOutcome::Failed(AuthFailure::InvalidCode)
            }
            ProviderReply::CodeExpired => {
                logger::warning(LogTag::Auth, &format!("Code expired for {}", phone));
                SignInOutcome::Failed(AuthFailure::CodeExpired)
            }
            ProviderReply::Banned => {
                SignInOutcome::Failed(AuthFailure::Banned)
            }
            ProviderReply::FloodWait { seconds } => {
                SignInOutcome::Failed(AuthFailure::RateLimited { wait_secs: seconds })
            }
            ProviderReply::InvalidPhone => SignInOutcome::Failed(AuthFailure::InvalidPhone),
            ProviderReply::Error { message } => {
                logger::error(LogTag::Auth, &format!("Sign-in for {}: {}", phone, message));
                SignInOutcome::Failed(AuthFailure::Provider { message })
            }
            unexpected => {
                logger::error(
                    LogTag::Auth,
                    &format!("Unexpected reply to sign-in: {:?}", unexpected),
                );
                SignInOutcome::Failed(AuthFailure::Provider {
                    message: format!("unexpected reply {:?}", unexpected),
                })
            }
        }
    }
}

// =============================================================================
// INPUT VALIDATION
// =============================================================================

/// First failed check wins; applied before any I/O on every entry point
fn validate_inputs(
    phone: &str,
    api_id: i64,
    api_hash: &str,
    session_path: &Path,
) -> Option<AuthFailure> {
    if !is_valid_phone(phone) {
        return Some(AuthFailure::InvalidPhone);
    }
    if api_id <= 0 {
        return Some(AuthFailure::InvalidApiId);
    }
    if api_hash.len() != 32 {
        return Some(AuthFailure::InvalidApiHash);
    }
    if !session_path.to_string_lossy().ends_with(SESSION_SUFFIX) {
        return Some(AuthFailure::InvalidSessionPath);
    }
    None
}

/// Non-empty, all digits after stripping one leading `+`
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
