//! Protocol-client transport seam for the auth handshake
//!
//! The actual messaging-protocol work lives in an external helper from the
//! same toolchain as the worker launcher. Each operation is one scoped
//! helper invocation: spawn, read a single JSON status line from stdout,
//! reap. Connection release is process exit, so nothing can leak across
//! calls, and every invocation runs under a hard timeout.
//!
//! A successful sign-in persists the session artifact at the requested path
//! as a side effect inside the helper; this layer only guarantees that the
//! helper got the right path and was cleanly reaped so the write is flushed.

use crate::errors::TransportError;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

/// Inputs for a verification-code request
#[derive(Debug, Clone)]
pub struct CodeRequest {
    pub phone: String,
    pub api_id: i64,
    pub api_hash: String,
    pub session_path: PathBuf,
}

/// Inputs for a sign-in attempt
///
/// `password` set means a 2FA attempt; the helper ignores the code fields
/// for the provider call in that case, mirroring the provider contract.
#[derive(Debug, Clone)]
pub struct SignInRequest {
    pub phone: String,
    pub api_id: i64,
    pub api_hash: String,
    pub session_path: PathBuf,
    pub code: String,
    pub phone_code_hash: String,
    pub password: Option<String>,
}

/// One JSON status line from the helper
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderReply {
    AlreadyAuthorized,
    CodeSent { phone_code_hash: String },
    Authorized,
    PasswordRequired,
    InvalidCode,
    CodeExpired,
    InvalidPhone,
    Banned,
    FloodWait { seconds: u64 },
    Error { message: String },
}

/// Seam between the auth coordinator and the external protocol client
///
/// Tests substitute an in-memory fake; production drives the helper binary.
#[async_trait]
pub trait AuthTransport: Send + Sync {
    async fn request_code(&self, req: &CodeRequest) -> Result<ProviderReply, TransportError>;
    async fn sign_in(&self, req: &SignInRequest) -> Result<ProviderReply, TransportError>;
}

/// Production transport driving the external helper binary
pub struct HelperTransport {
    helper: PathBuf,
    timeout: Duration,
}

impl HelperTransport {
    pub fn new(helper: PathBuf, timeout: Duration) -> Self {
        Self { helper, timeout }
    }

    pub fn from_config() -> Self {
        let (helper, timeout_secs) = crate::config::with_config(|c| {
            (
                c.accounts.helper_path.clone(),
                c.accounts.auth_timeout_secs,
            )
        });
        Self::new(PathBuf::from(helper), Duration::from_secs(timeout_secs))
    }

    async fn invoke(&self, args: Vec<String>) -> Result<ProviderReply, TransportError> {
        if !self.helper.exists() {
            return Err(TransportError::HelperMissing {
                path: self.helper.display().to_string(),
            });
        }

        let mut cmd = tokio::process::Command::new(&self.helper);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            // Timeout or drop must reap the helper: a scoped invocation
            // never outlives its call.
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| TransportError::spawn(e.to_string()))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(TransportError::spawn(e.to_string())),
            Err(_) => {
                return Err(TransportError::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("")
            .trim();

        if line.is_empty() {
            return Err(TransportError::malformed(format!(
                "empty output, exit status {}",
                output.status
            )));
        }

        serde_json::from_str::<ProviderReply>(line)
            .map_err(|_| TransportError::malformed(line.to_string()))
    }
}

#[async_trait]
impl AuthTransport for HelperTransport {
    async fn request_code(&self, req: &CodeRequest) -> Result<ProviderReply, TransportError> {
        logger::debug(
            LogTag::Auth,
            &format!("Requesting login code for {}", req.phone),
        );
        self.invoke(vec![
            "request-code".to_string(),
            "--session".to_string(),
            req.session_path.display().to_string(),
            "--api-id".to_string(),
            req.api_id.to_string(),
            "--api-hash".to_string(),
            req.api_hash.clone(),
            "--phone".to_string(),
            req.phone.clone(),
        ])
        .await
    }

    async fn sign_in(&self, req: &SignInRequest) -> Result<ProviderReply, TransportError> {
        logger::debug(LogTag::Auth, &format!("Signing in {}", req.phone));
        let mut args = vec![
            "sign-in".to_string(),
            "--session".to_string(),
            req.session_path.display().to_string(),
            "--api-id".to_string(),
            req.api_id.to_string(),
            "--api-hash".to_string(),
            req.api_hash.clone(),
            "--phone".to_string(),
            req.phone.clone(),
            "--code".to_string(),
            req.code.clone(),
            "--code-hash".to_string(),
            req.phone_code_hash.clone(),
        ];
        if let Some(password) = &req.password {
            args.push("--password".to_string());
            args.push(password.clone());
        }
        self.invoke(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_wire_format_round_trips() {
        let reply: ProviderReply =
            serde_json::from_str(r#"{"status":"code_sent","phone_code_hash":"abc123"}"#).unwrap();
        assert_eq!(
            reply,
            ProviderReply::CodeSent {
                phone_code_hash: "abc123".to_string()
            }
        );

        let reply: ProviderReply =
            serde_json::from_str(r#"{"status":"flood_wait","seconds":30}"#).unwrap();
        assert_eq!(reply, ProviderReply::FloodWait { seconds: 30 });

        let reply: ProviderReply = serde_json::from_str(r#"{"status":"authorized"}"#).unwrap();
        assert_eq!(reply, ProviderReply::Authorized);
    }

    #[tokio::test]
    async fn missing_helper_is_reported() {
        let transport = HelperTransport::new(
            PathBuf::from("/no/such/helper"),
            Duration::from_secs(1),
        );
        let req = CodeRequest {
            phone: "79990001122".to_string(),
            api_id: 12345,
            api_hash: "a".repeat(32),
            session_path: PathBuf::from("/tmp/x.session"),
        };
        match transport.request_code(&req).await {
            Err(TransportError::HelperMissing { path }) => {
                assert!(path.contains("/no/such/helper"));
            }
            other => panic!("expected HelperMissing, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn helper_reply_is_parsed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let helper = dir.path().join("helper.sh");
        std::fs::write(
            &helper,
            "#!/bin/sh\necho '{\"status\":\"code_sent\",\"phone_code_hash\":\"abc123\"}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&helper, std::fs::Permissions::from_mode(0o755)).unwrap();

        let transport = HelperTransport::new(helper, Duration::from_secs(5));
        let req = CodeRequest {
            phone: "79990001122".to_string(),
            api_id: 12345,
            api_hash: "a".repeat(32),
            session_path: dir.path().join("79990001122.session"),
        };
        let reply = transport.request_code(&req).await.unwrap();
        assert_eq!(
            reply,
            ProviderReply::CodeSent {
                phone_code_hash: "abc123".to_string()
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn garbage_output_is_malformed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let helper = dir.path().join("helper.sh");
        std::fs::write(&helper, "#!/bin/sh\necho 'not json'\n").unwrap();
        std::fs::set_permissions(&helper, std::fs::Permissions::from_mode(0o755)).unwrap();

        let transport = HelperTransport::new(helper, Duration::from_secs(5));
        let req = CodeRequest {
            phone: "79990001122".to_string(),
            api_id: 12345,
            api_hash: "a".repeat(32),
            session_path: dir.path().join("79990001122.session"),
        };
        match transport.request_code(&req).await {
            Err(TransportError::Malformed { output }) => assert!(output.contains("not json")),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }
}
