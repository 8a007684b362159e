//! Account lifecycle service
//!
//! The single entry point the conversation layer calls. Composes the
//! process supervisor and the auth coordinator into account-level
//! operations with idempotence guarantees, serialized per phone: user
//! actions can race (double taps, two admins), and at most one worker per
//! phone may ever exist.

use crate::accounts::auth::AuthSessionCoordinator;
use crate::accounts::supervisor::{ProcessSupervisor, START_FAILED};
use crate::accounts::transport::HelperTransport;
use crate::accounts::types::{
    AccountIdentity, CodeRequestOutcome, ConnectOutcome, HandshakeState, SignInOutcome,
};
use crate::logger::{self, LogTag};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct AccountLifecycleService {
    supervisor: ProcessSupervisor,
    coordinator: AuthSessionCoordinator,
    /// Per-phone guards; connect/disconnect/delete for one phone never
    /// overlap. The map only grows, one entry per managed phone.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AccountLifecycleService {
    pub fn new(supervisor: ProcessSupervisor, coordinator: AuthSessionCoordinator) -> Self {
        Self {
            supervisor,
            coordinator,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build from the global configuration with production collaborators
    pub fn from_config() -> Self {
        Self::new(
            ProcessSupervisor::from_config(),
            AuthSessionCoordinator::new(Arc::new(HelperTransport::from_config())),
        )
    }

    async fn phone_lock(&self, phone: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(phone.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Connect an account
    ///
    /// Tries to resume the existing session by starting the worker; a live
    /// worker means connected, no re-authentication. Otherwise starts the
    /// code flow and hands the conversation a fresh handshake state.
    pub async fn connect(&self, account: &AccountIdentity) -> ConnectOutcome {
        let lock = self.phone_lock(&account.phone).await;
        let _guard = lock.lock().await;

        let pid = self
            .supervisor
            .start(
                &account.phone,
                &account.session_path,
                account.api_id,
                &account.api_hash,
            )
            .await;

        if pid != START_FAILED && self.supervisor.is_running(&account.phone) {
            logger::info(
                LogTag::Accounts,
                &format!("{} resumed existing session (pid {})", account.phone, pid),
            );
            return ConnectOutcome::Connected { pid };
        }

        match self
            .coordinator
            .request_code(
                &account.phone,
                account.api_id,
                &account.api_hash,
                &account.session_path,
            )
            .await
        {
            CodeRequestOutcome::CodeSent { phone_code_hash } => ConnectOutcome::CodeNeeded {
                handshake: HandshakeState {
                    phone: account.phone.clone(),
                    api_id: account.api_id,
                    api_hash: account.api_hash.clone(),
                    session_path: account.session_path.clone(),
                    phone_code_hash,
                    pending_password: false,
                },
            },
            CodeRequestOutcome::AlreadyAuthorized => {
                // Session is fine but the worker would not come up; the
                // launcher side needs attention, not the credentials.
                logger::warning(
                    LogTag::Accounts,
                    &format!("{} authorized but worker did not start", account.phone),
                );
                ConnectOutcome::WorkerUnavailable
            }
            CodeRequestOutcome::Failed(failure) => ConnectOutcome::Failed(failure),
        }
    }

    /// Continue an in-flight handshake with a code or a 2FA password
    pub async fn continue_handshake(
        &self,
        handshake: &HandshakeState,
        code: &str,
        password: Option<&str>,
    ) -> SignInOutcome {
        self.coordinator
            .submit_code(
                &handshake.phone,
                code,
                handshake.api_id,
                &handshake.api_hash,
                &handshake.phone_code_hash,
                password,
                &handshake.session_path,
            )
            .await
    }

    /// Disconnect an account: stop its worker, keep the session artifact
    ///
    /// The caller persists the connected=false flag; a vanished worker makes
    /// this a logged no-op.
    pub async fn disconnect(&self, account: &AccountIdentity) {
        let lock = self.phone_lock(&account.phone).await;
        let _guard = lock.lock().await;
        self.supervisor.stop(&account.phone, false).await;
    }

    /// Delete an account's runtime state
    ///
    /// Stops the worker first, then removes the session artifact with it,
    /// so the worker never sees its session file vanish mid-operation. The
    /// caller removes the database record afterwards.
    pub async fn delete(&self, account: &AccountIdentity) {
        let lock = self.phone_lock(&account.phone).await;
        let _guard = lock.lock().await;
        self.supervisor.stop(&account.phone, true).await;
    }

    /// Whether a live worker exists for this account right now
    pub fn is_running(&self, account: &AccountIdentity) -> bool {
        self.supervisor.is_running(&account.phone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::supervisor::{ProcessRegistry, SignalError};
    use crate::accounts::transport::{AuthTransport, CodeRequest, ProviderReply, SignInRequest};
    use crate::errors::TransportError;
    use crate::paths;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    const HASH: &str = "0123456789abcdef0123456789abcdef";
    const PHONE: &str = "79990001122";

    /// Process table double that records, at signal time, whether the
    /// session artifact still existed. That is the stop-before-delete
    /// ordering witness.
    struct OrderingRegistry {
        alive: StdMutex<Vec<i32>>,
        session_path: PathBuf,
        session_present_at_signal: StdMutex<Option<bool>>,
    }

    impl ProcessRegistry for OrderingRegistry {
        fn pid_exists(&self, pid: i32) -> bool {
            self.alive.lock().unwrap().contains(&pid)
        }

        fn signal_group(&self, _pid: i32) -> Result<(), SignalError> {
            *self.session_present_at_signal.lock().unwrap() =
                Some(self.session_path.exists());
            Ok(())
        }
    }

    struct ScriptedTransport {
        replies: StdMutex<Vec<ProviderReply>>,
    }

    #[async_trait]
    impl AuthTransport for ScriptedTransport {
        async fn request_code(&self, _req: &CodeRequest) -> Result<ProviderReply, TransportError> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Err(TransportError::malformed("script exhausted"))
            } else {
                Ok(replies.remove(0))
            }
        }

        async fn sign_in(&self, req: &SignInRequest) -> Result<ProviderReply, TransportError> {
            // Password attempt always wins in this double; code "12345" is
            // the accepted one otherwise.
            if req.password.is_some() || req.code == "12345" {
                Ok(ProviderReply::Authorized)
            } else {
                Ok(ProviderReply::InvalidCode)
            }
        }
    }

    fn account_in(dir: &Path) -> AccountIdentity {
        AccountIdentity {
            phone: PHONE.to_string(),
            api_id: 12345,
            api_hash: HASH.to_string(),
            session_path: paths::session_file_in(dir, PHONE),
        }
    }

    fn service(
        dir: &Path,
        launcher: &Path,
        registry: Arc<OrderingRegistry>,
        replies: Vec<ProviderReply>,
    ) -> AccountLifecycleService {
        let supervisor = ProcessSupervisor::new(
            dir.to_path_buf(),
            launcher.to_path_buf(),
            Duration::from_millis(200),
            registry,
        );
        let coordinator = AuthSessionCoordinator::new(Arc::new(ScriptedTransport {
            replies: StdMutex::new(replies),
        }));
        AccountLifecycleService::new(supervisor, coordinator)
    }

    fn registry_for(dir: &Path, alive: Vec<i32>) -> Arc<OrderingRegistry> {
        Arc::new(OrderingRegistry {
            alive: StdMutex::new(alive),
            session_path: paths::session_file_in(dir, PHONE),
            session_present_at_signal: StdMutex::new(None),
        })
    }

    #[tokio::test]
    async fn connect_falls_through_to_code_flow() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_for(dir.path(), vec![]);
        let svc = service(
            dir.path(),
            Path::new("/no/such/launcher"),
            registry,
            vec![ProviderReply::CodeSent {
                phone_code_hash: "abc123".to_string(),
            }],
        );
        let account = account_in(dir.path());

        match svc.connect(&account).await {
            ConnectOutcome::CodeNeeded { handshake } => {
                assert_eq!(handshake.phone, PHONE);
                assert_eq!(handshake.phone_code_hash, "abc123");
                assert!(!handshake.pending_password);
            }
            other => panic!("expected CodeNeeded, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn connect_resumes_live_session_without_auth() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let launcher = dir.path().join("launcher.sh");
        std::fs::write(&launcher, "#!/bin/sh\necho 4242 > \"${1%.session}.pid\"\n").unwrap();
        std::fs::set_permissions(&launcher, std::fs::Permissions::from_mode(0o755)).unwrap();

        let registry = registry_for(dir.path(), vec![4242]);
        // Empty auth script: any auth call would fail the test via the
        // provider-error fallback, and we assert Connected instead.
        let svc = service(dir.path(), &launcher, registry, vec![]);
        let account = account_in(dir.path());

        match svc.connect(&account).await {
            ConnectOutcome::Connected { pid } => assert_eq!(pid, 4242),
            other => panic!("expected Connected, got {:?}", other),
        }
        assert!(svc.is_running(&account));
    }

    #[tokio::test]
    async fn connect_reports_worker_unavailable_for_authorized_session() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_for(dir.path(), vec![]);
        let svc = service(
            dir.path(),
            Path::new("/no/such/launcher"),
            registry,
            vec![ProviderReply::AlreadyAuthorized],
        );
        let account = account_in(dir.path());

        assert_eq!(svc.connect(&account).await, ConnectOutcome::WorkerUnavailable);
    }

    #[tokio::test]
    async fn disconnect_keeps_session_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let account = account_in(dir.path());
        std::fs::write(&account.session_path, b"opaque").unwrap();
        std::fs::write(paths::pid_file_in(dir.path(), PHONE), "4242").unwrap();

        let registry = registry_for(dir.path(), vec![4242]);
        let svc = service(dir.path(), Path::new("/no/such/launcher"), registry, vec![]);

        svc.disconnect(&account).await;
        assert!(account.session_path.exists());
        assert!(!paths::pid_file_in(dir.path(), PHONE).exists());
    }

    #[tokio::test]
    async fn delete_stops_worker_before_removing_session() {
        let dir = tempfile::tempdir().unwrap();
        let account = account_in(dir.path());
        std::fs::write(&account.session_path, b"opaque").unwrap();
        std::fs::write(paths::pid_file_in(dir.path(), PHONE), "4242").unwrap();

        let registry = registry_for(dir.path(), vec![4242]);
        let svc = service(
            dir.path(),
            Path::new("/no/such/launcher"),
            registry.clone(),
            vec![],
        );

        svc.delete(&account).await;

        // Signal happened while the session artifact still existed, and the
        // artifact is gone afterwards.
        assert_eq!(
            *registry.session_present_at_signal.lock().unwrap(),
            Some(true)
        );
        assert!(!account.session_path.exists());
        assert!(!paths::pid_file_in(dir.path(), PHONE).exists());
    }

    #[tokio::test]
    async fn handshake_code_retry_and_password() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_for(dir.path(), vec![]);
        let svc = service(dir.path(), Path::new("/no/such/launcher"), registry, vec![]);

        let handshake = HandshakeState {
            phone: PHONE.to_string(),
            api_id: 12345,
            api_hash: HASH.to_string(),
            session_path: paths::session_file_in(dir.path(), PHONE),
            phone_code_hash: "abc123".to_string(),
            pending_password: false,
        };

        let outcome = svc.continue_handshake(&handshake, "00000", None).await;
        assert_eq!(
            outcome,
            SignInOutcome::Failed(crate::accounts::types::AuthFailure::InvalidCode)
        );

        let outcome = svc.continue_handshake(&handshake, "12345", None).await;
        assert_eq!(outcome, SignInOutcome::Authorized);

        let outcome = svc
            .continue_handshake(&handshake, "ignored", Some("hunter2"))
            .await;
        assert_eq!(outcome, SignInOutcome::Authorized);
    }
}
