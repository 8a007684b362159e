//! Worker process supervision
//!
//! Owns the relationship between an account phone number and exactly one
//! external worker process keeping that account's session alive. Liveness is
//! tracked out-of-band: the launcher writes a `<phone>.pid` marker file, and
//! every query re-verifies the pid against the OS process table. The marker
//! is a hint; the process table is ground truth.
//!
//! Workers are launched detached, in their own process group, so they
//! survive restarts and crashes of this bot. All filesystem and signal
//! failures here degrade to logged no-ops: the worker is out-of-process and
//! partially outside our control, so liveness and stop are best-effort.

use crate::config::with_config;
use crate::logger::{self, LogTag};
use crate::paths;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

/// Sentinel returned by `start` when no worker came up
pub const START_FAILED: i32 = -1;

/// Interval between marker-file polls during `start`
const PID_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of delivering a termination signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalError {
    /// Process or group already gone; expected after a worker exits on its own
    NoSuchProcess,
    /// Worker runs under another uid; loggable, non-fatal
    PermissionDenied,
    Other(i32),
}

/// OS process-table seam
///
/// Liveness must never be modeled as an in-memory boolean: the worker
/// outlives this bot. Tests substitute a fake registry.
pub trait ProcessRegistry: Send + Sync {
    /// Whether a process with this pid exists right now
    fn pid_exists(&self, pid: i32) -> bool;

    /// Send SIGTERM to the process group containing `pid`
    ///
    /// The whole group is signalled because workers may spawn children that
    /// must die together.
    fn signal_group(&self, pid: i32) -> Result<(), SignalError>;
}

/// Real OS process table
pub struct OsProcessRegistry;

#[cfg(unix)]
impl ProcessRegistry for OsProcessRegistry {
    fn pid_exists(&self, pid: i32) -> bool {
        if pid <= 0 {
            return false;
        }
        // kill(pid, 0) probes existence without delivering a signal.
        // EPERM still means the process exists, just not ours.
        let rc = unsafe { libc::kill(pid, 0) };
        if rc == 0 {
            return true;
        }
        std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }

    fn signal_group(&self, pid: i32) -> Result<(), SignalError> {
        let pgid = unsafe { libc::getpgid(pid) };
        if pgid < 0 {
            return Err(map_errno());
        }
        let rc = unsafe { libc::killpg(pgid, libc::SIGTERM) };
        if rc == 0 {
            Ok(())
        } else {
            Err(map_errno())
        }
    }
}

#[cfg(unix)]
fn map_errno() -> SignalError {
    match std::io::Error::last_os_error().raw_os_error() {
        Some(libc::ESRCH) => SignalError::NoSuchProcess,
        Some(libc::EPERM) => SignalError::PermissionDenied,
        Some(code) => SignalError::Other(code),
        None => SignalError::Other(0),
    }
}

/// Launches, tracks and stops one external worker per account phone
pub struct ProcessSupervisor {
    sessions_dir: PathBuf,
    launcher: PathBuf,
    pid_wait: Duration,
    registry: Arc<dyn ProcessRegistry>,
}

impl ProcessSupervisor {
    pub fn new(
        sessions_dir: PathBuf,
        launcher: PathBuf,
        pid_wait: Duration,
        registry: Arc<dyn ProcessRegistry>,
    ) -> Self {
        Self {
            sessions_dir,
            launcher,
            pid_wait,
            registry,
        }
    }

    /// Build from the global configuration, with the real process table
    pub fn from_config() -> Self {
        let (sessions_dir, launcher, pid_wait_ms) = with_config(|c| {
            (
                c.accounts.sessions_dir.clone(),
                c.accounts.launcher_path.clone(),
                c.accounts.pid_wait_ms,
            )
        });

        let sessions_dir = if sessions_dir.is_empty() {
            paths::get_sessions_directory()
        } else {
            PathBuf::from(sessions_dir)
        };

        Self::new(
            sessions_dir,
            PathBuf::from(launcher),
            Duration::from_millis(pid_wait_ms),
            Arc::new(OsProcessRegistry),
        )
    }

    fn pid_file(&self, phone: &str) -> PathBuf {
        paths::pid_file_in(&self.sessions_dir, phone)
    }

    fn session_file(&self, phone: &str) -> PathBuf {
        paths::session_file_in(&self.sessions_dir, phone)
    }

    /// Launch a detached worker for this account
    ///
    /// Invokes the configured launcher as
    /// `launcher <session_path> <api_id> <api_hash> <phone>`, then waits up
    /// to the configured window for the liveness marker to appear. Returns
    /// the pid from the marker, or `START_FAILED` if the launcher is missing
    /// or no marker shows up.
    pub async fn start(
        &self,
        phone: &str,
        session_path: &Path,
        api_id: i64,
        api_hash: &str,
    ) -> i32 {
        if !self.launcher.exists() {
            logger::error(
                LogTag::Supervisor,
                &format!("Launcher not found: {}", self.launcher.display()),
            );
            return START_FAILED;
        }

        let mut cmd = std::process::Command::new(&self.launcher);
        cmd.arg(session_path)
            .arg(api_id.to_string())
            .arg(api_hash)
            .arg(phone)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Own process group: the worker must survive this bot's termination.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut cmd, 0);

        match cmd.spawn() {
            Ok(child) => {
                // Deliberately dropped: liveness comes from the marker file,
                // not an in-process handle.
                drop(child);
            }
            Err(e) => {
                logger::error(
                    LogTag::Supervisor,
                    &format!("Failed to spawn launcher for {}: {}", phone, e),
                );
                return START_FAILED;
            }
        }

        let pid_path = self.pid_file(phone);
        let deadline = tokio::time::Instant::now() + self.pid_wait;
        loop {
            if let Some(pid) = read_pid(&pid_path) {
                logger::info(
                    LogTag::Supervisor,
                    &format!("Worker for {} started with pid {}", phone, pid),
                );
                return pid;
            }
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(PID_POLL_INTERVAL).await;
        }

        logger::error(
            LogTag::Supervisor,
            &format!("No pid marker appeared for {}", phone),
        );
        START_FAILED
    }

    /// Whether a live worker exists for this phone
    ///
    /// False on any marker read failure. A marker whose pid is dead is
    /// removed on detection, so a later `start` begins from a clean state.
    /// Never errors.
    pub fn is_running(&self, phone: &str) -> bool {
        let pid_path = self.pid_file(phone);
        let pid = match read_pid(&pid_path) {
            Some(pid) => pid,
            None => return false,
        };

        if self.registry.pid_exists(pid) {
            return true;
        }

        logger::debug(
            LogTag::Supervisor,
            &format!("Stale pid marker for {} (pid {}), removing", phone, pid),
        );
        if let Err(e) = std::fs::remove_file(&pid_path) {
            logger::warning(
                LogTag::Supervisor,
                &format!("Could not remove stale marker {}: {}", pid_path.display(), e),
            );
        }
        false
    }

    /// Stop the worker for this phone
    ///
    /// Idempotent: a missing marker is a no-op. Signals the whole process
    /// group, tolerating "no such process" and "permission denied", then
    /// removes the marker and, when `delete_session` is set, the session
    /// artifact as well.
    pub async fn stop(&self, phone: &str, delete_session: bool) {
        let pid_path = self.pid_file(phone);
        let pid = match read_pid(&pid_path) {
            Some(pid) => pid,
            None => {
                logger::info(
                    LogTag::Supervisor,
                    &format!("No pid marker for {}, nothing to stop", phone),
                );
                return;
            }
        };

        match self.registry.signal_group(pid) {
            Ok(()) => {
                logger::info(
                    LogTag::Supervisor,
                    &format!("Sent SIGTERM to worker group of {} (pid {})", phone, pid),
                );
            }
            Err(SignalError::NoSuchProcess) => {
                logger::info(
                    LogTag::Supervisor,
                    &format!("Worker process {} already gone", pid),
                );
            }
            Err(SignalError::PermissionDenied) => {
                logger::warning(
                    LogTag::Supervisor,
                    &format!("No permission to signal worker process {}", pid),
                );
            }
            Err(SignalError::Other(code)) => {
                logger::warning(
                    LogTag::Supervisor,
                    &format!("Signal to worker {} failed with errno {}", pid, code),
                );
            }
        }

        remove_file_logged(&pid_path);
        if delete_session {
            remove_file_logged(&self.session_file(phone));
        }
    }
}

fn read_pid(pid_path: &Path) -> Option<i32> {
    match std::fs::read_to_string(pid_path) {
        Ok(contents) => match contents.trim().parse::<i32>() {
            Ok(pid) => Some(pid),
            Err(_) => {
                logger::warning(
                    LogTag::Supervisor,
                    &format!("Malformed pid marker {}", pid_path.display()),
                );
                None
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            logger::warning(
                LogTag::Supervisor,
                &format!("Could not read pid marker {}: {}", pid_path.display(), e),
            );
            None
        }
    }
}

fn remove_file_logged(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {
            logger::info(LogTag::Supervisor, &format!("Removed {}", path.display()));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            logger::warning(
                LogTag::Supervisor,
                &format!("Could not remove {}: {}", path.display(), e),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Fake process table recording signalled pids
    struct FakeRegistry {
        alive: Mutex<HashSet<i32>>,
        signalled: Mutex<Vec<i32>>,
        signal_result: Result<(), SignalError>,
    }

    impl FakeRegistry {
        fn with_alive(pids: &[i32]) -> Self {
            Self {
                alive: Mutex::new(pids.iter().copied().collect()),
                signalled: Mutex::new(Vec::new()),
                signal_result: Ok(()),
            }
        }

        fn signalled(&self) -> Vec<i32> {
            self.signalled.lock().unwrap().clone()
        }
    }

    impl ProcessRegistry for FakeRegistry {
        fn pid_exists(&self, pid: i32) -> bool {
            self.alive.lock().unwrap().contains(&pid)
        }

        fn signal_group(&self, pid: i32) -> Result<(), SignalError> {
            self.signalled.lock().unwrap().push(pid);
            self.signal_result
        }
    }

    fn supervisor_in(
        dir: &Path,
        launcher: &Path,
        registry: Arc<FakeRegistry>,
    ) -> ProcessSupervisor {
        ProcessSupervisor::new(
            dir.to_path_buf(),
            launcher.to_path_buf(),
            Duration::from_millis(200),
            registry,
        )
    }

    fn write_marker(dir: &Path, phone: &str, contents: &str) -> PathBuf {
        let path = paths::pid_file_in(dir, phone);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn is_running_false_without_marker() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(FakeRegistry::with_alive(&[123]));
        let sup = supervisor_in(dir.path(), Path::new("/nonexistent"), registry);
        assert!(!sup.is_running("79990001122"));
    }

    #[test]
    fn is_running_true_when_marker_and_process_agree() {
        let dir = tempfile::tempdir().unwrap();
        write_marker(dir.path(), "79990001122", "123\n");
        let registry = Arc::new(FakeRegistry::with_alive(&[123]));
        let sup = supervisor_in(dir.path(), Path::new("/nonexistent"), registry);
        assert!(sup.is_running("79990001122"));
    }

    #[test]
    fn is_running_removes_stale_marker() {
        let dir = tempfile::tempdir().unwrap();
        let marker = write_marker(dir.path(), "79990001122", "123");
        let registry = Arc::new(FakeRegistry::with_alive(&[]));
        let sup = supervisor_in(dir.path(), Path::new("/nonexistent"), registry);
        assert!(!sup.is_running("79990001122"));
        assert!(!marker.exists());
    }

    #[test]
    fn is_running_false_on_malformed_marker() {
        let dir = tempfile::tempdir().unwrap();
        write_marker(dir.path(), "79990001122", "not-a-pid");
        let registry = Arc::new(FakeRegistry::with_alive(&[123]));
        let sup = supervisor_in(dir.path(), Path::new("/nonexistent"), registry);
        assert!(!sup.is_running("79990001122"));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let marker = write_marker(dir.path(), "79990001122", "123");
        let registry = Arc::new(FakeRegistry::with_alive(&[123]));
        let sup = supervisor_in(dir.path(), Path::new("/nonexistent"), registry.clone());

        sup.stop("79990001122", false).await;
        assert!(!marker.exists());
        assert_eq!(registry.signalled(), vec![123]);

        // Second stop: marker already gone, no signal, no error.
        sup.stop("79990001122", false).await;
        assert!(!marker.exists());
        assert_eq!(registry.signalled(), vec![123]);
    }

    #[tokio::test]
    async fn stop_tolerates_missing_process() {
        let dir = tempfile::tempdir().unwrap();
        let marker = write_marker(dir.path(), "79990001122", "123");
        let registry = Arc::new(FakeRegistry {
            alive: Mutex::new(HashSet::new()),
            signalled: Mutex::new(Vec::new()),
            signal_result: Err(SignalError::NoSuchProcess),
        });
        let sup = supervisor_in(dir.path(), Path::new("/nonexistent"), registry);

        sup.stop("79990001122", false).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn stop_with_delete_session_removes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write_marker(dir.path(), "79990001122", "123");
        let session = paths::session_file_in(dir.path(), "79990001122");
        std::fs::write(&session, b"opaque").unwrap();

        let registry = Arc::new(FakeRegistry::with_alive(&[123]));
        let sup = supervisor_in(dir.path(), Path::new("/nonexistent"), registry);

        sup.stop("79990001122", true).await;
        assert!(!session.exists());
    }

    #[tokio::test]
    async fn stop_without_delete_session_keeps_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write_marker(dir.path(), "79990001122", "123");
        let session = paths::session_file_in(dir.path(), "79990001122");
        std::fs::write(&session, b"opaque").unwrap();

        let registry = Arc::new(FakeRegistry::with_alive(&[123]));
        let sup = supervisor_in(dir.path(), Path::new("/nonexistent"), registry);

        sup.stop("79990001122", false).await;
        assert!(session.exists());
    }

    #[tokio::test]
    async fn start_fails_when_launcher_missing() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(FakeRegistry::with_alive(&[]));
        let sup = supervisor_in(dir.path(), Path::new("/no/such/launcher"), registry);

        let session = paths::session_file_in(dir.path(), "79990001122");
        let pid = sup.start("79990001122", &session, 12345, "a".repeat(32).as_str()).await;
        assert_eq!(pid, START_FAILED);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn start_fails_when_no_marker_appears() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(FakeRegistry::with_alive(&[]));
        // /bin/true exists, runs, and never writes a marker.
        let sup = supervisor_in(dir.path(), Path::new("/bin/true"), registry);

        let session = paths::session_file_in(dir.path(), "79990001122");
        let pid = sup.start("79990001122", &session, 12345, "a".repeat(32).as_str()).await;
        assert_eq!(pid, START_FAILED);
        assert!(!sup.is_running("79990001122"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn start_returns_pid_from_marker() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        // Launcher stub: derives the marker path from the session path the
        // way the real launcher does, and records a fixed pid.
        let launcher = dir.path().join("launcher.sh");
        std::fs::write(&launcher, "#!/bin/sh\necho 4242 > \"${1%.session}.pid\"\n").unwrap();
        std::fs::set_permissions(&launcher, std::fs::Permissions::from_mode(0o755)).unwrap();

        let registry = Arc::new(FakeRegistry::with_alive(&[4242]));
        let sup = supervisor_in(dir.path(), &launcher, registry);

        let session = paths::session_file_in(dir.path(), "79990001122");
        let pid = sup.start("79990001122", &session, 12345, "a".repeat(32).as_str()).await;
        assert_eq!(pid, 4242);
        assert!(sup.is_running("79990001122"));
    }
}
