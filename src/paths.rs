//! Centralized path resolution for Subfleet
//!
//! All file and directory paths are resolved through this module so the bot,
//! the supervisor and the tests agree on where things live.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/Subfleet/
//! ├── data/
//! │   ├── config.toml
//! │   └── subfleet.db
//! ├── sessions/
//! │   ├── <phone>.session
//! │   └── <phone>.pid
//! └── logs/
//!     └── subfleet_*.log
//! ```
//!
//! Platform base directory:
//! - **macOS**: `~/Library/Application Support/Subfleet/`
//! - **Windows**: `%LOCALAPPDATA%\Subfleet\`
//! - **Linux**: `$XDG_DATA_HOME/Subfleet/` (fallback `~/.local/share/Subfleet/`)

use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};

/// Liveness marker suffix written by the worker launcher
pub const PID_SUFFIX: &str = ".pid";

/// Session artifact suffix owned by the external protocol client
pub const SESSION_SUFFIX: &str = ".session";

/// Lazy-initialized base directory (thread-safe)
static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(resolve_base_directory);

fn resolve_base_directory() -> PathBuf {
    const APP_DIR: &str = "Subfleet";

    if let Some(dir) = dirs::data_local_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(dir) = dirs::data_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(APP_DIR);
    }

    PathBuf::from(APP_DIR)
}

// =============================================================================
// PRIMARY DIRECTORY ACCESSORS
// =============================================================================

/// Returns the base directory for all Subfleet data
pub fn get_base_directory() -> PathBuf {
    BASE_DIRECTORY.clone()
}

/// Returns the data directory path (config, database)
pub fn get_data_directory() -> PathBuf {
    BASE_DIRECTORY.join("data")
}

/// Returns the sessions directory path (session artifacts and pid markers)
pub fn get_sessions_directory() -> PathBuf {
    BASE_DIRECTORY.join("sessions")
}

/// Returns the logs directory path
pub fn get_logs_directory() -> PathBuf {
    BASE_DIRECTORY.join("logs")
}

// =============================================================================
// FILE PATHS
// =============================================================================

/// Returns the main configuration file path
pub fn get_config_path() -> PathBuf {
    get_data_directory().join("config.toml")
}

/// Returns the main database path
pub fn get_database_path() -> PathBuf {
    get_data_directory().join("subfleet.db")
}

/// Liveness marker path for an account phone, inside `dir`
pub fn pid_file_in(dir: &Path, phone: &str) -> PathBuf {
    dir.join(format!("{}{}", phone, PID_SUFFIX))
}

/// Session artifact path for an account phone, inside `dir`
pub fn session_file_in(dir: &Path, phone: &str) -> PathBuf {
    dir.join(format!("{}{}", phone, SESSION_SUFFIX))
}

/// Default session artifact path for a new account
pub fn default_session_path(phone: &str) -> PathBuf {
    session_file_in(&get_sessions_directory(), phone)
}

// =============================================================================
// DIRECTORY CREATION
// =============================================================================

/// Ensures all required directories exist
///
/// Creates the base directory and all subdirectories needed for operation.
/// Call this early in startup, before the logger opens its file.
pub fn ensure_all_directories() -> Result<(), String> {
    let dirs_to_create = vec![
        ("base", get_base_directory()),
        ("data", get_data_directory()),
        ("sessions", get_sessions_directory()),
        ("logs", get_logs_directory()),
    ];

    for (name, dir) in dirs_to_create {
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                format!(
                    "Failed to create {} directory at {}: {}",
                    name,
                    dir.display(),
                    e
                )
            })?;
        }
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
