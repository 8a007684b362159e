//! Configuration schema definitions
//!
//! Every section gets serde defaults so a partial config.toml is valid.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Bot transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token; empty disables the bot
    #[serde(default)]
    pub bot_token: String,
    /// Telegram user ids allowed to use the console
    #[serde(default)]
    pub admin_ids: Vec<i64>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            admin_ids: Vec::new(),
        }
    }
}

/// Worker-process and auth-handshake settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Directory holding <phone>.session and <phone>.pid files.
    /// Empty means the platform default sessions directory.
    #[serde(default)]
    pub sessions_dir: String,
    /// External worker launcher invoked as:
    /// launcher <session_path> <api_id> <api_hash> <phone>
    #[serde(default)]
    pub launcher_path: String,
    /// External protocol-client helper used for the auth handshake
    #[serde(default)]
    pub helper_path: String,
    /// How long to wait for the pid marker after launching a worker
    #[serde(default = "default_pid_wait_ms")]
    pub pid_wait_ms: u64,
    /// Hard timeout for each helper invocation
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,
}

fn default_pid_wait_ms() -> u64 {
    1000
}

fn default_auth_timeout_secs() -> u64 {
    30
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            sessions_dir: String::new(),
            launcher_path: String::new(),
            helper_path: String::new(),
            pid_wait_ms: default_pid_wait_ms(),
            auth_timeout_secs: default_auth_timeout_secs(),
        }
    }
}

/// Job-answer forwarder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Poll interval for answered jobs, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    60
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path override; empty means the platform default
    #[serde(default)]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            admin_ids = [42]
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.admin_ids, vec![42]);
        assert_eq!(config.accounts.pid_wait_ms, 1000);
        assert_eq!(config.accounts.auth_timeout_secs, 30);
        assert_eq!(config.jobs.poll_interval_secs, 60);
        assert!(config.database.path.is_empty());
    }

    #[test]
    fn empty_toml_is_valid() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.telegram.bot_token.is_empty());
        assert!(config.accounts.launcher_path.is_empty());
    }
}
