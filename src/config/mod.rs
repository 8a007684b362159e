//! Configuration system for Subfleet
//!
//! TOML configuration loaded once at startup into a global, with thread-safe
//! access helpers. Missing file falls back to defaults so the bot can start
//! and report what is unconfigured.

mod schemas;
mod utils;

pub use schemas::{AccountsConfig, Config, DatabaseConfig, JobsConfig, TelegramConfig};
pub use utils::{load_config, load_config_from_path, set_config_for_tests, with_config};
