//! Structured logging for Subfleet
//!
//! Level + tag based logging with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via --debug-<module> flags
//! - Dual output: colored console + file persistence
//!
//! ## Usage
//!
//! ```rust,ignore
//! use subfleet::logger::{self, LogTag};
//!
//! logger::info(LogTag::Supervisor, "Worker started");
//! logger::warning(LogTag::Auth, "Rate limited, 30s wait");
//! logger::debug(LogTag::Telegram, "Raw update: ..."); // only with --debug-telegram
//! ```
//!
//! Call `logger::init()` once at startup, after `paths::ensure_all_directories()`.

mod config;
mod core;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Parses command-line debug flags and opens the log file.
pub fn init() {
    config::init_from_args();
    core::init_file_logging();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless --quiet)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level, gated by the matching --debug-<module> flag
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level, gated by --verbose
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
