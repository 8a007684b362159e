/// Centralized argument handling for Subfleet
///
/// Consolidates command-line argument parsing and debug flag checking.
/// Arguments are captured once into a thread-safe singleton so binaries and
/// tests can override them with `set_cmd_args`.
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

/// Config file path override (`--config <path>`)
pub fn get_config_path_override() -> Option<String> {
    get_arg_value("--config")
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

/// Supervisor (worker process) debug mode
pub fn is_debug_supervisor_enabled() -> bool {
    has_arg("--debug-supervisor")
}

/// Auth handshake debug mode
pub fn is_debug_auth_enabled() -> bool {
    has_arg("--debug-auth")
}

/// Account lifecycle debug mode
pub fn is_debug_accounts_enabled() -> bool {
    has_arg("--debug-accounts")
}

/// Telegram transport debug mode
pub fn is_debug_telegram_enabled() -> bool {
    has_arg("--debug-telegram")
}

/// Job forwarder debug mode
pub fn is_debug_jobs_enabled() -> bool {
    has_arg("--debug-jobs")
}

/// Database debug mode
pub fn is_debug_database_enabled() -> bool {
    has_arg("--debug-database")
}

/// Verbose tracing for everything
pub fn is_verbose_enabled() -> bool {
    has_arg("--verbose")
}

/// Suppress warnings and info, errors only
pub fn is_quiet_enabled() -> bool {
    has_arg("--quiet")
}

/// Returns true if any module debug flag is set
pub fn is_any_debug_enabled() -> bool {
    is_debug_supervisor_enabled()
        || is_debug_auth_enabled()
        || is_debug_accounts_enabled()
        || is_debug_telegram_enabled()
        || is_debug_jobs_enabled()
        || is_debug_database_enabled()
}

/// Names of all enabled debug modes, for the startup banner
pub fn get_enabled_debug_modes() -> Vec<&'static str> {
    let mut modes = Vec::new();
    if is_debug_supervisor_enabled() {
        modes.push("supervisor");
    }
    if is_debug_auth_enabled() {
        modes.push("auth");
    }
    if is_debug_accounts_enabled() {
        modes.push("accounts");
    }
    if is_debug_telegram_enabled() {
        modes.push("telegram");
    }
    if is_debug_jobs_enabled() {
        modes.push("jobs");
    }
    if is_debug_database_enabled() {
        modes.push("database");
    }
    modes
}

// =============================================================================
// HELP / SPECIAL MODES
// =============================================================================

pub mod patterns {
    use super::has_arg;

    pub fn is_help_requested() -> bool {
        has_arg("--help") || has_arg("-h")
    }

    pub fn is_version_requested() -> bool {
        has_arg("--version") || has_arg("-V")
    }
}

/// Print usage information
pub fn print_help() {
    println!("Subfleet - Telegram console for managing sub-account workers");
    println!();
    println!("USAGE:");
    println!("    subfleet [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --config <path>        Use a specific config.toml");
    println!("    --verbose              Show verbose trace output");
    println!("    --quiet                Errors only");
    println!("    --debug-supervisor     Worker process supervision details");
    println!("    --debug-auth           Auth handshake details");
    println!("    --debug-accounts       Account lifecycle details");
    println!("    --debug-telegram       Telegram polling/update details");
    println!("    --debug-jobs           Job forwarder details");
    println!("    --debug-database       SQL-layer details");
    println!("    -h, --help             Print this help");
    println!("    -V, --version          Print version");
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: CMD_ARGS is process-global and tests run in parallel.
    #[test]
    fn arg_parsing_round_trip() {
        set_cmd_args(vec![
            "subfleet".to_string(),
            "--config".to_string(),
            "/tmp/c.toml".to_string(),
            "--debug-auth".to_string(),
        ]);
        assert_eq!(get_arg_value("--config").as_deref(), Some("/tmp/c.toml"));
        assert_eq!(get_arg_value("--missing"), None);
        assert!(is_debug_auth_enabled());
        assert!(get_enabled_debug_modes().contains(&"auth"));
        set_cmd_args(vec!["subfleet".to_string()]);
    }
}
