/// Configuration loading and access helpers
///
/// The global CONFIG is the single source of truth for configuration values.
/// Access it with `with_config(|c| ...)`.
use super::schemas::Config;
use once_cell::sync::OnceCell;
use std::sync::RwLock;

pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Load configuration from the default path (or --config override)
///
/// Call once at startup. A missing file is not an error: defaults are used
/// and the bot reports unconfigured sections itself.
pub fn load_config() -> Result<(), String> {
    let path = crate::arguments::get_config_path_override()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(crate::paths::get_config_path);
    load_config_from_path(&path.to_string_lossy())
}

/// Load configuration from a specific TOML file path
pub fn load_config_from_path(path: &str) -> Result<(), String> {
    let config = if std::path::Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

        toml::from_str::<Config>(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?
    } else {
        eprintln!("Config file '{}' not found, using default values", path);
        Config::default()
    };

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(())
}

/// Run a closure against the current configuration
///
/// Uses defaults if the config was never initialized, so library code and
/// tests never panic on a missing global.
pub fn with_config<T>(f: impl FnOnce(&Config) -> T) -> T {
    match CONFIG.get() {
        Some(lock) => match lock.read() {
            Ok(config) => f(&config),
            Err(_) => f(&Config::default()),
        },
        None => f(&Config::default()),
    }
}

/// Install a configuration directly; replaces any loaded one on first call
pub fn set_config_for_tests(config: Config) {
    match CONFIG.get() {
        Some(lock) => {
            if let Ok(mut guard) = lock.write() {
                *guard = config;
            }
        }
        None => {
            let _ = CONFIG.set(RwLock::new(config));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_config_defaults_when_uninitialized() {
        // Never initializes the global here; defaults must come back.
        let wait = with_config(|c| c.accounts.pid_wait_ms);
        assert!(wait == 1000 || wait > 0);
    }
}
