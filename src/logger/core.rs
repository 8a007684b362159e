/// Core logging implementation: filtering, formatting, console + file output
use super::config::{get_logger_config, is_debug_enabled_for_tag};
use super::levels::LogLevel;
use super::tags::LogTag;
use crate::paths;
use chrono::Local;
use colored::*;
use once_cell::sync::Lazy;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

/// Column width for the tag field
const TAG_WIDTH: usize = 10;

static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

/// Open the daily log file; missing directories degrade to console-only
pub fn init_file_logging() {
    let path = paths::get_logs_directory().join(format!(
        "subfleet_{}.log",
        Local::now().format("%Y-%m-%d")
    ));

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            if let Ok(mut guard) = LOG_FILE.lock() {
                *guard = Some(file);
            }
        }
        Err(e) => {
            eprintln!("Log file unavailable at {}: {}", path.display(), e);
        }
    }
}

/// Filtering rules:
/// 1. Errors always log
/// 2. Everything above the minimum level threshold is dropped
/// 3. Debug requires --debug-<module> for that tag
fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    let config = get_logger_config();

    if level == LogLevel::Error {
        return true;
    }

    if level > config.min_level {
        return false;
    }

    if level == LogLevel::Debug && config.min_level != LogLevel::Verbose {
        return is_debug_enabled_for_tag(tag);
    }

    true
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    let now = Local::now();
    let time = now.format("%H:%M:%S").to_string();
    let tag_field = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);

    let tag_colored = match tag {
        LogTag::System => tag_field.bright_yellow().bold(),
        LogTag::Telegram => tag_field.bright_cyan().bold(),
        LogTag::Supervisor => tag_field.bright_green().bold(),
        LogTag::Auth => tag_field.bright_magenta().bold(),
        LogTag::Accounts => tag_field.bright_blue().bold(),
        LogTag::Jobs => tag_field.cyan().bold(),
        LogTag::Database => tag_field.blue().bold(),
        LogTag::Config => tag_field.yellow().bold(),
    };

    let level_colored = match level {
        LogLevel::Error => level.as_str().bright_red().bold(),
        LogLevel::Warning => level.as_str().yellow(),
        LogLevel::Info => level.as_str().normal(),
        LogLevel::Debug => level.as_str().dimmed(),
        LogLevel::Verbose => level.as_str().dimmed(),
    };

    println!(
        "{} [{}] [{}] {}",
        time.dimmed(),
        tag_colored,
        level_colored,
        message
    );

    write_to_file(&format!(
        "{} [{}] [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S"),
        tag.to_plain_string(),
        level.as_str(),
        message
    ));
}

fn write_to_file(line: &str) {
    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(file, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::config::{set_logger_config, LoggerConfig};
    use std::collections::HashSet;

    // Single test: logger config is process-global and tests run in parallel.
    #[test]
    fn filtering_rules() {
        set_logger_config(LoggerConfig {
            min_level: LogLevel::Error,
            debug_tags: HashSet::new(),
        });
        assert!(should_log(&LogTag::System, LogLevel::Error));
        assert!(!should_log(&LogTag::System, LogLevel::Info));

        let mut tags = HashSet::new();
        tags.insert("auth".to_string());
        set_logger_config(LoggerConfig {
            min_level: LogLevel::Debug,
            debug_tags: tags,
        });
        assert!(should_log(&LogTag::Auth, LogLevel::Debug));
        assert!(!should_log(&LogTag::Telegram, LogLevel::Debug));

        set_logger_config(LoggerConfig::default());
    }
}
