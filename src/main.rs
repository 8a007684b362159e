use std::path::PathBuf;
use std::sync::Arc;
use subfleet::{
    accounts::AccountLifecycleService,
    arguments::{get_enabled_debug_modes, is_any_debug_enabled, patterns, print_help},
    config::{load_config, with_config},
    database::Database,
    jobs::JobAnswerService,
    logger::{self, LogTag},
    paths,
    services::ServiceManager,
    telegram::{BotContext, TelegramService},
    version,
};

/// Main entry point for Subfleet
///
/// Startup order matters: directories before the logger (it opens a log
/// file), config before anything that reads it, database before the
/// services that hold it.
#[tokio::main]
async fn main() {
    if let Err(e) = paths::ensure_all_directories() {
        eprintln!("Failed to create required directories: {}", e);
        std::process::exit(1);
    }

    logger::init();

    if patterns::is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    if patterns::is_version_requested() {
        println!("{}", version::version_line());
        std::process::exit(0);
    }

    logger::info(
        LogTag::System,
        &format!("🚀 {} starting up...", version::version_line()),
    );

    if is_any_debug_enabled() {
        logger::info(
            LogTag::System,
            &format!("Debug modes enabled: {}", get_enabled_debug_modes().join(", ")),
        );
    }

    if let Err(e) = load_config() {
        logger::error(LogTag::Config, &format!("Failed to load config: {}", e));
        std::process::exit(1);
    }

    if with_config(|c| c.telegram.bot_token.is_empty()) {
        logger::error(
            LogTag::Config,
            "No bot token configured. Set telegram.bot_token in config.toml.",
        );
        std::process::exit(1);
    }
    if with_config(|c| c.telegram.admin_ids.is_empty()) {
        logger::warning(
            LogTag::Config,
            "No admin ids configured; the bot will ignore everyone.",
        );
    }

    let db_path = {
        let configured = with_config(|c| c.database.path.clone());
        if configured.is_empty() {
            paths::get_database_path()
        } else {
            PathBuf::from(configured)
        }
    };
    let db = match Database::open(&db_path) {
        Ok(db) => {
            logger::info(
                LogTag::Database,
                &format!("Database ready at {}", db_path.display()),
            );
            db
        }
        Err(e) => {
            logger::error(LogTag::Database, &format!("Failed to open database: {}", e));
            std::process::exit(1);
        }
    };

    let context = Arc::new(BotContext::new(
        db.clone(),
        AccountLifecycleService::from_config(),
    ));

    let mut manager = ServiceManager::new();
    manager.register(Box::new(TelegramService::new(context)));
    manager.register(Box::new(JobAnswerService::new(db)));

    if let Err(e) = manager.start_all().await {
        logger::error(LogTag::System, &format!("Startup failed: {}", e));
        std::process::exit(1);
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => logger::info(LogTag::System, "Shutdown signal received"),
        Err(e) => logger::error(LogTag::System, &format!("Signal handler error: {}", e)),
    }

    manager.stop_all().await;
    logger::info(LogTag::System, "Goodbye");
}
