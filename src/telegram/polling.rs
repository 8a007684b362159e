//! Update polling service
//!
//! Manual getUpdates long polling with an offset, driven as a `Service`.
//! Every update is answered inline; handler errors are logged and never
//! stop the loop.

use crate::accounts::AccountLifecycleService;
use crate::database::Database;
use crate::logger::{self, LogTag};
use crate::services::{Service, ServiceHealth};
use crate::telegram::dialogue::DialogueStore;
use crate::telegram::{bot, handlers};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Shared state every handler gets a reference to
pub struct BotContext {
    pub db: Database,
    pub lifecycle: AccountLifecycleService,
    pub dialogues: DialogueStore,
}

impl BotContext {
    pub fn new(db: Database, lifecycle: AccountLifecycleService) -> Self {
        Self {
            db,
            lifecycle,
            dialogues: DialogueStore::new(),
        }
    }
}

/// Service that owns the update polling loop
pub struct TelegramService {
    context: Arc<BotContext>,
    bot: Option<Bot>,
    running: Arc<AtomicBool>,
}

impl TelegramService {
    pub fn new(context: Arc<BotContext>) -> Self {
        Self {
            context,
            bot: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Service for TelegramService {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn priority(&self) -> i32 {
        10
    }

    async fn initialize(&mut self) -> Result<(), String> {
        self.bot = Some(bot::init_bot().await?);
        Ok(())
    }

    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
        let bot = self.bot.clone().ok_or("Bot not initialized")?;
        let context = self.context.clone();
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        let handle = tokio::spawn(async move {
            logger::info(LogTag::Telegram, "Update polling started");
            let offset = AtomicI64::new(0);

            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        logger::info(LogTag::Telegram, "Update polling received shutdown signal");
                        break;
                    }
                    _ = poll_once(&bot, &offset, &context) => {}
                }
            }

            running.store(false, Ordering::SeqCst);
            logger::info(LogTag::Telegram, "Update polling stopped");
        });

        Ok(vec![handle])
    }

    async fn health(&self) -> ServiceHealth {
        if self.bot.is_none() {
            ServiceHealth::Unhealthy("bot not initialized".to_string())
        } else if self.running.load(Ordering::SeqCst) {
            ServiceHealth::Healthy
        } else {
            ServiceHealth::Degraded("polling loop not running".to_string())
        }
    }
}

/// One getUpdates round; errors pause briefly and the caller retries
async fn poll_once(bot: &Bot, offset: &AtomicI64, context: &Arc<BotContext>) {
    let current_offset = offset.load(Ordering::SeqCst);
    let mut request = bot.get_updates().timeout(10);
    if current_offset > 0 {
        request = request.offset(current_offset as i32);
    }

    match request.await {
        Ok(updates) => {
            for update in updates {
                offset.store(update.id.0 as i64 + 1, Ordering::SeqCst);

                let result = match update.kind {
                    teloxide::types::UpdateKind::Message(message) => {
                        handlers::handle_message(bot, context, message).await
                    }
                    teloxide::types::UpdateKind::CallbackQuery(query) => {
                        handlers::handle_callback_query(bot, context, query).await
                    }
                    _ => Ok(()),
                };

                if let Err(e) = result {
                    logger::warning(LogTag::Telegram, &format!("Update handler error: {}", e));
                }
            }
        }
        Err(e) => {
            logger::debug(
                LogTag::Telegram,
                &format!("Update poll error (will retry): {}", e),
            );
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        }
    }
}
