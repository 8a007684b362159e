//! Update routing with admin authentication
//!
//! Every update passes the admin allow-list check before any handler runs;
//! non-admin traffic is logged at debug and silently dropped.

pub mod callbacks;
pub mod commands;
pub mod messages;

pub use callbacks::handle_callback_query;

use crate::config::with_config;
use crate::logger::{self, LogTag};
use crate::telegram::polling::BotContext;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, ParseMode};

/// Whether this Telegram user may operate the console
pub fn is_admin(user_id: i64) -> bool {
    with_config(|c| c.telegram.admin_ids.contains(&user_id))
}

/// Route an incoming message to the command or dialogue handler
pub async fn handle_message(
    bot: &Bot,
    context: &Arc<BotContext>,
    message: teloxide::types::Message,
) -> Result<(), String> {
    let Some(from) = &message.from else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;
    let chat_id = message.chat.id;

    if !is_admin(user_id) {
        logger::debug(
            LogTag::Telegram,
            &format!("Ignoring message from non-admin user {}", user_id),
        );
        return Ok(());
    }

    let Some(text) = message.text() else {
        return Ok(());
    };

    if text.starts_with('/') {
        commands::handle_command(bot, context, chat_id, user_id, text).await
    } else {
        messages::handle_text(bot, context, chat_id, user_id, text).await
    }
}

/// Send an HTML message
pub(super) async fn send(bot: &Bot, chat_id: ChatId, text: &str) -> Result<(), String> {
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await
        .map_err(|e| format!("Failed to send message: {}", e))?;
    Ok(())
}

/// Send an HTML message with an inline keyboard
pub(super) async fn send_with_keyboard(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    keyboard: InlineKeyboardMarkup,
) -> Result<(), String> {
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await
        .map_err(|e| format!("Failed to send message: {}", e))?;
    Ok(())
}
