//! Telegram bot construction and message sending

use crate::config::with_config;
use crate::logger::{self, LogTag};
use teloxide::prelude::*;
use teloxide::types::ParseMode;

/// Build a bot from the configured token, validating it with getMe
pub async fn init_bot() -> Result<Bot, String> {
    let token = with_config(|c| c.telegram.bot_token.clone());
    if token.is_empty() {
        return Err("Bot token is not configured".to_string());
    }

    let bot = Bot::new(&token);
    match bot.get_me().await {
        Ok(me) => {
            logger::info(
                LogTag::Telegram,
                &format!(
                    "Bot initialized: @{} (ID: {})",
                    me.username.as_deref().unwrap_or("unknown"),
                    me.id
                ),
            );
            Ok(bot)
        }
        Err(e) => {
            logger::error(
                LogTag::Telegram,
                &format!("Failed to validate bot token: {}", e),
            );
            Err(format!("Invalid bot token: {}", e))
        }
    }
}

/// Send an HTML message to a chat using a fresh bot from config
///
/// Used by services that run without a bot handle of their own.
pub async fn send_message(chat_id: i64, message: &str) -> Result<(), String> {
    let token = with_config(|c| c.telegram.bot_token.clone());
    if token.is_empty() {
        return Err("Bot not configured".to_string());
    }

    let bot = Bot::new(&token);
    bot.send_message(ChatId(chat_id), message)
        .parse_mode(ParseMode::Html)
        .await
        .map_err(|e| format!("Failed to send message: {}", e))?;

    Ok(())
}

/// Escape user-provided text for HTML parse mode
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(html_escape("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(html_escape("plain"), "plain");
    }
}
