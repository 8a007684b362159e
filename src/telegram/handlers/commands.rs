//! Slash command handlers and shared view senders
//!
//! Views live here because commands and callbacks render the same screens.

use super::{send, send_with_keyboard};
use crate::database::Recipient;
use crate::telegram::bot::html_escape;
use crate::telegram::dialogue::DialogueState;
use crate::telegram::keyboards;
use crate::telegram::polling::BotContext;
use std::sync::Arc;
use teloxide::prelude::*;

pub async fn handle_command(
    bot: &Bot,
    context: &Arc<BotContext>,
    chat_id: ChatId,
    user_id: i64,
    text: &str,
) -> Result<(), String> {
    let command = text.split_whitespace().next().unwrap_or("");

    match command {
        "/start" | "/help" => send_main_menu(bot, chat_id).await,
        "/accounts" => send_accounts_list(bot, context, chat_id, user_id).await,
        "/folders" => send_folders_list(bot, context, chat_id, user_id).await,
        "/add" => {
            context
                .dialogues
                .set(chat_id.0, DialogueState::AddAccountName)
                .await;
            send(bot, chat_id, "Adding an account. Send a display name for it.").await
        }
        "/cancel" => {
            let cancelled = context.dialogues.clear(chat_id.0).await;
            let msg = if cancelled {
                "Cancelled."
            } else {
                "Nothing to cancel."
            };
            send(bot, chat_id, msg).await
        }
        _ => send(bot, chat_id, "Unknown command. Try /start.").await,
    }
}

// === SHARED VIEWS ===

pub async fn send_main_menu(bot: &Bot, chat_id: ChatId) -> Result<(), String> {
    let text = "🤖 <b>Subfleet</b>\n\n\
                Manage your messaging sub-accounts: connect sessions, file\n\
                them into folders, load texts and recipients.";
    send_with_keyboard(bot, chat_id, text, keyboards::main_menu()).await
}

pub async fn send_accounts_list(
    bot: &Bot,
    context: &Arc<BotContext>,
    chat_id: ChatId,
    user_id: i64,
) -> Result<(), String> {
    let accounts = context
        .db
        .list_accounts(user_id, None)
        .map_err(|e| format!("Failed to load accounts: {}", e))?;

    if accounts.is_empty() {
        return send_with_keyboard(
            bot,
            chat_id,
            "No accounts yet. Add one to get started.",
            keyboards::main_menu(),
        )
        .await;
    }

    let with_state: Vec<_> = accounts
        .into_iter()
        .map(|account| {
            let running = context.lifecycle.is_running(&account.identity());
            (account, running)
        })
        .collect();

    let text = format!("👥 <b>Accounts</b> ({})", with_state.len());
    send_with_keyboard(bot, chat_id, &text, keyboards::accounts_list(&with_state)).await
}

pub async fn send_account_view(
    bot: &Bot,
    context: &Arc<BotContext>,
    chat_id: ChatId,
    account_id: i64,
) -> Result<(), String> {
    let Some(account) = context
        .db
        .get_account(account_id)
        .map_err(|e| format!("Failed to load account: {}", e))?
    else {
        return send(bot, chat_id, "That account no longer exists.").await;
    };

    let running = context.lifecycle.is_running(&account.identity());
    let (total, sent) = context
        .db
        .count_recipients(account_id)
        .map_err(|e| format!("Failed to count recipients: {}", e))?;

    let folder = match account.folder_id {
        Some(folder_id) => context
            .db
            .get_folder(folder_id)
            .map_err(|e| format!("Failed to load folder: {}", e))?
            .map(|f| f.name)
            .unwrap_or_else(|| "—".to_string()),
        None => "—".to_string(),
    };

    let text = format!(
        "👤 <b>{}</b>\n\
         Phone: <code>{}</code>\n\
         Session: {}\n\
         Sending: {}\n\
         Folder: {}\n\
         Recipients: {} ({} sent)",
        html_escape(&account.name),
        account.phone,
        if running { "🟢 live" } else { "⚪ stopped" },
        if account.is_started { "▶️ on" } else { "⏸️ off" },
        html_escape(&folder),
        total,
        sent,
    );
    send_with_keyboard(
        bot,
        chat_id,
        &text,
        keyboards::account_actions(&account, running),
    )
    .await
}

pub async fn send_folders_list(
    bot: &Bot,
    context: &Arc<BotContext>,
    chat_id: ChatId,
    user_id: i64,
) -> Result<(), String> {
    let folders = context
        .db
        .list_folders(user_id)
        .map_err(|e| format!("Failed to load folders: {}", e))?;

    let text = if folders.is_empty() {
        "📁 <b>Folders</b>\n\nNo folders yet.".to_string()
    } else {
        format!("📁 <b>Folders</b> ({})", folders.len())
    };
    send_with_keyboard(bot, chat_id, &text, keyboards::folders_list(&folders)).await
}

pub async fn send_texts_view(
    bot: &Bot,
    context: &Arc<BotContext>,
    chat_id: ChatId,
    account_id: i64,
) -> Result<(), String> {
    let texts = context
        .db
        .list_texts(account_id, None)
        .map_err(|e| format!("Failed to load texts: {}", e))?;

    let mut body = String::from("💬 <b>Texts</b>\n");
    if texts.is_empty() {
        body.push_str("\nNo texts yet. Add one as <code>category | body</code>.");
    } else {
        for text in &texts {
            body.push_str(&format!(
                "\n<b>{}</b>: {}",
                html_escape(&text.category),
                html_escape(&text.body)
            ));
        }
    }
    send_with_keyboard(bot, chat_id, &body, keyboards::text_actions(account_id)).await
}

pub async fn send_recipients_view(
    bot: &Bot,
    context: &Arc<BotContext>,
    chat_id: ChatId,
    account_id: i64,
) -> Result<(), String> {
    let (total, sent) = context
        .db
        .count_recipients(account_id)
        .map_err(|e| format!("Failed to count recipients: {}", e))?;

    let text = format!(
        "📋 <b>Recipients</b>\n\nQueued: {}\nSent: {}\n\n\
         Add more as lines of <code>item name - @username</code>.",
        total - sent,
        sent
    );
    send_with_keyboard(bot, chat_id, &text, keyboards::recipient_actions(account_id)).await
}

const HISTORY_PAGE_SIZE: i64 = 10;
const MAX_MESSAGE_LENGTH: usize = 4096;

/// One page of the recipient history, newest entries first
pub async fn send_recipient_history(
    bot: &Bot,
    context: &Arc<BotContext>,
    chat_id: ChatId,
    account_id: i64,
    page: i64,
) -> Result<(), String> {
    let Some(account) = context
        .db
        .get_account(account_id)
        .map_err(|e| format!("Failed to load account: {}", e))?
    else {
        return send(bot, chat_id, "That account no longer exists.").await;
    };

    let (total, _) = context
        .db
        .count_recipients(account_id)
        .map_err(|e| format!("Failed to count recipients: {}", e))?;
    let total_pages = ((total + HISTORY_PAGE_SIZE - 1) / HISTORY_PAGE_SIZE).max(1);
    let page = page.clamp(1, total_pages);

    let entries = context
        .db
        .recipient_history_page(account_id, page, HISTORY_PAGE_SIZE)
        .map_err(|e| format!("Failed to load history: {}", e))?;

    let text = history_text(&account.name, &entries, page, total_pages, total);
    send_with_keyboard(
        bot,
        chat_id,
        &text,
        keyboards::recipient_history(account_id, page, total_pages),
    )
    .await
}

/// Numbered history page with a per-entry sent marker
fn history_text(
    account_name: &str,
    entries: &[Recipient],
    page: i64,
    total_pages: i64,
    total: i64,
) -> String {
    let mut lines = vec![
        format!("🕘 <b>History for {}</b>", html_escape(account_name)),
        format!("Total recipients: {}", total),
        format!("Page {}/{}", page, total_pages),
        String::new(),
    ];

    let start = 1 + (page - 1) * HISTORY_PAGE_SIZE;
    for (offset, entry) in entries.iter().enumerate() {
        let status = if entry.sent { "✅" } else { "⏳" };
        lines.push(format!(
            "{}. @{} ({}) {}",
            start + offset as i64,
            html_escape(&entry.username),
            html_escape(&entry.item_name),
            status,
        ));
    }
    if entries.is_empty() {
        lines.push("Nothing queued or sent yet.".to_string());
    }

    let mut text = lines.join("\n");
    if text.len() > MAX_MESSAGE_LENGTH {
        let mut cut = MAX_MESSAGE_LENGTH - 3;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    text
}
