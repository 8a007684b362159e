//! Callback query handlers for inline keyboard buttons

use super::commands::{
    send_account_view, send_accounts_list, send_folders_list, send_main_menu,
    send_recipient_history, send_recipients_view, send_texts_view,
};
use super::{is_admin, send, send_with_keyboard};
use crate::accounts::ConnectOutcome;
use crate::logger::{self, LogTag};
use crate::telegram::dialogue::DialogueState;
use crate::telegram::keyboards;
use crate::telegram::polling::BotContext;
use std::sync::Arc;
use teloxide::prelude::*;

/// Handle callback query from inline keyboard button
pub async fn handle_callback_query(
    bot: &Bot,
    context: &Arc<BotContext>,
    query: teloxide::types::CallbackQuery,
) -> Result<(), String> {
    // Always answer callback query first to remove loading indicator
    bot.answer_callback_query(query.id.clone())
        .await
        .map_err(|e| format!("Failed to answer callback: {}", e))?;

    let user_id = query.from.id.0 as i64;
    if !is_admin(user_id) {
        logger::debug(
            LogTag::Telegram,
            &format!("Ignoring callback from non-admin user {}", user_id),
        );
        return Ok(());
    }

    let Some(message) = query.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;

    let data = query.data.as_deref().unwrap_or("");
    let parts: Vec<&str> = data.split(':').collect();

    match parts.as_slice() {
        // Menu navigation
        ["menu", "main"] => send_main_menu(bot, chat_id).await,
        ["menu", "accounts"] => send_accounts_list(bot, context, chat_id, user_id).await,
        ["menu", "folders"] => send_folders_list(bot, context, chat_id, user_id).await,

        // Creation dialogues
        ["addacc"] => {
            context
                .dialogues
                .set(chat_id.0, DialogueState::AddAccountName)
                .await;
            send(bot, chat_id, "Adding an account. Send a display name for it.").await
        }
        ["addfolder"] => {
            context
                .dialogues
                .set(chat_id.0, DialogueState::AwaitFolderName)
                .await;
            send(bot, chat_id, "Send a name for the new folder.").await
        }

        // Account views and actions
        ["acc", id] => match id.parse::<i64>() {
            Ok(account_id) => send_account_view(bot, context, chat_id, account_id).await,
            Err(_) => Ok(()),
        },
        ["acc", id, rest @ ..] => match id.parse::<i64>() {
            Ok(account_id) => {
                handle_account_action(bot, context, chat_id, user_id, account_id, rest).await
            }
            Err(_) => Ok(()),
        },

        // Folders
        ["folder", id] => match id.parse::<i64>() {
            Ok(folder_id) => send_folder_view(bot, context, chat_id, user_id, folder_id).await,
            Err(_) => Ok(()),
        },
        ["folder", id, "rename"] => match id.parse::<i64>() {
            Ok(folder_id) => {
                context
                    .dialogues
                    .set(chat_id.0, DialogueState::AwaitFolderRename { folder_id })
                    .await;
                send(bot, chat_id, "Send the new folder name.").await
            }
            Err(_) => Ok(()),
        },
        ["folder", id, "delete"] => {
            if let Ok(folder_id) = id.parse::<i64>() {
                context
                    .db
                    .delete_folder(folder_id)
                    .map_err(|e| format!("Failed to delete folder: {}", e))?;
            }
            send_folders_list(bot, context, chat_id, user_id).await
        }

        // Deletion confirmation
        ["confirm", "delete", id] => match id.parse::<i64>() {
            Ok(account_id) => {
                send_with_keyboard(
                    bot,
                    chat_id,
                    "Delete this account? The worker is stopped and the session \
                     artifact is removed. This cannot be undone.",
                    keyboards::confirm_delete(account_id),
                )
                .await
            }
            Err(_) => Ok(()),
        },
        ["exec", "delete", id] => match id.parse::<i64>() {
            Ok(account_id) => {
                execute_delete(bot, context, chat_id, user_id, account_id).await
            }
            Err(_) => Ok(()),
        },

        _ => {
            logger::debug(LogTag::Telegram, &format!("Unhandled callback: {}", data));
            Ok(())
        }
    }
}

/// Per-account actions, `acc:<id>:<action>[:<arg>]`
async fn handle_account_action(
    bot: &Bot,
    context: &Arc<BotContext>,
    chat_id: ChatId,
    user_id: i64,
    account_id: i64,
    action: &[&str],
) -> Result<(), String> {
    let Some(account) = context
        .db
        .get_account(account_id)
        .map_err(|e| format!("Failed to load account: {}", e))?
    else {
        return send(bot, chat_id, "That account no longer exists.").await;
    };

    match action {
        ["connect"] => connect_account(bot, context, chat_id, account_id).await,
        ["disconnect"] => {
            context.lifecycle.disconnect(&account.identity()).await;
            context
                .db
                .set_account_connected(account_id, false)
                .map_err(|e| format!("Failed to update account: {}", e))?;
            send_account_view(bot, context, chat_id, account_id).await
        }
        ["start"] => {
            context
                .db
                .set_account_started(account_id, true)
                .map_err(|e| format!("Failed to update account: {}", e))?;
            send_account_view(bot, context, chat_id, account_id).await
        }
        ["stop"] => {
            context
                .db
                .set_account_started(account_id, false)
                .map_err(|e| format!("Failed to update account: {}", e))?;
            send_account_view(bot, context, chat_id, account_id).await
        }
        ["texts"] => send_texts_view(bot, context, chat_id, account_id).await,
        ["addtext"] => {
            context
                .dialogues
                .set(chat_id.0, DialogueState::AwaitText { account_id })
                .await;
            send(
                bot,
                chat_id,
                "Send the text as <code>category | body</code>.",
            )
            .await
        }
        ["recipients"] => send_recipients_view(bot, context, chat_id, account_id).await,
        ["history"] => send_recipient_history(bot, context, chat_id, account_id, 1).await,
        ["history", page] => {
            let page = page.parse::<i64>().unwrap_or(1);
            send_recipient_history(bot, context, chat_id, account_id, page).await
        }
        ["job"] => {
            context
                .db
                .create_job(account_id, crate::jobs::GET_NAMES_JOB)
                .map_err(|e| format!("Failed to queue job: {}", e))?;
            logger::info(
                LogTag::Jobs,
                &format!("Queued {} for account {}", crate::jobs::GET_NAMES_JOB, account_id),
            );
            send(
                bot,
                chat_id,
                "🧾 Job queued. The answer arrives here once the worker finishes.",
            )
            .await?;
            send_account_view(bot, context, chat_id, account_id).await
        }
        ["addrcp"] => {
            context
                .dialogues
                .set(chat_id.0, DialogueState::AwaitRecipients { account_id })
                .await;
            send(
                bot,
                chat_id,
                "Paste the recipient list, one <code>item name - @username</code> per line.",
            )
            .await
        }
        ["clearrcp"] => {
            let removed = context
                .db
                .clear_recipients(account_id)
                .map_err(|e| format!("Failed to clear recipients: {}", e))?;
            send(bot, chat_id, &format!("Removed {} recipients.", removed)).await?;
            send_recipients_view(bot, context, chat_id, account_id).await
        }
        ["batch"] => {
            context
                .dialogues
                .set(chat_id.0, DialogueState::AwaitBatchSize { account_id })
                .await;
            send(bot, chat_id, "Send the new batch size (1-100).").await
        }
        ["folder"] => {
            let folders = context
                .db
                .list_folders(user_id)
                .map_err(|e| format!("Failed to load folders: {}", e))?;
            send_with_keyboard(
                bot,
                chat_id,
                "Pick a folder for this account.",
                keyboards::folder_picker(account_id, &folders),
            )
            .await
        }
        ["folder", "none"] => {
            context
                .db
                .set_account_folder(account_id, None)
                .map_err(|e| format!("Failed to update account: {}", e))?;
            send_account_view(bot, context, chat_id, account_id).await
        }
        ["folder", folder_id] => {
            if let Ok(folder_id) = folder_id.parse::<i64>() {
                context
                    .db
                    .set_account_folder(account_id, Some(folder_id))
                    .map_err(|e| format!("Failed to update account: {}", e))?;
            }
            send_account_view(bot, context, chat_id, account_id).await
        }
        _ => Ok(()),
    }
}

/// Run the connect flow for an account and report the outcome
///
/// Shared with the dialogue handler, which re-runs it after a successful
/// auth handshake to bring the worker up.
pub(super) async fn connect_account(
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

    match context.lifecycle.connect(&account.identity()).await {
        ConnectOutcome::Connected { pid } => {
            context
                .db
                .set_account_connected(account_id, true)
                .map_err(|e| format!("Failed to update account: {}", e))?;
            send(
                bot,
                chat_id,
                &format!("🟢 Connected. Worker running (pid {}).", pid),
            )
            .await?;
            send_account_view(bot, context, chat_id, account_id).await
        }
        ConnectOutcome::CodeNeeded { handshake } => {
            context
                .dialogues
                .set(
                    chat_id.0,
                    DialogueState::AwaitCode {
                        account_id,
                        handshake,
                    },
                )
                .await;
            send(
                bot,
                chat_id,
                "📨 A verification code was sent to the account. Send it here.",
            )
            .await
        }
        ConnectOutcome::WorkerUnavailable => {
            send_with_keyboard(
                bot,
                chat_id,
                "⚠️ The session is authorized but the worker did not start. \
                 Check the launcher configuration.",
                keyboards::back_to_account(account_id),
            )
            .await
        }
        ConnectOutcome::Failed(failure) => {
            send_with_keyboard(
                bot,
                chat_id,
                &failure.user_message(),
                keyboards::back_to_account(account_id),
            )
            .await
        }
    }
}

async fn execute_delete(
    bot: &Bot,
    context: &Arc<BotContext>,
    chat_id: ChatId,
    user_id: i64,
    account_id: i64,
) -> Result<(), String> {
    let Some(account) = context
        .db
        .get_account(account_id)
        .map_err(|e| format!("Failed to load account: {}", e))?
    else {
        return send(bot, chat_id, "That account no longer exists.").await;
    };

    context.lifecycle.delete(&account.identity()).await;
    context
        .db
        .delete_account(account_id)
        .map_err(|e| format!("Failed to delete account: {}", e))?;

    logger::info(
        LogTag::Accounts,
        &format!("Account {} ({}) deleted", account.name, account.phone),
    );
    send(bot, chat_id, "🗑 Account deleted.").await?;
    send_accounts_list(bot, context, chat_id, user_id).await
}

async fn send_folder_view(
    bot: &Bot,
    context: &Arc<BotContext>,
    chat_id: ChatId,
    user_id: i64,
    folder_id: i64,
) -> Result<(), String> {
    let Some(folder) = context
        .db
        .get_folder(folder_id)
        .map_err(|e| format!("Failed to load folder: {}", e))?
    else {
        return send_folders_list(bot, context, chat_id, user_id).await;
    };

    let accounts = context
        .db
        .list_accounts(user_id, Some(folder_id))
        .map_err(|e| format!("Failed to load accounts: {}", e))?;
    let with_state: Vec<_> = accounts
        .into_iter()
        .map(|account| {
            let running = context.lifecycle.is_running(&account.identity());
            (account, running)
        })
        .collect();

    let text = format!(
        "📁 <b>{}</b> ({} accounts)",
        crate::telegram::bot::html_escape(&folder.name),
        with_state.len()
    );
    send_with_keyboard(bot, chat_id, &text, keyboards::accounts_list(&with_state)).await
}
