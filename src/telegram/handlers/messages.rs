//! Dialogue text input handlers
//!
//! Consumes the chat's dialogue state and feeds plain-text replies into the
//! add-account flow, the auth handshake, and the content prompts.

use super::callbacks::connect_account;
use super::commands::{send_account_view, send_folders_list, send_recipients_view, send_texts_view};
use super::send;
use crate::accounts::auth::is_valid_phone;
use crate::accounts::SignInOutcome;
use crate::accounts::types::AuthFailure;
use crate::database::parse_recipients;
use crate::logger::{self, LogTag};
use crate::paths;
use crate::telegram::dialogue::DialogueState;
use crate::telegram::polling::BotContext;
use std::sync::Arc;
use teloxide::prelude::*;

pub async fn handle_text(
    bot: &Bot,
    context: &Arc<BotContext>,
    chat_id: ChatId,
    user_id: i64,
    text: &str,
) -> Result<(), String> {
    let Some(state) = context.dialogues.take(chat_id.0).await else {
        return send(bot, chat_id, "Use /start to open the menu.").await;
    };
    let text = text.trim();

    match state {
        // === ADD ACCOUNT ===
        DialogueState::AddAccountName => {
            if text.is_empty() {
                context
                    .dialogues
                    .set(chat_id.0, DialogueState::AddAccountName)
                    .await;
                return send(bot, chat_id, "The name cannot be empty. Send a name.").await;
            }
            context
                .dialogues
                .set(
                    chat_id.0,
                    DialogueState::AddAccountPhone {
                        name: text.to_string(),
                    },
                )
                .await;
            send(
                bot,
                chat_id,
                "Send the phone number (digits, optional leading +).",
            )
            .await
        }
        DialogueState::AddAccountPhone { name } => {
            if !is_valid_phone(text) {
                context
                    .dialogues
                    .set(chat_id.0, DialogueState::AddAccountPhone { name })
                    .await;
                return send(
                    bot,
                    chat_id,
                    &AuthFailure::InvalidPhone.user_message(),
                )
                .await;
            }
            // Catch duplicates here, before the operator types in the API
            // credentials for nothing.
            let existing = context
                .db
                .get_account_by_phone(text)
                .map_err(|e| format!("Failed to check phone: {}", e))?;
            if existing.is_some() {
                context
                    .dialogues
                    .set(chat_id.0, DialogueState::AddAccountPhone { name })
                    .await;
                return send(
                    bot,
                    chat_id,
                    "That phone is already registered. Send a different one.",
                )
                .await;
            }
            context
                .dialogues
                .set(
                    chat_id.0,
                    DialogueState::AddAccountApiId {
                        name,
                        phone: text.to_string(),
                    },
                )
                .await;
            send(bot, chat_id, "Send the API ID (a positive number).").await
        }
        DialogueState::AddAccountApiId { name, phone } => match text.parse::<i64>() {
            Ok(api_id) if api_id > 0 => {
                context
                    .dialogues
                    .set(
                        chat_id.0,
                        DialogueState::AddAccountApiHash {
                            name,
                            phone,
                            api_id,
                        },
                    )
                    .await;
                send(bot, chat_id, "Send the API hash (32 characters).").await
            }
            _ => {
                context
                    .dialogues
                    .set(chat_id.0, DialogueState::AddAccountApiId { name, phone })
                    .await;
                send(bot, chat_id, &AuthFailure::InvalidApiId.user_message()).await
            }
        },
        DialogueState::AddAccountApiHash {
            name,
            phone,
            api_id,
        } => {
            if text.len() != 32 {
                context
                    .dialogues
                    .set(
                        chat_id.0,
                        DialogueState::AddAccountApiHash {
                            name,
                            phone,
                            api_id,
                        },
                    )
                    .await;
                return send(bot, chat_id, &AuthFailure::InvalidApiHash.user_message()).await;
            }

            let session_path = paths::default_session_path(&phone);
            match context.db.create_account(
                user_id,
                &name,
                &phone,
                api_id,
                text,
                &session_path.to_string_lossy(),
            ) {
                Ok(account_id) => {
                    logger::info(
                        LogTag::Accounts,
                        &format!("Account {} ({}) added", name, phone),
                    );
                    send(bot, chat_id, "✅ Account added. Press Connect to authorize it.")
                        .await?;
                    send_account_view(bot, context, chat_id, account_id).await
                }
                Err(e) => {
                    logger::warning(
                        LogTag::Accounts,
                        &format!("Failed to add account {}: {}", phone, e),
                    );
                    send(
                        bot,
                        chat_id,
                        "Could not add the account. Is that phone already registered?",
                    )
                    .await
                }
            }
        }

        // === AUTH HANDSHAKE ===
        DialogueState::AwaitCode {
            account_id,
            handshake,
        } => {
            let code = text.to_string();
            match context
                .lifecycle
                .continue_handshake(&handshake, &code, None)
                .await
            {
                SignInOutcome::Authorized => {
                    send(bot, chat_id, "✅ Authorized. Starting the worker...").await?;
                    connect_account(bot, context, chat_id, account_id).await
                }
                SignInOutcome::PasswordRequired => {
                    context
                        .dialogues
                        .set(
                            chat_id.0,
                            DialogueState::AwaitPassword {
                                account_id,
                                handshake,
                                code,
                            },
                        )
                        .await;
                    send(bot, chat_id, "🔐 Two-factor auth is on. Send the password.").await
                }
                SignInOutcome::Failed(AuthFailure::InvalidCode) => {
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
                    send(bot, chat_id, &AuthFailure::InvalidCode.user_message()).await
                }
                SignInOutcome::Failed(failure) => {
                    send(bot, chat_id, &failure.user_message()).await
                }
            }
        }
        DialogueState::AwaitPassword {
            account_id,
            handshake,
            code,
        } => {
            match context
                .lifecycle
                .continue_handshake(&handshake, &code, Some(text))
                .await
            {
                SignInOutcome::Authorized => {
                    send(bot, chat_id, "✅ Authorized. Starting the worker...").await?;
                    connect_account(bot, context, chat_id, account_id).await
                }
                SignInOutcome::PasswordRequired => {
                    context
                        .dialogues
                        .set(
                            chat_id.0,
                            DialogueState::AwaitPassword {
                                account_id,
                                handshake,
                                code,
                            },
                        )
                        .await;
                    send(bot, chat_id, "That password was not accepted. Try again.").await
                }
                SignInOutcome::Failed(failure) => {
                    send(bot, chat_id, &failure.user_message()).await
                }
            }
        }

        // === CONTENT PROMPTS ===
        DialogueState::AwaitFolderName => {
            if text.is_empty() {
                context
                    .dialogues
                    .set(chat_id.0, DialogueState::AwaitFolderName)
                    .await;
                return send(bot, chat_id, "The name cannot be empty. Send a name.").await;
            }
            context
                .db
                .create_folder(user_id, text)
                .map_err(|e| format!("Failed to create folder: {}", e))?;
            send_folders_list(bot, context, chat_id, user_id).await
        }
        DialogueState::AwaitFolderRename { folder_id } => {
            if text.is_empty() {
                context
                    .dialogues
                    .set(chat_id.0, DialogueState::AwaitFolderRename { folder_id })
                    .await;
                return send(bot, chat_id, "The name cannot be empty. Send a name.").await;
            }
            context
                .db
                .rename_folder(folder_id, text)
                .map_err(|e| format!("Failed to rename folder: {}", e))?;
            send_folders_list(bot, context, chat_id, user_id).await
        }
        DialogueState::AwaitText { account_id } => {
            let Some((category, body)) = text.split_once('|') else {
                context
                    .dialogues
                    .set(chat_id.0, DialogueState::AwaitText { account_id })
                    .await;
                return send(
                    bot,
                    chat_id,
                    "Use the form <code>category | body</code>.",
                )
                .await;
            };
            let (category, body) = (category.trim(), body.trim());
            if category.is_empty() || body.is_empty() {
                context
                    .dialogues
                    .set(chat_id.0, DialogueState::AwaitText { account_id })
                    .await;
                return send(bot, chat_id, "Both category and body are required.").await;
            }
            context
                .db
                .add_text(account_id, category, body)
                .map_err(|e| format!("Failed to add text: {}", e))?;
            send_texts_view(bot, context, chat_id, account_id).await
        }
        DialogueState::AwaitRecipients { account_id } => {
            let parsed = parse_recipients(text);
            let added = context
                .db
                .add_recipients(account_id, &parsed)
                .map_err(|e| format!("Failed to add recipients: {}", e))?;

            let mut report = format!("Added {} recipients.", added);
            if !parsed.unparsed_lines.is_empty() {
                report.push_str(&format!(
                    "\n⚠️ {} lines were not understood:\n{}",
                    parsed.unparsed_lines.len(),
                    crate::telegram::bot::html_escape(&parsed.unparsed_lines.join("\n"))
                ));
            }
            send(bot, chat_id, &report).await?;
            send_recipients_view(bot, context, chat_id, account_id).await
        }
        DialogueState::AwaitBatchSize { account_id } => match text.parse::<i64>() {
            Ok(size) if (1..=100).contains(&size) => {
                context
                    .db
                    .set_account_batch_size(account_id, size)
                    .map_err(|e| format!("Failed to update batch size: {}", e))?;
                send_account_view(bot, context, chat_id, account_id).await
            }
            _ => {
                context
                    .dialogues
                    .set(chat_id.0, DialogueState::AwaitBatchSize { account_id })
                    .await;
                send(bot, chat_id, "Batch size must be a number from 1 to 100.").await
            }
        },
    }
}
