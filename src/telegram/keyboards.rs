//! Telegram keyboard builders for Subfleet
//!
//! Provides pre-built inline keyboard layouts for:
//! - Main menu navigation
//! - Account lists and per-account actions
//! - Folder management
//! - Confirmation dialogs

use crate::database::{AccountRecord, Folder};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

// === HELPER FUNCTIONS ===

/// Create a callback button
fn btn(text: &str, callback_data: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.to_string(), callback_data.to_string())
}

// === MAIN MENU ===

/// Main menu keyboard with primary navigation options
pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            btn("👥 Accounts", "menu:accounts"),
            btn("📁 Folders", "menu:folders"),
        ],
        vec![btn("➕ Add account", "addacc")],
    ])
}

// === ACCOUNTS ===

/// Account list, one button per account with a live/stopped marker
pub fn accounts_list(accounts: &[(AccountRecord, bool)]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = vec![];

    for (account, running) in accounts {
        let emoji = if *running { "🟢" } else { "⚪" };
        let text = format!("{} {} ({})", emoji, account.name, account.phone);
        rows.push(vec![btn(&text, &format!("acc:{}", account.id))]);
    }

    rows.push(vec![
        btn("➕ Add account", "addacc"),
        btn("◀️ Menu", "menu:main"),
    ]);
    InlineKeyboardMarkup::new(rows)
}

/// Single account view with lifecycle and content actions
pub fn account_actions(account: &AccountRecord, running: bool) -> InlineKeyboardMarkup {
    let id = account.id;
    let mut rows = vec![];

    // Row 1: session lifecycle
    if running {
        rows.push(vec![btn("🔌 Disconnect", &format!("acc:{}:disconnect", id))]);
    } else {
        rows.push(vec![btn("🔌 Connect", &format!("acc:{}:connect", id))]);
    }

    // Row 2: outreach control
    if account.is_started {
        rows.push(vec![btn("⏸️ Stop sending", &format!("acc:{}:stop", id))]);
    } else {
        rows.push(vec![btn("▶️ Start sending", &format!("acc:{}:start", id))]);
    }

    // Row 3: content
    rows.push(vec![
        btn("💬 Texts", &format!("acc:{}:texts", id)),
        btn("📋 Recipients", &format!("acc:{}:recipients", id)),
    ]);

    // Row 4: worker jobs
    rows.push(vec![btn(
        "🧾 Collect names",
        &format!("acc:{}:job", id),
    )]);

    // Row 5: settings
    rows.push(vec![
        btn("📁 Folder", &format!("acc:{}:folder", id)),
        btn(
            &format!("📦 Batch: {}", account.batch_size),
            &format!("acc:{}:batch", id),
        ),
    ]);

    rows.push(vec![
        btn("🗑 Delete", &format!("confirm:delete:{}", id)),
        btn("◀️ Accounts", "menu:accounts"),
    ]);
    InlineKeyboardMarkup::new(rows)
}

/// Texts view actions
pub fn text_actions(account_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        btn("➕ Add text", &format!("acc:{}:addtext", account_id)),
        btn("◀️ Back", &format!("acc:{}", account_id)),
    ]])
}

/// Recipients view actions
pub fn recipient_actions(account_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            btn("➕ Add list", &format!("acc:{}:addrcp", account_id)),
            btn("🧹 Clear", &format!("acc:{}:clearrcp", account_id)),
        ],
        vec![
            btn("🕘 History", &format!("acc:{}:history", account_id)),
            btn("◀️ Back", &format!("acc:{}", account_id)),
        ],
    ])
}

/// Pager for the recipient history, arrows only where a page exists
pub fn recipient_history(account_id: i64, page: i64, total_pages: i64) -> InlineKeyboardMarkup {
    let mut nav = vec![];
    if page > 1 {
        nav.push(btn("⬅️", &format!("acc:{}:history:{}", account_id, page - 1)));
    }
    if page < total_pages {
        nav.push(btn("➡️", &format!("acc:{}:history:{}", account_id, page + 1)));
    }

    let mut rows = vec![];
    if !nav.is_empty() {
        rows.push(nav);
    }
    rows.push(vec![btn(
        "◀️ Recipients",
        &format!("acc:{}:recipients", account_id),
    )]);
    InlineKeyboardMarkup::new(rows)
}

// === FOLDERS ===

pub fn folders_list(folders: &[Folder]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = vec![];

    for folder in folders {
        rows.push(vec![
            btn(
                &format!("📁 {}", folder.name),
                &format!("folder:{}", folder.id),
            ),
            btn("✏️", &format!("folder:{}:rename", folder.id)),
            btn("🗑", &format!("folder:{}:delete", folder.id)),
        ]);
    }

    rows.push(vec![
        btn("➕ New folder", "addfolder"),
        btn("◀️ Menu", "menu:main"),
    ]);
    InlineKeyboardMarkup::new(rows)
}

/// Folder picker for filing an account
pub fn folder_picker(account_id: i64, folders: &[Folder]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = vec![];

    for folder in folders {
        rows.push(vec![btn(
            &format!("📁 {}", folder.name),
            &format!("acc:{}:folder:{}", account_id, folder.id),
        )]);
    }

    rows.push(vec![
        btn("🚫 No folder", &format!("acc:{}:folder:none", account_id)),
        btn("◀️ Back", &format!("acc:{}", account_id)),
    ]);
    InlineKeyboardMarkup::new(rows)
}

// === CONFIRMATION DIALOGS ===

/// Confirmation dialog for deleting an account
pub fn confirm_delete(account_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        btn("✅ Confirm delete", &format!("exec:delete:{}", account_id)),
        btn("❌ Cancel", &format!("acc:{}", account_id)),
    ]])
}

/// Single button back to an account after a lifecycle action
pub fn back_to_account(account_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![btn("◀️ Back", &format!("acc:{}", account_id))]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64) -> AccountRecord {
        AccountRecord {
            id,
            user_id: 42,
            name: "alpha".to_string(),
            phone: "79990001122".to_string(),
            api_id: 1,
            api_hash: "0123456789abcdef0123456789abcdef".to_string(),
            session_path: "/s/79990001122.session".to_string(),
            is_connected: false,
            is_started: false,
            folder_id: None,
            batch_size: 10,
        }
    }

    #[test]
    fn account_actions_toggle_with_state() {
        let keyboard = account_actions(&record(7), false);
        let first = &keyboard.inline_keyboard[0][0];
        assert!(first.text.contains("Connect"));

        let keyboard = account_actions(&record(7), true);
        let first = &keyboard.inline_keyboard[0][0];
        assert!(first.text.contains("Disconnect"));
    }

    fn callbacks_of(keyboard: &InlineKeyboardMarkup) -> Vec<String> {
        keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                    Some(data.clone())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn account_actions_expose_the_job_queue() {
        let callbacks = callbacks_of(&account_actions(&record(7), false));
        assert!(callbacks.iter().any(|data| data == "acc:7:job"));
    }

    #[test]
    fn recipient_actions_link_to_history() {
        let callbacks = callbacks_of(&recipient_actions(7));
        assert!(callbacks.iter().any(|data| data == "acc:7:history"));
    }

    #[test]
    fn history_pager_offers_only_reachable_pages() {
        // First of three pages: forward only.
        let callbacks = callbacks_of(&recipient_history(7, 1, 3));
        assert!(callbacks.contains(&"acc:7:history:2".to_string()));
        assert!(!callbacks.iter().any(|data| data.ends_with(":0")));

        // Middle page: both directions.
        let callbacks = callbacks_of(&recipient_history(7, 2, 3));
        assert!(callbacks.contains(&"acc:7:history:1".to_string()));
        assert!(callbacks.contains(&"acc:7:history:3".to_string()));

        // Single page: no arrows, just the way back.
        let callbacks = callbacks_of(&recipient_history(7, 1, 1));
        assert_eq!(callbacks, vec!["acc:7:recipients".to_string()]);
    }

    #[test]
    fn folder_rows_offer_rename_and_delete() {
        let folders = vec![Folder {
            id: 3,
            user_id: 42,
            name: "warm".to_string(),
        }];
        let callbacks = callbacks_of(&folders_list(&folders));
        assert!(callbacks.contains(&"folder:3:rename".to_string()));
        assert!(callbacks.contains(&"folder:3:delete".to_string()));
    }

    #[test]
    fn callback_data_stays_within_limit() {
        // Telegram rejects callback data over 64 bytes.
        let callback = format!("acc:{}:folder:{}", i64::MAX, i64::MAX);
        assert!(callback.len() <= 64);
    }
}
