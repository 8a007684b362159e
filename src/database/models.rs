//! Row types for the persistence layer

use crate::accounts::AccountIdentity;
use std::path::PathBuf;

/// A managed sub-account as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub id: i64,
    /// Telegram user id of the owning admin
    pub user_id: i64,
    pub name: String,
    pub phone: String,
    pub api_id: i64,
    pub api_hash: String,
    pub session_path: String,
    pub is_connected: bool,
    /// Whether the worker should be doing outreach; the worker reads this
    /// flag, the bot only flips it
    pub is_started: bool,
    pub folder_id: Option<i64>,
    pub batch_size: i64,
}

impl AccountRecord {
    /// Identity view consumed by the lifecycle core
    pub fn identity(&self) -> AccountIdentity {
        AccountIdentity {
            phone: self.phone.clone(),
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            session_path: PathBuf::from(&self.session_path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

/// One outreach text variant in a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTemplate {
    pub id: i64,
    pub account_id: i64,
    pub category: String,
    pub body: String,
}

/// One queued outreach target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub id: i64,
    pub account_id: i64,
    pub username: String,
    pub item_name: String,
    pub sent: bool,
}

/// A background job dispatched to a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    /// JSON payload written by the worker when the job completes
    pub answer: Option<String>,
}

/// An answered job joined with the owner to notify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredJob {
    pub job: JobRecord,
    pub account_name: String,
    pub account_phone: String,
    /// Chat to deliver the answer to
    pub owner_user_id: i64,
}
