//! Per-chat conversation state
//!
//! One state slot per chat id. States are transient: nothing here is
//! persisted, a restart drops every in-flight conversation, including auth
//! handshakes (the operator just taps Connect again).

use crate::accounts::HandshakeState;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// What the next plain-text message from a chat means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueState {
    /// Add-account flow, collected step by step
    AddAccountName,
    AddAccountPhone {
        name: String,
    },
    AddAccountApiId {
        name: String,
        phone: String,
    },
    AddAccountApiHash {
        name: String,
        phone: String,
        api_id: i64,
    },

    /// Auth handshake: waiting for the verification code
    AwaitCode {
        account_id: i64,
        handshake: HandshakeState,
    },
    /// Auth handshake: code accepted, waiting for the 2FA password
    AwaitPassword {
        account_id: i64,
        handshake: HandshakeState,
        code: String,
    },

    AwaitFolderName,
    /// Waiting for the new name of an existing folder
    AwaitFolderRename {
        folder_id: i64,
    },
    /// Waiting for `category | body` for an account's texts
    AwaitText {
        account_id: i64,
    },
    /// Waiting for a pasted `item - @username` recipient list
    AwaitRecipients {
        account_id: i64,
    },
    AwaitBatchSize {
        account_id: i64,
    },
}

/// Dialogue states keyed by chat id
#[derive(Default)]
pub struct DialogueStore {
    states: RwLock<HashMap<i64, DialogueState>>,
}

impl DialogueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, chat_id: i64, state: DialogueState) {
        self.states.write().await.insert(chat_id, state);
    }

    /// Remove and return the state; text handlers consume it and re-set what
    /// remains
    pub async fn take(&self, chat_id: i64) -> Option<DialogueState> {
        self.states.write().await.remove(&chat_id)
    }

    pub async fn clear(&self, chat_id: i64) -> bool {
        self.states.write().await.remove(&chat_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn take_consumes_the_state() {
        let store = DialogueStore::new();
        store.set(1, DialogueState::AddAccountName).await;

        assert_eq!(store.take(1).await, Some(DialogueState::AddAccountName));
        assert_eq!(store.take(1).await, None);
    }

    #[tokio::test]
    async fn states_are_per_chat() {
        let store = DialogueStore::new();
        store.set(1, DialogueState::AddAccountName).await;
        store.set(2, DialogueState::AwaitFolderName).await;

        assert!(store.clear(1).await);
        assert_eq!(store.take(2).await, Some(DialogueState::AwaitFolderName));
        assert!(!store.clear(1).await);
    }
}
