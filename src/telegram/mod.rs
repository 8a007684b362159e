//! Telegram console for Subfleet
//!
//! The operator-facing surface: every account operation is driven from a
//! private chat with the bot, restricted to the configured admin ids.
//!
//! ```text
//! telegram/
//! ├── mod.rs           # This file - public API
//! ├── bot.rs           # Bot construction and message sending
//! ├── dialogue.rs      # Per-chat conversation state
//! ├── keyboards.rs     # Inline keyboards
//! ├── polling.rs       # Update polling service
//! │
//! └── handlers/        # Update handlers
//!     ├── mod.rs       # Routing + admin check
//!     ├── commands.rs  # Slash commands
//!     ├── callbacks.rs # Button click handlers
//!     └── messages.rs  # Dialogue text input
//! ```

pub mod bot;
pub mod dialogue;
pub mod handlers;
pub mod keyboards;
pub mod polling;

pub use bot::{init_bot, send_message};
pub use dialogue::{DialogueState, DialogueStore};
pub use polling::{BotContext, TelegramService};
