//! Persistence layer for Subfleet
//!
//! One SQLite database behind a `Database` handle. Business entities
//! (accounts, folders, texts, recipients, jobs) are owned here; the account
//! lifecycle core only ever reads identities and reports flags back.

mod accounts;
mod connection;
mod folders;
mod jobs;
mod models;
mod recipients;
mod texts;

pub use connection::Database;
pub use models::{AccountRecord, AnsweredJob, Folder, JobRecord, Recipient, TextTemplate};
pub use recipients::{parse_recipients, ParsedRecipients};
