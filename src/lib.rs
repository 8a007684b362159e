pub mod accounts;
pub mod arguments;
pub mod config;
pub mod database;
pub mod errors;
pub mod jobs;
pub mod logger;
pub mod paths;
pub mod services;
pub mod telegram;
pub mod version;
