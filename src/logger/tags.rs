/// Log tags identifying the originating subsystem
///
/// Each tag maps to a --debug-<key> command-line flag.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Telegram,
    Supervisor,
    Auth,
    Accounts,
    Jobs,
    Database,
    Config,
}

impl LogTag {
    /// Plain uppercase name for file output
    pub fn to_plain_string(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Telegram => "TELEGRAM",
            LogTag::Supervisor => "SUPERVISOR",
            LogTag::Auth => "AUTH",
            LogTag::Accounts => "ACCOUNTS",
            LogTag::Jobs => "JOBS",
            LogTag::Database => "DATABASE",
            LogTag::Config => "CONFIG",
        }
    }

    /// The --debug-<key> suffix controlling this tag
    pub fn to_debug_key(&self) -> &'static str {
        match self {
            LogTag::System => "system",
            LogTag::Telegram => "telegram",
            LogTag::Supervisor => "supervisor",
            LogTag::Auth => "auth",
            LogTag::Accounts => "accounts",
            LogTag::Jobs => "jobs",
            LogTag::Database => "database",
            LogTag::Config => "config",
        }
    }
}
