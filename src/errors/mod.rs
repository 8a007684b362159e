/// Structured error types for Subfleet
///
/// Domain outcomes (auth failure tags, connect outcomes) are not errors and
/// live in `accounts::types`; this module holds the infrastructure-side
/// error enums that get logged or mapped at the boundary.

// =============================================================================
// AUTH TRANSPORT ERRORS
// =============================================================================

/// Failures while driving the external protocol-client helper
///
/// These never reach the Telegram user directly: the coordinator maps them
/// to the generic provider failure tag and logs the detail.
#[derive(Debug, Clone)]
pub enum TransportError {
    /// Helper binary is not configured or not present on disk
    HelperMissing { path: String },
    /// Helper process could not be spawned or its pipes failed
    Spawn { message: String },
    /// Helper did not answer within the configured timeout
    Timeout { seconds: u64 },
    /// Helper produced output the wire format does not recognize
    Malformed { output: String },
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::HelperMissing { path } => {
                write!(f, "Auth helper not found: {}", path)
            }
            TransportError::Spawn { message } => {
                write!(f, "Failed to run auth helper: {}", message)
            }
            TransportError::Timeout { seconds } => {
                write!(f, "Auth helper timed out after {}s", seconds)
            }
            TransportError::Malformed { output } => {
                write!(f, "Unrecognized auth helper output: {}", output)
            }
        }
    }
}

impl std::error::Error for TransportError {}

impl TransportError {
    pub fn spawn(message: impl Into<String>) -> Self {
        TransportError::Spawn {
            message: message.into(),
        }
    }

    pub fn malformed(output: impl Into<String>) -> Self {
        TransportError::Malformed {
            output: output.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let e = TransportError::Timeout { seconds: 30 };
        assert!(e.to_string().contains("30s"));

        let e = TransportError::HelperMissing {
            path: "/opt/helper".to_string(),
        };
        assert!(e.to_string().contains("/opt/helper"));
    }
}
