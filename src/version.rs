//! Version information for Subfleet

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Human-readable version line for startup logs and --version output
pub fn version_line() -> String {
    format!("Subfleet v{}", VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn version_line_contains_version() {
        assert!(version_line().contains(VERSION));
    }
}
