//! Shared utilities for OCR backends.

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Read a non-empty environment variable.
pub fn env_non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary() {
        assert!(!check_binary("scanlens-no-such-binary-xyz"));
    }

    #[test]
    fn test_env_non_empty_unset() {
        assert_eq!(env_non_empty("SCANLENS_TEST_NEVER_SET_VAR"), None);
    }
}
