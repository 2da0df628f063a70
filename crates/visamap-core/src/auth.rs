//! Shared admin secret guarding mutating operations.

use std::fmt;
use std::sync::Arc;

/// Process-wide admin secret injected at construction time.
///
/// The secret is compared verbatim against the credential presented with every
/// privileged call; there are no sessions and no expiry.
#[derive(Clone)]
pub struct AdminSecret {
    value: Arc<str>,
}

impl AdminSecret {
    /// Wrap a secret value, rejecting empty strings.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            return None;
        }
        Some(Self {
            value: Arc::from(value),
        })
    }

    /// Exact string comparison against the configured secret.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        self.value.as_ref() == candidate
    }
}

impl fmt::Debug for AdminSecret {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("AdminSecret(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_rejected() {
        assert!(AdminSecret::new("").is_none());
    }

    #[test]
    fn verify_requires_exact_match() {
        let secret = AdminSecret::new("hunter2").expect("secret");
        assert!(secret.verify("hunter2"));
        assert!(!secret.verify("hunter2 "));
        assert!(!secret.verify("HUNTER2"));
        assert!(!secret.verify(""));
    }

    #[test]
    fn debug_output_redacts_value() {
        let secret = AdminSecret::new("hunter2").expect("secret");
        assert!(!format!("{secret:?}").contains("hunter2"));
    }
}
