//! Vocabulary-driven classification of raw Vault log lines

use crate::resolution::ErrorKey;

/// Known Vault fault phrases, lowercase, in priority order.
/// The first phrase found in a line wins, so order is significant.
pub const VAULT_ERROR_VOCABULARY: &[&str] = &[
    "vault is sealed",
    "vault sealed",
    "permission denied",
    "token revoked",
    "token expired",
    "lease expired",
    "lease not found",
    "invalid token",
    "missing client token",
    "bad token",
    "connection refused",
    "context deadline exceeded",
    "i/o timeout",
    "tls handshake timeout",
    "x509: certificate has expired",
    "x509: certificate signed by unknown authority",
    "no route to host",
    "storage migration in progress",
    "local node not active",
    "no handler for route",
    "unsupported path",
    "rate limit quota exceeded",
    "lock already held",
    "failed to unseal",
    "unseal key",
    "barrier is sealed",
    "raft: failed to heartbeat",
    "failed to make requests to primary",
    "audit device failed",
    "disk quota exceeded",
    "no space left on device",
    "generated new token",
];

/// Maps log lines to canonical error keys
#[derive(Debug, Clone)]
pub struct Classifier {
    vocabulary: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(VAULT_ERROR_VOCABULARY.iter().copied())
    }
}

impl Classifier {
    /// Build a classifier over a custom vocabulary, kept in the given order
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            vocabulary: vocabulary
                .into_iter()
                .map(|phrase| phrase.as_ref().trim().to_lowercase())
                .filter(|phrase| !phrase.is_empty())
                .collect(),
        }
    }

    /// First vocabulary phrase contained in `line`, if any
    pub fn classify(&self, line: &str) -> Option<ErrorKey> {
        if line.trim().is_empty() {
            return None;
        }

        let lowered = line.to_lowercase();
        self.vocabulary
            .iter()
            .find(|phrase| lowered.contains(phrase.as_str()))
            .and_then(ErrorKey::new)
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }
}
