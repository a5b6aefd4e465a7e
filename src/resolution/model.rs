//! Resolution data model shared by the store, the resolver and the oracle

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder replaced with the service address at read time
pub const ADDRESS_PLACEHOLDER: &str = "<ADDR>";

/// Text of the sentinel returned when no resolution could be obtained
pub const UNAVAILABLE_TEXT: &str = "Resolution unavailable";

/// Canonical lowercase identifier of a fault class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorKey(String);

impl ErrorKey {
    /// Canonicalize raw text into a key. Returns `None` for blank input.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let canonical = raw.as_ref().trim().to_lowercase();
        if canonical.is_empty() {
            None
        } else {
            Some(Self(canonical))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a stored key
    pub fn matches(&self, other: &str) -> bool {
        other.trim().to_lowercase() == self.0
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remediation for an error key: free-form text or an ordered list of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resolution {
    Steps(Vec<String>),
    Text(String),
}

impl Resolution {
    /// Sentinel used when the oracle fails. Never persisted.
    pub fn unavailable() -> Self {
        Resolution::Text(UNAVAILABLE_TEXT.to_string())
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Resolution::Text(text) if text == UNAVAILABLE_TEXT)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Resolution::Steps(steps) => steps.iter().all(|s| s.trim().is_empty()),
            Resolution::Text(text) => text.trim().is_empty(),
        }
    }

    /// Replace every address placeholder with `address`
    pub fn with_address(&self, address: &str) -> Self {
        match self {
            Resolution::Steps(steps) => Resolution::Steps(
                steps
                    .iter()
                    .map(|s| s.replace(ADDRESS_PLACEHOLDER, address))
                    .collect(),
            ),
            Resolution::Text(text) => Resolution::Text(text.replace(ADDRESS_PLACEHOLDER, address)),
        }
    }
}

/// Persisted unit of the resolution store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionEntry {
    pub error: String,
    pub resolution: Resolution,
}

impl ResolutionEntry {
    pub fn new(key: &ErrorKey, resolution: Resolution) -> Self {
        Self {
            error: key.as_str().to_string(),
            resolution,
        }
    }
}
