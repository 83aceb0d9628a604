//! Error types module
//!
//! Errors raised while decoding the storage URLs handed out by the job API.

/// A storage URL that cannot be decomposed into endpoint, container, prefix and token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed storage location: {reason}")]
pub struct MalformedLocationError {
    reason: String,
}

impl MalformedLocationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}
