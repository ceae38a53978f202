//! The example pair a transform is synthesized from.

use serde::{Deserialize, Serialize};

/// An input snippet and the output the transform must produce from it.
///
/// Immutable once constructed; a session borrows it for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    before: String,
    after: String,
}

impl Example {
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }

    /// Source the transform is applied to.
    pub fn before(&self) -> &str {
        &self.before
    }

    /// Source the transform is expected to produce.
    pub fn after(&self) -> &str {
        &self.after
    }
}
