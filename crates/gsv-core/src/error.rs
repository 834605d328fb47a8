//! # Error Types
//!
//! Top-level error type for failures that are not assertion outcomes.
//! Assertion failures (duplicate keys, unknown classes, schema violations,
//! unresolved targets) are reported as values by the matcher layer and never
//! pass through this type.

use thiserror::Error;

/// Top-level error type for the gsv workspace.
#[derive(Error, Debug)]
pub enum GsvError {
    /// A value could not be converted to or from its JSON representation.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A graph object did not have the shape required by the caller.
    #[error("malformed graph object: {0}")]
    MalformedObject(String),
}
