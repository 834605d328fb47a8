//! # Log Input
//!
//! Every logger method takes a [`LogInput`]. Its shape is decided once, when
//! the caller's value is converted, and never re-inspected afterwards.
//!
//! Errors are carried as [`HandledError`], a shared handle whose identity
//! (not its message) is what the handled-error set tracks.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// A shared handle to an error.
///
/// Clones refer to the same error. Two handles are the same error only if
/// one was cloned from the other.
#[derive(Clone)]
pub struct HandledError(Arc<dyn StdError + Send + Sync>);

impl HandledError {
    pub fn new(err: impl StdError + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }

    /// Address of the shared error. Equal for clones, and unique among
    /// handles that are alive at the same time.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// The error and its sources, joined with `: `.
    pub fn chain(&self) -> String {
        let mut rendered = self.0.to_string();
        let mut source = self.0.source();
        while let Some(err) = source {
            rendered.push_str(": ");
            rendered.push_str(&err.to_string());
            source = err.source();
        }
        rendered
    }

    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for HandledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandledError").field(&self.0.to_string()).finish()
    }
}

impl fmt::Display for HandledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Box<dyn StdError + Send + Sync>> for HandledError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        Self(Arc::from(err))
    }
}

/// What a log call carries.
#[derive(Debug, Clone)]
pub enum LogInput {
    /// An error, optionally with structured fields.
    Error {
        error: HandledError,
        fields: Map<String, Value>,
        message: Option<String>,
    },
    /// Structured fields, optionally with a message.
    Fields {
        fields: Map<String, Value>,
        message: Option<String>,
    },
    /// A plain message.
    Message(String),
}

impl LogInput {
    /// An error record with a message.
    pub fn error(error: HandledError, message: impl Into<String>) -> Self {
        Self::Error {
            error,
            fields: Map::new(),
            message: Some(message.into()),
        }
    }

    /// A fields record with a message.
    pub fn fields(fields: Map<String, Value>, message: impl Into<String>) -> Self {
        Self::Fields {
            fields,
            message: Some(message.into()),
        }
    }

    /// The error carried by this input, if any.
    pub fn handled_error(&self) -> Option<&HandledError> {
        match self {
            Self::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Message text. An error without an explicit message uses the error's
    /// own text.
    pub fn message(&self) -> String {
        match self {
            Self::Error { error, message, .. } => {
                message.clone().unwrap_or_else(|| error.to_string())
            }
            Self::Fields { message, .. } => message.clone().unwrap_or_default(),
            Self::Message(message) => message.clone(),
        }
    }

    /// Structured fields, merged over `base`. The input's own fields win.
    pub(crate) fn fields_over(&self, base: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = base.clone();
        match self {
            Self::Error { error, fields, .. } => {
                merged.extend(fields.clone());
                merged.insert("err".to_string(), Value::String(error.chain()));
            }
            Self::Fields { fields, .. } => merged.extend(fields.clone()),
            Self::Message(_) => {}
        }
        merged
    }
}

impl From<&str> for LogInput {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<String> for LogInput {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<HandledError> for LogInput {
    fn from(error: HandledError) -> Self {
        Self::Error {
            error,
            fields: Map::new(),
            message: None,
        }
    }
}

impl From<&HandledError> for LogInput {
    fn from(error: &HandledError) -> Self {
        Self::from(error.clone())
    }
}

impl From<Map<String, Value>> for LogInput {
    fn from(fields: Map<String, Value>) -> Self {
        Self::Fields {
            fields,
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io;

    #[test]
    fn test_clones_share_identity() {
        let a = HandledError::new(io::Error::new(io::ErrorKind::Other, "boom"));
        let b = a.clone();
        let c = HandledError::new(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn test_error_message_defaults_to_error_text() {
        let err = HandledError::new(io::Error::new(io::ErrorKind::Other, "disk full"));
        assert_eq!(LogInput::from(err.clone()).message(), "disk full");
        assert_eq!(LogInput::error(err, "upload failed").message(), "upload failed");
    }

    #[test]
    fn test_fields_over_base() {
        let mut base = Map::new();
        base.insert("step".to_string(), json!("fetch-users"));
        base.insert("attempt".to_string(), json!(1));
        let mut own = Map::new();
        own.insert("attempt".to_string(), json!(2));

        let merged = LogInput::from(own).fields_over(&base);
        assert_eq!(merged["step"], "fetch-users");
        assert_eq!(merged["attempt"], 2);
        assert_eq!(LogInput::from("hi").fields_over(&base), base);
    }

    #[test]
    fn test_error_fields_include_chain() {
        let err = HandledError::new(io::Error::new(io::ErrorKind::Other, "timeout"));
        let fields = LogInput::from(err).fields_over(&Map::new());
        assert_eq!(fields["err"], "timeout");
    }
}
