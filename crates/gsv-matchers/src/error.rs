//! Usage errors raised by the matcher surface.
//!
//! These are caller mistakes (a malformed argument, an override that is not
//! a valid schema, an unregistered matcher name). They propagate as `Err`
//! and are never turned into failing assertions.

use gsv_core::GsvError;
use gsv_schema::ValidatorError;
use thiserror::Error;

/// A matcher was invoked incorrectly.
#[derive(Error, Debug)]
pub enum MatcherUsageError {
    /// A required positional argument was not supplied.
    #[error("{matcher}: missing argument #{position}")]
    MissingArgument {
        /// Matcher name.
        matcher: &'static str,
        /// Zero-based argument position.
        position: usize,
    },

    /// A positional argument has the wrong shape.
    #[error("{matcher}: invalid argument #{position}: {reason}")]
    InvalidArgument {
        /// Matcher name.
        matcher: &'static str,
        /// Zero-based argument position.
        position: usize,
        /// Why the argument was rejected.
        reason: String,
    },

    /// The received value has the wrong shape.
    #[error("{matcher}: invalid received value: {reason}")]
    InvalidReceived {
        /// Matcher name.
        matcher: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The merged or overridden schema does not compile.
    #[error(transparent)]
    InvalidSchema(#[from] ValidatorError),

    /// A typed graph object could not be converted to JSON.
    #[error(transparent)]
    InvalidGraphObject(#[from] GsvError),

    /// No matcher is registered under the requested name.
    #[error("unknown matcher '{0}'")]
    UnknownMatcher(String),
}
