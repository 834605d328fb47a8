//! Assertion outcome handed back to the host framework.

use std::fmt;

/// Message producer. Rendering is deferred until the host asks for it.
type MessageFn = Box<dyn Fn() -> String + Send + Sync>;

/// Pass/fail verdict with a lazily rendered message.
pub struct MatchResult {
    pass: bool,
    message: MessageFn,
}

impl MatchResult {
    /// A passing result.
    pub fn passed(message: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self {
            pass: true,
            message: Box::new(message),
        }
    }

    /// A failing result.
    pub fn failed(message: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self {
            pass: false,
            message: Box::new(message),
        }
    }

    /// Whether the assertion held.
    pub fn pass(&self) -> bool {
        self.pass
    }

    /// Render the message.
    pub fn message(&self) -> String {
        (self.message)()
    }
}

impl fmt::Debug for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchResult")
            .field("pass", &self.pass)
            .field("message", &self.message())
            .finish()
    }
}
