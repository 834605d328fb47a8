//! # gsv-logger — Structured Integration Logger
//!
//! A logging facade for data-collection integrations built on `tracing`.
//! Besides plain log records it publishes lifecycle events (steps and
//! synchronization uploads), metrics, and error events to an
//! [`EventSink`], and remembers which errors have already been logged.
//!
//! ## Configuration
//!
//! [`LoggerConfig::from_env`] reads two toggles:
//!
//! - `GSV_DISABLE_EVENT_PUBLISH`: nothing reaches the sink. Log records and
//!   handled-error tracking are unaffected.
//! - `GSV_LOG_VERBOSE`: trace records are written at INFO with
//!   `verbose = true`.
//!
//! ## Crate Policy
//!
//! - Never installs a `tracing` subscriber or a `metrics` recorder. Binaries
//!   choose those.
//! - Logging is infallible; no method returns `Result`.

pub mod config;
pub mod events;
pub mod input;
pub mod logger;

pub use config::{LoggerConfig, DISABLE_EVENT_PUBLISH_ENV, LOG_VERBOSE_ENV};
pub use events::{
    ErrorEvent, EventRecord, EventSink, MemoryEventSink, Metric, PublishEvent, TracingEventSink,
};
pub use input::{HandledError, LogInput};
pub use logger::{ErrorEventInput, IntegrationLogger, LoggerContext, StepInfo};
