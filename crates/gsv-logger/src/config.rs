//! Environment-driven logger configuration.

/// Disables event, metric, and error-event publication when truthy.
pub const DISABLE_EVENT_PUBLISH_ENV: &str = "GSV_DISABLE_EVENT_PUBLISH";

/// Promotes trace records to INFO when truthy.
pub const LOG_VERBOSE_ENV: &str = "GSV_LOG_VERBOSE";

/// Logger toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Skip handing events to the sink. Log records are still written.
    pub disable_event_publish: bool,
    /// Write trace records at INFO, tagged `verbose = true`.
    pub verbose: bool,
}

impl LoggerConfig {
    /// Read both toggles from the process environment.
    pub fn from_env() -> Self {
        Self {
            disable_event_publish: env_flag(DISABLE_EVENT_PUBLISH_ENV),
            verbose: env_flag(LOG_VERBOSE_ENV),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

/// Anything but an empty value, `0`, or `false` (any case) is truthy.
pub(crate) fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    !(value.is_empty() || value == "0" || value == "false")
}
