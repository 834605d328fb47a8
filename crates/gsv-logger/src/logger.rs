//! # Integration Logger
//!
//! [`IntegrationLogger`] writes structured `tracing` records and publishes
//! lifecycle events for a running integration.
//!
//! ## Shared Context
//!
//! Every logger holds an `Arc<LoggerContext>`. [`IntegrationLogger::child`]
//! hands the same context to the new logger, so the handled-error set, the
//! event sink, and the toggles are identical across the whole tree of
//! loggers. A child differs from its parent only in its bound fields.
//!
//! ## Handled Errors
//!
//! Logging a [`LogInput::Error`] at ERROR records the error's identity.
//! [`IntegrationLogger::is_handled_error`] answers from the shared set, so an
//! error logged through any child is handled for every logger in the tree.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::Level;

use crate::config::LoggerConfig;
use crate::events::{ErrorEvent, EventRecord, EventSink, Metric, PublishEvent, TracingEventSink};
use crate::input::{HandledError, LogInput};

/// State shared by a logger and all of its descendants.
pub struct LoggerContext {
    config: LoggerConfig,
    sink: Arc<dyn EventSink>,
    /// Keyed by [`HandledError::identity`]. Holding the handle keeps the
    /// address from being reused by a later error.
    handled: Mutex<HashMap<usize, HandledError>>,
}

impl LoggerContext {
    pub fn new(config: LoggerConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            sink,
            handled: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> LoggerConfig {
        self.config
    }

    fn mark_handled(&self, error: &HandledError) {
        self.handled
            .lock()
            .entry(error.identity())
            .or_insert_with(|| error.clone());
    }

    fn is_handled(&self, error: &HandledError) -> bool {
        self.handled.lock().contains_key(&error.identity())
    }

    fn publish(&self, record: EventRecord) {
        if self.config.disable_event_publish {
            return;
        }
        self.sink.publish(&record);
    }
}

impl std::fmt::Debug for LoggerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerContext")
            .field("config", &self.config)
            .field("handled", &self.handled.lock().len())
            .finish_non_exhaustive()
    }
}

/// An integration step as the logger reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInfo {
    pub id: String,
    pub name: String,
}

impl StepInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Arguments of [`IntegrationLogger::publish_error_event`].
#[derive(Debug, Clone)]
pub struct ErrorEventInput {
    pub name: String,
    pub message: String,
    pub err: HandledError,
    /// Extra fields for the log record.
    pub log_data: Option<Map<String, Value>>,
    /// Extra payload for the published event.
    pub event_data: Option<Value>,
}

/// Structured logger for one integration run.
#[derive(Debug, Clone)]
pub struct IntegrationLogger {
    context: Arc<LoggerContext>,
    fields: Map<String, Value>,
}

impl IntegrationLogger {
    /// A root logger publishing to `sink`.
    pub fn new(config: LoggerConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            context: Arc::new(LoggerContext::new(config, sink)),
            fields: Map::new(),
        }
    }

    /// A root logger configured from the environment, publishing through
    /// `tracing`.
    pub fn from_env() -> Self {
        Self::new(LoggerConfig::from_env(), Arc::new(TracingEventSink))
    }

    /// A logger sharing this logger's context with `fields` bound on top of
    /// the parent's.
    pub fn child(&self, fields: Map<String, Value>) -> Self {
        let mut bound = self.fields.clone();
        bound.extend(fields);
        Self {
            context: Arc::clone(&self.context),
            fields: bound,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn context(&self) -> &Arc<LoggerContext> {
        &self.context
    }

    pub fn trace(&self, input: impl Into<LogInput>) {
        self.log(Level::TRACE, input.into());
    }

    pub fn debug(&self, input: impl Into<LogInput>) {
        self.log(Level::DEBUG, input.into());
    }

    pub fn info(&self, input: impl Into<LogInput>) {
        self.log(Level::INFO, input.into());
    }

    pub fn warn(&self, input: impl Into<LogInput>) {
        self.log(Level::WARN, input.into());
    }

    /// Log at ERROR. An error payload is recorded as handled.
    pub fn error(&self, input: impl Into<LogInput>) {
        self.log(Level::ERROR, input.into());
    }

    /// True if `error` was logged at ERROR through this logger or any logger
    /// sharing its context.
    pub fn is_handled_error(&self, error: &HandledError) -> bool {
        self.context.is_handled(error)
    }

    pub fn step_start(&self, step: &StepInfo) {
        let description = format!("Starting step \"{}\"...", step.name);
        self.info(LogInput::fields(step_fields(step), description.clone()));
        self.publish_event("step_start", description);
    }

    pub fn step_success(&self, step: &StepInfo) {
        let description = format!("Completed step \"{}\".", step.name);
        self.info(LogInput::fields(step_fields(step), description.clone()));
        self.publish_event("step_end", description);
    }

    pub fn step_failure(&self, step: &StepInfo, err: &HandledError) {
        let description = format!(
            "Step \"{}\" failed to complete due to error. (errorId=\"{}\", reason=\"{}\")",
            step.name, step.id, err
        );
        self.publish_error_event(ErrorEventInput {
            name: "step_failure".to_string(),
            message: description,
            err: err.clone(),
            log_data: Some(step_fields(step)),
            event_data: None,
        });
    }

    pub fn synchronization_upload_start(&self, job_id: &str) {
        let description = "Uploading collected data for synchronization...".to_string();
        let mut fields = Map::new();
        fields.insert("synchronizationJobId".to_string(), Value::from(job_id));
        self.info(LogInput::fields(fields, description.clone()));
        self.publish_event("sync_upload_start", description);
    }

    /// `summary` is attached to the log record as `uploadSummary`.
    pub fn synchronization_upload_end(&self, job_id: &str, summary: Value) {
        let description = "Finished uploading collected data for synchronization.".to_string();
        let mut fields = Map::new();
        fields.insert("synchronizationJobId".to_string(), Value::from(job_id));
        fields.insert("uploadSummary".to_string(), summary);
        self.info(LogInput::fields(fields, description.clone()));
        self.publish_event("sync_upload_end", description);
    }

    /// Hand an event to the sink unless publication is disabled.
    pub fn publish_event(&self, name: impl Into<String>, description: impl Into<String>) {
        self.context
            .publish(EventRecord::Event(PublishEvent::new(name, description)));
    }

    /// Record `metric` as a histogram sample and hand it to the sink unless
    /// publication is disabled.
    pub fn publish_metric(&self, metric: Metric) {
        let mut labels: Vec<metrics::Label> = metric
            .dimensions
            .iter()
            .map(|(k, v)| metrics::Label::new(k.clone(), v.clone()))
            .collect();
        if let Some(unit) = &metric.unit {
            labels.push(metrics::Label::new("unit", unit.clone()));
        }
        metrics::histogram!(metric.name.clone(), labels).record(metric.value);

        self.debug(LogInput::fields(
            metric_fields(&metric),
            format!("Collected metric \"{}\"", metric.name),
        ));
        self.context.publish(EventRecord::Metric(metric));
    }

    /// Log `input.err` at ERROR (marking it handled) and publish an error
    /// event.
    pub fn publish_error_event(&self, input: ErrorEventInput) {
        self.error(LogInput::Error {
            error: input.err.clone(),
            fields: input.log_data.unwrap_or_default(),
            message: Some(input.message.clone()),
        });
        self.context.publish(EventRecord::Error(ErrorEvent {
            name: input.name,
            message: input.message,
            error: input.err.chain(),
            event_data: input.event_data,
            timestamp: chrono::Utc::now(),
        }));
    }

    fn log(&self, level: Level, input: LogInput) {
        if level == Level::ERROR {
            if let Some(error) = input.handled_error() {
                self.context.mark_handled(error);
            }
        }

        let (level, verbose) = route(level, self.context.config);
        let fields = Value::Object(input.fields_over(&self.fields));
        let message = input.message();

        if level == Level::ERROR {
            tracing::error!(fields = %fields, "{message}");
        } else if level == Level::WARN {
            tracing::warn!(fields = %fields, "{message}");
        } else if level == Level::INFO {
            tracing::info!(verbose, fields = %fields, "{message}");
        } else if level == Level::DEBUG {
            tracing::debug!(fields = %fields, "{message}");
        } else {
            tracing::trace!(fields = %fields, "{message}");
        }
    }
}

/// Level a record is written at, and whether it was promoted from TRACE.
pub(crate) fn route(level: Level, config: LoggerConfig) -> (Level, bool) {
    if level == Level::TRACE && config.verbose {
        (Level::INFO, true)
    } else {
        (level, false)
    }
}

fn step_fields(step: &StepInfo) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("stepId".to_string(), Value::from(step.id.as_str()));
    fields.insert("stepName".to_string(), Value::from(step.name.as_str()));
    fields
}

fn metric_fields(metric: &Metric) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("metricName".to_string(), Value::from(metric.name.as_str()));
    fields.insert("value".to_string(), Value::from(metric.value));
    if let Some(unit) = &metric.unit {
        fields.insert("unit".to_string(), Value::from(unit.as_str()));
    }
    fields
}
