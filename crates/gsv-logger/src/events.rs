//! # Published Records
//!
//! Events, metrics, and error events leave the logger through an
//! [`EventSink`]. [`TracingEventSink`] writes them as `tracing` records
//! under the `gsv::events` target; [`MemoryEventSink`] keeps them in memory.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named occurrence with a human-readable description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishEvent {
    pub name: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl PublishEvent {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A single numeric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    /// Unit label such as `Milliseconds` or `Count`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Extra dimensions, recorded as metric labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dimensions: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            unit: None,
            dimensions: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(key.into(), value.into());
        self
    }
}

/// An error surfaced to the operator, distinct from the log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    pub name: String,
    pub message: String,
    /// Rendered error chain.
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

/// Anything a sink receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventRecord {
    Event(PublishEvent),
    Metric(Metric),
    Error(ErrorEvent),
}

/// Destination for published records.
pub trait EventSink: Send + Sync {
    fn publish(&self, record: &EventRecord);
}

/// Writes records as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, record: &EventRecord) {
        match record {
            EventRecord::Event(event) => tracing::info!(
                target: "gsv::events",
                name = %event.name,
                timestamp = %event.timestamp.to_rfc3339(),
                "{}",
                event.description
            ),
            EventRecord::Metric(metric) => tracing::info!(
                target: "gsv::events",
                name = %metric.name,
                value = metric.value,
                unit = metric.unit.as_deref().unwrap_or(""),
                timestamp = %metric.timestamp.to_rfc3339(),
                "metric"
            ),
            EventRecord::Error(event) => tracing::error!(
                target: "gsv::events",
                name = %event.name,
                err = %event.error,
                timestamp = %event.timestamp.to_rfc3339(),
                "{}",
                event.message
            ),
        }
    }
}

/// Keeps every record in publication order.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    records: Mutex<Vec<EventRecord>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of the records published so far.
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().clone()
    }

    /// Names of published events, skipping metrics and error events.
    pub fn event_names(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                EventRecord::Event(e) => Some(e.name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl EventSink for MemoryEventSink {
    fn publish(&self, record: &EventRecord) {
        self.records.lock().push(record.clone());
    }
}
