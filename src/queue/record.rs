//! Metrics record types carried through the handoff queue
//!
//! Producers assemble an immutable snapshot of named samples plus descriptive
//! tags and enqueue it; sinks receive the record unchanged. The queue itself
//! is generic, so these types are a convenience for the common metrics case
//! rather than a requirement.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Well-known tag name identifying the metrics context a record belongs to.
pub const CONTEXT_TAG: &str = "context";

/// Descriptive name/value pair attached to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsTag {
    pub name: String,
    pub value: String,
}

impl MetricsTag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Single named sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Immutable metrics snapshot flowing from a producer to a sink
///
/// # Example
///
/// ```rust
/// use metrics_handoff::queue::MetricsRecord;
///
/// let record = MetricsRecord::new("rpc", "request_stats")
///     .add_tag("host", "node-1")
///     .add_metric("requests", 1042.0);
///
/// assert_eq!(record.metrics.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Metrics context the record belongs to (see [`CONTEXT_TAG`])
    pub context: String,
    /// Record name within the context
    pub name: String,
    /// Capture time, set at construction
    pub timestamp: SystemTime,
    pub tags: Vec<MetricsTag>,
    pub metrics: Vec<Metric>,
}

impl MetricsRecord {
    pub fn new(context: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            name: name.into(),
            timestamp: SystemTime::now(),
            tags: Vec::new(),
            metrics: Vec::new(),
        }
    }

    pub fn add_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(MetricsTag::new(name, value));
        self
    }

    pub fn add_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.push(Metric::new(name, value));
        self
    }

    /// Value of the context tag if one was attached explicitly, otherwise the
    /// record's own context.
    pub fn context_tag(&self) -> &str {
        self.tags
            .iter()
            .find(|tag| tag.name == CONTEXT_TAG)
            .map(|tag| tag.value.as_str())
            .unwrap_or(&self.context)
    }
}
