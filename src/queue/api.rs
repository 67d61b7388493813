//! Public API for the handoff queue
//!
//! External modules should import from here rather than directly from the
//! internal modules.

// Core queue component
pub use crate::queue::internal::HandoffQueue;

// Record types carried through the queue
pub use crate::queue::record::{Metric, MetricsRecord, MetricsTag, CONTEXT_TAG};

// Background consumer
pub use crate::queue::sink::{MetricsSink, RetryPolicy, SinkWorker};

// Error handling
pub use crate::queue::error::{QueueError, QueueResult, SinkError};
