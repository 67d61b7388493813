//! Bounded Handoff Queue Component
//!
//! A half-blocking queue that decouples metric producers from metric sinks:
//! producers enqueue snapshots without ever blocking, while a single
//! background consumer drains the queue and blocks when it is empty.
//!
//! # Overview
//!
//! Key properties:
//!
//! - **Non-blocking producers**: `enqueue` returns immediately; when the
//!   queue is full, new elements are dropped so the earlier elements captured
//!   at the onset of a filling event survive
//! - **Single blocking consumer**: drain operations suspend on an empty queue
//!   and at most one drain runs at a time, enforced via a thread-identity
//!   marker
//! - **Snapshot drains**: `consume_all` processes exactly the elements
//!   present when data became available, so a sustained producer cannot pin
//!   the consumer
//! - **Cancellation**: `interrupt` unblocks a waiting drain with a distinct
//!   error and leaves the queue state untouched
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Producer A  │     │  Producer B  │     │  Producer C  │
//! └──────┬───────┘     └──────┬───────┘     └──────┬───────┘
//!        │ enqueue            │ enqueue            │ enqueue   (never blocks)
//!        ▼                    ▼                    ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                  HandoffQueue (fixed ring)              │
//! │        ┌───┬───┬───┬───┬───┬───┬───┬───┐               │
//! │        │ 1 │ 2 │ 3 │ 4 │   │   │   │   │  drop on full │
//! │        └───┴───┴───┴───┴───┴───┴───┴───┘               │
//! └────────────────────────────┬────────────────────────────┘
//!                              │ dequeue / consume / consume_all
//!                              ▼               (blocks when empty)
//!                      ┌───────────────┐
//!                      │  SinkWorker   │  (single active consumer)
//!                      └───────┬───────┘
//!                              ▼
//!                      ┌───────────────┐
//!                      │  MetricsSink  │
//!                      └───────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use metrics_handoff::queue::{HandoffQueue, MetricsRecord};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), metrics_handoff::queue::QueueError> {
//! let queue = Arc::new(HandoffQueue::new(128));
//!
//! // Producer side: fire and forget
//! let accepted = queue.enqueue(MetricsRecord::new("rpc", "request_stats"))?;
//! assert!(accepted);
//!
//! // Consumer side: drain everything currently queued
//! queue.consume_all(|record| {
//!     println!("{}/{}", record.context, record.name);
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

mod error;
mod internal;
mod record;
mod sink;

pub mod api;

pub use error::{QueueError, QueueResult, SinkError};
pub use internal::HandoffQueue;
pub use record::{Metric, MetricsRecord, MetricsTag, CONTEXT_TAG};
pub use sink::{MetricsSink, RetryPolicy, SinkWorker};

#[cfg(test)]
mod tests;
