//! Background sink worker
//!
//! The queue itself never logs or retries; this module is the single
//! background consumer the queue was built for. A [`SinkWorker`] owns a named
//! OS thread that repeatedly drains the queue into a caller-supplied
//! [`MetricsSink`], retrying transient sink failures with a bounded policy and
//! shutting down cleanly on request.

use crate::queue::error::{QueueError, QueueResult, SinkError};
use crate::queue::internal::HandoffQueue;
use crate::queue::record::MetricsRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Destination for drained metrics records.
///
/// Implementations run on the worker thread, so they may block; the queue
/// lock is never held while `put` runs. A sink must not touch the queue it is
/// being fed from.
pub trait MetricsSink: Send + 'static {
    /// Deliver one record.
    fn put(&mut self, record: &MetricsRecord) -> Result<(), SinkError>;

    /// Called after each successfully drained batch.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Retry policy for consecutive sink failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Handle to the background drain thread
///
/// Dropping the handle stops the worker; [`SinkWorker::stop`] does the same
/// explicitly. Records still queued when the worker stops stay in the queue.
///
/// # Example
///
/// ```rust,no_run
/// use metrics_handoff::queue::{HandoffQueue, MetricsRecord, MetricsSink, RetryPolicy, SinkError, SinkWorker};
/// use std::sync::Arc;
///
/// struct StdoutSink;
///
/// impl MetricsSink for StdoutSink {
///     fn put(&mut self, record: &MetricsRecord) -> Result<(), SinkError> {
///         println!("{}/{}", record.context, record.name);
///         Ok(())
///     }
/// }
///
/// # fn example() -> Result<(), metrics_handoff::queue::QueueError> {
/// let queue = Arc::new(HandoffQueue::new(128));
/// let worker = SinkWorker::start("stdout-sink", Arc::clone(&queue), StdoutSink, RetryPolicy::default())?;
///
/// queue.enqueue(MetricsRecord::new("rpc", "request_stats"))?;
/// worker.stop();
/// # Ok(())
/// # }
/// ```
pub struct SinkWorker {
    name: String,
    queue: Arc<HandoffQueue<MetricsRecord>>,
    stopping: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SinkWorker {
    /// Spawn the drain thread for `sink`.
    pub fn start<S: MetricsSink>(
        name: impl Into<String>,
        queue: Arc<HandoffQueue<MetricsRecord>>,
        sink: S,
        policy: RetryPolicy,
    ) -> QueueResult<Self> {
        let name = name.into();
        let stopping = Arc::new(AtomicBool::new(false));

        let worker_queue = Arc::clone(&queue);
        let worker_stopping = Arc::clone(&stopping);
        let worker_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || drain_loop(worker_name, worker_queue, worker_stopping, sink, policy))
            .map_err(|error| QueueError::OperationFailed {
                message: format!("failed to spawn sink worker thread: {}", error),
            })?;

        Ok(Self {
            name,
            queue,
            stopping,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop the worker and wait for its thread to exit.
    ///
    /// A drain pass already in flight finishes its snapshot first.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stopping.store(true, Ordering::SeqCst);
        if let Err(error) = self.queue.interrupt() {
            log::warn!("could not interrupt queue for sink worker '{}': {}", self.name, error);
        }
        if handle.join().is_err() {
            log::error!("sink worker '{}' panicked", self.name);
        }
    }
}

impl Drop for SinkWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn drain_loop<S: MetricsSink>(
    name: String,
    queue: Arc<HandoffQueue<MetricsRecord>>,
    stopping: Arc<AtomicBool>,
    mut sink: S,
    policy: RetryPolicy,
) {
    let mut failures = 0usize;

    while !stopping.load(Ordering::SeqCst) {
        match queue.consume_all(|record| sink.put(record)) {
            Ok(()) => {
                failures = 0;
                if let Err(error) = sink.flush() {
                    log::warn!("sink '{}' flush failed: {}", name, error);
                }
            }
            Err(QueueError::Interrupted) => {
                // An interrupt without a stop request is not ours to act on
                if stopping.load(Ordering::SeqCst) {
                    break;
                }
                log::debug!("sink worker '{}' ignoring interrupt without stop request", name);
            }
            Err(QueueError::SinkFailed { source }) => {
                failures += 1;
                if failures >= policy.max_attempts {
                    log::error!(
                        "sink '{}' failed {} consecutive times, giving up: {}",
                        name,
                        failures,
                        source
                    );
                    return;
                }
                log::warn!(
                    "sink '{}' failed on attempt {}/{}, retrying in {:?}: {}",
                    name,
                    failures,
                    policy.max_attempts,
                    policy.delay,
                    source
                );
                thread::sleep(policy.delay);
            }
            Err(error) => {
                log::error!("sink worker '{}' cannot use the queue: {}", name, error);
                return;
            }
        }
    }
    log::debug!("sink worker '{}' stopped", name);
}
