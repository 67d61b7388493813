//! Internal HandoffQueue implementation
//!
//! This module provides the core queue functionality:
//! - Fixed-capacity ring buffer, no allocation on enqueue
//! - Non-blocking producers with a drop-newest overflow policy
//! - A single blocking consumer, enforced via an active-consumer marker
//! - Interrupt support to cancel a waiting drain without corrupting state

use crate::core::sync::handle_mutex_poison;
use crate::queue::error::{QueueError, QueueResult, SinkError};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Identity of the thread currently draining the queue.
#[derive(Debug)]
struct ActiveConsumer {
    id: ThreadId,
    name: Option<String>,
}

impl ActiveConsumer {
    fn current() -> Self {
        let current = thread::current();
        Self {
            id: current.id(),
            name: current.name().map(str::to_owned),
        }
    }

    fn describe(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{:?}", self.id),
        }
    }
}

/// Lock-protected queue state. Every mutation goes through this struct, so
/// the single mutex is the only synchronisation point.
#[derive(Debug)]
struct Inner<T> {
    /// Ring storage; a `None` slot holds no element
    slots: Box<[Option<T>]>,
    /// Index immediately behind the logical front
    head: usize,
    /// Index of the most recently inserted element
    tail: usize,
    /// Number of live elements
    count: usize,
    /// Thread currently draining the queue, if any
    active_consumer: Option<ActiveConsumer>,
    /// Pending cancellation for the current or next empty-queue wait
    interrupted: bool,
}

impl<T> Inner<T> {
    /// Remove and return the front element. Callers must hold `count > 0`,
    /// which the blocking drain contract guarantees.
    fn take_front(&mut self) -> T {
        assert!(self.count > 0, "removal from an empty handoff queue");
        self.count -= 1;
        self.head = (self.head + 1) % self.slots.len();
        self.slots[self.head]
            .take()
            .expect("occupied slot missing despite non-zero count")
    }
}

/// A half-blocking handoff queue: non-blocking for producers, blocking for
/// the single consumer.
///
/// New elements are dropped when the queue is full, preserving the earlier
/// elements captured at the onset of a filling event. Exactly one thread may
/// drain the queue at a time; a second concurrent drain attempt fails
/// immediately with [`QueueError::ConsumerBusy`] rather than blocking.
///
/// # Example
///
/// ```rust
/// use metrics_handoff::queue::HandoffQueue;
///
/// # fn example() -> Result<(), metrics_handoff::queue::QueueError> {
/// let queue = HandoffQueue::new(8);
///
/// assert!(queue.enqueue("sample")?);
/// assert_eq!(queue.dequeue()?, "sample");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HandoffQueue<T> {
    /// Fixed at construction; read without taking the lock
    capacity: usize,
    inner: Mutex<Inner<T>>,
    /// Signalled on every successful enqueue and on interrupt
    data_available: Condvar,
}

impl<T> HandoffQueue<T> {
    /// Create a queue with the given capacity.
    ///
    /// A requested capacity of zero is clamped to one; construction never
    /// fails.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(Inner {
                slots: (0..capacity).map(|_| None).collect(),
                head: 0,
                tail: 0,
                count: 0,
                active_consumer: None,
                interrupted: false,
            }),
            data_available: Condvar::new(),
        }
    }

    /// Insert an element at the back of the queue without blocking.
    ///
    /// Returns `Ok(false)` and discards the element when the queue is full.
    /// Safe to call from any number of producer threads.
    pub fn enqueue(&self, element: T) -> QueueResult<bool> {
        let mut inner = self.lock()?;
        if inner.count == self.capacity {
            return Ok(false);
        }
        inner.count += 1;
        inner.tail = (inner.tail + 1) % self.capacity;
        let tail = inner.tail;
        inner.slots[tail] = Some(element);
        // At most one consumer can be waiting, so one wakeup suffices
        self.data_available.notify_one();
        Ok(true)
    }

    /// Remove and return the front element, blocking while the queue is
    /// empty.
    ///
    /// Fails immediately with [`QueueError::ConsumerBusy`] when another
    /// thread is already draining, and with [`QueueError::Interrupted`] when
    /// [`interrupt`](Self::interrupt) cancels the wait.
    pub fn dequeue(&self) -> QueueResult<T> {
        let mut inner = self.wait_for_data()?;
        let element = inner.take_front();
        inner.active_consumer = None;
        Ok(element)
    }

    /// Hand the front element to `sink`, blocking while the queue is empty.
    ///
    /// The element is taken out under the lock and the callback runs with the
    /// lock released, so it may take arbitrarily long; it must not call back
    /// into the same queue. The element is gone whether or not the callback
    /// succeeds, and a callback failure surfaces as
    /// [`QueueError::SinkFailed`] after the active-consumer marker has been
    /// cleared.
    pub fn consume<F>(&self, mut sink: F) -> QueueResult<()>
    where
        F: FnMut(&T) -> Result<(), SinkError>,
    {
        let mut inner = self.wait_for_data()?;
        let _active = ActiveGuard { queue: self };
        let element = inner.take_front();
        drop(inner);
        sink(&element).map_err(|source| QueueError::SinkFailed { source })
    }

    /// Hand every element currently queued to `sink`, blocking while the
    /// queue is empty.
    ///
    /// The element count is captured once data is available and exactly that
    /// many elements are drained: elements enqueued while the callbacks run
    /// are left for a future pass, which keeps a sustained producer from
    /// pinning the consumer in this call forever. On a callback failure the
    /// error propagates after marker cleanup; elements already handed over
    /// stay removed and the rest stay queued.
    pub fn consume_all<F>(&self, mut sink: F) -> QueueResult<()>
    where
        F: FnMut(&T) -> Result<(), SinkError>,
    {
        let mut inner = self.wait_for_data()?;
        let _active = ActiveGuard { queue: self };
        let mut remaining = inner.count;
        loop {
            let element = inner.take_front();
            drop(inner);
            sink(&element).map_err(|source| QueueError::SinkFailed { source })?;
            remaining -= 1;
            if remaining == 0 {
                return Ok(());
            }
            inner = self.lock()?;
        }
    }

    /// Clone of the front element, or `None` when the queue is empty.
    pub fn front(&self) -> QueueResult<Option<T>>
    where
        T: Clone,
    {
        let inner = self.lock()?;
        if inner.count == 0 {
            return Ok(None);
        }
        Ok(inner.slots[(inner.head + 1) % self.capacity].clone())
    }

    /// Clone of the back element, or `None` when the queue is empty.
    pub fn back(&self) -> QueueResult<Option<T>>
    where
        T: Clone,
    {
        let inner = self.lock()?;
        if inner.count == 0 {
            return Ok(None);
        }
        Ok(inner.slots[inner.tail].clone())
    }

    /// Drop every queued element.
    ///
    /// Fails with [`QueueError::ConsumerBusy`] while a drain is in flight.
    /// The head and tail indices are realigned so the ring invariant holds
    /// for the next enqueue cycle.
    pub fn clear(&self) -> QueueResult<()> {
        let mut inner = self.lock()?;
        if let Some(active) = inner.active_consumer.as_ref() {
            return Err(QueueError::ConsumerBusy {
                owner: active.describe(),
            });
        }
        for slot in inner.slots.iter_mut() {
            *slot = None;
        }
        inner.count = 0;
        inner.head = inner.tail;
        Ok(())
    }

    /// Number of elements currently queued.
    pub fn size(&self) -> QueueResult<usize> {
        Ok(self.lock()?.count)
    }

    /// Whether the queue currently holds no elements.
    pub fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.lock()?.count == 0)
    }

    /// Fixed capacity set at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cancel a waiting drain.
    ///
    /// A drain blocked on an empty queue wakes up and returns
    /// [`QueueError::Interrupted`] with the queue untouched. When no drain is
    /// waiting the interrupt stays pending and cancels the next empty-queue
    /// wait instead; the flag is consumed by whichever drain observes it.
    pub fn interrupt(&self) -> QueueResult<()> {
        let mut inner = self.lock()?;
        inner.interrupted = true;
        self.data_available.notify_all();
        Ok(())
    }

    /// Block until at least one element is present, returning the guard with
    /// the active-consumer marker set and `count > 0`.
    ///
    /// Every exit path below either clears the marker itself (busy check
    /// fails before it is set, interrupt) or leaves clearing to the caller.
    fn wait_for_data(&self) -> QueueResult<MutexGuard<'_, Inner<T>>> {
        let mut inner = self.lock()?;
        if let Some(active) = inner.active_consumer.as_ref() {
            return Err(QueueError::ConsumerBusy {
                owner: active.describe(),
            });
        }
        inner.active_consumer = Some(ActiveConsumer::current());
        while inner.count == 0 {
            if inner.interrupted {
                inner.interrupted = false;
                inner.active_consumer = None;
                return Err(QueueError::Interrupted);
            }
            inner = handle_mutex_poison(self.data_available.wait(inner), |message| {
                QueueError::OperationFailed { message }
            })?;
        }
        Ok(inner)
    }

    fn lock(&self) -> QueueResult<MutexGuard<'_, Inner<T>>> {
        handle_mutex_poison(self.inner.lock(), |message| QueueError::OperationFailed {
            message,
        })
    }
}

/// Clears the active-consumer marker when a callback-driven drain unwinds,
/// whether by success, sink failure, or panic inside the callback.
struct ActiveGuard<'a, T> {
    queue: &'a HandoffQueue<T>,
}

impl<T> Drop for ActiveGuard<'_, T> {
    fn drop(&mut self) {
        // A poisoned lock here means the queue is already unusable; the
        // marker no longer matters.
        if let Ok(mut inner) = self.queue.inner.lock() {
            inner.active_consumer = None;
        }
    }
}
