//! Synchronization utilities for robust mutex handling
//!
//! The queue never unwraps a lock result: a poisoned mutex (a panic in some
//! other lock holder) is converted into an application error and surfaced to
//! the caller like any other failure.

use std::sync::LockResult;

/// Convert a poisoned lock result into a caller-chosen error.
///
/// Works for both `Mutex::lock` and `Condvar::wait` results, which share the
/// `LockResult` shape.
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use metrics_handoff::core::sync::handle_mutex_poison;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(mutex.lock(), |message| message).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "internal synchronisation error (mutex poisoned by a panic while the lock was held): {:?}",
            poison_err
        ))
    })
}
