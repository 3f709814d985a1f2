//! Shared utilities: logging setup and small synchronization helpers.

mod logger;

pub use logger::init_logging;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a panicking thread poisoned it.
///
/// The state behind every crate-internal mutex stays consistent across a
/// relay-thread panic, so continuing with the recovered guard is safe.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
