//! Poison recovery for the std locks guarding store state
//!
//! A panic inside a change listener or transform must not wedge the store, so
//! every lock in the crate goes through these helpers. The guarded data is
//! always a complete value (never half-written), which makes recovery sound.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Extension trait for Mutex with poison recovery
pub(crate) trait MutexExt<T> {
    /// Lock the mutex, recovering from poison errors
    fn lock_recovered(&self) -> MutexGuard<'_, T>;
}

/// Extension trait for RwLock with poison recovery
pub(crate) trait RwLockExt<T> {
    fn read_recovered(&self) -> RwLockReadGuard<'_, T>;

    fn write_recovered(&self) -> RwLockWriteGuard<'_, T>;
}

impl<T> MutexExt<T> for Mutex<T> {
    fn lock_recovered(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|poisoned| {
            log::warn!("Mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl<T> RwLockExt<T> for RwLock<T> {
    fn read_recovered(&self) -> RwLockReadGuard<'_, T> {
        self.read().unwrap_or_else(|poisoned| {
            log::warn!("RwLock was poisoned (read), recovering");
            poisoned.into_inner()
        })
    }

    fn write_recovered(&self) -> RwLockWriteGuard<'_, T> {
        self.write().unwrap_or_else(|poisoned| {
            log::warn!("RwLock was poisoned (write), recovering");
            poisoned.into_inner()
        })
    }
}
