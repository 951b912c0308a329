//! Poison-tolerant lock access for aggregate state.
//!
//! Aggregate critical sections only read or replace plain fields, so a
//! panic while a guard was held cannot leave the state half-written. The
//! inner guard is therefore recovered instead of propagating the poison.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquires a shared guard.
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Acquires an exclusive guard.
pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
