// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Higher level Mutex type and friends.
//!
//! Modeled after
//! [`std::sync::Mutex`](https://doc.rust-lang.org/stable/std/sync/struct.Mutex.html),
//! built over the portable [`sys::sync::Mutex`] of the active backend.
//! There is no poisoning: the port layer has no way to observe a panic in
//! every backend, so the `LockResult` alias never carries an error today.
//!
//! [`sys::sync::Mutex`]: crate::sys::sync::Mutex

use core::{
    cell::UnsafeCell,
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

use crate::error::Result as PortResult;
use crate::port::Active;
use crate::sys::sync as sys;

/// Until poisoning is implemented, mutexes never return an error, and we
/// just get back the guard.
pub type LockResult<Guard> = Result<Guard, ()>;

/// The return type from [`Mutex::try_lock`].
pub type TryLockResult<Guard> = Result<Guard, TryLockError>;

/// An enumeration of possible errors associated with a
/// [`TryLockResult`].
pub enum TryLockError {
    /// The lock could not be acquired at this time because the operation
    /// would otherwise block.
    WouldBlock,
}

/// A mutual exclusion primitive useful for protecting shared data.
///
/// This mutex will block tasks waiting for the lock to become available.
/// Unlike the `sys` mutex it owns the protected value, and access only
/// exists through the RAII guard, so the data cannot be reached without
/// holding the lock.
pub struct Mutex<T: ?Sized> {
    inner: sys::Mutex<Active>,
    data: UnsafeCell<T>,
}

// The guard returns the data only while the inner mutex is held, so
// sharing the Mutex is safe whenever the data itself may move between
// tasks.
unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}

impl<T> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mutex {:?}", self.inner)
    }
}

/// An RAII implementation of a "scoped lock" of a mutex.  When this
/// structure is dropped (falls out of scope), the lock will be unlocked.
///
/// The data protected by the mutex can be accessed through this guard via
/// its [`Deref`] and [`DerefMut`] implementations.
pub struct MutexGuard<'a, T: ?Sized + 'a> {
    lock: &'a Mutex<T>,
    // Until negative trait bounds exist, mark unsend with a phantom
    // unsafe cell.
    _nosend: PhantomData<UnsafeCell<()>>,
}

unsafe impl<T: ?Sized + Sync> Sync for MutexGuard<'_, T> {}

impl<T> Mutex<T> {
    /// Construct a new Mutex protecting `t`.
    ///
    /// Fails only if the backend cannot create the native object.
    pub fn new(t: T) -> PortResult<Mutex<T>> {
        Ok(Mutex {
            inner: sys::Mutex::new()?,
            data: UnsafeCell::new(t),
        })
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Acquires a mutex, blocking the current task until it is able to do
    /// so.
    ///
    /// Whether a task may acquire a mutex it already holds depends on the
    /// backend; on backends without recursive mutexes this deadlocks.
    // TODO: poisoning needs a portable way to observe a panic in the
    // holding task; until then lock always hands the guard back.
    pub fn lock(&self) -> LockResult<MutexGuard<'_, T>> {
        self.inner.lock();
        Ok(MutexGuard {
            lock: self,
            _nosend: PhantomData,
        })
    }

    /// Attempts to acquire this lock without blocking.
    pub fn try_lock(&self) -> TryLockResult<MutexGuard<'_, T>> {
        if self.inner.try_lock() {
            Ok(MutexGuard {
                lock: self,
                _nosend: PhantomData,
            })
        } else {
            Err(TryLockError::WouldBlock)
        }
    }
}

impl<T: ?Sized> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        self.lock.inner.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_gives_access_and_releases_on_drop() {
        let m = Mutex::new(1u32).unwrap();
        {
            let mut guard = m.lock().unwrap();
            *guard += 1;
        }
        assert_eq!(*m.lock().unwrap(), 2);
    }

    #[test]
    fn try_lock_fails_while_held() {
        let m = Mutex::new(()).unwrap();
        let guard = m.lock().unwrap();
        assert!(matches!(m.try_lock(), Err(TryLockError::WouldBlock)));
        drop(guard);
        assert!(m.try_lock().is_ok());
    }
}
