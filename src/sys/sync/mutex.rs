// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Mutex support.
//!
//! A thin wrapper around the backend's native mutex (or its binary
//! semaphore, on kernels without a distinct mutex type).  This layer
//! neither adds nor removes recursion and priority inheritance: whatever
//! the backend provides is inherited, and documented per backend.
//!
//! Lock and unlock are separate calls here, matching the narrowest common
//! shape across kernels.  For an RAII guard that also owns the protected
//! data, see [`crate::sync::Mutex`].  Locking from interrupt context is a
//! programming error and is not checked at run time.

use core::fmt;

use crate::error::Result;
use crate::port::Kernel;
use crate::time::Wait;

/// An ownership token backed by the kernel's native object.
///
/// Created in the released state.
pub struct Mutex<K: Kernel> {
    item: K::Mutex,
}

impl<K: Kernel> Mutex<K> {
    /// Create a mutex in the released state.
    pub fn new() -> Result<Self> {
        Ok(Mutex {
            item: K::mutex_create()?,
        })
    }

    /// Acquire ownership, blocking as long as necessary.
    pub fn lock(&self) {
        // An unbounded lock cannot time out.
        let _ = K::mutex_lock(&self.item, Wait::Forever);
    }

    /// Try to acquire ownership without blocking.
    ///
    /// Returns `true` when the mutex was acquired.
    pub fn try_lock(&self) -> bool {
        K::mutex_lock(&self.item, Wait::Immediate)
    }

    /// Hand ownership back.
    ///
    /// Must be called by the task that holds the mutex; unlocking a mutex
    /// held by somebody else is a logic error with a backend-defined
    /// outcome.
    pub fn unlock(&self) {
        K::mutex_unlock(&self.item)
    }
}

impl<K: Kernel> fmt::Debug for Mutex<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sys::Mutex")
    }
}
