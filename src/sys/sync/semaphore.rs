// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Counting semaphore support.
//!
//! A thin wrapper around the backend's native counting semaphore, which is
//! the one primitive every supported kernel has in some form.  Note that
//! giving a semaphore that is already at its maximum count discards the
//! give; where exact counting matters, size the maximum accordingly.

use core::fmt;

use crate::error::{Error, Result};
use crate::port::Kernel;
use crate::time::Timeout;

/// A counting semaphore backed by the kernel's native object.
///
/// Created with a count of zero: a take can only succeed once somebody has
/// given.  The count is bounded by `max_count` and never goes negative.
pub struct Semaphore<K: Kernel> {
    item: K::Semaphore,
}

impl<K: Kernel> Semaphore<K> {
    /// Create a semaphore with a count of zero and the given maximum.
    ///
    /// `max_count` must be non-zero.
    pub fn new(max_count: u32) -> Result<Self> {
        if max_count == 0 {
            return Err(Error::InvalidParameter);
        }
        Ok(Semaphore {
            item: K::semaphore_create(0, max_count)?,
        })
    }

    /// Take the semaphore.
    ///
    /// Returns `true` once the count was decremented, `false` when the
    /// timeout elapsed first.  Timing out is a normal outcome, not an
    /// error.  Can be called from ISR context with [`NoWait`].
    ///
    /// [`NoWait`]: crate::time::NoWait
    pub fn take<T>(&self, timeout: T) -> bool
    where
        T: Into<Timeout>,
    {
        let timeout: Timeout = timeout.into();
        K::semaphore_take(&self.item, timeout.classify(K::TICK_HZ))
    }

    /// Give the semaphore.
    ///
    /// This routine gives to the semaphore, unless it is already at its
    /// maximum permitted count, in which case the give is discarded.
    pub fn give(&self) {
        K::semaphore_give(&self.item)
    }

    /// Give the semaphore from interrupt context.
    ///
    /// Returns `true` when the give woke a task that should preempt the
    /// interrupted one; the caller requests the reschedule when the
    /// interrupt returns, the scheduler is not invoked here.
    pub fn give_from_isr(&self) -> bool {
        K::semaphore_give_from_isr(&self.item)
    }
}

impl<K: Kernel> fmt::Debug for Semaphore<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sys::Semaphore")
    }
}
