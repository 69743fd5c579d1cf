// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Portable front door to the kernel.
//!
//! The types in this module are thin wrappers over the [`Kernel`]
//! capability surface: they add the timeout classification and the
//! portable contract, and otherwise stay as close to the backend as
//! possible.  Higher-level, Rust-flavored interfaces live in
//! [`crate::sync`].
//!
//! The free functions here are bound to the active backend; with no
//! `port-*` feature enabled, use the generic forms on the wrapper types or
//! the [`Kernel`] trait directly.
//!
//! [`Kernel`]: crate::port::Kernel

pub mod sync;
pub mod thread;

#[cfg(any(feature = "port-hosted", feature = "port-sim"))]
mod active {
    use crate::port::{Active, Kernel};
    use crate::time::{ticks_to_ms, Instant};

    /// Elapsed milliseconds since kernel start, truncated to 32 bits.
    ///
    /// Wraps after about 49.7 days; callers that compare times across the
    /// wrap should use [`uptime_get64`].
    pub fn uptime_get() -> u32 {
        uptime_get64() as u32
    }

    /// Elapsed milliseconds since kernel start.
    pub fn uptime_get64() -> u64 {
        ticks_to_ms(Active::tick_count(), Active::TICK_HZ)
    }

    /// The current uptime as a monotonic instant.
    pub fn now() -> Instant {
        Instant::from_ticks(uptime_get64())
    }

    /// Suspend preemption process-wide.
    ///
    /// Nests; every call needs a matching [`resume_all_tasks`].  Hold the
    /// bracket for the shortest possible interval; its sanctioned use in
    /// this crate is wrapping the process heap (see [`crate::heap`]).
    pub fn suspend_all_tasks() {
        Active::sched_lock();
    }

    /// Undo one level of [`suspend_all_tasks`].
    pub fn resume_all_tasks() {
        Active::sched_unlock();
    }
}

#[cfg(any(feature = "port-hosted", feature = "port-sim"))]
pub use active::{now, resume_all_tasks, suspend_all_tasks, uptime_get, uptime_get64};
