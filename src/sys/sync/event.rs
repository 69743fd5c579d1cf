// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Auto-reset event support.
//!
//! An event is a binary signal: one producer sets it, one waiter consumes
//! it.  The consumption is the defining property: a wait that observes
//! the signaled state drains the event back to nonsignaled before
//! returning, so a signal that already satisfied a waiter can never be
//! observed again.  Backends with a native auto-reset primitive get this
//! from the kernel; the others emulate it over a counting semaphore with
//! the drain loop in [`sem_event`](crate::port::sem_event).
//!
//! The drain makes the event single-consumer: give each waiting task its
//! own event rather than sharing one event between several waiters.

use core::fmt;

use crate::error::Result;
use crate::port::Kernel;
use crate::time::Timeout;

/// A binary auto-reset signal backed by the kernel's native object.
///
/// Created in the nonsignaled state.
pub struct Event<K: Kernel> {
    item: K::Event,
}

impl<K: Kernel> Event<K> {
    /// Create an event in the nonsignaled state.
    pub fn new() -> Result<Self> {
        Ok(Event {
            item: K::event_create()?,
        })
    }

    /// Move the event to the signaled state, releasing one waiter.
    pub fn set(&self) {
        K::event_set(&self.item)
    }

    /// Signal the event from interrupt context.
    ///
    /// Returns `true` when the signal woke a task that should preempt the
    /// interrupted one; the caller requests the reschedule when the
    /// interrupt returns, the scheduler is not invoked here.
    pub fn set_from_isr(&self) -> bool {
        K::event_set_from_isr(&self.item)
    }

    /// Force the event to the nonsignaled state, whatever it was.
    pub fn reset(&self) {
        K::event_reset(&self.item)
    }

    /// Wait until the event is signaled.
    ///
    /// On success the event is drained back to nonsignaled before this
    /// returns, so one wait consumes exactly one signal.  Returns `false`
    /// when the timeout elapsed first; that is a normal outcome, not an
    /// error.
    pub fn wait<T>(&self, timeout: T) -> bool
    where
        T: Into<Timeout>,
    {
        let timeout: Timeout = timeout.into();
        K::event_wait(&self.item, timeout.classify(K::TICK_HZ))
    }
}

impl<K: Kernel> fmt::Debug for Event<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sys::Event")
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::port::mock::MockKernel;
    use crate::time::{Duration, NoWait};

    #[test]
    fn one_wait_consumes_one_signal() {
        let event = Event::<MockKernel>::new().unwrap();
        event.set();
        assert!(event.wait(NoWait));
        assert!(!event.wait(NoWait));
    }

    #[test]
    fn stacked_signals_do_not_leak_into_the_next_wait() {
        let event = Event::<MockKernel>::new().unwrap();
        event.set();
        event.set();
        event.set();
        assert!(event.wait(NoWait));
        // The emulation drained every pending signal.
        assert!(!event.wait(NoWait));
    }

    #[test]
    fn reset_is_unconditional() {
        let event = Event::<MockKernel>::new().unwrap();
        event.reset();
        event.set();
        event.reset();
        assert!(!event.wait(NoWait));
    }

    #[test]
    fn set_from_isr_signals_without_a_reschedule_hint_here() {
        let event = Event::<MockKernel>::new().unwrap();
        let _ = event.set_from_isr();
        assert!(event.wait(NoWait));
    }

    #[test]
    fn bounded_wait_observes_a_signal_strictly_before_the_bound() {
        let event = Event::<MockKernel>::new().unwrap();
        event.item.script_signal_after(1);
        assert!(event.wait(Duration::millis(50)));
        event.item.script_signal_after(7);
        assert!(!event.wait(Duration::millis(50)));
    }
}
