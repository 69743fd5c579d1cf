// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared plumbing for backends that model tasks as OS threads.
//!
//! OS threads cannot be killed from outside, so deletion is cooperative: a
//! per-task cancel flag is honored at the suspension points this layer
//! controls (sleep and yield).  A flagged task leaves by unwinding with a
//! private payload that the entry wrapper recognizes and swallows, so
//! deliberate termination is not reported as a panic.

use std::cell::RefCell;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex as StdMutex, OnceLock, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration as StdDuration, Instant as StdInstant};

use portable_atomic::{AtomicBool, Ordering};

/// Panic payload marking deliberate task termination.
pub(crate) struct TaskExit;

thread_local! {
    static CURRENT: RefCell<Option<Arc<AtomicBool>>> = const { RefCell::new(None) };
}

/// Granularity at which a sleeping task notices its cancel flag.
const CANCEL_POLL: StdDuration = StdDuration::from_millis(10);

/// Run a task body with the cancel flag installed for the calling thread.
///
/// `on_exit` runs after the body on every path out, including cancellation
/// and panic, and is where the backend clears its bookkeeping for the task.
pub(crate) fn run_task<F>(name: &str, cancel: Arc<AtomicBool>, on_exit: impl FnOnce(), body: F)
where
    F: FnOnce(),
{
    CURRENT.with(|c| *c.borrow_mut() = Some(cancel.clone()));
    if !cancel.load(Ordering::Acquire) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(body)) {
            if !payload.is::<TaskExit>() {
                log::error!("task '{}' panicked", name);
            }
        }
    }
    CURRENT.with(|c| *c.borrow_mut() = None);
    on_exit();
}

/// Terminate the calling task.
///
/// Raised with `resume_unwind` so the panic hook does not fire for a
/// deliberate exit.  Only meaningful on a thread running under
/// [`run_task`]; elsewhere the unwind escapes as an ordinary panic.
pub(crate) fn exit_task() -> ! {
    panic::resume_unwind(Box::new(TaskExit))
}

fn cancelled() -> bool {
    CURRENT.with(|c| {
        c.borrow()
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    })
}

/// Sleep for `duration`, leaving early (by terminating the task) if the
/// task is deleted while it sleeps.
pub(crate) fn sleep_cancellable(duration: StdDuration) {
    let deadline = StdInstant::now() + duration;
    loop {
        if cancelled() {
            exit_task();
        }
        let now = StdInstant::now();
        if now >= deadline {
            return;
        }
        thread::sleep((deadline - now).min(CANCEL_POLL));
    }
}

/// Yield the time slice, honoring a pending deletion first.
pub(crate) fn yield_cancellable() {
    if cancelled() {
        exit_task();
    }
    thread::yield_now();
}

/// The opaque task argument, made movable into the spawned thread.
pub(crate) struct SendPtr(pub *mut c_void);

// SAFETY: the pointer itself is plain data; what it refers to is governed
// by the caller contract on task creation.
unsafe impl Send for SendPtr {}

/// Process start instant; tick counters measure from here.
pub(crate) fn epoch() -> StdInstant {
    static EPOCH: OnceLock<StdInstant> = OnceLock::new();
    *EPOCH.get_or_init(StdInstant::now)
}

/// A nesting, process-wide preemption bracket.
///
/// On a host this cannot stop the OS scheduler; it mutually excludes other
/// holders of the same bracket, which is all its sanctioned use (the heap
/// wrap) requires.
pub(crate) struct SchedGate {
    state: StdMutex<GateState>,
    released: Condvar,
}

struct GateState {
    owner: Option<ThreadId>,
    depth: u32,
}

impl SchedGate {
    /// A released gate.
    pub(crate) const fn new() -> Self {
        SchedGate {
            state: StdMutex::new(GateState {
                owner: None,
                depth: 0,
            }),
            released: Condvar::new(),
        }
    }

    /// Take or re-enter the bracket.
    pub(crate) fn lock(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.owner == Some(me) {
            state.depth += 1;
            return;
        }
        while state.owner.is_some() {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.owner = Some(me);
        state.depth = 1;
    }

    /// Leave one nesting level of the bracket.
    pub(crate) fn unlock(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.owner != Some(me) {
            // Unbalanced resume; tolerated, like releasing a free slot.
            return;
        }
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            self.released.notify_all();
        }
    }
}
