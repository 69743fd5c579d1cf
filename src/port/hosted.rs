// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hosted backend: kernel objects mapped onto the operating system's
//! threads and synchronization primitives.
//!
//! This is the port used on development machines.  Objects are
//! handle-shaped (the caller owns the object, no identifier table is
//! involved), the native event is a real auto-reset primitive, task
//! identifiers are OS thread ids, and the tick is one millisecond.
//!
//! Behavior inherited from the host, rather than guaranteed by this layer:
//!
//! - priorities are accepted but the OS scheduling policy decides; there is
//!   no strict priority preemption to inherit.
//! - a caller-supplied stack buffer only sizes the thread.  OS threads
//!   cannot adopt foreign storage, so the buffer itself stays unused.
//! - foreign deletion is cooperative: it takes effect at the target's next
//!   sleep or yield, not in the middle of arbitrary code.
//! - the scheduler bracket mutually excludes other holders of the bracket;
//!   a hosted process cannot actually stop the OS scheduler.

use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::{Arc, Condvar, Mutex as StdMutex, OnceLock, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration as StdDuration, Instant as StdInstant};

use portable_atomic::{AtomicBool, Ordering};

use super::{heap_layout, host, Kernel, TaskSpec};
use crate::error::{Error, Result};
use crate::time::{Tick, Wait};

/// The hosted kernel backend.
pub struct HostedKernel;

fn ticks_to_std(ticks: Tick) -> StdDuration {
    // One tick is one millisecond on this port.
    StdDuration::from_millis(ticks)
}

/// A counting semaphore: count and limit behind a lock, takers parked on a
/// condition variable.
pub struct Semaphore {
    state: StdMutex<SemState>,
    takers: Condvar,
}

struct SemState {
    count: u32,
    max: u32,
}

impl Semaphore {
    fn take(&self, wait: Wait) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match wait {
            Wait::Immediate => {
                if state.count > 0 {
                    state.count -= 1;
                    true
                } else {
                    false
                }
            }
            Wait::Forever => {
                while state.count == 0 {
                    state = self
                        .takers
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                state.count -= 1;
                true
            }
            Wait::Ticks(ticks) => {
                let deadline = StdInstant::now() + ticks_to_std(ticks);
                while state.count == 0 {
                    let now = StdInstant::now();
                    if now >= deadline {
                        return false;
                    }
                    let (guard, _) = self
                        .takers
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    state = guard;
                }
                state.count -= 1;
                true
            }
        }
    }

    fn give(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.count < state.max {
            state.count += 1;
            self.takers.notify_one();
        }
        // At the limit the give is discarded.
    }
}

/// A native auto-reset event: a signaled flag consumed by exactly one
/// waiter.
pub struct Event {
    signaled: StdMutex<bool>,
    waiters: Condvar,
}

impl Event {
    fn wait(&self, wait: Wait) -> bool {
        let mut signaled = self.signaled.lock().unwrap_or_else(PoisonError::into_inner);
        match wait {
            Wait::Immediate => {
                let was = *signaled;
                *signaled = false;
                was
            }
            Wait::Forever => {
                while !*signaled {
                    signaled = self
                        .waiters
                        .wait(signaled)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                *signaled = false;
                true
            }
            Wait::Ticks(ticks) => {
                let deadline = StdInstant::now() + ticks_to_std(ticks);
                while !*signaled {
                    let now = StdInstant::now();
                    if now >= deadline {
                        return false;
                    }
                    let (guard, _) = self
                        .waiters
                        .wait_timeout(signaled, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    signaled = guard;
                }
                *signaled = false;
                true
            }
        }
    }

    fn set(&self) {
        *self.signaled.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.waiters.notify_one();
    }

    fn reset(&self) {
        *self.signaled.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

/// An ownership token.  Lock and unlock are separate calls at this layer,
/// so the token lives behind its own lock and condition variable instead
/// of an RAII guard.
pub struct Mutex {
    held: StdMutex<bool>,
    waiters: Condvar,
}

impl Mutex {
    fn lock(&self, wait: Wait) -> bool {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        match wait {
            Wait::Immediate => {
                if *held {
                    false
                } else {
                    *held = true;
                    true
                }
            }
            Wait::Forever => {
                while *held {
                    held = self
                        .waiters
                        .wait(held)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                *held = true;
                true
            }
            Wait::Ticks(ticks) => {
                let deadline = StdInstant::now() + ticks_to_std(ticks);
                while *held {
                    let now = StdInstant::now();
                    if now >= deadline {
                        return false;
                    }
                    let (guard, _) = self
                        .waiters
                        .wait_timeout(held, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    held = guard;
                }
                *held = true;
                true
            }
        }
    }

    fn unlock(&self) {
        *self.held.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.waiters.notify_one();
    }
}

// --- task registry ---

fn tasks() -> &'static StdMutex<HashMap<ThreadId, Arc<AtomicBool>>> {
    static TASKS: OnceLock<StdMutex<HashMap<ThreadId, Arc<AtomicBool>>>> = OnceLock::new();
    TASKS.get_or_init(|| StdMutex::new(HashMap::new()))
}

fn register_current(cancel: &Arc<AtomicBool>) {
    let id = thread::current().id();
    let mut map = tasks().lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = map.insert(id, cancel.clone()) {
        // A deletion raced ahead of registration; honor it.
        if existing.load(Ordering::Acquire) {
            cancel.store(true, Ordering::Release);
        }
    }
}

fn unregister_current() {
    let id = thread::current().id();
    tasks()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&id);
}

static SCHED_GATE: host::SchedGate = host::SchedGate::new();

impl Kernel for HostedKernel {
    const TICK_HZ: u32 = 1000;

    type Semaphore = Semaphore;
    type Event = Event;
    type Mutex = Mutex;
    type TaskId = ThreadId;

    fn semaphore_create(initial: u32, max: u32) -> Result<Semaphore> {
        if max == 0 || initial > max {
            return Err(Error::InvalidParameter);
        }
        Ok(Semaphore {
            state: StdMutex::new(SemState {
                count: initial,
                max,
            }),
            takers: Condvar::new(),
        })
    }

    fn semaphore_take(sem: &Semaphore, wait: Wait) -> bool {
        sem.take(wait)
    }

    fn semaphore_give(sem: &Semaphore) {
        sem.give();
    }

    fn semaphore_give_from_isr(sem: &Semaphore) -> bool {
        // A hosted target has no interrupt context; the reschedule hint is
        // never needed.
        sem.give();
        false
    }

    fn event_create() -> Result<Event> {
        Ok(Event {
            signaled: StdMutex::new(false),
            waiters: Condvar::new(),
        })
    }

    fn event_set(event: &Event) {
        event.set();
    }

    fn event_set_from_isr(event: &Event) -> bool {
        event.set();
        false
    }

    fn event_reset(event: &Event) {
        event.reset();
    }

    fn event_wait(event: &Event, wait: Wait) -> bool {
        event.wait(wait)
    }

    fn mutex_create() -> Result<Mutex> {
        Ok(Mutex {
            held: StdMutex::new(false),
            waiters: Condvar::new(),
        })
    }

    fn mutex_lock(mutex: &Mutex, wait: Wait) -> bool {
        mutex.lock(wait)
    }

    fn mutex_unlock(mutex: &Mutex) {
        mutex.unlock();
    }

    fn task_create(spec: TaskSpec<'_>) -> Result<ThreadId> {
        let stack_size = match &spec.stack {
            Some(buffer) => buffer.len(),
            None => spec.stack_size,
        };
        if stack_size == 0 {
            return Err(Error::InvalidParameter);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let entry = spec.entry;
        let arg = host::SendPtr(spec.arg);
        let name = spec.name.to_string();
        let handle = thread::Builder::new()
            .name(spec.name.to_string())
            .stack_size(stack_size)
            .spawn(move || {
                register_current(&cancel);
                host::run_task(&name, cancel.clone(), unregister_current, move || {
                    let arg = arg;
                    entry(arg.0)
                });
            })
            .map_err(|_| Error::OutOfMemory)?;
        let id = handle.thread().id();
        log::debug!("task '{}' started", spec.name);
        Ok(id)
    }

    fn task_delete(id: ThreadId) {
        log::trace!("deleting task {:?}", id);
        tasks()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_insert_with(|| Arc::new(AtomicBool::new(false)))
            .store(true, Ordering::Release);
    }

    fn task_exit() -> ! {
        host::exit_task()
    }

    fn task_yield() {
        host::yield_cancellable();
    }

    fn task_sleep(ticks: Tick) {
        host::sleep_cancellable(ticks_to_std(ticks));
    }

    fn sched_lock() {
        SCHED_GATE.lock();
    }

    fn sched_unlock() {
        SCHED_GATE.unlock();
    }

    fn tick_count() -> Tick {
        host::epoch().elapsed().as_millis() as Tick
    }

    // The host heap is reentrant; skip the scheduler bracket.
    fn mem_alloc(size: usize) -> Option<NonNull<u8>> {
        let layout = heap_layout(size)?;
        // SAFETY: layout has non-zero size.
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    fn mem_free(ptr: NonNull<u8>, size: usize) {
        let Some(layout) = heap_layout(size) else {
            return;
        };
        // SAFETY: the pointer came from mem_alloc with this layout.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
    }
}
