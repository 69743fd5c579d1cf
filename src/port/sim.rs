// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Slot-indexed simulation backend.
//!
//! Models the class of kernels that never return object handles: the
//! platform provides a pre-sized semaphore table, and every call names its
//! object by slot index.  The backend keeps an [`IdAllocator`] in front of
//! the table, mutexes are binary semaphores given once at creation, and
//! events are counting semaphores drained by the waiter.  This kernel has
//! no native pulse primitive, so it is the port that exercises the
//! [`sem_event`](super::sem_event) emulation.
//!
//! The 10 ms tick makes the millisecond-to-tick round-up observable on a
//! host.  Stale task handles are a programming error here, as on the real
//! kernels of this class: a slot freed by task exit may be reassigned.

use std::sync::{Arc, Condvar, Mutex as StdMutex, OnceLock, PoisonError};
use std::thread;
use std::time::Duration as StdDuration;

use portable_atomic::{AtomicBool, Ordering};

use super::{host, Kernel, TaskSpec};
use crate::error::{Error, Result};
use crate::ident::IdAllocator;
use crate::time::{Tick, Wait};

/// Number of semaphore slots the simulated platform provides.
pub const MAX_SEMAPHORES: usize = 64;
/// Number of task slots.
pub const MAX_TASKS: usize = 16;
/// Lowest priority the simulated kernel accepts.
pub const MIN_PRIORITY: i32 = 0;
/// Highest priority the simulated kernel accepts.
pub const MAX_PRIORITY: i32 = 31;

/// The slot-indexed kernel backend.
pub struct SimKernel;

fn ticks_to_std(ticks: Tick) -> StdDuration {
    StdDuration::from_millis(ticks * (1000 / SimKernel::TICK_HZ as u64))
}

// --- the simulated native semaphore table ---

struct SemSlot {
    state: StdMutex<Option<SemState>>,
    takers: Condvar,
}

struct SemState {
    count: u32,
    max: u32,
}

fn sem_table() -> &'static [SemSlot; MAX_SEMAPHORES] {
    static TABLE: OnceLock<[SemSlot; MAX_SEMAPHORES]> = OnceLock::new();
    TABLE.get_or_init(|| {
        std::array::from_fn(|_| SemSlot {
            state: StdMutex::new(None),
            takers: Condvar::new(),
        })
    })
}

static IDS: IdAllocator<MAX_SEMAPHORES> = IdAllocator::new();

fn sem_init(id: u8, initial: u32, max: u32) {
    let mut state = sem_table()[id as usize]
        .state
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    debug_assert!(state.is_none(), "semaphore slot {} already in use", id);
    *state = Some(SemState {
        count: initial,
        max,
    });
}

fn sem_destroy(id: u8) {
    *sem_table()[id as usize]
        .state
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

fn sem_take(id: u8, wait: Wait) -> bool {
    let slot = &sem_table()[id as usize];
    let mut state = slot.state.lock().unwrap_or_else(PoisonError::into_inner);
    match wait {
        Wait::Immediate => match state.as_mut() {
            Some(s) if s.count > 0 => {
                s.count -= 1;
                true
            }
            _ => false,
        },
        Wait::Forever => loop {
            match state.as_mut() {
                None => return false,
                Some(s) if s.count > 0 => {
                    s.count -= 1;
                    return true;
                }
                Some(_) => {
                    state = slot
                        .takers
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        },
        Wait::Ticks(ticks) => {
            let deadline = std::time::Instant::now() + ticks_to_std(ticks);
            loop {
                match state.as_mut() {
                    None => return false,
                    Some(s) if s.count > 0 => {
                        s.count -= 1;
                        return true;
                    }
                    Some(_) => {
                        let now = std::time::Instant::now();
                        if now >= deadline {
                            return false;
                        }
                        let (guard, _) = slot
                            .takers
                            .wait_timeout(state, deadline - now)
                            .unwrap_or_else(PoisonError::into_inner);
                        state = guard;
                    }
                }
            }
        }
    }
}

fn sem_give(id: u8) {
    let slot = &sem_table()[id as usize];
    let mut state = slot.state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(s) = state.as_mut() {
        if s.count < s.max {
            s.count += 1;
            slot.takers.notify_one();
        }
    }
}

/// Handle to a slot in the semaphore table.
///
/// Owns the slot for its lifetime; dropping it destroys the native object
/// and returns the identifier to the allocator.
pub struct SemHandle {
    id: u8,
}

impl Drop for SemHandle {
    fn drop(&mut self) {
        sem_destroy(self.id);
        IDS.release(self.id);
    }
}

// --- the simulated native task table ---

type TaskSlot = StdMutex<Option<Arc<AtomicBool>>>;

fn task_table() -> &'static [TaskSlot; MAX_TASKS] {
    static TABLE: OnceLock<[TaskSlot; MAX_TASKS]> = OnceLock::new();
    TABLE.get_or_init(|| std::array::from_fn(|_| StdMutex::new(None)))
}

fn claim_task_slot(cancel: &Arc<AtomicBool>) -> Option<u8> {
    for (i, slot) in task_table().iter().enumerate() {
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(cancel.clone());
            return Some(i as u8);
        }
    }
    None
}

fn release_task_slot(id: u8) {
    *task_table()[id as usize]
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

static SCHED_GATE: host::SchedGate = host::SchedGate::new();

impl Kernel for SimKernel {
    const TICK_HZ: u32 = 100;

    type Semaphore = SemHandle;
    type Event = SemHandle;
    type Mutex = SemHandle;
    type TaskId = u8;

    fn semaphore_create(initial: u32, max: u32) -> Result<SemHandle> {
        if max == 0 || initial > max {
            return Err(Error::InvalidParameter);
        }
        let id = IDS.allocate().ok_or(Error::NoFreeId)?;
        sem_init(id, initial, max);
        Ok(SemHandle { id })
    }

    fn semaphore_take(sem: &SemHandle, wait: Wait) -> bool {
        sem_take(sem.id, wait)
    }

    fn semaphore_give(sem: &SemHandle) {
        sem_give(sem.id);
    }

    fn semaphore_give_from_isr(sem: &SemHandle) -> bool {
        sem_give(sem.id);
        false
    }

    fn event_create() -> Result<SemHandle> {
        super::sem_event::create::<Self>()
    }

    fn event_set(event: &SemHandle) {
        super::sem_event::set::<Self>(event);
    }

    fn event_set_from_isr(event: &SemHandle) -> bool {
        super::sem_event::set_from_isr::<Self>(event)
    }

    fn event_reset(event: &SemHandle) {
        super::sem_event::reset::<Self>(event);
    }

    fn event_wait(event: &SemHandle, wait: Wait) -> bool {
        super::sem_event::wait::<Self>(event, wait)
    }

    fn mutex_create() -> Result<SemHandle> {
        // A binary semaphore, created taken and given once so the mutex
        // starts released.
        let sem = Self::semaphore_create(0, 1)?;
        Self::semaphore_give(&sem);
        Ok(sem)
    }

    fn mutex_lock(mutex: &SemHandle, wait: Wait) -> bool {
        sem_take(mutex.id, wait)
    }

    fn mutex_unlock(mutex: &SemHandle) {
        sem_give(mutex.id);
    }

    fn task_create(spec: TaskSpec<'_>) -> Result<u8> {
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&spec.priority) {
            return Err(Error::InvalidParameter);
        }
        let stack_size = match &spec.stack {
            Some(buffer) => buffer.len(),
            None => spec.stack_size,
        };
        if stack_size == 0 {
            return Err(Error::InvalidParameter);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let id = claim_task_slot(&cancel).ok_or(Error::NoFreeId)?;

        let entry = spec.entry;
        let arg = host::SendPtr(spec.arg);
        let name = spec.name.to_string();
        let spawned = thread::Builder::new()
            .name(spec.name.to_string())
            .stack_size(stack_size)
            .spawn(move || {
                host::run_task(&name, cancel, move || release_task_slot(id), move || {
                    let arg = arg;
                    entry(arg.0)
                });
            });
        match spawned {
            Ok(_) => {
                log::debug!("task '{}' started in slot {}", spec.name, id);
                Ok(id)
            }
            Err(_) => {
                release_task_slot(id);
                Err(Error::OutOfMemory)
            }
        }
    }

    fn task_delete(id: u8) {
        log::trace!("deleting task in slot {}", id);
        if let Some(slot) = task_table().get(id as usize) {
            let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(cancel) = guard.as_ref() {
                cancel.store(true, Ordering::Release);
            }
        }
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
        host::epoch().elapsed().as_millis() as Tick / (1000 / Self::TICK_HZ as u64)
    }
}
