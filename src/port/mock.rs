// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scripted kernel for unit tests.
//!
//! Waits are resolved deterministically against a scripted signal arrival
//! instead of a real clock, which is what lets the timeout boundaries be
//! tested exactly: a bounded wait of `t` ticks observes a signal scripted
//! strictly before `t` and misses one scripted at or after `t`.  The mock
//! also records the classified wait each take received, so tests can assert
//! the non-blocking and unbounded forms reach the backend unchanged.

use std::sync::Mutex as StdMutex;

use portable_atomic::{AtomicU32, AtomicU64, Ordering};

use super::{sem_event, Kernel, TaskSpec};
use crate::error::{Error, Result};
use crate::time::{Tick, Wait};

/// The scripted kernel backend.
pub(crate) struct MockKernel;

const NO_SIGNAL: u64 = u64::MAX;

/// A scripted counting semaphore.
pub(crate) struct MockSem {
    count: AtomicU32,
    max: u32,
    signal_after: AtomicU64,
    last_wait: StdMutex<Option<Wait>>,
}

impl MockSem {
    /// Script a give arriving this many ticks into the next bounded or
    /// unbounded wait.
    pub(crate) fn script_signal_after(&self, ticks: Tick) {
        self.signal_after.store(ticks, Ordering::SeqCst);
    }

    /// The classified wait the most recent take received.
    pub(crate) fn last_wait(&self) -> Option<Wait> {
        *self.last_wait.lock().unwrap()
    }

    fn try_dec(&self) -> bool {
        self.count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| c.checked_sub(1))
            .is_ok()
    }

    fn take(&self, wait: Wait) -> bool {
        *self.last_wait.lock().unwrap() = Some(wait);
        match wait {
            Wait::Immediate => self.try_dec(),
            Wait::Forever => {
                if self.try_dec() {
                    return true;
                }
                let after = self.signal_after.swap(NO_SIGNAL, Ordering::SeqCst);
                if after == NO_SIGNAL {
                    panic!("unbounded wait with no signal scripted");
                }
                true
            }
            Wait::Ticks(bound) => {
                if self.try_dec() {
                    return true;
                }
                let after = self.signal_after.load(Ordering::SeqCst);
                if after != NO_SIGNAL && after < bound {
                    self.signal_after.store(NO_SIGNAL, Ordering::SeqCst);
                    true
                } else {
                    false
                }
            }
        }
    }

    fn give(&self) {
        let max = self.max;
        let _ = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| {
                if c < max {
                    Some(c + 1)
                } else {
                    None
                }
            });
    }
}

static SCHED_DEPTH: AtomicU32 = AtomicU32::new(0);

impl MockKernel {
    /// Current nesting depth of the scheduler bracket.
    pub(crate) fn sched_depth() -> u32 {
        SCHED_DEPTH.load(Ordering::SeqCst)
    }
}

impl Kernel for MockKernel {
    const TICK_HZ: u32 = 100;

    type Semaphore = MockSem;
    type Event = MockSem;
    type Mutex = MockSem;
    type TaskId = u8;

    fn semaphore_create(initial: u32, max: u32) -> Result<MockSem> {
        if max == 0 || initial > max {
            return Err(Error::InvalidParameter);
        }
        Ok(MockSem {
            count: AtomicU32::new(initial),
            max,
            signal_after: AtomicU64::new(NO_SIGNAL),
            last_wait: StdMutex::new(None),
        })
    }

    fn semaphore_take(sem: &MockSem, wait: Wait) -> bool {
        sem.take(wait)
    }

    fn semaphore_give(sem: &MockSem) {
        sem.give();
    }

    fn semaphore_give_from_isr(sem: &MockSem) -> bool {
        sem.give();
        false
    }

    fn event_create() -> Result<MockSem> {
        sem_event::create::<Self>()
    }

    fn event_set(event: &MockSem) {
        sem_event::set::<Self>(event);
    }

    fn event_set_from_isr(event: &MockSem) -> bool {
        sem_event::set_from_isr::<Self>(event)
    }

    fn event_reset(event: &MockSem) {
        sem_event::reset::<Self>(event);
    }

    fn event_wait(event: &MockSem, wait: Wait) -> bool {
        sem_event::wait::<Self>(event, wait)
    }

    fn mutex_create() -> Result<MockSem> {
        Self::semaphore_create(1, 1)
    }

    fn mutex_lock(mutex: &MockSem, wait: Wait) -> bool {
        mutex.take(wait)
    }

    fn mutex_unlock(mutex: &MockSem) {
        mutex.give();
    }

    fn task_create(_spec: TaskSpec<'_>) -> Result<u8> {
        unimplemented!("the scripted kernel has no tasks")
    }

    fn task_delete(_id: u8) {
        unimplemented!("the scripted kernel has no tasks")
    }

    fn task_exit() -> ! {
        unimplemented!("the scripted kernel has no tasks")
    }

    fn task_yield() {}

    fn task_sleep(_ticks: Tick) {
        unimplemented!("the scripted kernel has no tasks")
    }

    fn sched_lock() {
        SCHED_DEPTH.fetch_add(1, Ordering::SeqCst);
    }

    fn sched_unlock() {
        SCHED_DEPTH.fetch_sub(1, Ordering::SeqCst);
    }

    fn tick_count() -> Tick {
        0
    }
}
