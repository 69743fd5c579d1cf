// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Kernel backends.
//!
//! Everything above this module talks to the kernel through [`Kernel`]: a
//! capability set covering counting semaphores, events, mutexes, task
//! lifecycle, the scheduler bracket and the tick counter.  Each backend is
//! one implementation of the trait, and the build selects which one backs
//! the front-door aliases through the `port-*` cargo features; there is no
//! per-call backend dispatch at run time.
//!
//! With no `port-*` feature enabled the trait and the portable wrappers are
//! still available, for a kernel implemented outside this crate; only the
//! [`Active`] alias and the non-generic convenience functions disappear.

extern crate alloc;

use core::alloc::Layout;
use core::ffi::c_void;
use core::mem::MaybeUninit;
use core::ptr::NonNull;

use crate::error::Result;
use crate::time::{Tick, Wait};

#[cfg(feature = "port-hosted")]
pub mod hosted;
#[cfg(feature = "port-sim")]
pub mod sim;

#[cfg(any(feature = "port-hosted", feature = "port-sim"))]
pub(crate) mod host;
#[cfg(all(test, feature = "std"))]
pub(crate) mod mock;

/// The backend bound to the front-door aliases.
#[cfg(feature = "port-hosted")]
pub type Active = hosted::HostedKernel;

/// The backend bound to the front-door aliases.
#[cfg(all(feature = "port-sim", not(feature = "port-hosted")))]
pub type Active = sim::SimKernel;

/// A task entry routine.  Receives the opaque argument supplied at
/// creation.
pub type TaskCode = fn(arg: *mut c_void);

/// A resolved task-creation request, as handed to the backend.
///
/// Produced by [`Task::create`] after the entry override in
/// [`TaskParameters`] has been applied, so backends never see both entry
/// channels.
///
/// [`Task::create`]: crate::sys::thread::Task::create
/// [`TaskParameters`]: crate::sys::thread::TaskParameters
pub struct TaskSpec<'a> {
    /// Name forwarded to the kernel for debugging and tracing.
    pub name: &'a str,
    /// Entry routine.
    pub entry: TaskCode,
    /// Opaque argument passed to `entry`.
    pub arg: *mut c_void,
    /// Caller-owned stack, or `None` to request backend-managed
    /// allocation.
    pub stack: Option<&'static mut [MaybeUninit<u8>]>,
    /// Stack size in bytes; the buffer length takes over when `stack` is
    /// given.
    pub stack_size: usize,
    /// Scheduling priority; the accepted range is backend-defined.
    pub priority: i32,
}

/// The capability set a kernel backend provides.
///
/// All methods are associated functions: a backend is a type-level marker,
/// and its objects are the associated types.  Waits receive an already
/// classified [`Wait`]; the millisecond-to-tick policy lives in
/// [`crate::time`], not in the backends.
pub trait Kernel: Sized + 'static {
    /// Native tick rate in ticks per second.  1000 means ticks are
    /// milliseconds.
    const TICK_HZ: u32;

    /// Native counting-semaphore object.
    type Semaphore: Send + Sync;
    /// Native event object.  Kernels without an auto-reset primitive use
    /// their semaphore here and delegate to [`sem_event`].
    type Event: Send + Sync;
    /// Native mutex object.
    type Mutex: Send + Sync;
    /// Native task identifier.
    type TaskId: Copy + PartialEq + Send;

    /// Create a counting semaphore with the given initial count and count
    /// limit (`max > 0`, `initial <= max`).
    fn semaphore_create(initial: u32, max: u32) -> Result<Self::Semaphore>;
    /// Decrement the count.  Returns `true` on success, `false` when the
    /// wait bound elapsed first.
    fn semaphore_take(sem: &Self::Semaphore, wait: Wait) -> bool;
    /// Increment the count.  A give at the count limit is discarded.
    fn semaphore_give(sem: &Self::Semaphore);
    /// Increment the count from interrupt context.  Returns `true` when
    /// the give woke a task that should preempt the interrupted one, so
    /// the caller can request a reschedule when the interrupt returns.
    fn semaphore_give_from_isr(sem: &Self::Semaphore) -> bool;

    /// Create an event in the nonsignaled state.
    fn event_create() -> Result<Self::Event>;
    /// Move the event to the signaled state.
    fn event_set(event: &Self::Event);
    /// Signal the event from interrupt context.  Return value as in
    /// [`semaphore_give_from_isr`](Kernel::semaphore_give_from_isr).
    fn event_set_from_isr(event: &Self::Event) -> bool;
    /// Force the event to the nonsignaled state, whatever it was.
    fn event_reset(event: &Self::Event);
    /// Wait for the signaled state, consuming it on success so the next
    /// wait starts nonsignaled.
    fn event_wait(event: &Self::Event, wait: Wait) -> bool;

    /// Create a mutex in the released state.
    fn mutex_create() -> Result<Self::Mutex>;
    /// Acquire ownership.  Returns `false` only for bounded or immediate
    /// waits that did not obtain the mutex.
    fn mutex_lock(mutex: &Self::Mutex, wait: Wait) -> bool;
    /// Hand ownership back.
    fn mutex_unlock(mutex: &Self::Mutex);

    /// Create and start a task.  Failures are reported, never retried.
    fn task_create(spec: TaskSpec<'_>) -> Result<Self::TaskId>;
    /// Terminate another task.  Teardown is asynchronous from the caller's
    /// perspective.
    fn task_delete(id: Self::TaskId);
    /// Terminate the calling task.
    fn task_exit() -> !;
    /// Give up the remainder of the current time slice without blocking.
    fn task_yield();
    /// Block the calling task for at least `ticks`.
    fn task_sleep(ticks: Tick);

    /// Suspend preemption process-wide.  Nests; every call needs a
    /// matching [`sched_unlock`](Kernel::sched_unlock).
    fn sched_lock();
    /// Undo one level of [`sched_lock`](Kernel::sched_lock).
    fn sched_unlock();
    /// Monotonic tick count since kernel start.
    fn tick_count() -> Tick;

    /// Allocate from the process heap with preemption suspended.
    ///
    /// The bracket makes the heap safe on kernels whose allocator is not
    /// reentrant across preemption.  A backend whose heap is already
    /// reentrant overrides this to skip the bracket.
    fn mem_alloc(size: usize) -> Option<NonNull<u8>> {
        let layout = heap_layout(size)?;
        Self::sched_lock();
        // SAFETY: layout has non-zero size.
        let ptr = unsafe { alloc::alloc::alloc(layout) };
        Self::sched_unlock();
        NonNull::new(ptr)
    }

    /// Return a block obtained from [`mem_alloc`](Kernel::mem_alloc),
    /// with the same `size`.
    fn mem_free(ptr: NonNull<u8>, size: usize) {
        let Some(layout) = heap_layout(size) else {
            return;
        };
        Self::sched_lock();
        // SAFETY: the pointer came from mem_alloc with this layout.
        unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) };
        Self::sched_unlock();
    }
}

/// Heap blocks are handed out max-aligned, like the C allocator this
/// stands in for.
const HEAP_ALIGN: usize = 16;

pub(crate) fn heap_layout(size: usize) -> Option<Layout> {
    if size == 0 {
        return None;
    }
    Layout::from_size_align(size, HEAP_ALIGN).ok()
}

pub mod sem_event {
    //! Auto-reset events emulated over a counting semaphore.
    //!
    //! Kernels without a native pulse primitive fall back to a counting
    //! semaphore: `set` gives, and a successful wait drains the count back
    //! to zero with non-blocking takes before reporting success.  The drain
    //! is only ever run by the single task that just consumed the signal,
    //! which is what makes the loop safe.  It must not be run by several
    //! consumers of the same event concurrently.

    use super::Kernel;
    use crate::error::Result;
    use crate::time::Wait;

    /// Create the backing semaphore, nonsignaled.
    pub fn create<K: Kernel>() -> Result<K::Semaphore> {
        K::semaphore_create(0, u32::MAX)
    }

    /// Signal the event.
    pub fn set<K: Kernel>(sem: &K::Semaphore) {
        K::semaphore_give(sem);
    }

    /// Signal the event from interrupt context.
    pub fn set_from_isr<K: Kernel>(sem: &K::Semaphore) -> bool {
        K::semaphore_give_from_isr(sem)
    }

    /// Force the event to nonsignaled, however many signals are pending.
    pub fn reset<K: Kernel>(sem: &K::Semaphore) {
        while K::semaphore_take(sem, Wait::Immediate) {}
    }

    /// Wait for a signal, then consume every pending signal so the next
    /// wait starts nonsignaled.
    pub fn wait<K: Kernel>(sem: &K::Semaphore, wait: Wait) -> bool {
        if K::semaphore_take(sem, wait) {
            reset::<K>(sem);
            true
        } else {
            false
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::mock::MockKernel;
    use super::{sem_event, Kernel};
    use crate::time::Wait;

    #[test]
    fn drain_consumes_every_pending_signal() {
        let sem = sem_event::create::<MockKernel>().unwrap();
        sem_event::set::<MockKernel>(&sem);
        sem_event::set::<MockKernel>(&sem);
        sem_event::set::<MockKernel>(&sem);
        assert!(sem_event::wait::<MockKernel>(&sem, Wait::Immediate));
        // Every earlier signal was drained by the successful wait.
        assert!(!sem_event::wait::<MockKernel>(&sem, Wait::Immediate));
    }

    #[test]
    fn reset_forces_nonsignaled() {
        let sem = sem_event::create::<MockKernel>().unwrap();
        sem_event::set::<MockKernel>(&sem);
        sem_event::reset::<MockKernel>(&sem);
        assert!(!sem_event::wait::<MockKernel>(&sem, Wait::Immediate));
    }

    #[test]
    fn default_heap_bracket_allocates_and_frees() {
        let ptr = MockKernel::mem_alloc(64).expect("allocation should succeed");
        // The block is writable for its full length.
        unsafe {
            core::ptr::write_bytes(ptr.as_ptr(), 0xa5, 64);
        }
        MockKernel::mem_free(ptr, 64);
        assert_eq!(MockKernel::sched_depth(), 0);
    }

    #[test]
    fn zero_size_allocation_is_rejected() {
        assert!(MockKernel::mem_alloc(0).is_none());
    }
}
