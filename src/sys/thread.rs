// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Portable task lifecycle.
//!
//! Tasks are created with an entry routine, an opaque argument, and a
//! [`TaskParameters`] block carrying the priority and the stack choice:
//! a caller-owned buffer for static allocation, or just a size for
//! backend-managed allocation.  The handle returned by creation stays
//! valid until the task is deleted; the reserved handle
//! [`TaskId::current`] refers to the calling task, and deleting it is how
//! a task terminates itself.
//!
//! Backends differ in what a task object natively is (a pre-allocated
//! control block, an opaque handle, or an OS-level thread id), and this
//! module normalizes all of them behind [`TaskId`].

extern crate alloc;

use alloc::boxed::Box;
use core::ffi::c_void;
use core::fmt;
use core::mem::MaybeUninit;

use crate::error::Result;
use crate::port::{Kernel, TaskCode, TaskSpec};
use crate::time::{ms_to_ticks, Duration};

/// Parameters for task creation.
pub struct TaskParameters {
    /// Entry override.  When set, it takes precedence over the `entry`
    /// argument given to [`Task::create`]; some callers deliver the entry
    /// point through their parameter block instead.
    pub code: Option<TaskCode>,
    /// Caller-owned stack for static allocation, or `None` to request
    /// backend-managed allocation.
    pub stack: Option<&'static mut [MaybeUninit<u8>]>,
    /// Stack size in bytes.  Ignored in favor of the buffer length when
    /// `stack` is given.
    pub stack_size: usize,
    /// Scheduling priority; the accepted range is backend-defined.
    pub priority: i32,
}

impl Default for TaskParameters {
    /// Backend-managed 4 KiB stack at the lowest normal priority.
    fn default() -> Self {
        TaskParameters {
            code: None,
            stack: None,
            stack_size: 4096,
            priority: 1,
        }
    }
}

/// Identifier for a task.
///
/// Valid from successful creation until deletion.  [`TaskId::current`] is
/// the reserved handle for the calling task.
pub struct TaskId<K: Kernel>(Option<K::TaskId>);

impl<K: Kernel> TaskId<K> {
    /// The reserved handle referring to the calling task.
    pub const fn current() -> Self {
        TaskId(None)
    }
}

impl<K: Kernel> Clone for TaskId<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: Kernel> Copy for TaskId<K> {}

impl<K: Kernel> PartialEq for TaskId<K> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<K: Kernel> fmt::Debug for TaskId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => write!(f, "TaskId(self)"),
            Some(_) => write!(f, "TaskId(..)"),
        }
    }
}

/// A task created through the port layer.
pub struct Task<K: Kernel> {
    id: TaskId<K>,
}

impl<K: Kernel> Task<K> {
    /// Create and start a task from a raw entry routine.
    ///
    /// When `params.code` is set it takes precedence over `entry`.
    /// Creation failures (exhausted task slots, an invalid priority, a
    /// zero-size dynamic stack, allocation failure) are reported as `Err`
    /// and never retried here.
    ///
    /// # Safety
    ///
    /// `arg` must remain valid for the task's lifetime and whatever it
    /// points to must be safe to use from the new task's context.
    pub unsafe fn create(
        name: &str,
        entry: TaskCode,
        arg: *mut c_void,
        params: TaskParameters,
    ) -> Result<Task<K>> {
        let entry = params.code.unwrap_or(entry);
        let id = K::task_create(TaskSpec {
            name,
            entry,
            arg,
            stack: params.stack,
            stack_size: params.stack_size,
            priority: params.priority,
        })?;
        Ok(Task {
            id: TaskId(Some(id)),
        })
    }

    /// Create and start a task running a closure.
    ///
    /// The closure is boxed and handed through the raw entry, so this
    /// needs allocation but no `unsafe` on the caller's side.
    pub fn spawn<F>(name: &str, params: TaskParameters, f: F) -> Result<Task<K>>
    where
        F: FnOnce() + Send + 'static,
    {
        let f: Box<dyn FnOnce() + Send> = Box::new(f);
        let arg = Box::into_raw(Box::new(f)) as *mut c_void;
        // SAFETY: arg is a heap pointer consumed exactly once by the
        // trampoline below.
        let task = unsafe { Self::create(name, closure_entry, arg, params) };
        if task.is_err() {
            // The kernel rejected the task; reclaim the closure.
            // SAFETY: on the error path the trampoline never ran.
            drop(unsafe { Box::from_raw(arg as *mut Box<dyn FnOnce() + Send>) });
        }
        task
    }

    /// The identifier of this task.
    pub fn id(&self) -> TaskId<K> {
        self.id
    }

    /// Terminate a task.
    ///
    /// Deleting [`TaskId::current`] terminates the calling task; the call
    /// does not return.  Deleting a foreign handle terminates that task
    /// asynchronously; do not assume teardown has completed when this
    /// returns.
    pub fn delete(id: TaskId<K>) {
        match id.0 {
            None => K::task_exit(),
            Some(raw) => K::task_delete(raw),
        }
    }

    /// Block the calling task for at least `duration`.
    ///
    /// The bound is converted to native ticks rounding up, so a coarse
    /// tick never shortens the delay.
    pub fn sleep(duration: Duration) {
        K::task_sleep(ms_to_ticks(duration.to_millis(), K::TICK_HZ));
    }

    /// Relinquish the remainder of the current time slice without
    /// blocking.
    pub fn yield_now() {
        K::task_yield();
    }
}

impl<K: Kernel> fmt::Debug for Task<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sys::Task {:?}", self.id)
    }
}

fn closure_entry(arg: *mut c_void) {
    // SAFETY: `arg` was produced by Box::into_raw in `spawn` and is
    // consumed exactly once.
    let f = unsafe { Box::from_raw(arg as *mut Box<dyn FnOnce() + Send>) };
    f()
}
