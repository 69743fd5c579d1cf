// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Portable RTOS abstraction layer.
//!
//! This crate presents one synchronization-and-task surface (events,
//! counting semaphores, mutexes, tasks, a system clock) with identical
//! observable semantics regardless of which kernel backend implements them.
//! The kernel is reached through the [`port::Kernel`] capability trait;
//! concrete backends live under [`port`] and are chosen at build time with
//! the `port-*` cargo features.  Nothing in this crate branches on the
//! backend at run time.
//!
//! The crate is layered the same way top to bottom:
//!
//! - [`port`] is the raw capability surface: what a kernel must be able to
//!   do, and the backends that do it.
//! - [`sys`] contains thin portable wrappers over those capabilities: the
//!   four primitive families and the clock adapter.
//! - [`sync`] contains higher level, data-owning types built on `sys`.
//!
//! Ordinary callers use the aliases at the crate root, which are bound to
//! the active backend.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]

pub mod error;
pub mod heap;
pub mod ident;
pub mod port;
pub mod sync;
pub mod sys;
pub mod time;

pub use error::{Error, Result};
pub use time::{Duration, Forever, NoWait, Timeout};

#[cfg(any(feature = "port-hosted", feature = "port-sim"))]
pub use port::Active;

/// An auto-reset event on the active backend.
#[cfg(any(feature = "port-hosted", feature = "port-sim"))]
pub type Event = sys::sync::Event<port::Active>;

/// A counting semaphore on the active backend.
#[cfg(any(feature = "port-hosted", feature = "port-sim"))]
pub type Semaphore = sys::sync::Semaphore<port::Active>;

/// A mutex on the active backend.
#[cfg(any(feature = "port-hosted", feature = "port-sim"))]
pub type Mutex = sys::sync::Mutex<port::Active>;

/// A task on the active backend.
#[cfg(any(feature = "port-hosted", feature = "port-sim"))]
pub type Task = sys::thread::Task<port::Active>;

/// A task identifier on the active backend.
#[cfg(any(feature = "port-hosted", feature = "port-sim"))]
pub type TaskId = sys::thread::TaskId<port::Active>;

pub use sys::thread::TaskParameters;
