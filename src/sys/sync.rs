// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Portable synchronization primitives.
//!
//! Three object kinds (auto-reset [`Event`], counting [`Semaphore`],
//! [`Mutex`]) with the same observable semantics on every backend.  Each
//! is a thin wrapper around the native object of the active kernel; the
//! kernel makes the state transitions atomic, and this layer contributes
//! the timeout classification and the auto-reset contract.
//!
//! All three share one lifecycle: created, then cycling between their two
//! states, then destroyed.  Destruction is `Drop`, and it is terminal;
//! the ownership rules make use-after-destroy unrepresentable without
//! `unsafe`.

mod event;
mod mutex;
mod semaphore;

pub use event::Event;
pub use mutex::Mutex;
pub use semaphore::Semaphore;
