// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Port layer errors
//!
//! Creation paths report failure through this `Error` and the crate-local
//! `Result`.  The set is deliberately small: everything a backend can fail
//! with collapses into resource exhaustion or parameter rejection, and none
//! of it is retried inside this layer.
//!
//! A wait that times out is *not* an error.  Wait operations return a plain
//! `bool` so that the negative outcome cannot be confused with a fault.

use core::fmt;

/// A port-layer error.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Error {
    /// No free slot in a fixed identifier or object table.
    NoFreeId,
    /// The backend failed to create the native kernel object.
    KernelResource,
    /// A parameter was rejected before reaching the kernel.
    InvalidParameter,
    /// Stack or control-block storage could not be allocated.
    OutOfMemory,
}

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::NoFreeId => "no identifier available",
            Error::KernelResource => "kernel object creation failed",
            Error::InvalidParameter => "invalid parameter",
            Error::OutOfMemory => "out of memory",
        };
        write!(f, "{}", msg)
    }
}

/// Wraps a value with a possible port-layer error.
pub type Result<T> = core::result::Result<T, Error>;
