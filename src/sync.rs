//! Higher level synchronization primitives.
//!
//! These are modeled after the synchronization primitives in
//! [`std::sync`](https://doc.rust-lang.org/stable/std/sync/index.html), in
//! as much as makes sense over the portable layer: [`Mutex`] owns the data
//! it protects and hands out an RAII guard, where the `sys` mutex is only
//! an ownership token.

pub mod atomic {
    //! Re-export portable atomic.
    //!
    //! Although `core` contains a
    //! [`sync::atomic`](https://doc.rust-lang.org/stable/core/sync/atomic/index.html)
    //! module, those types are missing on targets without atomic
    //! instructions, while most kernels still provide atomics there through
    //! other means.  In the Rust-embedded world this is papered over by the
    //! [`portable-atomic`](https://crates.io/crates/portable-atomic) crate,
    //! which re-exports the core types where they exist and fills the gaps
    //! where they don't.

    pub use portable_atomic::*;
}

#[cfg(any(feature = "port-hosted", feature = "port-sim"))]
mod mutex;

#[cfg(any(feature = "port-hosted", feature = "port-sim"))]
pub use mutex::{LockResult, Mutex, MutexGuard, TryLockError, TryLockResult};
