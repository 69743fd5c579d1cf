// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Slot identifier allocation for table-addressed kernels.
//!
//! Some kernels never hand back an object handle: the platform supplies a
//! pre-sized object table and every call names its object by slot index.  A
//! backend built on such a kernel owns one [`IdAllocator`] per table and
//! claims an identifier before each object it creates.
//!
//! Allocation can race between task context and interrupt context, so both
//! operations run inside an interrupt-excluding critical section.  On
//! hosted targets the `critical-section` `std` implementation degrades this
//! to a process-global lock, which is sufficient there.

use core::cell::RefCell;

use critical_section::Mutex;

/// A fixed-capacity identifier table.
///
/// At most one live object holds a given identifier at a time.  Exhaustion
/// is reported as `None`, never by silently reusing a slot.
pub struct IdAllocator<const N: usize> {
    slots: Mutex<RefCell<[bool; N]>>,
}

impl<const N: usize> IdAllocator<N> {
    /// Create an empty table.
    ///
    /// The capacity must fit the one-byte identifier space.
    pub const fn new() -> Self {
        assert!(N > 0 && N <= 255);
        IdAllocator {
            slots: Mutex::new(RefCell::new([false; N])),
        }
    }

    /// Claim the first free identifier.
    ///
    /// Returns `None` when the table is exhausted.
    pub fn allocate(&self) -> Option<u8> {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            let id = slots.iter().position(|used| !used)?;
            slots[id] = true;
            Some(id as u8)
        })
    }

    /// Release a previously allocated identifier.
    ///
    /// Out-of-range identifiers are ignored, and releasing an already free
    /// slot is harmless, so callers do not need to track whether a release
    /// already happened.
    pub fn release(&self, id: u8) {
        if (id as usize) < N {
            critical_section::with(|cs| {
                self.slots.borrow_ref_mut(cs)[id as usize] = false;
            });
        }
    }
}

impl<const N: usize> Default for IdAllocator<N> {
    fn default() -> Self {
        Self::new()
    }
}
