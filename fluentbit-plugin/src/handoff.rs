//! Paired lease/release of batch buffers handed to the host.
//!
//! The poll entry point returns a pointer the host reads after the call;
//! the allocation must stay alive until the host's paired cleanup call.
//! Leased buffers are parked here keyed by address, so they are unreachable
//! from normal drops until released, and a stray release cannot free
//! anything the table does not own.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Default)]
pub struct LeaseTable {
    leases: Mutex<HashMap<usize, Box<[u8]>>>,
}

impl LeaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `bytes` and return the raw pointer/length pair describing it.
    /// The allocation stays alive until [`LeaseTable::release`] is called
    /// with the returned address.
    pub fn lease(&self, bytes: Vec<u8>) -> (*const u8, usize) {
        let boxed = bytes.into_boxed_slice();
        let ptr = boxed.as_ptr();
        let len = boxed.len();
        let mut leases = self.leases.lock().unwrap_or_else(PoisonError::into_inner);
        leases.insert(ptr as usize, boxed);
        (ptr, len)
    }

    /// Drop the lease at `addr`. Returns false (and logs) when the address
    /// was never leased or was already released.
    pub fn release(&self, addr: usize) -> bool {
        let mut leases = self.leases.lock().unwrap_or_else(PoisonError::into_inner);
        if leases.remove(&addr).is_some() {
            true
        } else {
            log::warn!("cleanup for unknown buffer address {addr:#x}");
            false
        }
    }

    /// Number of buffers the host has not released yet.
    pub fn outstanding(&self) -> usize {
        self.leases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
