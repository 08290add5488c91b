//! One-shot completion latch used for lifecycle ordering.

use std::sync::{Condvar, Mutex, PoisonError};

/// A latch that starts closed, opens exactly once, and lets any number of
/// threads wait for the opening. Opening an already-open gate is a no-op.
#[derive(Default)]
pub struct Gate {
    opened: Mutex<bool>,
    cond: Condvar,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate and wake all waiters. Idempotent.
    pub fn open(&self) {
        let mut opened = self.opened.lock().unwrap_or_else(PoisonError::into_inner);
        if !*opened {
            *opened = true;
            self.cond.notify_all();
        }
    }

    /// Block until the gate is open. Returns immediately if it already is.
    pub fn wait(&self) {
        let mut opened = self.opened.lock().unwrap_or_else(PoisonError::into_inner);
        while !*opened {
            opened = self
                .cond
                .wait(opened)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn is_open(&self) -> bool {
        *self.opened.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
