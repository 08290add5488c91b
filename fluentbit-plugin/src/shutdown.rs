//! Shared cancellation signal observed cooperatively by every worker.

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

/// Owner side of the process-wide cancellation signal.
///
/// Signalling works by dropping the sender half of a channel that is never
/// sent on: every receiver clone observes the disconnect at once, which
/// makes the signal usable inside `select!` alongside queue operations.
pub struct Shutdown {
    sender: Mutex<Option<Sender<()>>>,
    token: ShutdownToken,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = bounded::<()>(0);
        Self {
            sender: Mutex::new(Some(tx)),
            token: ShutdownToken { receiver: rx },
        }
    }

    /// Signal cancellation. Idempotent; later calls are no-ops.
    pub fn signal(&self) {
        let mut guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        drop(guard.take());
    }

    /// A cheap observer handle for workers and user plugin code.
    pub fn token(&self) -> ShutdownToken {
        self.token.clone()
    }

    pub fn is_signaled(&self) -> bool {
        self.token.is_shutdown()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of the cancellation signal.
///
/// Cloneable and cheap to pass to worker threads and user `collect`/`flush`
/// implementations. Workers check it at every suspension point.
#[derive(Clone)]
pub struct ShutdownToken {
    receiver: Receiver<()>,
}

impl ShutdownToken {
    /// True once [`Shutdown::signal`] has been called.
    pub fn is_shutdown(&self) -> bool {
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// The underlying channel, for use in `select!` arms. The channel never
    /// yields a value; it disconnects when shutdown is signaled.
    pub fn channel(&self) -> &Receiver<()> {
        &self.receiver
    }

    /// Block until shutdown is signaled.
    pub fn wait(&self) {
        let _ = self.receiver.recv();
    }
}
