//! Input pipeline: sampling worker, redistributor and host drain.
//!
//! The collector runs on its own schedule; the host polls on a fixed
//! cadence and expects a complete encoded batch per call. Records travel
//! collector → staging queue → primary buffer → drain. Redistribution and
//! draining are mutually exclusive via the drain lock; the redistributor
//! yields that lock at least once per window even under continuous load.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, tick, Receiver, Sender, TryRecvError};

use crate::codec::{self, CodecError};
use crate::message::Message;
use crate::plugin::InputPlugin;
use crate::shutdown::ShutdownToken;

use super::{COLLECT_INTERVAL, PRIMARY_CAPACITY, REDISTRIBUTE_WINDOW, STAGING_CAPACITY};

pub struct InputPipeline {
    drain_lock: Arc<Mutex<()>>,
    primary: Receiver<Message>,
    workers: Vec<JoinHandle<()>>,
}

impl InputPipeline {
    /// Spawn the sampling worker and the redistributor. Called exactly once,
    /// on the host's first poll.
    pub fn start(plugin: Box<dyn InputPlugin>, shutdown: ShutdownToken) -> Self {
        let (staging_tx, staging_rx) = bounded::<Message>(STAGING_CAPACITY);
        let (primary_tx, primary_rx) = bounded::<Message>(PRIMARY_CAPACITY);
        let drain_lock = Arc::new(Mutex::new(()));

        let mut workers = Vec::with_capacity(2);

        let collector_token = shutdown.clone();
        let spawned = thread::Builder::new()
            .name("flb-collector".to_string())
            .spawn(move || sampling_loop(plugin, staging_tx, collector_token));
        match spawned {
            Ok(handle) => workers.push(handle),
            Err(err) => log::error!("failed to spawn collector worker: {err}"),
        }

        let lock = drain_lock.clone();
        let spawned = thread::Builder::new()
            .name("flb-redistributor".to_string())
            .spawn(move || redistribute_loop(staging_rx, primary_tx, lock, shutdown));
        match spawned {
            Ok(handle) => workers.push(handle),
            Err(err) => log::error!("failed to spawn redistributor worker: {err}"),
        }

        Self {
            drain_lock,
            primary: primary_rx,
            workers,
        }
    }

    /// Remove every currently buffered message and encode the batch into
    /// one contiguous buffer. Never waits for more data: the loop stops as
    /// soon as the primary buffer reports empty. Holding the drain lock
    /// keeps the redistributor from refilling the buffer mid-drain.
    ///
    /// One message failing to encode aborts the whole batch.
    pub fn drain(&self) -> Result<Vec<u8>, CodecError> {
        let _guard = self
            .drain_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut buf = Vec::new();
        loop {
            match self.primary.try_recv() {
                Ok(msg) => codec::encode_into(&mut buf, &msg)?,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        Ok(buf)
    }

    /// Join worker threads, bounded by a timeout. Workers observing the
    /// shutdown signal exit promptly; a worker stuck inside user `collect`
    /// is detached rather than waited on.
    pub fn join_workers(&mut self) {
        join_with_timeout(std::mem::take(&mut self.workers));
    }
}

const JOIN_TIMEOUT: Duration = Duration::from_millis(100);
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub(crate) fn join_with_timeout(workers: Vec<JoinHandle<()>>) {
    let start = Instant::now();
    while workers.iter().any(|w| !w.is_finished()) && start.elapsed() < JOIN_TIMEOUT {
        thread::sleep(JOIN_POLL_INTERVAL);
    }
    for worker in workers {
        if worker.is_finished() {
            if let Err(err) = worker.join() {
                log::warn!("pipeline worker panicked: {err:?}");
            }
        } else {
            log::warn!("pipeline worker still running at exit; detaching");
        }
    }
}

/// Invoke user `collect` once per tick until shutdown. A failing tick is
/// logged and the next tick proceeds.
fn sampling_loop(mut plugin: Box<dyn InputPlugin>, staging: Sender<Message>, token: ShutdownToken) {
    let ticker = tick(COLLECT_INTERVAL);
    loop {
        select! {
            recv(token.channel()) -> _ => return,
            recv(ticker) -> _ => {
                if let Err(err) = plugin.collect(&token, &staging) {
                    log::error!("collect: {err}");
                }
            }
        }
    }
}

/// Move messages from staging into the primary buffer, one at a time,
/// releasing the drain lock around every blocking operation and at least
/// once per window tick.
fn redistribute_loop(
    staging: Receiver<Message>,
    primary: Sender<Message>,
    drain_lock: Arc<Mutex<()>>,
    token: ShutdownToken,
) {
    let window = tick(REDISTRIBUTE_WINDOW);
    loop {
        let guard = drain_lock.lock().unwrap_or_else(PoisonError::into_inner);
        select! {
            recv(staging) -> msg => {
                drop(guard);
                let Ok(msg) = msg else { return };
                // The primary buffer blocks when full (stall, not drop);
                // the send stays cancellable so shutdown unblocks it.
                select! {
                    send(primary, msg) -> res => {
                        if res.is_err() {
                            return;
                        }
                    }
                    recv(token.channel()) -> _ => return,
                }
            }
            recv(window) -> _ => drop(guard),
            recv(token.channel()) -> _ => {
                drop(guard);
                return;
            }
        }
    }
}
