//! Output pipeline: one long-lived flush worker fed by host flush calls.
//!
//! The host pushes an encoded blob per flush call; the user flusher wants
//! one sequential stream of records. The bridge decodes each blob and
//! feeds the records, one by one, through a zero-capacity rendezvous
//! channel — every enqueue blocks until the flusher accepts the record,
//! which is the backpressure stalling a host flush call against a slow
//! consumer.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, Sender};

use crate::codec::Decoder;
use crate::error::PluginError;
use crate::message::Message;
use crate::plugin::OutputPlugin;
use crate::shutdown::ShutdownToken;

use super::input::join_with_timeout;

type Outcome = Arc<Mutex<Option<Result<(), PluginError>>>>;

pub struct OutputPipeline {
    sender: Sender<Message>,
    outcome: Outcome,
    worker: Option<JoinHandle<()>>,
}

impl OutputPipeline {
    /// Spawn the flush worker. Called exactly once, on the host's first
    /// flush. User `flush` is invoked a single time; its result is parked
    /// for later dispatch calls to inspect.
    pub fn start(plugin: Box<dyn OutputPlugin>, shutdown: ShutdownToken) -> Self {
        let (tx, rx) = bounded::<Message>(0);
        let outcome: Outcome = Arc::new(Mutex::new(None));

        let slot = outcome.clone();
        let spawned = thread::Builder::new()
            .name("flb-flusher".to_string())
            .spawn(move || {
                let mut plugin = plugin;
                let result = plugin.flush(&shutdown, &rx);
                if let Err(err) = &result {
                    log::error!("flush: {err}");
                }
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
            });

        let worker = match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::error!("failed to spawn flush worker: {err}");
                None
            }
        };

        Self {
            sender: tx,
            outcome,
            worker,
        }
    }

    /// Decode one host blob and enqueue its records, tagged, in decode
    /// order.
    ///
    /// Decode errors abort the call; records enqueued before the error stay
    /// delivered. Shutdown observed mid-call ends the call cleanly. Once
    /// the flusher has returned, later calls short-circuit: benignly after
    /// a clean return, as an error after a failed one.
    pub fn dispatch(
        &self,
        data: &[u8],
        tag: &str,
        shutdown: &ShutdownToken,
    ) -> Result<(), PluginError> {
        {
            let outcome = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
            match &*outcome {
                Some(Ok(())) => return Ok(()),
                Some(Err(err)) => return Err(PluginError::msg(format!("flush worker: {err}"))),
                None => {}
            }
        }

        if shutdown.is_shutdown() {
            return Ok(());
        }

        let mut decoder = Decoder::new(data);
        loop {
            if shutdown.is_shutdown() {
                return Ok(());
            }
            let Some((time, record)) = decoder.next_entry()? else {
                break;
            };
            let msg = Message::with_tag(time, record, tag);
            select! {
                send(self.sender, msg) -> res => {
                    // Receiver dropped: the flusher returned between our
                    // outcome check and this send. Already-processed
                    // records count as delivered.
                    if res.is_err() {
                        return Ok(());
                    }
                }
                recv(shutdown.channel()) -> _ => return Ok(()),
            }
        }
        Ok(())
    }

    /// Join the flush worker, bounded by a timeout. A worker stuck inside
    /// user `flush` is detached rather than waited on.
    pub fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            join_with_timeout(vec![worker]);
        }
    }
}
