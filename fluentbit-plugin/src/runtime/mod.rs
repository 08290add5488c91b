//! Lifecycle coordinator: gates register → init → first-poll/flush → exit
//! and owns the pipelines, the cancellation signal and the lease table.

mod gate;

use std::sync::{Arc, Mutex, Once, PoisonError};

use crate::error::PluginError;
use crate::handoff::LeaseTable;
use crate::host::{Fluentbit, HostBindings, HostHandle, ProcessBindings};
use crate::pipeline::{InputPipeline, OutputPipeline};
use crate::plugin::{InputPlugin, OutputPlugin, PluginKind, PluginRole, Registration};
use crate::shutdown::{Shutdown, ShutdownToken};
use crate::status::Status;

pub use gate::Gate;

/// Result of one host poll: either an encoded batch or nothing buffered.
/// The distinction tells the host whether a cleanup call will follow.
#[derive(Debug, PartialEq, Eq)]
pub enum PollInput {
    Batch(Vec<u8>),
    Empty,
}

/// One plugin instance's runtime state. Constructed once per process for
/// the shared-object deployment (see `cshared`); tests build their own.
///
/// Ordering is enforced with two one-shot gates and a one-shot start
/// trigger: `registered` opens when the host's register call completes,
/// `initialized` when the init attempt completes (success or failure, so
/// a failed init cannot deadlock the data entry points), and `started`
/// fires on whichever of poll/flush the host calls first.
pub struct Runtime {
    registration: Mutex<Option<Registration>>,
    registered: Gate,
    initialized: Gate,
    started: Once,
    shutdown: Shutdown,
    bindings: Arc<dyn HostBindings>,
    input: Mutex<Option<InputPipeline>>,
    output: Mutex<Option<OutputPipeline>>,
    leases: LeaseTable,
    def_handle: Mutex<Option<HostHandle>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_bindings(Arc::new(ProcessBindings::default()))
    }

    pub fn with_bindings(bindings: Arc<dyn HostBindings>) -> Self {
        Self {
            registration: Mutex::new(None),
            registered: Gate::new(),
            initialized: Gate::new(),
            started: Once::new(),
            shutdown: Shutdown::new(),
            bindings,
            input: Mutex::new(None),
            output: Mutex::new(None),
            leases: LeaseTable::new(),
            def_handle: Mutex::new(None),
        }
    }

    /// Supply the input plugin implementation. Must be called exactly once
    /// per process, before the host's register call.
    pub fn register_input(&self, name: &str, description: &str, plugin: Box<dyn InputPlugin>) {
        self.set_registration(Registration::input(name, description, plugin));
    }

    /// Supply the output plugin implementation. Must be called exactly
    /// once per process, before the host's register call.
    pub fn register_output(&self, name: &str, description: &str, plugin: Box<dyn OutputPlugin>) {
        self.set_registration(Registration::output(name, description, plugin));
    }

    // A second registration is a programming error, not a recoverable
    // fault: the host loads one plugin identity per shared object.
    #[allow(clippy::panic)]
    fn set_registration(&self, registration: Registration) {
        let mut slot = self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            panic!("plugin already registered");
        }
        *slot = Some(registration);
    }

    /// Host register entry point: forward the plugin identity to the host
    /// definition. RETRY when no implementation has been supplied yet.
    /// Opens the `registered` gate whether or not the call succeeds.
    pub fn register(&self, def: HostHandle) -> Status {
        let status = {
            let slot = self
                .registration
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                None => {
                    log::error!("{}", PluginError::NothingRegistered);
                    Status::Retry
                }
                Some(reg) => {
                    let status =
                        self.bindings
                            .register(def, reg.role(), reg.name(), reg.description());
                    if status == Status::Ok {
                        let mut handle = self
                            .def_handle
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner);
                        *handle = Some(def);
                    }
                    status
                }
            }
        };
        self.registered.open();
        status
    }

    /// Host init entry point: build the capability bundle and run user
    /// `init`. Blocks until registration has completed. A user init error
    /// is fatal for this instance; the `initialized` gate opens either way.
    pub fn init(&self, ctx: HostHandle) -> Result<(), PluginError> {
        self.registered.wait();
        let result = self.run_init(ctx);
        self.initialized.open();
        if let Err(err) = &result {
            log::error!("{err}");
        }
        result
    }

    fn run_init(&self, ctx: HostHandle) -> Result<(), PluginError> {
        let mut slot = self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let registration = slot.as_mut().ok_or(PluginError::NothingRegistered)?;
        let fbit = Fluentbit::from_bindings(&self.bindings, ctx);
        registration
            .init_plugin(&fbit)
            .map_err(|err| PluginError::Init(Box::new(err)))
    }

    /// Host poll entry point. Blocks until init has completed; the first
    /// call starts the input pipeline. Never waits for data.
    pub fn poll_input(&self) -> Result<PollInput, PluginError> {
        self.initialized.wait();
        self.check_role(PluginRole::Input)?;
        self.ensure_started();

        let pipeline = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(pipeline) = pipeline.as_ref() else {
            return Ok(PollInput::Empty);
        };
        let batch = pipeline.drain()?;
        if batch.is_empty() {
            Ok(PollInput::Empty)
        } else {
            Ok(PollInput::Batch(batch))
        }
    }

    /// Host flush entry point. Blocks until init has completed; the first
    /// call starts the output pipeline.
    pub fn flush(&self, data: &[u8], tag: &str) -> Result<(), PluginError> {
        self.initialized.wait();
        self.check_role(PluginRole::Output)?;
        self.ensure_started();

        let pipeline = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(pipeline) = pipeline.as_ref() else {
            return Ok(());
        };
        pipeline.dispatch(data, tag, &self.shutdown.token())
    }

    /// Host exit entry point: deregister, cancel, and let the workers
    /// close the pipeline channels by dropping their producer handles.
    /// Buffered input records stay drainable afterwards.
    pub fn exit(&self) -> Status {
        {
            let slot = self
                .registration
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let name = slot.as_ref().map(Registration::name).unwrap_or_default();
            log::info!("exiting plugin name={name:?}");
        }

        let def = self
            .def_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(def) = def {
            self.bindings.unregister(def);
        }

        self.shutdown.signal();

        if let Some(pipeline) = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            pipeline.join_workers();
        }
        if let Some(pipeline) = self
            .output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            pipeline.join_worker();
        }

        Status::Ok
    }

    fn check_role(&self, wanted: PluginRole) -> Result<(), PluginError> {
        let slot = self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            None => Err(PluginError::NothingRegistered),
            Some(reg) if reg.role() != wanted => Err(PluginError::NotRegistered(wanted)),
            Some(_) => Ok(()),
        }
    }

    /// Spin up the pipeline for the registered role. Runs at most once
    /// regardless of how many times the data entry points are re-entered.
    fn ensure_started(&self) {
        self.started.call_once(|| {
            let mut slot = self
                .registration
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let Some(registration) = slot.as_mut() else {
                return;
            };
            match registration.take_plugin() {
                Some(PluginKind::Input(plugin)) => {
                    let pipeline = InputPipeline::start(plugin, self.shutdown.token());
                    let mut input = self.input.lock().unwrap_or_else(PoisonError::into_inner);
                    *input = Some(pipeline);
                }
                Some(PluginKind::Output(plugin)) => {
                    let pipeline = OutputPipeline::start(plugin, self.shutdown.token());
                    let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
                    *output = Some(pipeline);
                }
                None => {}
            }
        });
    }

    /// Lease table for batches handed to the host.
    pub fn leases(&self) -> &LeaseTable {
        &self.leases
    }

    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.token()
    }

    pub fn is_registered(&self) -> bool {
        self.registered.is_open()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.is_open()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
