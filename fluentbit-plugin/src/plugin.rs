//! The contract a plugin author implements, and its registration record.

use crossbeam_channel::{Receiver, Sender};
use strum_macros::{Display, EnumString};

use crate::error::PluginError;
use crate::host::Fluentbit;
use crate::message::Message;
use crate::shutdown::ShutdownToken;

/// Which side of the host pipeline a plugin sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PluginRole {
    Input,
    Output,
}

/// A collector: produces records the host will poll for.
///
/// `collect` is invoked on a short fixed tick by the sampling worker. An
/// implementation may push zero or more messages into `out` and return, or
/// take over its thread with its own loop; a long-running implementation
/// must watch `shutdown` at every blocking point.
pub trait InputPlugin: Send + 'static {
    fn init(&mut self, fbit: &Fluentbit) -> Result<(), PluginError>;
    fn collect(
        &mut self,
        shutdown: &ShutdownToken,
        out: &Sender<Message>,
    ) -> Result<(), PluginError>;
}

/// A flusher: consumes records the host pushes.
///
/// `flush` is invoked exactly once and receives the consuming end of the
/// handoff queue; it is expected to read `records` until the channel
/// disconnects or `shutdown` fires. Returning early is allowed — later
/// host flush calls then short-circuit.
pub trait OutputPlugin: Send + 'static {
    fn init(&mut self, fbit: &Fluentbit) -> Result<(), PluginError>;
    fn flush(
        &mut self,
        shutdown: &ShutdownToken,
        records: &Receiver<Message>,
    ) -> Result<(), PluginError>;
}

/// Tagged variant over the two plugin roles, so the lifecycle coordinator
/// is written once against a single capability set.
pub enum PluginKind {
    Input(Box<dyn InputPlugin>),
    Output(Box<dyn OutputPlugin>),
}

impl PluginKind {
    pub fn role(&self) -> PluginRole {
        match self {
            PluginKind::Input(_) => PluginRole::Input,
            PluginKind::Output(_) => PluginRole::Output,
        }
    }

    pub(crate) fn init(&mut self, fbit: &Fluentbit) -> Result<(), PluginError> {
        match self {
            PluginKind::Input(p) => p.init(fbit),
            PluginKind::Output(p) => p.init(fbit),
        }
    }
}

/// The single plugin identity loaded into this process.
pub struct Registration {
    name: String,
    description: String,
    role: PluginRole,
    plugin: Option<PluginKind>,
}

impl Registration {
    pub fn input(name: &str, description: &str, plugin: Box<dyn InputPlugin>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            role: PluginRole::Input,
            plugin: Some(PluginKind::Input(plugin)),
        }
    }

    pub fn output(name: &str, description: &str, plugin: Box<dyn OutputPlugin>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            role: PluginRole::Output,
            plugin: Some(PluginKind::Output(plugin)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn role(&self) -> PluginRole {
        self.role
    }

    pub(crate) fn init_plugin(&mut self, fbit: &Fluentbit) -> Result<(), PluginError> {
        match self.plugin.as_mut() {
            Some(plugin) => plugin.init(fbit),
            None => Err(PluginError::NotRegistered(self.role)),
        }
    }

    /// Move the implementation out for pipeline startup. The identity stays
    /// behind for deregistration and logging.
    pub(crate) fn take_plugin(&mut self) -> Option<PluginKind> {
        self.plugin.take()
    }
}
