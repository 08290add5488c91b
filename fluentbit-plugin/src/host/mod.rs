//! Host capability surface.
//!
//! The host runtime owns configuration storage, the leveled logger and the
//! metrics subsystem. The bridge consumes them through three capabilities
//! ([`ConfigLoader`], [`Logger`], [`Metrics`]) bundled into a [`Fluentbit`]
//! context, and reaches the host itself only through the [`HostBindings`]
//! seam. The default [`ProcessBindings`] keeps everything in-process, which
//! is what tests and embedders use.

mod config;
mod logger;
mod metrics;

use core::ffi::c_void;
use std::sync::Arc;

use crate::plugin::PluginRole;
use crate::status::Status;

pub use config::{unquote, BindingsConfig, ConfigLoader};
pub use logger::{BindingsLogger, LogLevel, Logger};
pub use metrics::{
    AtomicCounter, Counter, InProcessMetrics, Metrics, METRICS_NAMESPACE, METRICS_SUBSYSTEM,
};

/// Opaque handle the host passes into an entry point (a plugin definition
/// or plugin instance pointer). Stored as an address; the bridge never
/// dereferences it, only hands it back to the bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostHandle(usize);

impl HostHandle {
    pub fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr as usize)
    }

    pub fn null() -> Self {
        Self(0)
    }

    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// The seam between the bridge and the host ABI.
///
/// A real shared-object deployment installs bindings that call back into
/// the host; the defaults keep every capability in-process so the bridge
/// is fully exercisable without a host.
pub trait HostBindings: Send + Sync + 'static {
    /// Fill the host's plugin definition with the plugin identity.
    fn register(&self, _def: HostHandle, _role: PluginRole, _name: &str, _desc: &str) -> Status {
        Status::Ok
    }

    /// Undo a previous [`HostBindings::register`].
    fn unregister(&self, _def: HostHandle) {}

    /// Raw configuration value for `key`, unquoting not yet applied.
    /// `None` when the key is absent.
    fn config_get(&self, _plugin: HostHandle, _key: &str) -> Option<String> {
        None
    }

    /// Forward one plugin log line to the host's leveled logger.
    fn log_write(&self, _plugin: HostHandle, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => log::error!("{message}"),
            LogLevel::Warn => log::warn!("{message}"),
            LogLevel::Info => log::info!("{message}"),
            LogLevel::Debug => log::debug!("{message}"),
        }
    }

    /// The metrics factory scoped to this plugin instance.
    fn metrics(&self, plugin: HostHandle) -> Arc<dyn Metrics>;
}

/// Default in-process bindings: no configuration, log lines forwarded to
/// the `log` facade, counters held in one process-local registry.
#[derive(Default)]
pub struct ProcessBindings {
    metrics: Arc<InProcessMetrics>,
}

impl ProcessBindings {
    /// The registry behind [`HostBindings::metrics`], exposed so embedders
    /// and tests can read counter values back.
    pub fn metrics_registry(&self) -> Arc<InProcessMetrics> {
        self.metrics.clone()
    }
}

impl HostBindings for ProcessBindings {
    fn metrics(&self, _plugin: HostHandle) -> Arc<dyn Metrics> {
        self.metrics.clone()
    }
}

/// The host context handed to a plugin's `init`: configuration lookup, a
/// leveled log sink and a counter factory.
#[derive(Clone)]
pub struct Fluentbit {
    pub conf: Arc<dyn ConfigLoader>,
    pub logger: Arc<dyn Logger>,
    pub metrics: Arc<dyn Metrics>,
}

impl Fluentbit {
    pub(crate) fn from_bindings(bindings: &Arc<dyn HostBindings>, handle: HostHandle) -> Self {
        Self {
            conf: Arc::new(BindingsConfig::new(bindings.clone(), handle)),
            logger: Arc::new(BindingsLogger::new(bindings.clone(), handle)),
            metrics: bindings.metrics(handle),
        }
    }
}
