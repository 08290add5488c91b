//! Leveled log sink capability forwarding plugin log lines to the host.

use std::sync::Arc;

use strum_macros::{Display, EnumString};

use super::{HostBindings, HostHandle};

/// Log levels of the host's leveled logger.
///
/// The discriminants follow the host's numeric level contract
/// (`FLB_LOG_ERROR` .. `FLB_LOG_DEBUG`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Default)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Error = 1,
    Warn = 2,
    #[default]
    Info = 3,
    Debug = 4,
}

impl TryFrom<i32> for LogLevel {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, String> {
        match value {
            1 => Ok(LogLevel::Error),
            2 => Ok(LogLevel::Warn),
            3 => Ok(LogLevel::Info),
            4 => Ok(LogLevel::Debug),
            _ => Err(format!("invalid log level: {value}")),
        }
    }
}

/// The leveled log sink handed to plugins through [`super::Fluentbit`].
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
}

/// `Logger` backed by the host bindings.
pub struct BindingsLogger {
    bindings: Arc<dyn HostBindings>,
    handle: HostHandle,
}

impl BindingsLogger {
    pub(crate) fn new(bindings: Arc<dyn HostBindings>, handle: HostHandle) -> Self {
        Self { bindings, handle }
    }
}

impl Logger for BindingsLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.bindings.log_write(self.handle, level, message);
    }
}
