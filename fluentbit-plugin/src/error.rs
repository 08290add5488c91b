//! Error taxonomy for the bridge and for user plugin implementations.

use thiserror::Error;

use crate::codec::CodecError;
use crate::plugin::PluginRole;

/// Errors crossing the boundary between user plugin code, the pipelines
/// and the host entry points.
///
/// Cancellation is deliberately not represented here: shutdown is a clean
/// exit path and resolves to an OK status, never an error.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The host invoked an entry point before any plugin implementation
    /// at all was supplied. Surfaced to the host as RETRY.
    #[error("no input or output plugin registered")]
    NothingRegistered,

    /// The host invoked an entry point whose role does not match the
    /// registered plugin. Surfaced to the host as RETRY.
    #[error("no {0} plugin registered")]
    NotRegistered(PluginRole),

    /// User `init` failed. Fatal for this plugin instance.
    #[error("init: {0}")]
    Init(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Wire encode/decode failure. Aborts the current call.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// I/O failure inside user plugin code.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Free-form failure raised by user plugin code.
    #[error("{0}")]
    Custom(String),

    /// Any other failure raised by user plugin code.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl PluginError {
    /// Convenience constructor for ad-hoc plugin errors.
    pub fn msg(msg: impl Into<String>) -> Self {
        PluginError::Custom(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_registered_display() {
        assert_eq!(
            PluginError::NotRegistered(PluginRole::Input).to_string(),
            "no input plugin registered"
        );
        assert_eq!(
            PluginError::NotRegistered(PluginRole::Output).to_string(),
            "no output plugin registered"
        );
    }

    #[test]
    fn test_custom_display() {
        assert_eq!(PluginError::msg("went sideways").to_string(), "went sideways");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PluginError = io.into();
        assert!(matches!(err, PluginError::Io(_)));
    }

    #[test]
    fn test_boxed_conversion() {
        let boxed: Box<dyn std::error::Error + Send + Sync> = "oops".into();
        let err: PluginError = boxed.into();
        assert_eq!(err.to_string(), "oops");
    }
}
