//! Bridge for running Rust collector/flusher plugins inside the
//! fluent-bit runtime.
//!
//! The host drives a plugin through short-lived, synchronous entry points
//! (register, init, poll, flush, exit); plugin logic is naturally
//! long-running. The bridge reconciles the two: a lifecycle coordinator
//! ([`Runtime`]) gates startup ordering, an input pipeline buffers
//! collector output for throttled batch draining, an output pipeline
//! feeds host flush calls into a single consumer stream with direct
//! backpressure, and a msgpack codec plus lease table handle the wire
//! format and cross-boundary memory.
//!
//! Plugin authors implement [`InputPlugin`] or [`OutputPlugin`] and export
//! the host symbols with [`register_input_plugin!`] or
//! [`register_output_plugin!`].

pub mod codec;
pub mod cshared;
mod error;
pub mod handoff;
pub mod host;
pub mod message;
pub mod pipeline;
pub mod plugin;
pub mod runtime;
pub mod shutdown;
pub mod status;

pub use crate::error::PluginError;
pub use crate::message::Message;
pub use crate::plugin::{InputPlugin, OutputPlugin, PluginRole};
pub use crate::runtime::{PollInput, Runtime};
pub use crate::status::Status;

// The channel endpoints appearing in the plugin contract.
pub use crossbeam_channel::{Receiver, Sender};

///
/// Everything a plugin implementation typically needs.
///
/// ```
/// use fluentbit_plugin::prelude::*;
/// ```
pub mod prelude {
    pub use crate::host::{ConfigLoader, Counter, Fluentbit, LogLevel, Logger, Metrics};
    pub use crate::shutdown::ShutdownToken;
    pub use crate::{
        InputPlugin, Message, OutputPlugin, PluginError, PluginRole, Receiver, Sender, Status,
    };
}
