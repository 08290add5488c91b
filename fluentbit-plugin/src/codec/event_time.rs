//! The host's fixed-width on-wire timestamp.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::CodecError;

/// Msgpack extension type carrying an event time.
pub const EVENT_TIME_EXT_TYPE: i8 = 0;

/// Byte width of the extension payload.
pub const EVENT_TIME_LEN: usize = 8;

/// Event time as the host encodes it: big-endian seconds followed by
/// big-endian nanoseconds, packed into an 8-byte msgpack ext payload.
///
/// This layout is the wire contract with the host and is bit-compatible
/// with fluent-bit's event time; it is not the codec's native
/// variable-width timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTime {
    pub seconds: u32,
    pub nanoseconds: u32,
}

impl EventTime {
    /// Serialize to the 8-byte extension payload.
    pub fn to_bytes(self) -> [u8; EVENT_TIME_LEN] {
        let mut out = [0u8; EVENT_TIME_LEN];
        let (secs, nanos) = out.split_at_mut(4);
        secs.copy_from_slice(&self.seconds.to_be_bytes());
        nanos.copy_from_slice(&self.nanoseconds.to_be_bytes());
        out
    }

    /// Parse from an extension payload. The payload must be exactly 8 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != EVENT_TIME_LEN {
            return Err(CodecError::InvalidTimestamp);
        }
        let (secs, nanos) = bytes.split_at(4);
        let seconds = secs
            .try_into()
            .map(u32::from_be_bytes)
            .map_err(|_| CodecError::InvalidTimestamp)?;
        let nanoseconds = nanos
            .try_into()
            .map(u32::from_be_bytes)
            .map_err(|_| CodecError::InvalidTimestamp)?;
        Ok(Self {
            seconds,
            nanoseconds,
        })
    }
}

impl From<SystemTime> for EventTime {
    /// Times before the epoch saturate to zero; the wire format cannot
    /// represent them.
    fn from(time: SystemTime) -> Self {
        let since_epoch = time
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self {
            seconds: since_epoch.as_secs() as u32,
            nanoseconds: since_epoch.subsec_nanos(),
        }
    }
}

impl From<EventTime> for SystemTime {
    fn from(t: EventTime) -> Self {
        UNIX_EPOCH + Duration::new(u64::from(t.seconds), t.nanoseconds)
    }
}
