//! Binary wire codec for the host's msgpack record format.
//!
//! Each entry on the wire is a 2-element msgpack array `[time, record]`:
//! the time is an [`EventTime`] extension value and the record is a map of
//! string keys to string (or raw byte) values. The format is fixed by the
//! host contract; there is no compression and no schema versioning.

mod event_time;

use std::collections::BTreeMap;
use std::io::Cursor;
use std::time::SystemTime;

use rmpv::Value;
use thiserror::Error;

use crate::message::Message;

pub use event_time::{EventTime, EVENT_TIME_EXT_TYPE, EVENT_TIME_LEN};

/// Wire-level failures. Strictness is deliberate: nothing is coerced, a
/// malformed entry is an error, not a best-effort record.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode: {0}")]
    Encode(#[from] rmpv::encode::Error),

    #[error("decode: {0}")]
    Decode(#[from] rmpv::decode::Error),

    #[error("unexpected entry type")]
    InvalidEntry,

    #[error("unexpected entry length: {0}")]
    UnexpectedArity(usize),

    #[error("unexpected entry time type")]
    InvalidTimestamp,

    #[error("unexpected record type")]
    InvalidRecord,

    #[error("unexpected record key type")]
    InvalidKey,

    #[error("unexpected record value type")]
    InvalidValue,
}

/// Append the wire encoding of one message to `buf`.
pub fn encode_into(buf: &mut Vec<u8>, msg: &Message) -> Result<(), CodecError> {
    let time = EventTime::from(msg.time);
    let fields = msg
        .record
        .iter()
        .map(|(k, v)| (Value::from(k.as_str()), Value::from(v.as_str())))
        .collect();

    let entry = Value::Array(vec![
        Value::Ext(EVENT_TIME_EXT_TYPE, time.to_bytes().to_vec()),
        Value::Map(fields),
    ]);
    rmpv::encode::write_value(buf, &entry)?;
    Ok(())
}

/// Encode one message into a fresh buffer.
pub fn encode(msg: &Message) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    encode_into(&mut buf, msg)?;
    Ok(buf)
}

/// Streaming decoder over a host-supplied blob of concatenated entries.
pub struct Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
    len: u64,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
            len: data.len() as u64,
        }
    }

    /// Decode the next entry, or `None` on a clean end of input.
    ///
    /// End of input is only clean at an entry boundary; a blob truncated
    /// mid-entry is a decode error.
    pub fn next_entry(
        &mut self,
    ) -> Result<Option<(SystemTime, BTreeMap<String, String>)>, CodecError> {
        if self.cursor.position() >= self.len {
            return Ok(None);
        }
        let value = rmpv::decode::read_value(&mut self.cursor)?;
        decode_entry(value).map(Some)
    }
}

/// Decode a whole blob into `(time, record)` pairs, in wire order.
pub fn decode_all(data: &[u8]) -> Result<Vec<(SystemTime, BTreeMap<String, String>)>, CodecError> {
    let mut decoder = Decoder::new(data);
    let mut out = Vec::new();
    while let Some(entry) = decoder.next_entry()? {
        out.push(entry);
    }
    Ok(out)
}

fn decode_entry(value: Value) -> Result<(SystemTime, BTreeMap<String, String>), CodecError> {
    let Value::Array(items) = value else {
        return Err(CodecError::InvalidEntry);
    };
    if items.len() != 2 {
        return Err(CodecError::UnexpectedArity(items.len()));
    }

    let mut items = items.into_iter();
    let time = match items.next() {
        Some(Value::Ext(EVENT_TIME_EXT_TYPE, bytes)) => EventTime::from_bytes(&bytes)?,
        _ => return Err(CodecError::InvalidTimestamp),
    };
    let fields = match items.next() {
        Some(Value::Map(fields)) => fields,
        _ => return Err(CodecError::InvalidRecord),
    };

    let mut record = BTreeMap::new();
    for (key, value) in fields {
        let key = match key {
            Value::String(s) => s.into_str().ok_or(CodecError::InvalidKey)?,
            _ => return Err(CodecError::InvalidKey),
        };
        // Hosts encode values either as msgpack strings or as raw byte
        // arrays; both are accepted, anything else is an error.
        let value = match value {
            Value::String(s) => String::from_utf8_lossy(s.as_bytes()).into_owned(),
            Value::Binary(b) => String::from_utf8_lossy(&b).into_owned(),
            _ => return Err(CodecError::InvalidValue),
        };
        record.insert(key, value);
    }

    Ok((time.into(), record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn message(pairs: &[(&str, &str)], time: SystemTime) -> Message {
        let record = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Message::new(time, record)
    }

    #[test]
    fn test_golden_bytes() {
        let msg = message(&[("x", "1")], UNIX_EPOCH + Duration::new(5, 7));
        let buf = encode(&msg).unwrap();
        assert_eq!(
            buf,
            vec![
                0x92, // fixarray, 2 elements
                0xd7, 0x00, // fixext8, type 0
                0x00, 0x00, 0x00, 0x05, // seconds, big-endian
                0x00, 0x00, 0x00, 0x07, // nanoseconds, big-endian
                0x81, // fixmap, 1 pair
                0xa1, b'x', // fixstr "x"
                0xa1, b'1', // fixstr "1"
            ]
        );
    }

    #[test]
    fn test_round_trip_single() {
        let msg = message(&[("a", "b"), ("c", "d")], UNIX_EPOCH + Duration::new(42, 9));
        let buf = encode(&msg).unwrap();
        let decoded = decode_all(&buf).unwrap();
        assert_eq!(decoded.len(), 1);
        let (time, record) = decoded.into_iter().next().unwrap();
        assert_eq!(time, msg.time);
        assert_eq!(record, msg.record);
    }

    #[test]
    fn test_round_trip_empty_record() {
        let msg = message(&[], UNIX_EPOCH);
        let buf = encode(&msg).unwrap();
        let decoded = decode_all(&buf).unwrap();
        assert_eq!(decoded, vec![(UNIX_EPOCH, BTreeMap::new())]);
    }

    #[test]
    fn test_batch_preserves_order() {
        let mut buf = Vec::new();
        for i in 0..10 {
            let msg = message(
                &[("i", i.to_string().as_str())],
                UNIX_EPOCH + Duration::from_secs(i),
            );
            encode_into(&mut buf, &msg).unwrap();
        }
        let decoded = decode_all(&buf).unwrap();
        assert_eq!(decoded.len(), 10);
        for (i, (time, record)) in decoded.iter().enumerate() {
            assert_eq!(*time, UNIX_EPOCH + Duration::from_secs(i as u64));
            assert_eq!(record.get("i"), Some(&i.to_string()));
        }
    }

    #[test]
    fn test_empty_input_decodes_to_nothing() {
        assert!(decode_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_arity_rejected() {
        // [time] only, no record.
        let entry = Value::Array(vec![Value::Ext(0, vec![0; 8])]);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &entry).unwrap();
        assert!(matches!(
            decode_all(&buf),
            Err(CodecError::UnexpectedArity(1))
        ));
    }

    #[test]
    fn test_non_array_entry_rejected() {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &Value::from("nope")).unwrap();
        assert!(matches!(decode_all(&buf), Err(CodecError::InvalidEntry)));
    }

    #[test]
    fn test_integer_timestamp_rejected() {
        let entry = Value::Array(vec![Value::from(12345), Value::Map(vec![])]);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &entry).unwrap();
        assert!(matches!(
            decode_all(&buf),
            Err(CodecError::InvalidTimestamp)
        ));
    }

    #[test]
    fn test_non_string_key_rejected() {
        let entry = Value::Array(vec![
            Value::Ext(0, vec![0; 8]),
            Value::Map(vec![(Value::from(1), Value::from("v"))]),
        ]);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &entry).unwrap();
        assert!(matches!(decode_all(&buf), Err(CodecError::InvalidKey)));
    }

    #[test]
    fn test_non_string_value_rejected() {
        let entry = Value::Array(vec![
            Value::Ext(0, vec![0; 8]),
            Value::Map(vec![(Value::from("k"), Value::from(7))]),
        ]);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &entry).unwrap();
        assert!(matches!(decode_all(&buf), Err(CodecError::InvalidValue)));
    }

    #[test]
    fn test_binary_value_accepted() {
        let entry = Value::Array(vec![
            Value::Ext(0, vec![0; 8]),
            Value::Map(vec![(Value::from("k"), Value::Binary(b"raw".to_vec()))]),
        ]);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &entry).unwrap();
        let decoded = decode_all(&buf).unwrap();
        let (_, record) = decoded.into_iter().next().unwrap();
        assert_eq!(record.get("k"), Some(&"raw".to_string()));
    }

    #[test]
    fn test_truncated_entry_is_an_error() {
        let msg = message(&[("key", "value")], UNIX_EPOCH);
        let buf = encode(&msg).unwrap();
        let truncated = buf.get(..buf.len() - 3).unwrap();
        assert!(decode_all(truncated).is_err());
    }

    #[test]
    fn test_decoder_stops_at_first_error_after_good_entries() {
        let mut buf = encode(&message(&[("a", "b")], UNIX_EPOCH)).unwrap();
        let bad = Value::Array(vec![Value::from(1), Value::Map(vec![])]);
        rmpv::encode::write_value(&mut buf, &bad).unwrap();

        let mut decoder = Decoder::new(&buf);
        assert!(decoder.next_entry().unwrap().is_some());
        assert!(decoder.next_entry().is_err());
    }
}
