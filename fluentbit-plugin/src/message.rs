//! The record type exchanged between plugins and the bridge.

use std::collections::BTreeMap;
use std::time::SystemTime;

/// A single timestamped record.
///
/// Input plugins produce `Message`s from their `collect` callback; output
/// plugins receive them from their `flush` stream. A message is moved by
/// value through the pipelines and never mutated after it is enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Wall-clock time the record was produced.
    pub time: SystemTime,
    /// String key/value payload of the record.
    pub record: BTreeMap<String, String>,
    tag: Option<String>,
}

impl Message {
    /// Create a message without a tag. This is the constructor for records
    /// produced by an input plugin.
    pub fn new(time: SystemTime, record: BTreeMap<String, String>) -> Self {
        Self {
            time,
            record,
            tag: None,
        }
    }

    /// Create a message stamped with the current time.
    pub fn now(record: BTreeMap<String, String>) -> Self {
        Self::new(SystemTime::now(), record)
    }

    /// Create a message carrying the tag of the flush call that delivered it.
    /// Only the output decode loop builds tagged messages.
    pub(crate) fn with_tag(time: SystemTime, record: BTreeMap<String, String>, tag: &str) -> Self {
        Self {
            time,
            record,
            tag: Some(tag.to_string()),
        }
    }

    /// The tag identifying the source of the record.
    ///
    /// Only populated for messages flowing to an output plugin; records
    /// produced by a collector return the empty string.
    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> BTreeMap<String, String> {
        let mut rec = BTreeMap::new();
        rec.insert("key".to_string(), "value".to_string());
        rec
    }

    #[test]
    fn test_untagged_message_has_empty_tag() {
        let msg = Message::now(record());
        assert_eq!(msg.tag(), "");
    }

    #[test]
    fn test_tagged_message_keeps_tag() {
        let msg = Message::with_tag(SystemTime::UNIX_EPOCH, record(), "app.logs");
        assert_eq!(msg.tag(), "app.logs");
    }

    #[test]
    fn test_record_is_preserved() {
        let msg = Message::now(record());
        assert_eq!(msg.record.get("key"), Some(&"value".to_string()));
    }

    #[test]
    fn test_clone_equality() {
        let msg = Message::with_tag(SystemTime::UNIX_EPOCH, record(), "t");
        assert_eq!(msg.clone(), msg);
    }
}
