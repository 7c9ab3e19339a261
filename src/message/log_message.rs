// SPDX-License-Identifier: Apache-2.0

use bitflags::bitflags;
use bytes::Bytes;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;

use super::stamp::LogStamp;

/// Free-text message body
pub const MESSAGE_KEY: &str = "MESSAGE";

/// Message identifier; kmsg records store their sequence number here
pub const MSGID_KEY: &str = "MSGID";

bitflags! {
    /// Processing annotations carried alongside a message.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
    pub struct MessageFlags: u32 {
        /// Content is expected to be UTF-8
        const UTF8 = 1 << 0;
        /// Message originated on the local host
        const LOCAL = 1 << 1;
        /// The raw record could not be parsed
        const PARSE_ERROR = 1 << 2;
    }
}

/// LogMessage is a syslog-style structured event: a priority, a timestamp,
/// flags and an open set of named byte-string values.
///
/// Values are keyed by name and setting a name that already exists replaces
/// its value. Names and values are raw bytes since kernel messages are not
/// guaranteed to be valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogMessage {
    /// Syslog priority, facility in bits 3 and up, level in bits 0-2
    pub priority: u16,

    /// When the event occurred; receive time until a parser sets it
    pub timestamp: LogStamp,

    pub flags: MessageFlags,

    #[serde(serialize_with = "serialize_values")]
    values: BTreeMap<Bytes, Bytes>,
}

impl LogMessage {
    /// Create an empty message stamped with the current time
    pub fn new() -> Self {
        Self::with_timestamp(LogStamp::now())
    }

    pub fn with_timestamp(timestamp: LogStamp) -> Self {
        Self {
            priority: 0,
            timestamp,
            flags: MessageFlags::empty(),
            values: BTreeMap::new(),
        }
    }

    /// Set a value, replacing any previous value with the same name.
    ///
    /// Names are byte strings like values and are stored as given.
    pub fn set_value(&mut self, name: impl AsRef<[u8]>, value: &[u8]) {
        let name = Bytes::copy_from_slice(name.as_ref());
        self.values.insert(name, Bytes::copy_from_slice(value));
    }

    pub fn value(&self, name: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.values.get(name.as_ref()).map(|v| v.as_ref())
    }

    /// Get a value as text, replacing invalid UTF-8 sequences
    pub fn value_lossy(&self, name: impl AsRef<[u8]>) -> Option<Cow<'_, str>> {
        self.value(name).map(String::from_utf8_lossy)
    }

    pub fn has_value(&self, name: impl AsRef<[u8]>) -> bool {
        self.values.contains_key(name.as_ref())
    }

    /// Iterate values in name order
    pub fn values(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.values.iter().map(|(k, v)| (k.as_ref(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The message body, if set
    pub fn message(&self) -> Option<Cow<'_, str>> {
        self.value_lossy(MESSAGE_KEY)
    }
}

impl Default for LogMessage {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize_values<S>(
    values: &BTreeMap<Bytes, Bytes>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(values.len()))?;
    for (name, value) in values {
        map.serialize_entry(
            &String::from_utf8_lossy(name),
            &String::from_utf8_lossy(value),
        )?;
    }
    map.end()
}
