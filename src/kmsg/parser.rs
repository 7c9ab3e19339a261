// SPDX-License-Identifier: Apache-2.0

//! Parser for the Linux `/dev/kmsg` record format
//!
//! A record looks like:
//!
//! ```text
//! 6,802,65338577;ATL1E 0000:02:00.0: eth0: NIC Link is Up <100 Mbps Full Duplex>
//!  SUBSYSTEM=pci
//!  DEVICE=+pci:0000:02:00.0
//! ```
//!
//! Where:
//! - the first number is the syslog priority (facility and level)
//! - the second is the 64-bit message sequence number
//! - the third is a monotonic timestamp in microseconds since boot
//! - further comma-separated fields may follow the timestamp and are ignored
//! - the message starts after the first `;` and lasts until the first newline
//! - each following line is an indented `NAME=value` property
//!
//! The `DEVICE` property is decoded further, see [`Device`].

use crate::kmsg::boot_time::BootTime;
use crate::kmsg::cursor::Cursor;
use crate::kmsg::device::Device;
use crate::kmsg::error::{ParseError, RecordField, ScanError};
use crate::kmsg::priority::MAX_PRIORITY;
use crate::message::{LogMessage, LogStamp, MESSAGE_KEY, MSGID_KEY, ZoneOffset};

/// Prefix for record properties stored in a message
pub const LINUX_NAMESPACE: &str = ".linux.";

/// Raw monotonic timestamp, as digits
pub const TIMESTAMP_KEY: &str = ".linux.timestamp";

const DEVICE_PROPERTY: &[u8] = b"DEVICE";

/// A parsed kmsg record, borrowing from the record buffer.
///
/// Nothing is written to a [`LogMessage`] until [`KmsgRecord::commit`], so a
/// record that fails to parse part way leaves the message untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmsgRecord<'a> {
    /// Raw priority (contains both facility and level)
    pub priority: u16,
    /// Sequence number digits, kept opaque
    pub sequence: &'a [u8],
    /// Timestamp digits as they appear in the record
    pub timestamp_raw: &'a [u8],
    /// Microseconds since boot
    pub timestamp_usec: u64,
    /// Absolute time of the record, zone offset not yet resolved
    pub stamp: LogStamp,
    pub message: &'a [u8],
    /// Property block, in record order
    pub entries: Vec<Entry<'a>>,
}

/// One line of the property block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a> {
    Property(Property<'a>),
    Device(Device<'a>),
}

/// A `NAME=value` line from the record's property block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property<'a> {
    pub name: &'a [u8],
    pub value: &'a [u8],
}

impl Property<'_> {
    /// Message value name: the property name bytes under [`LINUX_NAMESPACE`]
    pub fn key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(LINUX_NAMESPACE.len() + self.name.len());
        key.extend_from_slice(LINUX_NAMESPACE.as_bytes());
        key.extend_from_slice(self.name);
        key
    }
}

impl KmsgRecord<'_> {
    /// Write the record's fields into `msg`, resolving the zone offset of
    /// the timestamp with `zone`. Entries are written in record order, so a
    /// later line replaces any value an earlier one set under the same name.
    pub fn commit(&self, msg: &mut LogMessage, zone: &dyn ZoneOffset) {
        msg.priority = self.priority;
        msg.timestamp = LogStamp {
            zone_offset: zone.offset_for(self.stamp.sec),
            ..self.stamp
        };

        msg.set_value(MSGID_KEY, self.sequence);
        msg.set_value(TIMESTAMP_KEY, self.timestamp_raw);
        msg.set_value(MESSAGE_KEY, self.message);

        for entry in &self.entries {
            match entry {
                Entry::Property(property) => msg.set_value(property.key(), property.value),
                Entry::Device(device) => device.commit(msg),
            }
        }
    }
}

/// Parse one kmsg record.
///
/// `data` must hold exactly one record. Its final newline is optional: the
/// end of the buffer terminates the message and the last property line.
pub fn parse_record<'a>(
    data: &'a [u8],
    boot_time: &BootTime,
) -> Result<KmsgRecord<'a>, ParseError> {
    let mut cursor = Cursor::new(data);

    let priority = parse_priority(&mut cursor)?;
    let sequence = parse_sequence(&mut cursor)?;
    let (timestamp_raw, timestamp_usec, stamp) = parse_timestamp(&mut cursor, boot_time)?;
    skip_to_message(&mut cursor)?;
    let message = parse_message(&mut cursor);

    let mut entries = Vec::new();
    while !cursor.is_at_end() {
        let property = parse_property(&mut cursor)?;
        if property.name == DEVICE_PROPERTY {
            entries.push(Entry::Device(Device::parse(property.value)));
        } else {
            entries.push(Entry::Property(property));
        }
    }

    Ok(KmsgRecord {
        priority,
        sequence,
        timestamp_raw,
        timestamp_usec,
        stamp,
        message,
        entries,
    })
}

fn parse_priority(cursor: &mut Cursor<'_>) -> Result<u16, ParseError> {
    let (value, _) = cursor
        .scan_number_until(b",")
        .map_err(ParseError::in_field(RecordField::Priority))?;

    let priority = u16::try_from(value)
        .ok()
        .filter(|p| *p <= MAX_PRIORITY)
        .ok_or(ParseError::PriorityOutOfRange(value))?;

    cursor.bump();
    Ok(priority)
}

fn parse_sequence<'a>(cursor: &mut Cursor<'a>) -> Result<&'a [u8], ParseError> {
    let sequence = cursor
        .scan_digits_until(b",")
        .map_err(ParseError::in_field(RecordField::Sequence))?;

    cursor.bump();
    Ok(sequence)
}

/// The timestamp ends at `;` or at the `,` of the first extension field.
/// The cursor is left on that delimiter.
fn parse_timestamp<'a>(
    cursor: &mut Cursor<'a>,
    boot_time: &BootTime,
) -> Result<(&'a [u8], u64, LogStamp), ParseError> {
    let (timestamp_usec, raw) = cursor
        .scan_number_until(b",;")
        .map_err(ParseError::in_field(RecordField::Timestamp))?;

    let (sec, usec) = boot_time
        .to_absolute(timestamp_usec)
        .and_then(|(sec, usec)| Some((i64::try_from(sec).ok()?, usec)))
        .ok_or(ParseError::TimestampOverflow(timestamp_usec))?;

    Ok((raw, timestamp_usec, LogStamp::new(sec, usec, 0)))
}

/// Step over any extension fields and the `;` ending the header
fn skip_to_message(cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
    cursor
        .scan_until(b';')
        .map_err(ParseError::in_field(RecordField::MessageStart))?;

    cursor.bump();
    Ok(())
}

fn parse_message<'a>(cursor: &mut Cursor<'a>) -> &'a [u8] {
    let message = cursor.scan_line();
    cursor.bump();
    message
}

fn parse_property<'a>(cursor: &mut Cursor<'a>) -> Result<Property<'a>, ParseError> {
    cursor.skip_while(|b| b == b' ' || b == b'\t');
    if cursor.is_at_end() {
        return Err(ParseError::Scan {
            field: RecordField::KeyValue,
            source: ScanError::UnexpectedEnd(cursor.position()),
        });
    }

    let name_start = cursor.position();
    let name = cursor
        .scan_until(b'=')
        .map_err(ParseError::in_field(RecordField::KeyValue))?;
    if name.is_empty() {
        return Err(ParseError::EmptyKeyName(name_start));
    }
    cursor.bump();

    let value = cursor.scan_line();
    cursor.bump();

    Ok(Property { name, value })
}
