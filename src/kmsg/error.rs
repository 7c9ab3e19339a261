// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use thiserror::Error;

/// Failure of a single cursor scan, with the offset it was detected at.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanError {
    #[error("unexpected end of record at offset {0}")]
    UnexpectedEnd(usize),

    #[error("unexpected byte {byte:#04x} at offset {pos}")]
    UnexpectedByte { pos: usize, byte: u8 },

    #[error("empty numeric field at offset {0}")]
    Empty(usize),

    #[error("numeric overflow at offset {0}")]
    Overflow(usize),
}

/// Record section a parse failure was detected in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Priority,
    Sequence,
    Timestamp,
    MessageStart,
    KeyValue,
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordField::Priority => "priority",
            RecordField::Sequence => "sequence",
            RecordField::Timestamp => "timestamp",
            RecordField::MessageStart => "message start",
            RecordField::KeyValue => "key/value pair",
        };
        f.write_str(name)
    }
}

/// Why a kmsg record could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed {field}: {source}")]
    Scan {
        field: RecordField,
        #[source]
        source: ScanError,
    },

    #[error("priority {0} is out of range")]
    PriorityOutOfRange(u64),

    #[error("timestamp {0} overflows absolute time")]
    TimestampOverflow(u64),

    #[error("empty key name at offset {0}")]
    EmptyKeyName(usize),
}

impl ParseError {
    /// Adapter for `map_err` tagging a scan failure with its field
    pub(crate) fn in_field(field: RecordField) -> impl FnOnce(ScanError) -> ParseError {
        move |source| ParseError::Scan { field, source }
    }
}

#[derive(Error, Debug)]
pub enum KmsgFormatError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Boot time error: {0}")]
    BootTime(String),
}

pub type Result<T> = std::result::Result<T, KmsgFormatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::in_field(RecordField::Priority)(ScanError::UnexpectedByte {
            pos: 1,
            byte: b'x',
        });
        assert_eq!(
            err.to_string(),
            "malformed priority: unexpected byte 0x78 at offset 1"
        );

        let err = ParseError::in_field(RecordField::KeyValue)(ScanError::UnexpectedEnd(9));
        assert_eq!(
            err.to_string(),
            "malformed key/value pair: unexpected end of record at offset 9"
        );
    }
}
