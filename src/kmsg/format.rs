// SPDX-License-Identifier: Apache-2.0

//! Kmsg format handler
//!
//! Turns one raw kmsg record into a populated [`LogMessage`]. Records are
//! either kept verbatim (`no_parse`) or parsed; a record that fails to parse
//! is handed to a [`ParseErrorHandler`] so it can still be delivered.

use crate::kmsg::boot_time::BootTime;
use crate::kmsg::config::KmsgFormatConfig;
use crate::kmsg::error::{KmsgFormatError, Result};
use crate::kmsg::parser::parse_record;
use crate::message::{LocalZone, LogMessage, MESSAGE_KEY, MessageFlags, ZoneOffset};
use tracing::debug;

/// Priority given to unparsable records (syslog.err)
pub const PARSE_ERROR_PRIORITY: u16 = (5 << 3) | 3;

/// How a record was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Kept verbatim, parsing disabled
    Verbatim,
    /// Fully parsed
    Parsed,
    /// Parsing failed, the error handler populated the message
    Unparsable,
}

impl ParseOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ParseOutcome::Unparsable)
    }
}

/// Builds the representation of a record that could not be parsed.
pub trait ParseErrorHandler: Send + Sync {
    /// Called exactly once per failed record with the trimmed raw bytes
    fn inject_parse_error(&self, msg: &mut LogMessage, raw: &[u8]);
}

/// Keeps the raw record as the message text and tags the message with
/// [`MessageFlags::PARSE_ERROR`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TagUnparsed;

impl ParseErrorHandler for TagUnparsed {
    fn inject_parse_error(&self, msg: &mut LogMessage, raw: &[u8]) {
        msg.priority = PARSE_ERROR_PRIORITY;
        msg.flags |= MessageFlags::PARSE_ERROR;
        msg.set_value(MESSAGE_KEY, raw);
    }
}

pub struct KmsgFormat {
    config: KmsgFormatConfig,
    boot_time: BootTime,
    zone: Box<dyn ZoneOffset>,
    error_handler: Box<dyn ParseErrorHandler>,
}

impl KmsgFormat {
    /// Create a handler using the process-wide boot time and the local zone
    pub fn new(config: KmsgFormatConfig) -> Result<Self> {
        config.validate().map_err(KmsgFormatError::Configuration)?;

        Ok(Self {
            config,
            boot_time: BootTime::system(),
            zone: Box::new(LocalZone),
            error_handler: Box::new(TagUnparsed),
        })
    }

    pub fn with_boot_time(mut self, boot_time: BootTime) -> Self {
        self.boot_time = boot_time;
        self
    }

    pub fn with_zone(mut self, zone: impl ZoneOffset + 'static) -> Self {
        self.zone = Box::new(zone);
        self
    }

    pub fn with_error_handler(mut self, error_handler: impl ParseErrorHandler + 'static) -> Self {
        self.error_handler = Box::new(error_handler);
        self
    }

    pub fn config(&self) -> &KmsgFormatConfig {
        &self.config
    }

    pub fn boot_time(&self) -> BootTime {
        self.boot_time
    }

    /// Populate `msg` from one raw record
    pub fn handle(&self, data: &[u8], msg: &mut LogMessage) -> ParseOutcome {
        let data = trim_record(data);

        if self.config.no_parse {
            msg.set_value(MESSAGE_KEY, data);
            msg.priority = self.config.default_priority;
            return ParseOutcome::Verbatim;
        }

        msg.flags |= MessageFlags::UTF8;
        if self.config.local {
            msg.flags |= MessageFlags::LOCAL;
        }

        match parse_record(data, &self.boot_time) {
            Ok(record) => {
                record.commit(msg, self.zone.as_ref());
                ParseOutcome::Parsed
            }
            Err(e) => {
                debug!(error = %e, length = data.len(), "Failed to parse kmsg record");
                self.error_handler.inject_parse_error(msg, data);
                ParseOutcome::Unparsable
            }
        }
    }

    /// Handle a record into a fresh message
    pub fn parse(&self, data: &[u8]) -> (LogMessage, ParseOutcome) {
        let mut msg = LogMessage::new();
        let outcome = self.handle(data, &mut msg);
        (msg, outcome)
    }
}

/// Strip trailing newline and NUL bytes
pub fn trim_record(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .rposition(|&b| b != b'\n' && b != b'\0')
        .map_or(0, |pos| pos + 1);
    &data[..end]
}
