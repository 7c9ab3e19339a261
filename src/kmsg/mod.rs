// SPDX-License-Identifier: Apache-2.0

//! Linux kernel message (kmsg) format
//!
//! Parses records in the `/dev/kmsg` text format:
//! `priority,sequence,timestamp[,...];message\n` followed by optional
//! indented `KEY=value` lines, and populates a [`LogMessage`] with the
//! priority, absolute timestamp, message text and `.linux.*` metadata.
//!
//! [`LogMessage`]: crate::message::LogMessage

pub mod boot_time;
pub mod config;
pub mod convert;
pub mod cursor;
pub mod device;
pub mod error;
pub mod format;
pub mod parser;
pub mod priority;
pub mod split;

pub use boot_time::BootTime;
pub use config::KmsgFormatConfig;
pub use error::{KmsgFormatError, ParseError, Result};
pub use format::{KmsgFormat, ParseErrorHandler, ParseOutcome, TagUnparsed};
pub use split::RecordSplitter;
