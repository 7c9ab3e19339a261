// SPDX-License-Identifier: Apache-2.0

//! Structured log message populated by format handlers.

mod log_message;
mod stamp;

pub use log_message::{LogMessage, MESSAGE_KEY, MSGID_KEY, MessageFlags};
pub use stamp::{FixedZone, LocalZone, LogStamp, ZoneOffset};
