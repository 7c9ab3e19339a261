// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, FixedOffset, Local, SecondsFormat, TimeZone};
use serde::{Serialize, Serializer};
use std::time::{SystemTime, UNIX_EPOCH};

/// A point in wall-clock time with microsecond precision and the zone offset
/// (seconds east of UTC) that was in effect for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LogStamp {
    pub sec: i64,
    pub usec: u32,
    pub zone_offset: i32,
}

impl LogStamp {
    pub fn new(sec: i64, usec: u32, zone_offset: i32) -> Self {
        Self {
            sec,
            usec,
            zone_offset,
        }
    }

    /// Current wall-clock time in the local zone
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let sec = now.as_secs() as i64;

        Self {
            sec,
            usec: now.subsec_micros(),
            zone_offset: LocalZone.offset_for(sec),
        }
    }

    /// Nanoseconds since the Unix epoch, zero for pre-epoch stamps
    pub fn unix_nanos(&self) -> u64 {
        u64::try_from(self.sec)
            .ok()
            .and_then(|sec| sec.checked_mul(1_000_000_000))
            .and_then(|ns| ns.checked_add(u64::from(self.usec) * 1_000))
            .unwrap_or(0)
    }

    /// RFC 3339 rendering with microseconds, in the stamp's own zone
    pub fn to_rfc3339(&self) -> Option<String> {
        let offset = FixedOffset::east_opt(self.zone_offset)?;
        let utc = DateTime::from_timestamp(self.sec, self.usec.checked_mul(1_000)?)?;

        Some(
            utc.with_timezone(&offset)
                .to_rfc3339_opts(SecondsFormat::Micros, false),
        )
    }
}

impl Serialize for LogStamp {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.to_rfc3339() {
            Some(s) => serializer.serialize_str(&s),
            None => serializer.serialize_i64(self.sec),
        }
    }
}

/// Timezone offset lookup used when stamping messages.
pub trait ZoneOffset: Send + Sync {
    /// Offset from UTC, in seconds east, in effect at `epoch_sec`
    fn offset_for(&self, epoch_sec: i64) -> i32;
}

/// The host's local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalZone;

impl ZoneOffset for LocalZone {
    fn offset_for(&self, epoch_sec: i64) -> i32 {
        Local
            .timestamp_opt(epoch_sec, 0)
            .single()
            .map(|dt| dt.offset().local_minus_utc())
            .unwrap_or(0)
    }
}

/// A constant offset, regardless of the instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedZone(pub i32);

impl ZoneOffset for FixedZone {
    fn offset_for(&self, _epoch_sec: i64) -> i32 {
        self.0
    }
}
