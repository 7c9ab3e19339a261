// SPDX-License-Identifier: Apache-2.0

//! Boot-time reference for kmsg timestamps.
//!
//! Kernel timestamps count microseconds since boot. The wall-clock time at
//! boot is derived once per process by subtracting the system uptime from
//! the current time; every absolute timestamp is `boot time + monotonic`.

use crate::kmsg::error::{KmsgFormatError, Result};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Uptime source, first field is seconds since boot
pub const UPTIME_PATH: &str = "/proc/uptime";

const USEC_PER_SEC: u64 = 1_000_000;

static SYSTEM_BOOT_TIME: OnceLock<BootTime> = OnceLock::new();

/// Wall-clock time at monotonic zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BootTime {
    sec: u64,
    usec: u32,
}

impl BootTime {
    /// The Unix epoch, used when calibration is not possible
    pub const ZERO: BootTime = BootTime { sec: 0, usec: 0 };

    /// Build a reference from seconds and microseconds; excess microseconds
    /// carry into seconds.
    pub fn new(sec: u64, usec: u32) -> Self {
        let carry = u64::from(usec) / USEC_PER_SEC;
        Self {
            sec: sec.saturating_add(carry),
            usec: (u64::from(usec) % USEC_PER_SEC) as u32,
        }
    }

    pub fn sec(&self) -> u64 {
        self.sec
    }

    pub fn usec(&self) -> u32 {
        self.usec
    }

    /// The process-wide boot time, calibrated from [`UPTIME_PATH`] on first
    /// use. Falls back to [`BootTime::ZERO`] if calibration fails.
    pub fn system() -> BootTime {
        *SYSTEM_BOOT_TIME.get_or_init(|| match Self::calibrate() {
            Ok(boot_time) => {
                debug!(
                    sec = boot_time.sec,
                    usec = boot_time.usec,
                    "Calibrated kmsg boot time"
                );
                boot_time
            }
            Err(e) => {
                warn!(
                    "Failed to calibrate boot time: {}. Kmsg timestamps will be relative to the epoch.",
                    e
                );
                BootTime::ZERO
            }
        })
    }

    /// Calibrate against the system uptime source
    pub fn calibrate() -> Result<BootTime> {
        Self::calibrate_from(Path::new(UPTIME_PATH))
    }

    /// Calibrate against an uptime file in `/proc/uptime` format
    pub fn calibrate_from(path: &Path) -> Result<BootTime> {
        let uptime = fs::read_to_string(path).map_err(|e| {
            KmsgFormatError::BootTime(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| KmsgFormatError::BootTime(format!("System time error: {}", e)))?;

        Self::from_uptime(&uptime, now)
    }

    /// Derive the boot time from uptime text and the current time since the
    /// epoch.
    pub fn from_uptime(uptime: &str, now: Duration) -> Result<BootTime> {
        let uptime_usec = parse_uptime_usec(uptime)?;
        let now_usec = now
            .as_secs()
            .saturating_mul(USEC_PER_SEC)
            .saturating_add(u64::from(now.subsec_micros()));

        let boot_usec = now_usec.checked_sub(uptime_usec).ok_or_else(|| {
            KmsgFormatError::BootTime(format!(
                "Uptime of {}us exceeds current time",
                uptime_usec
            ))
        })?;

        Ok(BootTime {
            sec: boot_usec / USEC_PER_SEC,
            usec: (boot_usec % USEC_PER_SEC) as u32,
        })
    }

    /// Convert microseconds since boot to absolute `(seconds, microseconds)`.
    ///
    /// Seconds and microseconds are combined before re-splitting so that the
    /// microsecond sum carries into seconds. Returns `None` on overflow.
    pub fn to_absolute(&self, timestamp_usec: u64) -> Option<(u64, u32)> {
        let t = self
            .sec
            .checked_add(timestamp_usec / USEC_PER_SEC)?
            .checked_mul(USEC_PER_SEC)?
            .checked_add(u64::from(self.usec))?
            .checked_add(timestamp_usec % USEC_PER_SEC)?;

        Some((t / USEC_PER_SEC, (t % USEC_PER_SEC) as u32))
    }
}

/// Parse the first field of `/proc/uptime` (e.g. `12345.67`) to microseconds
fn parse_uptime_usec(uptime: &str) -> Result<u64> {
    let field = uptime
        .split_whitespace()
        .next()
        .ok_or_else(|| KmsgFormatError::BootTime("Empty uptime".to_string()))?;

    let (secs, frac) = field.split_once('.').unwrap_or((field, ""));
    let invalid = || KmsgFormatError::BootTime(format!("Invalid uptime: {}", field));

    if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let secs: u64 = secs.parse().map_err(|_| invalid())?;

    // Fraction is scaled to microseconds, extra precision is dropped
    let mut usec: u64 = 0;
    for i in 0..6 {
        let digit = frac.as_bytes().get(i).map_or(0, |b| u64::from(b - b'0'));
        usec = usec * 10 + digit;
    }

    secs.checked_mul(USEC_PER_SEC)
        .and_then(|s| s.checked_add(usec))
        .ok_or_else(invalid)
}
