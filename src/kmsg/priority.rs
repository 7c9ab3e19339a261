// SPDX-License-Identifier: Apache-2.0

//! Syslog level and facility decoding of a kmsg priority value.
//!
//! The kernel packs both into one number: the level in bits 0-2 and the
//! facility in bits 3-9.

/// Highest priority value the kernel produces (facility mask | level mask)
pub const MAX_PRIORITY: u16 = 0x3ff;

/// Kernel log levels (syslog severity)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Emergency = 0, // System is unusable
    Alert = 1,     // Action must be taken immediately
    Critical = 2,  // Critical conditions
    Error = 3,     // Error conditions
    Warning = 4,   // Warning conditions
    Notice = 5,    // Normal but significant condition
    Info = 6,      // Informational
    Debug = 7,     // Debug-level messages
}

/// Syslog facility codes
/// See: https://datatracker.ietf.org/doc/html/rfc5424#section-6.2.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facility {
    Kern = 0,
    User = 1,
    Mail = 2,
    Daemon = 3,
    Auth = 4,
    Syslog = 5,
    Lpr = 6,
    News = 7,
    Uucp = 8,
    Cron = 9,
    Authpriv = 10,
    Ftp = 11,
    Ntp = 12,
    Audit = 13,
    Alert = 14,
    Clock = 15,
    Local0 = 16,
    Local1 = 17,
    Local2 = 18,
    Local3 = 19,
    Local4 = 20,
    Local5 = 21,
    Local6 = 22,
    Local7 = 23,
}

impl Level {
    pub fn from_priority(priority: u16) -> Self {
        match priority & 0x07 {
            0 => Level::Emergency,
            1 => Level::Alert,
            2 => Level::Critical,
            3 => Level::Error,
            4 => Level::Warning,
            5 => Level::Notice,
            6 => Level::Info,
            _ => Level::Debug,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Emergency => "EMERGENCY",
            Level::Alert => "ALERT",
            Level::Critical => "CRITICAL",
            Level::Error => "ERROR",
            Level::Warning => "WARNING",
            Level::Notice => "NOTICE",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }

    /// Convert to OpenTelemetry severity number
    /// See: https://opentelemetry.io/docs/specs/otel/logs/data-model/#field-severitynumber
    pub fn to_otel_severity_number(&self) -> i32 {
        match self {
            Level::Emergency => 21, // FATAL
            Level::Alert => 21,     // FATAL
            Level::Critical => 21,  // FATAL
            Level::Error => 17,     // ERROR
            Level::Warning => 13,   // WARN
            Level::Notice => 10,    // INFO2
            Level::Info => 9,       // INFO
            Level::Debug => 5,      // DEBUG
        }
    }
}

impl Facility {
    /// Facility code of a priority value
    pub fn code(priority: u16) -> u16 {
        priority >> 3
    }

    /// Named facility of a priority value. Kernel priorities can carry
    /// facility codes past `local7`, which have no name.
    pub fn from_priority(priority: u16) -> Option<Self> {
        let facility = match Self::code(priority) {
            0 => Facility::Kern,
            1 => Facility::User,
            2 => Facility::Mail,
            3 => Facility::Daemon,
            4 => Facility::Auth,
            5 => Facility::Syslog,
            6 => Facility::Lpr,
            7 => Facility::News,
            8 => Facility::Uucp,
            9 => Facility::Cron,
            10 => Facility::Authpriv,
            11 => Facility::Ftp,
            12 => Facility::Ntp,
            13 => Facility::Audit,
            14 => Facility::Alert,
            15 => Facility::Clock,
            16 => Facility::Local0,
            17 => Facility::Local1,
            18 => Facility::Local2,
            19 => Facility::Local3,
            20 => Facility::Local4,
            21 => Facility::Local5,
            22 => Facility::Local6,
            23 => Facility::Local7,
            _ => return None,
        };
        Some(facility)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Facility::Kern => "kern",
            Facility::User => "user",
            Facility::Mail => "mail",
            Facility::Daemon => "daemon",
            Facility::Auth => "auth",
            Facility::Syslog => "syslog",
            Facility::Lpr => "lpr",
            Facility::News => "news",
            Facility::Uucp => "uucp",
            Facility::Cron => "cron",
            Facility::Authpriv => "authpriv",
            Facility::Ftp => "ftp",
            Facility::Ntp => "ntp",
            Facility::Audit => "audit",
            Facility::Alert => "alert",
            Facility::Clock => "clock",
            Facility::Local0 => "local0",
            Facility::Local1 => "local1",
            Facility::Local2 => "local2",
            Facility::Local3 => "local3",
            Facility::Local4 => "local4",
            Facility::Local5 => "local5",
            Facility::Local6 => "local6",
            Facility::Local7 => "local7",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_priority_with_facility() {
        // Level 6 with facility 1 (user) = 8 + 6 = 14
        assert_eq!(Level::from_priority(14), Level::Info);
        assert_eq!(Level::from_priority(3), Level::Error);
        assert_eq!(Level::from_priority(0), Level::Emergency);
        assert_eq!(Level::from_priority(0x3ff), Level::Debug);
    }

    #[test]
    fn test_level_to_otel_severity() {
        assert_eq!(Level::Emergency.to_otel_severity_number(), 21);
        assert_eq!(Level::Error.to_otel_severity_number(), 17);
        assert_eq!(Level::Warning.to_otel_severity_number(), 13);
        assert_eq!(Level::Info.to_otel_severity_number(), 9);
        assert_eq!(Level::Debug.to_otel_severity_number(), 5);
    }

    #[test]
    fn test_facility_extraction() {
        assert_eq!(Facility::from_priority(6), Some(Facility::Kern));
        assert_eq!(Facility::from_priority(14), Some(Facility::User));
        assert_eq!(Facility::from_priority(28).map(|f| f.as_str()), Some("daemon"));
        assert_eq!(Facility::from_priority(134), Some(Facility::Local0));
        assert_eq!(Facility::from_priority(191), Some(Facility::Local7));
    }

    #[test]
    fn test_facility_beyond_local7() {
        assert_eq!(Facility::code(192), 24);
        assert_eq!(Facility::from_priority(192), None);
        assert_eq!(Facility::from_priority(MAX_PRIORITY), None);
    }
}
