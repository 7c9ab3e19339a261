// SPDX-License-Identifier: Apache-2.0

//! Decoding of the kmsg `DEVICE` property.
//!
//! The kernel identifies the device a message relates to with one of:
//!
//! - `b8:0` - block device, `major:minor`
//! - `c1:3` - character device, `major:minor`
//! - `n2` - network interface index
//! - `+pci:0000:02:00.0` - `subsystem:device-name`
//!
//! Anything else is kept verbatim as an unknown device.

use crate::message::LogMessage;

pub const DEVICE_TYPE_KEY: &str = ".linux.DEVICE.type";
pub const DEVICE_MAJOR_KEY: &str = ".linux.DEVICE.major";
pub const DEVICE_MINOR_KEY: &str = ".linux.DEVICE.minor";
pub const DEVICE_INDEX_KEY: &str = ".linux.DEVICE.index";
pub const DEVICE_NAME_KEY: &str = ".linux.DEVICE.name";

pub const UNKNOWN_DEVICE_TYPE: &str = "<unknown>";

/// A decoded `DEVICE` value, borrowing from the record buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device<'a> {
    Block { major: &'a [u8], minor: &'a [u8] },
    Char { major: &'a [u8], minor: &'a [u8] },
    NetDev { index: &'a [u8] },
    Subsystem { subsystem: &'a [u8], name: &'a [u8] },
    Unknown { name: &'a [u8] },
}

impl<'a> Device<'a> {
    /// Decode a `DEVICE` value. Never fails: unrecognized shapes, including
    /// an empty value, become [`Device::Unknown`].
    pub fn parse(value: &'a [u8]) -> Self {
        match value.split_first() {
            Some((b'b', rest)) => {
                let (major, minor) = split_at_colon(rest);
                Device::Block { major, minor }
            }
            Some((b'c', rest)) => {
                let (major, minor) = split_at_colon(rest);
                Device::Char { major, minor }
            }
            Some((b'n', rest)) => Device::NetDev { index: rest },
            Some((b'+', rest)) => {
                let (subsystem, name) = split_at_colon(rest);
                Device::Subsystem { subsystem, name }
            }
            _ => Device::Unknown { name: value },
        }
    }

    /// Value stored under `.linux.DEVICE.type`
    pub fn device_type(&self) -> &'a [u8] {
        match *self {
            Device::Block { .. } => &b"block"[..],
            Device::Char { .. } => &b"char"[..],
            Device::NetDev { .. } => &b"netdev"[..],
            Device::Subsystem { subsystem, .. } => subsystem,
            Device::Unknown { .. } => UNKNOWN_DEVICE_TYPE.as_bytes(),
        }
    }

    /// Write the device fields into `msg`
    pub fn commit(&self, msg: &mut LogMessage) {
        msg.set_value(DEVICE_TYPE_KEY, self.device_type());

        match *self {
            Device::Block { major, minor } | Device::Char { major, minor } => {
                msg.set_value(DEVICE_MAJOR_KEY, major);
                msg.set_value(DEVICE_MINOR_KEY, minor);
            }
            Device::NetDev { index } => msg.set_value(DEVICE_INDEX_KEY, index),
            Device::Subsystem { name, .. } | Device::Unknown { name } => {
                msg.set_value(DEVICE_NAME_KEY, name)
            }
        }
    }
}

/// Split at the first `:`. Without one, the whole value is the head and the
/// tail is the empty span at its end.
fn split_at_colon(value: &[u8]) -> (&[u8], &[u8]) {
    match value.iter().position(|&b| b == b':') {
        Some(pos) => (&value[..pos], &value[pos + 1..]),
        None => (value, &value[value.len()..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_device() {
        let device = Device::parse(b"b259:0");
        assert_eq!(
            device,
            Device::Block {
                major: b"259",
                minor: b"0"
            }
        );
        assert_eq!(device.device_type(), b"block");
    }

    #[test]
    fn test_char_device() {
        let device = Device::parse(b"c1:3");
        assert_eq!(
            device,
            Device::Char {
                major: b"1",
                minor: b"3"
            }
        );
        assert_eq!(device.device_type(), b"char");
    }

    #[test]
    fn test_netdev() {
        let device = Device::parse(b"n2");
        assert_eq!(device, Device::NetDev { index: b"2" });
        assert_eq!(device.device_type(), b"netdev");
    }

    #[test]
    fn test_subsystem_splits_at_first_colon() {
        let device = Device::parse(b"+pci:0000:02:00.0");
        assert_eq!(
            device,
            Device::Subsystem {
                subsystem: b"pci",
                name: b"0000:02:00.0"
            }
        );
        assert_eq!(device.device_type(), b"pci");
    }

    #[test]
    fn test_unknown_keeps_whole_value() {
        let device = Device::parse(b"garbage");
        assert_eq!(device, Device::Unknown { name: b"garbage" });
        assert_eq!(device.device_type(), b"<unknown>");

        assert_eq!(Device::parse(b""), Device::Unknown { name: b"" });
    }

    #[test]
    fn test_missing_colon_yields_empty_tail() {
        assert_eq!(
            Device::parse(b"b259"),
            Device::Block {
                major: b"259",
                minor: b""
            }
        );
        assert_eq!(
            Device::parse(b"+usb"),
            Device::Subsystem {
                subsystem: b"usb",
                name: b""
            }
        );
        assert_eq!(
            Device::parse(b"c"),
            Device::Char {
                major: b"",
                minor: b""
            }
        );
    }

    #[test]
    fn test_commit_block_device() {
        let mut msg = LogMessage::new();
        Device::parse(b"b8:16").commit(&mut msg);

        assert_eq!(msg.value(DEVICE_TYPE_KEY), Some(&b"block"[..]));
        assert_eq!(msg.value(DEVICE_MAJOR_KEY), Some(&b"8"[..]));
        assert_eq!(msg.value(DEVICE_MINOR_KEY), Some(&b"16"[..]));
        assert!(!msg.has_value(DEVICE_NAME_KEY));
        assert!(!msg.has_value(DEVICE_INDEX_KEY));
    }

    #[test]
    fn test_commit_netdev_and_unknown() {
        let mut msg = LogMessage::new();
        Device::parse(b"n3").commit(&mut msg);
        assert_eq!(msg.value(DEVICE_TYPE_KEY), Some(&b"netdev"[..]));
        assert_eq!(msg.value(DEVICE_INDEX_KEY), Some(&b"3"[..]));

        let mut msg = LogMessage::new();
        Device::parse(b"x-y").commit(&mut msg);
        assert_eq!(msg.value(DEVICE_TYPE_KEY), Some(&b"<unknown>"[..]));
        assert_eq!(msg.value(DEVICE_NAME_KEY), Some(&b"x-y"[..]));
    }
}
