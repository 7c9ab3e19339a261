// SPDX-License-Identifier: Apache-2.0

//! Byte-range scanning primitives for the kmsg field extractors.
//!
//! A [`Cursor`] walks an immutable record buffer. Scans return the span they
//! covered and leave the cursor on the delimiter that stopped them, so the
//! caller decides whether to consume it.

use crate::kmsg::error::ScanError;

pub type ScanResult<T> = std::result::Result<T, ScanError>;

#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Step over the current byte, if any
    pub fn bump(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Advance past bytes matching `pred`
    pub fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    /// Scan a non-empty run of ASCII digits ending at one of `delims`.
    ///
    /// Fails on any other byte and when the buffer ends before a delimiter.
    pub fn scan_digits_until(&mut self, delims: &[u8]) -> ScanResult<&'a [u8]> {
        let start = self.pos;

        while let Some(byte) = self.peek() {
            if delims.contains(&byte) {
                if self.pos == start {
                    return Err(ScanError::Empty(start));
                }
                return Ok(&self.data[start..self.pos]);
            }
            if !byte.is_ascii_digit() {
                return Err(ScanError::UnexpectedByte {
                    pos: self.pos,
                    byte,
                });
            }
            self.pos += 1;
        }

        Err(ScanError::UnexpectedEnd(self.pos))
    }

    /// Like [`Cursor::scan_digits_until`], also accumulating the digits into
    /// a `u64`. Values that do not fit are an error.
    pub fn scan_number_until(&mut self, delims: &[u8]) -> ScanResult<(u64, &'a [u8])> {
        let start = self.pos;
        let digits = self.scan_digits_until(delims)?;

        let mut value: u64 = 0;
        for (offset, byte) in digits.iter().enumerate() {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(byte - b'0')))
                .ok_or(ScanError::Overflow(start + offset))?;
        }

        Ok((value, digits))
    }

    /// Scan up to `delim`. Fails if the buffer ends first.
    pub fn scan_until(&mut self, delim: u8) -> ScanResult<&'a [u8]> {
        let start = self.pos;

        match self.remaining().iter().position(|&b| b == delim) {
            Some(offset) => {
                self.pos = start + offset;
                Ok(&self.data[start..self.pos])
            }
            None => {
                self.pos = self.data.len();
                Err(ScanError::UnexpectedEnd(self.pos))
            }
        }
    }

    /// Scan to the next newline or, failing that, to the end of the buffer.
    pub fn scan_line(&mut self) -> &'a [u8] {
        let start = self.pos;
        self.pos = self
            .remaining()
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.data.len(), |offset| start + offset);

        &self.data[start..self.pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_digits_stops_at_delimiter() {
        let mut cursor = Cursor::new(b"123,rest");

        assert_eq!(cursor.scan_digits_until(b","), Ok(&b"123"[..]));
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.peek(), Some(b','));
    }

    #[test]
    fn test_scan_digits_rejects_non_digit() {
        let mut cursor = Cursor::new(b"12a,");
        assert_eq!(
            cursor.scan_digits_until(b","),
            Err(ScanError::UnexpectedByte { pos: 2, byte: b'a' })
        );
    }

    #[test]
    fn test_scan_digits_requires_delimiter() {
        let mut cursor = Cursor::new(b"123");
        assert_eq!(
            cursor.scan_digits_until(b","),
            Err(ScanError::UnexpectedEnd(3))
        );

        let mut cursor = Cursor::new(b"");
        assert_eq!(
            cursor.scan_digits_until(b","),
            Err(ScanError::UnexpectedEnd(0))
        );
    }

    #[test]
    fn test_scan_digits_rejects_empty_run() {
        let mut cursor = Cursor::new(b",1");
        assert_eq!(cursor.scan_digits_until(b","), Err(ScanError::Empty(0)));
    }

    #[test]
    fn test_scan_number_multiple_delimiters() {
        let mut cursor = Cursor::new(b"65338577;msg");
        assert_eq!(
            cursor.scan_number_until(b",;"),
            Ok((65338577, &b"65338577"[..]))
        );
        assert_eq!(cursor.peek(), Some(b';'));

        let mut cursor = Cursor::new(b"42,c;msg");
        assert_eq!(cursor.scan_number_until(b",;"), Ok((42, &b"42"[..])));
        assert_eq!(cursor.peek(), Some(b','));
    }

    #[test]
    fn test_scan_number_overflow() {
        let mut cursor = Cursor::new(b"18446744073709551615,");
        assert_eq!(cursor.scan_number_until(b",").map(|(v, _)| v), Ok(u64::MAX));

        let mut cursor = Cursor::new(b"18446744073709551616,");
        assert_eq!(cursor.scan_number_until(b","), Err(ScanError::Overflow(19)));
    }

    #[test]
    fn test_scan_until() {
        let mut cursor = Cursor::new(b"abc;def");
        assert_eq!(cursor.scan_until(b';'), Ok(&b"abc"[..]));
        assert_eq!(cursor.position(), 3);

        cursor.bump();
        assert_eq!(cursor.scan_until(b';'), Err(ScanError::UnexpectedEnd(7)));
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_scan_line_accepts_buffer_end() {
        let mut cursor = Cursor::new(b"first\nsecond");
        assert_eq!(cursor.scan_line(), b"first");
        assert_eq!(cursor.peek(), Some(b'\n'));

        cursor.bump();
        assert_eq!(cursor.scan_line(), b"second");
        assert!(cursor.is_at_end());

        // Nothing left; an empty line at the end
        assert_eq!(cursor.scan_line(), b"");
    }

    #[test]
    fn test_bump_and_skip_do_not_pass_end() {
        let mut cursor = Cursor::new(b" \t");
        cursor.skip_while(|b| b == b' ' || b == b'\t');
        assert!(cursor.is_at_end());

        cursor.bump();
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.remaining(), b"");
    }
}
