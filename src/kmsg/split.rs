// SPDX-License-Identifier: Apache-2.0

//! Split a kmsg text dump into records.
//!
//! A record starts at a line that is not indented and owns every indented
//! line that follows it. Blank lines end the current record and are
//! otherwise ignored.

use std::io::{self, BufRead};

pub struct RecordSplitter<R> {
    reader: R,
    pending: Option<Vec<u8>>,
    done: bool,
}

impl<R: BufRead> RecordSplitter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: None,
            done: false,
        }
    }

    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn next_record(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut record = match self.pending.take() {
            Some(line) => line,
            None => loop {
                match self.read_line()? {
                    Some(line) if is_blank(&line) => continue,
                    Some(line) => break line,
                    None => return Ok(None),
                }
            },
        };

        while let Some(line) = self.read_line()? {
            if is_blank(&line) {
                break;
            }
            if is_continuation(&line) {
                // Lines read at EOF may lack the terminator
                if record.last() != Some(&b'\n') {
                    record.push(b'\n');
                }
                record.extend_from_slice(&line);
            } else {
                self.pending = Some(line);
                break;
            }
        }

        Ok(Some(record))
    }
}

impl<R: BufRead> Iterator for RecordSplitter<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(|b| b.is_ascii_whitespace())
}

fn is_continuation(line: &[u8]) -> bool {
    matches!(line.first(), Some(b' ' | b'\t'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn split(input: &[u8]) -> Vec<Vec<u8>> {
        RecordSplitter::new(Cursor::new(input))
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_split_single_line_records() {
        let records = split(b"6,1,100;first\n6,2,200;second\n");
        assert_eq!(
            records,
            vec![b"6,1,100;first\n".to_vec(), b"6,2,200;second\n".to_vec()]
        );
    }

    #[test]
    fn test_split_groups_indented_lines() {
        let records = split(
            b"6,1,100;first\n SUBSYSTEM=pci\n DEVICE=+pci:0000:02:00.0\n6,2,200;second\n",
        );
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            b"6,1,100;first\n SUBSYSTEM=pci\n DEVICE=+pci:0000:02:00.0\n".to_vec()
        );
        assert_eq!(records[1], b"6,2,200;second\n".to_vec());
    }

    #[test]
    fn test_split_blank_lines_separate_records() {
        let records = split(b"\n\n6,1,100;first\n\n TAIL=orphan\n\n");
        assert_eq!(
            records,
            vec![b"6,1,100;first\n".to_vec(), b" TAIL=orphan\n".to_vec()]
        );
    }

    #[test]
    fn test_split_missing_final_newline() {
        let records = split(b"6,1,100;first\n DEVICE=n2");
        assert_eq!(records, vec![b"6,1,100;first\n DEVICE=n2".to_vec()]);
    }

    #[test]
    fn test_split_empty_input() {
        assert!(split(b"").is_empty());
        assert!(split(b"\n \n").is_empty());
    }

    #[test]
    fn test_split_tab_indented() {
        let records = split(b"6,1,100;first\n\tKEY=value\n");
        assert_eq!(records, vec![b"6,1,100;first\n\tKEY=value\n".to_vec()]);
    }
}
