//! Record Reader
//!
//! Reads newline-delimited JSON records from WAL and checkpoint files.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{KvError, Result};

/// Reads records of type `T` from a file, one JSON object per line
pub struct RecordReader<T> {
    path: PathBuf,
    reader: BufReader<File>,
    _record: PhantomData<T>,
}

impl<T: DeserializeOwned> RecordReader<T> {
    /// Open a record file
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn open(path: &Path) -> Result<Option<Self>> {
        match File::open(path) {
            Ok(file) => Ok(Some(Self {
                path: path.to_path_buf(),
                reader: BufReader::new(file),
                _record: PhantomData,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Iterate over records in file order
    pub fn records(self) -> RecordIter<T> {
        RecordIter {
            path: self.path,
            reader: self.reader,
            line: 0,
            torn_tail: false,
            done: false,
            _record: PhantomData,
        }
    }
}

/// Iterator over the records of a file
///
/// A final line without its newline terminator that fails to decode is a
/// torn write from a crash: it ends iteration and sets
/// [`torn_tail`](Self::torn_tail). Any other undecodable line yields
/// [`KvError::CorruptRecord`].
pub struct RecordIter<T> {
    path: PathBuf,
    reader: BufReader<File>,
    line: u64,
    torn_tail: bool,
    done: bool,
    _record: PhantomData<T>,
}

impl<T> RecordIter<T> {
    /// Whether an incomplete final line was dropped
    pub fn torn_tail(&self) -> bool {
        self.torn_tail
    }

    /// Number of lines consumed so far
    pub fn lines_read(&self) -> u64 {
        self.line
    }

    fn corrupt(&self, reason: impl Into<String>) -> KvError {
        KvError::CorruptRecord {
            path: self.path.clone(),
            line: self.line,
            reason: reason.into(),
        }
    }
}

impl<T: DeserializeOwned> Iterator for RecordIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = Vec::new();
        while !self.done {
            buf.clear();
            let read = match self.reader.read_until(b'\n', &mut buf) {
                Ok(n) => n,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            if read == 0 {
                self.done = true;
                break;
            }
            self.line += 1;

            let terminated = buf.last() == Some(&b'\n');
            let body = trim_line(&buf);
            if body.is_empty() {
                continue;
            }

            return match serde_json::from_slice::<T>(body) {
                Ok(record) => Some(Ok(record)),
                Err(e) if !terminated => {
                    tracing::warn!(
                        "Dropping incomplete final record at {}:{}: {}",
                        self.path.display(),
                        self.line,
                        e
                    );
                    self.torn_tail = true;
                    self.done = true;
                    None
                }
                Err(e) => {
                    self.done = true;
                    Some(Err(self.corrupt(e.to_string())))
                }
            };
        }
        None
    }
}

pub(super) fn trim_line(buf: &[u8]) -> &[u8] {
    let start = buf
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(buf.len());
    let end = buf
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &buf[start..end]
}
