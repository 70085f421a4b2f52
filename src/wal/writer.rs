//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use super::reader::trim_line;
use super::WalRecord;

/// Buffered bytes are written out early once they exceed this size
const MAX_BUFFERED_BYTES: usize = 1024 * 1024;

/// Chunk size for scanning back to the last newline on open
const TAIL_SCAN_CHUNK: u64 = 8 * 1024;

/// What [`WalWriter::open`] found after the last newline of an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailRepair {
    /// Empty, or ended with a newline
    Clean,
    /// A complete record was missing its newline; one was appended
    Terminated,
    /// An incomplete record was cut off
    Truncated { dropped: u64 },
}

/// Writes records to the WAL file
///
/// Records are encoded whole into an in-memory buffer and only reach the
/// file on [`flush`](Self::flush), so a line is never split across writes
/// from this process. A flush that fails is cut back to the last
/// committed length before the buffer is retried.
pub struct WalWriter {
    path: PathBuf,
    file: File,
    buffer: Vec<u8>,
    /// File length covered by successful flushes
    committed: u64,
    /// Set while bytes past `committed` may be on disk
    needs_rollback: bool,
    /// Records appended since open or the last truncate
    records: u64,
    tail: TailRepair,
    #[cfg(test)]
    fail_after: Option<usize>,
}

impl WalWriter {
    /// Open or create a WAL file for appending
    ///
    /// An existing file always ends on a line boundary afterwards: an
    /// unterminated last line that parses gets its newline, anything else
    /// after the last newline is cut off.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        let (tail, committed) = repair_tail(&mut file)?;
        match tail {
            TailRepair::Clean => {}
            TailRepair::Terminated => tracing::warn!(
                "Terminated unfinished last line of WAL {}",
                path.display()
            ),
            TailRepair::Truncated { dropped } => tracing::warn!(
                "Cut {} bytes of incomplete record from WAL {}",
                dropped,
                path.display()
            ),
        }

        tracing::debug!("Opened WAL at {} ({} bytes)", path.display(), committed);

        Ok(Self {
            path: path.to_path_buf(),
            file,
            buffer: Vec::new(),
            committed,
            needs_rollback: false,
            records: 0,
            tail,
            #[cfg(test)]
            fail_after: None,
        })
    }

    /// Append a record to the write buffer
    pub fn append(&mut self, record: &WalRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.buffer.extend_from_slice(&line);
        self.records += 1;

        if self.buffer.len() >= MAX_BUFFERED_BYTES {
            self.flush()?;
        }
        Ok(())
    }

    /// Write buffered records and sync them to disk
    ///
    /// On error the buffer is kept and the file is cut back to the last
    /// committed length, so a later flush writes every record exactly once.
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        if self.needs_rollback {
            self.file.set_len(self.committed)?;
            self.needs_rollback = false;
        }

        if let Err(e) = self.write_buffer() {
            self.needs_rollback = true;
            match self.file.set_len(self.committed) {
                Ok(()) => self.needs_rollback = false,
                Err(rollback) => tracing::error!(
                    "Cannot cut WAL {} back to {} bytes: {}",
                    self.path.display(),
                    self.committed,
                    rollback
                ),
            }
            return Err(e.into());
        }

        self.committed += self.buffer.len() as u64;
        self.buffer.clear();
        Ok(())
    }

    #[cfg(not(test))]
    fn write_buffer(&mut self) -> io::Result<()> {
        self.file.write_all(&self.buffer)?;
        self.file.sync_data()
    }

    #[cfg(test)]
    fn write_buffer(&mut self) -> io::Result<()> {
        match self.fail_after.take() {
            Some(limit) => {
                let limit = limit.min(self.buffer.len());
                self.file.write_all(&self.buffer[..limit])?;
                Err(io::Error::new(io::ErrorKind::Other, "short write"))
            }
            None => {
                self.file.write_all(&self.buffer)?;
                self.file.sync_data()
            }
        }
    }

    /// Discard buffered records and empty the file
    ///
    /// Only valid once a checkpoint holds everything written so far.
    pub fn truncate(&mut self) -> Result<()> {
        self.buffer.clear();
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.sync_all()?;
        self.committed = 0;
        self.needs_rollback = false;
        self.records = 0;
        Ok(())
    }

    /// Number of bytes waiting for the next flush
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Records appended since open or the last truncate
    pub fn record_count(&self) -> u64 {
        self.records
    }

    /// What `open` did with the file's last line
    pub fn tail_repair(&self) -> TailRepair {
        self.tail
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Leave `file` ending on a newline; returns the repair and the new length
fn repair_tail(file: &mut File) -> Result<(TailRepair, u64)> {
    let len = file.metadata()?.len();
    let start = last_line_end(file, len)?;
    if start == len {
        return Ok((TailRepair::Clean, len));
    }

    let mut tail = Vec::new();
    file.seek(SeekFrom::Start(start))?;
    std::io::Read::by_ref(file).take(len - start).read_to_end(&mut tail)?;

    let body = trim_line(&tail);
    if !body.is_empty() && serde_json::from_slice::<WalRecord>(body).is_ok() {
        file.write_all(b"\n")?;
        file.sync_data()?;
        Ok((TailRepair::Terminated, len + 1))
    } else {
        file.set_len(start)?;
        file.sync_all()?;
        Ok((TailRepair::Truncated { dropped: len - start }, start))
    }
}

/// Offset just past the last newline in the first `len` bytes, or 0
fn last_line_end(file: &mut File, len: u64) -> io::Result<u64> {
    let mut chunk = vec![0u8; TAIL_SCAN_CHUNK as usize];
    let mut end = len;
    while end > 0 {
        let start = end.saturating_sub(TAIL_SCAN_CHUNK);
        let buf = &mut chunk[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(buf)?;
        if let Some(i) = buf.iter().rposition(|&b| b == b'\n') {
            return Ok(start + i as u64 + 1);
        }
        end = start;
    }
    Ok(0)
}
