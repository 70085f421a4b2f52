//! Checkpoint writer
//!
//! Snapshots the table into a checkpoint file and truncates the WAL.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::table::Table;
use crate::wal::CheckpointRecord;

use super::WalHandle;

/// Take a checkpoint of `table` into `path`, then truncate the WAL
///
/// Runs entirely under the table's shared lock. Returns the number of
/// entries written.
pub fn take_checkpoint(table: &Table, wal: &WalHandle, path: &Path) -> Result<usize> {
    table.read_locked(|snapshot| {
        let written = write_snapshot(snapshot.entries(), path)?;
        wal.truncate()?;
        Ok(written)
    })
}

/// Atomically replace `path` with one checkpoint record per entry
///
/// Entries go to a sibling temp file that is synced and renamed over
/// `path`, so readers only ever see a complete checkpoint. The parent
/// directory is synced after the rename so the new file survives a power
/// loss before the WAL is truncated.
pub fn write_snapshot<'a>(
    entries: impl IntoIterator<Item = (&'a str, &'a [u8])>,
    path: &Path,
) -> Result<usize> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let tmp_path = temp_path(path);
    let file = File::create(&tmp_path)?;
    let mut writer = BufWriter::new(file);

    let mut written = 0;
    for (key, value) in entries {
        serde_json::to_writer(&mut writer, &CheckpointRecord::new(key, value))?;
        writer.write_all(b"\n")?;
        written += 1;
    }

    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);

    fs::rename(&tmp_path, path)?;
    sync_parent_dir(path)?;
    tracing::debug!("Wrote {} checkpoint records to {}", written, path.display());
    Ok(written)
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    File::open(dir)?.sync_all()?;
    Ok(())
}

// Directory handles cannot be synced this way off Unix
#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("checkpoint"));
    name.push(".tmp");
    path.with_file_name(name)
}
