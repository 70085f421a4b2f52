//! Tests for WalWriter
//!
//! These tests verify:
//! - Records stay buffered until flush
//! - Flushed files hold one JSON record per line
//! - Reopening appends instead of overwriting
//! - Reopening repairs an unfinished last line
//! - Truncate empties both the buffer and the file

use std::fs;
use std::path::PathBuf;

use ringkv::wal::{RecordReader, TailRepair, WalRecord, WalWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("wal.log");
    (temp_dir, wal_path)
}

fn read_records(path: &PathBuf) -> Vec<WalRecord> {
    RecordReader::<WalRecord>::open(path)
        .unwrap()
        .expect("WAL file should exist")
        .records()
        .collect::<Result<_, _>>()
        .unwrap()
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_file_and_parent_dirs() {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("nested").join("dir").join("wal.log");

    let writer = WalWriter::open(&wal_path).unwrap();
    assert!(wal_path.exists());
    assert_eq!(writer.path(), wal_path.as_path());
    assert_eq!(writer.record_count(), 0);
}

#[test]
fn test_open_fails_when_parent_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();

    assert!(WalWriter::open(&blocker.join("wal.log")).is_err());
}

// =============================================================================
// Append / Flush Tests
// =============================================================================

#[test]
fn test_append_buffers_until_flush() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path).unwrap();

    writer.append(&WalRecord::put("a", b"1".to_vec())).unwrap();
    assert!(writer.pending_bytes() > 0);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), 0);

    writer.flush().unwrap();
    assert_eq!(writer.pending_bytes(), 0);
    assert!(fs::metadata(&wal_path).unwrap().len() > 0);
}

#[test]
fn test_flushed_file_has_one_line_per_record() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path).unwrap();

    writer.append(&WalRecord::put("a", b"1".to_vec())).unwrap();
    writer.append(&WalRecord::update("a", b"2".to_vec())).unwrap();
    writer.append(&WalRecord::delete("a")).unwrap();
    writer.flush().unwrap();

    let contents = fs::read_to_string(&wal_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"{"operation":"PUT","key":"a","value":"MQ=="}"#,
            r#"{"operation":"UPDATE","key":"a","value":"Mg=="}"#,
            r#"{"operation":"DELETE","key":"a"}"#,
        ]
    );
    assert!(contents.ends_with('\n'));
    assert_eq!(writer.record_count(), 3);
}

#[test]
fn test_flush_empty_buffer_is_noop() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path).unwrap();
    writer.flush().unwrap();
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), 0);
}

#[test]
fn test_large_buffer_flushes_early() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path).unwrap();

    let value = vec![7u8; 64 * 1024];
    for i in 0..32 {
        writer.append(&WalRecord::put(format!("k{}", i), value.clone())).unwrap();
    }

    // 32 records of ~87 KiB encoded exceed the buffer cap at least once
    assert!(fs::metadata(&wal_path).unwrap().len() > 0);
    writer.flush().unwrap();
    assert_eq!(read_records(&wal_path).len(), 32);
}

#[test]
fn test_reopen_appends() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path).unwrap();
        writer.append(&WalRecord::put("first", b"1".to_vec())).unwrap();
        writer.flush().unwrap();
    }
    {
        let mut writer = WalWriter::open(&wal_path).unwrap();
        writer.append(&WalRecord::put("second", b"2".to_vec())).unwrap();
        writer.flush().unwrap();
    }

    let keys: Vec<String> = read_records(&wal_path).into_iter().map(|r| r.key).collect();
    assert_eq!(keys, vec!["first", "second"]);
}

// =============================================================================
// Tail Repair Tests
// =============================================================================

#[test]
fn test_reopen_clean_file_leaves_it_alone() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"{\"operation\":\"DELETE\",\"key\":\"a\"}\n").unwrap();

    let writer = WalWriter::open(&wal_path).unwrap();
    assert_eq!(writer.tail_repair(), TailRepair::Clean);
    assert_eq!(read_records(&wal_path), vec![WalRecord::delete("a")]);
}

#[test]
fn test_reopen_cuts_incomplete_last_line() {
    let (_temp, wal_path) = setup_temp_wal();
    let complete = b"{\"operation\":\"DELETE\",\"key\":\"a\"}\n";
    let mut bytes = complete.to_vec();
    bytes.extend_from_slice(b"{\"operation\":\"PU");
    fs::write(&wal_path, &bytes).unwrap();

    let mut writer = WalWriter::open(&wal_path).unwrap();
    assert_eq!(writer.tail_repair(), TailRepair::Truncated { dropped: 16 });
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), complete.len() as u64);

    writer.append(&WalRecord::put("b", b"2".to_vec())).unwrap();
    writer.flush().unwrap();
    assert_eq!(
        read_records(&wal_path),
        vec![WalRecord::delete("a"), WalRecord::put("b", b"2".to_vec())]
    );
}

#[test]
fn test_reopen_terminates_complete_last_line() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"{\"operation\":\"DELETE\",\"key\":\"a\"}").unwrap();

    let mut writer = WalWriter::open(&wal_path).unwrap();
    assert_eq!(writer.tail_repair(), TailRepair::Terminated);

    writer.append(&WalRecord::delete("b")).unwrap();
    writer.flush().unwrap();
    assert_eq!(
        read_records(&wal_path),
        vec![WalRecord::delete("a"), WalRecord::delete("b")]
    );
}

#[test]
fn test_reopen_without_any_newline_cuts_to_empty() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"{\"operation\":").unwrap();

    let writer = WalWriter::open(&wal_path).unwrap();
    assert_eq!(writer.tail_repair(), TailRepair::Truncated { dropped: 13 });
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), 0);
}

// =============================================================================
// Truncate Tests
// =============================================================================

#[test]
fn test_truncate_empties_file_and_buffer() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path).unwrap();

    writer.append(&WalRecord::put("flushed", b"1".to_vec())).unwrap();
    writer.flush().unwrap();
    writer.append(&WalRecord::put("buffered", b"2".to_vec())).unwrap();

    writer.truncate().unwrap();
    assert_eq!(writer.pending_bytes(), 0);
    assert_eq!(writer.record_count(), 0);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), 0);

    writer.append(&WalRecord::put("after", b"3".to_vec())).unwrap();
    writer.flush().unwrap();

    let keys: Vec<String> = read_records(&wal_path).into_iter().map(|r| r.key).collect();
    assert_eq!(keys, vec!["after"]);
}
