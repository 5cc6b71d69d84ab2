//! Advisory-locked file access for the workflow store and event log.
//!
//! Locks are `fs2` advisory locks: they only protect against other processes
//! that go through these functions too, e.g. two CLI invocations sharing a
//! store directory.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Read a whole file under a shared lock.
pub fn locked_read(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    file.lock_shared()
        .with_context(|| format!("Failed to acquire shared lock: {}", path.display()))?;
    let mut content = String::new();
    BufReader::new(&file)
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(content)
}

/// Replace a file's contents under an exclusive lock.
///
/// The file is truncated only after the lock is held, so a concurrent
/// reader never observes an empty record.
pub fn locked_write(path: &Path, content: &str) -> Result<()> {
    #[allow(clippy::suspicious_open_options)]
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open file for writing: {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to acquire exclusive lock: {}", path.display()))?;
    file.set_len(0)
        .with_context(|| format!("Failed to truncate file: {}", path.display()))?;
    let mut writer = BufWriter::new(&file);
    writer
        .write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush file: {}", path.display()))?;
    Ok(())
}

/// Append one line under an exclusive lock.
pub fn locked_append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open file for appending: {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to acquire exclusive lock: {}", path.display()))?;
    writeln!(file, "{line}")
        .with_context(|| format!("Failed to append to file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_locked_write_overwrites_record() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("workflow-proj-1.json");

        locked_write(&path, r#"{"state":"architecture"}"#).unwrap();
        locked_write(&path, r#"{"state":"alignment"}"#).unwrap();

        assert_eq!(locked_read(&path).unwrap(), r#"{"state":"alignment"}"#);
    }

    #[test]
    fn test_append_keeps_every_line() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("events.jsonl");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                thread::spawn(move || locked_append_line(&path, &format!("event {i}")).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = locked_read(&path).unwrap();
        assert_eq!(content.lines().count(), 8);
    }

    #[test]
    fn test_read_missing_file_is_error() {
        let temp = tempfile::tempdir().unwrap();
        assert!(locked_read(&temp.path().join("absent.json")).is_err());
    }
}
