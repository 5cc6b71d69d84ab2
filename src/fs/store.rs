//! Workflow persistence.
//!
//! A store holds one snapshot per workflow id. The engine writes through it
//! after every mutation and replays every key on startup.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::locking::{locked_read, locked_write};
use crate::engine::WorkflowSnapshot;

pub trait WorkflowStore {
    fn put(&mut self, id: &str, snapshot: &WorkflowSnapshot) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<WorkflowSnapshot>>;
    fn list_keys(&self) -> Result<Vec<String>>;
}

/// Store kept in process memory. Snapshots are held serialized so a reload
/// goes through the same serde path as the file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkflowStore for MemoryStore {
    fn put(&mut self, id: &str, snapshot: &WorkflowSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot).context("Failed to serialize workflow")?;
        self.records.insert(id.to_string(), json);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<WorkflowSnapshot>> {
        self.records
            .get(id)
            .map(|json| serde_json::from_str(json).context("Failed to parse workflow"))
            .transpose()
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.records.keys().cloned().collect())
    }
}

/// One pretty-printed JSON file per workflow under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl WorkflowStore for FileStore {
    fn put(&mut self, id: &str, snapshot: &WorkflowSnapshot) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).with_context(|| {
                format!("Failed to create store directory: {}", self.dir.display())
            })?;
        }
        let json = serde_json::to_string_pretty(snapshot)
            .with_context(|| format!("Failed to serialize workflow {id}"))?;
        locked_write(&self.record_path(id), &json)
    }

    fn get(&self, id: &str) -> Result<Option<WorkflowSnapshot>> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = locked_read(&path)?;
        let snapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse workflow file: {}", path.display()))?;
        Ok(Some(snapshot))
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read store directory: {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
