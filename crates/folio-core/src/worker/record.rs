// Persists the worker's lifecycle position between runs, so `install` and
// `activate` can be separate invocations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::WorkerState;

/// Record file name in the cache directory
const RECORD_FILE: &str = "worker.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub cache_name: String,
    pub state: WorkerState,
    pub updated_at: DateTime<Utc>,
}

impl WorkerRecord {
    pub fn new(cache_name: &str, state: WorkerState) -> Self {
        Self {
            cache_name: cache_name.to_string(),
            state,
            updated_at: Utc::now(),
        }
    }

    /// State to resume a worker for `cache_name` at. A record written for a
    /// different bucket belongs to an older deploy, so the new worker starts
    /// from scratch.
    pub fn state_for(&self, cache_name: &str) -> WorkerState {
        if self.cache_name == cache_name {
            self.state
        } else {
            WorkerState::Parsed
        }
    }
}

pub struct RecordStore {
    cache_dir: PathBuf,
    pub data: Option<WorkerRecord>,
}

impl RecordStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Load the record from disk
    pub fn load(&mut self) -> Result<bool> {
        let path = self.record_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read worker record")?;
            let data: WorkerRecord = serde_json::from_str(&contents)
                .context("Failed to parse worker record")?;
            self.data = Some(data);
            return Ok(true);
        }
        Ok(false)
    }

    /// Save the record to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.record_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    pub fn update(&mut self, data: WorkerRecord) {
        self.data = Some(data);
    }

    pub fn state_for(&self, cache_name: &str) -> WorkerState {
        self.data
            .as_ref()
            .map(|d| d.state_for(cache_name))
            .unwrap_or(WorkerState::Parsed)
    }

    fn record_path(&self) -> PathBuf {
        self.cache_dir.join(RECORD_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordStore::new(dir.path().to_path_buf());
        assert!(!store.load().unwrap());
        assert_eq!(store.state_for("site"), WorkerState::Parsed);

        store.update(WorkerRecord::new("site", WorkerState::Installed));
        store.save().unwrap();

        let mut reloaded = RecordStore::new(dir.path().to_path_buf());
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.state_for("site"), WorkerState::Installed);
    }

    #[test]
    fn test_record_for_other_cache_starts_over() {
        let record = WorkerRecord::new("site-v1", WorkerState::Activated);
        assert_eq!(record.state_for("site-v1"), WorkerState::Activated);
        assert_eq!(record.state_for("site-v2"), WorkerState::Parsed);
    }
}
