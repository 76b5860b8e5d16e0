//! Generation run history
//!
//! Each CLI export/generate run appends a [`StatusEntry`] to a JSON file.

use crate::error::{AtlasError, Result};
use crate::StatusTrackingConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub types: Vec<String>,
    pub format: String,
    pub output: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Size of the rendered output
    pub bytes: usize,
}

impl StatusEntry {
    pub fn new(command: &str, types: &[String], format: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            command: command.to_string(),
            types: types.to_vec(),
            format: format.to_string(),
            output: None,
            success: true,
            error: None,
            bytes: 0,
        }
    }

    pub fn failed(mut self, error: impl ToString) -> Self {
        self.success = false;
        self.error = Some(error.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct StatusTracker {
    enabled: bool,
    path: PathBuf,
    track_history: bool,
    max_entries: usize,
}

impl StatusTracker {
    /// `file_path` is resolved against `base` when relative
    pub fn new(config: &StatusTrackingConfig, base: &Path) -> Self {
        let path = PathBuf::from(&config.file_path);
        Self {
            enabled: config.enabled,
            path: if path.is_absolute() { path } else { base.join(path) },
            track_history: config.track_history,
            max_entries: config.max_entries.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Entries oldest first; a missing file is an empty history
    pub fn history(&self) -> Result<Vec<StatusEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn record(&self, entry: StatusEntry) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let mut entries = if self.track_history {
            match self.history() {
                Ok(entries) => entries,
                Err(AtlasError::Serialization(e)) => {
                    tracing::warn!(
                        "Unreadable status history {}, starting over: {}",
                        self.path.display(),
                        e
                    );
                    Vec::new()
                }
                Err(e) => return Err(e),
            }
        } else {
            Vec::new()
        };
        entries.push(entry);
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(&entries)?)?;
        tracing::debug!("Recorded status entry in {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(dir: &Path, track_history: bool, max_entries: usize) -> StatusTracker {
        StatusTracker::new(
            &StatusTrackingConfig {
                enabled: true,
                file_path: "storage/atlas/status.json".into(),
                track_history,
                max_entries,
            },
            dir,
        )
    }

    #[test]
    fn test_history_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(dir.path(), true, 2);
        for kind in ["models", "routes", "jobs"] {
            tracker
                .record(StatusEntry::new("export", &[kind.to_string()], "json"))
                .unwrap();
        }
        let history = tracker.history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].types, vec!["routes"]);
        assert_eq!(history[1].types, vec!["jobs"]);
    }

    #[test]
    fn test_without_history_keeps_latest() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(dir.path(), false, 10);
        tracker.record(StatusEntry::new("export", &[], "json")).unwrap();
        tracker
            .record(StatusEntry::new("generate", &[], "html").failed("boom"))
            .unwrap();
        let history = tracker.history().unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].success);
        assert_eq!(history[0].error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_corrupt_history_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(dir.path(), true, 10);
        std::fs::create_dir_all(tracker.path().parent().unwrap()).unwrap();
        std::fs::write(tracker.path(), "{ not json").unwrap();
        assert!(tracker.history().is_err());

        tracker
            .record(StatusEntry::new("export", &["models".to_string()], "json"))
            .unwrap();
        let history = tracker.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].types, vec!["models"]);
    }

    #[test]
    fn test_disabled_tracker_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = StatusTracker::new(
            &StatusTrackingConfig {
                enabled: false,
                ..Default::default()
            },
            dir.path(),
        );
        tracker.record(StatusEntry::new("export", &[], "json")).unwrap();
        assert!(!tracker.path().exists());
    }
}
