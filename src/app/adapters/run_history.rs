//! Append-only run history
//!
//! Each run appends one JSON line to the snapshot file (successful runs only)
//! and one to the quality file (every run). Earlier lines are never rewritten.

use crate::app::models::quality_log::DataQualityLog;
use crate::app::models::snapshot::KpiSnapshot;
use crate::constants::{QUALITY_HISTORY_FILE, SNAPSHOT_HISTORY_FILE};
use crate::{Error, Result};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON-lines history files under one directory
#[derive(Debug, Clone)]
pub struct RunHistory {
    dir: PathBuf,
}

impl RunHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_HISTORY_FILE)
    }

    pub fn quality_path(&self) -> PathBuf {
        self.dir.join(QUALITY_HISTORY_FILE)
    }

    /// Append the outcome of one run
    pub fn append(&self, snapshot: Option<&KpiSnapshot>, log: &DataQualityLog) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            Error::io(
                format!("Failed to create history directory {}", self.dir.display()),
                e,
            )
        })?;

        if let Some(snapshot) = snapshot {
            append_line(&self.snapshot_path(), snapshot)?;
        }
        append_line(&self.quality_path(), log)?;

        debug!("Recorded run {} in {}", log.run_id, self.dir.display());
        Ok(())
    }

    /// Number of snapshots recorded so far
    pub fn snapshot_count(&self) -> Result<usize> {
        count_lines(&self.snapshot_path())
    }

    /// Every recorded quality log, oldest first
    pub fn quality_logs(&self) -> Result<Vec<DataQualityLog>> {
        let path = self.quality_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&path)
            .map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;
        let mut logs = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                logs.push(serde_json::from_str(&line)?);
            }
        }
        Ok(logs)
    }
}

fn append_line<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;
    file.write_all(line.as_bytes())
        .map_err(|e| Error::io(format!("Failed to append to {}", path.display()), e))?;
    Ok(())
}

fn count_lines(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let file = fs::File::open(path)
        .map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;
    let mut count = 0;
    for line in BufReader::new(file).lines() {
        if !line?.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::snapshot::{Metric, SnapshotBuilder};
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn create_test_snapshot(run_id: Uuid) -> KpiSnapshot {
        let mut builder = SnapshotBuilder::new(run_id, Utc::now(), "tabular");
        for metric in Metric::ALL {
            builder.set(metric, 1i64);
        }
        builder.finish().unwrap()
    }

    #[test]
    fn test_append_never_rewrites() {
        let temp_dir = TempDir::new().unwrap();
        let history = RunHistory::new(temp_dir.path().join("history"));

        for _ in 0..3 {
            let run_id = Uuid::new_v4();
            let log = DataQualityLog::new(run_id, Utc::now());
            history
                .append(Some(&create_test_snapshot(run_id)), &log)
                .unwrap();
        }

        assert_eq!(history.snapshot_count().unwrap(), 3);
        assert_eq!(history.quality_logs().unwrap().len(), 3);
    }

    #[test]
    fn test_failed_run_records_quality_log_only() {
        let temp_dir = TempDir::new().unwrap();
        let history = RunHistory::new(temp_dir.path());
        let mut log = DataQualityLog::new(Uuid::new_v4(), Utc::now());
        log.mark_failed("boom");

        history.append(None, &log).unwrap();

        assert_eq!(history.snapshot_count().unwrap(), 0);
        let logs = history.quality_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].is_failed());
    }

    #[test]
    fn test_snapshot_line_is_nested_json() {
        let temp_dir = TempDir::new().unwrap();
        let history = RunHistory::new(temp_dir.path());
        let run_id = Uuid::new_v4();

        history
            .append(
                Some(&create_test_snapshot(run_id)),
                &DataQualityLog::new(run_id, Utc::now()),
            )
            .unwrap();

        let content = fs::read_to_string(history.snapshot_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(value["run_id"], run_id.to_string());
        assert_eq!(value["engine"], "tabular");
        assert_eq!(value["metrics"]["revenue_metrics"]["total_revenue"], 1);
    }
}
