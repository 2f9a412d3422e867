//! Durable persistence for the in-memory [`AuditLog`].
//!
//! The writer snapshots the log to `current-session.json` after every step
//! and archives it under `sessions/` when the run ends. A persistence
//! failure must never change the outcome of the step that triggered it, so
//! `snapshot` absorbs I/O errors into a warning instead of returning them.

use super::AuditLog;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct SessionWriter {
    session_dir: PathBuf,
    current_file: PathBuf,
}

impl SessionWriter {
    pub fn new(session_dir: &Path) -> Self {
        Self {
            session_dir: session_dir.to_path_buf(),
            current_file: session_dir.join("current-session.json"),
        }
    }

    /// Persist the log as it stands. Failures are reported via `tracing`
    /// and swallowed.
    pub fn snapshot(&self, log: &AuditLog) {
        if let Err(e) = self.try_snapshot(log) {
            tracing::warn!("failed to snapshot audit log: {e:#}");
        }
    }

    fn try_snapshot(&self, log: &AuditLog) -> Result<()> {
        let json = serde_json::to_string_pretty(log).context("Failed to serialize audit log")?;
        fs::write(&self.current_file, json).with_context(|| {
            format!("Failed to write {}", self.current_file.display())
        })?;
        Ok(())
    }

    /// Archive the finished log under `sessions/` and remove the
    /// current-session snapshot. Returns the archive path.
    pub fn finish(&self, log: &AuditLog) -> Result<PathBuf> {
        let filename = format!(
            "{}_{}.json",
            log.started_at().format("%Y-%m-%dT%H-%M-%S"),
            &log.session_id().to_string()[..8]
        );
        let archive = self.session_dir.join("sessions").join(&filename);

        let json = serde_json::to_string_pretty(log).context("Failed to serialize audit log")?;
        fs::write(&archive, json)
            .with_context(|| format!("Failed to write {}", archive.display()))?;

        if self.current_file.exists() {
            fs::remove_file(&self.current_file)
                .context("Failed to remove current-session.json after archiving")?;
        }
        Ok(archive)
    }

    /// List archived session logs, most recent first.
    pub fn list_sessions(&self) -> Result<Vec<PathBuf>> {
        let sessions_dir = self.session_dir.join("sessions");
        if !sessions_dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions: Vec<PathBuf> = fs::read_dir(&sessions_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
            .collect();

        sessions.sort();
        sessions.reverse();
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::DetailKind;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn setup_writer() -> (SessionWriter, TempDir) {
        let dir = TempDir::new().expect("failed to create temp dir");
        fs::create_dir_all(dir.path().join("sessions")).expect("failed to create sessions dir");
        let writer = SessionWriter::new(dir.path());
        (writer, dir)
    }

    #[test]
    fn snapshot_writes_current_session_file() {
        let (writer, dir) = setup_writer();
        let mut log = AuditLog::new();
        log.record_step(1, "Reproduce", DetailKind::Start, BTreeMap::new());
        writer.snapshot(&log);

        let path = dir.path().join("current-session.json");
        assert!(path.exists(), "current-session.json must exist");
        let content = fs::read_to_string(&path).unwrap();
        let parsed: AuditLog = serde_json::from_str(&content).expect("snapshot must be valid JSON");
        assert_eq!(parsed.steps().len(), 1);
    }

    #[test]
    fn snapshot_swallows_io_failure() {
        // Points at a directory that does not exist; must not panic.
        let writer = SessionWriter::new(Path::new("/nonexistent/triage-audit"));
        let log = AuditLog::new();
        writer.snapshot(&log);
    }

    #[test]
    fn finish_archives_and_removes_current() {
        let (writer, dir) = setup_writer();
        let mut log = AuditLog::new();
        log.record_step(1, "Reproduce", DetailKind::Start, BTreeMap::new());
        writer.snapshot(&log);

        let archive = writer.finish(&log).expect("finish must succeed");
        assert!(archive.exists(), "archive file must exist");
        assert!(
            !dir.path().join("current-session.json").exists(),
            "current-session.json must be removed after archiving"
        );

        let content = fs::read_to_string(&archive).unwrap();
        let parsed: AuditLog = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.session_id(), log.session_id());
    }

    #[test]
    fn list_sessions_returns_most_recent_first() {
        let (writer, _dir) = setup_writer();
        assert!(writer.list_sessions().unwrap().is_empty());

        let log = AuditLog::new();
        writer.finish(&log).unwrap();
        let sessions = writer.list_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
    }
}
