//! Runtime configuration for a triage session.
//!
//! Bridges CLI flags with environment settings (`.env` is honored via
//! dotenvy) and owns the `.triage/` session directory layout.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default diagnostic backend, matching the local dev server.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Bound on every remote collaborator call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    /// `.triage/` under the project directory.
    pub session_dir: PathBuf,
    pub server_url: String,
    pub github_token: Option<String>,
    pub request_timeout: Duration,
    pub verbose: bool,
}

impl Config {
    /// Resolve configuration from CLI arguments and the environment.
    ///
    /// `server_url` falls back to `TRIAGE_SERVER_URL`, then to the local
    /// default. The GitHub token is only ever read from the environment.
    pub fn new(project_dir: PathBuf, server_url: Option<String>, verbose: bool) -> Result<Self> {
        // A missing .env is fine; an unreadable one is not worth failing over.
        dotenvy::dotenv().ok();

        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let session_dir = project_dir.join(".triage");

        let server_url = server_url
            .or_else(|| std::env::var("TRIAGE_SERVER_URL").ok())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let github_token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        Ok(Self {
            project_dir,
            session_dir,
            server_url,
            github_token,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            verbose,
        })
    }

    /// Create the `.triage/` layout the session writer expects.
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.session_dir)
            .context("Failed to create session directory")?;
        std::fs::create_dir_all(self.session_dir.join("sessions"))
            .context("Failed to create sessions directory")?;
        Ok(())
    }

    /// Minimal config for tests: no env lookups, temp-friendly paths.
    pub fn for_tests(project_dir: PathBuf) -> Self {
        let session_dir = project_dir.join(".triage");
        Self {
            project_dir,
            session_dir,
            server_url: DEFAULT_SERVER_URL.to_string(),
            github_token: None,
            request_timeout: Duration::from_secs(1),
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ensure_directories_creates_session_layout() {
        let dir = tempdir().unwrap();
        let config = Config::for_tests(dir.path().to_path_buf());
        config.ensure_directories().unwrap();
        assert!(dir.path().join(".triage").is_dir());
        assert!(dir.path().join(".triage/sessions").is_dir());
    }

    #[test]
    fn new_resolves_project_dir_and_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().to_path_buf(), None, false).unwrap();
        assert!(config.project_dir.is_absolute());
        assert_eq!(config.session_dir.file_name().unwrap(), ".triage");
        assert!(!config.server_url.is_empty());
    }

    #[test]
    fn explicit_server_url_wins() {
        let dir = tempdir().unwrap();
        let config = Config::new(
            dir.path().to_path_buf(),
            Some("http://diag.internal:9000".to_string()),
            true,
        )
        .unwrap();
        assert_eq!(config.server_url, "http://diag.internal:9000");
        assert!(config.verbose);
    }
}
