//! Project housekeeping commands: `init` and `sessions`.

use anyhow::{Context, Result};
use std::path::Path;
use triage::audit::SessionWriter;
use triage::config::Config;
use triage::ui::SessionUi;

/// Create the `.triage/` layout and a sample issue payload for offline use.
pub fn cmd_init(project_dir: &Path) -> Result<()> {
    let config = Config::new(project_dir.to_path_buf(), None, false)?;
    config.ensure_directories()?;

    let sample = serde_json::json!({
        "title": "IndexError when processing the last item",
        "state": "open",
        "description": "Processing a list of N items crashes on item N.\n\nTraceback (most recent call last):\n  IndexError: list index out of range",
        "issue_url": "https://github.com/acme/app/issues/1",
        "issue_number": 1,
        "labels": ["bug"],
        "error_message": "IndexError: list index out of range",
        "linked_files": []
    });
    let sample_path = config.session_dir.join("sample-issue.json");
    std::fs::write(&sample_path, serde_json::to_string_pretty(&sample)?)
        .with_context(|| format!("Failed to write {}", sample_path.display()))?;

    let ui = SessionUi::new(false);
    ui.success(&format!(
        "initialized {} (sample issue at {})",
        config.session_dir.display(),
        sample_path.display()
    ));
    Ok(())
}

/// List archived session logs, most recent first.
pub fn cmd_sessions(project_dir: &Path) -> Result<()> {
    let config = Config::new(project_dir.to_path_buf(), None, false)?;
    let writer = SessionWriter::new(&config.session_dir);
    let sessions = writer.list_sessions()?;

    let ui = SessionUi::new(false);
    if sessions.is_empty() {
        ui.note("no archived sessions; run `triage debug <issue-url>` first");
        return Ok(());
    }
    for session in sessions {
        println!("  {}", session.display());
    }
    Ok(())
}
