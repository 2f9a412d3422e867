//! Compiles the final session report from the accumulated facts and the
//! audit log.
//!
//! Compilation is a pure fold over already-collected data and never fails:
//! missing facts render as "undetermined" rather than aborting. Only
//! persistence ([`save_local`]) can return an error.

use crate::audit::{AuditLog, DetailKind};
use crate::session::SessionData;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Compiled session report, ready to persist or post.
#[derive(Debug, Clone)]
pub struct Report {
    pub session_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub markdown: String,
}

/// Glyph for an experiment row, inferred from the analysis text.
fn status_glyph(analysis: &str) -> &'static str {
    let lower = analysis.to_lowercase();
    const FAILURE: &[&str] = &["fail", "error", "unable", "unreachable", "rejected", "down"];
    const SUCCESS: &[&str] = &["confirm", "pass", "success", "generated", "applied", "match"];
    if FAILURE.iter().any(|w| lower.contains(w)) {
        "✗"
    } else if SUCCESS.iter().any(|w| lower.contains(w)) {
        "✓"
    } else {
        "·"
    }
}

fn render_duration(started: DateTime<Utc>, ended: DateTime<Utc>) -> String {
    let secs = (ended - started).num_seconds().max(0);
    format!("{}m {}s", secs / 60, secs % 60)
}

/// Compile the report from the session facts and the audit log.
///
/// The step table keeps `Start` and `Completion` lifecycle entries; `Retry`
/// notices and `Error` records stay in the raw log only.
pub fn compile(data: &SessionData, audit: &AuditLog) -> Report {
    let generated_at = Utc::now();
    let mut md = String::new();

    md.push_str("# Debug Session Report\n\n");
    md.push_str(&format!("- Session: `{}`\n", audit.session_id()));
    md.push_str(&format!(
        "- Started: {}\n",
        audit.started_at().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!(
        "- Duration: {}\n\n",
        render_duration(audit.started_at(), generated_at)
    ));

    md.push_str("## Bug\n\n");
    match &data.bug_report {
        Some(report) => {
            md.push_str(&format!("- Issue: {}\n", report.issue_url));
            md.push_str(&format!("- Title: {}\n", report.title));
            md.push_str(&format!("- Error: {}\n\n", report.error_display()));
        }
        None => md.push_str("- Issue: undetermined\n\n"),
    }

    md.push_str("## Quality Indicators\n\n");
    md.push_str(&format!(
        "| Indicator | Value |\n|---|---|\n\
         | Reproduction confirmed | {} |\n\
         | Root cause confirmed | {} |\n\
         | Patch applied | {} |\n\
         | Regression suite passed | {} |\n\n",
        SessionData::indicator(data.repro_confirmed),
        SessionData::indicator(data.root_cause_confirmed),
        SessionData::indicator(data.patch_applied),
        SessionData::indicator(data.regression_passed),
    ));

    md.push_str("## Steps Performed\n\n");
    md.push_str("| Step | Phase | Time | Detail |\n|---|---|---|---|\n");
    for detail in audit.steps() {
        let phase = match detail.kind {
            DetailKind::Start => "start",
            DetailKind::Completion => "done",
            DetailKind::Retry | DetailKind::Error => continue,
        };
        let summary = detail
            .data
            .get("summary")
            .map(String::as_str)
            .unwrap_or(&detail.step_name);
        md.push_str(&format!(
            "| {} {} | {} | {} | {} |\n",
            detail.step_number,
            detail.step_name,
            phase,
            detail.timestamp.format("%H:%M:%S"),
            summary
        ));
    }
    md.push('\n');

    md.push_str("## Decisions\n\n");
    if audit.decisions().is_empty() {
        md.push_str("No operator decisions were recorded.\n\n");
    } else {
        md.push_str("| Context | Selected | Reasoning |\n|---|---|---|\n");
        for decision in audit.decisions() {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                decision.context, decision.selected, decision.reasoning
            ));
        }
        md.push('\n');
    }

    md.push_str("## Experiments\n\n");
    if audit.experiments().is_empty() {
        md.push_str("No experiments were recorded.\n\n");
    } else {
        md.push_str("| | Type | Analysis |\n|---|---|---|\n");
        for experiment in audit.experiments() {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                status_glyph(&experiment.analysis),
                experiment.experiment_type,
                experiment.analysis
            ));
        }
        md.push('\n');
    }

    md.push_str("## Outcome\n\n");
    md.push_str(&format!("- Root cause: {}\n", data.hypothesis_display()));
    match &data.patch {
        Some(patch) => {
            md.push_str(&format!(
                "- Patch: `{}` line {}\n\n```diff\n{}\n```\n",
                patch.file_path,
                patch.line_number,
                patch.diff()
            ));
        }
        None => md.push_str("- Patch: undetermined\n"),
    }
    match &data.regression {
        Some(regression) => md.push_str(&format!("- Regression: {}\n", regression.summary())),
        None => md.push_str("- Regression: undetermined\n"),
    }

    Report {
        session_id: audit.session_id(),
        generated_at,
        markdown: md,
    }
}

/// Write the report as `triage_report_YYYYMMDD.md` under `dir`.
pub fn save_local(report: &Report, dir: &Path) -> Result<PathBuf> {
    let file_name = format!("triage_report_{}.md", report.generated_at.format("%Y%m%d"));
    let path = dir.join(file_name);
    std::fs::write(&path, &report.markdown)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(path)
}
