//! Step 7: compile the session report and route it to its destination.
//!
//! Compilation never fails; only the chosen sink can. A failed post to the
//! issue falls back to a local save so the record is never lost.

use crate::audit::{DetailKind, detail_map};
use crate::errors::StepError;
use crate::issue::IssueConnector;
use crate::outcome::Outcome;
use crate::report::{self, Report};
use crate::sequencer::Step;
use crate::session::SessionContext;
use async_trait::async_trait;

pub struct Document;

const NAME: &str = "Document";
const DESCRIPTION: &str = "Compile the session report and deliver it";

async fn post_to_issue(ctx: &SessionContext, report: &Report) -> Result<(), StepError> {
    let issue_url = ctx
        .data
        .bug_report
        .as_ref()
        .map(|r| r.issue_url.clone())
        .ok_or_else(|| StepError::MissingFact {
            step: NAME.to_string(),
            fact: "bug_report",
        })?;
    let connector = IssueConnector::new(
        ctx.config.github_token.clone(),
        ctx.config.request_timeout,
    );
    connector
        .post_comment(&issue_url, &report.markdown)
        .await
        .map_err(|e| StepError::failed(NAME, e.to_string()))
}

fn save_report(ctx: &SessionContext, report: &Report) -> bool {
    match report::save_local(report, &ctx.config.project_dir) {
        Ok(path) => {
            ctx.ui
                .success(&format!("report saved to {}", path.display()));
            true
        }
        Err(err) => {
            ctx.ui.error(&format!("could not save the report: {err:#}"));
            false
        }
    }
}

#[async_trait]
impl Step for Document {
    fn number(&self) -> usize {
        7
    }

    fn name(&self) -> &str {
        NAME
    }

    async fn execute(&self, ctx: &mut SessionContext) -> Result<Outcome, StepError> {
        ctx.ui
            .step_header(7, super::PROTOCOL_STEPS, NAME, DESCRIPTION);
        ctx.audit
            .record_step(7, NAME, DetailKind::Start, detail_map(&[]));

        let report = report::compile(&ctx.data, &ctx.audit);
        ctx.ui.note("Report compiled from the session record.");

        let options = [
            "save locally",
            "post as an issue comment",
            "both",
            "skip delivery",
        ];
        let choice = ctx
            .prompt
            .select("Where should the report go?", &options)?;
        let selected = options[choice];

        ctx.audit.record_decision(
            "Report disposition",
            options.iter().map(|o| o.to_string()).collect(),
            selected,
            "operator chose the delivery target",
        );

        let mut delivered = Vec::new();
        if matches!(choice, 0 | 2) && save_report(ctx, &report) {
            delivered.push("local file");
        }
        if matches!(choice, 1 | 2) {
            match post_to_issue(ctx, &report).await {
                Ok(()) => {
                    ctx.ui.success("report posted as an issue comment");
                    delivered.push("issue comment");
                }
                Err(err) => {
                    // The session record survives even when the post fails.
                    ctx.ui
                        .warn(&format!("could not post to the issue: {err}"));
                    if choice == 1 && save_report(ctx, &report) {
                        delivered.push("local file (fallback)");
                    }
                }
            }
        }
        let summary = if delivered.is_empty() {
            "report compiled, not delivered".to_string()
        } else {
            format!("report delivered: {}", delivered.join(", "))
        };
        ctx.audit.record_step(
            7,
            NAME,
            DetailKind::Completion,
            detail_map(&[("summary", &summary)]),
        );

        if choice == 3 {
            return Ok(Outcome::Skip);
        }
        Ok(Outcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagnostics::StaticDiagnostics;
    use crate::prompt::ScriptedPrompt;
    use tempfile::tempdir;

    fn ctx(selections: &[usize], project_dir: std::path::PathBuf) -> SessionContext {
        SessionContext::new(
            Config::for_tests(project_dir),
            Box::new(ScriptedPrompt::new(selections.iter().copied())),
            Box::new(StaticDiagnostics::up()),
        )
    }

    #[tokio::test]
    async fn local_save_writes_the_dated_report_file() {
        let dir = tempdir().unwrap();
        let mut ctx = ctx(&[0], dir.path().to_path_buf());
        let outcome = Document.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Continue);

        let reports: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with("triage_report_")
            })
            .collect();
        assert_eq!(reports.len(), 1);
    }

    #[tokio::test]
    async fn skip_delivery_still_completes_the_step() {
        let dir = tempdir().unwrap();
        let mut ctx = ctx(&[3], dir.path().to_path_buf());
        let outcome = Document.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Skip);
        assert!(
            ctx.audit
                .steps()
                .iter()
                .any(|d| d.kind == DetailKind::Completion
                    && d.data.get("summary").is_some_and(|s| s.contains("not delivered")))
        );
    }

    #[tokio::test]
    async fn post_without_an_issue_falls_back_to_a_local_save() {
        let dir = tempdir().unwrap();
        let mut ctx = ctx(&[1], dir.path().to_path_buf());
        // No bug report loaded and no token: the post cannot succeed.
        let outcome = Document.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Continue, "delivery failure never fails the step");
        let fallback_saved = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with("triage_report_")
            });
        assert!(fallback_saved);
    }
}
