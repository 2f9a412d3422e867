//! Step 6: run the regression suite against the patched code.

use crate::audit::{DetailKind, detail_map};
use crate::diagnostics::{PatchProposal, RegressionReport};
use crate::errors::{ConnectorError, StepError};
use crate::outcome::Outcome;
use crate::sequencer::Step;
use crate::session::SessionContext;
use async_trait::async_trait;

pub struct Regression;

const NAME: &str = "Regression";
const DESCRIPTION: &str = "Check that the fix holds and nothing else broke";

#[async_trait]
impl Step for Regression {
    fn number(&self) -> usize {
        6
    }

    fn name(&self) -> &str {
        NAME
    }

    async fn execute(&self, ctx: &mut SessionContext) -> Result<Outcome, StepError> {
        ctx.ui
            .step_header(6, super::PROTOCOL_STEPS, NAME, DESCRIPTION);
        ctx.audit
            .record_step(6, NAME, DetailKind::Start, detail_map(&[]));

        let patch = ctx
            .data
            .patch
            .clone()
            .unwrap_or_else(PatchProposal::synthetic);

        let bar = ctx.ui.spinner("Running the regression suite...");
        let report = match ctx.diagnostics.run_regression(&patch).await {
            Ok(report) => {
                ctx.ui.spinner_done(bar, "regression suite finished");
                report
            }
            Err(ConnectorError::ServiceUnavailable(cause)) => {
                ctx.ui
                    .spinner_warn(bar, "diagnostic service unreachable; using built-in results");
                ctx.audit.record_experiment(
                    "regression suite",
                    &patch.file_path,
                    &cause,
                    "service unreachable - synthetic fallback used",
                );
                RegressionReport::synthetic()
            }
            Err(err) => {
                ctx.ui.spinner_warn(bar, "regression suite failed to run");
                ctx.audit.record_step(
                    6,
                    NAME,
                    DetailKind::Error,
                    detail_map(&[("summary", &err.to_string())]),
                );
                return Err(StepError::failed(NAME, err.to_string()));
            }
        };

        let rows: Vec<Vec<String>> = report
            .results
            .iter()
            .map(|(case, passed)| {
                vec![
                    case.clone(),
                    if *passed { "pass" } else { "fail" }.to_string(),
                ]
            })
            .collect();
        ctx.ui.table(&["case", "result"], &rows);
        println!();

        let summary = report.summary();
        if report.all_passed {
            ctx.ui.success(&format!("regression suite: {summary}"));
        } else {
            ctx.ui.warn(&format!("regression suite: {summary}"));
        }

        ctx.audit.record_experiment(
            "regression suite",
            &patch.file_path,
            &summary,
            if report.all_passed {
                "all cases pass against the patched code"
            } else {
                "some cases fail against the patched code"
            },
        );
        ctx.audit.record_step(
            6,
            NAME,
            DetailKind::Completion,
            detail_map(&[("summary", &summary)]),
        );
        ctx.data.regression_passed = Some(report.all_passed);
        ctx.data.regression = Some(report);

        super::navigate(ctx, 6, NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagnostics::StaticDiagnostics;
    use crate::prompt::ScriptedPrompt;

    fn ctx(selections: &[usize], diagnostics: StaticDiagnostics) -> SessionContext {
        SessionContext::new(
            Config::for_tests(std::env::temp_dir()),
            Box::new(ScriptedPrompt::new(selections.iter().copied())),
            Box::new(diagnostics),
        )
    }

    #[tokio::test]
    async fn passing_suite_sets_the_fact_and_continues() {
        let mut ctx = ctx(&[0], StaticDiagnostics::up());
        let outcome = Regression.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(ctx.data.regression_passed, Some(true));
        assert_eq!(ctx.data.regression.as_ref().unwrap().summary(), "5/5 passed");
    }

    #[tokio::test]
    async fn going_back_to_the_patch_is_allowed() {
        let mut ctx = ctx(&[1], StaticDiagnostics::up());
        let outcome = Regression.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Back);
        // The suite result is still recorded even when the operator backs up.
        assert!(ctx.data.regression.is_some());
    }

    #[tokio::test]
    async fn service_down_records_the_fallback() {
        let mut ctx = ctx(&[0], StaticDiagnostics::down());
        Regression.execute(&mut ctx).await.unwrap();
        assert!(
            ctx.audit
                .experiments()
                .iter()
                .any(|e| e.analysis.contains("fallback"))
        );
        assert_eq!(ctx.data.regression_passed, Some(true));
    }
}
