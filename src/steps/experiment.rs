//! Step 4: run the instrumented case and judge the hypothesis.
//!
//! Rejecting the experiment's conclusion is the protocol's first back-edge:
//! the run returns to hypothesis selection, with the rejection recorded as
//! a decision before the jump.

use crate::audit::{DetailKind, detail_map};
use crate::diagnostics::{ExperimentResult, ReproCase};
use crate::errors::{ConnectorError, StepError};
use crate::outcome::Outcome;
use crate::sequencer::Step;
use crate::session::SessionContext;
use async_trait::async_trait;

pub struct RunExperiment;

const NAME: &str = "Experiment";
const DESCRIPTION: &str = "Run the instrumented case and weigh the evidence";

#[async_trait]
impl Step for RunExperiment {
    fn number(&self) -> usize {
        4
    }

    fn name(&self) -> &str {
        NAME
    }

    async fn execute(&self, ctx: &mut SessionContext) -> Result<Outcome, StepError> {
        ctx.ui
            .step_header(4, super::PROTOCOL_STEPS, NAME, DESCRIPTION);
        ctx.audit
            .record_step(4, NAME, DetailKind::Start, detail_map(&[]));

        let repro = ctx
            .data
            .repro
            .clone()
            .unwrap_or_else(|| ReproCase::synthetic(ctx.data.bug_report.as_ref()));
        let probes = ctx.data.probes.clone();

        let bar = ctx.ui.spinner("Running the instrumented case...");
        let result = match ctx.diagnostics.run_experiment(&repro, &probes).await {
            Ok(result) => {
                ctx.ui.spinner_done(bar, "experiment complete");
                result
            }
            Err(ConnectorError::ServiceUnavailable(cause)) => {
                ctx.ui
                    .spinner_warn(bar, "diagnostic service unreachable; using built-in result");
                ctx.audit.record_experiment(
                    "instrumented run",
                    &probes.join("; "),
                    &cause,
                    "service unreachable - synthetic fallback used",
                );
                ExperimentResult::synthetic()
            }
            Err(err) => {
                ctx.ui.spinner_warn(bar, "experiment failed to run");
                ctx.audit.record_step(
                    4,
                    NAME,
                    DetailKind::Error,
                    detail_map(&[("summary", &err.to_string())]),
                );
                return Err(StepError::failed(NAME, err.to_string()));
            }
        };

        println!("\n{}\n", result.output.trim_end());
        if !result.coverage.is_empty() {
            let rows: Vec<Vec<String>> = result
                .coverage
                .iter()
                .map(|(case, pct)| vec![case.clone(), format!("{pct}%")])
                .collect();
            ctx.ui.table(&["case", "coverage"], &rows);
            println!();
        }

        let analysis = if result.root_cause_confirmed {
            "instrumented output matches the hypothesis"
        } else {
            "instrumented output does not support the hypothesis"
        };
        ctx.audit.record_experiment(
            "instrumented run",
            &probes.join("; "),
            &result.output,
            analysis,
        );
        ctx.data.experiment = Some(result);

        let options = [
            "yes, root cause confirmed",
            "no, revisit the hypotheses",
            "exit session",
        ];
        let choice = ctx
            .prompt
            .select("Does the evidence confirm the hypothesis?", &options)?;
        let selected = options[choice];

        match choice {
            0 => {
                ctx.data.root_cause_confirmed = Some(true);
                ctx.audit.record_decision(
                    "Experiment assessment",
                    options.iter().map(|o| o.to_string()).collect(),
                    selected,
                    "observed behavior matches the predicted failure",
                );
                ctx.audit.record_step(
                    4,
                    NAME,
                    DetailKind::Completion,
                    detail_map(&[("summary", "root cause confirmed")]),
                );
                Ok(Outcome::Continue)
            }
            1 => {
                ctx.data.root_cause_confirmed = Some(false);
                // Recorded before the jump so the report explains it.
                ctx.audit.record_decision(
                    "Experiment assessment",
                    options.iter().map(|o| o.to_string()).collect(),
                    selected,
                    "evidence contradicts the selected hypothesis",
                );
                ctx.audit.record_step(
                    4,
                    NAME,
                    DetailKind::Completion,
                    detail_map(&[("summary", "hypothesis rejected")]),
                );
                Ok(Outcome::Back)
            }
            _ => {
                ctx.audit.record_step(
                    4,
                    NAME,
                    DetailKind::Completion,
                    detail_map(&[("summary", "operator exited")]),
                );
                Ok(Outcome::Exit)
            }
        }
    }
}
