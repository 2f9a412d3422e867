//! Step 2: enumerate candidate root causes and pick one to pursue.

use crate::audit::{DetailKind, detail_map};
use crate::diagnostics::Hypothesis;
use crate::errors::{ConnectorError, StepError};
use crate::outcome::Outcome;
use crate::sequencer::Step;
use crate::session::SessionContext;
use async_trait::async_trait;

pub struct Hypothesize;

const NAME: &str = "Hypothesize";
const DESCRIPTION: &str = "Rank candidate root causes and select one to investigate";

#[async_trait]
impl Step for Hypothesize {
    fn number(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        NAME
    }

    async fn execute(&self, ctx: &mut SessionContext) -> Result<Outcome, StepError> {
        ctx.ui
            .step_header(2, super::PROTOCOL_STEPS, NAME, DESCRIPTION);
        ctx.audit
            .record_step(2, NAME, DetailKind::Start, detail_map(&[]));

        let report = ctx.data.bug_report.clone();
        let hypotheses = match &report {
            None => Hypothesis::synthetic_set(),
            Some(report) => {
                let bar = ctx.ui.spinner("Analyzing candidate root causes...");
                match ctx.diagnostics.analyze_root_cause(report).await {
                    Ok(hypotheses) if !hypotheses.is_empty() => {
                        ctx.ui.spinner_done(bar, "candidate root causes ranked");
                        hypotheses
                    }
                    Ok(_) => {
                        ctx.ui
                            .spinner_warn(bar, "service returned no hypotheses; using built-ins");
                        Hypothesis::synthetic_set()
                    }
                    Err(ConnectorError::ServiceUnavailable(cause)) => {
                        ctx.ui.spinner_warn(
                            bar,
                            "diagnostic service unreachable; using built-in hypotheses",
                        );
                        ctx.audit.record_experiment(
                            "root cause analysis",
                            &report.issue_url,
                            &cause,
                            "service unreachable - synthetic fallback used",
                        );
                        Hypothesis::synthetic_set()
                    }
                    Err(err) => {
                        ctx.ui.spinner_warn(bar, "root cause analysis failed");
                        ctx.audit.record_step(
                            2,
                            NAME,
                            DetailKind::Error,
                            detail_map(&[("summary", &err.to_string())]),
                        );
                        return Err(StepError::failed(NAME, err.to_string()));
                    }
                }
            }
        };

        let rows: Vec<Vec<String>> = hypotheses
            .iter()
            .enumerate()
            .map(|(i, h)| {
                vec![
                    format!("{}", i + 1),
                    format!("{:.0}%", h.confidence * 100.0),
                    h.description.clone(),
                ]
            })
            .collect();
        ctx.ui.table(&["#", "confidence", "hypothesis"], &rows);
        println!();

        let labels: Vec<String> = hypotheses
            .iter()
            .map(|h| format!("{} ({:.0}%)", h.description, h.confidence * 100.0))
            .collect();
        let options: Vec<&str> = labels.iter().map(String::as_str).collect();
        let choice = ctx
            .prompt
            .select("Which hypothesis should drive the investigation?", &options)?;

        let selected = hypotheses[choice].clone();
        ctx.audit.record_decision(
            "Hypothesis selection",
            labels.clone(),
            &labels[choice],
            &selected.evidence,
        );
        ctx.audit.record_step(
            2,
            NAME,
            DetailKind::Completion,
            detail_map(&[("summary", &selected.description)]),
        );
        ctx.data.hypothesis = Some(selected);

        super::navigate(ctx, 2, NAME)
    }
}
