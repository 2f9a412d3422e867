//! Step 3: choose instrumentation probes for the selected hypothesis.
//!
//! The operator may skip this step entirely; the skip is logged and the
//! experiment step runs without probes.

use crate::audit::{DetailKind, detail_map};
use crate::diagnostics::InstrumentationPlan;
use crate::errors::{ConnectorError, StepError};
use crate::outcome::Outcome;
use crate::sequencer::Step;
use crate::session::{InstrumentationChoice, SessionContext};
use async_trait::async_trait;

pub struct Instrument;

const NAME: &str = "Instrument";
const DESCRIPTION: &str = "Add observation probes that will validate or refute the hypothesis";

#[async_trait]
impl Step for Instrument {
    fn number(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        NAME
    }

    async fn execute(&self, ctx: &mut SessionContext) -> Result<Outcome, StepError> {
        ctx.ui
            .step_header(3, super::PROTOCOL_STEPS, NAME, DESCRIPTION);
        ctx.audit
            .record_step(3, NAME, DetailKind::Start, detail_map(&[]));

        let hypothesis = ctx.data.hypothesis.clone();
        let plan = match &hypothesis {
            None => InstrumentationPlan::synthetic(),
            Some(hypothesis) => {
                let bar = ctx.ui.spinner("Generating instrumentation plan...");
                match ctx.diagnostics.generate_instrumentation(hypothesis).await {
                    Ok(plan) => {
                        ctx.ui.spinner_done(bar, "instrumentation plan ready");
                        plan
                    }
                    Err(ConnectorError::ServiceUnavailable(cause)) => {
                        ctx.ui.spinner_warn(
                            bar,
                            "diagnostic service unreachable; using built-in probes",
                        );
                        ctx.audit.record_experiment(
                            "instrumentation planning",
                            &hypothesis.description,
                            &cause,
                            "service unreachable - synthetic fallback used",
                        );
                        InstrumentationPlan::synthetic()
                    }
                    Err(err) => {
                        ctx.ui.spinner_warn(bar, "instrumentation planning failed");
                        ctx.audit.record_step(
                            3,
                            NAME,
                            DetailKind::Error,
                            detail_map(&[("summary", &err.to_string())]),
                        );
                        return Err(StepError::failed(NAME, err.to_string()));
                    }
                }
            }
        };

        for (i, probe) in plan.probes.iter().enumerate() {
            println!("  {}. {probe}", i + 1);
        }
        println!();

        let options = [
            "all suggested probes",
            "partial: first probe only",
            "skip instrumentation",
        ];
        let choice = ctx
            .prompt
            .select("Which probes should be added?", &options)?;
        let selected = options[choice];

        let (instrumentation, probes) = match choice {
            0 => (InstrumentationChoice::All, plan.probes.clone()),
            1 => (
                InstrumentationChoice::Partial,
                plan.probes.iter().take(1).cloned().collect(),
            ),
            _ => (InstrumentationChoice::Skipped, Vec::new()),
        };

        ctx.audit.record_decision(
            "Instrumentation scope",
            options.iter().map(|o| o.to_string()).collect(),
            selected,
            match instrumentation {
                InstrumentationChoice::Skipped => "running the experiment without probes",
                _ => "probes chosen to observe the suspected failure path",
            },
        );

        ctx.data.instrumentation = Some(instrumentation);
        ctx.data.probes = probes;

        if instrumentation == InstrumentationChoice::Skipped {
            ctx.audit.record_step(
                3,
                NAME,
                DetailKind::Completion,
                detail_map(&[("summary", "instrumentation skipped")]),
            );
            return Ok(Outcome::Skip);
        }

        ctx.audit.record_step(
            3,
            NAME,
            DetailKind::Completion,
            detail_map(&[(
                "summary",
                &format!("{} with {} probes", instrumentation.label(), ctx.data.probes.len()),
            )]),
        );

        super::navigate(ctx, 3, NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagnostics::StaticDiagnostics;
    use crate::prompt::ScriptedPrompt;

    fn ctx(selections: &[usize]) -> SessionContext {
        SessionContext::new(
            Config::for_tests(std::env::temp_dir()),
            Box::new(ScriptedPrompt::new(selections.iter().copied())),
            Box::new(StaticDiagnostics::up()),
        )
    }

    #[tokio::test]
    async fn all_probes_selection_keeps_the_full_plan() {
        let mut ctx = ctx(&[0, 0]);
        let outcome = Instrument.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(ctx.data.instrumentation, Some(InstrumentationChoice::All));
        assert_eq!(ctx.data.probes.len(), 3);
    }

    #[tokio::test]
    async fn partial_selection_keeps_one_probe() {
        let mut ctx = ctx(&[1, 0]);
        Instrument.execute(&mut ctx).await.unwrap();
        assert_eq!(
            ctx.data.instrumentation,
            Some(InstrumentationChoice::Partial)
        );
        assert_eq!(ctx.data.probes.len(), 1);
    }

    #[tokio::test]
    async fn skip_is_logged_and_yields_the_skip_outcome() {
        let mut ctx = ctx(&[2]);
        let outcome = Instrument.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Skip);
        assert!(ctx.data.probes.is_empty());
        assert!(
            ctx.audit
                .steps()
                .iter()
                .any(|d| d.kind == DetailKind::Completion
                    && d.data.get("summary").is_some_and(|s| s.contains("skipped")))
        );
        assert!(
            ctx.audit
                .decisions()
                .iter()
                .any(|d| d.selected == "skip instrumentation")
        );
    }
}
