//! Step 5: propose a minimal fix and let the operator accept or reject it.
//!
//! Rejection is the protocol's second back-edge: the run returns to the
//! experiment step for more evidence.

use crate::audit::{DetailKind, detail_map};
use crate::diagnostics::{ExperimentResult, Hypothesis, PatchProposal};
use crate::errors::{ConnectorError, StepError};
use crate::outcome::Outcome;
use crate::sequencer::Step;
use crate::session::SessionContext;
use async_trait::async_trait;

pub struct ProposePatch;

const NAME: &str = "Patch";
const DESCRIPTION: &str = "Propose a minimal fix for the confirmed root cause";

#[async_trait]
impl Step for ProposePatch {
    fn number(&self) -> usize {
        5
    }

    fn name(&self) -> &str {
        NAME
    }

    async fn execute(&self, ctx: &mut SessionContext) -> Result<Outcome, StepError> {
        ctx.ui
            .step_header(5, super::PROTOCOL_STEPS, NAME, DESCRIPTION);
        ctx.audit
            .record_step(5, NAME, DetailKind::Start, detail_map(&[]));

        let hypothesis = ctx
            .data
            .hypothesis
            .clone()
            .unwrap_or_else(|| Hypothesis::synthetic_set().remove(0));
        let experiment = ctx
            .data
            .experiment
            .clone()
            .unwrap_or_else(ExperimentResult::synthetic);

        let bar = ctx.ui.spinner("Generating a minimal patch...");
        let patch = match ctx.diagnostics.generate_patch(&hypothesis, &experiment).await {
            Ok(patch) => {
                ctx.ui.spinner_done(bar, "patch proposal ready");
                patch
            }
            Err(ConnectorError::ServiceUnavailable(cause)) => {
                ctx.ui
                    .spinner_warn(bar, "diagnostic service unreachable; using built-in patch");
                ctx.audit.record_experiment(
                    "patch generation",
                    &hypothesis.description,
                    &cause,
                    "service unreachable - synthetic fallback used",
                );
                PatchProposal::synthetic()
            }
            Err(err) => {
                ctx.ui.spinner_warn(bar, "patch generation failed");
                ctx.audit.record_step(
                    5,
                    NAME,
                    DetailKind::Error,
                    detail_map(&[("summary", &err.to_string())]),
                );
                return Err(StepError::failed(NAME, err.to_string()));
            }
        };

        println!("\n{}\n", patch.diff());
        if !patch.impact.is_empty() {
            ctx.ui.note("Impact:");
            for item in &patch.impact {
                println!("  - {item}");
            }
            println!();
        }
        ctx.data.patch = Some(patch);

        let options = [
            "apply the patch",
            "reject, rerun the experiment",
            "exit session",
        ];
        let choice = ctx.prompt.select("Apply this patch?", &options)?;
        let selected = options[choice];

        match choice {
            0 => {
                ctx.data.patch_applied = Some(true);
                ctx.audit.record_decision(
                    "Patch application",
                    options.iter().map(|o| o.to_string()).collect(),
                    selected,
                    "fix is minimal and targets the confirmed root cause",
                );
                ctx.audit.record_step(
                    5,
                    NAME,
                    DetailKind::Completion,
                    detail_map(&[("summary", "patch applied")]),
                );
                Ok(Outcome::Continue)
            }
            1 => {
                ctx.data.patch_applied = Some(false);
                ctx.audit.record_decision(
                    "Patch application",
                    options.iter().map(|o| o.to_string()).collect(),
                    selected,
                    "more evidence needed before changing the code",
                );
                ctx.audit.record_step(
                    5,
                    NAME,
                    DetailKind::Completion,
                    detail_map(&[("summary", "patch rejected")]),
                );
                Ok(Outcome::Back)
            }
            _ => {
                ctx.audit.record_step(
                    5,
                    NAME,
                    DetailKind::Completion,
                    detail_map(&[("summary", "operator exited")]),
                );
                Ok(Outcome::Exit)
            }
        }
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
    async fn acceptance_applies_the_patch() {
        let mut ctx = ctx(&[0]);
        let outcome = ProposePatch.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(ctx.data.patch_applied, Some(true));
        assert!(ctx.data.patch.is_some());
    }

    #[tokio::test]
    async fn rejection_keeps_the_proposal_and_goes_back() {
        let mut ctx = ctx(&[1]);
        let outcome = ProposePatch.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Back);
        assert_eq!(ctx.data.patch_applied, Some(false));
        // The proposal stays in the session for the next attempt to compare.
        assert!(ctx.data.patch.is_some());
        assert!(
            ctx.audit
                .decisions()
                .iter()
                .any(|d| d.context == "Patch application" && d.selected.contains("reject"))
        );
    }
}
