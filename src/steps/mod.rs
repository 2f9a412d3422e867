//! The seven-step debugging protocol.
//!
//! Step order and the two rejection back-edges are fixed: rejecting the
//! experiment's conclusion returns to hypothesis selection, rejecting the
//! patch returns to the experiment. Each step file owns its prompts, its
//! session facts, and its audit entries.

use crate::errors::StepError;
use crate::outcome::Outcome;
use crate::sequencer::{NavigationPolicy, Step};
use crate::session::SessionContext;

mod document;
mod experiment;
mod hypothesize;
mod instrument;
mod patch;
mod regression;
mod reproduce;

pub use document::Document;
pub use experiment::RunExperiment;
pub use hypothesize::Hypothesize;
pub use instrument::Instrument;
pub use patch::ProposePatch;
pub use regression::Regression;
pub use reproduce::Reproduce;

/// Number of steps in the protocol, for `[Step n/7]` headers.
pub const PROTOCOL_STEPS: usize = 7;

/// The protocol in execution order.
pub fn build_protocol() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(Reproduce),
        Box::new(Hypothesize),
        Box::new(Instrument),
        Box::new(RunExperiment),
        Box::new(ProposePatch),
        Box::new(Regression),
        Box::new(Document),
    ]
}

/// Navigation rules for [`build_protocol`]'s step order.
///
/// Indices are 0-based: rejecting at the experiment step (index 3) returns
/// to Hypothesize (index 1); rejecting the patch (index 4) returns to the
/// experiment (index 3).
pub fn protocol_policy() -> NavigationPolicy {
    NavigationPolicy::with_back_edges(&[(3, 1), (4, 3)])
}

/// Shared end-of-step navigation gate.
///
/// The first step never offers "go back"; there is nothing before it.
/// Non-continue choices are recorded as decisions so the report explains
/// every jump and every early exit.
pub(crate) fn navigate(
    ctx: &mut SessionContext,
    step_number: usize,
    step_name: &str,
) -> Result<Outcome, StepError> {
    let options: &[&str] = if step_number > 1 {
        &["continue", "go back", "exit session"]
    } else {
        &["continue", "exit session"]
    };
    let choice = ctx.prompt.select("How should the session proceed?", options)?;
    let selected = options[choice];

    let outcome = match (step_number > 1, choice) {
        (_, 0) => Outcome::Continue,
        (true, 1) => Outcome::Back,
        _ => Outcome::Exit,
    };
    if outcome != Outcome::Continue {
        let reasoning = match outcome {
            Outcome::Back => "operator chose to revisit earlier work",
            _ => "operator ended the session",
        };
        ctx.audit.record_decision(
            &format!("Navigation after {step_name}"),
            options.iter().map(|o| o.to_string()).collect(),
            selected,
            reasoning,
        );
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagnostics::StaticDiagnostics;
    use crate::prompt::ScriptedPrompt;

    fn ctx_with(selections: &[usize]) -> SessionContext {
        SessionContext::new(
            Config::for_tests(std::env::temp_dir()),
            Box::new(ScriptedPrompt::new(selections.iter().copied())),
            Box::new(StaticDiagnostics::up()),
        )
    }

    #[test]
    fn protocol_has_seven_steps_in_order() {
        let steps = build_protocol();
        assert_eq!(steps.len(), PROTOCOL_STEPS);
        let names: Vec<&str> = steps.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "Reproduce",
                "Hypothesize",
                "Instrument",
                "Experiment",
                "Patch",
                "Regression",
                "Document",
            ]
        );
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.number(), i + 1);
        }
    }

    #[test]
    fn first_step_gate_has_no_back_option() {
        let mut ctx = ctx_with(&[1]);
        // Index 1 on the two-option gate means exit, not back.
        let outcome = navigate(&mut ctx, 1, "Reproduce").unwrap();
        assert_eq!(outcome, Outcome::Exit);
    }

    #[test]
    fn later_step_gate_offers_back_and_records_the_decision() {
        let mut ctx = ctx_with(&[1]);
        let outcome = navigate(&mut ctx, 2, "Hypothesize").unwrap();
        assert_eq!(outcome, Outcome::Back);
        assert_eq!(ctx.audit.decisions().len(), 1);
        assert!(ctx.audit.decisions()[0].context.contains("Hypothesize"));
    }

    #[test]
    fn continue_is_not_recorded_as_a_decision() {
        let mut ctx = ctx_with(&[0]);
        let outcome = navigate(&mut ctx, 5, "Patch").unwrap();
        assert_eq!(outcome, Outcome::Continue);
        assert!(ctx.audit.decisions().is_empty());
    }
}
