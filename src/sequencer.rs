//! The stepwise workflow engine.
//!
//! A fixed ordered list of steps is executed under a navigation policy:
//! each step returns an [`Outcome`] and the policy computes the next index.
//! Back-edges are data, not conditionals — the two non-adjacent jumps of
//! the debugging protocol are registered in an override map and everything
//! else follows the default rules.
//!
//! Execution is fully sequential: a step may await a remote call or block
//! on an operator prompt, and nothing else runs until it resolves. The only
//! cancellation path is the operator choosing `Exit`.

use crate::errors::StepError;
use crate::outcome::Outcome;
use crate::session::SessionContext;
use crate::ui::{BACKTRACK, DOOR, SKIP};
use async_trait::async_trait;
use std::collections::HashMap;

/// One stage of the fixed troubleshooting protocol.
///
/// Steps are created once at workflow start and are immutable thereafter;
/// all mutable state lives in the [`SessionContext`]. Every invocation must
/// append at least one `Start` audit detail and exactly one terminal detail
/// (`Completion` or `Error`) unless it returns `Retry`, in which case the
/// terminal detail is deferred to the invocation that finally settles.
#[async_trait]
pub trait Step: Send + Sync {
    /// 1-based position shown to the operator.
    fn number(&self) -> usize;

    fn name(&self) -> &str;

    async fn execute(&self, ctx: &mut SessionContext) -> Result<Outcome, StepError>;
}

/// Where the run goes after a step's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Goto(usize),
    Halt,
}

/// Declarative navigation rules: default moves plus registered back-edges.
#[derive(Debug, Clone, Default)]
pub struct NavigationPolicy {
    back_edges: HashMap<usize, usize>,
}

impl NavigationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register non-adjacent `Back` targets: `{step index → target index}`.
    pub fn with_back_edges(edges: &[(usize, usize)]) -> Self {
        Self {
            back_edges: edges.iter().copied().collect(),
        }
    }

    pub fn back_target(&self, index: usize) -> Option<usize> {
        self.back_edges.get(&index).copied()
    }

    /// Compute the next index for `outcome` at `index`.
    ///
    /// `Back` at index 0 resolves to index 0 — there is no state before the
    /// first step, so the step is simply re-invoked.
    pub fn next(&self, index: usize, outcome: Outcome) -> Navigation {
        match outcome {
            Outcome::Continue | Outcome::Skip => Navigation::Goto(index + 1),
            Outcome::Retry => Navigation::Goto(index),
            Outcome::Exit => Navigation::Halt,
            Outcome::Back => match self.back_target(index) {
                Some(target) => Navigation::Goto(target),
                None => Navigation::Goto(index.saturating_sub(1)),
            },
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// Every step executed and the index ran off the end of the list.
    Completed,
    /// The operator chose `Exit`; later steps never ran.
    Exited,
}

/// Drives the ordered step list until the run halts or completes.
pub struct Sequencer {
    policy: NavigationPolicy,
}

impl Sequencer {
    pub fn new(policy: NavigationPolicy) -> Self {
        Self { policy }
    }

    /// Run the protocol to completion, operator exit, or step failure.
    ///
    /// A step returning `Err` halts the run without advancing; the step has
    /// already appended its `Error` audit detail by then. The sequencer
    /// itself never retries — `Retry` is a decision made inside a step.
    pub async fn run(
        &self,
        steps: &[Box<dyn Step>],
        ctx: &mut SessionContext,
    ) -> Result<RunEnd, StepError> {
        let mut index = 0usize;

        while index < steps.len() {
            let step = &steps[index];
            tracing::debug!(step = step.name(), index, "executing step");

            let outcome = step.execute(ctx).await;
            if let Some(writer) = &ctx.writer {
                writer.snapshot(&ctx.audit);
            }
            let outcome = outcome?;
            tracing::debug!(step = step.name(), outcome = outcome.label(), "step settled");

            match outcome {
                Outcome::Exit => {
                    println!("{DOOR}operator exited the debug session");
                    return Ok(RunEnd::Exited);
                }
                Outcome::Skip => {
                    println!("{SKIP}skipping step {} ({})", step.number(), step.name());
                }
                Outcome::Back if index == 0 => {
                    ctx.ui
                        .warn("already at the first step; nothing to go back to");
                }
                Outcome::Back => {
                    let target = self
                        .policy
                        .back_target(index)
                        .unwrap_or_else(|| index.saturating_sub(1));
                    println!(
                        "{BACKTRACK}returning to step {} ({})",
                        steps[target].number(),
                        steps[target].name()
                    );
                }
                Outcome::Continue | Outcome::Retry => {}
            }

            index = match self.policy.next(index, outcome) {
                Navigation::Goto(next) => next,
                Navigation::Halt => return Ok(RunEnd::Exited),
            };
        }

        Ok(RunEnd::Completed)
    }
}
