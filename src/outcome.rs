//! The control value a step returns to drive navigation.

use serde::{Deserialize, Serialize};

/// Signal produced by a step's action and consumed only by the sequencer.
///
/// Unrecoverable failures are not an `Outcome`; they are the `Err` arm of
/// the step's `Result` and halt the run without advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Advance to the next step.
    Continue,
    /// Advance to the next step, surfacing a skip notice.
    Skip,
    /// Return to an earlier step: the registered back-edge target if one
    /// exists for the current step, otherwise the immediately preceding one.
    Back,
    /// Re-invoke the same step without changing the index. Used when a
    /// step's own output fails a self-check and it wants to regenerate
    /// before asking the operator to decide again.
    Retry,
    /// Halt the run immediately; no further steps execute.
    Exit,
}

impl Outcome {
    /// Short lowercase label for audit records.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Continue => "continue",
            Outcome::Skip => "skip",
            Outcome::Back => "back",
            Outcome::Retry => "retry",
            Outcome::Exit => "exit",
        }
    }
}
