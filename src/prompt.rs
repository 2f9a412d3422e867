//! Operator prompt seam.
//!
//! The workflow core treats interaction as a synchronous "ask a question,
//! get exactly one selected option" capability. The real implementation is
//! dialoguer; tests and replays use [`ScriptedPrompt`].

use crate::errors::StepError;
use dialoguer::{Confirm, Select, theme::ColorfulTheme};
use std::collections::VecDeque;

/// One single-choice interaction per invocation.
pub trait Prompt: Send + Sync {
    /// Present the options and return the index of the selected one.
    fn select(&mut self, question: &str, options: &[&str]) -> Result<usize, StepError>;

    /// Yes/no question with a default.
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool, StepError>;
}

/// Interactive terminal prompt.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn select(&mut self, question: &str, options: &[&str]) -> Result<usize, StepError> {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(question)
            .items(options)
            .default(0)
            .interact()?;
        Ok(selection)
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool, StepError> {
        let answer = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(question)
            .default(default)
            .interact()?;
        Ok(answer)
    }
}

/// Scripted prompt for tests: answers are popped in order.
///
/// Running out of scripted answers is an error, which makes a test fail
/// loudly instead of hanging on a prompt that was never scripted.
#[derive(Default)]
pub struct ScriptedPrompt {
    selections: VecDeque<usize>,
    confirmations: VecDeque<bool>,
}

impl ScriptedPrompt {
    pub fn new(selections: impl IntoIterator<Item = usize>) -> Self {
        Self {
            selections: selections.into_iter().collect(),
            confirmations: VecDeque::new(),
        }
    }

    pub fn with_confirmations(mut self, confirmations: impl IntoIterator<Item = bool>) -> Self {
        self.confirmations = confirmations.into_iter().collect();
        self
    }
}

impl Prompt for ScriptedPrompt {
    fn select(&mut self, question: &str, options: &[&str]) -> Result<usize, StepError> {
        let index = self.selections.pop_front().ok_or_else(|| {
            StepError::failed("prompt", format!("no scripted answer for: {question}"))
        })?;
        if index >= options.len() {
            return Err(StepError::failed(
                "prompt",
                format!(
                    "scripted answer {index} out of range for {} options: {question}",
                    options.len()
                ),
            ));
        }
        Ok(index)
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool, StepError> {
        Ok(self.confirmations.pop_front().unwrap_or(default))
    }
}
