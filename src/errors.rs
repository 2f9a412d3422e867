//! Typed error hierarchy for the triage session.
//!
//! Two top-level enums cover the two subsystems:
//! - `StepError` — unrecoverable failures inside a protocol step; any of
//!   these ends the run
//! - `ConnectorError` — failures talking to external collaborators (the
//!   diagnostic service and the GitHub issue connector); steps usually
//!   absorb these by falling back to synthetic data

use thiserror::Error;

/// An unrecoverable failure inside a single protocol step.
///
/// Operator rejections and retries are *not* errors — they travel as
/// [`crate::outcome::Outcome`] values. Only conditions the step cannot
/// recover from cross the sequencer boundary as a `StepError`.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("step '{step}' failed: {message}")]
    Failed { step: String, message: String },

    #[error("step '{step}' requires '{fact}', which no earlier step produced")]
    MissingFact { step: String, fact: &'static str },

    #[error("prompt interaction failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StepError {
    pub fn failed(step: &str, message: impl Into<String>) -> Self {
        Self::Failed {
            step: step.to_string(),
            message: message.into(),
        }
    }
}

/// Errors from the external collaborators.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("invalid GitHub issue URL: {0} (expected https://github.com/<owner>/<repo>/issues/<n>)")]
    InvalidIssueUrl(String),

    #[error("GitHub issue not found or inaccessible: {0}")]
    IssueNotFound(String),

    #[error(
        "no GitHub token configured; set GITHUB_TOKEN in the environment or .env \
         with write access to the repository to post comments"
    )]
    MissingToken,

    #[error("diagnostic service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}
