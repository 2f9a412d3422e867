//! Cross-step session state.
//!
//! `SessionData` accumulates the facts the steps produce. Every fact is
//! optional: a step may have been skipped or failed, so consumers treat
//! `None` as "undetermined" and must never hard-fail on a missing fact.
//! `SessionContext` bundles the data with the collaborators each step needs
//! and is passed explicitly into every step invocation, so tests can
//! construct arbitrary partial contexts.

use crate::audit::{AuditLog, SessionWriter};
use crate::config::Config;
use crate::diagnostics::{
    DiagnosticService, ExperimentResult, Hypothesis, PatchProposal, RegressionReport, ReproCase,
};
use crate::issue::BugReport;
use crate::prompt::Prompt;
use crate::ui::SessionUi;
use serde::{Deserialize, Serialize};

/// How the operator chose to instrument the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentationChoice {
    All,
    Partial,
    Skipped,
}

impl InstrumentationChoice {
    pub fn label(&self) -> &'static str {
        match self {
            InstrumentationChoice::All => "all probes",
            InstrumentationChoice::Partial => "partial probes",
            InstrumentationChoice::Skipped => "skipped",
        }
    }
}

/// The facts accumulated across the run.
///
/// Set unconditionally (later writes overwrite), never deleted, and read
/// with an "undetermined" fallback everywhere. Each field is owned by the
/// step that produces it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    pub bug_report: Option<BugReport>,
    pub repro: Option<ReproCase>,
    pub repro_confirmed: Option<bool>,
    pub hypothesis: Option<Hypothesis>,
    pub instrumentation: Option<InstrumentationChoice>,
    pub probes: Vec<String>,
    pub experiment: Option<ExperimentResult>,
    pub root_cause_confirmed: Option<bool>,
    pub patch: Option<PatchProposal>,
    pub patch_applied: Option<bool>,
    pub regression: Option<RegressionReport>,
    pub regression_passed: Option<bool>,
}

impl SessionData {
    /// Display string for a yes/no fact that may be undetermined.
    pub fn indicator(fact: Option<bool>) -> &'static str {
        match fact {
            Some(true) => "yes",
            Some(false) => "no",
            None => "undetermined",
        }
    }

    /// The selected hypothesis description, or the undetermined fallback.
    pub fn hypothesis_display(&self) -> &str {
        self.hypothesis
            .as_ref()
            .map(|h| h.description.as_str())
            .unwrap_or("undetermined")
    }
}

/// Everything a step invocation gets to work with.
pub struct SessionContext {
    pub config: Config,
    pub data: SessionData,
    pub audit: AuditLog,
    pub prompt: Box<dyn Prompt>,
    pub diagnostics: Box<dyn DiagnosticService>,
    pub ui: SessionUi,
    /// Absent in tests that don't care about persistence.
    pub writer: Option<SessionWriter>,
}

impl SessionContext {
    pub fn new(
        config: Config,
        prompt: Box<dyn Prompt>,
        diagnostics: Box<dyn DiagnosticService>,
    ) -> Self {
        let ui = SessionUi::new(config.verbose);
        Self {
            config,
            data: SessionData::default(),
            audit: AuditLog::new(),
            prompt,
            diagnostics,
            ui,
            writer: None,
        }
    }

    pub fn with_writer(mut self, writer: SessionWriter) -> Self {
        self.writer = Some(writer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_data_has_no_facts() {
        let data = SessionData::default();
        assert!(data.bug_report.is_none());
        assert!(data.repro_confirmed.is_none());
        assert!(data.regression_passed.is_none());
        assert!(data.probes.is_empty());
    }

    #[test]
    fn indicator_treats_absence_as_undetermined() {
        assert_eq!(SessionData::indicator(Some(true)), "yes");
        assert_eq!(SessionData::indicator(Some(false)), "no");
        assert_eq!(SessionData::indicator(None), "undetermined");
    }

    #[test]
    fn hypothesis_display_falls_back_when_unset() {
        let mut data = SessionData::default();
        assert_eq!(data.hypothesis_display(), "undetermined");

        data.hypothesis = Some(crate::diagnostics::Hypothesis::synthetic_set().remove(0));
        assert!(data.hypothesis_display().contains("Loop bound"));
    }

    #[test]
    fn set_overwrites_unconditionally() {
        let mut data = SessionData::default();
        data.repro_confirmed = Some(false);
        data.repro_confirmed = Some(true);
        assert_eq!(data.repro_confirmed, Some(true));
    }
}
