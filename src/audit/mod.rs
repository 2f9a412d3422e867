//! Append-only audit trail for a debugging session.
//!
//! The log is the forensic record of what happened, in the order it
//! happened: step lifecycle details, operator decisions, and experiments,
//! each mirrored into a derived timeline as it is appended. Nothing is ever
//! mutated in place or truncated; the report compiler reads the whole log
//! exactly once at the end of the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub mod recorder;
pub use recorder::SessionWriter;

/// Lifecycle kind of a [`StepDetail`] entry.
///
/// Every executed step appends at least one `Start` and exactly one terminal
/// entry (`Completion` or `Error`) before the sequencer advances past it.
/// `Retry` notices stay in the raw log for forensics but are excluded from
/// the human-facing report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailKind {
    Start,
    Retry,
    Completion,
    Error,
}

/// One step lifecycle record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDetail {
    pub step_number: usize,
    pub step_name: String,
    pub kind: DetailKind,
    pub timestamp: DateTime<Utc>,
    /// Free-form detail mapping. A `summary` key, when present, becomes the
    /// timeline entry's detail text.
    pub data: BTreeMap<String, String>,
}

/// One operator decision: which option was chosen and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub timestamp: DateTime<Utc>,
    pub context: String,
    pub options: Vec<String>,
    pub selected: String,
    pub reasoning: String,
}

/// One experiment: what went in, what came out, and the analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub timestamp: DateTime<Utc>,
    pub experiment_type: String,
    pub input: String,
    pub output: String,
    pub analysis: String,
}

/// Chronological projection entry, one per append to any other sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    pub details: String,
}

/// The append-only session log.
///
/// Appends are plain in-memory pushes and cannot fail, so recording never
/// changes the outcome of the step that called it. Persistence lives in
/// [`SessionWriter`] and absorbs its own I/O failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    steps: Vec<StepDetail>,
    decisions: Vec<Decision>,
    experiments: Vec<Experiment>,
    timeline: Vec<TimelineEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            steps: Vec::new(),
            decisions: Vec::new(),
            experiments: Vec::new(),
            timeline: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn steps(&self) -> &[StepDetail] {
        &self.steps
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    /// Append a step lifecycle record and its timeline projection.
    ///
    /// The timeline detail text favors a `summary` field in `data` when
    /// present, falling back to the step name.
    pub fn record_step(
        &mut self,
        step_number: usize,
        step_name: &str,
        kind: DetailKind,
        data: BTreeMap<String, String>,
    ) {
        let timestamp = Utc::now();
        let details = data
            .get("summary")
            .cloned()
            .unwrap_or_else(|| step_name.to_string());
        self.timeline.push(TimelineEntry {
            timestamp,
            event: format!("Step {step_number}: {step_name}"),
            details,
        });
        self.steps.push(StepDetail {
            step_number,
            step_name: step_name.to_string(),
            kind,
            timestamp,
            data,
        });
    }

    /// Append an operator decision and its timeline projection.
    pub fn record_decision(
        &mut self,
        context: &str,
        options: Vec<String>,
        selected: &str,
        reasoning: &str,
    ) {
        let timestamp = Utc::now();
        self.timeline.push(TimelineEntry {
            timestamp,
            event: format!("Decision: {context}"),
            details: format!("selected \"{selected}\" - {reasoning}"),
        });
        self.decisions.push(Decision {
            timestamp,
            context: context.to_string(),
            options,
            selected: selected.to_string(),
            reasoning: reasoning.to_string(),
        });
    }

    /// Append an experiment record and its timeline projection.
    pub fn record_experiment(
        &mut self,
        experiment_type: &str,
        input: &str,
        output: &str,
        analysis: &str,
    ) {
        let timestamp = Utc::now();
        self.timeline.push(TimelineEntry {
            timestamp,
            event: format!("Experiment: {experiment_type}"),
            details: analysis.to_string(),
        });
        self.experiments.push(Experiment {
            timestamp,
            experiment_type: experiment_type.to_string(),
            input: input.to_string(),
            output: output.to_string(),
            analysis: analysis.to_string(),
        });
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a detail map from string pairs. Convenience for step code.
pub fn detail_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
