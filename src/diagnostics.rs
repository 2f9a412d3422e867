//! Remote diagnostic service client.
//!
//! One request/response exchange per protocol stage. Each stage payload is a
//! serde struct with the fields the workflow reads plus an open extension
//! map, so unexpected remote fields never break a consumer. Every payload
//! has a `synthetic()` form the steps substitute when the service is
//! unreachable, so the protocol can still be demonstrated offline.

use crate::errors::ConnectorError;
use crate::issue::BugReport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// A candidate root cause with its supporting evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hypothesis {
    pub description: String,
    pub evidence: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A minimal reproducible case for the reported defect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReproCase {
    pub code: String,
    pub can_reproduce: bool,
    /// The failure the case is expected to trigger when run.
    #[serde(default)]
    pub expected_failure: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Suggested instrumentation probes for validating a hypothesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentationPlan {
    pub probes: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Result of running the instrumented repro case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub output: String,
    #[serde(default)]
    pub coverage: BTreeMap<String, u32>,
    pub root_cause_confirmed: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A proposed minimal fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchProposal {
    pub file_path: String,
    pub line_number: u32,
    pub old_code: String,
    pub new_code: String,
    #[serde(default)]
    pub impact: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PatchProposal {
    /// Unified-diff style rendering for display and the report.
    pub fn diff(&self) -> String {
        format!(
            "--- {path}\n+++ {path}\n@@ line {line} @@\n- {old}\n+ {new}",
            path = self.file_path,
            line = self.line_number,
            old = self.old_code,
            new = self.new_code,
        )
    }
}

/// Outcome of the regression suite against the patched code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Per-case pass/fail, in suite order.
    pub results: Vec<(String, bool)>,
    pub all_passed: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RegressionReport {
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|(_, passed)| *passed).count()
    }

    pub fn summary(&self) -> String {
        format!("{}/{} passed", self.passed_count(), self.results.len())
    }
}

// Synthetic payloads substituted when the service is unreachable. Shapes
// match what the real service returns for the canonical demo defect.

impl ReproCase {
    pub fn synthetic(report: Option<&BugReport>) -> Self {
        let failure = report
            .and_then(|r| r.error_message.clone())
            .unwrap_or_else(|| "IndexError: list index out of range".to_string());
        Self {
            code: "def process_items(items):\n    for i in range(len(items) + 1):\n        print(f\"Processing item {i}: {items[i]}\")\n\nprocess_items([\"a\", \"b\", \"c\"])\n".to_string(),
            can_reproduce: true,
            expected_failure: failure,
            extra: BTreeMap::new(),
        }
    }
}

impl Hypothesis {
    pub fn synthetic_set() -> Vec<Self> {
        let mk = |description: &str, evidence: &str, confidence: f64| Hypothesis {
            description: description.to_string(),
            evidence: evidence.to_string(),
            confidence,
            extra: BTreeMap::new(),
        };
        vec![
            mk(
                "Loop bound error: iterates one past the end of the list",
                "log fragment at line 42 triggers the index error",
                0.85,
            ),
            mk(
                "Empty input list is not handled",
                "unit test case_003 passes an empty list",
                0.65,
            ),
            mk(
                "Shared state corrupted under concurrent access",
                "coverage shows the failing path touches global X",
                0.45,
            ),
        ]
    }
}

impl InstrumentationPlan {
    pub fn synthetic() -> Self {
        Self {
            probes: vec![
                "print i and len(items) at the loop entry".to_string(),
                "print the list length when case_003 input arrives".to_string(),
                "assert on every write to global X".to_string(),
            ],
            extra: BTreeMap::new(),
        }
    }
}

impl ExperimentResult {
    pub fn synthetic() -> Self {
        Self {
            output: "[LOG] i=5, len(items)=5 -> index error raised\n[ASSERT] global X unchanged"
                .to_string(),
            coverage: [
                ("case_001".to_string(), 85),
                ("case_002".to_string(), 90),
                ("case_003".to_string(), 75),
                ("case_004".to_string(), 88),
            ]
            .into_iter()
            .collect(),
            root_cause_confirmed: true,
            extra: BTreeMap::new(),
        }
    }
}

impl PatchProposal {
    pub fn synthetic() -> Self {
        Self {
            file_path: "buggy.py".to_string(),
            line_number: 42,
            old_code: "for i in range(len(items) + 1):".to_string(),
            new_code: "for i in range(len(items)):".to_string(),
            impact: vec![
                "unit tests case_001 through case_004".to_string(),
                "downstream function process_items()".to_string(),
            ],
            extra: BTreeMap::new(),
        }
    }
}

impl RegressionReport {
    pub fn synthetic() -> Self {
        let results = ["case_001", "case_002", "case_003", "case_004", "fuzz_10x"]
            .iter()
            .map(|c| (c.to_string(), true))
            .collect();
        Self {
            results,
            all_passed: true,
            extra: BTreeMap::new(),
        }
    }
}

/// Seam between the workflow and the remote diagnostic service.
///
/// The workflow only stores, displays, and forwards these payloads; how they
/// are computed is the service's business.
#[async_trait]
pub trait DiagnosticService: Send + Sync {
    async fn generate_repro(&self, report: &BugReport) -> Result<ReproCase, ConnectorError>;
    async fn analyze_root_cause(
        &self,
        report: &BugReport,
    ) -> Result<Vec<Hypothesis>, ConnectorError>;
    async fn generate_instrumentation(
        &self,
        hypothesis: &Hypothesis,
    ) -> Result<InstrumentationPlan, ConnectorError>;
    async fn run_experiment(
        &self,
        repro: &ReproCase,
        probes: &[String],
    ) -> Result<ExperimentResult, ConnectorError>;
    async fn generate_patch(
        &self,
        hypothesis: &Hypothesis,
        experiment: &ExperimentResult,
    ) -> Result<PatchProposal, ConnectorError>;
    async fn run_regression(
        &self,
        patch: &PatchProposal,
    ) -> Result<RegressionReport, ConnectorError>;
}

/// HTTP implementation against the diagnostic backend.
pub struct HttpDiagnostics {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDiagnostics {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ConnectorError>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize + Sync,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("diagnostic request: POST {url}");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ConnectorError::ServiceUnavailable(e.to_string()))?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp)
    }
}

#[async_trait]
impl DiagnosticService for HttpDiagnostics {
    async fn generate_repro(&self, report: &BugReport) -> Result<ReproCase, ConnectorError> {
        self.post("/api/generate-repro", &serde_json::json!({ "bug_report": report }))
            .await
    }

    async fn analyze_root_cause(
        &self,
        report: &BugReport,
    ) -> Result<Vec<Hypothesis>, ConnectorError> {
        #[derive(Deserialize)]
        struct Resp {
            hypotheses: Vec<Hypothesis>,
        }
        let resp: Resp = self
            .post("/api/analyze-root-cause", &serde_json::json!({ "bug_report": report }))
            .await?;
        Ok(resp.hypotheses)
    }

    async fn generate_instrumentation(
        &self,
        hypothesis: &Hypothesis,
    ) -> Result<InstrumentationPlan, ConnectorError> {
        self.post(
            "/api/generate-instrumentation",
            &serde_json::json!({ "hypothesis": hypothesis }),
        )
        .await
    }

    async fn run_experiment(
        &self,
        repro: &ReproCase,
        probes: &[String],
    ) -> Result<ExperimentResult, ConnectorError> {
        self.post(
            "/api/run-experiment",
            &serde_json::json!({ "repro_code": repro.code, "probes": probes }),
        )
        .await
    }

    async fn generate_patch(
        &self,
        hypothesis: &Hypothesis,
        experiment: &ExperimentResult,
    ) -> Result<PatchProposal, ConnectorError> {
        self.post(
            "/api/generate-patch",
            &serde_json::json!({ "hypothesis": hypothesis, "experiment_result": experiment }),
        )
        .await
    }

    async fn run_regression(
        &self,
        patch: &PatchProposal,
    ) -> Result<RegressionReport, ConnectorError> {
        self.post("/api/run-regression", &serde_json::json!({ "patch": patch }))
            .await
    }
}

/// In-process service used by tests and offline demos.
///
/// With `available: true` it answers every stage with the synthetic payload;
/// with `available: false` every call fails the way an unreachable backend
/// does, which exercises the steps' fallback paths.
pub struct StaticDiagnostics {
    pub available: bool,
}

impl StaticDiagnostics {
    pub fn up() -> Self {
        Self { available: true }
    }

    pub fn down() -> Self {
        Self { available: false }
    }

    fn gate(&self) -> Result<(), ConnectorError> {
        if self.available {
            Ok(())
        } else {
            Err(ConnectorError::ServiceUnavailable(
                "connection refused".to_string(),
            ))
        }
    }
}

#[async_trait]
impl DiagnosticService for StaticDiagnostics {
    async fn generate_repro(&self, report: &BugReport) -> Result<ReproCase, ConnectorError> {
        self.gate()?;
        Ok(ReproCase::synthetic(Some(report)))
    }

    async fn analyze_root_cause(
        &self,
        _report: &BugReport,
    ) -> Result<Vec<Hypothesis>, ConnectorError> {
        self.gate()?;
        Ok(Hypothesis::synthetic_set())
    }

    async fn generate_instrumentation(
        &self,
        _hypothesis: &Hypothesis,
    ) -> Result<InstrumentationPlan, ConnectorError> {
        self.gate()?;
        Ok(InstrumentationPlan::synthetic())
    }

    async fn run_experiment(
        &self,
        _repro: &ReproCase,
        _probes: &[String],
    ) -> Result<ExperimentResult, ConnectorError> {
        self.gate()?;
        Ok(ExperimentResult::synthetic())
    }

    async fn generate_patch(
        &self,
        _hypothesis: &Hypothesis,
        _experiment: &ExperimentResult,
    ) -> Result<PatchProposal, ConnectorError> {
        self.gate()?;
        Ok(PatchProposal::synthetic())
    }

    async fn run_regression(
        &self,
        _patch: &PatchProposal,
    ) -> Result<RegressionReport, ConnectorError> {
        self.gate()?;
        Ok(RegressionReport::synthetic())
    }
}
