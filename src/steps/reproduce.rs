//! Step 1: produce a minimal reproducible case and confirm it.

use crate::audit::{DetailKind, detail_map};
use crate::diagnostics::ReproCase;
use crate::errors::{ConnectorError, StepError};
use crate::outcome::Outcome;
use crate::sequencer::Step;
use crate::session::SessionContext;
use async_trait::async_trait;

pub struct Reproduce;

const NAME: &str = "Reproduce";
const DESCRIPTION: &str = "Generate a minimal reproducible case and confirm it triggers the bug";

#[async_trait]
impl Step for Reproduce {
    fn number(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        NAME
    }

    async fn execute(&self, ctx: &mut SessionContext) -> Result<Outcome, StepError> {
        ctx.ui
            .step_header(1, super::PROTOCOL_STEPS, NAME, DESCRIPTION);
        ctx.audit
            .record_step(1, NAME, DetailKind::Start, detail_map(&[]));

        let report = ctx.data.bug_report.clone();
        let repro = match &report {
            None => {
                ctx.ui.warn("no bug report loaded; using the built-in case");
                ReproCase::synthetic(None)
            }
            Some(report) => {
                let bar = ctx.ui.spinner("Generating minimal reproducible case...");
                match ctx.diagnostics.generate_repro(report).await {
                    Ok(repro) => {
                        ctx.ui.spinner_done(bar, "minimal case generated");
                        ctx.audit.record_experiment(
                            "repro generation",
                            &report.issue_url,
                            &repro.code,
                            "case generated by the diagnostic service",
                        );
                        repro
                    }
                    Err(ConnectorError::ServiceUnavailable(cause)) => {
                        ctx.ui.spinner_warn(
                            bar,
                            "diagnostic service unreachable; using the built-in case",
                        );
                        ctx.audit.record_experiment(
                            "repro generation",
                            &report.issue_url,
                            &cause,
                            "service unreachable - synthetic fallback used",
                        );
                        ReproCase::synthetic(Some(report))
                    }
                    Err(err) => {
                        ctx.ui.spinner_warn(bar, "repro generation failed");
                        ctx.audit.record_step(
                            1,
                            NAME,
                            DetailKind::Error,
                            detail_map(&[("summary", &err.to_string())]),
                        );
                        return Err(StepError::failed(NAME, err.to_string()));
                    }
                }
            }
        };

        println!("\n{}\n", repro.code.trim_end());
        ctx.ui
            .field("Expected failure", &repro.expected_failure);
        ctx.data.repro = Some(repro);

        let options = [
            "yes, it reproduces the bug",
            "regenerate the case",
            "no, but continue anyway",
            "exit session",
        ];
        let choice = ctx
            .prompt
            .select("Does this case reproduce the reported bug?", &options)?;
        let selected = options[choice];

        match choice {
            0 => {
                ctx.data.repro_confirmed = Some(true);
                ctx.audit.record_decision(
                    "Repro validation",
                    options.iter().map(|o| o.to_string()).collect(),
                    selected,
                    "case triggers the reported failure",
                );
                ctx.audit.record_step(
                    1,
                    NAME,
                    DetailKind::Completion,
                    detail_map(&[("summary", "reproduction confirmed")]),
                );
                Ok(Outcome::Continue)
            }
            1 => {
                // No terminal detail: the step has not settled yet.
                ctx.audit.record_decision(
                    "Repro validation",
                    options.iter().map(|o| o.to_string()).collect(),
                    selected,
                    "case did not trigger the reported failure",
                );
                ctx.audit.record_step(
                    1,
                    NAME,
                    DetailKind::Retry,
                    detail_map(&[("summary", "regenerating the case")]),
                );
                Ok(Outcome::Retry)
            }
            2 => {
                ctx.data.repro_confirmed = Some(false);
                ctx.audit.record_decision(
                    "Repro validation",
                    options.iter().map(|o| o.to_string()).collect(),
                    selected,
                    "proceeding without a confirmed reproduction",
                );
                ctx.audit.record_step(
                    1,
                    NAME,
                    DetailKind::Completion,
                    detail_map(&[("summary", "reproduction unconfirmed")]),
                );
                Ok(Outcome::Continue)
            }
            _ => {
                ctx.audit.record_step(
                    1,
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

    fn ctx(selections: &[usize], diagnostics: StaticDiagnostics) -> SessionContext {
        SessionContext::new(
            Config::for_tests(std::env::temp_dir()),
            Box::new(ScriptedPrompt::new(selections.iter().copied())),
            Box::new(diagnostics),
        )
    }

    #[tokio::test]
    async fn confirmation_sets_the_fact_and_continues() {
        let mut ctx = ctx(&[0], StaticDiagnostics::up());
        let outcome = Reproduce.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(ctx.data.repro_confirmed, Some(true));
        assert!(ctx.data.repro.is_some());
    }

    #[tokio::test]
    async fn regenerate_returns_retry_without_a_terminal_detail() {
        let mut ctx = ctx(&[1], StaticDiagnostics::up());
        let outcome = Reproduce.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Retry);
        assert!(ctx.data.repro_confirmed.is_none());
        let kinds: Vec<DetailKind> = ctx.audit.steps().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DetailKind::Start, DetailKind::Retry]);
    }

    #[tokio::test]
    async fn service_down_falls_back_and_records_a_warning_experiment() {
        let mut ctx = ctx(&[0], StaticDiagnostics::down());
        ctx.data.bug_report = Some(crate::issue::BugReport {
            title: "crash on processing".into(),
            state: "open".into(),
            description: String::new(),
            issue_url: "https://github.com/acme/app/issues/7".into(),
            issue_number: 7,
            labels: vec![],
            error_message: Some("IndexError: list index out of range".into()),
            linked_files: vec![],
        });

        let outcome = Reproduce.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Continue);
        let repro = ctx.data.repro.as_ref().unwrap();
        assert_eq!(repro.expected_failure, "IndexError: list index out of range");
        assert!(
            ctx.audit
                .experiments()
                .iter()
                .any(|e| e.analysis.contains("fallback"))
        );
    }

    #[tokio::test]
    async fn exit_is_a_settled_outcome() {
        let mut ctx = ctx(&[3], StaticDiagnostics::up());
        let outcome = Reproduce.execute(&mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Exit);
        assert!(
            ctx.audit
                .steps()
                .iter()
                .any(|d| d.kind == DetailKind::Completion)
        );
    }
}
