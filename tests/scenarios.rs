//! End-to-end protocol runs with scripted operator answers.

use tempfile::TempDir;
use triage::audit::{DetailKind, SessionWriter};
use triage::config::Config;
use triage::diagnostics::StaticDiagnostics;
use triage::issue::BugReport;
use triage::prompt::ScriptedPrompt;
use triage::sequencer::{RunEnd, Sequencer};
use triage::session::SessionContext;
use triage::steps::{build_protocol, protocol_policy};

fn sample_report() -> BugReport {
    BugReport {
        title: "IndexError when processing the last item".into(),
        state: "open".into(),
        description: "crashes on item N".into(),
        issue_url: "https://github.com/acme/app/issues/42".into(),
        issue_number: 42,
        labels: vec!["bug".into()],
        error_message: Some("IndexError: list index out of range".into()),
        linked_files: vec![],
    }
}

fn session(
    dir: &TempDir,
    selections: &[usize],
    diagnostics: StaticDiagnostics,
) -> SessionContext {
    let config = Config::for_tests(dir.path().to_path_buf());
    config.ensure_directories().unwrap();
    let mut ctx = SessionContext::new(
        config,
        Box::new(ScriptedPrompt::new(selections.iter().copied())),
        Box::new(diagnostics),
    );
    ctx.data.bug_report = Some(sample_report());
    ctx
}

async fn run(ctx: &mut SessionContext) -> RunEnd {
    let protocol = build_protocol();
    Sequencer::new(protocol_policy())
        .run(&protocol, ctx)
        .await
        .expect("scripted run must not fail")
}

#[tokio::test]
async fn straight_run_completes_and_saves_the_report() {
    let dir = TempDir::new().unwrap();
    // Confirm everything, save the report locally at the end.
    let mut ctx = session(&dir, &[0, 0, 0, 0, 0, 0, 0, 0, 0], StaticDiagnostics::up());

    let end = run(&mut ctx).await;

    assert_eq!(end, RunEnd::Completed);
    assert_eq!(ctx.data.repro_confirmed, Some(true));
    assert_eq!(ctx.data.root_cause_confirmed, Some(true));
    assert_eq!(ctx.data.patch_applied, Some(true));
    assert_eq!(ctx.data.regression_passed, Some(true));

    let report_written = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().starts_with("triage_report_"));
    assert!(report_written, "the report must land in the project dir");

    // Timeline mirrors every append across the whole run.
    assert_eq!(
        ctx.audit.timeline().len(),
        ctx.audit.steps().len() + ctx.audit.decisions().len() + ctx.audit.experiments().len()
    );
}

#[tokio::test]
async fn experiment_rejection_reruns_hypothesis_selection() {
    let dir = TempDir::new().unwrap();
    // First experiment assessment rejects the hypothesis; the second pass
    // confirms. Report delivery is skipped.
    let mut ctx = session(
        &dir,
        &[0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 3],
        StaticDiagnostics::up(),
    );

    let end = run(&mut ctx).await;
    assert_eq!(end, RunEnd::Completed);

    let hypothesize_starts = ctx
        .audit
        .steps()
        .iter()
        .filter(|d| d.step_name == "Hypothesize" && d.kind == DetailKind::Start)
        .count();
    assert_eq!(hypothesize_starts, 2, "the back-edge re-runs step 2");

    // The rejection decision lands in the timeline before the second
    // Hypothesize invocation.
    let timeline: Vec<&str> = ctx.audit.timeline().iter().map(|e| e.event.as_str()).collect();
    let rejection = timeline
        .iter()
        .position(|e| *e == "Decision: Experiment assessment")
        .expect("rejection must be recorded");
    let second_hypothesize = timeline
        .iter()
        .rposition(|e| *e == "Step 2: Hypothesize")
        .unwrap();
    assert!(rejection < second_hypothesize);
}

#[tokio::test]
async fn patch_rejection_reruns_the_experiment() {
    let dir = TempDir::new().unwrap();
    let mut ctx = session(
        &dir,
        &[0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 3],
        StaticDiagnostics::up(),
    );

    let end = run(&mut ctx).await;
    assert_eq!(end, RunEnd::Completed);

    let experiment_starts = ctx
        .audit
        .steps()
        .iter()
        .filter(|d| d.step_name == "Experiment" && d.kind == DetailKind::Start)
        .count();
    assert_eq!(experiment_starts, 2);
    assert_eq!(ctx.data.patch_applied, Some(true), "second proposal applied");
}

#[tokio::test]
async fn regenerating_the_case_keeps_one_terminal_detail() {
    let dir = TempDir::new().unwrap();
    // Two regenerations at step 1, then a straight confirmed run.
    let mut ctx = session(
        &dir,
        &[1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 3],
        StaticDiagnostics::up(),
    );

    let end = run(&mut ctx).await;
    assert_eq!(end, RunEnd::Completed);

    let reproduce: Vec<_> = ctx
        .audit
        .steps()
        .iter()
        .filter(|d| d.step_name == "Reproduce")
        .collect();
    let starts = reproduce.iter().filter(|d| d.kind == DetailKind::Start).count();
    let terminals = reproduce
        .iter()
        .filter(|d| matches!(d.kind, DetailKind::Completion | DetailKind::Error))
        .count();
    assert_eq!(starts, 3);
    assert_eq!(terminals, 1);
}

#[tokio::test]
async fn unreachable_service_still_completes_with_fallbacks() {
    let dir = TempDir::new().unwrap();
    let mut ctx = session(&dir, &[0, 0, 0, 0, 0, 0, 0, 0, 3], StaticDiagnostics::down());

    let end = run(&mut ctx).await;

    assert_eq!(end, RunEnd::Completed);
    assert!(ctx.data.repro.is_some());
    assert!(ctx.data.hypothesis.is_some());
    assert!(ctx.data.patch.is_some());
    assert_eq!(ctx.data.regression_passed, Some(true));

    let fallbacks = ctx
        .audit
        .experiments()
        .iter()
        .filter(|e| e.analysis.contains("fallback"))
        .count();
    assert!(fallbacks >= 4, "every remote stage records its fallback");
}

#[tokio::test]
async fn exit_midway_halts_before_the_report_step() {
    let dir = TempDir::new().unwrap();
    // Exit at the instrumentation step's gate.
    let mut ctx = session(&dir, &[0, 0, 0, 0, 2], StaticDiagnostics::up());

    let end = run(&mut ctx).await;

    assert_eq!(end, RunEnd::Exited);
    assert!(
        !ctx.audit.steps().iter().any(|d| d.step_number > 3),
        "no step after the exit point may run"
    );
    let report_written = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().starts_with("triage_report_"));
    assert!(!report_written, "no report without the document step");
    assert!(!ctx.audit.timeline().is_empty(), "the record survives the exit");
}

#[tokio::test]
async fn writer_snapshots_during_the_run() {
    let dir = TempDir::new().unwrap();
    let mut ctx = session(&dir, &[0, 0, 0, 0, 2], StaticDiagnostics::up());
    let session_dir = ctx.config.session_dir.clone();
    ctx.writer = Some(SessionWriter::new(&session_dir));

    run(&mut ctx).await;

    assert!(
        session_dir.join("current-session.json").exists(),
        "a snapshot is written after every step"
    );
}
