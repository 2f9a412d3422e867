//! The `debug` command: fetch the issue, run the protocol, archive the log.

use anyhow::{Context, Result};
use std::path::Path;
use triage::audit::SessionWriter;
use triage::config::Config;
use triage::diagnostics::HttpDiagnostics;
use triage::issue::IssueConnector;
use triage::prompt::TerminalPrompt;
use triage::sequencer::{RunEnd, Sequencer};
use triage::session::SessionContext;
use triage::steps;
use triage::ui::SessionUi;

pub async fn cmd_debug(
    project_dir: &Path,
    issue_url: &str,
    server: Option<String>,
    verbose: bool,
) -> Result<()> {
    let config = Config::new(project_dir.to_path_buf(), server, verbose)?;
    config.ensure_directories()?;

    let ui = SessionUi::new(verbose);
    ui.banner(issue_url);

    let connector = IssueConnector::new(config.github_token.clone(), config.request_timeout);
    let bar = ui.spinner("Fetching the issue...");
    let bug_report = match connector.fetch_bug_report(issue_url).await {
        Ok(report) => {
            ui.spinner_done(bar, &format!("fetched issue #{}", report.issue_number));
            report
        }
        Err(err) => {
            ui.spinner_warn(bar, "could not fetch the issue");
            return Err(err).context("The debug session needs the issue to start from");
        }
    };

    ui.field("Title", &bug_report.title);
    ui.field("State", &bug_report.state);
    if !bug_report.labels.is_empty() {
        ui.field("Labels", &bug_report.labels.join(", "));
    }
    ui.field("Error", bug_report.error_display());
    if !bug_report.linked_files.is_empty() {
        println!();
        let rows: Vec<Vec<String>> = bug_report
            .linked_files
            .iter()
            .map(|f| {
                vec![
                    f.file_name.clone(),
                    if f.success { "fetched" } else { "failed" }.to_string(),
                ]
            })
            .collect();
        ui.table(&["linked file", "status"], &rows);
    }

    let diagnostics = HttpDiagnostics::new(&config.server_url, config.request_timeout);
    let writer = SessionWriter::new(&config.session_dir);
    let mut ctx = SessionContext::new(config, Box::new(TerminalPrompt), Box::new(diagnostics))
        .with_writer(writer);
    ctx.data.bug_report = Some(bug_report);

    let protocol = steps::build_protocol();
    let sequencer = Sequencer::new(steps::protocol_policy());
    let end = sequencer.run(&protocol, &mut ctx).await;

    // Archive the log whatever happened; the record is the point.
    if let Some(writer) = &ctx.writer {
        match writer.finish(&ctx.audit) {
            Ok(archive) => ctx
                .ui
                .note(&format!("session log archived: {}", archive.display())),
            Err(err) => ctx
                .ui
                .warn(&format!("could not archive the session log: {err:#}")),
        }
    }

    match end {
        Ok(RunEnd::Completed) => {
            ctx.ui.success("debug protocol complete");
            Ok(())
        }
        Ok(RunEnd::Exited) => {
            ctx.ui.note("session ended early by the operator");
            Ok(())
        }
        Err(err) => {
            ctx.ui.error(&format!("session halted: {err}"));
            Err(err.into())
        }
    }
}
