//! Terminal rendering for the debugging session.
//!
//! Styled step headers, transient spinners around remote calls, and simple
//! aligned tables. Everything here is presentation only; nothing in the
//! workflow core depends on what was rendered.

use console::{Emoji, style};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK] ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR] ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[WARN] ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[SKIP] ");
pub static BACKTRACK: Emoji<'_, '_> = Emoji("🔄 ", "[BACK] ");
pub static DOOR: Emoji<'_, '_> = Emoji("🚪 ", "[EXIT] ");

pub struct SessionUi {
    pub verbose: bool,
}

impl SessionUi {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Welcome banner shown once at session start.
    pub fn banner(&self, issue_url: &str) {
        println!();
        println!("{}", style("triage").cyan().bold());
        println!(
            "{}",
            style("protocolized debugging: verifiable, traceable, reproducible").dim()
        );
        println!();
        println!("Starting debug session: {}", style(issue_url).white().bold());
    }

    /// Header printed at the top of every step invocation.
    pub fn step_header(&self, number: usize, total: usize, name: &str, description: &str) {
        println!();
        println!("{}", style("⸻").dim());
        println!(
            "{} {}",
            style(format!("[Step {number}/{total}]")).bold(),
            style(name).bold().white()
        );
        if !description.is_empty() {
            println!("{}", style(description).dim());
        }
        println!();
    }

    /// Spinner shown while a remote call is in flight. Callers finish it
    /// with [`Self::spinner_done`] or [`Self::spinner_warn`].
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .expect("progress bar template is a valid static string"),
        );
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    pub fn spinner_done(&self, bar: ProgressBar, msg: &str) {
        bar.finish_with_message(format!("{CHECK}{msg}"));
    }

    pub fn spinner_warn(&self, bar: ProgressBar, msg: &str) {
        bar.finish_with_message(format!("{WARN}{}", style(msg).yellow()));
    }

    pub fn success(&self, msg: &str) {
        println!("{CHECK}{}", style(msg).green());
    }

    pub fn warn(&self, msg: &str) {
        println!("{WARN}{}", style(msg).yellow());
    }

    pub fn error(&self, msg: &str) {
        println!("{CROSS}{}", style(msg).red());
    }

    pub fn note(&self, msg: &str) {
        println!("{}", style(msg).dim());
    }

    pub fn field(&self, label: &str, value: &str) {
        println!("{} {}", style(format!("{label}:")).bold(), value);
    }

    /// Render a small left-aligned table with a header row.
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        let render = |cells: Vec<String>| {
            cells
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{:<width$}", c, width = widths.get(i).copied().unwrap_or(0)))
                .collect::<Vec<_>>()
                .join("  ")
        };

        println!(
            "  {}",
            style(render(headers.iter().map(|h| h.to_string()).collect())).bold()
        );
        for row in rows {
            println!("  {}", render(row.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_tolerates_ragged_rows() {
        let ui = SessionUi::new(false);
        // Must not panic on rows wider or narrower than the header.
        ui.table(
            &["case", "status"],
            &[
                vec!["case_001".to_string()],
                vec!["case_002".to_string(), "ok".to_string(), "extra".to_string()],
            ],
        );
    }
}
