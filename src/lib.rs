//! Protocolized debugging sessions: verifiable, traceable, reproducible.
//!
//! The crate drives a fixed seven-step troubleshooting protocol over a bug
//! reported in a GitHub issue. A [`sequencer::Sequencer`] executes the steps
//! under a declarative navigation policy, every step reads and writes the
//! shared [`session::SessionData`], and an append-only [`audit::AuditLog`]
//! records everything for the final report.

pub mod audit;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod issue;
pub mod logging;
pub mod outcome;
pub mod prompt;
pub mod report;
pub mod sequencer;
pub mod session;
pub mod steps;
pub mod ui;
