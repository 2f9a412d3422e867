//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `debug`   | `Debug`          |
//! | `project` | `Init`, `Sessions` |

pub mod debug;
pub mod project;

pub use debug::cmd_debug;
pub use project::{cmd_init, cmd_sessions};
