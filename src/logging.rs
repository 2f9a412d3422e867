//! Development-time tracing for debugging the tool itself.
//!
//! Reads `RUST_LOG`, defaults to `warn`, writes to stderr so it never
//! interleaves with the interactive session rendering. The audit log, not
//! tracing, is the product record of a session.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
