//! Tracing subscriber bootstrap for the execution core.
//!
//! Ported from the teacher's `utils/logger.rs`: a thin wrapper that wires an
//! `EnvFilter` into either a compact or JSON-formatted `fmt` layer.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `log_level` is used only when `RUST_LOG` is unset. `json_logs` selects
/// structured JSON output (suited to log aggregation) over the compact
/// human-readable format (suited to a terminal).
pub fn init_logger(log_level: &str, json_logs: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }
}
