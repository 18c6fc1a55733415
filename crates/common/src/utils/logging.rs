use std::io;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,sea_orm=warn,sqlx=warn,tower_http=info";

/// Output format for the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    /// Parse the `[logging] format` config value; anything unknown falls back to compact.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

fn filter_or(default: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default.unwrap_or(DEFAULT_FILTER)))
}

/// Initialize tracing subscriber with sensible defaults and stdout writer.
/// - Respects `RUST_LOG` if set
/// - Falls back to `info` with database driver chatter reduced to warnings
pub fn init_logging_default() {
    init_logging(LogFormat::Compact, None);
}

/// Initialize tracing subscriber with JSON structured output.
/// Audit-write failures are emitted under the `audit` target, so
/// `RUST_LOG=info,audit=debug` surfaces them separately.
pub fn init_logging_json() {
    init_logging(LogFormat::Json, None);
}

/// Initialize the global subscriber in the requested format. Safe to call more
/// than once; later calls are no-ops.
pub fn init_logging(format: LogFormat, filter: Option<&str>) {
    let env_filter = filter_or(filter);
    match format {
        LogFormat::Compact => {
            let _ = fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .compact()
                .with_writer(io::stdout)
                .try_init();
        }
        LogFormat::Json => {
            let _ = fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .json()
                .with_writer(io::stdout)
                .try_init();
        }
    }
}
