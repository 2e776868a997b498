//! Tracing/logging initialization.
//!
//! Filtering comes from `RUST_LOG` (default `info`). Output is JSON lines
//! unless `TOOLBOX_LOG_FORMAT=pretty`.

use core::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "TOOLBOX_LOG_FORMAT";

/// How log lines are rendered.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, with timestamps.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl LogFormat {
    /// Read the format from `TOOLBOX_LOG_FORMAT`; unset or unknown means JSON.
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with(LogFormat::from_env());
}

/// Initialize tracing/logging with an explicit format.
pub fn init_with(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    // A second init finds a global subscriber already set and is ignored.
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}
