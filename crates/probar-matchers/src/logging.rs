//! Tracing subscriber setup for test binaries.
//!
//! The matchers only emit `tracing` events; nothing is printed unless a
//! subscriber is installed. Tests that want to see polling progress call
//! [`init_test_tracing`] once.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives
pub const LOG_ENV: &str = "PROBAR_LOG";

/// Environment variable selecting the output format (`text` or `json`)
pub const LOG_FORMAT_ENV: &str = "PROBAR_LOG_FORMAT";

const DEFAULT_DIRECTIVES: &str = "warn";

/// Output format for matcher logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse a format name; unknown names give `None`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|name| Self::parse(&name))
            .unwrap_or_default()
    }
}

/// Filter from [`LOG_ENV`], or `warn` when unset or invalid
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install a test-writer subscriber in the format named by
/// [`LOG_FORMAT_ENV`]
///
/// Returns `false` if a global subscriber was already set, which is the
/// normal case for every call after the first.
pub fn init_test_tracing() -> bool {
    init_tracing(LogFormat::from_env())
}

/// Install a test-writer subscriber in the given format
pub fn init_tracing(format: LogFormat) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter());
    let installed = match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_test_writer().with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_test_writer())
            .try_init(),
    };
    installed.is_ok()
}
