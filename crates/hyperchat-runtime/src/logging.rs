#![forbid(unsafe_code)]

//! Structured logging setup.
//!
//! The engine crates only emit `tracing` events. Binaries call [`init`] once
//! at startup to install a `tracing-subscriber` registry with an
//! [`EnvFilter`](tracing_subscriber::EnvFilter) and a compact or JSON
//! formatter. `HYPERCHAT_LOG` overrides the configured filter directive.

#[cfg(feature = "config-files")]
use serde::{Deserialize, Serialize};

use crate::config::LogPolicyConfig;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "HYPERCHAT_LOG";

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(rename_all = "lowercase"))]
pub enum LogFormat {
    /// Single-line human-readable output.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compact" | "Compact" => Ok(Self::Compact),
            "json" | "Json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Errors from [`init`].
#[cfg(feature = "logging")]
#[derive(Debug)]
pub enum LoggingError {
    /// The filter directive did not parse.
    Filter(tracing_subscriber::filter::ParseError),
    /// A global subscriber was already installed.
    Init(tracing_subscriber::util::TryInitError),
}

#[cfg(feature = "logging")]
impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filter(e) => write!(f, "invalid log filter: {e}"),
            Self::Init(e) => write!(f, "logging already initialized: {e}"),
        }
    }
}

#[cfg(feature = "logging")]
impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Filter(e) => Some(e),
            Self::Init(e) => Some(e),
        }
    }
}

/// Build the filter: `HYPERCHAT_LOG` when set and valid, else `fallback`.
#[cfg(feature = "logging")]
pub fn env_filter(
    fallback: &str,
) -> Result<tracing_subscriber::EnvFilter, tracing_subscriber::filter::ParseError> {
    use tracing_subscriber::EnvFilter;

    match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(fallback),
    }
}

/// Install the global subscriber.
#[cfg(feature = "logging")]
pub fn init(config: &LogPolicyConfig) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = env_filter(&config.filter).map_err(LoggingError::Filter)?;
    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().with_target(true).compact())
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init(),
    }
    .map_err(LoggingError::Init)
}
