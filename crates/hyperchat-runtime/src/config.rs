#![forbid(unsafe_code)]

//! File-backed configuration for a chat session.
//!
//! [`ChatConfig`] groups the list tunables and the logging setup into one
//! struct that can be loaded from TOML or JSON at startup.
//!
//! # Loading
//!
//! ```toml
//! # hyperchat.toml
//! [list]
//! default_item_height = 96
//! load_more_edge = "top"
//!
//! [log]
//! filter = "hyperchat=debug"
//! format = "json"
//! ```
//!
//! ```rust,ignore
//! let config = ChatConfig::load("hyperchat.toml")?;
//! let list = config.to_list_config();
//! ```
//!
//! # Defaults
//!
//! Every field defaults to the matching [`ListConfig`] default, so
//! `ChatConfig::default().to_list_config() == ListConfig::default()`.

#[cfg(feature = "config-files")]
use std::path::Path;

#[cfg(feature = "config-files")]
use serde::{Deserialize, Serialize};

use hyperchat_core::Edge;
use hyperchat_widgets::ListConfig;

use crate::logging::LogFormat;

/// Environment variable naming a config file to load.
pub const CONFIG_ENV: &str = "HYPERCHAT_CONFIG";

/// Largest accepted scroll throttle interval.
const MAX_THROTTLE_MS: u64 = 1_000;

// ---------------------------------------------------------------------------
// Top-level ChatConfig
// ---------------------------------------------------------------------------

/// Top-level configuration for a chat session.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct ChatConfig {
    /// Virtualized list parameters.
    pub list: ListPolicyConfig,
    /// Logging pipeline parameters.
    pub log: LogPolicyConfig,
}

impl ChatConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load a file, choosing the format by extension, and validate it.
    ///
    /// `.json` files are parsed as JSON; anything else as TOML.
    #[cfg(feature = "config-files")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_file(path)?
        } else {
            Self::from_toml_file(path)?
        };
        let errors = config.validate();
        if errors.is_empty() {
            tracing::debug!(path = %path.display(), "loaded chat config");
            Ok(config)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load the file named by `HYPERCHAT_CONFIG`, or defaults when unset.
    #[cfg(feature = "config-files")]
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.list.default_item_height == 0 {
            errors.push("list.default_item_height must be > 0".into());
        }

        if self.list.max_rendered_items == 0 {
            errors.push("list.max_rendered_items must be > 0".into());
        }

        if self.list.scroll_throttle_ms > MAX_THROTTLE_MS {
            errors.push(format!(
                "list.scroll_throttle_ms must be <= {MAX_THROTTLE_MS}, got {}",
                self.list.scroll_throttle_ms
            ));
        }

        if self.log.filter.trim().is_empty() {
            errors.push("log.filter must not be empty".into());
        }

        errors
    }

    /// Build a [`ListConfig`] from this configuration.
    #[must_use]
    pub fn to_list_config(&self) -> ListConfig {
        ListConfig {
            default_item_height: self.list.default_item_height,
            scroll_throttle_ms: self.list.scroll_throttle_ms,
            load_more_margin: self.list.load_more_margin,
            load_more_edge: self.list.load_more_edge,
            max_rendered_items: self.list.max_rendered_items,
            stick_to_bottom_threshold: self.list.stick_to_bottom_threshold,
        }
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Virtualized list parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct ListPolicyConfig {
    /// Height estimate for unmeasured items. Default: 130.
    pub default_item_height: u32,
    /// Scroll coalescing window in milliseconds. Default: 16.
    pub scroll_throttle_ms: u64,
    /// Sentinel arming distance in pixels. Default: 200.
    pub load_more_margin: u64,
    /// Edge that requests older history. Default: top.
    #[cfg_attr(
        feature = "config-files",
        serde(serialize_with = "serialize_edge", deserialize_with = "deserialize_edge")
    )]
    pub load_more_edge: Edge,
    /// Mounted-item cap. Default: 5000.
    pub max_rendered_items: usize,
    /// Bottom stickiness threshold in pixels. Default: 40.
    pub stick_to_bottom_threshold: u64,
}

impl Default for ListPolicyConfig {
    fn default() -> Self {
        let list = ListConfig::default();
        Self {
            default_item_height: list.default_item_height,
            scroll_throttle_ms: list.scroll_throttle_ms,
            load_more_margin: list.load_more_margin,
            load_more_edge: list.load_more_edge,
            max_rendered_items: list.max_rendered_items,
            stick_to_bottom_threshold: list.stick_to_bottom_threshold,
        }
    }
}

/// Logging pipeline parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct LogPolicyConfig {
    /// `EnvFilter` directive used when `HYPERCHAT_LOG` is unset. Default: "info".
    pub filter: String,
    /// Output format. Default: compact.
    pub format: LogFormat,
}

impl Default for LogPolicyConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            format: LogFormat::Compact,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a chat configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-files")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-files")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for Edge
// ---------------------------------------------------------------------------

#[cfg(feature = "config-files")]
fn serialize_edge<S>(edge: &Edge, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let s = match edge {
        Edge::Top => "top",
        Edge::Bottom => "bottom",
    };
    serializer.serialize_str(s)
}

#[cfg(feature = "config-files")]
fn deserialize_edge<'de, D>(deserializer: D) -> Result<Edge, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.as_str() {
        "top" | "Top" => Ok(Edge::Top),
        "bottom" | "Bottom" => Ok(Edge::Bottom),
        other => Err(serde::de::Error::custom(format!("unknown edge: {other}"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_list_defaults() {
        assert_eq!(ChatConfig::default().to_list_config(), ListConfig::default());
    }

    #[test]
    fn default_validates_clean() {
        let errors = ChatConfig::default().validate();
        assert!(errors.is_empty(), "default should validate: {errors:?}");
    }

    #[test]
    fn validate_catches_zero_item_height() {
        let mut config = ChatConfig::default();
        config.list.default_item_height = 0;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("default_item_height")));
    }

    #[test]
    fn validate_catches_zero_cap() {
        let mut config = ChatConfig::default();
        config.list.max_rendered_items = 0;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("max_rendered_items")));
    }

    #[test]
    fn validate_catches_slow_throttle() {
        let mut config = ChatConfig::default();
        config.list.scroll_throttle_ms = 5_000;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("scroll_throttle_ms")));
    }

    #[test]
    fn validate_catches_blank_filter() {
        let mut config = ChatConfig::default();
        config.log.filter = "  ".into();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("log.filter")));
    }

    #[test]
    fn validate_reports_every_problem() {
        let mut config = ChatConfig::default();
        config.list.default_item_height = 0;
        config.list.max_rendered_items = 0;
        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn validation_error_display_joins_messages() {
        let err = ConfigError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "validation errors: a; b");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[cfg(feature = "config-files")]
    mod files {
        use super::super::*;
        use std::io::Write;

        #[test]
        fn partial_toml_keeps_defaults() {
            let config = ChatConfig::from_toml_str(
                r#"
                [list]
                default_item_height = 96
                load_more_edge = "bottom"
                "#,
            )
            .unwrap();
            assert_eq!(config.list.default_item_height, 96);
            assert_eq!(config.list.load_more_edge, Edge::Bottom);
            assert_eq!(config.list.max_rendered_items, 5000);
            assert_eq!(config.log, LogPolicyConfig::default());
        }

        #[test]
        fn edge_accepts_camel_case() {
            let config =
                ChatConfig::from_json_str(r#"{"list":{"load_more_edge":"Bottom"}}"#).unwrap();
            assert_eq!(config.list.load_more_edge, Edge::Bottom);
        }

        #[test]
        fn unknown_edge_is_rejected() {
            let err = ChatConfig::from_toml_str("[list]\nload_more_edge = \"left\"").unwrap_err();
            assert!(matches!(err, ConfigError::Toml(_)));
            assert!(err.to_string().contains("unknown edge"));
        }

        #[test]
        fn json_round_trips_log_format() {
            let mut config = ChatConfig::default();
            config.log.format = LogFormat::Json;
            let json = serde_json::to_string(&config).unwrap();
            assert!(json.contains(r#""format":"json""#));
            assert!(json.contains(r#""load_more_edge":"top""#));
            assert_eq!(ChatConfig::from_json_str(&json).unwrap(), config);
        }

        #[test]
        fn load_picks_format_by_extension() {
            let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
            write!(json, r#"{{"list":{{"load_more_margin":64}}}}"#).unwrap();
            assert_eq!(ChatConfig::load(json.path()).unwrap().list.load_more_margin, 64);

            let mut toml = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
            write!(toml, "[list]\nload_more_margin = 32\n").unwrap();
            assert_eq!(ChatConfig::load(toml.path()).unwrap().list.load_more_margin, 32);
        }

        #[test]
        fn load_rejects_invalid_values() {
            let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
            write!(file, "[list]\nmax_rendered_items = 0\n").unwrap();
            match ChatConfig::load(file.path()) {
                Err(ConfigError::Validation(errors)) => {
                    assert!(errors.iter().any(|e| e.contains("max_rendered_items")));
                }
                other => panic!("expected validation error, got {other:?}"),
            }
        }

        #[test]
        fn missing_file_is_io_error() {
            let dir = tempfile::tempdir().unwrap();
            let err = ChatConfig::load(dir.path().join("absent.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Io(_)));
        }
    }
}
