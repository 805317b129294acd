use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::{default_log_filter_string, default_log_format};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by CI log collectors.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// The optional `logging` object of the configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoggingSection {
    /// `EnvFilter` expression.
    #[serde(default = "default_log_filter_string")]
    pub filter: String,
    /// Output format.
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: default_log_filter_string(),
            format: default_log_format(),
        }
    }
}
