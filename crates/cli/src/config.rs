//! Optional TOML configuration (`--config <path>`).
//!
//! ```toml
//! [evaluation]
//! now = "2024-06-01T12:00:00Z"
//!
//! [output]
//! format = "json"
//! ```
//!
//! Command-line flags override file values.

use std::path::Path;

use serde::Deserialize;

use crate::error::CliError;
use crate::OutputFormat;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct EvaluationConfig {
    /// Pinned evaluation instant, RFC 3339.
    pub now: Option<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct OutputConfig {
    pub format: Option<ConfigFormat>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ConfigFormat {
    Text,
    Json,
}

impl From<ConfigFormat> for OutputFormat {
    fn from(f: ConfigFormat) -> Self {
        match f {
            ConfigFormat::Text => OutputFormat::Text,
            ConfigFormat::Json => OutputFormat::Json,
        }
    }
}

impl Config {
    pub(crate) fn load(path: &Path) -> Result<Config, CliError> {
        let src = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&src).map_err(|source| CliError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Rules file for `canon batch`.
///
/// ```toml
/// [[rule]]
/// id = "adult-accounts"
/// text = "WHEN user.age >= 18 THEN MUST account.is_active = TRUE"
/// ```
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct RuleSet {
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct RuleEntry {
    pub id: String,
    pub text: String,
}

impl RuleSet {
    pub(crate) fn load(path: &Path) -> Result<RuleSet, CliError> {
        let src = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&src).map_err(|source| CliError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}
