use std::path::PathBuf;

use canon_core::ParseError;

/// Failures that stop a CLI command.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("error reading '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in '{}': {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid TOML in '{}': {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{}: {err}", .path.display())]
    Parse { path: PathBuf, err: ParseError },
    #[error("invalid context in '{}': {source}", .path.display())]
    Context {
        path: PathBuf,
        source: canon_eval::EvalError,
    },
    #[error("invalid instant '{0}': expected RFC 3339, e.g. 2024-06-01T12:00:00Z")]
    InvalidNow(String),
    #[error("{failed} of {total} rules failed to parse")]
    BatchParse { failed: usize, total: usize },
}

impl CliError {
    /// Machine-readable form for `--output json`.
    pub(crate) fn to_json_value(&self) -> serde_json::Value {
        match self {
            CliError::Parse { path, err } => {
                let mut v = err.to_json_value();
                if let Some(obj) = v.as_object_mut() {
                    obj.insert(
                        "file".to_string(),
                        serde_json::Value::String(path.display().to_string()),
                    );
                }
                v
            }
            other => serde_json::json!({ "error": other.to_string() }),
        }
    }
}
