use serde::{Deserialize, Serialize};

/// A parse error. Rule text that fails to lex or parse never yields a
/// partial rule; the error points at the first offending token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    /// 1-based line of the failure point.
    pub line: u32,
    /// 1-based column of the failure point.
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Serialize to the JSON shape the CLI emits for diagnostics.
    /// All fields are always present.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "kind":    "parse_error",
            "line":    self.line,
            "column":  self.column,
            "message": self.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position() {
        let e = ParseError::new(2, 7, "expected 'THEN'");
        assert_eq!(e.to_string(), "line 2, column 7: expected 'THEN'");
    }

    #[test]
    fn json_value_has_all_fields() {
        let v = ParseError::new(1, 1, "empty rule").to_json_value();
        assert_eq!(v["line"], 1);
        assert_eq!(v["column"], 1);
        assert_eq!(v["message"], "empty rule");
        assert_eq!(v["kind"], "parse_error");
    }
}
