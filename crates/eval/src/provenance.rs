//! Provenance for rule decisions.
//!
//! Each decision records which context paths and built-in functions the
//! evaluator touched, in first-access order.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleProvenance {
    /// Context paths resolved during evaluation.
    pub variables_used: Vec<String>,
    /// Built-in functions called during evaluation.
    pub functions_used: Vec<String>,
}

/// Collector that tracks variable and function references while a rule
/// is evaluated.
#[derive(Debug, Clone, Default)]
pub struct ProvenanceCollector {
    pub variables_used: Vec<String>,
    pub functions_used: Vec<String>,
}

impl ProvenanceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_variable(&mut self, path: &str) {
        if !self.variables_used.iter().any(|p| p == path) {
            self.variables_used.push(path.to_string());
        }
    }

    pub fn record_function(&mut self, name: &str) {
        if !self.functions_used.iter().any(|f| f == name) {
            self.functions_used.push(name.to_string());
        }
    }

    pub fn into_provenance(self) -> RuleProvenance {
        RuleProvenance {
            variables_used: self.variables_used,
            functions_used: self.functions_used,
        }
    }
}
