//! The evidence trail.
//!
//! Every node the evaluator visits produces an [`EvaluationResult`];
//! the rule-level result nests all of them so an auditor can trace
//! exactly why a rule passed, failed or did not apply.

use canon_core::{
    ActionType, CompareOp, LogicalOp, PatternOp, RequirementKeyword, TemporalOp,
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::types::{EvalError, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    pub fn new(result: bool, reason: impl Into<String>) -> Self {
        EvaluationResult {
            result,
            reason: Some(reason.into()),
            details: None,
            error: None,
        }
    }

    /// A node that could not be evaluated. Always `result: false`.
    pub fn failed(err: &EvalError) -> Self {
        let message = err.to_string();
        EvaluationResult {
            result: false,
            reason: Some(format!("Evaluation error: {}", message)),
            details: None,
            error: Some(message),
        }
    }

    pub fn with_details(mut self, details: Details) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    /// True when this node, or any node below it, recorded an error.
    pub fn has_error(&self) -> bool {
        self.first_error().is_some()
    }

    /// The first error in this subtree, depth-first and left to right.
    pub fn first_error(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or_else(|| self.details.as_ref().and_then(Details::first_error))
    }
}

/// What a node looked at. Leaf variants carry the resolved operand values;
/// branch variants carry the child results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Details {
    Rule {
        condition: Box<EvaluationResult>,
        #[serde(skip_serializing_if = "Option::is_none")]
        consequence: Option<Box<EvaluationResult>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        action: Option<ActionRecord>,
    },
    Comparison {
        left: Value,
        operator: CompareOp,
        right: Value,
    },
    Membership {
        value: Value,
        negated: bool,
        values: Vec<Value>,
    },
    Range {
        value: Value,
        lower: Value,
        upper: Value,
    },
    Pattern {
        value: Value,
        operator: PatternOp,
        pattern: Value,
    },
    Temporal {
        value: Value,
        operator: TemporalOp,
        reference: Value,
        #[serde(with = "time::serde::rfc3339")]
        now: OffsetDateTime,
    },
    Logical {
        operator: LogicalOp,
        left: Box<EvaluationResult>,
        right: Box<EvaluationResult>,
    },
    Negation {
        inner: Box<EvaluationResult>,
    },
    Truthiness {
        operand: String,
        value: Value,
    },
    Requirement {
        variable: String,
        keyword: RequirementKeyword,
        value: Value,
    },
    Literal {
        value: bool,
    },
}

impl Details {
    fn first_error(&self) -> Option<&str> {
        match self {
            Details::Rule {
                condition,
                consequence,
                ..
            } => condition
                .first_error()
                .or_else(|| consequence.as_ref().and_then(|c| c.first_error())),
            Details::Logical { left, right, .. } => {
                left.first_error().or_else(|| right.first_error())
            }
            Details::Negation { inner } => inner.first_error(),
            _ => None,
        }
    }
}

/// The side intent recorded when an action rule applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub action_type: ActionType,
    pub target: String,
    pub label: String,
}
