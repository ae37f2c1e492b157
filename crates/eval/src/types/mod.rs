//! Runtime value types and the evaluation context.
//!
//! These types are DISTINCT from canon-core AST types. The AST describes
//! what a rule says; the types here describe the data a rule is checked
//! against.

pub mod context;
pub mod values;

pub use context::Context;
pub use values::Value;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Problems detected while evaluating a single node.
///
/// These never escape [`crate::evaluate`]: the evaluator folds each one
/// into an `EvaluationResult` with `result: false` and `error` set, at
/// the node where it occurred.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// A function reference that is not in the built-in table.
    #[error("unknown function: {name}")]
    UnknownFunction { name: String },
    /// A MATCHES or LIKE pattern that does not compile.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    /// Ordering requested between values that have no common order.
    #[error("cannot order {left} against {right}")]
    Incomparable { left: String, right: String },
    /// A temporal operand that cannot be read as an instant.
    #[error("{value} is not an instant")]
    NotAnInstant { value: String },
    /// A temporal window operand that is not a duration.
    #[error("{value} is not a duration")]
    NotADuration { value: String },
    /// Duration or instant arithmetic left the representable range.
    #[error("arithmetic overflow: {message}")]
    Overflow { message: String },
    /// Context data that cannot be represented as a runtime value.
    #[error("invalid context: {message}")]
    InvalidContext { message: String },
}
