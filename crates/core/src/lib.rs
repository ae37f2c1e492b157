//! canon-core: lexer, parser and AST for the Canon compliance rule language.
//!
//! Rules have the shape
//!
//! ```text
//! WHEN <condition> THEN MUST <consequence>
//! WHEN <condition> THEN MUST FLAG <target> <label>
//! ```
//!
//! # Public API
//!
//! - [`parse()`] -- rule text to a typed [`Rule`], or a [`ParseError`]
//!   carrying the 1-based line and column of the failure
//! - AST types: [`Rule`], [`RuleBody`], [`Condition`], [`Consequence`],
//!   [`BooleanExpression`], [`Action`], [`Value`]
//!
//! The parser is stateless. A parsed [`Rule`] is immutable and may be
//! shared across threads.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{
    Action, ActionType, BooleanExpression, CompareOp, Condition, Consequence, DurationUnit,
    LogicalOp, PatternOp, RequirementKeyword, Rule, RuleBody, TemporalOp, Value,
};
pub use error::ParseError;
pub use parser::{parse, parse_instant};
