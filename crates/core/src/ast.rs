//! Typed AST for compliance rules.
//!
//! These types are produced by the parser and consumed by the evaluator.
//! A rule is an immutable, acyclic value: every child node is owned by its
//! parent and nothing is shared, so a parsed rule can be evaluated from
//! many threads at once.
//!
//! Every node renders back to canonical rule text through `Display`;
//! re-parsing that text yields an equal AST.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

// ──────────────────────────────────────────────
// Operands
// ──────────────────────────────────────────────

/// Unit of a duration literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DurationUnit {
    Minutes,
    Hours,
    Days,
}

impl DurationUnit {
    /// Parse a unit keyword. Singular forms are accepted.
    pub fn from_keyword(word: &str) -> Option<DurationUnit> {
        match word {
            "MINUTES" | "MINUTE" => Some(DurationUnit::Minutes),
            "HOURS" | "HOUR" => Some(DurationUnit::Hours),
            "DAYS" | "DAY" => Some(DurationUnit::Days),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DurationUnit::Minutes => "MINUTES",
            DurationUnit::Hours => "HOURS",
            DurationUnit::Days => "DAYS",
        }
    }

    pub fn seconds(self) -> i64 {
        match self {
            DurationUnit::Minutes => 60,
            DurationUnit::Hours => 3_600,
            DurationUnit::Days => 86_400,
        }
    }

    /// Length of `amount` units as a `time::Duration`, or `None` when it
    /// does not fit.
    pub fn to_duration(self, amount: i64) -> Option<time::Duration> {
        amount
            .checked_mul(self.seconds())
            .map(time::Duration::seconds)
    }
}

/// An operand as written in rule text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Value {
    /// Dotted path into the evaluation context, e.g. `transaction.amount`.
    Variable { path: String },
    StringLiteral { value: String },
    NumberLiteral { value: Decimal },
    BooleanLiteral { value: bool },
    DatetimeLiteral {
        #[serde(with = "time::serde::rfc3339")]
        value: OffsetDateTime,
    },
    DurationLiteral { amount: i64, unit: DurationUnit },
    NullLiteral,
    /// Built-in function reference (`NOW`, `TODAY`), resolved at evaluation time.
    FunctionCall { name: String },
}

impl Value {
    pub fn variable(path: impl Into<String>) -> Value {
        Value::Variable { path: path.into() }
    }

    pub fn string(value: impl Into<String>) -> Value {
        Value::StringLiteral {
            value: value.into(),
        }
    }

    pub fn number(value: impl Into<Decimal>) -> Value {
        Value::NumberLiteral {
            value: value.into(),
        }
    }

    pub fn boolean(value: bool) -> Value {
        Value::BooleanLiteral { value }
    }

    pub fn duration(amount: i64, unit: DurationUnit) -> Value {
        Value::DurationLiteral { amount, unit }
    }

    /// The variable path, if this operand is a variable reference.
    pub fn as_path(&self) -> Option<&str> {
        match self {
            Value::Variable { path } => Some(path),
            _ => None,
        }
    }
}

// ──────────────────────────────────────────────
// Operators
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "LIKE")]
    Like,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PatternOp {
    Contains,
    Matches,
}

impl PatternOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternOp::Contains => "CONTAINS",
            PatternOp::Matches => "MATCHES",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemporalOp {
    Before,
    After,
    Within,
    /// `EXPIRES AFTER <duration>`
    Expires,
}

impl TemporalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            TemporalOp::Before => "BEFORE",
            TemporalOp::After => "AFTER",
            TemporalOp::Within => "WITHIN",
            TemporalOp::Expires => "EXPIRES AFTER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

// ──────────────────────────────────────────────
// Conditions (the WHEN clause)
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Simple {
        left: Value,
        operator: CompareOp,
        right: Value,
    },
    /// `variable IN [v, ...]`
    List { variable: Value, values: Vec<Value> },
    Pattern {
        variable: Value,
        operator: PatternOp,
        pattern: Value,
    },
    Temporal {
        variable: Value,
        operator: TemporalOp,
        value: Value,
    },
    Compound {
        left: Box<Condition>,
        operator: LogicalOp,
        right: Box<Condition>,
    },
    Not { inner: Box<Condition> },
    VariableTruthy { variable: Value },
}

// ──────────────────────────────────────────────
// Consequences (the MUST clause)
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequirementKeyword {
    /// Written `REQUIRE <variable>`.
    Must,
    /// Written `RECOMMEND <variable>`. Advisory only.
    Should,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Consequence {
    Constraint {
        variable: Value,
        operator: CompareOp,
        value: Value,
    },
    InConstraint {
        variable: Value,
        values: Vec<Value>,
    },
    NotInConstraint {
        variable: Value,
        values: Vec<Value>,
    },
    /// Inclusive on both bounds.
    BetweenConstraint {
        variable: Value,
        lower: Value,
        upper: Value,
    },
    Requirement {
        variable: Value,
        keyword: RequirementKeyword,
    },
    BooleanExpression { expression: BooleanExpression },
    BooleanLiteral { value: bool },
    VariableExpression { variable: Value },
}

/// Logical combination of consequences. Mirrors the shape of compound
/// conditions but is a separate type: consequences and conditions never mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "UPPERCASE")]
pub enum BooleanExpression {
    And {
        left: Box<Consequence>,
        right: Box<Consequence>,
    },
    Or {
        left: Box<Consequence>,
        right: Box<Consequence>,
    },
    Not { inner: Box<Consequence> },
}

// ──────────────────────────────────────────────
// Actions and rules
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    Flag,
    Block,
    Notify,
    Escalate,
    Report,
}

impl ActionType {
    pub fn from_keyword(word: &str) -> Option<ActionType> {
        match word {
            "FLAG" => Some(ActionType::Flag),
            "BLOCK" => Some(ActionType::Block),
            "NOTIFY" => Some(ActionType::Notify),
            "ESCALATE" => Some(ActionType::Escalate),
            "REPORT" => Some(ActionType::Report),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Flag => "FLAG",
            ActionType::Block => "BLOCK",
            ActionType::Notify => "NOTIFY",
            ActionType::Escalate => "ESCALATE",
            ActionType::Report => "REPORT",
        }
    }
}

/// A side annotation recorded whenever the rule's condition holds,
/// e.g. `FLAG transaction as_high_risk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub action_type: ActionType,
    pub variable: Value,
    pub label: String,
}

/// What a rule demands once its condition applies. A rule carries exactly
/// one of the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleBody {
    Consequence(Consequence),
    Action(Action),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub condition: Condition,
    #[serde(flatten)]
    pub body: RuleBody,
}

impl Rule {
    pub fn consequence(&self) -> Option<&Consequence> {
        match &self.body {
            RuleBody::Consequence(c) => Some(c),
            RuleBody::Action(_) => None,
        }
    }

    pub fn action(&self) -> Option<&Action> {
        match &self.body {
            RuleBody::Action(a) => Some(a),
            RuleBody::Consequence(_) => None,
        }
    }
}

// ──────────────────────────────────────────────
// Canonical text rendering
// ──────────────────────────────────────────────

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Variable { path } => write!(f, "{}", path),
            Value::StringLiteral { value } => write!(f, "'{}'", value.replace('\'', "''")),
            Value::NumberLiteral { value } => write!(f, "{}", value),
            Value::BooleanLiteral { value } => f.write_str(if *value { "TRUE" } else { "FALSE" }),
            Value::DatetimeLiteral { value } => match value.format(&Rfc3339) {
                Ok(s) => f.write_str(&s),
                Err(_) => Err(fmt::Error),
            },
            Value::DurationLiteral { amount, unit } => write!(f, "{} {}", amount, unit.as_str()),
            Value::NullLiteral => f.write_str("NULL"),
            Value::FunctionCall { name } => write!(f, "{}()", name),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    f.write_str("[")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", v)?;
    }
    f.write_str("]")
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Simple {
                left,
                operator,
                right,
            } => write!(f, "{} {} {}", left, operator.as_str(), right),
            Condition::List { variable, values } => {
                write!(f, "{} IN ", variable)?;
                write_list(f, values)
            }
            Condition::Pattern {
                variable,
                operator,
                pattern,
            } => write!(f, "{} {} {}", variable, operator.as_str(), pattern),
            Condition::Temporal {
                variable,
                operator,
                value,
            } => write!(f, "{} {} {}", variable, operator.as_str(), value),
            Condition::Compound {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator.as_str(), right),
            Condition::Not { inner } => write!(f, "NOT {}", inner),
            Condition::VariableTruthy { variable } => write!(f, "{}", variable),
        }
    }
}

impl fmt::Display for Consequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consequence::Constraint {
                variable,
                operator,
                value,
            } => write!(f, "{} {} {}", variable, operator.as_str(), value),
            Consequence::InConstraint { variable, values } => {
                write!(f, "{} IN ", variable)?;
                write_list(f, values)
            }
            Consequence::NotInConstraint { variable, values } => {
                write!(f, "{} NOT IN ", variable)?;
                write_list(f, values)
            }
            Consequence::BetweenConstraint {
                variable,
                lower,
                upper,
            } => write!(f, "{} BETWEEN {} AND {}", variable, lower, upper),
            Consequence::Requirement { variable, keyword } => match keyword {
                RequirementKeyword::Must => write!(f, "REQUIRE {}", variable),
                RequirementKeyword::Should => write!(f, "RECOMMEND {}", variable),
            },
            Consequence::BooleanExpression { expression } => match expression {
                BooleanExpression::And { left, right } => write!(f, "({} AND {})", left, right),
                BooleanExpression::Or { left, right } => write!(f, "({} OR {})", left, right),
                BooleanExpression::Not { inner } => write!(f, "NOT {}", inner),
            },
            Consequence::BooleanLiteral { value } => {
                f.write_str(if *value { "TRUE" } else { "FALSE" })
            }
            Consequence::VariableExpression { variable } => write!(f, "{}", variable),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.action_type.as_str(),
            self.variable,
            self.label
        )
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WHEN {} THEN MUST ", self.condition)?;
        match &self.body {
            RuleBody::Consequence(c) => write!(f, "{}", c),
            RuleBody::Action(a) => write!(f, "{}", a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_units_convert() {
        assert_eq!(
            DurationUnit::Minutes.to_duration(30),
            Some(time::Duration::minutes(30))
        );
        assert_eq!(DurationUnit::Days.to_duration(2), Some(time::Duration::hours(48)));
        assert_eq!(DurationUnit::Days.to_duration(200_000_000_000_000), None);
        assert_eq!(DurationUnit::Minutes.to_duration(i64::MIN), None);
        assert_eq!(DurationUnit::from_keyword("HOUR"), Some(DurationUnit::Hours));
        assert_eq!(DurationUnit::from_keyword("WEEKS"), None);
    }

    #[test]
    fn string_literal_escapes_quotes() {
        assert_eq!(Value::string("it's").to_string(), "'it''s'");
    }

    #[test]
    fn rule_serializes_exactly_one_body() {
        let rule = Rule {
            condition: Condition::VariableTruthy {
                variable: Value::variable("user.active"),
            },
            body: RuleBody::Consequence(Consequence::BooleanLiteral { value: true }),
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert!(json.get("consequence").is_some());
        assert!(json.get("action").is_none());
        assert_eq!(json["condition"]["kind"], "variable_truthy");
        assert_eq!(json["condition"]["variable"]["type"], "variable");

        let back: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn compare_op_serializes_as_symbol() {
        let json = serde_json::to_value(CompareOp::Gte).unwrap();
        assert_eq!(json, serde_json::json!(">="));
    }
}
