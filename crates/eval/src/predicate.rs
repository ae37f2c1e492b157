//! Condition evaluator.
//!
//! Walks the WHEN clause and produces one [`EvaluationResult`] per node.
//! Logical nodes evaluate BOTH operands every time and keep both child
//! results, so the evidence trail shows every check performed.
//!
//! Errors never escape: a leaf that cannot be evaluated becomes a
//! `result: false` node with `error` set.

use std::fmt;

use canon_core::ast::{self, Condition, LogicalOp, PatternOp, TemporalOp};
use tracing::warn;

use crate::builtins::Builtins;
use crate::clock::Clock;
use crate::operators;
use crate::provenance::ProvenanceCollector;
use crate::result::{Details, EvaluationResult};
use crate::temporal;
use crate::types::{Context, EvalError, Value};

/// Everything a node needs besides the AST itself.
#[derive(Clone, Copy)]
pub struct EvalEnv<'a> {
    pub context: &'a Context,
    pub clock: &'a dyn Clock,
    pub builtins: &'a Builtins,
}

/// Resolve an AST operand to a runtime value.
///
/// Variables go through the context (missing paths are `Null`); function
/// references go through the built-in table and the clock.
pub fn resolve_operand(
    operand: &ast::Value,
    env: &EvalEnv<'_>,
    collector: &mut ProvenanceCollector,
) -> Result<Value, EvalError> {
    Ok(match operand {
        ast::Value::Variable { path } => {
            collector.record_variable(path);
            env.context.resolve(path)
        }
        ast::Value::StringLiteral { value } => Value::Text(value.clone()),
        ast::Value::NumberLiteral { value } => Value::Number(*value),
        ast::Value::BooleanLiteral { value } => Value::Bool(*value),
        ast::Value::DatetimeLiteral { value } => Value::DateTime(*value),
        ast::Value::DurationLiteral { amount, unit } => {
            let d = unit.to_duration(*amount).ok_or_else(|| EvalError::Overflow {
                message: format!("duration {} {} is out of range", amount, unit.as_str()),
            })?;
            Value::Duration(d)
        }
        ast::Value::NullLiteral => Value::Null,
        ast::Value::FunctionCall { name } => {
            collector.record_function(name);
            env.builtins.call(name, env.clock)?
        }
    })
}

pub(crate) fn resolve_all(
    operands: &[ast::Value],
    env: &EvalEnv<'_>,
    collector: &mut ProvenanceCollector,
) -> Result<Vec<Value>, EvalError> {
    operands
        .iter()
        .map(|v| resolve_operand(v, env, collector))
        .collect()
}

/// Turn a leaf outcome into a result node.
pub(crate) fn settle(
    node: &dyn fmt::Display,
    outcome: Result<bool, EvalError>,
    details: Details,
) -> EvaluationResult {
    let result = match outcome {
        Ok(b) => EvaluationResult::new(b, format!("{} evaluated to {}", node, b)),
        Err(e) => failure(node, &e),
    };
    result.with_details(details)
}

pub(crate) fn failure(node: &dyn fmt::Display, err: &EvalError) -> EvaluationResult {
    warn!(node = %node, error = %err, "evaluation error folded into result");
    EvaluationResult::failed(err)
}

/// Combine two already-evaluated children.
pub(crate) fn combine(
    node: &dyn fmt::Display,
    operator: LogicalOp,
    left: EvaluationResult,
    right: EvaluationResult,
) -> EvaluationResult {
    let b = match operator {
        LogicalOp::And => left.result && right.result,
        LogicalOp::Or => left.result || right.result,
    };
    EvaluationResult::new(b, format!("{} evaluated to {}", node, b)).with_details(
        Details::Logical {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        },
    )
}

/// Negate an evaluated child. An errored child stays false and keeps
/// its error.
pub(crate) fn negate(node: &dyn fmt::Display, inner: EvaluationResult) -> EvaluationResult {
    let (b, error) = match &inner.error {
        Some(e) => (false, Some(e.clone())),
        None => (!inner.result, None),
    };
    EvaluationResult::new(b, format!("{} evaluated to {}", node, b))
        .with_error(error)
        .with_details(Details::Negation {
            inner: Box::new(inner),
        })
}

/// Evaluate a condition tree.
pub fn eval_condition(
    cond: &Condition,
    env: &EvalEnv<'_>,
    collector: &mut ProvenanceCollector,
) -> EvaluationResult {
    match eval_node(cond, env, collector) {
        Ok(r) => r,
        Err(e) => failure(cond, &e),
    }
}

fn eval_node(
    cond: &Condition,
    env: &EvalEnv<'_>,
    collector: &mut ProvenanceCollector,
) -> Result<EvaluationResult, EvalError> {
    match cond {
        Condition::Simple {
            left,
            operator,
            right,
        } => {
            let l = resolve_operand(left, env, collector)?;
            let r = resolve_operand(right, env, collector)?;
            let outcome = operators::compare(&l, *operator, &r);
            Ok(settle(
                cond,
                outcome,
                Details::Comparison {
                    left: l,
                    operator: *operator,
                    right: r,
                },
            ))
        }

        Condition::List { variable, values } => {
            let v = resolve_operand(variable, env, collector)?;
            let set = resolve_all(values, env, collector)?;
            let outcome = Ok(operators::is_member(&v, &set));
            Ok(settle(
                cond,
                outcome,
                Details::Membership {
                    value: v,
                    negated: false,
                    values: set,
                },
            ))
        }

        Condition::Pattern {
            variable,
            operator,
            pattern,
        } => {
            let v = resolve_operand(variable, env, collector)?;
            let p = resolve_operand(pattern, env, collector)?;
            let outcome = match operator {
                PatternOp::Contains => Ok(operators::contains(&v, &p)),
                PatternOp::Matches => operators::matches(&v, &p),
            };
            Ok(settle(
                cond,
                outcome,
                Details::Pattern {
                    value: v,
                    operator: *operator,
                    pattern: p,
                },
            ))
        }

        Condition::Temporal {
            variable,
            operator,
            value,
        } => {
            let v = resolve_operand(variable, env, collector)?;
            let reference = resolve_operand(value, env, collector)?;
            let now = env.clock.now();
            let outcome = match operator {
                TemporalOp::Before => temporal::before(&v, &reference),
                TemporalOp::After => temporal::after(&v, &reference),
                TemporalOp::Within => temporal::within(&v, &reference, now),
                TemporalOp::Expires => temporal::expires_after(&v, &reference, now),
            };
            Ok(settle(
                cond,
                outcome,
                Details::Temporal {
                    value: v,
                    operator: *operator,
                    reference,
                    now,
                },
            ))
        }

        Condition::Compound {
            left,
            operator,
            right,
        } => {
            let l = eval_condition(left, env, collector);
            let r = eval_condition(right, env, collector);
            Ok(combine(cond, *operator, l, r))
        }

        Condition::Not { inner } => {
            let r = eval_condition(inner, env, collector);
            Ok(negate(cond, r))
        }

        Condition::VariableTruthy { variable } => {
            let v = resolve_operand(variable, env, collector)?;
            let outcome = Ok(v.is_truthy());
            Ok(settle(
                cond,
                outcome,
                Details::Truthiness {
                    operand: variable.to_string(),
                    value: v,
                },
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use canon_core::CompareOp;
    use serde_json::json;
    use time::macros::datetime;

    fn when(text: &str) -> Condition {
        let rule = canon_core::parse(&format!("WHEN {} THEN MUST TRUE", text)).unwrap();
        rule.condition
    }

    fn run(text: &str, ctx: serde_json::Value) -> (EvaluationResult, ProvenanceCollector) {
        let context = Context::from_json(&ctx).unwrap();
        let clock = FixedClock(datetime!(2024-06-01 12:00 UTC));
        let builtins = Builtins::standard();
        let env = EvalEnv {
            context: &context,
            clock: &clock,
            builtins: &builtins,
        };
        let mut collector = ProvenanceCollector::new();
        let r = eval_condition(&when(text), &env, &mut collector);
        (r, collector)
    }

    #[test]
    fn simple_comparison_records_operands() {
        let (r, _) = run("user.age >= 18", json!({"user": {"age": 25}}));
        assert!(r.result);
        assert_eq!(r.reason.as_deref(), Some("user.age >= 18 evaluated to true"));
        assert_eq!(
            r.details,
            Some(Details::Comparison {
                left: Value::from(25),
                operator: CompareOp::Gte,
                right: Value::from(18),
            })
        );
    }

    #[test]
    fn and_keeps_both_children_even_when_left_is_false() {
        let (r, c) = run(
            "user.age >= 18 AND user.country = 'DE'",
            json!({"user": {"age": 12, "country": "DE"}}),
        );
        assert!(!r.result);
        let Some(Details::Logical { left, right, .. }) = r.details else {
            panic!("expected logical details");
        };
        assert!(!left.result);
        assert!(right.result);
        assert_eq!(c.variables_used, vec!["user.age", "user.country"]);
    }

    #[test]
    fn or_keeps_both_children_even_when_left_is_true() {
        let (r, c) = run("a = 1 OR b = 2", json!({"a": 1, "b": 3}));
        assert!(r.result);
        let Some(Details::Logical { right, .. }) = r.details else {
            panic!("expected logical details");
        };
        assert!(!right.result);
        assert_eq!(c.variables_used, vec!["a", "b"]);
    }

    #[test]
    fn missing_variable_is_null_not_an_error() {
        let (r, _) = run("user.age > 18", json!({}));
        assert!(!r.result);
        assert!(r.error.is_none());
        let (r, _) = run("user.age = NULL", json!({}));
        assert!(r.result);
    }

    #[test]
    fn incomparable_leaf_folds_into_error() {
        let (r, _) = run("user.name > 5", json!({"user": {"name": "ann"}}));
        assert!(!r.result);
        assert!(r.error.is_some());
        assert!(r.reason.unwrap().starts_with("Evaluation error:"));
        assert!(matches!(r.details, Some(Details::Comparison { .. })));
    }

    #[test]
    fn not_of_an_error_stays_false() {
        let (r, _) = run("NOT email MATCHES '('", json!({"email": "x"}));
        assert!(!r.result);
        assert!(r.error.is_some());
    }

    #[test]
    fn not_in_is_the_complement_of_in() {
        let ctx = json!({"country": "IR"});
        let (yes, _) = run("country IN ['IR', 'KP']", ctx.clone());
        let (no, _) = run("country NOT IN ['IR', 'KP']", ctx);
        assert!(yes.result);
        assert!(!no.result);
    }

    #[test]
    fn unknown_function_is_recorded_and_folded() {
        let (r, c) = run("due BEFORE LATER()", json!({"due": "2024-01-01"}));
        assert!(!r.result);
        assert_eq!(r.error.as_deref(), Some("unknown function: LATER"));
        assert_eq!(c.functions_used, vec!["LATER"]);
    }

    #[test]
    fn temporal_records_now() {
        let (r, c) = run(
            "session.last_activity WITHIN 30 MINUTES",
            json!({"session": {"last_activity": "2024-06-01T11:45:00Z"}}),
        );
        assert!(r.result);
        let Some(Details::Temporal { now, .. }) = r.details else {
            panic!("expected temporal details");
        };
        assert_eq!(now, datetime!(2024-06-01 12:00 UTC));
        assert_eq!(c.variables_used, vec!["session.last_activity"]);
    }

    #[test]
    fn oversized_window_is_an_error_not_a_panic() {
        let (r, _) = run(
            "session.last_activity WITHIN 200000000000000 DAYS",
            json!({"session": {"last_activity": "2024-06-01T11:45:00Z"}}),
        );
        assert!(!r.result);
        assert!(r.error.as_deref().unwrap().starts_with("arithmetic overflow"));
    }

    #[test]
    fn deadline_before_now_function() {
        let (r, c) = run("deadline BEFORE NOW", json!({"deadline": "2024-05-01"}));
        assert!(r.result);
        assert_eq!(c.functions_used, vec!["NOW"]);
    }

    #[test]
    fn bare_variable_uses_truthiness() {
        assert!(run("user.active", json!({"user": {"active": true}})).0.result);
        assert!(!run("user.active", json!({"user": {"active": ""}})).0.result);
        assert!(!run("user.active", json!({})).0.result);
    }

    #[test]
    fn contains_tests_the_variable_for_the_pattern() {
        let ctx = json!({"note": "wire transfer to offshore account"});
        assert!(run("note CONTAINS 'offshore'", ctx.clone()).0.result);
        // The reverse direction (pattern contains variable) is not the behaviour.
        let ctx = json!({"note": "offshore"});
        assert!(!run("note CONTAINS 'offshore account'", ctx).0.result);
    }
}
