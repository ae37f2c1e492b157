//! Consequence evaluator (the MUST clause).
//!
//! Shares leaf machinery with the condition evaluator; consequence
//! boolean expressions are likewise evaluated without short-circuit.

use canon_core::ast::{BooleanExpression, Consequence, LogicalOp, RequirementKeyword};

use crate::operators;
use crate::predicate::{combine, failure, negate, resolve_all, resolve_operand, settle, EvalEnv};
use crate::provenance::ProvenanceCollector;
use crate::result::{Details, EvaluationResult};
use crate::types::EvalError;

pub fn eval_consequence(
    cons: &Consequence,
    env: &EvalEnv<'_>,
    collector: &mut ProvenanceCollector,
) -> EvaluationResult {
    match eval_node(cons, env, collector) {
        Ok(r) => r,
        Err(e) => failure(cons, &e),
    }
}

fn eval_node(
    cons: &Consequence,
    env: &EvalEnv<'_>,
    collector: &mut ProvenanceCollector,
) -> Result<EvaluationResult, EvalError> {
    match cons {
        Consequence::Constraint {
            variable,
            operator,
            value,
        } => {
            let l = resolve_operand(variable, env, collector)?;
            let r = resolve_operand(value, env, collector)?;
            let outcome = operators::compare(&l, *operator, &r);
            Ok(settle(
                cons,
                outcome,
                Details::Comparison {
                    left: l,
                    operator: *operator,
                    right: r,
                },
            ))
        }

        Consequence::InConstraint { variable, values }
        | Consequence::NotInConstraint { variable, values } => {
            let negated = matches!(cons, Consequence::NotInConstraint { .. });
            let v = resolve_operand(variable, env, collector)?;
            let set = resolve_all(values, env, collector)?;
            let member = operators::is_member(&v, &set);
            Ok(settle(
                cons,
                Ok(member != negated),
                Details::Membership {
                    value: v,
                    negated,
                    values: set,
                },
            ))
        }

        Consequence::BetweenConstraint {
            variable,
            lower,
            upper,
        } => {
            let v = resolve_operand(variable, env, collector)?;
            let lo = resolve_operand(lower, env, collector)?;
            let hi = resolve_operand(upper, env, collector)?;
            let outcome = operators::between(&v, &lo, &hi);
            Ok(settle(
                cons,
                outcome,
                Details::Range {
                    value: v,
                    lower: lo,
                    upper: hi,
                },
            ))
        }

        Consequence::Requirement { variable, keyword } => {
            let v = resolve_operand(variable, env, collector)?;
            let present = !v.is_null();
            let (result, reason) = match (keyword, present) {
                (_, true) => (true, format!("{} is present", variable)),
                (RequirementKeyword::Must, false) => {
                    (false, format!("{} is required but missing", variable))
                }
                (RequirementKeyword::Should, false) => (
                    true,
                    format!("{} is recommended but missing (advisory)", variable),
                ),
            };
            Ok(EvaluationResult::new(result, reason).with_details(Details::Requirement {
                variable: variable.to_string(),
                keyword: *keyword,
                value: v,
            }))
        }

        Consequence::BooleanExpression { expression } => Ok(match expression {
            BooleanExpression::And { left, right } => {
                let l = eval_consequence(left, env, collector);
                let r = eval_consequence(right, env, collector);
                combine(cons, LogicalOp::And, l, r)
            }
            BooleanExpression::Or { left, right } => {
                let l = eval_consequence(left, env, collector);
                let r = eval_consequence(right, env, collector);
                combine(cons, LogicalOp::Or, l, r)
            }
            BooleanExpression::Not { inner } => {
                let r = eval_consequence(inner, env, collector);
                negate(cons, r)
            }
        }),

        Consequence::BooleanLiteral { value } => Ok(settle(
            cons,
            Ok(*value),
            Details::Literal { value: *value },
        )),

        Consequence::VariableExpression { variable } => {
            let v = resolve_operand(variable, env, collector)?;
            let outcome = Ok(v.is_truthy());
            Ok(settle(
                cons,
                outcome,
                Details::Truthiness {
                    operand: variable.to_string(),
                    value: v,
                },
            ))
        }
    }
}
