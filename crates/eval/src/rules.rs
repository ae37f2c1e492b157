//! Rule-level evaluation.
//!
//! A rule only constrains the situations it applies to: when the
//! condition is false the rule is vacuously satisfied (`result: true`,
//! "Condition not met") and the consequence is never evaluated. When the
//! condition holds, the rule's outcome is the consequence's outcome, or
//! `true` for an action rule.

use canon_core::ast::{Rule, RuleBody};
use tracing::{debug, debug_span};

use crate::consequence::eval_consequence;
use crate::predicate::{eval_condition, EvalEnv};
use crate::provenance::ProvenanceCollector;
use crate::result::{ActionRecord, Details, EvaluationResult};

pub const CONDITION_NOT_MET: &str = "Condition not met";

pub fn eval_rule(
    rule: &Rule,
    env: &EvalEnv<'_>,
    collector: &mut ProvenanceCollector,
) -> EvaluationResult {
    let span = debug_span!("rule", rule = %rule);
    let _guard = span.enter();

    let condition = eval_condition(&rule.condition, env, collector);
    if !condition.result {
        let error = condition.first_error().map(str::to_string);
        debug!(error = ?error, "condition not met");
        return EvaluationResult::new(true, CONDITION_NOT_MET)
            .with_error(error)
            .with_details(Details::Rule {
                condition: Box::new(condition),
                consequence: None,
                action: None,
            });
    }

    match &rule.body {
        RuleBody::Consequence(cons) => {
            let outcome = eval_consequence(cons, env, collector);
            let reason = if outcome.result {
                "Condition met and consequence satisfied".to_string()
            } else {
                format!("Consequence violated: {}", cons)
            };
            debug!(result = outcome.result, "consequence evaluated");
            EvaluationResult::new(outcome.result, reason)
                .with_error(outcome.first_error().map(str::to_string))
                .with_details(Details::Rule {
                    condition: Box::new(condition),
                    consequence: Some(Box::new(outcome)),
                    action: None,
                })
        }
        RuleBody::Action(action) => {
            debug!(action = action.action_type.as_str(), "action executed");
            EvaluationResult::new(
                true,
                format!("Action executed: {}", action.action_type.as_str()),
            )
            .with_details(Details::Rule {
                condition: Box::new(condition),
                consequence: None,
                action: Some(ActionRecord {
                    action_type: action.action_type,
                    target: action.variable.to_string(),
                    label: action.label.clone(),
                }),
            })
        }
    }
}
