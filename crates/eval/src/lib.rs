//! Canon rule evaluator -- executes a parsed rule against context data
//! and an injectable clock, producing a nested evidence trail.
//!
//! Evaluation is a pure function of (rule, context, clock, built-in
//! table). It never fails: problems found while evaluating a node are
//! recorded on that node as `result: false` with `error` set.

pub mod builtins;
pub mod clock;
pub mod consequence;
pub mod operators;
pub mod predicate;
pub mod provenance;
pub mod result;
pub mod rules;
pub mod temporal;
pub mod types;

use canon_core::Rule;
use serde::Serialize;
use time::OffsetDateTime;

pub use builtins::Builtins;
pub use clock::{Clock, FixedClock, SystemClock};
pub use provenance::RuleProvenance;
pub use result::{ActionRecord, Details, EvaluationResult};
pub use types::{Context, EvalError, Value};

use predicate::EvalEnv;
use provenance::ProvenanceCollector;

/// An evaluation outcome together with what it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub evaluated_at: OffsetDateTime,
    pub outcome: EvaluationResult,
    pub provenance: RuleProvenance,
}

/// Evaluator with a fixed built-in function table.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    builtins: Builtins,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins(builtins: Builtins) -> Self {
        Evaluator { builtins }
    }

    pub fn evaluate(&self, rule: &Rule, context: &Context, clock: &dyn Clock) -> EvaluationResult {
        self.evaluate_traced(rule, context, clock).outcome
    }

    pub fn evaluate_traced(&self, rule: &Rule, context: &Context, clock: &dyn Clock) -> Decision {
        // Every node of one decision sees the same instant.
        let evaluated_at = clock.now();
        let pinned = FixedClock(evaluated_at);
        let env = EvalEnv {
            context,
            clock: &pinned,
            builtins: &self.builtins,
        };
        let mut collector = ProvenanceCollector::new();
        let outcome = rules::eval_rule(rule, &env, &mut collector);
        Decision {
            rule_id: None,
            evaluated_at,
            outcome,
            provenance: collector.into_provenance(),
        }
    }

    /// Evaluate every rule independently, in input order.
    pub fn evaluate_batch(
        &self,
        rules: &[(String, Rule)],
        context: &Context,
        clock: &dyn Clock,
    ) -> Vec<Decision> {
        rules
            .iter()
            .map(|(id, rule)| Decision {
                rule_id: Some(id.clone()),
                ..self.evaluate_traced(rule, context, clock)
            })
            .collect()
    }
}

/// Evaluate a rule with the standard built-ins.
///
/// # Arguments
/// * `rule` - Parsed rule
/// * `context` - Data the rule is checked against
/// * `clock` - Source of "now" for temporal operators and `NOW`/`TODAY`
pub fn evaluate(rule: &Rule, context: &Context, clock: &dyn Clock) -> EvaluationResult {
    Evaluator::new().evaluate(rule, context, clock)
}

/// Like [`evaluate`], also returning the variables and functions used.
pub fn evaluate_traced(rule: &Rule, context: &Context, clock: &dyn Clock) -> Decision {
    Evaluator::new().evaluate_traced(rule, context, clock)
}

/// Evaluate a set of independent rules against one context.
pub fn evaluate_batch(rules: &[(String, Rule)], context: &Context, clock: &dyn Clock) -> Vec<Decision> {
    Evaluator::new().evaluate_batch(rules, context, clock)
}

// ──────────────────────────────────────────────
// Integration tests
// ──────────────────────────────────────────────
