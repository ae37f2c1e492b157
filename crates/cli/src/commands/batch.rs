use std::path::Path;

use canon_core::Rule;
use serde_json::Value;

use crate::commands::{print_json, read_context, render_tree};
use crate::config::RuleSet;
use crate::error::CliError;
use crate::record::build_record;
use crate::{OutputFormat, Settings};

/// Evaluate every rule in a rule set against one context.
///
/// Rules that fail to parse are reported individually; the rest are
/// still evaluated. Any parse failure makes the command fail overall.
pub(crate) fn cmd_batch(rules: &Path, context: &Path, settings: &Settings) -> Result<(), CliError> {
    let clock = settings.clock()?;
    let set = RuleSet::load(rules)?;
    let ctx = read_context(context)?;
    let total = set.rules.len();

    let mut parsed: Vec<(String, Rule)> = Vec::new();
    let mut failures: Vec<Value> = Vec::new();
    for entry in set.rules {
        match canon_core::parse(&entry.text) {
            Ok(rule) => parsed.push((entry.id, rule)),
            Err(err) => {
                tracing::warn!(id = %entry.id, error = %err, "rule failed to parse");
                let mut v = err.to_json_value();
                if let Some(obj) = v.as_object_mut() {
                    obj.insert("id".to_string(), Value::String(entry.id));
                }
                failures.push(v);
            }
        }
    }

    let decisions = canon_eval::evaluate_batch(&parsed, &ctx, clock.as_ref());
    let passed = decisions.iter().filter(|d| d.outcome.result).count();

    match settings.output {
        OutputFormat::Json => {
            let records: Vec<Value> = parsed
                .iter()
                .zip(&decisions)
                .map(|((_, rule), decision)| build_record(rule, decision))
                .collect();
            print_json(&serde_json::json!({
                "records": records,
                "parse_errors": failures,
                "summary": {
                    "total": total,
                    "passed": passed,
                    "failed": decisions.len() - passed,
                    "unparsed": failures.len(),
                },
            }));
        }
        OutputFormat::Text => {
            for decision in &decisions {
                let verdict = if decision.outcome.result { "PASS" } else { "FAIL" };
                let id = decision.rule_id.as_deref().unwrap_or("?");
                println!("{} {}", verdict, id);
                if !settings.quiet && !decision.outcome.result {
                    for line in render_tree(&decision.outcome).lines() {
                        println!("    {}", line);
                    }
                }
            }
            for f in &failures {
                let id = f.get("id").and_then(Value::as_str).unwrap_or("?");
                let msg = f.get("message").and_then(Value::as_str).unwrap_or("");
                println!("ERROR {}: {}", id, msg);
            }
            if !settings.quiet {
                println!(
                    "\n{} rules: {} passed, {} failed, {} unparsed",
                    total,
                    passed,
                    decisions.len() - passed,
                    failures.len()
                );
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(CliError::BatchParse {
            failed: failures.len(),
            total,
        })
    }
}
