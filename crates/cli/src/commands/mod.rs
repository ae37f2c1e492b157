pub(crate) mod batch;
pub(crate) mod check;
pub(crate) mod eval;
pub(crate) mod parse;

use std::path::Path;

use canon_core::Rule;
use canon_eval::{Context, Details, EvaluationResult};

use crate::error::CliError;

pub(crate) fn read_text(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_rule(path: &Path) -> Result<Rule, CliError> {
    let src = read_text(path)?;
    canon_core::parse(&src).map_err(|err| CliError::Parse {
        path: path.to_path_buf(),
        err,
    })
}

pub(crate) fn read_context(path: &Path) -> Result<Context, CliError> {
    let src = read_text(path)?;
    let doc: serde_json::Value = serde_json::from_str(&src).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Context::from_json(&doc).map_err(|source| CliError::Context {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn print_json(value: &serde_json::Value) {
    let pretty = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
    println!("{}", pretty);
}

/// Render an evidence trail as an indented tree, one node per line.
pub(crate) fn render_tree(result: &EvaluationResult) -> String {
    let mut out = String::new();
    render_node(result, 0, &mut out);
    out
}

fn render_node(r: &EvaluationResult, depth: usize, out: &mut String) {
    let mark = if r.result { "pass" } else { "FAIL" };
    let reason = r.reason.as_deref().unwrap_or("");
    out.push_str(&format!("{}[{}] {}\n", "  ".repeat(depth), mark, reason));
    match &r.details {
        Some(Details::Rule {
            condition,
            consequence,
            action,
        }) => {
            render_node(condition, depth + 1, out);
            if let Some(c) = consequence {
                render_node(c, depth + 1, out);
            }
            if let Some(a) = action {
                out.push_str(&format!(
                    "{}-> {} {} {}\n",
                    "  ".repeat(depth + 1),
                    a.action_type.as_str(),
                    a.target,
                    a.label
                ));
            }
        }
        Some(Details::Logical { left, right, .. }) => {
            render_node(left, depth + 1, out);
            render_node(right, depth + 1, out);
        }
        Some(Details::Negation { inner }) => render_node(inner, depth + 1, out),
        _ => {}
    }
}
