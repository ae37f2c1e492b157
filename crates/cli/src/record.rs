use canon_core::Rule;
use canon_eval::Decision;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Decision record envelope version.
const RECORD_VERSION: &str = "1.0";

/// SHA-256 of the rule's canonical text, so formatting and comments do
/// not change the digest.
pub(crate) fn rule_digest(rule: &Rule) -> String {
    let hash = Sha256::digest(rule.to_string().as_bytes());
    format!("sha256:{:x}", hash)
}

/// Wrap a decision in a record envelope.
///
/// `serde_json::Map` is backed by `BTreeMap`, so keys come out sorted.
pub(crate) fn build_record(rule: &Rule, decision: &Decision) -> Value {
    let mut map = Map::new();
    map.insert(
        "canon".to_string(),
        Value::String(RECORD_VERSION.to_string()),
    );
    map.insert("rule".to_string(), Value::String(rule.to_string()));
    map.insert("rule_digest".to_string(), Value::String(rule_digest(rule)));
    map.insert(
        "decision".to_string(),
        serde_json::to_value(decision).unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("serialization error: {}", e) })
        }),
    );
    Value::Object(map)
}
