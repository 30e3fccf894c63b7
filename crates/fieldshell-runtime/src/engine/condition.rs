//! Step condition evaluation.
//!
//! Conditions read the execution context view `{field, params, results}`
//! through a dotted path. Result keys themselves contain a dot
//! (`"emergence.detect_patterns"`), so a segment that is not a key on its
//! own is retried joined with the following segments:
//!
//! ```text
//! results.emergence.detect_patterns.emergenceDetected
//! └─────┘ └─────────────────────────┘ └───────────────┘
//!  key            joined key                key
//! ```
//!
//! An unresolvable path fails the condition. The one exception is
//! `contains`, which tests the literal text `"undefined"`.

use crate::protocol::{Condition, Operator};
use regex::Regex;
use serde_json::Value;
use tracing::warn;

/// Default threshold of the `emergence` operator.
pub const DEFAULT_EMERGENCE_THRESHOLD: f64 = 0.7;

const UNRESOLVED: &str = "undefined";

/// Resolves a dotted path against `root`.
#[must_use]
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    resolve_segments(root, &segments)
}

fn resolve_segments<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    if segments.is_empty() {
        return Some(value);
    }
    for end in 1..=segments.len() {
        let key = segments[..end].join(".");
        let next = match value {
            Value::Object(map) => map.get(&key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        if let Some(found) = next.and_then(|n| resolve_segments(n, &segments[end..])) {
            return Some(found);
        }
    }
    None
}

/// Evaluates one condition against the context view.
#[must_use]
pub fn evaluate(condition: &Condition, context: &Value) -> bool {
    let Some(actual) = resolve_path(context, &condition.field) else {
        return condition.operator == Operator::Contains
            && condition
                .value
                .as_str()
                .is_some_and(|needle| UNRESOLVED.contains(needle));
    };

    match condition.operator {
        Operator::Equals => loosely_equal(actual, &condition.value),
        Operator::Greater => compare(actual, condition).is_some_and(|(a, b)| a > b),
        Operator::Less => compare(actual, condition).is_some_and(|(a, b)| a < b),
        Operator::Contains => contains(actual, &condition.value),
        Operator::Pattern => matches_pattern(actual, &condition.value),
        Operator::Emergence => {
            let threshold = condition
                .threshold
                .or_else(|| condition.value.as_f64())
                .unwrap_or(DEFAULT_EMERGENCE_THRESHOLD);
            actual.as_f64().is_some_and(|a| a > threshold)
        }
    }
}

/// True when every condition holds. An empty list holds.
#[must_use]
pub fn evaluate_all(conditions: &[Condition], context: &Value) -> bool {
    conditions.iter().all(|c| evaluate(c, context))
}

fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
        _ => actual == expected,
    }
}

fn compare(actual: &Value, condition: &Condition) -> Option<(f64, f64)> {
    let bound = condition.value.as_f64().or(condition.threshold)?;
    Some((actual.as_f64()?, bound))
}

fn contains(actual: &Value, needle: &Value) -> bool {
    match actual {
        Value::String(text) => needle.as_str().is_some_and(|n| text.contains(n)),
        Value::Array(items) => items.iter().any(|item| loosely_equal(item, needle)),
        Value::Object(map) => needle.as_str().is_some_and(|k| map.contains_key(k)),
        _ => false,
    }
}

fn matches_pattern(actual: &Value, pattern: &Value) -> bool {
    let Some(pattern) = pattern.as_str() else {
        return false;
    };
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            warn!(pattern, error = %e, "Invalid condition pattern");
            return false;
        }
    };
    match actual {
        Value::String(text) => regex.is_match(text),
        other => regex.is_match(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> Value {
        json!({
            "field": {"coherence": 0.85, "energy": 6.0, "metadata": {"tags": ["demo", "x"]}},
            "params": {"maximize": true, "label": "alpha-7"},
            "results": {
                "emergence.detect_patterns": {"emergenceDetected": true, "score": 0.82},
                "recursive.analyze": {"confidence": 0.7}
            }
        })
    }

    fn check(path: &str, operator: Operator, value: Value) -> bool {
        evaluate(&Condition::new(path, operator, value), &context())
    }

    #[test]
    fn joins_segments_to_reach_dotted_keys() {
        let ctx = context();
        assert_eq!(
            resolve_path(&ctx, "results.emergence.detect_patterns.emergenceDetected"),
            Some(&json!(true))
        );
        assert_eq!(resolve_path(&ctx, "field.metadata.tags.1"), Some(&json!("x")));
        assert_eq!(resolve_path(&ctx, "results.emergence.missing"), None);
    }

    #[test]
    fn comparison_operators() {
        assert!(check("params.maximize", Operator::Equals, json!(true)));
        assert!(check("field.energy", Operator::Equals, json!(6)));
        assert!(check("field.coherence", Operator::Greater, json!(0.8)));
        assert!(!check("field.coherence", Operator::Less, json!(0.8)));
        assert!(check("results.recursive.analyze.confidence", Operator::Less, json!(0.9)));
        // non-numeric operands never compare
        assert!(!check("params.label", Operator::Greater, json!(1)));
    }

    #[test]
    fn contains_and_pattern() {
        assert!(check("params.label", Operator::Contains, json!("pha")));
        assert!(check("field.metadata.tags", Operator::Contains, json!("demo")));
        assert!(check("params.label", Operator::Pattern, json!("^alpha-\\d+$")));
        assert!(!check("params.label", Operator::Pattern, json!("(")));
    }

    #[test]
    fn unresolved_path_fails_except_contains_undefined() {
        assert!(!check("results.nothing.here", Operator::Equals, Value::Null));
        assert!(!check("results.nothing.here", Operator::Contains, json!("x")));
        assert!(check("results.nothing.here", Operator::Contains, json!("undefined")));
        assert!(check("results.nothing.here", Operator::Contains, json!("fine")));
    }

    #[test]
    fn emergence_threshold_fallbacks() {
        let path = "results.emergence.detect_patterns.score";
        let ctx = context();
        assert!(evaluate(
            &Condition::new(path, Operator::Emergence, Value::Null).threshold(0.8),
            &ctx
        ));
        assert!(!evaluate(&Condition::new(path, Operator::Emergence, json!(0.9)), &ctx));
        // default threshold 0.7
        assert!(evaluate(&Condition::new(path, Operator::Emergence, Value::Null), &ctx));
    }

    #[test]
    fn empty_condition_list_holds() {
        assert!(evaluate_all(&[], &Value::Null));
    }
}
