//! Edit reconciliation: raw text edits become typed values.
//!
//! Reviewers edit everything as text. Text that looks like a JSON object or
//! array is parsed; if parsing fails the text is kept as-is and the field is
//! listed in [`Reconciled::fallbacks`]. The `output` edit of a scalar output
//! is never parsed: it replaces the output verbatim.

use super::{OUTPUT_FIELD, ReviewRequest};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Typed edits ready for dispatch and recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    /// Field name to typed value, for touched fields only.
    pub values: Map<String, Value>,
    /// Fields whose text looked structured but did not parse.
    pub fallbacks: Vec<String>,
    /// New scalar output, when the output is a scalar and the reviewer edited it.
    pub replacement_output: Option<String>,
}

impl Reconciled {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn looks_structured(trimmed: &str) -> bool {
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

/// Convert a single raw edit into a typed value.
///
/// Returns the value and whether a structured parse was attempted and failed.
pub fn reconcile_value(raw: &str) -> (Value, bool) {
    let trimmed = raw.trim();
    if !looks_structured(trimmed) {
        return (Value::String(raw.to_string()), false);
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(parsed) => (parsed, false),
        Err(_) => (Value::String(raw.to_string()), true),
    }
}

/// Reconcile every raw edit of a session against its request.
pub fn reconcile(request: &ReviewRequest, edited: &BTreeMap<String, String>) -> Reconciled {
    let mut reconciled = Reconciled::default();

    let scalar = request.is_scalar();

    for (field, raw) in edited {
        if scalar && field == OUTPUT_FIELD {
            reconciled.replacement_output = Some(raw.clone());
            reconciled
                .values
                .insert(field.clone(), Value::String(raw.clone()));
            continue;
        }

        let (value, fell_back) = reconcile_value(raw);
        if fell_back {
            debug!(
                gavel_id = %request.id,
                field = %field,
                "Structured edit did not parse; keeping raw text"
            );
            reconciled.fallbacks.push(field.clone());
        }
        reconciled.values.insert(field.clone(), value);
    }

    reconciled
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn edits(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_array_text_is_parsed() {
        let req = ReviewRequest::new("p", "", json!({"summary": "x", "tags": ["a", "b"]}));
        let out = reconcile(&req, &edits(&[("tags", r#"["a","b","c"]"#)]));
        assert_eq!(out.values["tags"], json!(["a", "b", "c"]));
        assert!(out.fallbacks.is_empty());
        assert!(out.replacement_output.is_none());
    }

    #[test]
    fn test_object_text_with_whitespace_is_parsed() {
        let (value, fell_back) = reconcile_value("  {\"k\": 1}\n");
        assert_eq!(value, json!({"k": 1}));
        assert!(!fell_back);
    }

    #[test]
    fn test_malformed_structured_text_falls_back_to_raw() {
        let req = ReviewRequest::new("p", "", json!({"tags": []}));
        let out = reconcile(&req, &edits(&[("tags", "[a, b")]));
        // Not bracketed on both ends, so no parse is even attempted
        assert_eq!(out.values["tags"], json!("[a, b"));
        assert!(out.fallbacks.is_empty());

        let out = reconcile(&req, &edits(&[("tags", "[a, b]")]));
        assert_eq!(out.values["tags"], json!("[a, b]"));
        assert_eq!(out.fallbacks, vec!["tags".to_string()]);
    }

    #[test]
    fn test_plain_text_passes_through_untrimmed() {
        let (value, fell_back) = reconcile_value("  hello  ");
        assert_eq!(value, json!("  hello  "));
        assert!(!fell_back);
    }

    #[test]
    fn test_empty_edit_is_present_not_absent() {
        let req = ReviewRequest::new("p", "", json!({"summary": "x", "notes": "y"}));
        let out = reconcile(&req, &edits(&[("summary", "")]));
        assert_eq!(out.values.get("summary"), Some(&json!("")));
        assert!(!out.values.contains_key("notes"));
    }

    #[test]
    fn test_scalar_output_edit_becomes_replacement() {
        let req = ReviewRequest::new("p", "", json!("draft text"));
        let out = reconcile(&req, &edits(&[(OUTPUT_FIELD, "revised text")]));
        assert_eq!(out.values[OUTPUT_FIELD], json!("revised text"));
        assert_eq!(out.replacement_output.as_deref(), Some("revised text"));
    }

    #[test]
    fn test_scalar_replacement_is_not_parsed() {
        let req = ReviewRequest::new("p", "", json!("draft"));
        let out = reconcile(&req, &edits(&[(OUTPUT_FIELD, "[1,2]")]));
        assert_eq!(out.values[OUTPUT_FIELD], json!("[1,2]"));
        assert_eq!(out.replacement_output.as_deref(), Some("[1,2]"));

        // Malformed-looking text is a replacement too, not a fallback
        let out = reconcile(&req, &edits(&[(OUTPUT_FIELD, "{oops}")]));
        assert_eq!(out.values[OUTPUT_FIELD], json!("{oops}"));
        assert!(out.fallbacks.is_empty());
    }

    #[test]
    fn test_output_field_on_mapping_is_not_a_replacement() {
        let req = ReviewRequest::new("p", "", json!({"output": "x"}));
        let out = reconcile(&req, &edits(&[(OUTPUT_FIELD, "y")]));
        assert!(out.replacement_output.is_none());
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let req = ReviewRequest::new("p", "", json!({"a": 1}));
        let input = edits(&[("a", r#"{"nested": [1, 2, {"x": null}]}"#), ("b", "{oops}")]);
        assert_eq!(reconcile(&req, &input), reconcile(&req, &input));
    }
}
