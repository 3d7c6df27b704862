//! Response Envelope Normalization
//!
//! The generation service wraps its payload differently depending on the
//! request phase: a bare string, `{result: "..."}`, `{result: {...}}`, or
//! `{result: {content: "..."}}`. Everything collapses here into one
//! canonical shape before the rest of the pipeline sees it.

use serde_json::Value;

use super::types::{GenerationResult, ScriptDocument};

/// Canonical body after envelope unwrapping.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedBody {
    Text(String),
    Object(Value),
}

/// Collapse the known envelope shapes into a [`NormalizedBody`].
///
/// Unrecognized objects pass through unchanged — the service's shape varies
/// by phase and new fields must not be dropped on the floor.
pub fn normalize_envelope(value: Value) -> NormalizedBody {
    match value {
        Value::String(text) => NormalizedBody::Text(text),
        Value::Object(ref map) => match map.get("result") {
            Some(Value::String(text)) => NormalizedBody::Text(text.clone()),
            Some(Value::Object(inner)) => match inner.get("content") {
                Some(Value::String(content)) => NormalizedBody::Text(content.clone()),
                _ => NormalizedBody::Object(Value::Object(inner.clone())),
            },
            _ => NormalizedBody::Object(value),
        },
        other => NormalizedBody::Object(other),
    }
}

/// Normalize a raw accumulated body: parse as JSON when possible, otherwise
/// treat it as plain text.
pub fn normalize_text(body: &str) -> NormalizedBody {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => normalize_envelope(value),
        Err(_) => NormalizedBody::Text(body.to_string()),
    }
}

impl From<NormalizedBody> for GenerationResult {
    fn from(body: NormalizedBody) -> Self {
        match body {
            NormalizedBody::Text(text) => GenerationResult::Plain(text),
            NormalizedBody::Object(value) => {
                match serde_json::from_value::<ScriptDocument>(value.clone()) {
                    Ok(doc) => GenerationResult::Script(doc),
                    Err(e) => {
                        log::debug!("Result object is not a script document ({e}); passing through");
                        GenerationResult::Raw(value)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_string_passes_through() {
        let body = normalize_envelope(json!("already text"));
        assert_eq!(body, NormalizedBody::Text("already text".to_string()));
    }

    #[test]
    fn test_string_result_field_unwrapped() {
        let body = normalize_envelope(json!({"result": "x"}));
        assert_eq!(body, NormalizedBody::Text("x".to_string()));
    }

    #[test]
    fn test_object_result_field_unwrapped() {
        let body = normalize_envelope(json!({"result": {"script": "y"}}));
        assert_eq!(body, NormalizedBody::Object(json!({"script": "y"})));
    }

    #[test]
    fn test_result_content_string_unwrapped() {
        let body = normalize_envelope(json!({"result": {"content": "z"}}));
        assert_eq!(body, NormalizedBody::Text("z".to_string()));
    }

    #[test]
    fn test_unrecognized_object_passes_through() {
        let raw = json!({"choices": [{"text": "a"}]});
        let body = normalize_envelope(raw.clone());
        assert_eq!(body, NormalizedBody::Object(raw));
    }

    #[test]
    fn test_normalize_text_parses_json_first() {
        let body = normalize_text(r#"{"result": "from json"}"#);
        assert_eq!(body, NormalizedBody::Text("from json".to_string()));

        let body = normalize_text("not json at all");
        assert_eq!(body, NormalizedBody::Text("not json at all".to_string()));
    }

    #[test]
    fn test_into_generation_result() {
        let result: GenerationResult = normalize_text("plain script").into();
        assert_eq!(result.script_text(), Some("plain script"));

        let result: GenerationResult =
            normalize_envelope(json!({"result": {"script": "structured"}})).into();
        match result {
            GenerationResult::Script(doc) => assert_eq!(doc.script.as_deref(), Some("structured")),
            other => panic!("expected structured script, got {other:?}"),
        }
    }
}
