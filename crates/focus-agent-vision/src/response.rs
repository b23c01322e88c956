//! Model response parsing.

use focus_agent_core::{AnalysisResult, FocusState};
use serde_json::{Map, Value};

/// A reply that is valid JSON but not an object.
#[derive(Debug, thiserror::Error)]
#[error("model reply is a JSON {kind}, expected an object")]
pub struct ResponseError {
    kind: &'static str,
}

const UNPARSEABLE: &str = "Unable to parse model response.";
const NO_SUMMARY: &str = "No summary provided.";

/// Turn the model's message content into an analysis result.
///
/// Content that is not JSON, even after extracting the outermost `{...}`
/// span, degrades to `off_task` with the raw text as summary.
///
/// # Errors
/// Returns error if the content is JSON but not an object.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, ResponseError> {
    let Some(parsed) = parse_object(raw)? else {
        let summary = match raw.trim() {
            "" => UNPARSEABLE,
            s => s,
        };
        return Ok(AnalysisResult::new(summary, FocusState::OffTask));
    };

    let alignment = parsed.get("alignment").map(text).unwrap_or_default();
    let state = if alignment.trim().eq_ignore_ascii_case("on_task") {
        FocusState::OnTask
    } else {
        FocusState::OffTask
    };

    let summary = parsed
        .get("summary")
        .filter(|v| !v.is_null())
        .map(text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NO_SUMMARY.to_string());

    Ok(AnalysisResult::new(summary, state))
}

/// `Ok(None)` means the content is not JSON at all.
fn parse_object(raw: &str) -> Result<Option<Map<String, Value>>, ResponseError> {
    let content = raw.trim();
    if content.is_empty() {
        return Ok(Some(Map::new()));
    }

    let Some(value) = serde_json::from_str::<Value>(content)
        .ok()
        .or_else(|| embedded_object(content))
    else {
        return Ok(None);
    };

    let kind = match value {
        Value::Object(map) => return Ok(Some(map)),
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
    };
    Err(ResponseError { kind })
}

fn embedded_object(content: &str) -> Option<Value> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&content[start..=end]).ok()
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let result =
            parse_analysis(r#"{"summary": "Editing slides.", "alignment": "on_task"}"#).unwrap();
        assert_eq!(result, AnalysisResult::new("Editing slides.", FocusState::OnTask));
    }

    #[test]
    fn test_json_inside_prose() {
        let raw = "Sure! Here you go:\n```json\n{\"summary\": \"Watching a stream.\", \"alignment\": \"off_task\"}\n```";
        let result = parse_analysis(raw).unwrap();
        assert_eq!(result.state, FocusState::OffTask);
        assert_eq!(result.summary, "Watching a stream.");
    }

    #[test]
    fn test_alignment_is_case_folded() {
        let result = parse_analysis(r#"{"summary": "x", "alignment": "  ON_TASK "}"#).unwrap();
        assert_eq!(result.state, FocusState::OnTask);
    }

    #[test]
    fn test_unknown_alignment_is_off_task() {
        let result = parse_analysis(r#"{"summary": "x", "alignment": "unsure"}"#).unwrap();
        assert_eq!(result.state, FocusState::OffTask);

        let result = parse_analysis(r#"{"summary": "x"}"#).unwrap();
        assert_eq!(result.state, FocusState::OffTask);
    }

    #[test]
    fn test_missing_summary() {
        let result = parse_analysis(r#"{"summary": "   ", "alignment": "on_task"}"#).unwrap();
        assert_eq!(result.summary, "No summary provided.");
    }

    #[test]
    fn test_empty_content() {
        let result = parse_analysis("  ").unwrap();
        assert_eq!(result, AnalysisResult::new("No summary provided.", FocusState::OffTask));
    }

    #[test]
    fn test_null_summary_is_missing() {
        let result = parse_analysis(r#"{"summary": null, "alignment": "on_task"}"#).unwrap();
        assert_eq!(result, AnalysisResult::new("No summary provided.", FocusState::OnTask));
    }

    #[test]
    fn test_non_object_json_is_rejected() {
        for raw in ["[1, 2]", "\"hello\"", "42", "true", "null"] {
            assert!(parse_analysis(raw).is_err(), "{raw} should be rejected");
        }
        assert_eq!(
            parse_analysis("[1, 2]").unwrap_err().to_string(),
            "model reply is a JSON array, expected an object"
        );
    }

    #[test]
    fn test_unparseable_content_degrades() {
        let result = parse_analysis("The user is coding.").unwrap();
        assert_eq!(result, AnalysisResult::new("The user is coding.", FocusState::OffTask));

        let result = parse_analysis("{broken json}").unwrap();
        assert_eq!(result.summary, "{broken json}");
        assert_eq!(result.state, FocusState::OffTask);
    }
}
