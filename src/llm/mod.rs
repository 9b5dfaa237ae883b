/// Chat model trait and structured-output helpers.
///
/// The pipeline treats language models as a text-completion capability with
/// a required output schema: the completion must contain a JSON object that
/// deserializes into the requested type, otherwise the call fails with
/// [`LlmError::ParseError`] regardless of provider.
pub mod mock;
pub mod openai;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur when invoking a chat model.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("chat request failed: {0}")]
    RequestFailed(String),

    #[error("structured output did not conform: {0}")]
    ParseError(String),
}

/// Trait for chat model implementations.
pub trait ChatModel: Send + Sync {
    /// Run a single-prompt completion and return the raw response text.
    fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Extract a JSON object from a completion and deserialize it.
///
/// Models occasionally wrap the object in prose or a markdown fence, so the
/// text between the first `{` and the last `}` is what gets parsed.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    let start = raw
        .find('{')
        .ok_or_else(|| LlmError::ParseError(format!("no JSON object in response: {raw:?}")))?;
    let end = raw
        .rfind('}')
        .ok_or_else(|| LlmError::ParseError(format!("unterminated JSON object: {raw:?}")))?;
    if end < start {
        return Err(LlmError::ParseError(format!(
            "malformed JSON object: {raw:?}"
        )));
    }

    serde_json::from_str(&raw[start..=end])
        .map_err(|e| LlmError::ParseError(format!("{e}; raw: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Prediction {
        labels: Vec<String>,
    }

    #[test]
    fn test_parse_clean_object() {
        let parsed: Prediction = parse_structured(r#"{"labels": ["bug"]}"#).unwrap();
        assert_eq!(parsed.labels, vec!["bug"]);
    }

    #[test]
    fn test_parse_object_embedded_in_text() {
        let raw = "Here you go:\n{\"labels\": [\"bug\", \"question\"]}\nHope that helps!";
        let parsed: Prediction = parse_structured(raw).unwrap();
        assert_eq!(parsed.labels, vec!["bug", "question"]);
    }

    #[test]
    fn test_parse_object_in_markdown_fence() {
        let raw = "```json\n{\"labels\": [\"enhancement\"]}\n```";
        let parsed: Prediction = parse_structured(raw).unwrap();
        assert_eq!(parsed.labels, vec!["enhancement"]);
    }

    #[test]
    fn test_parse_empty_labels() {
        let parsed: Prediction = parse_structured(r#"{"labels": []}"#).unwrap();
        assert!(parsed.labels.is_empty());
    }

    #[test]
    fn test_parse_no_object_is_parse_error() {
        let err = parse_structured::<Prediction>("I cannot classify this.").unwrap_err();
        assert!(matches!(err, LlmError::ParseError(_)));
    }

    #[test]
    fn test_parse_wrong_shape_is_parse_error() {
        let err = parse_structured::<Prediction>(r#"{"tags": ["bug"]}"#).unwrap_err();
        assert!(matches!(err, LlmError::ParseError(_)));
    }

    #[test]
    fn test_parse_truncated_object_is_parse_error() {
        let err = parse_structured::<Prediction>(r#"{"labels": ["bug""#).unwrap_err();
        assert!(matches!(err, LlmError::ParseError(_)));
    }
}
