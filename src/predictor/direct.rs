//! Direct-variant label predictor.
//!
//! Classifies an issue against a fixed closed vocabulary without retrieval.
//! The output schema is an enum: any label outside the vocabulary fails as
//! a parse error.
use anyhow::{Context, Result};

use super::{LabelPrediction, LabelPredictor};
use crate::llm::{ChatModel, LlmError, parse_structured};

/// The closed label vocabulary.
pub const ALLOWED_LABELS: [&str; 7] = [
    "bug",
    "documentation",
    "enhancement",
    "improvement",
    "nit",
    "question",
    "refactor",
];

pub struct DirectPredictor<'a> {
    model: &'a dyn ChatModel,
}

impl<'a> DirectPredictor<'a> {
    pub fn new(model: &'a dyn ChatModel) -> Self {
        Self { model }
    }
}

impl LabelPredictor for DirectPredictor<'_> {
    fn predict_labels(&self, title: &str, description: &str) -> Result<Vec<String>> {
        let prompt = prediction_prompt(title, description);
        let response = self
            .model
            .complete(&prompt)
            .context("label prediction failed")?;
        let prediction: LabelPrediction =
            parse_structured(&response).context("label prediction output invalid")?;
        validate_labels(&prediction.labels).context("label prediction output invalid")?;
        Ok(prediction.labels)
    }
}

/// Enforce the enum schema: every label must come from [`ALLOWED_LABELS`].
fn validate_labels(labels: &[String]) -> Result<(), LlmError> {
    for label in labels {
        if !ALLOWED_LABELS.contains(&label.as_str()) {
            return Err(LlmError::ParseError(format!(
                "label {label:?} is not in the allowed set [{}]",
                ALLOWED_LABELS.join(", ")
            )));
        }
    }
    Ok(())
}

fn prediction_prompt(title: &str, description: &str) -> String {
    let allowed = ALLOWED_LABELS.join(", ");
    format!(
        r#"You are a GitHub issue classifier. You will be given an issue title and description, and you need to predict the most appropriate labels.

ALLOWED LABELS: {allowed}

You can ONLY choose from these labels. Do not create or suggest any other labels.

ISSUE TO CLASSIFY:
Title: {title}
Description: {description}

INSTRUCTIONS:
1. Analyze the title and description of the issue
2. Determine what type of issue this is based on the content
3. Select the single most appropriate label from the allowed list only
4. Consider:
   - bug: Issues reporting problems, errors, or unexpected behavior
   - documentation: Issues about docs, examples, or unclear explanations
   - enhancement: New features or significant improvements
   - improvement: Minor improvements to existing functionality
   - nit: Small style, formatting, or minor code quality issues
   - question: Questions about usage, clarification requests
   - refactor: Code restructuring without changing functionality

Return a JSON object with this exact structure (only one label):
{{
  "labels": ["label1"]
}}
"#
    )
}
