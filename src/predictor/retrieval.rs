//! Retrieval-variant label predictor.
//!
//! Retrieves the most similar indexed issues and asks the model to pick
//! labels from their ground-truth labels. Which of the retrieved examples'
//! labels come back is left to the model; this is a best-effort heuristic,
//! not a deterministic mapping.
use anyhow::{Context, Result};
use tracing::info;

use super::{LabelPrediction, LabelPredictor};
use crate::db::Db;
use crate::embedder::Embedder;
use crate::llm::{ChatModel, parse_structured};
use crate::search::{LabeledNeighbor, SimilaritySearch};

#[derive(Debug, Default)]
pub struct RetrievalPrediction {
    pub predicted_labels: Vec<String>,
    pub similar_issues: Vec<LabeledNeighbor>,
}

pub struct RetrievalPredictor<'a, E: Embedder + ?Sized> {
    search: SimilaritySearch<'a, E>,
    model: &'a dyn ChatModel,
    top_k: usize,
}

impl<'a, E: Embedder + ?Sized> RetrievalPredictor<'a, E> {
    pub fn new(db: &'a Db, embedder: &'a E, model: &'a dyn ChatModel, top_k: usize) -> Self {
        Self {
            search: SimilaritySearch::new(db, embedder),
            model,
            top_k,
        }
    }

    /// Predict labels for a new issue by analogy to indexed issues.
    ///
    /// With no similar issues retrieved, the prediction is empty and the
    /// model is not invoked.
    pub fn predict(&self, title: &str, description: &str) -> Result<RetrievalPrediction> {
        let similar_issues = self
            .search
            .find_similar_issues_for_labeling(title, description, self.top_k)?;

        if similar_issues.is_empty() {
            info!("No similar issues found");
            return Ok(RetrievalPrediction::default());
        }

        info!(
            "Found {} similar issues for label prediction",
            similar_issues.len()
        );

        let prompt = prediction_prompt(&format_similar_issues(&similar_issues), title, description);
        let response = self
            .model
            .complete(&prompt)
            .context("label prediction failed")?;
        let prediction: LabelPrediction =
            parse_structured(&response).context("label prediction output invalid")?;

        info!("Predicted labels: {}", prediction.labels.join(", "));

        Ok(RetrievalPrediction {
            predicted_labels: prediction.labels,
            similar_issues,
        })
    }
}

impl<E: Embedder + ?Sized> LabelPredictor for RetrievalPredictor<'_, E> {
    fn predict_labels(&self, title: &str, description: &str) -> Result<Vec<String>> {
        Ok(self.predict(title, description)?.predicted_labels)
    }
}

/// Numbered example blocks, one per retrieved issue.
fn format_similar_issues(issues: &[LabeledNeighbor]) -> String {
    issues
        .iter()
        .enumerate()
        .map(|(i, issue)| {
            format!(
                "{}. Issue #{} (Vector Similarity Score: {:.3})\n   Title: \"{}\"\n   Ground Truth Labels: [{}]\n   Full Content: \"{}\"\n\n",
                i + 1,
                issue.issue_num,
                issue.similarity_score,
                issue.issue_title,
                issue.ground_truth_labels.join(", "),
                issue.content,
            )
        })
        .collect()
}

fn prediction_prompt(similar_issues: &str, title: &str, description: &str) -> String {
    format!(
        r#"You are a GitHub issue classifier. You will be given a new issue and a list of similar issues with their ground truth labels.

Your task is to analyze the new issue and predict appropriate labels based on patterns from similar issues.

SIMILAR ISSUES WITH GROUND TRUTH LABELS:
{similar_issues}

NEW ISSUE TO CLASSIFY:
Title: {title}
Description: {description}

LABEL ASSIGNMENT GUIDELINES:
1. **Prioritize single labels** - Most issues need only one primary label
2. **Use multiple labels only when necessary** - Only when the issue clearly spans multiple categories

MULTIPLE LABEL SCENARIOS:
- **bug + question**: Bug reports where user also asks for help/clarification
- **improvement + question**: Improvement requests seeking guidance
- **bug + improvement**: Bug reports that also suggest fixes
- **enhancement + question**: Feature requests seeking input
- **documentation + question**: Documentation issues seeking clarification

DECISION PROCESS:
1. Find the most similar issue(s) based on title and description content
2. Determine if this is a clear single-category issue or a complex multi-category issue
3. For complex issues, check if they match known multiple label patterns
4. Return the exact ground truth labels from the most similar issue(s)
5. Do NOT create new labels - only return existing ground truth labels

Return a JSON object with this exact structure:
{{
  "labels": ["exact_ground_truth_label1", "exact_ground_truth_label2"]
}}
"#
    )
}
