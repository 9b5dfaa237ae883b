//! Label prediction for new issues.
//!
//! Two variants: [`retrieval::RetrievalPredictor`] classifies by analogy to
//! similar indexed issues, [`direct::DirectPredictor`] classifies against a
//! fixed closed label set without retrieval.
pub mod direct;
pub mod retrieval;

use anyhow::Result;
use serde::Deserialize;

/// Output schema required from the chat model.
#[derive(Debug, Deserialize)]
pub struct LabelPrediction {
    pub labels: Vec<String>,
}

/// Common seam over both predictor variants; the experiment runner only
/// needs predicted labels.
pub trait LabelPredictor {
    fn predict_labels(&self, title: &str, description: &str) -> Result<Vec<String>>;
}
