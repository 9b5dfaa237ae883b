//! Experiment runner: evaluates a label predictor over the dev set.
//!
//! Runs the predictor once per dev-set issue, then writes a full JSON dump
//! and a flattened CSV into the results directory and reports how many
//! predictions disagree with the ground truth.
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::ProgressBar;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::github::load_issue_dir;
use crate::predictor::LabelPredictor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub issue_num: String,
    pub issue_title: String,
    pub issue_description: String,
    pub ground_truth_labels: Vec<String>,
    pub predicted_labels: Vec<String>,
}

#[derive(Debug)]
pub struct ExperimentSummary {
    pub total: usize,
    pub mismatches: usize,
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
}

/// Run the predictor over every issue in `devset_dir` and persist results.
pub fn run(
    predictor: &dyn LabelPredictor,
    devset_dir: &Path,
    results_dir: &Path,
) -> Result<ExperimentSummary> {
    let dataset = load_issue_dir(devset_dir)?;
    info!(
        "Running experiment on {} issues from {}",
        dataset.len(),
        devset_dir.display()
    );

    let bar = ProgressBar::new(dataset.len() as u64);
    let mut results = Vec::with_capacity(dataset.len());

    for (_, row) in dataset {
        let predicted_labels = predictor
            .predict_labels(&row.issue_title, &row.issue_description)
            .with_context(|| format!("prediction failed for issue #{}", row.issue_num))?;

        results.push(ExperimentResult {
            issue_num: row.issue_num,
            issue_title: row.issue_title,
            issue_description: row.issue_description,
            ground_truth_labels: row.ground_truth_labels,
            predicted_labels,
        });
        bar.inc(1);
    }
    bar.finish_and_clear();

    std::fs::create_dir_all(results_dir)
        .with_context(|| format!("failed to create {}", results_dir.display()))?;

    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ");
    let json_path = results_dir.join(format!("experiment_results_{timestamp}.json"));
    let csv_path = results_dir.join(format!("experiment_results_{timestamp}.csv"));

    write_json(&json_path, &results)?;
    write_csv(&csv_path, &results)?;

    let summary = ExperimentSummary {
        total: results.len(),
        mismatches: mismatch_count(&results),
        json_path,
        csv_path,
    };

    info!("Mismatches: {}/{}", summary.mismatches, summary.total);
    Ok(summary)
}

fn write_json(path: &Path, results: &[ExperimentResult]) -> Result<()> {
    let data = serde_json::to_string_pretty(results).context("failed to serialize results")?;
    std::fs::write(path, data)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn write_csv(path: &Path, results: &[ExperimentResult]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("failed to open {}", path.display()))?;

    writer.write_record([
        "issue_num",
        "issue_title",
        "issue_description",
        "ground_truth_labels",
        "predicted_labels",
    ])?;

    for result in results {
        writer.write_record([
            result.issue_num.clone(),
            flatten_text(&result.issue_title),
            flatten_text(&result.issue_description),
            result.ground_truth_labels.join(";"),
            result.predicted_labels.join(";"),
        ])?;
    }

    writer.flush().context("failed to flush CSV")?;
    Ok(())
}

/// Count results whose sorted predicted-label set differs from the sorted
/// ground-truth set.
#[must_use]
pub fn mismatch_count(results: &[ExperimentResult]) -> usize {
    results
        .iter()
        .filter(|r| {
            let mut predicted = r.predicted_labels.clone();
            let mut truth = r.ground_truth_labels.clone();
            predicted.sort();
            truth.sort();
            predicted != truth
        })
        .count()
}

/// Collapse escaped and literal line breaks and stray backslashes into
/// single spaces so every CSV field stays on one line.
#[must_use]
pub fn flatten_text(text: &str) -> String {
    static BREAKS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(\\r|\\n|\\|\r|\n)").unwrap());
    let replaced = BREAKS.replace_all(text, " ");
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
