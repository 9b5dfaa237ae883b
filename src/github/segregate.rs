//! Partitions stored issues into dev/test halves.
//!
//! Keeps only issues with at least one label under the configured namespace
//! prefix, strips that prefix, and splits the filtered set at the midpoint.
//! Both output directories are recreated fresh on every run.
use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::github::{IssueRecord, load_issue_dir};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SegregateSummary {
    pub total: usize,
    pub filtered: usize,
    pub devset: usize,
    pub testset: usize,
    /// Sorted distinct stripped label values, for operator reference.
    pub labels: Vec<String>,
}

/// Keep the labels carrying `prefix`, stripped of it. Empty result means the
/// issue is excluded from both halves.
fn strip_prefixed_labels(record: &IssueRecord, prefix: &str) -> Vec<String> {
    record
        .ground_truth_labels
        .iter()
        .filter(|l| l.starts_with(prefix))
        .map(|l| l[prefix.len()..].to_string())
        .collect()
}

pub fn segregate(
    issues_dir: &Path,
    devset_dir: &Path,
    testset_dir: &Path,
    prefix: &str,
) -> Result<SegregateSummary> {
    info!("Starting issue segregation...");

    // Recreate output directories fresh
    for dir in [devset_dir, testset_dir] {
        if dir.exists() {
            std::fs::remove_dir_all(dir)
                .with_context(|| format!("failed to clear {}", dir.display()))?;
        }
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let issues = load_issue_dir(issues_dir)?;
    info!("Found {} total issue files", issues.len());

    let mut all_labels = BTreeSet::new();
    let mut filtered: Vec<(String, IssueRecord)> = Vec::new();

    for (filename, record) in &issues {
        let stripped = strip_prefixed_labels(record, prefix);
        if stripped.is_empty() {
            continue;
        }
        all_labels.extend(stripped.iter().cloned());

        let mut kept = record.clone();
        kept.ground_truth_labels = stripped;
        filtered.push((filename.clone(), kept));
    }

    info!(
        "Filtered {} issues with {prefix} labels",
        filtered.len()
    );

    let midpoint = filtered.len() / 2;
    let summary = SegregateSummary {
        total: issues.len(),
        filtered: filtered.len(),
        devset: midpoint,
        testset: filtered.len() - midpoint,
        labels: all_labels.into_iter().collect(),
    };

    for (i, (filename, record)) in filtered.iter().enumerate() {
        let dir = if i < midpoint { devset_dir } else { testset_dir };
        let data = serde_json::to_string_pretty(record).context("failed to serialize issue")?;
        std::fs::write(dir.join(filename), data)
            .with_context(|| format!("failed to write {filename}"))?;
    }

    info!("Segregation complete:");
    info!("   Devset: {} issues", summary.devset);
    info!("   Testset: {} issues", summary.testset);
    info!("Distinct labels: {}", summary.labels.join(", "));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_issue(dir: &Path, num: u32, labels: &[&str]) {
        let record = IssueRecord {
            issue_num: num.to_string(),
            issue_title: format!("issue {num}"),
            issue_description: "desc".to_string(),
            ground_truth_labels: labels.iter().map(|s| s.to_string()).collect(),
        };
        record.save(dir).unwrap();
    }

    #[test]
    fn test_strip_prefixed_labels() {
        let record = IssueRecord {
            issue_num: "1".to_string(),
            issue_title: "t".to_string(),
            issue_description: "d".to_string(),
            ground_truth_labels: vec![
                "auto:bug".to_string(),
                "stale".to_string(),
                "auto:question".to_string(),
            ],
        };
        assert_eq!(
            strip_prefixed_labels(&record, "auto:"),
            vec!["bug", "question"]
        );
    }

    #[test]
    fn test_partition_properties() {
        let root = tempfile::tempdir().unwrap();
        let issues = root.path().join("issues");
        let devset = root.path().join("devset");
        let testset = root.path().join("testset");
        std::fs::create_dir_all(&issues).unwrap();

        // 5 issues with prefixed labels, 2 without
        write_issue(&issues, 1, &["auto:bug"]);
        write_issue(&issues, 2, &["auto:question", "extra"]);
        write_issue(&issues, 3, &["auto:enhancement"]);
        write_issue(&issues, 4, &["auto:bug", "auto:question"]);
        write_issue(&issues, 5, &["auto:documentation"]);
        write_issue(&issues, 6, &["unrelated"]);
        write_issue(&issues, 7, &[]);

        let summary = segregate(&issues, &devset, &testset, "auto:").unwrap();

        assert_eq!(summary.total, 7);
        assert_eq!(summary.filtered, 5);
        // Split at floor(5 / 2) = 2
        assert_eq!(summary.devset, 2);
        assert_eq!(summary.testset, 3);

        let dev = load_issue_dir(&devset).unwrap();
        let test = load_issue_dir(&testset).unwrap();
        assert_eq!(dev.len() + test.len(), summary.filtered);

        // Disjoint by issue number
        let dev_nums: Vec<_> = dev.iter().map(|(_, r)| r.issue_num.clone()).collect();
        for (_, r) in &test {
            assert!(!dev_nums.contains(&r.issue_num));
        }

        // Every kept label is stripped; no issue without prefixed labels survives
        for (_, r) in dev.iter().chain(test.iter()) {
            assert!(!r.ground_truth_labels.is_empty());
            for label in &r.ground_truth_labels {
                assert!(!label.starts_with("auto:"));
            }
            assert_ne!(r.issue_num, "6");
            assert_ne!(r.issue_num, "7");
        }

        // Non-prefixed labels are discarded even on kept issues
        let two = dev
            .iter()
            .chain(test.iter())
            .find(|(_, r)| r.issue_num == "2")
            .unwrap();
        assert_eq!(two.1.ground_truth_labels, vec!["question"]);

        assert_eq!(
            summary.labels,
            vec!["bug", "documentation", "enhancement", "question"]
        );
    }

    #[test]
    fn test_rerun_replaces_prior_outputs() {
        let root = tempfile::tempdir().unwrap();
        let issues = root.path().join("issues");
        let devset = root.path().join("devset");
        let testset = root.path().join("testset");
        std::fs::create_dir_all(&issues).unwrap();

        write_issue(&issues, 1, &["auto:bug"]);
        write_issue(&issues, 2, &["auto:bug"]);

        segregate(&issues, &devset, &testset, "auto:").unwrap();

        // Plant a stale file; a rerun must remove it
        std::fs::write(devset.join("stale.json"), "{}").unwrap();
        segregate(&issues, &devset, &testset, "auto:").unwrap();
        assert!(!devset.join("stale.json").exists());
    }

    #[test]
    fn test_missing_issues_dir_fails() {
        let root = tempfile::tempdir().unwrap();
        let err = segregate(
            &root.path().join("nope"),
            &root.path().join("devset"),
            &root.path().join("testset"),
            "auto:",
        )
        .unwrap_err();
        assert!(err.to_string().contains("issue directory not found"));
    }
}
