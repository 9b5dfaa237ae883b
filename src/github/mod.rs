//! GitHub issue acquisition: fetching, on-disk records, dev/test segregation.
pub mod fetch;
pub mod segregate;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Maximum length of the sanitized title part of an issue filename.
const MAX_TITLE_FILENAME_LEN: usize = 100;

/// One issue as persisted on disk, one JSON file per issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub issue_num: String,
    pub issue_title: String,
    pub issue_description: String,
    #[serde(default)]
    pub ground_truth_labels: Vec<String>,
}

impl IssueRecord {
    /// Filename for this record: issue number plus a sanitized,
    /// length-capped title.
    #[must_use]
    pub fn filename(&self) -> String {
        let mut title = sanitize_filename(&self.issue_title);
        title.truncate(MAX_TITLE_FILENAME_LEN);
        format!("{}-{}.json", self.issue_num, title)
    }

    /// Write the record as pretty JSON into `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(self.filename());
        let data = serde_json::to_string_pretty(self).context("failed to serialize issue")?;
        std::fs::write(&path, data)
            .with_context(|| format!("failed to write issue file: {}", path.display()))?;
        Ok(())
    }
}

/// Replace every non-alphanumeric character with `-` and lowercase the rest.
#[must_use]
pub fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Load all issue records from a directory of `*.json` files, sorted by
/// filename so downstream ordering is stable across platforms.
///
/// Fails with a descriptive error if the directory does not exist.
pub fn load_issue_dir(dir: &Path) -> Result<Vec<(String, IssueRecord)>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("issue directory not found: {}", dir.display()))?;

    let mut files: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.ends_with(".json"))
        .collect();
    files.sort();

    let mut issues = Vec::with_capacity(files.len());
    for name in files {
        let path = dir.join(&name);
        let data = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read issue file: {}", path.display()))?;
        let record: IssueRecord = serde_json::from_str(&data)
            .with_context(|| format!("invalid issue JSON: {}", path.display()))?;
        issues.push((name, record));
    }

    Ok(issues)
}
