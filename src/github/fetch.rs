//! Paginated GitHub issue fetcher.
//!
//! Walks the REST issues listing (100 per page) until an empty page comes
//! back, skips pull requests, and writes one JSON file per issue. Failed
//! page requests are retried with exponential backoff up to a configured
//! budget, then the run gives up.
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::GithubConfig;
use crate::github::IssueRecord;

const PER_PAGE: usize = 100;
const USER_AGENT: &str = concat!("issue-triage/", env!("CARGO_PKG_VERSION"));

/// Raw issue object as returned by the REST listing endpoint.
///
/// Pull requests also appear in this listing; they carry a `pull_request`
/// key and must be skipped.
#[derive(Debug, Deserialize)]
pub struct RawIssue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<RawLabel>,
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawLabel {
    pub name: String,
}

impl RawIssue {
    #[must_use]
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    #[must_use]
    pub fn into_record(self) -> IssueRecord {
        IssueRecord {
            issue_num: self.number.to_string(),
            issue_title: self.title,
            issue_description: self.body.unwrap_or_default(),
            ground_truth_labels: self.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub fetched: usize,
    pub saved: usize,
    pub pull_requests: usize,
}

pub struct IssueFetcher {
    client: Client,
    cfg: GithubConfig,
    token: Option<String>,
}

impl IssueFetcher {
    pub fn new(cfg: GithubConfig, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("HTTP client build failed")?;
        Ok(Self { client, cfg, token })
    }

    fn page_url(&self, page: usize) -> String {
        format!(
            "{}/repos/{}/{}/issues?state=all&page={page}&per_page={PER_PAGE}",
            self.cfg.api_base.trim_end_matches('/'),
            self.cfg.owner,
            self.cfg.repo,
        )
    }

    /// Fetch one page of issues, retrying transient failures with
    /// exponential backoff until the retry budget is exhausted.
    fn fetch_page(&self, page: usize) -> Result<Vec<RawIssue>> {
        let url = self.page_url(page);
        let mut attempt = 0usize;

        loop {
            let mut request = self
                .client
                .get(&url)
                .header("Accept", "application/vnd.github.v3+json");
            if let Some(token) = &self.token {
                request = request.header("Authorization", format!("token {token}"));
            }

            match request.send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp
                            .json()
                            .with_context(|| format!("failed to parse issues page {page}"));
                    }

                    let body = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt + 1 < self.cfg.max_retries {
                        attempt += 1;
                        let delay = self.retry_backoff(attempt);
                        warn!(
                            "GitHub returned {status} for page {page}, retrying in {}ms (attempt {attempt}/{})",
                            delay.as_millis(),
                            self.cfg.max_retries
                        );
                        thread::sleep(delay);
                        continue;
                    }
                    bail!("GitHub API request failed ({status}) at {url}: {body}");
                }
                Err(err) => {
                    if attempt + 1 < self.cfg.max_retries {
                        attempt += 1;
                        let delay = self.retry_backoff(attempt);
                        warn!(
                            "Request error for page {page}: {err}, retrying in {}ms (attempt {attempt}/{})",
                            delay.as_millis(),
                            self.cfg.max_retries
                        );
                        thread::sleep(delay);
                        continue;
                    }
                    return Err(err).with_context(|| format!("GitHub request failed at {url}"));
                }
            }
        }
    }

    fn retry_backoff(&self, attempt: usize) -> Duration {
        let capped = attempt.min(5) as u32;
        Duration::from_millis(self.cfg.retry_delay_ms * (1 << (capped - 1)) as u64)
    }

    /// Fetch every page until an empty one is returned.
    pub fn fetch_all(&self) -> Result<Vec<RawIssue>> {
        let mut all = Vec::new();
        let mut page = 1usize;

        info!(
            "Fetching issues from {}/{}",
            self.cfg.owner, self.cfg.repo
        );

        loop {
            let issues = self.fetch_page(page)?;
            if issues.is_empty() {
                break;
            }
            all.extend(issues);

            if page % 5 == 0 {
                info!("Fetched {} issues...", all.len());
            }
            page += 1;

            // Rate-limit courtesy between pages
            thread::sleep(Duration::from_millis(self.cfg.page_delay_ms));
        }

        info!("Total issues fetched: {}", all.len());
        Ok(all)
    }

    /// Fetch all issues and persist each non-pull-request one to `out_dir`.
    pub fn run(&self, out_dir: &Path) -> Result<FetchSummary> {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create output dir: {}", out_dir.display()))?;

        let issues = self.fetch_all()?;
        let mut summary = FetchSummary {
            fetched: issues.len(),
            ..Default::default()
        };

        for (i, issue) in issues.into_iter().enumerate() {
            if issue.is_pull_request() {
                summary.pull_requests += 1;
                continue;
            }

            if i % 50 == 0 {
                info!("Processing issue {}/{}", i + 1, summary.fetched);
            }

            issue.into_record().save(out_dir)?;
            summary.saved += 1;

            thread::sleep(Duration::from_millis(self.cfg.save_delay_ms));
        }

        info!(
            "Saved {} issues ({} pull requests skipped) to {}",
            summary.saved,
            summary.pull_requests,
            out_dir.display()
        );
        Ok(summary)
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::FORBIDDEN
        || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUE_JSON: &str = r#"
    {
        "number": 1234,
        "title": "Broken thing",
        "body": "It broke.",
        "labels": [{"name": "auto:bug"}, {"name": "stale"}],
        "state": "open"
    }"#;

    const PR_JSON: &str = r#"
    {
        "number": 1235,
        "title": "Fix the broken thing",
        "body": "Patch.",
        "labels": [],
        "pull_request": {"url": "https://api.github.com/repos/x/y/pulls/1235"}
    }"#;

    #[test]
    fn test_parse_issue() {
        let issue: RawIssue = serde_json::from_str(ISSUE_JSON).unwrap();
        assert!(!issue.is_pull_request());

        let record = issue.into_record();
        assert_eq!(record.issue_num, "1234");
        assert_eq!(record.issue_title, "Broken thing");
        assert_eq!(record.issue_description, "It broke.");
        assert_eq!(record.ground_truth_labels, vec!["auto:bug", "stale"]);
    }

    #[test]
    fn test_parse_pull_request_marker() {
        let issue: RawIssue = serde_json::from_str(PR_JSON).unwrap();
        assert!(issue.is_pull_request());
    }

    #[test]
    fn test_null_body_becomes_empty() {
        let json = r#"{"number": 7, "title": "t", "body": null, "labels": []}"#;
        let issue: RawIssue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.into_record().issue_description, "");
    }

    #[test]
    fn test_page_url() {
        let fetcher = IssueFetcher::new(GithubConfig::default(), None).unwrap();
        assert_eq!(
            fetcher.page_url(3),
            "https://api.github.com/repos/langchain-ai/langchainjs/issues?state=all&page=3&per_page=100"
        );
    }

    #[test]
    fn test_retry_backoff_grows_and_caps() {
        let mut cfg = GithubConfig::default();
        cfg.retry_delay_ms = 100;
        let fetcher = IssueFetcher::new(cfg, None).unwrap();

        assert_eq!(fetcher.retry_backoff(1), Duration::from_millis(100));
        assert_eq!(fetcher.retry_backoff(2), Duration::from_millis(200));
        assert_eq!(fetcher.retry_backoff(3), Duration::from_millis(400));
        // Capped exponent
        assert_eq!(fetcher.retry_backoff(9), fetcher.retry_backoff(5));
    }

    #[test]
    fn test_should_retry_statuses() {
        assert!(should_retry(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry(StatusCode::FORBIDDEN));
        assert!(should_retry(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!should_retry(StatusCode::NOT_FOUND));
        assert!(!should_retry(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_saved_file_matches_issue_number() {
        let dir = tempfile::tempdir().unwrap();
        let issue: RawIssue = serde_json::from_str(ISSUE_JSON).unwrap();
        issue.into_record().save(dir.path()).unwrap();

        let loaded = crate::github::load_issue_dir(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].1.issue_num, "1234");
        assert!(loaded[0].0.starts_with("1234-"));
    }
}
