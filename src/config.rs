/// Configuration module for issue-triage.
///
/// Handles loading, validating, and providing default configuration values.
/// Secrets (API tokens) are never stored in the config file; they come from
/// the environment.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Environment variables ────────────────────────────────────────────

/// GitHub API token for the issue source (optional, raises rate limits).
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// API key for the embedding and chat providers.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Overrides `db_path` from the config file.
pub const ENV_DB_PATH: &str = "ISSUE_TRIAGE_DB";

// ── Default value functions ──────────────────────────────────────────

fn default_owner() -> String {
    "langchain-ai".to_string()
}

fn default_repo() -> String {
    "langchainjs".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_page_delay_ms() -> u64 {
    5_000
}

fn default_save_delay_ms() -> u64 {
    100
}

fn default_max_retries() -> usize {
    5
}

fn default_retry_delay_ms() -> u64 {
    10_000
}

fn default_issues_dir() -> String {
    "./gh-issues".to_string()
}

fn default_devset_dir() -> String {
    "./devset".to_string()
}

fn default_testset_dir() -> String {
    "./testset".to_string()
}

fn default_results_dir() -> String {
    "./results".to_string()
}

fn default_db_path() -> String {
    "./issues.db".to_string()
}

fn default_chunk_size() -> usize {
    600
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_batch_size() -> usize {
    100
}

fn default_search_top_k() -> usize {
    5
}

fn default_label_prefix() -> String {
    "auto:".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimensions() -> usize {
    1536
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.0
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default = "default_issues_dir")]
    pub issues_dir: String,

    #[serde(default = "default_devset_dir")]
    pub devset_dir: String,

    #[serde(default = "default_testset_dir")]
    pub testset_dir: String,

    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    /// Namespace prefix marking ground-truth labels (an external data
    /// contract on the issue tracker, not business logic).
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GithubConfig {
    #[serde(default = "default_owner")]
    pub owner: String,

    #[serde(default = "default_repo")]
    pub repo: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Courtesy pause between successful page requests.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Courtesy pause between issue file writes.
    #[serde(default = "default_save_delay_ms")]
    pub save_delay_ms: u64,

    /// Retry budget per page before the fetch run gives up.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Base delay for exponential backoff between retries.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GithubConfig::default(),
            issues_dir: default_issues_dir(),
            devset_dir: default_devset_dir(),
            testset_dir: default_testset_dir(),
            results_dir: default_results_dir(),
            db_path: default_db_path(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            batch_size: default_batch_size(),
            search_top_k: default_search_top_k(),
            label_prefix: default_label_prefix(),
            embedding: EmbeddingConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            api_base: default_api_base(),
            page_delay_ms: default_page_delay_ms(),
            save_delay_ms: default_save_delay_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_chat_model(),
            temperature: default_temperature(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and optionally
    /// generates a template file. The `ISSUE_TRIAGE_DB` environment variable
    /// overrides `db_path` either way.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        let mut cfg = if Path::new(path).exists() {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {path}"))?;

            match serde_json::from_str::<Config>(&data) {
                Ok(c) => {
                    info!("Loaded configuration from {path}");
                    c
                }
                Err(e) => {
                    warn!("Invalid JSON in {path}: {e}");
                    warn!("Using default configuration");
                    Self::default()
                }
            }
        } else {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            // Generate template only for the default path
            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            cfg
        };

        if let Ok(db_path) = std::env::var(ENV_DB_PATH) {
            cfg.db_path = db_path;
        }

        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.chunk_size > 0, "chunk_size must be positive");
        anyhow::ensure!(
            self.chunk_overlap < self.chunk_size,
            "chunk_overlap must be smaller than chunk_size"
        );
        anyhow::ensure!(self.batch_size > 0, "batch_size must be positive");
        anyhow::ensure!(self.search_top_k > 0, "search_top_k must be positive");
        anyhow::ensure!(
            self.embedding.dimensions > 0,
            "embedding.dimensions must be positive"
        );
        anyhow::ensure!(!self.label_prefix.is_empty(), "label_prefix must be set");
        anyhow::ensure!(!self.github.owner.is_empty(), "github.owner must be set");
        anyhow::ensure!(!self.github.repo.is_empty(), "github.repo must be set");
        Ok(())
    }

    /// GitHub API token from the environment, if set.
    #[must_use]
    pub fn github_token() -> Option<String> {
        std::env::var(ENV_GITHUB_TOKEN)
            .ok()
            .filter(|t| !t.is_empty())
    }

    /// API key for the embedding/chat providers. Required for live calls.
    pub fn openai_api_key() -> Result<String> {
        std::env::var(ENV_OPENAI_API_KEY)
            .ok()
            .filter(|k| !k.is_empty())
            .with_context(|| format!("{ENV_OPENAI_API_KEY} is not set"))
    }

    #[must_use]
    pub fn issues_dir(&self) -> PathBuf {
        PathBuf::from(&self.issues_dir)
    }

    #[must_use]
    pub fn devset_dir(&self) -> PathBuf {
        PathBuf::from(&self.devset_dir)
    }

    #[must_use]
    pub fn testset_dir(&self) -> PathBuf {
        PathBuf::from(&self.testset_dir)
    }

    #[must_use]
    pub fn results_dir(&self) -> PathBuf {
        PathBuf::from(&self.results_dir)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
