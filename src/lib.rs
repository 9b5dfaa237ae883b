//! # issue-triage — GitHub issue label prediction by analogy
//!
//! Fetches GitHub issues, indexes them into a local vector store, and
//! predicts labels for new issues either by retrieving similar indexed
//! issues or by classifying directly against a closed label set.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading, validation, and env overlay
//! - **[`github`]** — Issue fetching, on-disk records, dev/test segregation
//! - **[`db`]** — SQLite + sqlite-vec vector store (insert, clear, search)
//! - **[`splitter`]** — Recursive character text splitting with overlap
//! - **[`embedder`]** — Text embedding via an OpenAI-compatible API
//! - **[`indexer`]** — Document building, chunking, batch embed + upsert
//! - **[`search`]** — Similarity search over indexed issue chunks
//! - **[`llm`]** — Chat model seam with structured JSON output
//! - **[`predictor`]** — Retrieval and direct label prediction variants
//! - **[`experiment`]** — Dev-set evaluation with JSON/CSV result logs

pub mod config;
pub mod db;
pub mod embedder;
pub mod experiment;
pub mod github;
pub mod indexer;
pub mod llm;
pub mod predictor;
pub mod search;
pub mod splitter;
