//! Builds the vector index from stored GitHub issues.
//!
//! Reads issue JSON files, turns each labeled issue into one searchable
//! document, splits documents into overlapping chunks, embeds each chunk,
//! and upserts chunks in fixed-size batches. Issues without ground-truth
//! labels are excluded. A failed batch aborts the whole run.
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::db::Db;
use crate::db::models::{ChunkMetadata, NewChunk};
use crate::embedder::Embedder;
use crate::github::{IssueRecord, load_issue_dir};
use crate::splitter::TextSplitter;

/// Tag recorded in chunk metadata identifying where documents came from.
const DOCUMENT_SOURCE: &str = "github-issues";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub total_issues: usize,
    pub with_labels: usize,
    pub without_labels: usize,
    pub chunks: usize,
}

pub struct Indexer<'a, E: Embedder + ?Sized> {
    db: &'a mut Db,
    embedder: &'a E,
    splitter: TextSplitter,
    issues_dir: PathBuf,
    batch_size: usize,
}

impl<'a, E: Embedder + ?Sized> Indexer<'a, E> {
    pub fn new(
        db: &'a mut Db,
        embedder: &'a E,
        splitter: TextSplitter,
        issues_dir: PathBuf,
        batch_size: usize,
    ) -> Self {
        Self {
            db,
            embedder,
            splitter,
            issues_dir,
            batch_size,
        }
    }

    /// Clear the index, then rebuild it from the issues directory.
    pub fn index_all(&mut self) -> Result<IndexSummary> {
        info!("Starting complete indexing process...");
        self.clear_index()?;
        let summary = self.index_github_issues()?;
        info!("Complete indexing process finished");
        Ok(summary)
    }

    /// Delete all rows from the index.
    pub fn clear_index(&mut self) -> Result<usize> {
        info!("Clearing existing index...");
        let deleted = self
            .db
            .clear_chunks()
            .context("failed to clear index")?;
        info!("Index cleared - deleted {deleted} rows");
        Ok(deleted)
    }

    /// Build, chunk, embed, and upsert every labeled issue.
    pub fn index_github_issues(&mut self) -> Result<IndexSummary> {
        info!("Starting GitHub issues indexing...");

        let issues = load_issue_dir(&self.issues_dir)?;
        info!("Found {} issue files", issues.len());

        let mut summary = IndexSummary {
            total_issues: issues.len(),
            ..Default::default()
        };

        // Build one document per labeled issue
        let mut documents: Vec<(String, ChunkMetadata)> = Vec::new();
        for (_, record) in &issues {
            if record.ground_truth_labels.is_empty() {
                summary.without_labels += 1;
                continue;
            }
            summary.with_labels += 1;
            documents.push((document_text(record), issue_metadata(record)));
        }

        info!("Filtering results:");
        info!("   Total issues found: {}", summary.total_issues);
        info!("   Issues with labels (indexed): {}", summary.with_labels);
        info!(
            "   Issues without labels (filtered out): {}",
            summary.without_labels
        );

        // Split into chunks, enriching metadata per chunk
        let mut all_chunks: Vec<(String, ChunkMetadata)> = Vec::new();
        for (text, metadata) in &documents {
            let original_doc_length = text.chars().count();
            for (chunk_index, content) in self.splitter.split(text).into_iter().enumerate() {
                let mut chunk_meta = metadata.clone();
                chunk_meta.chunk_index = chunk_index;
                chunk_meta.chunk_size = content.chars().count();
                chunk_meta.original_doc_length = original_doc_length;
                all_chunks.push((content, chunk_meta));
            }
        }

        info!(
            "Split {} documents into {} chunks",
            documents.len(),
            all_chunks.len()
        );

        // Embed and upsert in fixed-size batches; any failure aborts the run
        let batches = all_chunks.len().div_ceil(self.batch_size);
        for (i, batch) in all_chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|(content, _)| content.as_str()).collect();
            let embeddings = self
                .embedder
                .embed_batch(&texts)
                .with_context(|| format!("embedding failed for batch {}", i + 1))?;

            let new_chunks: Vec<NewChunk<'_>> = batch
                .iter()
                .map(|(content, metadata)| NewChunk { content, metadata })
                .collect();
            self.db
                .insert_chunks(&new_chunks, &embeddings)
                .with_context(|| format!("insert failed for batch {}", i + 1))?;

            info!("Indexed batch {}/{batches}", i + 1);
        }

        summary.chunks = all_chunks.len();
        info!(
            "Successfully indexed {} chunks from {} GitHub issues",
            summary.chunks,
            documents.len()
        );

        Ok(summary)
    }
}

/// Searchable text for one issue, the same shape the labeling query uses.
#[must_use]
pub fn document_text(record: &IssueRecord) -> String {
    format!(
        "Github issue number #{}\n\nIssue body: {}\n\nDescription: {}\n\n",
        record.issue_num, record.issue_title, record.issue_description
    )
}

fn issue_metadata(record: &IssueRecord) -> ChunkMetadata {
    ChunkMetadata {
        issue_num: record.issue_num.clone(),
        issue_title: record.issue_title.clone(),
        issue_ref: format!("Issue #{}", record.issue_num),
        document_source: DOCUMENT_SOURCE.to_string(),
        source: DOCUMENT_SOURCE.to_string(),
        chunk_index: 0,
        chunk_size: 0,
        original_doc_length: 0,
        ground_truth_labels: record.ground_truth_labels.clone(),
    }
}
