//! Similarity search over the indexed issue chunks.
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::db::Db;
use crate::embedder::Embedder;

/// A similar chunk with the full metadata stored at index time.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarIssue {
    pub issue_num: String,
    pub issue_title: String,
    pub issue_ref: String,
    pub document_source: String,
    pub source: String,
    pub chunk_index: usize,
    pub chunk_size: usize,
    pub content: String,
    pub similarity_score: f64,
    pub ground_truth_labels: Vec<String>,
}

/// A similar chunk narrowed to the fields the label predictor consumes.
#[derive(Debug, Clone, Serialize)]
pub struct LabeledNeighbor {
    pub issue_num: String,
    pub issue_title: String,
    pub similarity_score: f64,
    pub ground_truth_labels: Vec<String>,
    pub content: String,
}

pub struct SimilaritySearch<'a, E: Embedder + ?Sized> {
    db: &'a Db,
    embedder: &'a E,
}

impl<'a, E: Embedder + ?Sized> SimilaritySearch<'a, E> {
    pub fn new(db: &'a Db, embedder: &'a E) -> Self {
        Self { db, embedder }
    }

    /// Embed `query` and return the `top_k` nearest chunks by cosine
    /// similarity, best first.
    pub fn search_similar_issues(&self, query: &str, top_k: usize) -> Result<Vec<SimilarIssue>> {
        info!("Searching for {top_k} similar issues for query: \"{query}\"");

        let query_vector = self
            .embedder
            .embed(query)
            .context("failed to embed query")?;
        let hits = self
            .db
            .search(&query_vector, top_k)
            .context("vector search failed")?;

        info!("Found {} similar documents", hits.len());

        Ok(hits
            .into_iter()
            .map(|hit| SimilarIssue {
                issue_num: hit.metadata.issue_num,
                issue_title: hit.metadata.issue_title,
                issue_ref: hit.metadata.issue_ref,
                document_source: hit.metadata.document_source,
                source: hit.metadata.source,
                chunk_index: hit.metadata.chunk_index,
                chunk_size: hit.metadata.chunk_size,
                content: hit.content,
                similarity_score: hit.similarity,
                ground_truth_labels: hit.metadata.ground_truth_labels,
            })
            .collect())
    }

    /// Search with a query shaped like the indexed documents, narrowed to
    /// the fields label prediction needs.
    pub fn find_similar_issues_for_labeling(
        &self,
        title: &str,
        description: &str,
        top_k: usize,
    ) -> Result<Vec<LabeledNeighbor>> {
        let query = labeling_query(title, description);
        let results = self.search_similar_issues(&query, top_k)?;

        Ok(results
            .into_iter()
            .map(|r| LabeledNeighbor {
                issue_num: r.issue_num,
                issue_title: r.issue_title,
                similarity_score: r.similarity_score,
                ground_truth_labels: r.ground_truth_labels,
                content: r.content,
            })
            .collect())
    }
}

/// Query text matching the indexed document shape.
#[must_use]
pub fn labeling_query(title: &str, description: &str) -> String {
    format!("Issue body: {title}\n\nDescription: {description}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ChunkMetadata, NewChunk};
    use crate::embedder::mock::MockEmbedder;

    fn seed_issue(db: &mut Db, embedder: &MockEmbedder, num: &str, content: &str, labels: &[&str]) {
        let metadata = ChunkMetadata {
            issue_num: num.to_string(),
            issue_title: format!("issue {num}"),
            issue_ref: format!("Issue #{num}"),
            document_source: "github-issues".to_string(),
            source: "github-issues".to_string(),
            chunk_index: 0,
            chunk_size: content.chars().count(),
            original_doc_length: content.chars().count(),
            ground_truth_labels: labels.iter().map(|s| s.to_string()).collect(),
        };
        let embedding = embedder.embed(content).unwrap();
        db.insert_chunks(
            &[NewChunk {
                content,
                metadata: &metadata,
            }],
            &[embedding],
        )
        .unwrap();
    }

    #[test]
    fn test_labeling_query_shape() {
        assert_eq!(
            labeling_query("Title", "Desc"),
            "Issue body: Title\n\nDescription: Desc"
        );
    }

    #[test]
    fn test_exact_content_is_top_hit() {
        let mut db = Db::open_in_memory(1536).unwrap();
        let embedder = MockEmbedder::default();
        seed_issue(&mut db, &embedder, "1", "tokio runtime panics on shutdown", &["bug"]);
        seed_issue(&mut db, &embedder, "2", "how do I configure retries", &["question"]);

        let search = SimilaritySearch::new(&db, &embedder);
        let results = search
            .search_similar_issues("tokio runtime panics on shutdown", 2)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].issue_num, "1");
        assert!(results[0].similarity_score > 0.99);
        assert!(results[0].similarity_score >= results[1].similarity_score);
        assert_eq!(results[0].ground_truth_labels, vec!["bug"]);
    }

    #[test]
    fn test_top_k_bounds_results() {
        let mut db = Db::open_in_memory(1536).unwrap();
        let embedder = MockEmbedder::default();
        for i in 0..8 {
            seed_issue(&mut db, &embedder, &i.to_string(), &format!("content {i}"), &["bug"]);
        }

        let search = SimilaritySearch::new(&db, &embedder);
        let results = search.search_similar_issues("content", 3).unwrap();
        assert_eq!(results.len(), 3);

        let results = search.search_similar_issues("content", 100).unwrap();
        assert_eq!(results.len(), 8);
    }

    #[test]
    fn test_labeling_variant_narrows_fields() {
        let mut db = Db::open_in_memory(1536).unwrap();
        let embedder = MockEmbedder::default();
        seed_issue(&mut db, &embedder, "7", "Issue body: Crash\n\nDescription: segfault", &["bug"]);

        let search = SimilaritySearch::new(&db, &embedder);
        let results = search
            .find_similar_issues_for_labeling("Crash", "segfault", 5)
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].issue_num, "7");
        assert_eq!(results[0].ground_truth_labels, vec!["bug"]);
        assert!(!results[0].content.is_empty());
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let db = Db::open_in_memory(1536).unwrap();
        let embedder = MockEmbedder::default();
        let search = SimilaritySearch::new(&db, &embedder);
        let results = search
            .find_similar_issues_for_labeling("anything", "at all", 5)
            .unwrap();
        assert!(results.is_empty());
    }
}
