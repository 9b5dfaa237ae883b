use serde::{Deserialize, Serialize};

/// Metadata stored alongside every chunk, round-tripped through the JSON
/// metadata column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub issue_num: String,
    pub issue_title: String,
    pub issue_ref: String,
    pub document_source: String,
    pub source: String,
    pub chunk_index: usize,
    pub chunk_size: usize,
    pub original_doc_length: usize,
    pub ground_truth_labels: Vec<String>,
}

/// A chunk about to be inserted, borrowed from the indexing pass.
#[derive(Debug, Clone)]
pub struct NewChunk<'a> {
    pub content: &'a str,
    pub metadata: &'a ChunkMetadata,
}
