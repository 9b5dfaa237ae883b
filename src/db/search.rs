use rusqlite::{Result, params};

use super::{Db, models::ChunkMetadata, serialize_vector};

/// One nearest-neighbor hit with its stored text and metadata.
#[derive(Debug)]
pub struct SearchHit {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub similarity: f64,
}

impl Db {
    /// Perform vector similarity search using cosine distance.
    ///
    /// Returns at most `top_k` hits ordered by descending similarity
    /// (`1 - distance/2`, so identical vectors score 1.0).
    pub fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                c.document,
                c.metadata,
                vec_distance_cosine(v.embedding, ?) as distance
            FROM vec_issue_chunks v
            JOIN issue_chunks c ON v.rowid = c.id
            ORDER BY distance ASC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(
            params![serialize_vector(query_vector), top_k as i64],
            |row| {
                let content: String = row.get(0)?;
                let metadata_json: String = row.get(1)?;
                let distance: f64 = row.get(2)?;
                Ok((content, metadata_json, distance))
            },
        )?;

        let mut results = Vec::new();
        for row in rows {
            let (content, metadata_json, distance) = row?;
            let metadata: ChunkMetadata =
                serde_json::from_str(&metadata_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
            results.push(SearchHit {
                content,
                metadata,
                similarity: 1.0 - (distance / 2.0),
            });
        }

        Ok(results)
    }
}
