use rusqlite::{Result, params};

use super::{Db, models::NewChunk, serialize_vector};

impl Db {
    /// Inserts a batch of chunks with their embeddings in one transaction.
    ///
    /// A failed insert rolls back the whole batch; rows written by earlier
    /// batches are left in place.
    pub fn insert_chunks(
        &mut self,
        chunks: &[NewChunk<'_>],
        embeddings: &[Vec<f32>],
    ) -> Result<()> {
        assert_eq!(
            chunks.len(),
            embeddings.len(),
            "chunks and embeddings length mismatch"
        );

        let tx = self.conn.transaction()?;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let metadata = serde_json::to_string(chunk.metadata)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            tx.execute(
                "INSERT INTO issue_chunks (document, metadata) VALUES (?, ?)",
                params![chunk.content, metadata],
            )?;
            let chunk_id = tx.last_insert_rowid();

            let vector_blob = serialize_vector(embedding);
            tx.execute(
                "INSERT INTO vec_issue_chunks (rowid, embedding) VALUES (?, ?)",
                params![chunk_id, vector_blob],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Deletes every row from the index. Returns the number of chunks removed.
    pub fn clear_chunks(&self) -> Result<usize> {
        self.conn.execute("DELETE FROM vec_issue_chunks", [])?;
        let rows = self.conn.execute("DELETE FROM issue_chunks", [])?;
        Ok(rows)
    }

    /// Number of chunks currently indexed.
    pub fn count_chunks(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM issue_chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
