//! SQLite-based vector store implementation.
//!
//! Metadata predicates run in SQL; cosine similarity is computed in Rust over
//! the matching rows. For large datasets, consider the sqlite-vec extension
//! or a dedicated vector database.

use super::{
    cosine_similarity, rank, ChunkMetadata, IndexedSource, SearchFilter, SearchResult,
    StoredChunk, VectorStore,
};
use crate::content::ContentType;
use crate::error::{Result, VidsageError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS chunks (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        owner_id TEXT NOT NULL,
        content_type TEXT NOT NULL,
        source_id TEXT NOT NULL,
        source_title TEXT NOT NULL,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        extra_json TEXT NOT NULL,
        ingested_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_owner ON chunks(owner_id);
    CREATE INDEX IF NOT EXISTS idx_chunks_owner_source ON chunks(owner_id, source_id);
"#;

const FILTER_CLAUSE: &str = r#"
    WHERE (?1 IS NULL OR owner_id = ?1)
      AND (?2 IS NULL OR content_type = ?2)
      AND (?3 IS NULL OR source_id = ?3)
"#;

const CHUNK_COLUMNS: &str = "id, owner_id, content_type, source_id, source_title, \
     chunk_index, content, embedding, extra_json, ingested_at";

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a SQLite vector store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets readers proceed while an ingestion is writing
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VidsageError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn format_time(time: &DateTime<Utc>) -> String {
        // Fixed width so MAX() over the column orders chronologically
        time.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_time(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
    }

    fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<StoredChunk> {
        let id_str: String = row.get(0)?;
        let content_type_str: String = row.get(2)?;
        let embedding_bytes: Vec<u8> = row.get(7)?;
        let extra_json: String = row.get(8)?;
        let ingested_at_str: String = row.get(9)?;

        let content_type: ContentType = content_type_str
            .parse()
            .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?;
        let extra = serde_json::from_str(&extra_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

        Ok(StoredChunk {
            id: Uuid::parse_str(&id_str)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
            content: row.get(6)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            metadata: ChunkMetadata {
                owner_id: row.get(1)?,
                content_type,
                source_id: row.get(3)?,
                source_title: row.get(4)?,
                chunk_index: row.get(5)?,
                ingested_at: Self::parse_time(&ingested_at_str, 9)?,
                extra,
            },
        })
    }

    fn insert_with(conn: &Connection, chunk: &StoredChunk) -> Result<()> {
        let meta = &chunk.metadata;
        let extra_json = serde_json::to_string(&meta.extra)?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO chunks
            (id, owner_id, content_type, source_id, source_title, chunk_index,
             content, embedding, extra_json, ingested_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                chunk.id.to_string(),
                meta.owner_id,
                meta.content_type.as_str(),
                meta.source_id,
                meta.source_title,
                meta.chunk_index,
                chunk.content,
                Self::embedding_to_bytes(&chunk.embedding),
                extra_json,
                Self::format_time(&meta.ingested_at),
            ],
        )?;
        Ok(())
    }

    fn query_chunks(conn: &Connection, filter: &SearchFilter) -> Result<Vec<StoredChunk>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM chunks {} ORDER BY seq",
            CHUNK_COLUMNS, FILTER_CLAUSE
        ))?;

        let rows = stmt.query_map(
            params![
                filter.owner_id,
                filter.content_type.map(|t| t.as_str()),
                filter.source_id,
            ],
            Self::row_to_chunk,
        )?;

        let chunks = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(chunks)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, chunk))]
    async fn insert(&self, chunk: &StoredChunk) -> Result<()> {
        let conn = self.lock()?;
        Self::insert_with(&conn, chunk)?;
        debug!("Inserted chunk {}", chunk.id);
        Ok(())
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn insert_batch(&self, chunks: &[StoredChunk]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for chunk in chunks {
            Self::insert_with(&tx, chunk)?;
        }

        tx.commit()?;
        debug!("Batch inserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding, filter))]
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;
        let unfiltered = SearchFilter::default();
        let chunks = Self::query_chunks(&conn, filter.unwrap_or(&unfiltered))?;

        let results: Vec<SearchResult> = chunks
            .into_iter()
            .map(|chunk| SearchResult {
                score: cosine_similarity(query_embedding, &chunk.embedding),
                chunk,
            })
            .collect();

        let ranked = rank(results, limit);
        debug!("Found {} matching chunks", ranked.len());
        Ok(ranked)
    }

    fn supports_native_filter(&self) -> bool {
        true
    }

    #[instrument(skip(self))]
    async fn fetch(&self, filter: &SearchFilter) -> Result<Vec<StoredChunk>> {
        let conn = self.lock()?;
        Self::query_chunks(&conn, filter)
    }

    #[instrument(skip(self))]
    async fn delete_source(
        &self,
        owner_id: &str,
        source_id: &str,
        content_type: Option<ContentType>,
    ) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn.execute(
            r#"
            DELETE FROM chunks
            WHERE owner_id = ?1 AND source_id = ?2 AND (?3 IS NULL OR content_type = ?3)
            "#,
            params![owner_id, source_id, content_type.map(|t| t.as_str())],
        )?;

        info!("Deleted {} chunks for source {}", deleted, source_id);
        Ok(deleted)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_chunks(&self, owner_id: &str, ids: &[Uuid]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let mut deleted = 0;

        {
            let mut stmt = tx.prepare("DELETE FROM chunks WHERE owner_id = ?1 AND id = ?2")?;
            for id in ids {
                deleted += stmt.execute(params![owner_id, id.to_string()])?;
            }
        }

        tx.commit()?;
        debug!("Deleted {} chunks by id", deleted);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self, owner_id: &str) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source_id, MAX(source_title), content_type, COUNT(*) AS chunk_count,
                   MAX(ingested_at) AS ingested_at
            FROM chunks
            WHERE owner_id = ?1
            GROUP BY source_id, content_type
            ORDER BY ingested_at DESC
            "#,
        )?;

        let rows = stmt.query_map(params![owner_id], |row| {
            let content_type_str: String = row.get(2)?;
            let ingested_at_str: String = row.get(4)?;
            let content_type: ContentType = content_type_str.parse().map_err(|e: String| {
                rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into())
            })?;

            Ok(IndexedSource {
                source_id: row.get(0)?,
                source_title: row.get(1)?,
                content_type,
                chunk_count: row.get(3)?,
                ingested_at: Self::parse_time(&ingested_at_str, 4)?,
            })
        })?;

        let sources = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sources)
    }

    async fn chunk_count(&self, filter: &SearchFilter) -> Result<usize> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM chunks {}", FILTER_CLAUSE),
            params![
                filter.owner_id,
                filter.content_type.map(|t| t.as_str()),
                filter.source_id,
            ],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::chunk;
    use super::*;

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        let mut c = chunk("u1", ContentType::Comment, "v1", "Great video", vec![1.0, 0.0, 0.0]);
        c.metadata
            .extra
            .insert("sentiment".to_string(), serde_json::json!("positive"));
        store.insert(&c).await.unwrap();

        let sources = store.list_sources("u1").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_id, "v1");
        assert_eq!(sources[0].content_type, ContentType::Comment);

        let results = store.search(&[1.0, 0.0, 0.0], 10, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].chunk.id, c.id);
        assert_eq!(results[0].chunk.metadata.extra["sentiment"], "positive");
        assert_eq!(results[0].chunk.embedding, vec![1.0, 0.0, 0.0]);

        let deleted = store.delete_source("u1", "v1", None).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.list_sources("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_chunks_is_owner_scoped() {
        let store = SqliteVectorStore::in_memory().unwrap();
        let mine = chunk("u1", ContentType::Document, "d1", "a", vec![1.0]);
        let kept = chunk("u1", ContentType::Document, "d1", "b", vec![1.0]);
        let theirs = chunk("u2", ContentType::Document, "d1", "c", vec![1.0]);
        store
            .insert_batch(&[mine.clone(), kept.clone(), theirs.clone()])
            .await
            .unwrap();

        let deleted = store.delete_chunks("u1", &[mine.id, theirs.id]).await.unwrap();
        assert_eq!(deleted, 1);

        let remaining: Vec<Uuid> = store
            .fetch(&SearchFilter::default())
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(remaining, vec![kept.id, theirs.id]);
    }

    #[tokio::test]
    async fn test_corrupt_rows_are_errors() {
        let store = SqliteVectorStore::in_memory().unwrap();
        let c = chunk("u1", ContentType::Transcript, "v1", "text", vec![1.0]);
        store.insert(&c).await.unwrap();

        store
            .lock()
            .unwrap()
            .execute(
                "UPDATE chunks SET ingested_at = 'yesterday' WHERE id = ?1",
                params![c.id.to_string()],
            )
            .unwrap();
        assert!(store.fetch(&SearchFilter::owner("u1")).await.is_err());
        assert!(store.list_sources("u1").await.is_err());

        store
            .lock()
            .unwrap()
            .execute(
                "UPDATE chunks SET ingested_at = ?1, id = 'not-a-uuid'",
                params![SqliteVectorStore::format_time(&c.metadata.ingested_at)],
            )
            .unwrap();
        assert!(store.fetch(&SearchFilter::owner("u1")).await.is_err());
        assert_eq!(store.list_sources("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sql_filter() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .insert_batch(&[
                chunk("u1", ContentType::Transcript, "v1", "t1", vec![1.0, 0.0]),
                chunk("u1", ContentType::Comment, "v1", "c1", vec![1.0, 0.0]),
                chunk("u2", ContentType::Transcript, "v1", "t2", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let filter = SearchFilter::owner("u1")
            .with_content_type(ContentType::Transcript)
            .with_source("v1");
        let results = store.search(&[1.0, 0.0], 10, Some(&filter)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.content, "t1");

        assert_eq!(store.chunk_count(&SearchFilter::owner("u1")).await.unwrap(), 2);
        assert_eq!(store.chunk_count(&SearchFilter::default()).await.unwrap(), 3);

        let fetched = store.fetch(&SearchFilter::owner("u2")).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].metadata.owner_id, "u2");
    }

    #[tokio::test]
    async fn test_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vectors.db");

        {
            let store = SqliteVectorStore::new(&path).unwrap();
            store
                .insert(&chunk("u1", ContentType::Document, "d1", "page one", vec![0.3, 0.4]))
                .await
                .unwrap();
        }

        let reopened = SqliteVectorStore::new(&path).unwrap();
        let chunks = reopened.fetch(&SearchFilter::owner("u1")).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "page one");
        assert_eq!(chunks[0].metadata.content_type, ContentType::Document);
    }
}
