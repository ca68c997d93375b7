//! Chunked file store in Postgres
//!
//! Files are split into fixed-size chunks (`grid_chunks`) described by one
//! `grid_files` row. Several revisions may share a filename; reads by name
//! resolve to the newest upload.

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use futures::{stream, Stream};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::config::GridStoreConfig;
use crate::core::error::{AppError, Result};

/// Chunk rows inserted per statement
const CHUNK_INSERT_BATCH: usize = 1000;

#[derive(Debug, Clone, FromRow)]
pub struct GridFile {
    pub id: Uuid,
    pub bucket: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub length: i64,
    pub chunk_size: i32,
    pub sha256: String,
    pub metadata: Value,
    pub upload_date: DateTime<Utc>,
}

impl GridFile {
    pub fn chunk_count(&self) -> i32 {
        chunk_count(self.length, self.chunk_size)
    }
}

fn chunk_count(length: i64, chunk_size: i32) -> i32 {
    if length <= 0 || chunk_size <= 0 {
        return 0;
    }
    let size = i64::from(chunk_size);
    ((length + size - 1) / size) as i32
}

pub struct GridStore {
    pool: PgPool,
    bucket: String,
    chunk_size: usize,
}

impl GridStore {
    pub fn new(pool: PgPool, config: &GridStoreConfig) -> Self {
        Self {
            pool,
            bucket: config.bucket_name.clone(),
            chunk_size: config.chunk_size,
        }
    }

    /// Store `data` as a new revision of `filename`
    pub async fn upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        metadata: Value,
        data: &[u8],
    ) -> Result<GridFile> {
        let id = Uuid::now_v7();
        let digest = hex::encode(Sha256::digest(data));
        let chunk_size = i32::try_from(self.chunk_size)
            .map_err(|_| AppError::Internal("Grid chunk size out of range".to_string()))?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin grid upload: {:?}", e);
            AppError::Database(e)
        })?;

        let file = sqlx::query_as::<_, GridFile>(
            "INSERT INTO grid_files (id, bucket, filename, content_type, length, chunk_size, sha256, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, bucket, filename, content_type, length, chunk_size, sha256, metadata, upload_date",
        )
        .bind(id)
        .bind(&self.bucket)
        .bind(filename)
        .bind(content_type)
        .bind(data.len() as i64)
        .bind(chunk_size)
        .bind(&digest)
        .bind(metadata)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create grid file '{}': {:?}", filename, e);
            AppError::Database(e)
        })?;

        let chunks: Vec<(i32, &[u8])> = data
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(n, chunk)| (n as i32, chunk))
            .collect();

        for batch in chunks.chunks(CHUNK_INSERT_BATCH) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO grid_chunks (files_id, n, data) ");
            builder.push_values(batch, |mut b, (n, chunk)| {
                b.push_bind(id).push_bind(*n).push_bind(chunk.to_vec());
            });
            builder.build().execute(&mut *tx).await.map_err(|e| {
                tracing::error!("Failed to write chunks of '{}': {:?}", filename, e);
                AppError::Database(e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit grid upload: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            bucket = %self.bucket,
            filename,
            length = file.length,
            chunks = chunks.len(),
            "Stored grid file"
        );
        Ok(file)
    }

    /// Newest revision of `filename`
    pub async fn find_by_name(&self, filename: &str) -> Result<Option<GridFile>> {
        sqlx::query_as::<_, GridFile>(
            "SELECT id, bucket, filename, content_type, length, chunk_size, sha256, metadata, upload_date \
             FROM grid_files WHERE bucket = $1 AND filename = $2 \
             ORDER BY upload_date DESC, id DESC LIMIT 1",
        )
        .bind(&self.bucket)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to find grid file '{}': {:?}", filename, e);
            AppError::Database(e)
        })
    }

    /// Chunks of `file` in order, fetched one at a time
    pub fn open_download_stream(
        &self,
        file: &GridFile,
    ) -> impl Stream<Item = std::result::Result<Bytes, sqlx::Error>> + Send + 'static {
        let pool = self.pool.clone();
        let files_id = file.id;
        let total = file.chunk_count();

        stream::try_unfold(0i32, move |n| {
            let pool = pool.clone();
            async move {
                if n >= total {
                    return Ok(None);
                }
                let data: Vec<u8> =
                    sqlx::query_scalar("SELECT data FROM grid_chunks WHERE files_id = $1 AND n = $2")
                        .bind(files_id)
                        .bind(n)
                        .fetch_one(&pool)
                        .await?;
                Ok::<_, sqlx::Error>(Some((Bytes::from(data), n + 1)))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use serde_json::json;

    fn store(pool: PgPool) -> GridStore {
        GridStore::new(
            pool,
            &GridStoreConfig {
                bucket_name: "uploads".to_string(),
                chunk_size: 4,
            },
        )
    }

    async fn read_all(store: &GridStore, file: &GridFile) -> Vec<u8> {
        let chunks: Vec<Bytes> = store.open_download_stream(file).try_collect().await.unwrap();
        chunks.concat()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_upload_streams_back_in_chunks(pool: PgPool) {
        let store = store(pool);
        let data = b"seventeen bytes!!".to_vec();

        let file = store
            .upload("notes.txt", Some("text/plain"), json!({ "owner": "a" }), &data)
            .await
            .unwrap();
        assert_eq!(file.length, 17);
        assert_eq!(file.chunk_count(), 5);
        assert_eq!(file.sha256, hex::encode(Sha256::digest(&data)));

        let found = store.find_by_name("notes.txt").await.unwrap().unwrap();
        assert_eq!(found.id, file.id);
        assert_eq!(found.metadata, json!({ "owner": "a" }));
        assert_eq!(read_all(&store, &found).await, data);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_find_by_name_returns_newest_revision(pool: PgPool) {
        let store = store(pool);
        store.upload("logo.png", None, json!({}), b"old").await.unwrap();
        let newer = store.upload("logo.png", None, json!({}), b"newer").await.unwrap();

        let found = store.find_by_name("logo.png").await.unwrap().unwrap();
        assert_eq!(found.id, newer.id);
        assert_eq!(read_all(&store, &found).await, b"newer".to_vec());
        assert!(store.find_by_name("missing.png").await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_empty_upload_streams_nothing(pool: PgPool) {
        let store = store(pool);
        let file = store.upload("empty.bin", None, json!({}), &[]).await.unwrap();

        assert_eq!(file.chunk_count(), 0);
        assert!(read_all(&store, &file).await.is_empty());
    }

    #[test]
    fn test_chunk_count() {
        assert_eq!(chunk_count(0, 255), 0);
        assert_eq!(chunk_count(1, 255), 1);
        assert_eq!(chunk_count(255, 255), 1);
        assert_eq!(chunk_count(256, 255), 2);
        assert_eq!(chunk_count(10 * 1024 * 1024, 255 * 1024), 41);
    }
}
