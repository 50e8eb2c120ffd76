//! ContentStore: deduplicated physical storage of raw bytes.
//!
//! Bytes are written under a sharded path derived from their hash, then a
//! metadata row is committed. Identical content is stored once regardless of
//! how many entries reference it. The write order matters: a crash between
//! the two steps leaves an orphaned blob on disk, never a record pointing at
//! missing bytes.
//!
//! Layout:
//! ```text
//! {root}/
//! ├── 3/
//! │   └── 0/
//! │       └── 9/
//! │           └── e/
//! │               └── c/
//! │                   └── c489c12d6eb4...  # remainder of hash
//! ```

use std::path::{Path, PathBuf};

use sqlx::Row;
use tracing::debug;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::hash::ContentHash;

/// Metadata for one distinct piece of stored content.
#[derive(Debug, Clone)]
pub struct ContentRecord {
    pub id: i64,
    pub hash: ContentHash,
    pub size: i64,
    pub mime_type: String,
    pub created_at: i64,
}

/// Content-addressed byte store over a database and an object directory.
#[derive(Debug, Clone)]
pub struct ContentStore {
    db: Database,
    root: PathBuf,
}

impl ContentStore {
    /// Create a content store rooted at the given object directory.
    pub async fn new(db: Database, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { db, root })
    }

    /// Object directory root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, hash: &ContentHash) -> PathBuf {
        self.root.join(hash.shard_path())
    }

    /// Store raw bytes, returning the content record id.
    ///
    /// Identical bytes always resolve to the same record. Safe under
    /// concurrent calls: the filesystem write is idempotent (a racing
    /// duplicate write lands identical bytes at the same path) and the
    /// unique index on `hash` arbitrates record creation.
    pub async fn put(&self, data: &[u8], name_hint: Option<&str>) -> Result<i64> {
        let hash = ContentHash::from_data(data);
        let path = self.object_path(&hash);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Bytes first, record second (see module docs)
        if !path.exists() {
            tokio::fs::write(&path, data).await?;
        }

        let mime_type = detect_mime(name_hint);
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO contents (hash, size, mime_type, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(hash) DO UPDATE SET deleted_at = NULL
            "#,
        )
        .bind(hash.as_str())
        .bind(data.len() as i64)
        .bind(&mime_type)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        // the row is guaranteed present now, whoever inserted it
        let row = sqlx::query("SELECT id FROM contents WHERE hash = ?")
            .bind(hash.as_str())
            .fetch_one(self.db.pool())
            .await?;
        let id: i64 = row.get("id");

        debug!(hash = %hash, size = data.len(), id, "content stored");
        Ok(id)
    }

    /// Look up the metadata record for a content id.
    pub async fn record(&self, content_id: i64) -> Result<ContentRecord> {
        let row = sqlx::query(
            r#"
            SELECT id, hash, size, mime_type, created_at
            FROM contents
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(content_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| StoreError::ContentNotFound(format!("no content record {}", content_id)))?;

        let hash: String = row.get("hash");
        Ok(ContentRecord {
            id: row.get("id"),
            hash: hash.parse()?,
            size: row.get("size"),
            mime_type: row.get("mime_type"),
            created_at: row.get("created_at"),
        })
    }

    /// Retrieve the raw bytes for a content id.
    ///
    /// A record whose physical object is missing means the byte store and
    /// the database have diverged; that is a hard error, never empty
    /// content.
    pub async fn get(&self, content_id: i64) -> Result<Vec<u8>> {
        let record = self.record(content_id).await?;
        let path = self.object_path(&record.hash);

        if !path.exists() {
            return Err(StoreError::ContentNotFound(format!(
                "bytes missing at {}",
                path.display()
            )));
        }

        Ok(tokio::fs::read(&path).await?)
    }

    /// Physical path for a content id, for callers that stream from disk.
    ///
    /// Derived purely from the stored hash; existence is not checked.
    pub async fn path_for(&self, content_id: i64) -> Result<PathBuf> {
        let record = self.record(content_id).await?;
        Ok(self.object_path(&record.hash))
    }
}

/// Detect a mime type from the original file name, falling back to a
/// generic binary type. Content sniffing is deliberately not attempted.
fn detect_mime(name_hint: Option<&str>) -> String {
    match name_hint {
        Some(name) => mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
        None => "application/octet-stream".to_string(),
    }
}
