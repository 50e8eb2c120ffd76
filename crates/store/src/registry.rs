//! FileRegistry: named, linkable entries over deduplicated content.
//!
//! An entry is one logical upload. Storing the same bytes twice creates two
//! entries sharing one content record. Entries are soft-deleted; the content
//! they reference is never touched by the registry.

use std::path::PathBuf;

use sqlx::Row;
use tracing::{debug, info};

use crate::content::ContentStore;
use crate::database::Database;
use crate::error::{Result, StoreError};

/// A named reference to stored content.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub id: i64,
    pub name: String,
    /// Optional unique string alias; resolves to this entry while it lives.
    pub link: Option<String>,
    /// Opaque caller-supplied tag, used for bulk re-tagging.
    pub backref: Option<String>,
    pub content_id: i64,
    pub created_by: Option<i64>,
    pub created_at: i64,
}

/// What to store: raw bytes, a file on disk, or an existing entry to re-tag.
#[derive(Debug, Clone)]
pub enum FileSource {
    Data { name: String, bytes: Vec<u8> },
    Path(PathBuf),
    Existing(i64),
}

/// A single store operation.
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub source: FileSource,
    pub link: Option<String>,
    pub backref: Option<String>,
    pub created_by: Option<i64>,
}

impl StoreRequest {
    /// Store raw bytes under a display name.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            source: FileSource::Data {
                name: name.into(),
                bytes: bytes.into(),
            },
            link: None,
            backref: None,
            created_by: None,
        }
    }

    /// Store a file from disk; the display name defaults to its basename.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: FileSource::Path(path.into()),
            link: None,
            backref: None,
            created_by: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_backref(mut self, backref: impl Into<String>) -> Self {
        self.backref = Some(backref.into());
        self
    }

    pub fn with_created_by(mut self, actor: i64) -> Self {
        self.created_by = Some(actor);
        self
    }
}

/// Registry of file entries referencing deduplicated content.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    db: Database,
    content: ContentStore,
}

impl FileRegistry {
    pub fn new(db: Database, content: ContentStore) -> Self {
        Self { db, content }
    }

    /// The underlying content store.
    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Store a file, returning the entry id.
    ///
    /// A new logical submission always creates a new entry row, even when
    /// the bytes deduplicate to an existing content record. Re-tagging an
    /// existing entry (`FileSource::Existing`) updates `backref` in place
    /// and returns the same id.
    pub async fn store(&self, request: StoreRequest) -> Result<i64> {
        let StoreRequest {
            source,
            link,
            backref,
            created_by,
        } = request;

        if let Some(link) = &link {
            if self.resolve_link(link).await?.is_some() {
                return Err(StoreError::LinkDuplicate(link.clone()));
            }
        }

        let (name, bytes) = match source {
            FileSource::Existing(id) => {
                return self.retag(id, backref.as_deref()).await;
            }
            FileSource::Data { name, bytes } => (name, bytes),
            FileSource::Path(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.to_string_lossy().to_string());
                let bytes = tokio::fs::read(&path).await?;
                (name, bytes)
            }
        };

        let content_id = self.content.put(&bytes, Some(&name)).await?;
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO entries (name, link, backref, content_id, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&name)
        .bind(&link)
        .bind(&backref)
        .bind(content_id)
        .bind(created_by)
        .bind(now)
        .execute(self.db.pool())
        .await;

        let done = match result {
            Ok(done) => done,
            // lost a check-then-insert race on the link index
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(StoreError::LinkDuplicate(link.unwrap_or_default()));
            }
            Err(err) => return Err(err.into()),
        };

        let id = done.last_insert_rowid();
        info!(id, content_id, name = %name, "file entry stored");
        Ok(id)
    }

    /// Store a batch; existing ids are re-tagged with `backref` instead of
    /// re-storing bytes. Returns ids in ascending order.
    pub async fn store_many(
        &self,
        items: Vec<FileSource>,
        backref: Option<&str>,
    ) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(items.len());
        for source in items {
            let request = StoreRequest {
                source,
                link: None,
                backref: backref.map(str::to_string),
                created_by: None,
            };
            ids.push(self.store(request).await?);
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Resolve a link string to an entry id among live entries.
    ///
    /// Numeric input is returned unchanged - ids are themselves valid links.
    pub async fn resolve_link(&self, link: &str) -> Result<Option<i64>> {
        if let Ok(id) = link.parse::<i64>() {
            return Ok(Some(id));
        }

        let row = sqlx::query("SELECT id FROM entries WHERE link = ? AND deleted_at IS NULL")
            .bind(link)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.map(|r| r.get("id")))
    }

    /// Resolve a link, failing with `LinkNotFound` when it points nowhere.
    pub async fn require_id(&self, id_or_link: &str) -> Result<i64> {
        self.resolve_link(id_or_link)
            .await?
            .ok_or_else(|| StoreError::LinkNotFound(id_or_link.to_string()))
    }

    /// Retrieve an entry by numeric id or link string.
    pub async fn retrieve(&self, id_or_link: &str) -> Result<FileEntry> {
        let id = self.require_id(id_or_link).await?;
        self.get(id).await
    }

    /// Retrieve an entry by id.
    ///
    /// An entry whose content record is gone or hashless signals structural
    /// corruption and is surfaced as `FileNotFound`, distinct from the
    /// plain `EntryNotFound` of an unknown id.
    pub async fn get(&self, id: i64) -> Result<FileEntry> {
        let row = sqlx::query(
            r#"
            SELECT id, name, link, backref, content_id, created_by, created_at
            FROM entries
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(StoreError::EntryNotFound(id))?;

        let entry = FileEntry {
            id: row.get("id"),
            name: row.get("name"),
            link: row.get("link"),
            backref: row.get("backref"),
            content_id: row.get("content_id"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
        };

        let content = sqlx::query("SELECT hash FROM contents WHERE id = ? AND deleted_at IS NULL")
            .bind(entry.content_id)
            .fetch_optional(self.db.pool())
            .await?;
        let has_hash = content
            .map(|r| !r.get::<String, _>("hash").is_empty())
            .unwrap_or(false);
        if !has_hash {
            return Err(StoreError::FileNotFound(id));
        }

        Ok(entry)
    }

    /// Soft-delete an entry. Does not remove any content.
    ///
    /// Unknown ids and links are ignored, matching the idempotent intent of
    /// an unlink.
    pub async fn unlink(&self, id_or_link: &str) -> Result<()> {
        if let Some(id) = self.resolve_link(id_or_link).await? {
            let now = chrono::Utc::now().timestamp();
            sqlx::query("UPDATE entries SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(now)
                .bind(id)
                .execute(self.db.pool())
                .await?;
            debug!(id, "file entry unlinked");
        }
        Ok(())
    }

    /// True only when the entry resolves and its physical object is present
    /// on disk. Distinguishes storage corruption from database-only
    /// existence.
    pub async fn exists(&self, id_or_link: &str) -> bool {
        let entry = match self.retrieve(id_or_link).await {
            Ok(entry) => entry,
            Err(_) => return false,
        };
        match self.content.path_for(entry.content_id).await {
            Ok(path) => path.exists(),
            Err(_) => false,
        }
    }

    async fn retag(&self, id: i64, backref: Option<&str>) -> Result<i64> {
        let entry = self.get(id).await?;

        if let Some(backref) = backref {
            // only write when the value actually changed
            if entry.backref.as_deref() != Some(backref) {
                sqlx::query("UPDATE entries SET backref = ? WHERE id = ?")
                    .bind(backref)
                    .bind(id)
                    .execute(self.db.pool())
                    .await?;
                debug!(id, backref = %backref, "file entry re-tagged");
            }
        }

        Ok(id)
    }
}
