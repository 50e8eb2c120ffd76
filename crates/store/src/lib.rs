//! Content-addressed file depot.
//!
//! This crate is the storage core: it hashes raw bytes, stores each distinct
//! content exactly once under a hash-sharded path, and keeps the metadata in
//! SQLite - file entries with unique link aliases, time-boxed remote-access
//! grants, and an append-only access log.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use store::{ContentStore, Database, FileRegistry, StoreRequest};
//!
//! # async fn example() -> Result<(), store::StoreError> {
//! let db = Database::new(std::path::Path::new("/var/lib/depot/depot.db")).await?;
//! let content = ContentStore::new(db.clone(), "/var/lib/depot/objects").await?;
//! let registry = FileRegistry::new(db, content);
//!
//! // Store a file; identical bytes deduplicate to one content record
//! let id = registry
//!     .store(StoreRequest::from_bytes("hello.txt", b"hello world".to_vec()))
//!     .await?;
//!
//! // Retrieve by id or by link alias
//! let entry = registry.retrieve(&id.to_string()).await?;
//! let bytes = registry.content().get(entry.content_id).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Consistency model
//!
//! The physical byte store and the metadata store are two independently
//! consistent resources. Bytes are written first, records second: a crash
//! between the two strands an orphaned blob (harmless, reclaimable), never
//! a record pointing at missing bytes. A record whose bytes are missing is
//! reported as a hard `ContentNotFound`.

pub mod content;
pub mod database;
pub mod error;
pub mod grants;
pub mod hash;
pub mod log;
pub mod registry;

// Re-exports for convenience
pub use content::{ContentRecord, ContentStore};
pub use database::Database;
pub use error::{Result, StoreError};
pub use grants::{AccessGrant, AccessGrants, DEFAULT_GRANT_PERIOD_SECS};
pub use hash::{ContentHash, HashError};
pub use log::{AccessAction, AccessLog, AccessLogEntry};
pub use registry::{FileEntry, FileRegistry, FileSource, StoreRequest};
