use std::sync::Arc;

use url::Url;

use store::{AccessGrants, AccessLog, ContentStore, Database, FileRegistry, StoreError};

use crate::access::{AccessPolicy, RemoteAccessPolicy, UserAccessPolicy};
use crate::config::Config;
use crate::session::{AllowAll, Anonymous, Permissions, Session};
use crate::thumbnail::{Thumbnail, ThumbnailGenerator};

/// Main service state - wires the storage core to the HTTP surface.
#[derive(Clone)]
pub struct State {
    registry: FileRegistry,
    grants: AccessGrants,
    log: AccessLog,
    session: Arc<dyn Session>,
    permissions: Arc<dyn Permissions>,
    thumbnailer: Option<Arc<dyn ThumbnailGenerator>>,
    public_url: Url,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let database = match config.sqlite_path {
            Some(ref path) => Database::new(path).await?,
            None => Database::in_memory().await?,
        };
        tracing::info!(path = ?config.sqlite_path, "database ready");

        // 2. Setup object directory
        let objects_path = config
            .objects_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("depot-objects"));
        let content = ContentStore::new(database.clone(), &objects_path).await?;
        tracing::info!(path = %objects_path.display(), "object store ready");

        // 3. Repositories over the shared pool
        let registry = FileRegistry::new(database.clone(), content);
        let grants = AccessGrants::new(database.clone());
        let log = AccessLog::new(database);

        Ok(Self {
            registry,
            grants,
            log,
            session: Arc::new(Anonymous),
            permissions: Arc::new(AllowAll),
            thumbnailer: None,
            public_url: config.public_url.clone(),
        })
    }

    /// Replace the session layer resolving actors from request headers.
    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = session;
        self
    }

    /// Replace the permission layer consulted for authenticated users.
    pub fn with_permissions(mut self, permissions: Arc<dyn Permissions>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Attach an optional preview generator.
    pub fn with_thumbnailer(mut self, thumbnailer: Arc<dyn ThumbnailGenerator>) -> Self {
        self.thumbnailer = Some(thumbnailer);
        self
    }

    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    pub fn grants(&self) -> &AccessGrants {
        &self.grants
    }

    pub fn log(&self) -> &AccessLog {
        &self.log
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    pub fn public_url(&self) -> &Url {
        &self.public_url
    }

    /// The gate's policies, in evaluation order: authenticated users first,
    /// remote tokens second.
    pub fn policies(&self) -> Vec<Box<dyn AccessPolicy>> {
        vec![
            Box::new(UserAccessPolicy::new(self.permissions.clone())),
            Box::new(RemoteAccessPolicy::new(self.grants.clone())),
        ]
    }

    /// Derive a preview for the content, when a generator is configured
    /// and claims the type.
    pub fn thumbnail(&self, data: &[u8], mime_type: &str) -> Option<Thumbnail> {
        let generator = self.thumbnailer.as_ref()?;
        if !generator.supports(mime_type) {
            return None;
        }
        generator.generate(data, mime_type)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("storage setup error: {0}")]
    Store(#[from] StoreError),
}
