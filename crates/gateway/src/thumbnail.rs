//! Optional derived-preview capability.

/// A derived preview artifact, served in place of the original bytes.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub mime_type: String,
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Capability interface for producing preview artifacts.
///
/// Generation depends on external tooling, so the gateway treats it as
/// optional: when no generator is configured, or the generator declines the
/// content type, the original content is served unchanged. A generator
/// must never be required for retrieval to succeed.
pub trait ThumbnailGenerator: Send + Sync {
    /// Whether this generator can derive a preview for the content type.
    fn supports(&self, mime_type: &str) -> bool;

    /// Derive a preview; `None` degrades to the original content.
    fn generate(&self, data: &[u8], mime_type: &str) -> Option<Thumbnail>;
}
