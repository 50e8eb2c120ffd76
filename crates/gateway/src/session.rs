//! Identity and permission seams.
//!
//! Authentication and role management belong to the surrounding
//! application; the gateway only needs two answers from it: who is making
//! this request, and may that user download files. Both arrive through
//! trait objects so deployments can plug in their own session layer.

use async_trait::async_trait;
use http::HeaderMap;

/// Resolves the acting user from request headers.
#[async_trait]
pub trait Session: Send + Sync {
    /// The authenticated actor id, or `None` for an anonymous request.
    async fn actor(&self, headers: &HeaderMap) -> Option<i64>;
}

/// Default session: every request is anonymous.
///
/// A bare gateway has no login system, so only token-bearing remote
/// access can succeed until a real session layer is plugged in.
pub struct Anonymous;

#[async_trait]
impl Session for Anonymous {
    async fn actor(&self, _headers: &HeaderMap) -> Option<i64> {
        None
    }
}

/// Answers whether an authenticated user may download files.
#[async_trait]
pub trait Permissions: Send + Sync {
    async fn can_download(&self, actor: i64) -> bool;
}

/// Default permission policy: every authenticated user may download.
pub struct AllowAll;

#[async_trait]
impl Permissions for AllowAll {
    async fn can_download(&self, _actor: i64) -> bool {
        true
    }
}
