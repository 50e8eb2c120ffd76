//! The access gate: ordered policies deciding who may retrieve a file.
//!
//! Every retrieval request is evaluated against a ranked list of policies.
//! A policy wins when it admits the actor class, allows the requested
//! action, and independently authorizes the request. The first win serves;
//! exhaustion means an opaque 401.

use std::sync::Arc;

use async_trait::async_trait;

use store::{AccessAction, AccessGrants};

use crate::session::Permissions;

/// What the gate knows about one retrieval request.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    /// Raw `id` query parameter - numeric id or link string.
    pub id: String,
    /// Entry id when the raw parameter resolved, `None` otherwise.
    pub file_id: Option<i64>,
    pub action: AccessAction,
    pub token: Option<String>,
    /// Authenticated actor, `None` for anonymous requests.
    pub actor: Option<i64>,
}

/// One access policy in the gate's evaluation order.
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    /// Policies for logged-in users reject anonymous actors outright.
    fn for_users_only(&self) -> bool {
        true
    }

    /// Actions this policy may admit.
    fn allowed_actions(&self) -> &[AccessAction] {
        &AccessAction::ALL
    }

    /// Policy-specific authorization of the concrete request.
    async fn authorize(&self, request: &AccessRequest) -> bool;
}

/// Evaluate policies in order; the first one that admits the actor class,
/// allows the action and authorizes the request wins.
pub async fn evaluate(policies: &[Box<dyn AccessPolicy>], request: &AccessRequest) -> bool {
    for policy in policies {
        if policy.for_users_only() && request.actor.is_none() {
            continue;
        }
        if !policy.allowed_actions().contains(&request.action) {
            continue;
        }
        if policy.authorize(request).await {
            return true;
        }
    }
    false
}

/// Grants authenticated users whatever the permission layer allows.
pub struct UserAccessPolicy {
    permissions: Arc<dyn Permissions>,
}

impl UserAccessPolicy {
    pub fn new(permissions: Arc<dyn Permissions>) -> Self {
        Self { permissions }
    }
}

#[async_trait]
impl AccessPolicy for UserAccessPolicy {
    async fn authorize(&self, request: &AccessRequest) -> bool {
        match request.actor {
            Some(actor) => self.permissions.can_download(actor).await,
            None => false,
        }
    }
}

/// Grants anonymous download access against a valid remote-access token.
pub struct RemoteAccessPolicy {
    grants: AccessGrants,
}

/// Remote tokens only ever authorize plain downloads.
const REMOTE_ACTIONS: [AccessAction; 1] = [AccessAction::Download];

impl RemoteAccessPolicy {
    pub fn new(grants: AccessGrants) -> Self {
        Self { grants }
    }
}

#[async_trait]
impl AccessPolicy for RemoteAccessPolicy {
    fn for_users_only(&self) -> bool {
        false
    }

    fn allowed_actions(&self) -> &[AccessAction] {
        &REMOTE_ACTIONS
    }

    /// The token check never throws: an unresolvable id or a storage
    /// hiccup is a negative result, decided before any file resolution.
    async fn authorize(&self, request: &AccessRequest) -> bool {
        match (request.file_id, request.token.as_deref()) {
            (Some(file_id), Some(token)) => self.grants.check(file_id, token).await,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(bool);

    #[async_trait]
    impl AccessPolicy for Always {
        fn for_users_only(&self) -> bool {
            false
        }
        async fn authorize(&self, _request: &AccessRequest) -> bool {
            self.0
        }
    }

    struct UsersOnly;

    #[async_trait]
    impl AccessPolicy for UsersOnly {
        async fn authorize(&self, _request: &AccessRequest) -> bool {
            true
        }
    }

    fn request(actor: Option<i64>, action: AccessAction) -> AccessRequest {
        AccessRequest {
            id: "1".into(),
            file_id: Some(1),
            action,
            token: None,
            actor,
        }
    }

    #[tokio::test]
    async fn test_first_winning_policy_serves() {
        let policies: Vec<Box<dyn AccessPolicy>> =
            vec![Box::new(Always(false)), Box::new(Always(true))];
        assert!(evaluate(&policies, &request(None, AccessAction::Download)).await);
    }

    #[tokio::test]
    async fn test_exhaustion_denies() {
        let policies: Vec<Box<dyn AccessPolicy>> = vec![Box::new(Always(false))];
        assert!(!evaluate(&policies, &request(None, AccessAction::Download)).await);
    }

    #[tokio::test]
    async fn test_users_only_policy_skips_anonymous() {
        let policies: Vec<Box<dyn AccessPolicy>> = vec![Box::new(UsersOnly)];
        assert!(!evaluate(&policies, &request(None, AccessAction::Download)).await);
        assert!(evaluate(&policies, &request(Some(5), AccessAction::Download)).await);
    }
}
