//! Grant issuance: mint a remote-access token with a ready-to-share URL.

use chrono::Duration;
use url::Url;

use store::{AccessAction, AccessGrant, Result};

use crate::state::State;

/// An issued grant plus the retrieval URL pre-populated with id and token.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IssuedGrant {
    pub grant: AccessGrant,
    pub href: Url,
}

impl State {
    /// Issue a remote-access grant for a file, by numeric id or link.
    ///
    /// `period` defaults to one week. The returned `href` is the fully
    /// qualified retrieval URL an anonymous recipient can open directly.
    pub async fn issue_grant(
        &self,
        id_or_link: &str,
        period: Option<Duration>,
        created_by: Option<i64>,
    ) -> Result<IssuedGrant> {
        let entry = self.registry().retrieve(id_or_link).await?;
        let grant = self.grants().grant(entry.id, period, created_by).await?;
        let href = self.file_url(entry.id, &[("token", &grant.token)]);
        Ok(IssuedGrant { grant, href })
    }

    /// Retrieval URLs for every access action, with optional extra query
    /// parameters carried through.
    pub fn action_urls(&self, file_id: i64, extra: &[(&str, &str)]) -> Vec<(AccessAction, Url)> {
        AccessAction::ALL
            .iter()
            .map(|action| {
                let mut params = vec![("action", action.as_str())];
                params.extend_from_slice(extra);
                (*action, self.file_url(file_id, &params))
            })
            .collect()
    }

    fn file_url(&self, file_id: i64, params: &[(&str, &str)]) -> Url {
        let mut url = self
            .public_url()
            .join("file")
            .expect("base url accepts a relative path");
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("id", &file_id.to_string());
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        url
    }
}
