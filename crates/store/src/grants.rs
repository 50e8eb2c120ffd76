//! AccessGrants: time-boxed, token-authenticated remote access to one entry.
//!
//! A grant lets an anonymous caller download a single file until its expiry.
//! There is no background reaper; expiry is checked lazily at validation
//! time, and revocation hard-deletes the row.

use chrono::{DateTime, Duration, Utc};
use sqlx::Row;
use tracing::{info, warn};

use crate::database::Database;
use crate::error::Result;

/// Default validity period for a new grant: one week.
pub const DEFAULT_GRANT_PERIOD_SECS: i64 = 7 * 24 * 60 * 60;

/// Token length in random bytes; hex-encoded to twice as many characters.
const TOKEN_BYTES: usize = 16;

/// One issued remote-access grant.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AccessGrant {
    pub id: i64,
    pub file_id: i64,
    pub token: String,
    pub created_by: Option<i64>,
    pub expires_at: i64,
    pub created_at: i64,
}

impl AccessGrant {
    /// Expiry as a wall-clock timestamp.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}

/// Manager for remote-access grants.
#[derive(Debug, Clone)]
pub struct AccessGrants {
    db: Database,
}

impl AccessGrants {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Issue a grant for a file entry, valid for `period` from now
    /// (defaults to one week).
    pub async fn grant(
        &self,
        file_id: i64,
        period: Option<Duration>,
        created_by: Option<i64>,
    ) -> Result<AccessGrant> {
        self.grant_at(file_id, period, created_by, Utc::now()).await
    }

    /// Issue a grant anchored at an explicit `now`.
    pub async fn grant_at(
        &self,
        file_id: i64,
        period: Option<Duration>,
        created_by: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<AccessGrant> {
        let period = period.unwrap_or_else(|| Duration::seconds(DEFAULT_GRANT_PERIOD_SECS));
        let token = new_token();
        let expires_at = (now + period).timestamp();
        let created_at = now.timestamp();

        let done = sqlx::query(
            r#"
            INSERT INTO grants (file_id, token, created_by, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(file_id)
        .bind(&token)
        .bind(created_by)
        .bind(expires_at)
        .bind(created_at)
        .execute(self.db.pool())
        .await?;

        let id = done.last_insert_rowid();
        info!(file_id, grant = id, expires_at, "remote access granted");

        Ok(AccessGrant {
            id,
            file_id,
            token,
            created_by,
            expires_at,
            created_at,
        })
    }

    /// True iff a grant exists with this exact `(file_id, token)` pair and
    /// its expiry is strictly in the future.
    ///
    /// Never throws: infrastructure failures are a negative result, logged
    /// for the operator. No caching, so revocation and expiry take effect
    /// immediately.
    pub async fn check(&self, file_id: i64, token: &str) -> bool {
        self.check_at(file_id, token, Utc::now()).await
    }

    /// Validity check against an explicit `now`.
    pub async fn check_at(&self, file_id: i64, token: &str, now: DateTime<Utc>) -> bool {
        let result = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM grants
            WHERE file_id = ? AND token = ? AND expires_at > ?
            "#,
        )
        .bind(file_id)
        .bind(token)
        .bind(now.timestamp())
        .fetch_one(self.db.pool())
        .await;

        match result {
            Ok(row) => row.get::<i64, _>("count") > 0,
            Err(err) => {
                warn!(file_id, error = %err, "grant check failed");
                false
            }
        }
    }

    /// Revoke a grant. Subsequent checks for its token return false.
    pub async fn revoke(&self, grant_id: i64) -> Result<bool> {
        let done = sqlx::query("DELETE FROM grants WHERE id = ?")
            .bind(grant_id)
            .execute(self.db.pool())
            .await?;

        let removed = done.rows_affected() > 0;
        if removed {
            info!(grant = grant_id, "remote access revoked");
        }
        Ok(removed)
    }
}

/// Generate a fresh random token using a cryptographically secure RNG.
fn new_token() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    getrandom::getrandom(&mut buf).expect("failed to generate random bytes");
    hex::encode(buf)
}
