//! AccessLog: append-only record of every successful file access.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::database::Database;
use crate::error::{Result, StoreError};

/// The closed set of access actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessAction {
    Download,
    Preview,
    Inline,
}

impl AccessAction {
    /// Every action, in gate-evaluation order.
    pub const ALL: [AccessAction; 3] = [
        AccessAction::Download,
        AccessAction::Preview,
        AccessAction::Inline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessAction::Download => "download",
            AccessAction::Preview => "preview",
            AccessAction::Inline => "inline",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "download" => Ok(AccessAction::Download),
            "preview" => Ok(AccessAction::Preview),
            "inline" => Ok(AccessAction::Inline),
            other => Err(StoreError::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for AccessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessAction {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// One recorded access.
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub id: i64,
    pub file_id: i64,
    pub accessed_at: i64,
    /// `None` is the anonymous sentinel.
    pub accessed_by: Option<i64>,
    pub action: AccessAction,
    pub ip_address: String,
    pub host_name: String,
}

/// Append-only access logger.
#[derive(Debug, Clone)]
pub struct AccessLog {
    db: Database,
}

impl AccessLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append one access record; `when` defaults to the current time.
    pub async fn record(
        &self,
        file_id: i64,
        action: AccessAction,
        accessed_by: Option<i64>,
        ip_address: &str,
        host_name: &str,
        when: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        let accessed_at = when.unwrap_or_else(Utc::now).timestamp();

        let done = sqlx::query(
            r#"
            INSERT INTO access_log (file_id, accessed_at, accessed_by, action, ip_address, host_name)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(file_id)
        .bind(accessed_at)
        .bind(accessed_by)
        .bind(action.as_str())
        .bind(ip_address)
        .bind(host_name)
        .execute(self.db.pool())
        .await?;

        Ok(done.last_insert_rowid())
    }

    /// Number of recorded accesses for one file.
    pub async fn count_for(&self, file_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM access_log WHERE file_id = ?")
            .bind(file_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(row.get("count"))
    }

    /// Access history for one file, most recent first.
    pub async fn list_for(&self, file_id: i64) -> Result<Vec<AccessLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, file_id, accessed_at, accessed_by, action, ip_address, host_name
            FROM access_log
            WHERE file_id = ?
            ORDER BY accessed_at DESC, id DESC
            "#,
        )
        .bind(file_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let action: String = row.get("action");
            entries.push(AccessLogEntry {
                id: row.get("id"),
                file_id: row.get("file_id"),
                accessed_at: row.get("accessed_at"),
                accessed_by: row.get("accessed_by"),
                action: AccessAction::parse(&action)?,
                ip_address: row.get("ip_address"),
                host_name: row.get("host_name"),
            });
        }
        Ok(entries)
    }
}
