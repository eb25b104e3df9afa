use crate::entities::{prelude::*, sync_metadata};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait};

pub const LAST_SYNC_KEY: &str = "last_sync_at";
pub const SECTION_KEY_PREFIX: &str = "section_";

/// Metadata key holding the remote `updatedAt` of a section.
#[must_use]
pub fn section_marker_key(section_key: &str) -> String {
    format!("{SECTION_KEY_PREFIX}{section_key}")
}

pub struct MetadataRepository {
    conn: DatabaseConnection,
}

impl MetadataRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = SyncMetadata::find_by_id(key.to_string())
            .one(&self.conn)
            .await?;
        Ok(row.map(|m: sync_metadata::Model| m.value))
    }

    pub async fn last_sync_at(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(value) = self.get(LAST_SYNC_KEY).await? else {
            return Ok(None);
        };
        let parsed = DateTime::parse_from_rfc3339(&value)?.with_timezone(&Utc);
        Ok(Some(parsed))
    }
}
