use crate::entities::{episodes, prelude::*, seasons};
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

/// Read access to mirrored episodes.
pub struct EpisodeRepository {
    conn: DatabaseConnection,
}

impl EpisodeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_season(&self, season_id: i64) -> Result<Vec<episodes::Model>> {
        let rows = Episodes::find()
            .filter(episodes::Column::SeasonId.eq(season_id))
            .order_by_asc(episodes::Column::EpisodeIndex)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> Result<Option<episodes::Model>> {
        Ok(Episodes::find_by_id(id).one(&self.conn).await?)
    }

    /// Episodes whose season row is missing. Always empty for a consistent mirror.
    pub async fn count_orphaned(&self) -> Result<u64> {
        let count = Episodes::find()
            .left_join(Seasons)
            .filter(seasons::Column::Id.is_null())
            .count(&self.conn)
            .await?;
        Ok(count)
    }
}
