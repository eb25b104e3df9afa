use crate::entities::{prelude::*, seasons};
use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

pub struct SeasonRepository {
    conn: DatabaseConnection,
}

impl SeasonRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_series(&self, series_id: i64) -> Result<Vec<seasons::Model>> {
        let rows = Seasons::find()
            .filter(seasons::Column::SeriesId.eq(series_id))
            .order_by_asc(seasons::Column::SeasonIndex)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> Result<Option<seasons::Model>> {
        Ok(Seasons::find_by_id(id).one(&self.conn).await?)
    }
}
