use crate::entities::{prelude::*, series};
use crate::models::SeriesSort;
use anyhow::Result;
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{DatabaseConnection, EntityTrait, Order, QueryOrder};

pub struct SeriesRepository {
    conn: DatabaseConnection,
}

impl SeriesRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, sort: SeriesSort) -> Result<Vec<series::Model>> {
        let by_title = Expr::cust("title COLLATE NOCASE");
        let query = match sort {
            SeriesSort::Title => Series::find().order_by(by_title, Order::Asc),
            SeriesSort::Rating => Series::find()
                .order_by_with_nulls(series::Column::Rating, Order::Desc, NullOrdering::Last)
                .order_by(by_title, Order::Asc),
        };
        Ok(query.all(&self.conn).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<series::Model>> {
        Ok(Series::find_by_id(id).one(&self.conn).await?)
    }
}
