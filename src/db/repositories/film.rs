use crate::entities::{films, prelude::*};
use crate::models::FilmSort;
use anyhow::Result;
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{DatabaseConnection, EntityTrait, Order, QueryOrder, Select};

pub struct FilmRepository {
    conn: DatabaseConnection,
}

impl FilmRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn sorted(sort: FilmSort) -> Select<Films> {
        let by_title = Expr::cust("title COLLATE NOCASE");
        match sort {
            FilmSort::Title => Films::find().order_by(by_title, Order::Asc),
            FilmSort::Rating => Films::find()
                .order_by_with_nulls(films::Column::Rating, Order::Desc, NullOrdering::Last)
                .order_by(by_title, Order::Asc),
            FilmSort::Year => Films::find()
                .order_by_with_nulls(films::Column::Year, Order::Desc, NullOrdering::Last)
                .order_by(by_title, Order::Asc),
        }
    }

    pub async fn list(&self, sort: FilmSort) -> Result<Vec<films::Model>> {
        let rows = Self::sorted(sort).all(&self.conn).await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> Result<Option<films::Model>> {
        let row = Films::find_by_id(id).one(&self.conn).await?;
        Ok(row)
    }
}
