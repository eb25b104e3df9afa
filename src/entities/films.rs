use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "films")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    #[sea_orm(indexed)]
    pub title: String,
    #[sea_orm(indexed)]
    pub year: Option<i32>,
    pub part_key: String,
    pub duration: Option<i64>,
    pub summary: Option<String>,
    pub rating: Option<f64>,
    /// Comma-joined genre tags, e.g. "Drama, Thriller".
    pub genres: String,
    #[sea_orm(column_name = "originallyAvailableAt")]
    pub originally_available_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
