//! Schema management for the mirror.
//!
//! Every statement is `IF NOT EXISTS`, so [`ensure_schema`] can run against a
//! populated store and inside the sync transaction.

use crate::entities::prelude::*;
use sea_orm::sea_query::{Alias, Expr, Query};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, FromQueryResult, Schema};

/// Tables that must exist for the mirror to be usable.
pub const MIRROR_TABLES: [&str; 5] = ["films", "series", "seasons", "episodes", "sync_metadata"];

/// Creates all mirror tables and their indexes if they are missing.
///
/// Parents are created before children so the foreign key clauses on
/// `seasons` and `episodes` resolve.
pub async fn ensure_schema<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
    create_entity(conn, Films).await?;
    create_entity(conn, Series).await?;
    create_entity(conn, Seasons).await?;
    create_entity(conn, Episodes).await?;
    create_entity(conn, SyncMetadata).await?;
    Ok(())
}

async fn create_entity<C, E>(conn: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    let table = schema
        .create_table_from_entity(entity)
        .if_not_exists()
        .to_owned();
    conn.execute(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        conn.execute(backend.build(&index)).await?;
    }

    Ok(())
}

#[derive(Debug, FromQueryResult)]
struct TableName {
    name: String,
}

/// Returns the names of mirror tables that are missing from the store.
pub async fn missing_tables<C: ConnectionTrait>(conn: &C) -> Result<Vec<String>, DbErr> {
    let backend = conn.get_database_backend();
    let query = Query::select()
        .column(Alias::new("name"))
        .from(Alias::new("sqlite_master"))
        .and_where(Expr::col(Alias::new("type")).eq("table"))
        .to_owned();

    let present: Vec<String> = TableName::find_by_statement(backend.build(&query))
        .all(conn)
        .await?
        .into_iter()
        .map(|t| t.name)
        .collect();

    Ok(MIRROR_TABLES
        .iter()
        .filter(|table| !present.iter().any(|p| p == *table))
        .map(|table| (*table).to_string())
        .collect())
}

/// Fails when any mirror table is missing.
pub async fn validate_schema<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
    let missing = missing_tables(conn).await?;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DbErr::Custom(format!(
            "mirror schema incomplete, missing tables: {}",
            missing.join(", ")
        )))
    }
}
