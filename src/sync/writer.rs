use super::merger::{ExistingIds, StagedChanges};
use crate::db::repositories::metadata::{LAST_SYNC_KEY, SECTION_KEY_PREFIX, section_marker_key};
use crate::entities::{episodes, films, prelude::*, seasons, series, sync_metadata};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QuerySelect,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Rows per INSERT. Keeps the bound parameter count well under SQLite's limit.
const INSERT_CHUNK: usize = 100;

/// All mirror writes of one pass, scoped to the pass transaction.
pub struct MirrorWriter<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> MirrorWriter<'a> {
    #[must_use]
    pub const fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Empties the four media tables, children first.
    pub async fn clear_all(&self) -> Result<(), DbErr> {
        let episodes = Episodes::delete_many().exec(self.txn).await?;
        let seasons = Seasons::delete_many().exec(self.txn).await?;
        let series = Series::delete_many().exec(self.txn).await?;
        let films = Films::delete_many().exec(self.txn).await?;

        debug!(
            films = films.rows_affected,
            series = series.rows_affected,
            seasons = seasons.rows_affected,
            episodes = episodes.rows_affected,
            "Cleared mirror tables"
        );
        Ok(())
    }

    /// Forgets every section marker, so no section is treated as unchanged
    /// until a later pass walks it without failures.
    pub async fn clear_section_markers(&self) -> Result<u64, DbErr> {
        let res = SyncMetadata::delete_many()
            .filter(sync_metadata::Column::Key.starts_with(SECTION_KEY_PREFIX))
            .exec(self.txn)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn load_existing_ids(&self) -> Result<ExistingIds, DbErr> {
        let films: Vec<i64> = Films::find()
            .select_only()
            .column(films::Column::Id)
            .into_tuple()
            .all(self.txn)
            .await?;
        let series: Vec<i64> = Series::find()
            .select_only()
            .column(series::Column::Id)
            .into_tuple()
            .all(self.txn)
            .await?;
        let seasons: Vec<i64> = Seasons::find()
            .select_only()
            .column(seasons::Column::Id)
            .into_tuple()
            .all(self.txn)
            .await?;
        let episodes: Vec<i64> = Episodes::find()
            .select_only()
            .column(episodes::Column::Id)
            .into_tuple()
            .all(self.txn)
            .await?;

        Ok(ExistingIds {
            films: films.into_iter().collect::<HashSet<_>>(),
            series: series.into_iter().collect(),
            seasons: seasons.into_iter().collect(),
            episodes: episodes.into_iter().collect(),
        })
    }

    /// Stored `updatedAt` per section key. Unparsable values are ignored.
    pub async fn section_markers(&self) -> Result<HashMap<String, i64>, DbErr> {
        let rows = SyncMetadata::find()
            .filter(sync_metadata::Column::Key.starts_with(SECTION_KEY_PREFIX))
            .all(self.txn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let section = row.key.strip_prefix(SECTION_KEY_PREFIX)?.to_string();
                let stamp = row.value.parse::<i64>().ok()?;
                Some((section, stamp))
            })
            .collect())
    }

    /// Applies staged rows parents first, then the in-place updates.
    pub async fn apply(&self, staged: StagedChanges) -> Result<(), DbErr> {
        let StagedChanges {
            film_inserts,
            film_updates,
            series_inserts,
            series_updates,
            season_inserts,
            episode_inserts,
            section_markers,
        } = staged;

        for chunk in film_inserts.chunks(INSERT_CHUNK) {
            Films::insert_many(chunk.iter().cloned().map(film_row))
                .exec_without_returning(self.txn)
                .await?;
        }
        for chunk in series_inserts.chunks(INSERT_CHUNK) {
            Series::insert_many(chunk.iter().cloned().map(series_row))
                .exec_without_returning(self.txn)
                .await?;
        }
        for chunk in season_inserts.chunks(INSERT_CHUNK) {
            Seasons::insert_many(chunk.iter().cloned().map(season_row))
                .exec_without_returning(self.txn)
                .await?;
        }
        for chunk in episode_inserts.chunks(INSERT_CHUNK) {
            Episodes::insert_many(chunk.iter().cloned().map(episode_row))
                .exec_without_returning(self.txn)
                .await?;
        }

        for update in film_updates {
            Films::update_many()
                .col_expr(films::Column::Title, Expr::value(update.title))
                .col_expr(films::Column::Year, Expr::value(update.year))
                .filter(films::Column::Id.eq(update.id))
                .exec(self.txn)
                .await?;
        }
        for update in series_updates {
            Series::update_many()
                .col_expr(series::Column::Title, Expr::value(update.title))
                .filter(series::Column::Id.eq(update.id))
                .exec(self.txn)
                .await?;
        }

        for (section, updated_at) in section_markers {
            self.put_metadata(&section_marker_key(&section), updated_at.to_string())
                .await?;
        }

        Ok(())
    }

    pub async fn record_last_sync(&self, at: DateTime<Utc>) -> Result<(), DbErr> {
        self.put_metadata(LAST_SYNC_KEY, at.to_rfc3339()).await
    }

    async fn put_metadata(&self, key: &str, value: String) -> Result<(), DbErr> {
        let row = sync_metadata::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
        };

        SyncMetadata::insert(row)
            .on_conflict(
                OnConflict::column(sync_metadata::Column::Key)
                    .update_column(sync_metadata::Column::Value)
                    .to_owned(),
            )
            .exec_without_returning(self.txn)
            .await?;
        Ok(())
    }
}

fn film_row(m: films::Model) -> films::ActiveModel {
    films::ActiveModel {
        id: Set(m.id),
        title: Set(m.title),
        year: Set(m.year),
        part_key: Set(m.part_key),
        duration: Set(m.duration),
        summary: Set(m.summary),
        rating: Set(m.rating),
        genres: Set(m.genres),
        originally_available_at: Set(m.originally_available_at),
    }
}

fn series_row(m: series::Model) -> series::ActiveModel {
    series::ActiveModel {
        id: Set(m.id),
        title: Set(m.title),
        summary: Set(m.summary),
        rating: Set(m.rating),
        genres: Set(m.genres),
    }
}

fn season_row(m: seasons::Model) -> seasons::ActiveModel {
    seasons::ActiveModel {
        id: Set(m.id),
        series_id: Set(m.series_id),
        season_index: Set(m.season_index),
        summary: Set(m.summary),
    }
}

fn episode_row(m: episodes::Model) -> episodes::ActiveModel {
    episodes::ActiveModel {
        id: Set(m.id),
        season_id: Set(m.season_id),
        episode_index: Set(m.episode_index),
        title: Set(m.title),
        part_key: Set(m.part_key),
        duration: Set(m.duration),
        summary: Set(m.summary),
        rating: Set(m.rating),
    }
}
