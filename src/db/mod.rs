use crate::entities::{episodes, films, prelude::*, seasons, series};
use crate::models::{FilmSort, MirrorCounts, SeriesSort};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, Statement, TransactionTrait,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub mod repositories;
pub mod schema;

/// Handle on the mirror file.
///
/// The file is switched to write-ahead logging on first connect, so one sync
/// writer and any number of readers can use it at the same time. `sqlx`
/// enables foreign keys and a 5s busy timeout on every pooled connection.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    path: PathBuf,
}

impl Store {
    /// Connects and makes sure the schema exists. Intended for readers.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self::connect(path).await?;
        schema::ensure_schema(&store.conn).await?;
        info!(path = %store.path.display(), "Mirror store ready");
        Ok(store)
    }

    /// Connects without touching the schema.
    ///
    /// The sync driver uses this so that table creation happens inside its
    /// own transaction.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, DbErr> {
        Self::with_pool_options(path, 4, 1).await
    }

    pub async fn with_pool_options(
        path: impl AsRef<Path>,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, DbErr> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DbErr::Custom(format!("cannot create {}: {e}", parent.display())))?;
        }

        let url = format!("sqlite://{}?mode=rwc", path.display());
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        conn.execute_unprepared("PRAGMA journal_mode=WAL").await?;

        debug!(
            path = %path.display(),
            "Mirror connected (pool: {}-{})",
            min_connections,
            max_connections
        );

        Ok(Self { conn, path })
    }

    /// Opens an existing mirror for queries only.
    pub async fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            anyhow::bail!(
                "Mirror not found at {} (run `plex-mirror sync` first)",
                path.display()
            );
        }

        let url = format!("sqlite://{}?mode=ro", path.display());
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(2)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        schema::validate_schema(&conn).await?;
        Ok(Self { conn, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    fn film_repo(&self) -> repositories::film::FilmRepository {
        repositories::film::FilmRepository::new(self.conn.clone())
    }

    fn series_repo(&self) -> repositories::series::SeriesRepository {
        repositories::series::SeriesRepository::new(self.conn.clone())
    }

    fn season_repo(&self) -> repositories::season::SeasonRepository {
        repositories::season::SeasonRepository::new(self.conn.clone())
    }

    fn episode_repo(&self) -> repositories::episode::EpisodeRepository {
        repositories::episode::EpisodeRepository::new(self.conn.clone())
    }

    fn metadata_repo(&self) -> repositories::metadata::MetadataRepository {
        repositories::metadata::MetadataRepository::new(self.conn.clone())
    }

    pub async fn list_films(&self, sort: FilmSort) -> Result<Vec<films::Model>> {
        self.film_repo().list(sort).await
    }

    pub async fn get_film(&self, id: i64) -> Result<Option<films::Model>> {
        self.film_repo().get(id).await
    }

    pub async fn list_series(&self, sort: SeriesSort) -> Result<Vec<series::Model>> {
        self.series_repo().list(sort).await
    }

    pub async fn get_series(&self, id: i64) -> Result<Option<series::Model>> {
        self.series_repo().get(id).await
    }

    pub async fn list_seasons(&self, series_id: i64) -> Result<Vec<seasons::Model>> {
        self.season_repo().list_for_series(series_id).await
    }

    pub async fn get_season(&self, id: i64) -> Result<Option<seasons::Model>> {
        self.season_repo().get(id).await
    }

    pub async fn list_episodes(&self, season_id: i64) -> Result<Vec<episodes::Model>> {
        self.episode_repo().list_for_season(season_id).await
    }

    pub async fn get_episode(&self, id: i64) -> Result<Option<episodes::Model>> {
        self.episode_repo().get(id).await
    }

    pub async fn count_orphaned_episodes(&self) -> Result<u64> {
        self.episode_repo().count_orphaned().await
    }

    /// Row counts of the four tables, read from a single snapshot.
    pub async fn mirror_counts(&self) -> Result<MirrorCounts> {
        let txn = self.conn.begin().await?;
        let counts = MirrorCounts {
            films: Films::find().count(&txn).await?,
            series: Series::find().count(&txn).await?,
            seasons: Seasons::find().count(&txn).await?,
            episodes: Episodes::find().count(&txn).await?,
        };
        txn.commit().await?;
        Ok(counts)
    }

    pub async fn last_sync_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.metadata_repo().last_sync_at().await
    }

    pub async fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        self.metadata_repo().get(key).await
    }
}
