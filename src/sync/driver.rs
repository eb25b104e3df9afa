use super::error::{ItemError, SyncError, parse_rating_key};
use super::freshness::{Freshness, FreshnessGate, mirror_last_modified};
use super::merger::{Decision, ExistingIds, FilmUpdate, Merger, SeriesUpdate};
use super::report::{SyncMode, SyncReport};
use super::source::{CatalogItem, CatalogSource, RemoteSeason, Section, SectionKind};
use super::writer::MirrorWriter;
use crate::db::{Store, schema};
use crate::entities::{episodes, films, seasons, series};
use crate::models::{MediaKind, media::join_genres};
use chrono::Utc;
use sea_orm::TransactionTrait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tracing::{debug, info, warn};

/// Explicit configuration of one driver. Nothing is read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub base_url: String,
    pub auth_token: String,
    pub freshness_threshold_seconds: u64,
    pub force_rebuild: bool,
}

impl SyncSettings {
    #[must_use]
    pub fn gate(&self) -> FreshnessGate {
        FreshnessGate::from_secs(self.freshness_threshold_seconds)
    }
}

pub struct SyncDriver {
    catalog: Arc<dyn CatalogSource>,
    settings: SyncSettings,
    database_path: PathBuf,
}

impl SyncDriver {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        settings: SyncSettings,
        database_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            settings,
            database_path: database_path.into(),
        }
    }

    /// Runs one pass.
    ///
    /// Forced runs rebuild the mirror from scratch; gate-passed runs merge
    /// incrementally. Fatal errors leave the mirror exactly as it was.
    pub async fn run(&self, force_rebuild: bool) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let force = force_rebuild || self.settings.force_rebuild;

        if !force {
            let gate = self.settings.gate();
            let last_modified = mirror_last_modified(&self.database_path)?;
            match gate.evaluate(last_modified, SystemTime::now()) {
                Freshness::Fresh { age } => {
                    info!(
                        path = %self.database_path.display(),
                        age_secs = age.as_secs(),
                        max_age_secs = gate.max_age().as_secs(),
                        "Mirror is fresh, skipping sync"
                    );
                    return Ok(SyncReport::fresh());
                }
                Freshness::Stale { age } => {
                    debug!(age_secs = ?age.map(|a| a.as_secs()), "Mirror is stale");
                }
            }
        }

        let mode = if force {
            SyncMode::FullRebuild
        } else {
            SyncMode::Incremental
        };

        info!(%mode, server = %self.settings.base_url, "Starting sync");

        // Reaching the catalog comes before any store work, so a dead or
        // unauthorized server never leaves a fresh empty mirror behind.
        let sections = self.catalog.list_sections().await?;
        debug!(count = sections.len(), "Listed sections");

        let store = Store::connect(&self.database_path).await?;
        let result = self.sync_into(&store, mode, &sections).await;
        if let Err(e) = store.conn.close().await {
            warn!(error = %e, "Failed to close mirror connection");
        }

        let mut report = result?;
        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            %mode,
            inserted = report.total_inserted(),
            failed = report.total_failed(),
            sections = report.sections_synced,
            unchanged_sections = report.sections_skipped,
            elapsed_ms = report.elapsed_ms,
            "Sync complete"
        );

        Ok(report)
    }

    async fn sync_into(
        &self,
        store: &Store,
        mode: SyncMode,
        sections: &[Section],
    ) -> Result<SyncReport, SyncError> {
        let txn = store.conn.begin().await?;
        schema::ensure_schema(&txn).await?;

        let writer = MirrorWriter::new(&txn);
        let (existing, markers) = match mode {
            SyncMode::FullRebuild => {
                writer.clear_all().await?;
                let dropped = writer.clear_section_markers().await?;
                debug!(dropped, "Cleared section markers");
                (ExistingIds::default(), HashMap::new())
            }
            SyncMode::Incremental => (
                writer.load_existing_ids().await?,
                writer.section_markers().await?,
            ),
        };
        debug!(existing = existing.len(), "Loaded mirror ids");

        let mut merger = Merger::new(mode, existing);
        let mut report = SyncReport::started(mode);

        for section in sections {
            if let SectionKind::Other(kind) = &section.kind {
                debug!(section = %section.title, kind, "Ignoring unsupported section");
                continue;
            }

            if is_unchanged(mode, section, &markers) {
                debug!(section = %section.title, "Section unchanged since last sync");
                report.sections_skipped += 1;
                continue;
            }

            let failures_before = report.total_failed();
            match section.kind {
                SectionKind::Movie => self.sync_films(section, &mut merger, &mut report).await,
                SectionKind::Show => self.sync_shows(section, &mut merger, &mut report).await,
                SectionKind::Other(_) => {}
            }
            report.sections_synced += 1;

            if report.total_failed() == failures_before
                && let Some(updated_at) = section.updated_at
            {
                merger.stage_section_marker(&section.key, updated_at);
            }
        }

        writer.apply(merger.into_staged()).await?;
        writer.record_last_sync(Utc::now()).await?;
        txn.commit().await?;

        Ok(report)
    }

    async fn sync_films(&self, section: &Section, merger: &mut Merger, report: &mut SyncReport) {
        let items = match self.catalog.list_items(section).await {
            Ok(items) => items,
            Err(e) => {
                warn!(section = %section.title, error = %e, "Failed to list section");
                report.record_failure(MediaKind::Film, &section.key, &section.title, e);
                return;
            }
        };

        for item in &items {
            let id = match parse_rating_key(&item.rating_key) {
                Ok(id) => id,
                Err(e) => {
                    item_failed(report, MediaKind::Film, &item.rating_key, &item.title, &e);
                    continue;
                }
            };

            match merger.decide(MediaKind::Film, id) {
                Decision::Skip => report.films.skipped += 1,
                Decision::Update => {
                    merger.stage_film_update(FilmUpdate {
                        id,
                        title: item.title.clone(),
                        year: item.year,
                    });
                    report.films.updated += 1;
                }
                Decision::Insert => match self.resolve_part(&item.rating_key).await {
                    Ok(part_key) => {
                        debug!(rating_key = id, title = %item.title, "Staging film");
                        merger.stage_film(film_row(id, item, part_key));
                        report.films.inserted += 1;
                    }
                    Err(e) => item_failed(report, MediaKind::Film, &item.rating_key, &item.title, &e),
                },
            }
        }
    }

    async fn sync_shows(&self, section: &Section, merger: &mut Merger, report: &mut SyncReport) {
        let items = match self.catalog.list_items(section).await {
            Ok(items) => items,
            Err(e) => {
                warn!(section = %section.title, error = %e, "Failed to list section");
                report.record_failure(MediaKind::Series, &section.key, &section.title, e);
                return;
            }
        };

        for item in &items {
            let id = match parse_rating_key(&item.rating_key) {
                Ok(id) => id,
                Err(e) => {
                    item_failed(report, MediaKind::Series, &item.rating_key, &item.title, &e);
                    continue;
                }
            };

            match merger.decide(MediaKind::Series, id) {
                Decision::Skip => {
                    report.series.skipped += 1;
                    continue;
                }
                Decision::Update => {
                    merger.stage_series_update(SeriesUpdate {
                        id,
                        title: item.title.clone(),
                    });
                    report.series.updated += 1;
                }
                Decision::Insert => {
                    debug!(rating_key = id, title = %item.title, "Staging series");
                    merger.stage_series(series_row(id, item));
                    report.series.inserted += 1;
                }
            }

            self.sync_seasons(id, item, merger, report).await;
        }
    }

    async fn sync_seasons(
        &self,
        series_id: i64,
        show: &CatalogItem,
        merger: &mut Merger,
        report: &mut SyncReport,
    ) {
        let mut seasons = match self.catalog.list_seasons(show).await {
            Ok(seasons) => seasons,
            Err(e) => {
                warn!(rating_key = %show.rating_key, title = %show.title, error = %e, "Failed to list seasons");
                report.record_failure(MediaKind::Season, &show.rating_key, &show.title, e);
                return;
            }
        };
        seasons.sort_by_key(|s| s.index);

        for season in &seasons {
            let id = match parse_rating_key(&season.rating_key) {
                Ok(id) => id,
                Err(e) => {
                    item_failed(report, MediaKind::Season, &season.rating_key, &season.title, &e);
                    continue;
                }
            };

            match merger.decide(MediaKind::Season, id) {
                Decision::Insert => {
                    if !merger.is_mirrored(MediaKind::Series, series_id) {
                        let e = ItemError::OrphanedChild(series_id);
                        item_failed(report, MediaKind::Season, &season.rating_key, &season.title, &e);
                        continue;
                    }
                    merger.stage_season(seasons::Model {
                        id,
                        series_id,
                        season_index: season.index,
                        summary: season.summary.clone(),
                    });
                    report.seasons.inserted += 1;
                }
                // Seasons are immutable once mirrored, but may have gained episodes.
                Decision::Update | Decision::Skip => report.seasons.skipped += 1,
            }

            self.sync_episodes(id, season, merger, report).await;
        }
    }

    async fn sync_episodes(
        &self,
        season_id: i64,
        season: &RemoteSeason,
        merger: &mut Merger,
        report: &mut SyncReport,
    ) {
        if !merger.is_mirrored(MediaKind::Season, season_id) {
            return;
        }

        let mut episodes = match self.catalog.list_episodes(season).await {
            Ok(episodes) => episodes,
            Err(e) => {
                warn!(rating_key = %season.rating_key, title = %season.title, error = %e, "Failed to list episodes");
                report.record_failure(MediaKind::Episode, &season.rating_key, &season.title, e);
                return;
            }
        };
        episodes.sort_by_key(|e| e.index);

        for episode in &episodes {
            let id = match parse_rating_key(&episode.rating_key) {
                Ok(id) => id,
                Err(e) => {
                    item_failed(report, MediaKind::Episode, &episode.rating_key, &episode.title, &e);
                    continue;
                }
            };

            match merger.decide(MediaKind::Episode, id) {
                Decision::Insert => match self.resolve_part(&episode.rating_key).await {
                    Ok(part_key) => {
                        debug!(rating_key = id, title = %episode.title, "Staging episode");
                        merger.stage_episode(episodes::Model {
                            id,
                            season_id,
                            episode_index: episode.index,
                            title: episode.title.clone(),
                            part_key,
                            duration: episode.duration,
                            summary: episode.summary.clone(),
                            rating: episode.rating,
                        });
                        report.episodes.inserted += 1;
                    }
                    Err(e) => {
                        item_failed(report, MediaKind::Episode, &episode.rating_key, &episode.title, &e);
                    }
                },
                Decision::Update | Decision::Skip => report.episodes.skipped += 1,
            }
        }
    }

    async fn resolve_part(&self, rating_key: &str) -> Result<String, ItemError> {
        self.catalog
            .fetch_part(rating_key)
            .await?
            .filter(|part| !part.trim().is_empty())
            .ok_or(ItemError::MissingPart)
    }
}

fn is_unchanged(mode: SyncMode, section: &Section, markers: &HashMap<String, i64>) -> bool {
    if mode != SyncMode::Incremental {
        return false;
    }
    match (section.updated_at, markers.get(&section.key)) {
        (Some(remote), Some(recorded)) => remote <= *recorded,
        _ => false,
    }
}

fn item_failed(
    report: &mut SyncReport,
    entity: MediaKind,
    rating_key: &str,
    title: &str,
    error: &ItemError,
) {
    warn!(%entity, rating_key, title, error = %error, "Skipping item");
    report.record_failure(entity, rating_key, title, error);
}

fn film_row(id: i64, item: &CatalogItem, part_key: String) -> films::Model {
    films::Model {
        id,
        title: item.title.clone(),
        year: item.year,
        part_key,
        duration: item.duration,
        summary: item.summary.clone(),
        rating: item.rating,
        genres: join_genres(&item.genres),
        originally_available_at: item.originally_available_at.clone(),
    }
}

fn series_row(id: i64, item: &CatalogItem) -> series::Model {
    series::Model {
        id,
        title: item.title.clone(),
        summary: item.summary.clone(),
        rating: item.rating,
        genres: join_genres(&item.genres),
    }
}
