//! Reconciles remote items against the rows already in the mirror.
//!
//! The merger never touches the store. It classifies each remote id and
//! stages the resulting rows; [`super::writer::MirrorWriter`] applies them.

use super::report::SyncMode;
use crate::entities::{episodes, films, seasons, series};
use crate::models::MediaKind;
use std::collections::HashSet;

/// Ids present in the mirror when the pass started, one set per table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingIds {
    pub films: HashSet<i64>,
    pub series: HashSet<i64>,
    pub seasons: HashSet<i64>,
    pub episodes: HashSet<i64>,
}

impl ExistingIds {
    fn set(&self, entity: MediaKind) -> &HashSet<i64> {
        match entity {
            MediaKind::Film => &self.films,
            MediaKind::Series => &self.series,
            MediaKind::Season => &self.seasons,
            MediaKind::Episode => &self.episodes,
        }
    }

    #[must_use]
    pub fn contains(&self, entity: MediaKind, id: i64) -> bool {
        self.set(entity).contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.films.len() + self.series.len() + self.seasons.len() + self.episodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What to do with one remote id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Unknown id: fetch full attributes and insert.
    Insert,
    /// Known film or series: refresh its title-class fields.
    Update,
    /// Known season/episode, or an id already handled in this pass.
    Skip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilmUpdate {
    pub id: i64,
    pub title: String,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesUpdate {
    pub id: i64,
    pub title: String,
}

/// Mutations accumulated during traversal, applied parents first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedChanges {
    pub film_inserts: Vec<films::Model>,
    pub film_updates: Vec<FilmUpdate>,
    pub series_inserts: Vec<series::Model>,
    pub series_updates: Vec<SeriesUpdate>,
    pub season_inserts: Vec<seasons::Model>,
    pub episode_inserts: Vec<episodes::Model>,
    /// `(section key, remote updatedAt)` for sections that synced cleanly.
    pub section_markers: Vec<(String, i64)>,
}

impl StagedChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.film_inserts.is_empty()
            && self.film_updates.is_empty()
            && self.series_inserts.is_empty()
            && self.series_updates.is_empty()
            && self.season_inserts.is_empty()
            && self.episode_inserts.is_empty()
    }
}

#[derive(Debug)]
pub struct Merger {
    existing: ExistingIds,
    seen: ExistingIds,
    staged_parents: ExistingIds,
    staged: StagedChanges,
}

impl Merger {
    /// In full-rebuild mode the existing set is ignored.
    #[must_use]
    pub fn new(mode: SyncMode, existing: ExistingIds) -> Self {
        let existing = match mode {
            SyncMode::Incremental => existing,
            SyncMode::FullRebuild => ExistingIds::default(),
        };
        Self {
            existing,
            seen: ExistingIds::default(),
            staged_parents: ExistingIds::default(),
            staged: StagedChanges::default(),
        }
    }

    /// Classifies a remote id. Each id is handed out at most once per pass.
    pub fn decide(&mut self, entity: MediaKind, id: i64) -> Decision {
        let first_sighting = match entity {
            MediaKind::Film => self.seen.films.insert(id),
            MediaKind::Series => self.seen.series.insert(id),
            MediaKind::Season => self.seen.seasons.insert(id),
            MediaKind::Episode => self.seen.episodes.insert(id),
        };
        if !first_sighting {
            return Decision::Skip;
        }

        if !self.existing.contains(entity, id) {
            return Decision::Insert;
        }

        match entity {
            MediaKind::Film | MediaKind::Series => Decision::Update,
            MediaKind::Season | MediaKind::Episode => Decision::Skip,
        }
    }

    /// True when a row with this id exists or will exist once staged changes apply.
    #[must_use]
    pub fn is_mirrored(&self, entity: MediaKind, id: i64) -> bool {
        self.existing.contains(entity, id) || self.staged_parents.contains(entity, id)
    }

    pub fn stage_film(&mut self, row: films::Model) {
        self.staged.film_inserts.push(row);
    }

    pub fn stage_film_update(&mut self, update: FilmUpdate) {
        self.staged.film_updates.push(update);
    }

    pub fn stage_series(&mut self, row: series::Model) {
        self.staged_parents.series.insert(row.id);
        self.staged.series_inserts.push(row);
    }

    pub fn stage_series_update(&mut self, update: SeriesUpdate) {
        self.staged.series_updates.push(update);
    }

    pub fn stage_season(&mut self, row: seasons::Model) {
        self.staged_parents.seasons.insert(row.id);
        self.staged.season_inserts.push(row);
    }

    pub fn stage_episode(&mut self, row: episodes::Model) {
        self.staged.episode_inserts.push(row);
    }

    pub fn stage_section_marker(&mut self, section_key: &str, updated_at: i64) {
        self.staged
            .section_markers
            .push((section_key.to_string(), updated_at));
    }

    #[must_use]
    pub fn staged(&self) -> &StagedChanges {
        &self.staged
    }

    #[must_use]
    pub fn into_staged(self) -> StagedChanges {
        self.staged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> ExistingIds {
        ExistingIds {
            films: HashSet::from([1, 2]),
            series: HashSet::from([10]),
            seasons: HashSet::from([100]),
            episodes: HashSet::from([1000]),
        }
    }

    fn series_row(id: i64) -> series::Model {
        series::Model {
            id,
            title: "Show".to_string(),
            summary: None,
            rating: None,
            genres: String::new(),
        }
    }

    #[test]
    fn test_incremental_new_ids_are_inserted() {
        let mut merger = Merger::new(SyncMode::Incremental, existing());
        assert_eq!(merger.decide(MediaKind::Film, 3), Decision::Insert);
        assert_eq!(merger.decide(MediaKind::Episode, 1001), Decision::Insert);
    }

    #[test]
    fn test_incremental_known_films_and_series_are_updated() {
        let mut merger = Merger::new(SyncMode::Incremental, existing());
        assert_eq!(merger.decide(MediaKind::Film, 1), Decision::Update);
        assert_eq!(merger.decide(MediaKind::Series, 10), Decision::Update);
    }

    #[test]
    fn test_incremental_known_seasons_and_episodes_are_skipped() {
        let mut merger = Merger::new(SyncMode::Incremental, existing());
        assert_eq!(merger.decide(MediaKind::Season, 100), Decision::Skip);
        assert_eq!(merger.decide(MediaKind::Episode, 1000), Decision::Skip);
    }

    #[test]
    fn test_full_rebuild_inserts_everything() {
        let mut merger = Merger::new(SyncMode::FullRebuild, existing());
        assert_eq!(merger.decide(MediaKind::Film, 1), Decision::Insert);
        assert_eq!(merger.decide(MediaKind::Season, 100), Decision::Insert);
        assert!(!merger.is_mirrored(MediaKind::Series, 10));
    }

    #[test]
    fn test_repeated_id_is_handled_once() {
        let mut merger = Merger::new(SyncMode::FullRebuild, ExistingIds::default());
        assert_eq!(merger.decide(MediaKind::Film, 7), Decision::Insert);
        assert_eq!(merger.decide(MediaKind::Film, 7), Decision::Skip);
        // Same numeric id in another table is unrelated.
        assert_eq!(merger.decide(MediaKind::Series, 7), Decision::Insert);
    }

    #[test]
    fn test_staged_parents_count_as_mirrored() {
        let mut merger = Merger::new(SyncMode::Incremental, existing());
        assert!(merger.is_mirrored(MediaKind::Series, 10));
        assert!(!merger.is_mirrored(MediaKind::Series, 11));

        merger.stage_series(series_row(11));
        assert!(merger.is_mirrored(MediaKind::Series, 11));
        assert_eq!(merger.staged().series_inserts.len(), 1);
        assert!(!merger.staged().is_empty());
    }

    #[test]
    fn test_existing_ids_len() {
        assert_eq!(existing().len(), 5);
        assert!(ExistingIds::default().is_empty());
    }
}
