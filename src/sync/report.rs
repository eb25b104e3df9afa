use crate::models::MediaKind;
use serde::Serialize;
use std::fmt;

/// How a pass reconciles the remote catalog with the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Adds unseen ids and refreshes title/year on known films and series.
    /// Never deletes.
    Incremental,
    /// Clears all tables first; the result mirrors the remote exactly.
    FullRebuild,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incremental => f.write_str("incremental"),
            Self::FullRebuild => f.write_str("full rebuild"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The mirror was younger than the threshold; nothing was contacted.
    Fresh,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl EntityCounts {
    #[must_use]
    pub const fn touched(&self) -> usize {
        self.inserted + self.updated
    }
}

/// A single item left out of the mirror for this pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub entity: MediaKind,
    pub rating_key: String,
    pub title: String,
    pub reason: String,
}

/// Summary of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub mode: Option<SyncMode>,
    pub films: EntityCounts,
    pub series: EntityCounts,
    pub seasons: EntityCounts,
    pub episodes: EntityCounts,
    pub sections_synced: usize,
    pub sections_skipped: usize,
    pub failures: Vec<ItemFailure>,
    pub elapsed_ms: u64,
}

impl SyncReport {
    /// The no-op report for a fresh mirror.
    #[must_use]
    pub const fn fresh() -> Self {
        Self {
            outcome: SyncOutcome::Fresh,
            mode: None,
            films: zero(),
            series: zero(),
            seasons: zero(),
            episodes: zero(),
            sections_synced: 0,
            sections_skipped: 0,
            failures: Vec::new(),
            elapsed_ms: 0,
        }
    }

    #[must_use]
    pub fn started(mode: SyncMode) -> Self {
        let mut report = Self::fresh();
        report.outcome = SyncOutcome::Completed;
        report.mode = Some(mode);
        report
    }

    #[must_use]
    pub const fn is_fresh_skip(&self) -> bool {
        matches!(self.outcome, SyncOutcome::Fresh)
    }

    #[must_use]
    pub fn counts(&self, entity: MediaKind) -> &EntityCounts {
        match entity {
            MediaKind::Film => &self.films,
            MediaKind::Series => &self.series,
            MediaKind::Season => &self.seasons,
            MediaKind::Episode => &self.episodes,
        }
    }

    pub fn counts_mut(&mut self, entity: MediaKind) -> &mut EntityCounts {
        match entity {
            MediaKind::Film => &mut self.films,
            MediaKind::Series => &mut self.series,
            MediaKind::Season => &mut self.seasons,
            MediaKind::Episode => &mut self.episodes,
        }
    }

    pub fn record_failure(
        &mut self,
        entity: MediaKind,
        rating_key: impl Into<String>,
        title: impl Into<String>,
        reason: impl fmt::Display,
    ) {
        self.counts_mut(entity).failed += 1;
        self.failures.push(ItemFailure {
            entity,
            rating_key: rating_key.into(),
            title: title.into(),
            reason: reason.to_string(),
        });
    }

    #[must_use]
    pub fn total_failed(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub const fn total_inserted(&self) -> usize {
        self.films.inserted + self.series.inserted + self.seasons.inserted + self.episodes.inserted
    }
}

const fn zero() -> EntityCounts {
    EntityCounts {
        inserted: 0,
        updated: 0,
        skipped: 0,
        failed: 0,
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(mode) = self.mode else {
            return write!(f, "Mirror is fresh, sync skipped");
        };

        writeln!(f, "Sync complete ({mode}) in {} ms", self.elapsed_ms)?;
        writeln!(
            f,
            "  Sections: {} synced, {} unchanged",
            self.sections_synced, self.sections_skipped
        )?;
        for (label, c) in [
            ("Films", &self.films),
            ("Series", &self.series),
            ("Seasons", &self.seasons),
            ("Episodes", &self.episodes),
        ] {
            writeln!(
                f,
                "  {label:<9} inserted {:>5}  updated {:>5}  skipped {:>5}  failed {:>3}",
                c.inserted, c.updated, c.skipped, c.failed
            )?;
        }
        for failure in &self.failures {
            writeln!(
                f,
                "  ! {} {} ({}): {}",
                failure.entity, failure.rating_key, failure.title, failure.reason
            )?;
        }
        Ok(())
    }
}
