//! The remote catalog as seen by the sync engine.
//!
//! Rating keys stay as the raw strings the remote reports; the engine
//! parses them and treats an unparsable key as a malformed item.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a [`CatalogSource`].
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Remote catalog rejected the credentials")]
    Unauthorized,

    #[error("Remote catalog returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Remote catalog unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected catalog response: {0}")]
    Parse(String),

    #[error("Not found in catalog: {0}")]
    NotFound(String),

    #[error("Remote catalog unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    /// The server refused the token.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionKind {
    Movie,
    Show,
    Other(String),
}

impl SectionKind {
    #[must_use]
    pub fn from_remote(kind: &str) -> Self {
        match kind {
            "movie" => Self::Movie,
            "show" => Self::Show,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A library section of the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub key: String,
    pub title: String,
    pub kind: SectionKind,
    /// Remote modification stamp (unix seconds), when reported.
    pub updated_at: Option<i64>,
}

/// A top-level item of a section: a movie or a show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogItem {
    pub rating_key: String,
    pub title: String,
    pub year: Option<i32>,
    pub summary: Option<String>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    /// Milliseconds.
    pub duration: Option<i64>,
    pub originally_available_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSeason {
    pub rating_key: String,
    pub index: i32,
    pub title: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteEpisode {
    pub rating_key: String,
    pub index: i32,
    pub title: String,
    pub summary: Option<String>,
    pub duration: Option<i64>,
    pub rating: Option<f64>,
}

/// Read access to a pre-authenticated remote catalog.
///
/// Each listing is finite and is walked once per sync pass. The first call
/// of a pass is [`CatalogSource::list_sections`]; its failure aborts the run.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_sections(&self) -> Result<Vec<Section>, CatalogError>;

    async fn list_items(&self, section: &Section) -> Result<Vec<CatalogItem>, CatalogError>;

    /// Seasons of a show, ascending by index.
    async fn list_seasons(&self, show: &CatalogItem) -> Result<Vec<RemoteSeason>, CatalogError>;

    /// Episodes of a season, ascending by index.
    async fn list_episodes(
        &self,
        season: &RemoteSeason,
    ) -> Result<Vec<RemoteEpisode>, CatalogError>;

    /// Part reference of a movie or episode. `Ok(None)` when it has no playable part.
    async fn fetch_part(&self, rating_key: &str) -> Result<Option<String>, CatalogError>;
}
