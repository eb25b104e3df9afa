use super::source::CatalogError;
use sea_orm::DbErr;
use thiserror::Error;

/// Fatal errors: the pass is aborted and nothing is committed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Remote catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Mirror database error: {0}")]
    Database(#[from] DbErr),

    #[error("Mirror file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single item was left out of the mirror. Never escapes the driver.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("malformed rating key {0:?}")]
    MalformedKey(String),

    #[error("no playable part")]
    MissingPart,

    #[error("fetch failed: {0}")]
    Fetch(#[from] CatalogError),

    #[error("parent {0} is not mirrored")]
    OrphanedChild(i64),
}

/// Parses a remote rating key into a mirror id.
pub fn parse_rating_key(raw: &str) -> Result<i64, ItemError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ItemError::MalformedKey(raw.to_string()))
}
