use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator used when flattening genre tags into a single column.
pub const GENRE_SEPARATOR: &str = ", ";

/// Kind of mirrored row a caller is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Film,
    Series,
    Season,
    Episode,
}

impl MediaKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Film => "film",
            Self::Series => "series",
            Self::Season => "season",
            Self::Episode => "episode",
        }
    }

    /// Only films and episodes carry a part reference.
    #[must_use]
    pub const fn is_playable(self) -> bool {
        matches!(self, Self::Film | Self::Episode)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "film" | "movie" => Ok(Self::Film),
            "series" | "show" => Ok(Self::Series),
            "season" => Ok(Self::Season),
            "episode" => Ok(Self::Episode),
            other => Err(format!("unknown media kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilmSort {
    #[default]
    Title,
    Rating,
    Year,
}

impl FromStr for FilmSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "rating" => Ok(Self::Rating),
            "year" => Ok(Self::Year),
            other => Err(format!("unknown film sort: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeriesSort {
    #[default]
    Title,
    Rating,
}

impl FromStr for SeriesSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "rating" => Ok(Self::Rating),
            other => Err(format!("unknown series sort: {other}")),
        }
    }
}

/// Row counts of the four mirrored tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MirrorCounts {
    pub films: u64,
    pub series: u64,
    pub seasons: u64,
    pub episodes: u64,
}

impl MirrorCounts {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.films + self.series + self.seasons + self.episodes
    }
}

/// Flattens genre tags into the stored representation.
#[must_use]
pub fn join_genres<S: AsRef<str>>(genres: &[S]) -> String {
    genres
        .iter()
        .map(AsRef::as_ref)
        .filter(|g| !g.trim().is_empty())
        .collect::<Vec<_>>()
        .join(GENRE_SEPARATOR)
}

/// Splits the stored genre column back into tags.
#[must_use]
pub fn split_genres(genres: &str) -> Vec<String> {
    genres
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}
