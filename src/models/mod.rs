pub mod media;

pub use media::{FilmSort, MediaKind, MirrorCounts, SeriesSort};
