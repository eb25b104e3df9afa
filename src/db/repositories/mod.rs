pub mod episode;
pub mod film;
pub mod metadata;
pub mod season;
pub mod series;
