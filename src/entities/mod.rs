pub mod prelude;

pub mod episodes;
pub mod films;
pub mod seasons;
pub mod series;
pub mod sync_metadata;
