pub mod plex;

pub use plex::PlexClient;
