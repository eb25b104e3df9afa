//! Command-line interface for plex-mirror.

mod commands;

use crate::models::{FilmSort, MediaKind, SeriesSort};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// plex-mirror - Local SQLite mirror of a Plex Media Server catalog
#[derive(Parser)]
#[command(name = "plex-mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to read (and write overrides back to)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Plex server address; saved to the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Plex token; saved to the config file
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refresh the mirror if it is stale (default)
    Sync {
        /// Ignore the mirror's age and rebuild it from scratch
        #[arg(long, short)]
        force: bool,
        /// Print the sync report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List mirrored films
    #[command(alias = "movies")]
    Films {
        /// title, rating or year
        #[arg(long, default_value = "title")]
        sort: FilmSort,
    },

    /// List mirrored series
    #[command(alias = "shows")]
    Series {
        /// title or rating
        #[arg(long, default_value = "title")]
        sort: SeriesSort,
    },

    /// List the seasons of a series
    Seasons { series_id: i64 },

    /// List the episodes of a season
    Episodes { season_id: i64 },

    /// Show details of a film, series or episode
    #[command(alias = "i")]
    Info { kind: MediaKind, id: i64 },

    /// Print the playable stream URL of a film or episode
    Url { kind: MediaKind, id: i64 },

    /// Create default config file
    Init,
}

pub use commands::*;
