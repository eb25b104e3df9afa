//! Catalog synchronization engine.
//!
//! [`SyncDriver::run`] checks the [`FreshnessGate`], walks the remote
//! [`CatalogSource`], reconciles it with the mirror through the [`Merger`]
//! and commits everything in one transaction via the [`MirrorWriter`].

pub mod driver;
pub mod error;
pub mod freshness;
pub mod merger;
pub mod report;
pub mod source;
pub mod writer;

pub use driver::{SyncDriver, SyncSettings};
pub use error::{ItemError, SyncError};
pub use freshness::{Freshness, FreshnessGate};
pub use merger::{Decision, ExistingIds, Merger};
pub use report::{EntityCounts, ItemFailure, SyncMode, SyncOutcome, SyncReport};
pub use source::{
    CatalogError, CatalogItem, CatalogSource, RemoteEpisode, RemoteSeason, Section, SectionKind,
};
pub use writer::MirrorWriter;
