pub use super::episodes::Entity as Episodes;
pub use super::films::Entity as Films;
pub use super::seasons::Entity as Seasons;
pub use super::series::Entity as Series;
pub use super::sync_metadata::Entity as SyncMetadata;
