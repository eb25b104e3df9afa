mod episodes;
mod info;
mod list;
mod sync;

pub use episodes::{cmd_list_episodes, cmd_list_seasons};
pub use info::{cmd_info, cmd_stream_url};
pub use list::{cmd_list_films, cmd_list_series};
pub use sync::cmd_sync;
