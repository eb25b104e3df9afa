//! Season and episode listing handlers

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_list_seasons(config: &Config, series_id: i64) -> anyhow::Result<()> {
    let store = Store::open_read_only(&config.general.database_path).await?;

    let Some(series) = store.get_series(series_id).await? else {
        println!("Series with ID {series_id} not found in mirror.");
        return Ok(());
    };

    let seasons = store.list_seasons(series_id).await?;

    println!("{} - {} seasons", series.title, seasons.len());
    println!("{:-<70}", "");

    for season in seasons {
        let episodes = store.list_episodes(season.id).await?.len();
        println!(
            "{:>8}  Season {:>2}  ({} episodes)",
            season.id, season.season_index, episodes
        );
    }

    Ok(())
}

pub async fn cmd_list_episodes(config: &Config, season_id: i64) -> anyhow::Result<()> {
    let store = Store::open_read_only(&config.general.database_path).await?;

    let Some(season) = store.get_season(season_id).await? else {
        println!("Season with ID {season_id} not found in mirror.");
        return Ok(());
    };

    let episodes = store.list_episodes(season_id).await?;

    println!("Season {} - {} episodes", season.season_index, episodes.len());
    println!("{:-<70}", "");

    for episode in episodes {
        let minutes = episode
            .duration
            .map_or_else(|| "--".to_string(), |ms| (ms / 60_000).to_string());
        println!(
            "{:>8}  E{:02}  {:>3} min  {}",
            episode.id, episode.episode_index, minutes, episode.title
        );
    }

    Ok(())
}
