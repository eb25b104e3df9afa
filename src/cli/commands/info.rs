//! Detail preview and stream URL handlers

use crate::config::Config;
use crate::db::Store;
use crate::models::MediaKind;
use crate::stream::stream_url;

pub async fn cmd_info(config: &Config, kind: MediaKind, id: i64) -> anyhow::Result<()> {
    let store = Store::open_read_only(&config.general.database_path).await?;

    match kind {
        MediaKind::Film => {
            let Some(film) = store.get_film(id).await? else {
                println!("Film with ID {id} not found in mirror.");
                return Ok(());
            };

            println!("Film Info");
            println!("{:-<60}", "");
            println!("Title:    {}", film.title);
            println!("ID:       {}", film.id);
            if let Some(year) = film.year {
                println!("Year:     {year}");
            }
            if let Some(date) = &film.originally_available_at {
                println!("Released: {date}");
            }
            print_common(film.rating, film.duration, &film.genres);
            print_summary(film.summary.as_deref());
        }
        MediaKind::Series => {
            let Some(series) = store.get_series(id).await? else {
                println!("Series with ID {id} not found in mirror.");
                return Ok(());
            };
            let seasons = store.list_seasons(id).await?;

            println!("Series Info");
            println!("{:-<60}", "");
            println!("Title:    {}", series.title);
            println!("ID:       {}", series.id);
            println!("Seasons:  {}", seasons.len());
            print_common(series.rating, None, &series.genres);
            print_summary(series.summary.as_deref());
        }
        MediaKind::Episode => {
            let Some(episode) = store.get_episode(id).await? else {
                println!("Episode with ID {id} not found in mirror.");
                return Ok(());
            };
            let season = store.get_season(episode.season_id).await?;

            println!("Episode Info");
            println!("{:-<60}", "");
            println!("Title:    {}", episode.title);
            println!("ID:       {}", episode.id);
            match season {
                Some(season) => println!(
                    "Episode:  S{:02}E{:02}",
                    season.season_index, episode.episode_index
                ),
                None => println!("Episode:  E{:02}", episode.episode_index),
            }
            print_common(episode.rating, episode.duration, "");
            print_summary(episode.summary.as_deref());
        }
        MediaKind::Season => {
            println!("Use `plex-mirror episodes {id}` to inspect a season.");
        }
    }

    Ok(())
}

pub async fn cmd_stream_url(config: &Config, kind: MediaKind, id: i64) -> anyhow::Result<()> {
    if !kind.is_playable() {
        anyhow::bail!("Only films and episodes have a stream URL");
    }
    config.validate()?;

    let store = Store::open_read_only(&config.general.database_path).await?;
    let part_key = match kind {
        MediaKind::Film => store.get_film(id).await?.map(|f| f.part_key),
        _ => store.get_episode(id).await?.map(|e| e.part_key),
    };

    let Some(part_key) = part_key else {
        anyhow::bail!("No {kind} with ID {id} in mirror");
    };

    let url = stream_url(&config.server.base_url, &part_key, &config.server.token)?;
    println!("{url}");
    Ok(())
}

fn print_common(rating: Option<f64>, duration: Option<i64>, genres: &str) {
    if let Some(rating) = rating {
        println!("Rating:   {rating:.1}");
    }
    if let Some(ms) = duration {
        println!("Runtime:  {} min", ms / 60_000);
    }
    if !genres.is_empty() {
        println!("Genres:   {genres}");
    }
}

fn print_summary(summary: Option<&str>) {
    if let Some(summary) = summary {
        println!();
        println!("{summary}");
    }
}
