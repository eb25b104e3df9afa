//! Film and series listing handlers

use crate::config::Config;
use crate::db::Store;
use crate::models::{FilmSort, SeriesSort};

pub async fn cmd_list_films(config: &Config, sort: FilmSort) -> anyhow::Result<()> {
    let store = Store::open_read_only(&config.general.database_path).await?;
    let films = store.list_films(sort).await?;

    if films.is_empty() {
        println!("No films mirrored.");
        println!();
        println!("Populate the mirror with: plex-mirror sync");
        return Ok(());
    }

    println!("Films ({} total)", films.len());
    println!("{:-<70}", "");

    for film in films {
        let year = film.year.map_or_else(|| "????".to_string(), |y| y.to_string());
        let rating = film.rating.map_or_else(|| "  - ".to_string(), |r| format!("{r:>4.1}"));
        println!("{:>8}  {}  {}  {}", film.id, year, rating, film.title);
        if !film.genres.is_empty() {
            println!("{:>8}  {}", "", film.genres);
        }
    }

    Ok(())
}

pub async fn cmd_list_series(config: &Config, sort: SeriesSort) -> anyhow::Result<()> {
    let store = Store::open_read_only(&config.general.database_path).await?;
    let series = store.list_series(sort).await?;

    if series.is_empty() {
        println!("No series mirrored.");
        println!();
        println!("Populate the mirror with: plex-mirror sync");
        return Ok(());
    }

    println!("Series ({} total)", series.len());
    println!("{:-<70}", "");

    for show in series {
        let rating = show.rating.map_or_else(|| "  - ".to_string(), |r| format!("{r:>4.1}"));
        println!("{:>8}  {}  {}", show.id, rating, show.title);
    }

    Ok(())
}
