//! Integration tests for the read-only query API over the mirror.

use plex_mirror::db::{Store, schema};
use plex_mirror::entities::{episodes, films, prelude::*, seasons, series};
use plex_mirror::models::{FilmSort, MirrorCounts, SeriesSort};
use plex_mirror::stream::stream_url;
use sea_orm::{ActiveValue::Set, EntityTrait};
use std::path::PathBuf;

fn temp_db() -> PathBuf {
    std::env::temp_dir().join(format!("plex-mirror-store-test-{}.db", uuid::Uuid::new_v4()))
}

fn film(id: i64, title: &str, year: Option<i32>, rating: Option<f64>) -> films::ActiveModel {
    films::ActiveModel {
        id: Set(id),
        title: Set(title.to_string()),
        year: Set(year),
        part_key: Set(format!("/library/parts/{id}/file.mkv")),
        duration: Set(Some(7_200_000)),
        summary: Set(None),
        rating: Set(rating),
        genres: Set("Drama".to_string()),
        originally_available_at: Set(None),
    }
}

fn show(id: i64, title: &str, rating: Option<f64>) -> series::ActiveModel {
    series::ActiveModel {
        id: Set(id),
        title: Set(title.to_string()),
        summary: Set(Some(format!("{title} summary"))),
        rating: Set(rating),
        genres: Set(String::new()),
    }
}

fn season(id: i64, series_id: i64, index: i32) -> seasons::ActiveModel {
    seasons::ActiveModel {
        id: Set(id),
        series_id: Set(series_id),
        season_index: Set(index),
        summary: Set(None),
    }
}

fn episode(id: i64, season_id: i64, index: i32) -> episodes::ActiveModel {
    episodes::ActiveModel {
        id: Set(id),
        season_id: Set(season_id),
        episode_index: Set(index),
        title: Set(format!("Episode {index}")),
        part_key: Set(format!("/library/parts/{id}/file.mkv")),
        duration: Set(Some(1_800_000)),
        summary: Set(None),
        rating: Set(None),
    }
}

async fn seeded_store() -> Store {
    let store = Store::open(temp_db()).await.unwrap();

    Films::insert_many([
        film(1, "zodiac", Some(2007), Some(7.7)),
        film(2, "Alien", Some(1979), None),
        film(3, "Memento", None, Some(8.4)),
        film(4, "brazil", Some(1985), Some(7.9)),
    ])
    .exec_without_returning(&store.conn)
    .await
    .unwrap();

    Series::insert_many([show(10, "The Wire", Some(9.3)), show(11, "atlanta", None)])
        .exec_without_returning(&store.conn)
        .await
        .unwrap();

    Seasons::insert_many([season(102, 10, 2), season(101, 10, 1)])
        .exec_without_returning(&store.conn)
        .await
        .unwrap();

    Episodes::insert_many([episode(1013, 101, 3), episode(1011, 101, 1), episode(1012, 101, 2)])
        .exec_without_returning(&store.conn)
        .await
        .unwrap();

    store
}

#[tokio::test]
async fn test_open_creates_schema() {
    let store = Store::open(temp_db()).await.unwrap();
    schema::validate_schema(&store.conn).await.unwrap();
    store.ping().await.unwrap();
    assert_eq!(store.mirror_counts().await.unwrap(), MirrorCounts::default());
    assert_eq!(store.last_sync_at().await.unwrap(), None);
}

#[tokio::test]
async fn test_open_read_only_requires_existing_mirror() {
    assert!(Store::open_read_only(temp_db()).await.is_err());

    let store = seeded_store().await;
    let path = store.path().to_path_buf();
    store.close().await.unwrap();

    let reader = Store::open_read_only(&path).await.unwrap();
    assert_eq!(reader.mirror_counts().await.unwrap().films, 4);
}

#[tokio::test]
async fn test_films_sorted_by_title_case_insensitive() {
    let store = seeded_store().await;
    let titles: Vec<String> = store
        .list_films(FilmSort::Title)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.title)
        .collect();
    assert_eq!(titles, vec!["Alien", "brazil", "Memento", "zodiac"]);
}

#[tokio::test]
async fn test_films_sorted_by_rating_nulls_last() {
    let store = seeded_store().await;
    let ids: Vec<i64> = store
        .list_films(FilmSort::Rating)
        .await
        .unwrap()
        .iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(ids, vec![3, 4, 1, 2]);
}

#[tokio::test]
async fn test_films_sorted_by_year_nulls_last() {
    let store = seeded_store().await;
    let ids: Vec<i64> = store
        .list_films(FilmSort::Year)
        .await
        .unwrap()
        .iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(ids, vec![1, 4, 2, 3]);
}

#[tokio::test]
async fn test_series_sorting() {
    let store = seeded_store().await;

    let by_title: Vec<i64> = store
        .list_series(SeriesSort::Title)
        .await
        .unwrap()
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(by_title, vec![11, 10]);

    let by_rating: Vec<i64> = store
        .list_series(SeriesSort::Rating)
        .await
        .unwrap()
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(by_rating, vec![10, 11]);
}

#[tokio::test]
async fn test_children_listed_in_index_order() {
    let store = seeded_store().await;

    let seasons: Vec<i32> = store
        .list_seasons(10)
        .await
        .unwrap()
        .iter()
        .map(|s| s.season_index)
        .collect();
    assert_eq!(seasons, vec![1, 2]);

    let episodes: Vec<i64> = store
        .list_episodes(101)
        .await
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(episodes, vec![1011, 1012, 1013]);

    assert!(store.list_seasons(11).await.unwrap().is_empty());
    assert!(store.list_episodes(102).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_detail_lookups() {
    let store = seeded_store().await;

    let memento = store.get_film(3).await.unwrap().unwrap();
    assert_eq!(memento.title, "Memento");
    assert_eq!(memento.year, None);

    let wire = store.get_series(10).await.unwrap().unwrap();
    assert_eq!(wire.summary.as_deref(), Some("The Wire summary"));

    let ep = store.get_episode(1012).await.unwrap().unwrap();
    assert_eq!(ep.season_id, 101);
    assert_eq!(ep.episode_index, 2);

    assert!(store.get_film(999).await.unwrap().is_none());
    assert!(store.get_episode(999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_mirror_counts() {
    let store = seeded_store().await;
    let counts = store.mirror_counts().await.unwrap();
    assert_eq!(
        counts,
        MirrorCounts {
            films: 4,
            series: 2,
            seasons: 2,
            episodes: 3
        }
    );
    assert_eq!(counts.total(), 11);
    assert_eq!(store.count_orphaned_episodes().await.unwrap(), 0);
}

#[tokio::test]
async fn test_deleting_series_cascades() {
    let store = seeded_store().await;
    Series::delete_by_id(10).exec(&store.conn).await.unwrap();

    let counts = store.mirror_counts().await.unwrap();
    assert_eq!(counts.seasons, 0);
    assert_eq!(counts.episodes, 0);
}

#[tokio::test]
async fn test_child_without_parent_is_rejected() {
    let store = seeded_store().await;
    let result = Episodes::insert(episode(5000, 4242, 1))
        .exec_without_returning(&store.conn)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_stream_url_from_mirrored_part() {
    let store = seeded_store().await;
    let film = store.get_film(1).await.unwrap().unwrap();

    let url = stream_url("http://192.168.1.10:32400", &film.part_key, "tok").unwrap();
    assert_eq!(
        url.as_str(),
        "http://192.168.1.10:32400/library/parts/1/file.mkv?X-Plex-Token=tok"
    );
    assert!(!film.part_key.contains("tok"));
}
