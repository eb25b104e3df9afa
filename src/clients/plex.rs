use crate::sync::source::{
    CatalogError, CatalogItem, CatalogSource, RemoteEpisode, RemoteSeason, Section, SectionKind,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use url::Url;

const PRODUCT: &str = "plex-mirror";

#[derive(Debug, Default, Deserialize)]
struct MediaContainer {
    #[serde(rename = "Directory", default)]
    directories: Vec<Directory>,
    #[serde(rename = "Video", default)]
    videos: Vec<Video>,
}

// Attributes are read as text and parsed leniently, so one odd value only
// affects the item that carries it.
#[derive(Debug, Default, Deserialize)]
struct Directory {
    #[serde(rename = "@ratingKey")]
    rating_key: Option<String>,
    #[serde(rename = "@key")]
    key: Option<String>,
    #[serde(rename = "@title")]
    title: Option<String>,
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "@index")]
    index: Option<String>,
    #[serde(rename = "@summary")]
    summary: Option<String>,
    #[serde(rename = "@year")]
    year: Option<String>,
    #[serde(rename = "@rating")]
    rating: Option<String>,
    #[serde(rename = "@updatedAt")]
    updated_at: Option<String>,
    #[serde(rename = "Genre", default)]
    genres: Vec<Tag>,
}

#[derive(Debug, Default, Deserialize)]
struct Video {
    #[serde(rename = "@ratingKey")]
    rating_key: Option<String>,
    #[serde(rename = "@title")]
    title: Option<String>,
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "@index")]
    index: Option<String>,
    #[serde(rename = "@summary")]
    summary: Option<String>,
    #[serde(rename = "@year")]
    year: Option<String>,
    #[serde(rename = "@duration")]
    duration: Option<String>,
    #[serde(rename = "@rating")]
    rating: Option<String>,
    #[serde(rename = "@originallyAvailableAt")]
    originally_available_at: Option<String>,
    #[serde(rename = "Media", default)]
    media: Vec<Media>,
    #[serde(rename = "Genre", default)]
    genres: Vec<Tag>,
}

#[derive(Debug, Default, Deserialize)]
struct Media {
    #[serde(rename = "Part", default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(rename = "@key")]
    key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Tag {
    #[serde(rename = "@tag")]
    tag: Option<String>,
}

impl Video {
    /// Key of the first part of the first media.
    fn part_key(&self) -> Option<String> {
        self.media
            .first()
            .and_then(|m| m.parts.first())
            .and_then(|p| p.key.clone())
            .filter(|k| !k.is_empty())
    }

    fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_deref().is_none_or(|k| k == kind)
    }

    fn to_item(&self) -> CatalogItem {
        CatalogItem {
            rating_key: self.rating_key.clone().unwrap_or_default(),
            title: self.title.clone().unwrap_or_default(),
            year: parse_attr(self.year.as_deref()),
            summary: non_empty(self.summary.as_deref()),
            rating: parse_attr(self.rating.as_deref()),
            genres: tags(&self.genres),
            duration: parse_attr(self.duration.as_deref()),
            originally_available_at: non_empty(self.originally_available_at.as_deref()),
        }
    }

    fn to_episode(&self) -> RemoteEpisode {
        RemoteEpisode {
            rating_key: self.rating_key.clone().unwrap_or_default(),
            index: parse_attr(self.index.as_deref()).unwrap_or_default(),
            title: self.title.clone().unwrap_or_default(),
            summary: non_empty(self.summary.as_deref()),
            duration: parse_attr(self.duration.as_deref()),
            rating: parse_attr(self.rating.as_deref()),
        }
    }
}

impl Directory {
    fn to_section(&self) -> Section {
        Section {
            key: self.key.clone().unwrap_or_default(),
            title: self.title.clone().unwrap_or_default(),
            kind: SectionKind::from_remote(self.kind.as_deref().unwrap_or_default()),
            updated_at: parse_attr(self.updated_at.as_deref()),
        }
    }

    fn to_item(&self) -> CatalogItem {
        CatalogItem {
            rating_key: self.rating_key.clone().unwrap_or_default(),
            title: self.title.clone().unwrap_or_default(),
            year: parse_attr(self.year.as_deref()),
            summary: non_empty(self.summary.as_deref()),
            rating: parse_attr(self.rating.as_deref()),
            genres: tags(&self.genres),
            duration: None,
            originally_available_at: None,
        }
    }

    fn to_season(&self) -> RemoteSeason {
        RemoteSeason {
            rating_key: self.rating_key.clone().unwrap_or_default(),
            index: parse_attr(self.index.as_deref()).unwrap_or_default(),
            title: self.title.clone().unwrap_or_default(),
            summary: non_empty(self.summary.as_deref()),
        }
    }
}

fn parse_attr<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

fn tags(tags: &[Tag]) -> Vec<String> {
    tags.iter().filter_map(|t| t.tag.clone()).collect()
}

fn parse_container(body: &str) -> Result<MediaContainer, CatalogError> {
    quick_xml::de::from_str(body).map_err(|e| CatalogError::Parse(e.to_string()))
}

/// Plex Media Server client over its XML library API.
///
/// Part keys seen inline in the latest listing are remembered, so `fetch_part`
/// only goes back to the server for items whose listing omitted them.
pub struct PlexClient {
    client: Client,
    base_url: String,
    token: String,
    client_identifier: String,
    part_keys: Mutex<HashMap<String, String>>,
}

impl PlexClient {
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        client_identifier: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| CatalogError::Unavailable(format!("invalid server URL {base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CatalogError::Unavailable(format!(
                "unsupported server URL scheme: {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client_identifier: client_identifier.into(),
            part_keys: Mutex::new(HashMap::new()),
        })
    }

    async fn get_container(&self, path: &str) -> Result<MediaContainer, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Plex request");

        let response = self
            .client
            .get(&url)
            .header("X-Plex-Token", &self.token)
            .header("X-Plex-Client-Identifier", &self.client_identifier)
            .header("X-Plex-Product", PRODUCT)
            .header(reqwest::header::ACCEPT, "application/xml")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CatalogError::Unauthorized);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        parse_container(&body)
    }

    /// Replaces the cached parts with those of one listing.
    fn remember_parts<'a>(&self, videos: impl Iterator<Item = &'a Video>) {
        let Ok(mut cache) = self.part_keys.lock() else {
            return;
        };
        cache.clear();
        for video in videos {
            if let (Some(key), Some(part)) = (&video.rating_key, video.part_key()) {
                cache.insert(key.clone(), part);
            }
        }
    }

    fn cached_part(&self, rating_key: &str) -> Option<String> {
        self.part_keys
            .lock()
            .ok()
            .and_then(|mut cache| cache.remove(rating_key))
    }
}

#[async_trait]
impl CatalogSource for PlexClient {
    async fn list_sections(&self) -> Result<Vec<Section>, CatalogError> {
        let container = self.get_container("/library/sections").await?;
        Ok(container.directories.iter().map(Directory::to_section).collect())
    }

    async fn list_items(&self, section: &Section) -> Result<Vec<CatalogItem>, CatalogError> {
        let container = self
            .get_container(&format!("/library/sections/{}/all", section.key))
            .await?;

        let items = match section.kind {
            SectionKind::Movie => {
                let movies: Vec<&Video> =
                    container.videos.iter().filter(|v| v.is_kind("movie")).collect();
                self.remember_parts(movies.iter().copied());
                movies.into_iter().map(Video::to_item).collect()
            }
            SectionKind::Show => {
                self.remember_parts(std::iter::empty());
                container
                    .directories
                    .iter()
                    .filter(|d| d.kind.as_deref().is_none_or(|k| k == "show"))
                    .map(Directory::to_item)
                    .collect()
            }
            SectionKind::Other(_) => Vec::new(),
        };
        Ok(items)
    }

    async fn list_seasons(&self, show: &CatalogItem) -> Result<Vec<RemoteSeason>, CatalogError> {
        let container = self
            .get_container(&format!("/library/metadata/{}/children", show.rating_key))
            .await?;

        let mut seasons: Vec<RemoteSeason> = container
            .directories
            .iter()
            .filter(|d| d.kind.as_deref() == Some("season"))
            .map(Directory::to_season)
            .collect();
        seasons.sort_by_key(|s| s.index);
        Ok(seasons)
    }

    async fn list_episodes(
        &self,
        season: &RemoteSeason,
    ) -> Result<Vec<RemoteEpisode>, CatalogError> {
        let container = self
            .get_container(&format!("/library/metadata/{}/children", season.rating_key))
            .await?;

        let episodes: Vec<&Video> = container
            .videos
            .iter()
            .filter(|v| v.is_kind("episode"))
            .collect();
        self.remember_parts(episodes.iter().copied());

        let mut episodes: Vec<RemoteEpisode> =
            episodes.into_iter().map(Video::to_episode).collect();
        episodes.sort_by_key(|e| e.index);
        Ok(episodes)
    }

    async fn fetch_part(&self, rating_key: &str) -> Result<Option<String>, CatalogError> {
        if let Some(part) = self.cached_part(rating_key) {
            return Ok(Some(part));
        }

        let container = self
            .get_container(&format!("/library/metadata/{rating_key}"))
            .await?;
        let video = container
            .videos
            .first()
            .ok_or_else(|| CatalogError::NotFound(format!("metadata for {rating_key}")))?;
        Ok(video.part_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTIONS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="3" allowSync="0" title1="Plex Library">
  <Directory allowSync="1" key="1" type="movie" title="Movies" agent="tv.plex.agents.movie" updatedAt="1700000000">
    <Location id="1" path="/data/movies" />
  </Directory>
  <Directory allowSync="1" key="2" type="show" title="TV Shows" updatedAt="1700000500" />
  <Directory allowSync="1" key="3" type="artist" title="Music" />
</MediaContainer>"#;

    const MOVIES: &str = r#"<MediaContainer size="2" librarySectionID="1">
  <Video ratingKey="101" key="/library/metadata/101" type="movie" title="Heat" summary="A crew of thieves." rating="8.3" year="1995" duration="10224000" originallyAvailableAt="1995-12-15">
    <Media id="1" duration="10224000"><Part id="11" key="/library/parts/11/1700000000/file.mkv" /></Media>
    <Genre tag="Crime" />
    <Genre tag="Drama" />
  </Video>
  <Video ratingKey="102" type="movie" title="Unknown Year" year="n/a" />
</MediaContainer>"#;

    const SEASONS: &str = r#"<MediaContainer size="3">
  <Directory key="/library/metadata/500/allLeaves" title="All episodes" />
  <Directory ratingKey="502" type="season" title="Season 2" index="2" />
  <Directory ratingKey="501" type="season" title="Season 1" index="1" summary="" />
</MediaContainer>"#;

    const EPISODES: &str = r#"<MediaContainer size="2">
  <Video ratingKey="702" type="episode" title="Second" index="2" duration="1800000">
    <Media><Part key="/library/parts/72/file.mkv" /></Media>
  </Video>
  <Video ratingKey="701" type="episode" title="Pilot" index="1" rating="7.5" />
</MediaContainer>"#;

    #[test]
    fn test_parse_sections() {
        let container = parse_container(SECTIONS).unwrap();
        let sections: Vec<Section> = container.directories.iter().map(Directory::to_section).collect();

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].key, "1");
        assert_eq!(sections[0].kind, SectionKind::Movie);
        assert_eq!(sections[0].updated_at, Some(1_700_000_000));
        assert_eq!(sections[1].kind, SectionKind::Show);
        assert_eq!(sections[2].kind, SectionKind::Other("artist".to_string()));
        assert_eq!(sections[2].updated_at, None);
    }

    #[test]
    fn test_parse_movies() {
        let container = parse_container(MOVIES).unwrap();
        let heat = container.videos[0].to_item();

        assert_eq!(heat.rating_key, "101");
        assert_eq!(heat.year, Some(1995));
        assert_eq!(heat.rating, Some(8.3));
        assert_eq!(heat.duration, Some(10_224_000));
        assert_eq!(heat.genres, vec!["Crime", "Drama"]);
        assert_eq!(heat.originally_available_at.as_deref(), Some("1995-12-15"));
        assert_eq!(
            container.videos[0].part_key().as_deref(),
            Some("/library/parts/11/1700000000/file.mkv")
        );

        let odd = container.videos[1].to_item();
        assert_eq!(odd.year, None);
        assert_eq!(container.videos[1].part_key(), None);
    }

    #[test]
    fn test_parse_seasons_keeps_only_seasons() {
        let container = parse_container(SEASONS).unwrap();
        let seasons: Vec<RemoteSeason> = container
            .directories
            .iter()
            .filter(|d| d.kind.as_deref() == Some("season"))
            .map(Directory::to_season)
            .collect();

        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[0].index, 2);
        assert_eq!(seasons[1].summary, None);
    }

    #[test]
    fn test_parse_episodes() {
        let container = parse_container(EPISODES).unwrap();
        let episodes: Vec<RemoteEpisode> = container.videos.iter().map(Video::to_episode).collect();

        assert_eq!(episodes[0].rating_key, "702");
        assert_eq!(episodes[0].duration, Some(1_800_000));
        assert_eq!(episodes[1].rating, Some(7.5));
        assert_eq!(container.videos[1].part_key(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_container("<MediaContainer><Video></MediaContainer>"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_part_cache_is_consumed() {
        let client = PlexClient::new(
            "http://127.0.0.1:32400",
            "token",
            "test",
            Duration::from_secs(1),
        )
        .unwrap();
        let container = parse_container(EPISODES).unwrap();
        client.remember_parts(container.videos.iter());

        assert_eq!(
            client.cached_part("702").as_deref(),
            Some("/library/parts/72/file.mkv")
        );
        assert_eq!(client.cached_part("702"), None);
        assert_eq!(client.cached_part("701"), None);
    }

    #[test]
    fn test_part_cache_holds_only_latest_listing() {
        let client = PlexClient::new(
            "http://127.0.0.1:32400",
            "token",
            "test",
            Duration::from_secs(1),
        )
        .unwrap();
        client.remember_parts(parse_container(EPISODES).unwrap().videos.iter());
        client.remember_parts(parse_container(MOVIES).unwrap().videos.iter());

        assert_eq!(client.cached_part("702"), None);
        assert_eq!(
            client.cached_part("101").as_deref(),
            Some("/library/parts/11/1700000000/file.mkv")
        );
        assert_eq!(client.part_keys.lock().unwrap().len(), 0);
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(PlexClient::new("ftp://nas", "t", "c", Duration::from_secs(1)).is_err());
        assert!(PlexClient::new("nas:32400/", "t", "c", Duration::from_secs(1)).is_err());
    }
}
