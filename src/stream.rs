//! Playable stream URLs.
//!
//! Mirrored rows hold only the relative part key. The server token is
//! attached here, at request time.

use url::Url;

pub const TOKEN_PARAM: &str = "X-Plex-Token";

/// `base_url` + `part_key`, with the token appended as a query parameter.
pub fn stream_url(base_url: &str, part_key: &str, token: &str) -> Result<Url, url::ParseError> {
    let base = base_url.trim_end_matches('/');
    let part = part_key.trim_start_matches('/');
    let mut url = Url::parse(&format!("{base}/{part}"))?;
    url.query_pairs_mut().append_pair(TOKEN_PARAM, token);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_url_joins_base_and_part() {
        let url = stream_url(
            "http://10.0.0.5:32400/",
            "/library/parts/881/1700000000/file.mkv",
            "abc123",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://10.0.0.5:32400/library/parts/881/1700000000/file.mkv?X-Plex-Token=abc123"
        );
    }

    #[test]
    fn test_stream_url_encodes_token() {
        let url = stream_url("https://plex.example.com", "/library/parts/1/a.mp4", "a b&c").unwrap();
        assert_eq!(url.query(), Some("X-Plex-Token=a+b%26c"));
    }

    #[test]
    fn test_stream_url_rejects_relative_base() {
        assert!(stream_url("not a url", "/library/parts/1/a.mp4", "t").is_err());
    }
}
