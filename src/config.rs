use crate::sync::SyncSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use url::Url;

const APP_DIR: &str = "plex-mirror";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Location of the mirror file.
    pub database_path: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        let database_path = dirs::cache_dir()
            .map_or_else(|| PathBuf::from("."), |dir| dir.join(APP_DIR))
            .join("cache.db");

        Self {
            log_level: "info".to_string(),
            database_path,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Plex Media Server address, e.g. `http://192.168.1.10:32400`.
    pub base_url: String,

    pub token: String,

    /// Sent as `X-Plex-Client-Identifier`.
    pub client_identifier: String,

    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            client_identifier: APP_DIR.to_string(),
            request_timeout_seconds: 10,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Mirror age below which `sync` is a no-op (default 24h).
    pub freshness_threshold_seconds: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            freshness_threshold_seconds: 24 * 60 * 60,
        }
    }
}

impl Config {
    /// Loads the first config file found on the search path, with the path
    /// it came from. Runs before logging is set up, so it logs nothing.
    pub fn load() -> Result<(Self, Option<PathBuf>)> {
        Self::load_first(&Self::config_paths())
    }

    fn load_first(paths: &[PathBuf]) -> Result<(Self, Option<PathBuf>)> {
        match paths.iter().find(|p| p.exists()) {
            Some(path) => Ok((Self::load_from_path(path)?, Some(path.clone()))),
            None => Ok((Self::default(), None)),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_DIR).join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("config.toml"),
            |dir| dir.join(APP_DIR).join("config.toml"),
        )
    }

    /// The file a config would be read from or written back to.
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        Self::config_paths()
            .into_iter()
            .find(|p| p.exists())
            .unwrap_or_else(Self::default_config_path)
    }

    /// Writes a default config to `path` unless one exists. Returns whether it did.
    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    /// Applies `--base-url` / `--token`. Returns true if anything changed.
    pub fn apply_overrides(&mut self, base_url: Option<&str>, token: Option<&str>) -> bool {
        let mut changed = false;
        if let Some(url) = base_url.map(|u| u.trim_end_matches('/'))
            && url != self.server.base_url
        {
            self.server.base_url = url.to_string();
            changed = true;
        }
        if let Some(token) = token
            && token != self.server.token
        {
            self.server.token = token.to_string();
            changed = true;
        }
        changed
    }

    /// Fails when the server address or token is missing or unusable.
    pub fn validate(&self) -> Result<()> {
        if self.server.base_url.trim().is_empty() {
            anyhow::bail!("Missing credentials: server.base_url is not set (use --base-url)");
        }

        let url = Url::parse(&self.server.base_url)
            .with_context(|| format!("Invalid server.base_url: {}", self.server.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("server.base_url must be an http(s) URL");
        }

        if self.server.token.trim().is_empty() {
            anyhow::bail!("Missing credentials: server.token is not set (use --token)");
        }

        if self.server.request_timeout_seconds == 0 {
            anyhow::bail!("server.request_timeout_seconds must be > 0");
        }

        Ok(())
    }

    #[must_use]
    pub fn sync_settings(&self, force_rebuild: bool) -> SyncSettings {
        SyncSettings {
            base_url: self.server.base_url.clone(),
            auth_token: self.server.token.clone(),
            freshness_threshold_seconds: self.sync.freshness_threshold_seconds,
            force_rebuild,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.server.base_url = "http://192.168.1.10:32400".to_string();
        config.server.token = "abc123".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.log_level, "info");
        assert!(config.general.database_path.ends_with("cache.db"));
        assert_eq!(config.server.client_identifier, "plex-mirror");
        assert_eq!(config.server.request_timeout_seconds, 10);
        assert_eq!(config.sync.freshness_threshold_seconds, 86_400);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[sync]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [sync]
            freshness_threshold_seconds = 600
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.sync.freshness_threshold_seconds, 600);

        assert_eq!(config.server.client_identifier, "plex-mirror");
    }

    #[test]
    fn test_validate_requires_credentials() {
        assert!(Config::default().validate().is_err());

        let mut config = configured();
        assert!(config.validate().is_ok());

        config.server.token = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = configured();
        config.server.base_url = "ftp://nas".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = configured();
        assert!(!config.apply_overrides(None, Some("abc123")));
        assert!(config.apply_overrides(Some("https://plex.example.com/"), None));
        assert_eq!(config.server.base_url, "https://plex.example.com");
    }

    #[test]
    fn test_sync_settings() {
        let settings = configured().sync_settings(true);
        assert_eq!(settings.auth_token, "abc123");
        assert_eq!(settings.freshness_threshold_seconds, 86_400);
        assert!(settings.force_rebuild);
    }

    #[test]
    fn test_load_first_reports_source_path() {
        let dir = std::env::temp_dir();
        let missing = dir.join(format!("plex-mirror-missing-{}.toml", std::process::id()));
        let present = dir.join(format!("plex-mirror-present-{}.toml", std::process::id()));
        configured().save_to_path(&present).unwrap();

        let (config, source) = Config::load_first(&[missing.clone(), present.clone()]).unwrap();
        assert_eq!(source.as_deref(), Some(present.as_path()));
        assert_eq!(config.server.token, "abc123");

        let (config, source) = Config::load_first(&[missing]).unwrap();
        assert_eq!(source, None);
        assert!(config.server.token.is_empty());

        let _ = std::fs::remove_file(&present);
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!("plex-mirror-config-{}.toml", std::process::id()));
        let config = configured();
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.server.token, "abc123");
        assert!(!Config::create_default_if_missing(&path).unwrap());

        let _ = std::fs::remove_file(&path);
    }
}
