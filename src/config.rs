use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::logging::LogFormat;

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_DATABASE_PATH: &str = "data/youtube_videos_db.sqlite3";
pub const DEFAULT_YOUTUBE_API_KEY: &str = "YOUR_YOUTUBE_API_KEY";
pub const DEFAULT_YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Raw values found in an env file or the process environment. Every field is
/// optional; [`AppConfig::resolve`] fills the gaps with defaults.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub database_path: Option<PathBuf>,
    pub youtube_api_key: Option<String>,
    pub youtube_api_url: Option<String>,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub log_format: Option<String>,
}

impl EnvConfig {
    /// Applies a single `KEY=value` pair. `origin` only feeds error messages.
    fn apply(&mut self, key: &str, value: &str, origin: &str) -> Result<()> {
        let value = value.trim().trim_matches('"');
        if value.is_empty() {
            return Ok(());
        }
        match key {
            "DATABASE_PATH" => self.database_path = Some(PathBuf::from(value)),
            "YOUTUBE_API_KEY" => self.youtube_api_key = Some(value.to_string()),
            "YOUTUBE_API_URL" => self.youtube_api_url = Some(value.to_string()),
            "PORT" => {
                let port: u16 = value
                    .parse()
                    .with_context(|| format!("Parsing PORT from {origin}"))?;
                self.port = Some(port);
            }
            "HOST" => self.host = Some(value.to_string()),
            "LOG_FORMAT" => self.log_format = Some(value.to_string()),
            _ => {}
        }
        Ok(())
    }

    /// Overlays `other` on top of `self`; values present in `other` win.
    pub fn merge(self, other: EnvConfig) -> EnvConfig {
        EnvConfig {
            database_path: other.database_path.or(self.database_path),
            youtube_api_key: other.youtube_api_key.or(self.youtube_api_key),
            youtube_api_url: other.youtube_api_url.or(self.youtube_api_url),
            port: other.port.or(self.port),
            host: other.host.or(self.host),
            log_format: other.log_format.or(self.log_format),
        }
    }
}

/// Fully resolved settings, built once at startup and handed to the store,
/// the lookup client and the router.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub youtube_api_key: String,
    pub youtube_api_url: String,
    pub port: u16,
    pub host: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::resolve(EnvConfig::default())
    }
}

impl AppConfig {
    pub fn resolve(cfg: EnvConfig) -> Self {
        Self {
            database_path: cfg
                .database_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            youtube_api_key: cfg
                .youtube_api_key
                .unwrap_or_else(|| DEFAULT_YOUTUBE_API_KEY.to_string()),
            youtube_api_url: cfg
                .youtube_api_url
                .unwrap_or_else(|| DEFAULT_YOUTUBE_API_URL.to_string()),
            port: cfg.port.unwrap_or(DEFAULT_PORT),
            host: cfg.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            log_format: cfg
                .log_format
                .as_deref()
                .map(LogFormat::parse)
                .unwrap_or_default(),
        }
    }

    /// True while the API key is still the placeholder shipped as default.
    pub fn uses_placeholder_key(&self) -> bool {
        self.youtube_api_key == DEFAULT_YOUTUBE_API_KEY
    }
}

/// Parses a dotenv-style file. Returns `Ok(None)` when the file is absent so
/// callers can fall back to the process environment and defaults.
pub fn read_env_config(path: &Path) -> Result<Option<EnvConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let origin = path.display().to_string();
    let mut cfg = EnvConfig::default();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        if let Some((key, value)) = trimmed.split_once('=') {
            cfg.apply(key.trim(), value, &origin)?;
        }
    }
    Ok(Some(cfg))
}

/// Collects recognized keys from an iterator of environment pairs.
pub fn env_config_from_vars<I, K, V>(vars: I) -> Result<EnvConfig>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut cfg = EnvConfig::default();
    for (key, value) in vars {
        cfg.apply(key.as_ref(), value.as_ref(), "environment")?;
    }
    Ok(cfg)
}

/// Env file first, then the process environment on top of it.
pub fn load_config(env_path: impl AsRef<Path>) -> Result<AppConfig> {
    let file_cfg = read_env_config(env_path.as_ref())?.unwrap_or_default();
    let process_cfg = env_config_from_vars(std::env::vars())?;
    Ok(AppConfig::resolve(file_cfg.merge(process_cfg)))
}
