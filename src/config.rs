use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::cache::ResponseCache;
use crate::domain::Source;
use crate::error::ChargeError;

pub const DEFAULT_CONFIG_FILE: &str = "cpdata.json";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub ireland: Option<SourceEntry>,
    #[serde(default)]
    pub openchargemap: Option<SourceEntry>,
    #[serde(default)]
    pub cache: Option<CacheEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SourceEntry {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CacheEntry {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub ireland_url: String,
    pub openchargemap_url: String,
    pub cache: CacheSettings,
}

impl ResolvedConfig {
    pub fn source_url(&self, source: Source) -> &str {
        match source {
            Source::Ireland => &self.ireland_url,
            Source::OpenChargeMap => &self.openchargemap_url,
        }
    }

    /// The response cache to use, or `None` when caching is switched off.
    pub fn response_cache(&self) -> Result<Option<ResponseCache>, ChargeError> {
        if !self.cache.enabled {
            return Ok(None);
        }
        let root = match &self.cache.dir {
            Some(dir) => dir.clone(),
            None => ResponseCache::default_root()?,
        };
        Ok(Some(ResponseCache::new(root)))
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `cpdata.json` from the working directory when it
    /// exists. Without either, every setting takes its default.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ChargeError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Self::resolve_config(Config::default()));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ChargeError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ChargeError::ConfigParse(err.to_string()))?;
        if let Some(version) = config
            .schema_version
            .filter(|version| *version != SCHEMA_VERSION)
        {
            return Err(ChargeError::ConfigParse(format!(
                "unsupported schema_version {version}, expected {SCHEMA_VERSION}"
            )));
        }
        tracing::debug!(path = %config_path.display(), "loaded config");

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let url_for = |entry: Option<SourceEntry>, source: Source| {
            entry
                .and_then(|entry| entry.url)
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| source.default_url().to_string())
        };
        let cache = config.cache.unwrap_or_default();

        ResolvedConfig {
            ireland_url: url_for(config.ireland, Source::Ireland),
            openchargemap_url: url_for(config.openchargemap, Source::OpenChargeMap),
            cache: CacheSettings {
                enabled: cache.enabled.unwrap_or(true),
                dir: cache.dir.map(Utf8PathBuf::from),
            },
        }
    }
}
