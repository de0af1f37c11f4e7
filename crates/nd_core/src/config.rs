//! Layered configuration.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `newsdesk.toml` (or the file passed on the command line)
//! 3. `MEDIASTACK_API_KEY`, kept for existing deployments
//! 4. `NEWSDESK_*` environment variables, `__` separating sections
//!    (`NEWSDESK_MEDIASTACK__ACCESS_KEY` -> `mediastack.access_key`)

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::Category;
use crate::{Error, Result};

pub const ENV_PREFIX: &str = "NEWSDESK_";
pub const LEGACY_API_KEY_VAR: &str = "MEDIASTACK_API_KEY";
pub const DEFAULT_CONFIG_FILE: &str = "newsdesk.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NewsConfig {
    #[serde(default)]
    pub mediastack: MediastackConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MediastackConfig {
    pub base_url: String,
    /// Empty means "not configured"; fetching refuses to start.
    pub access_key: String,
    pub language: String,
    pub limit: u32,
    pub sort: String,
    pub timeout_secs: u64,
    pub categories: Vec<Category>,
}

impl Default for MediastackConfig {
    fn default() -> Self {
        Self {
            base_url: "http://api.mediastack.com/v1/news".to_string(),
            access_key: String::new(),
            language: "en".to_string(),
            limit: 10,
            sort: "published_desc".to_string(),
            timeout_secs: 30,
            categories: Category::ALL.to_vec(),
        }
    }
}

impl MediastackConfig {
    pub fn is_configured(&self) -> bool {
        !self.access_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Memory,
    Sqlite,
}

impl std::str::FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "sqlite" => Ok(StorageKind::Sqlite),
            other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageKind,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::Memory,
            path: PathBuf::from("newsdesk.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Word-count window for extended summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Stop adding sentences once this many words are in.
    pub min_words: usize,
    /// Never exceed this many words.
    pub max_words: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            min_words: 300,
            max_words: 500,
        }
    }
}

impl SummaryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_words == 0 {
            return Err(Error::Config("summary.max_words must be positive".to_string()));
        }
        if self.min_words > self.max_words {
            return Err(Error::Config(format!(
                "summary.min_words ({}) exceeds summary.max_words ({})",
                self.min_words, self.max_words
            )));
        }
        Ok(())
    }
}

impl NewsConfig {
    /// Load from defaults, `newsdesk.toml` and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Like [`NewsConfig::load`] but reads `path` instead of `newsdesk.toml`.
    /// An explicit path that does not exist is an error.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }
        let config: NewsConfig = Self::figment(path)
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read `.env` from the working directory first, then load.
    pub fn load_with_dotenv(path: Option<&Path>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(Error::Config(format!("failed to read .env: {}", e)));
            }
        }
        Self::load_from(path)
    }

    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(
                Env::raw()
                    .only(&[LEGACY_API_KEY_VAR])
                    .map(|_| "mediastack.access_key".into()),
            )
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.mediastack.base_url).map_err(|e| {
            Error::InvalidUrl(format!("mediastack.base_url '{}': {}", self.mediastack.base_url, e))
        })?;
        if self.mediastack.limit == 0 {
            return Err(Error::Config("mediastack.limit must be positive".to_string()));
        }
        if self.mediastack.categories.is_empty() {
            return Err(Error::Config("mediastack.categories must not be empty".to_string()));
        }
        self.summary.validate()
    }
}
