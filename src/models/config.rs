//! Application configuration structures.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Pagination and partition sizing
    #[serde(default)]
    pub feed: FeedConfig,

    /// Content source selection and CMS connection
    #[serde(default)]
    pub source: SourceConfig,

    /// CDN purge credentials
    #[serde(default)]
    pub cdn: CdnConfig,

    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let feed = &self.feed;
        if feed.items_per_page == 0 {
            return Err(AppError::validation("feed.items_per_page must be > 0"));
        }
        if feed.hot_pages_limit == 0 {
            return Err(AppError::validation("feed.hot_pages_limit must be > 0"));
        }
        if feed.segment_size == 0 {
            return Err(AppError::validation("feed.segment_size must be > 0"));
        }
        if feed.items_per_page > feed.max_limit {
            return Err(AppError::validation(
                "feed.items_per_page must not exceed feed.max_limit",
            ));
        }
        if feed.segment_size > feed.max_limit {
            return Err(AppError::validation(
                "feed.segment_size must not exceed feed.max_limit",
            ));
        }
        if feed.update_check_interval_ms == 0 {
            return Err(AppError::validation(
                "feed.update_check_interval_ms must be > 0",
            ));
        }
        if self.source.kind == SourceKind::Strapi && self.source.url.trim().is_empty() {
            return Err(AppError::validation("source.url is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.cdn.max_tags_per_request == 0 {
            return Err(AppError::validation("cdn.max_tags_per_request must be > 0"));
        }
        self.server
            .addr
            .parse::<SocketAddr>()
            .map_err(|e| AppError::validation(format!("server.addr is invalid: {e}")))?;
        Ok(())
    }
}

/// Partition and pagination sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedConfig {
    /// Articles per Hot page (L)
    #[serde(default = "defaults::items_per_page")]
    pub items_per_page: u32,

    /// Number of pages in the Hot window (H)
    #[serde(default = "defaults::hot_pages_limit")]
    pub hot_pages_limit: u32,

    /// Articles per Cold segment (S)
    #[serde(default = "defaults::segment_size")]
    pub segment_size: u32,

    /// Largest `limit` a caller may request
    #[serde(default = "defaults::max_limit")]
    pub max_limit: u32,

    /// Client polling interval advertised by the update check
    #[serde(default = "defaults::update_check_interval_ms")]
    pub update_check_interval_ms: u64,

    /// Related articles returned with a detail page
    #[serde(default = "defaults::related_limit")]
    pub related_limit: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            items_per_page: defaults::items_per_page(),
            hot_pages_limit: defaults::hot_pages_limit(),
            segment_size: defaults::segment_size(),
            max_limit: defaults::max_limit(),
            update_check_interval_ms: defaults::update_check_interval_ms(),
            related_limit: defaults::related_limit(),
        }
    }
}

/// Which content source implementation backs the feed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Strapi,
    Memory,
}

impl std::str::FromStr for SourceKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strapi" | "live" => Ok(Self::Strapi),
            "memory" | "mock" => Ok(Self::Memory),
            other => Err(AppError::config(format!("unknown source kind '{other}'"))),
        }
    }
}

/// Content source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// CMS base URL
    #[serde(default = "defaults::source_url")]
    pub url: String,

    /// Optional bearer token for the CMS
    #[serde(default)]
    pub api_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for CMS requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Corpus size generated by the in-memory source
    #[serde(default = "defaults::memory_seed_count")]
    pub memory_seed_count: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            url: defaults::source_url(),
            api_token: None,
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
            memory_seed_count: defaults::memory_seed_count(),
        }
    }
}

/// CDN purge API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdnConfig {
    #[serde(default)]
    pub zone_id: Option<String>,

    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "defaults::cdn_api_base")]
    pub api_base: String,

    /// Tags accepted by one purge call
    #[serde(default = "defaults::max_tags_per_request")]
    pub max_tags_per_request: usize,
}

impl CdnConfig {
    /// Zone id and token, when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let zone = self.zone_id.as_deref().filter(|s| !s.trim().is_empty())?;
        let token = self.api_token.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((zone, token))
    }
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            zone_id: None,
            api_token: None,
            api_base: defaults::cdn_api_base(),
            max_tags_per_request: defaults::max_tags_per_request(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::addr(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
        }
    }
}

mod defaults {
    // Feed defaults
    pub fn items_per_page() -> u32 {
        25
    }
    pub fn hot_pages_limit() -> u32 {
        10
    }
    pub fn segment_size() -> u32 {
        25
    }
    pub fn max_limit() -> u32 {
        100
    }
    pub fn update_check_interval_ms() -> u64 {
        60_000
    }
    pub fn related_limit() -> u32 {
        5
    }

    // Source defaults
    pub fn source_url() -> String {
        "http://localhost:1337".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn user_agent() -> String {
        "flash-feed/0.1".into()
    }
    pub fn memory_seed_count() -> u64 {
        300
    }

    // CDN defaults
    pub fn cdn_api_base() -> String {
        "https://api.cloudflare.com/client/v4".into()
    }
    pub fn max_tags_per_request() -> usize {
        30
    }

    // Server defaults
    pub fn addr() -> String {
        "0.0.0.0:3000".into()
    }

    pub fn level() -> String {
        "info".into()
    }
}
