// src/config.rs

//! Configuration loading utilities.
//!
//! Combines the TOML file, environment overrides and validation into the
//! single `Config` the binaries run with.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{Config, SourceKind};

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary key lookup.
///
/// Empty values are ignored so that `VAR=` in a deployment manifest does not
/// clobber file configuration.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("STRAPI_URL") {
        config.source.url = url;
    }
    if let Some(token) = get("STRAPI_API_TOKEN") {
        config.source.api_token = Some(token);
    }
    if let Some(kind) = get("FLASH_SOURCE") {
        config.source.kind = kind.parse::<SourceKind>()?;
    }
    if let Some(zone) = get("CLOUDFLARE_ZONE_ID") {
        config.cdn.zone_id = Some(zone);
    }
    if let Some(token) = get("CLOUDFLARE_API_TOKEN").or_else(|| get("CLOUDFLARE_TOKEN")) {
        config.cdn.api_token = Some(token);
    }
    if let Some(addr) = get("FLASH_ADDR") {
        config.server.addr = addr;
    }

    if let Some(v) = get("ITEMS_PER_PAGE") {
        config.feed.items_per_page = parse_number("ITEMS_PER_PAGE", &v)?;
    }
    if let Some(v) = get("HOT_PAGES_LIMIT") {
        config.feed.hot_pages_limit = parse_number("HOT_PAGES_LIMIT", &v)?;
    }
    if let Some(v) = get("SEGMENT_SIZE") {
        config.feed.segment_size = parse_number("SEGMENT_SIZE", &v)?;
    }
    if let Some(v) = get("UPDATE_CHECK_INTERVAL_MS") {
        config.feed.update_check_interval_ms = parse_number("UPDATE_CHECK_INTERVAL_MS", &v)?;
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::config(format!("{key} must be a non-negative integer, got '{value}'")))
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file is missing or unreadable.
pub fn load_config(path: &Path) -> Config {
    Config::load_or_default(path)
}

/// Load the file, apply environment overrides and validate.
pub fn load_all(path: &Path) -> Result<Config> {
    finish(load_config(path))
}

/// Like [`load_all`], but returns why the file was not used instead of
/// logging it, for callers that set up logging from the result.
pub fn load_all_deferred(path: &Path) -> Result<(Config, Option<AppError>)> {
    let (config, fallback) = match Config::load(path) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    Ok((finish(config)?, fallback))
}

fn finish(mut config: Config) -> Result<Config> {
    apply_env_overrides(&mut config)?;
    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid configuration: {e}")))?;
    Ok(config)
}
