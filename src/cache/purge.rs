// src/cache/purge.rs

//! CDN purge-by-tag clients.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::CdnConfig;
use crate::utils::http::build_client;

/// Outcome of a purge call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    /// Tags handed to the purger
    pub requested: usize,
    /// API calls made
    pub batches: usize,
    /// True when nothing was sent (no credentials or no tags)
    pub skipped: bool,
}

/// Trait for edge cache purge backends.
#[async_trait]
pub trait CachePurger: Send + Sync {
    fn name(&self) -> &'static str;

    /// Purge every cached response carrying any of `tags`.
    async fn purge_tags(&self, tags: &[String]) -> Result<PurgeReport>;
}

/// Build the purger for the configured CDN.
///
/// Missing credentials yield a [`NoopPurger`] rather than an error, so a
/// development server runs without CDN access.
pub fn from_config(config: &CdnConfig) -> Result<Arc<dyn CachePurger>> {
    match config.credentials() {
        Some((zone, token)) => Ok(Arc::new(CloudflarePurger::new(
            &config.api_base,
            zone,
            token,
            config.max_tags_per_request,
        )?)),
        None => {
            log::warn!("Cloudflare credentials not configured, cache purges will be skipped");
            Ok(Arc::new(NoopPurger))
        }
    }
}

/// Purger that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPurger;

#[async_trait]
impl CachePurger for NoopPurger {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn purge_tags(&self, tags: &[String]) -> Result<PurgeReport> {
        if !tags.is_empty() {
            log::warn!("Skipping purge of {} tags: {}", tags.len(), tags.join(","));
        }
        Ok(PurgeReport {
            requested: tags.len(),
            batches: 0,
            skipped: true,
        })
    }
}

#[derive(Debug, Serialize)]
struct PurgeRequest<'a> {
    tags: &'a [String],
}

#[derive(Debug, Deserialize)]
struct PurgeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Cloudflare zone purge by cache tag.
#[derive(Debug, Clone)]
pub struct CloudflarePurger {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    batch_size: usize,
}

impl CloudflarePurger {
    pub fn new(api_base: &str, zone_id: &str, token: &str, batch_size: usize) -> Result<Self> {
        Ok(Self {
            client: build_client(concat!("flash-feed/", env!("CARGO_PKG_VERSION")), 30)?,
            endpoint: purge_endpoint(api_base, zone_id),
            token: token.to_string(),
            batch_size: batch_size.max(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn purge_batch(&self, tags: &[String]) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&PurgeRequest { tags })
            .send()
            .await
            .map_err(|e| AppError::purge(None, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::purge(
                Some(status.as_u16()),
                format!("Cloudflare API error: {status}"),
            ));
        }

        let body: PurgeResponse = response
            .json()
            .await
            .map_err(|e| AppError::purge(Some(status.as_u16()), e))?;
        if !body.success {
            let reason = body
                .errors
                .iter()
                .map(|e| format!("{} {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::purge(Some(status.as_u16()), reason));
        }
        Ok(())
    }
}

/// Zone purge URL.
pub fn purge_endpoint(api_base: &str, zone_id: &str) -> String {
    format!("{}/zones/{}/purge_cache", api_base.trim_end_matches('/'), zone_id)
}

#[async_trait]
impl CachePurger for CloudflarePurger {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    async fn purge_tags(&self, tags: &[String]) -> Result<PurgeReport> {
        if tags.is_empty() {
            return Ok(PurgeReport {
                skipped: true,
                ..PurgeReport::default()
            });
        }

        let mut batches = 0;
        for chunk in tags.chunks(self.batch_size) {
            self.purge_batch(chunk).await?;
            batches += 1;
        }
        log::info!("Purged {} cache tags in {batches} request(s)", tags.len());

        Ok(PurgeReport {
            requested: tags.len(),
            batches,
            skipped: false,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        assert_eq!(
            purge_endpoint("https://api.cloudflare.com/client/v4/", "zone123"),
            "https://api.cloudflare.com/client/v4/zones/zone123/purge_cache"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let tags = vec!["flashes-hot".to_string(), "flashes-latest".to_string()];
        let body = serde_json::to_value(PurgeRequest { tags: &tags }).unwrap();
        assert_eq!(body, serde_json::json!({ "tags": ["flashes-hot", "flashes-latest"] }));
    }

    #[test]
    fn test_from_config_without_credentials_is_noop() {
        let purger = from_config(&CdnConfig::default()).unwrap();
        assert_eq!(purger.name(), "noop");

        let config = CdnConfig {
            zone_id: Some("zone".to_string()),
            api_token: Some("token".to_string()),
            ..CdnConfig::default()
        };
        assert_eq!(from_config(&config).unwrap().name(), "cloudflare");
    }

    #[tokio::test]
    async fn test_noop_reports_skip() {
        let tags = vec!["flashes-hot".to_string()];
        let report = NoopPurger.purge_tags(&tags).await.unwrap();
        assert!(report.skipped);
        assert_eq!(report.requested, 1);
    }

    #[tokio::test]
    async fn test_empty_purge_sends_nothing() {
        // Unroutable endpoint: any request would fail.
        let purger = CloudflarePurger::new("http://127.0.0.1:9", "zone", "token", 30).unwrap();
        let report = purger.purge_tags(&[]).await.unwrap();
        assert!(report.skipped);
        assert_eq!(report.batches, 0);
    }

    #[test]
    fn test_failure_response_parses() {
        let body: PurgeResponse = serde_json::from_value(serde_json::json!({
            "success": false,
            "errors": [{ "code": 1012, "message": "Request must contain one of purge_everything, files, tags" }],
            "messages": [],
            "result": null
        }))
        .unwrap();
        assert!(!body.success);
        assert_eq!(body.errors[0].code, 1012);
    }
}
