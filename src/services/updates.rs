// src/services/updates.rs

//! New-content detection against a client watermark.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{FeedConfig, UpdateCheck};
use crate::source::{ArticleQuery, ContentSource};

/// Answers "is there anything newer than what I have?" for polling clients.
#[derive(Clone)]
pub struct UpdateDetector {
    source: Arc<dyn ContentSource>,
    poll_interval_ms: u64,
}

impl UpdateDetector {
    pub fn new(source: Arc<dyn ContentSource>, feed: &FeedConfig) -> Self {
        Self {
            source,
            poll_interval_ms: feed.update_check_interval_ms,
        }
    }

    /// Interval clients are told to poll at.
    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    /// Count articles newer than `last_id`.
    ///
    /// Source failures are returned as errors, never as "no updates".
    pub async fn check_updates(&self, last_id: u64) -> Result<UpdateCheck> {
        let batch = self
            .source
            .fetch_articles(&ArticleQuery::newer_than(last_id, 1))
            .await?;

        let newest = batch.items.first().map(|a| a.id).unwrap_or(last_id);
        let new_count = batch.total;
        if new_count > 0 {
            log::debug!("{new_count} articles newer than {last_id}, latest {newest}");
        }

        Ok(UpdateCheck {
            new_count,
            latest_id: newest.max(last_id),
            has_updates: new_count > 0,
        })
    }
}
