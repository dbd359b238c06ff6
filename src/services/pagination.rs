// src/services/pagination.rs

//! Hot page and Cold segment listing.
//!
//! Every read goes through the injected [`ContentSource`]; this service only
//! adds validation, the partition arithmetic and response shaping.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{
    Article, ArticleDetail, CategoryList, ColdSegment, FeedConfig, FlashList, HotTransition,
    Pagination, SiteHeader,
};
use crate::services::partition::{self, PartitionLayout};
use crate::source::{ArticleQuery, ContentSource};

/// Header lookup result.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLookup {
    pub header: SiteHeader,
    /// True when the built-in header was served instead of CMS data
    pub fallback: bool,
    /// Why the CMS header could not be used, if it failed
    pub error: Option<String>,
}

/// Read-side feed operations.
#[derive(Clone)]
pub struct FlashService {
    source: Arc<dyn ContentSource>,
    layout: PartitionLayout,
    feed: FeedConfig,
}

impl FlashService {
    pub fn new(source: Arc<dyn ContentSource>, feed: &FeedConfig) -> Self {
        Self {
            source,
            layout: PartitionLayout::from_config(feed),
            feed: feed.clone(),
        }
    }

    pub fn layout(&self) -> PartitionLayout {
        self.layout
    }

    pub fn feed(&self) -> &FeedConfig {
        &self.feed
    }

    /// Name of the backing content source.
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    fn check_limit(&self, limit: u32) -> Result<()> {
        if limit < 1 || limit > self.feed.max_limit {
            return Err(AppError::validation(format!(
                "Invalid limit. Must be between 1 and {}",
                self.feed.max_limit
            )));
        }
        Ok(())
    }

    /// Identifier of the newest Cold article, 0 when everything is Hot.
    pub async fn cold_boundary(&self) -> Result<u64> {
        let newest = self.source.fetch_articles(&ArticleQuery::page(1, 1)).await?;
        let latest_id = newest.items.first().map(|a| a.id).unwrap_or(0);
        Ok(self.layout.cold_boundary(latest_id))
    }

    /// One page of the Hot window, newest first.
    ///
    /// Only identifiers above the cold boundary are served, so the last Hot
    /// page ends exactly where the newest Cold segment starts whatever the
    /// `limit`. `hasNext` is false on the last Hot page even when older
    /// articles exist; that page carries the transition metadata pointing at
    /// the newest Cold segment.
    pub async fn list_hot_page(&self, page: u32, limit: u32) -> Result<FlashList> {
        self.check_limit(limit)?;
        self.layout.check_hot_page(page, limit)?;

        let boundary = self.cold_boundary().await?;
        let batch = self
            .source
            .fetch_articles(&ArticleQuery::page(page, limit).above(boundary))
            .await?;
        let pagination = Pagination::from_total(page, limit, batch.total);
        let total_pages = pagination.total_pages;

        let meta = partition::is_last_hot_page(page, total_pages, self.layout.hot_pages_for(limit))
            .then(|| {
                let total_segments = self.layout.segments_below(boundary);
                HotTransition {
                    is_last_hot_page: true,
                    next_segment_id: (total_segments > 0).then_some(total_segments),
                    total_segments,
                }
            });

        log::debug!(
            "hot page {page}/{total_pages} limit={limit}: {} articles above id {boundary}",
            batch.items.len()
        );

        Ok(FlashList {
            flashes: batch.items,
            pagination,
            meta,
        })
    }

    /// One Cold segment with its deletion diff.
    pub async fn list_cold_segment(&self, segment_id: u32) -> Result<ColdSegment> {
        // Validates the id without touching the source.
        let nominal = self.layout.nominal_segment_range(segment_id)?;

        let range_query = ArticleQuery::id_range(nominal.start, nominal.end);
        let (batch, boundary) = futures::try_join!(
            self.source.fetch_articles(&range_query),
            self.cold_boundary(),
        )?;

        let range = self.layout.segment_range_below(segment_id, boundary)?;
        let total_segments = self.layout.segments_below(boundary);

        let mut flashes: Vec<Article> = batch
            .items
            .into_iter()
            .filter(|a| range.contains(a.id))
            .collect();
        flashes.sort_by(|a, b| b.id.cmp(&a.id));
        flashes.dedup_by_key(|a| a.id);

        let present: BTreeSet<u64> = flashes.iter().map(|a| a.id).collect();
        let deleted_ids: Vec<u64> = (range.start..=range.end)
            .filter(|id| !present.contains(id))
            .collect();

        if !deleted_ids.is_empty() {
            log::debug!(
                "segment {segment_id} [{}, {}]: {} deleted",
                range.start,
                range.end,
                deleted_ids.len()
            );
        }

        Ok(ColdSegment {
            segment_id,
            active_count: flashes.len(),
            flashes,
            previous_segment_id: (segment_id < total_segments).then(|| segment_id + 1),
            next_segment_id: (segment_id > 1).then(|| segment_id - 1),
            is_last_segment: segment_id == 1,
            total_segments,
            deleted_ids,
        })
    }

    /// A single article with related reading.
    ///
    /// Related articles share the article's first category, falling back to
    /// the newest articles overall when it has none.
    pub async fn get_article(&self, slug: &str) -> Result<ArticleDetail> {
        if slug.trim().is_empty() {
            return Err(AppError::validation("Invalid slug parameter"));
        }
        let flash = self
            .source
            .fetch_article_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found("Flash not found"))?;

        let mut query = ArticleQuery::page(1, self.feed.related_limit).excluding(flash.id);
        if let Some(category) = flash.categories.first() {
            query = query.in_category(category.slug.clone());
        }
        let related = self.source.fetch_articles(&query).await?;

        Ok(ArticleDetail {
            flash,
            related_flashes: related.items,
        })
    }

    /// A page of one category, newest first.
    pub async fn list_category(&self, slug: &str, page: u32) -> Result<FlashList> {
        if slug.trim().is_empty() {
            return Err(AppError::validation("Invalid slug parameter"));
        }
        if page < 1 {
            return Err(AppError::validation("Invalid page number. Must be a positive integer"));
        }

        let limit = self.feed.items_per_page;
        let batch = self
            .source
            .fetch_articles(&ArticleQuery::page(page, limit).in_category(slug))
            .await?;

        Ok(FlashList {
            flashes: batch.items,
            pagination: Pagination::from_total(page, limit, batch.total),
            meta: None,
        })
    }

    pub async fn list_categories(&self) -> Result<CategoryList> {
        let categories = self.source.fetch_categories().await?;
        Ok(CategoryList { categories })
    }

    /// Site header, or the built-in one when the CMS has none or fails.
    pub async fn get_header(&self) -> HeaderLookup {
        match self.source.fetch_header().await {
            Ok(Some(header)) => HeaderLookup {
                header,
                fallback: false,
                error: None,
            },
            Ok(None) => HeaderLookup {
                header: SiteHeader::default(),
                fallback: true,
                error: None,
            },
            Err(e) => {
                log::warn!("Header fetch failed, serving fallback: {e}");
                HeaderLookup {
                    header: SiteHeader::default(),
                    fallback: true,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::testing::{CountingSource, UnavailableSource};
    use crate::source::MemorySource;

    fn service(count: u64) -> (FlashService, Arc<MemorySource>) {
        let source = Arc::new(MemorySource::generated(count));
        (FlashService::new(source.clone(), &FeedConfig::default()), source)
    }

    fn ids(articles: &[Article]) -> Vec<u64> {
        articles.iter().map(|a| a.id).collect()
    }

    #[tokio::test]
    async fn test_last_hot_page_of_300() {
        let (service, _) = service(300);
        let list = service.list_hot_page(10, 25).await.unwrap();

        assert_eq!(ids(&list.flashes), (51..=75).rev().collect::<Vec<_>>());
        assert_eq!(list.pagination.total, 250);
        assert_eq!(list.pagination.total_pages, 10);
        assert!(!list.pagination.has_next);
        assert!(list.pagination.has_prev);

        let meta = list.meta.unwrap();
        assert!(meta.is_last_hot_page);
        assert_eq!(meta.total_segments, 2);
        assert_eq!(meta.next_segment_id, Some(2));
    }

    #[tokio::test]
    async fn test_first_hot_page_has_no_transition() {
        let (service, _) = service(300);
        let list = service.list_hot_page(1, 25).await.unwrap();
        assert_eq!(list.flashes[0].id, 300);
        assert!(list.pagination.has_next);
        assert!(!list.pagination.has_prev);
        assert!(list.meta.is_none());
    }

    #[tokio::test]
    async fn test_small_corpus_ends_before_hot_limit() {
        let (service, _) = service(60);
        let list = service.list_hot_page(3, 25).await.unwrap();
        assert_eq!(ids(&list.flashes), (1..=10).rev().collect::<Vec<_>>());
        assert_eq!(list.pagination.total_pages, 3);
        assert!(!list.pagination.has_next);

        let meta = list.meta.unwrap();
        assert_eq!(meta.total_segments, 0);
        assert_eq!(meta.next_segment_id, None);
    }

    #[tokio::test]
    async fn test_has_next_is_clamped_for_every_hot_page() {
        let (service, _) = service(1_000);
        for page in 1..=10 {
            let list = service.list_hot_page(page, 25).await.unwrap();
            assert_eq!(list.pagination.has_next, page < 10, "page={page}");
        }
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_rejected_without_fetch() {
        let source = Arc::new(CountingSource::new(MemorySource::generated(300)));
        let service = FlashService::new(source.clone(), &FeedConfig::default());

        for page in [0, 11, 500] {
            let err = service.list_hot_page(page, 25).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        let err = service.list_hot_page(1, 101).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid limit. Must be between 1 and 100");
        assert!(service.list_cold_segment(0).await.is_err());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_cold_segments_of_300() {
        let (service, _) = service(300);

        let newest = service.list_cold_segment(2).await.unwrap();
        assert_eq!(ids(&newest.flashes), (26..=50).rev().collect::<Vec<_>>());
        assert_eq!(newest.previous_segment_id, None);
        assert_eq!(newest.next_segment_id, Some(1));
        assert!(!newest.is_last_segment);
        assert_eq!(newest.total_segments, 2);
        assert_eq!(newest.active_count, 25);
        assert!(newest.deleted_ids.is_empty());

        let oldest = service.list_cold_segment(1).await.unwrap();
        assert_eq!(ids(&oldest.flashes), (1..=25).rev().collect::<Vec<_>>());
        assert_eq!(oldest.previous_segment_id, Some(2));
        assert_eq!(oldest.next_segment_id, None);
        assert!(oldest.is_last_segment);
    }

    #[tokio::test]
    async fn test_deleted_articles_surface_as_holes() {
        let (service, source) = service(300);
        source.remove(30).await;
        source.remove(44).await;

        let segment = service.list_cold_segment(2).await.unwrap();
        assert_eq!(segment.deleted_ids, vec![30, 44]);
        assert_eq!(segment.active_count, 23);
        assert_eq!(segment.active_count + segment.deleted_ids.len(), 25);
        assert!(segment.flashes.iter().all(|a| (26..=50).contains(&a.id)));
    }

    #[tokio::test]
    async fn test_deleted_hot_article_ageing_into_cold_leaves_no_gap() {
        let (service, source) = service(300);
        source.remove(280).await;
        for id in 301..=350 {
            source.insert(crate::source::memory::sample_article(id)).await;
        }

        let hot = service.list_hot_page(10, 25).await.unwrap();
        let oldest_hot = hot.flashes.last().map(|a| a.id).unwrap();
        let newest_segment = hot.meta.unwrap().next_segment_id.unwrap();
        let segment = service.list_cold_segment(newest_segment).await.unwrap();
        assert_eq!(segment.flashes[0].id, oldest_hot - 1);
    }

    #[tokio::test]
    async fn test_deleting_newest_cold_article_is_reported() {
        let (service, source) = service(300);
        source.remove(50).await;

        let segment = service.list_cold_segment(2).await.unwrap();
        assert_eq!(segment.flashes.first().map(|a| a.id), Some(49));
        assert_eq!(segment.deleted_ids, vec![50]);
        assert_eq!(segment.active_count, 24);

        // The Hot window still ends at 51.
        let hot = service.list_hot_page(10, 25).await.unwrap();
        assert_eq!(hot.flashes.last().map(|a| a.id), Some(51));
        assert_eq!(hot.meta.unwrap().next_segment_id, Some(2));
    }

    #[tokio::test]
    async fn test_hot_deletions_shorten_the_window() {
        let (service, source) = service(300);
        for id in [280, 120, 60] {
            source.remove(id).await;
        }
        let hot = service.list_hot_page(10, 25).await.unwrap();
        assert_eq!(hot.pagination.total, 247);
        let expected: Vec<u64> = (51..=73).rev().filter(|id| *id != 60).collect();
        assert_eq!(ids(&hot.flashes), expected);
        assert!(hot.meta.is_some());
    }

    async fn walk(service: &FlashService, limit: u32) -> Vec<u64> {
        let mut seen = Vec::new();
        let mut page = 1;
        let mut segment_id = loop {
            let list = service.list_hot_page(page, limit).await.unwrap();
            seen.extend(ids(&list.flashes));
            if let Some(meta) = list.meta {
                break meta.next_segment_id;
            }
            assert!(list.pagination.has_next, "limit={limit} page={page}");
            page += 1;
        };
        while let Some(id) = segment_id {
            let segment = service.list_cold_segment(id).await.unwrap();
            seen.extend(ids(&segment.flashes));
            segment_id = segment.next_segment_id;
        }
        seen
    }

    #[tokio::test]
    async fn test_walk_joins_hot_and_cold_for_any_limit() {
        let (service, _) = service(300);
        let expected: Vec<u64> = (1..=300).rev().collect();
        for limit in [10, 25, 40, 50, 100] {
            assert_eq!(walk(&service, limit).await, expected, "limit={limit}");
        }
    }

    #[tokio::test]
    async fn test_last_hot_page_for_small_limit() {
        let (service, _) = service(300);
        let list = service.list_hot_page(25, 10).await.unwrap();
        assert_eq!(ids(&list.flashes), (51..=60).rev().collect::<Vec<_>>());
        assert_eq!(list.pagination.total_pages, 25);
        assert_eq!(list.meta.unwrap().next_segment_id, Some(2));

        let err = service.list_hot_page(6, 50).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_segment_listing_is_idempotent() {
        let (service, source) = service(320);
        source.remove(7).await;
        let first = service.list_cold_segment(1).await.unwrap();
        let second = service.list_cold_segment(1).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_partial_newest_segment() {
        let (service, _) = service(310);
        let segment = service.list_cold_segment(3).await.unwrap();
        assert_eq!(ids(&segment.flashes), (51..=60).rev().collect::<Vec<_>>());
        assert_eq!(segment.active_count, 10);
        assert!(segment.deleted_ids.is_empty());
    }

    #[tokio::test]
    async fn test_segment_ids_survive_new_publishes() {
        let (service, source) = service(300);
        let before = service.list_cold_segment(1).await.unwrap();
        for id in 301..=350 {
            source.insert(crate::source::memory::sample_article(id)).await;
        }
        let after = service.list_cold_segment(1).await.unwrap();
        assert_eq!(before.flashes, after.flashes);
        assert_eq!(after.total_segments, 4);
        assert_eq!(after.previous_segment_id, Some(2));
    }

    #[tokio::test]
    async fn test_unknown_segment_is_not_found() {
        let (service, _) = service(300);
        let err = service.list_cold_segment(3).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let service = FlashService::new(Arc::new(UnavailableSource), &FeedConfig::default());
        let err = service.list_hot_page(1, 25).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), 500);
        assert!(service.list_cold_segment(1).await.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_get_article_with_related() {
        let (service, _) = service(50);
        let detail = service.get_article("flash-40").await.unwrap();
        assert_eq!(detail.flash.id, 40);
        assert_eq!(detail.related_flashes.len(), 5);
        let category = &detail.flash.categories[0].slug;
        assert!(detail
            .related_flashes
            .iter()
            .all(|a| a.id != 40 && a.in_category(category)));
    }

    #[tokio::test]
    async fn test_get_missing_article_is_not_found() {
        let (service, _) = service(5);
        let err = service.get_article("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_category_pages() {
        let (service, _) = service(300);
        let list = service.list_category("bitcoin", 1).await.unwrap();
        assert_eq!(list.pagination.total, 60);
        assert_eq!(list.pagination.total_pages, 3);
        assert_eq!(list.flashes.len(), 25);
        assert!(list.flashes.iter().all(|a| a.in_category("bitcoin")));
        assert!(list.meta.is_none());

        let empty = service.list_category("unknown", 1).await.unwrap();
        assert!(empty.flashes.is_empty());
        assert!(service.list_category("bitcoin", 0).await.is_err());
    }

    #[tokio::test]
    async fn test_header_falls_back() {
        let (service, source) = service(1);
        let lookup = service.get_header().await;
        assert!(lookup.fallback);
        assert!(lookup.error.is_none());

        let custom = SiteHeader {
            logo_text: "Custom".to_string(),
            ..SiteHeader::default()
        };
        source.set_header(custom.clone()).await;
        let lookup = service.get_header().await;
        assert!(!lookup.fallback);
        assert_eq!(lookup.header, custom);

        let failing = FlashService::new(Arc::new(UnavailableSource), &FeedConfig::default());
        let lookup = failing.get_header().await;
        assert!(lookup.fallback);
        assert!(lookup.error.is_some());
    }
}
