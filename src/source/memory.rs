//! In-memory content source.
//!
//! Holds a corpus in process, for local runs without a CMS and for tests.
//! Publishing and deleting go through [`MemorySource::insert`] and
//! [`MemorySource::remove`] so the feed can be observed reacting to content
//! changes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{Article, Author, Category, Engagement, SiteHeader, Tag};
use crate::source::{ArticleBatch, ArticleQuery, ContentSource, Window};

const CATEGORIES: [(&str, &str); 5] = [
    ("bitcoin", "Bitcoin"),
    ("ethereum-solana", "Ethereum/Solana"),
    ("haberler", "Haberler"),
    ("piyasa", "Piyasa"),
    ("zincir-ustu", "Zincir Üstü"),
];

const TAGS: [(&str, &str); 4] = [
    ("btc", "BTC"),
    ("eth", "ETH"),
    ("usdt", "USDT"),
    ("etf", "ETF"),
];

/// Content source backed by an in-process map.
#[derive(Debug, Default)]
pub struct MemorySource {
    articles: RwLock<BTreeMap<u64, Article>>,
    header: RwLock<Option<SiteHeader>>,
}

impl MemorySource {
    /// Create a source holding the given articles.
    pub fn new(articles: impl IntoIterator<Item = Article>) -> Self {
        Self {
            articles: RwLock::new(articles.into_iter().map(|a| (a.id, a)).collect()),
            header: RwLock::new(None),
        }
    }

    /// Create a source with `count` generated articles, ids `1..=count`.
    pub fn generated(count: u64) -> Self {
        Self::new((1..=count).map(sample_article))
    }

    /// Publish or replace an article.
    pub async fn insert(&self, article: Article) {
        self.articles.write().await.insert(article.id, article);
    }

    /// Delete an article, returning it if it existed.
    pub async fn remove(&self, id: u64) -> Option<Article> {
        self.articles.write().await.remove(&id)
    }

    pub async fn set_header(&self, header: SiteHeader) {
        *self.header.write().await = Some(header);
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_articles(&self, query: &ArticleQuery) -> Result<ArticleBatch> {
        let articles = self.articles.read().await;
        let matching: Vec<&Article> = articles.values().rev().filter(|a| query.matches(a)).collect();
        let total = matching.len() as u64;

        let items: Vec<Article> = match query.window {
            Window::Page { page, page_size } => {
                let skip = (page.max(1) as usize - 1) * page_size as usize;
                matching
                    .into_iter()
                    .skip(skip)
                    .take(page_size as usize)
                    .cloned()
                    .collect()
            }
            Window::IdRange { .. } => matching.into_iter().cloned().collect(),
            Window::NewerThan { page_size, .. } => matching
                .into_iter()
                .take(page_size as usize)
                .cloned()
                .collect(),
        };

        Ok(ArticleBatch { items, total })
    }

    async fn fetch_article_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let articles = self.articles.read().await;
        Ok(articles.values().find(|a| a.slug == slug).cloned())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let articles = self.articles.read().await;
        let mut by_slug: BTreeMap<&str, &Category> = BTreeMap::new();
        for category in articles.values().flat_map(|a| a.categories.iter()) {
            by_slug.entry(category.slug.as_str()).or_insert(category);
        }
        let mut categories: Vec<Category> = by_slug.into_values().cloned().collect();
        categories.sort_by_key(|c| (c.display_order, c.id));
        Ok(categories)
    }

    async fn fetch_header(&self) -> Result<Option<SiteHeader>> {
        Ok(self.header.read().await.clone())
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Deterministic article for identifier `id`.
pub fn sample_article(id: u64) -> Article {
    let (cat_slug, cat_name) = CATEGORIES[(id as usize) % CATEGORIES.len()];
    let (tag_slug, tag_name) = TAGS[(id as usize) % TAGS.len()];
    let category_id = (id as usize % CATEGORIES.len()) as u64 + 1;
    let published = base_time() + Duration::minutes(id as i64 * 17);

    Article {
        id,
        slug: format!("flash-{id}"),
        title: format!("Flash #{id}: {cat_name} piyasa güncellemesi"),
        content: format!("<p>{cat_name} ile ilgili {id} numaralı flaş haber.</p>"),
        excerpt: format!("{cat_name} flaş haber {id}"),
        published_at: Some(published),
        updated_at: Some(published),
        author: Author {
            id: id % 3 + 1,
            name: ["Ayşe Demir", "Mehmet Kaya", "Elif Şahin"][(id % 3) as usize].to_string(),
        },
        categories: vec![Category {
            id: category_id,
            name: cat_name.to_string(),
            slug: cat_slug.to_string(),
            description: None,
            display_order: category_id as i64,
        }],
        tags: vec![Tag {
            id: (id as usize % TAGS.len()) as u64 + 1,
            name: tag_name.to_string(),
            slug: tag_slug.to_string(),
        }],
        featured_image: None,
        engagement: Engagement {
            views: id * 13 % 1000,
            bullish: id % 11,
            bearish: id % 5,
        },
        is_important: id % 7 == 0,
        source_url: None,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn ids(batch: &ArticleBatch) -> Vec<u64> {
        batch.items.iter().map(|a| a.id).collect()
    }

    #[tokio::test]
    async fn test_page_window_is_newest_first() {
        let source = MemorySource::generated(60);
        let batch = source.fetch_articles(&ArticleQuery::page(2, 25)).await.unwrap();
        assert_eq!(batch.total, 60);
        assert_eq!(ids(&batch), (11..=35).rev().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_id_range_skips_removed() {
        let source = MemorySource::generated(50);
        source.remove(30).await;
        let batch = source.fetch_articles(&ArticleQuery::id_range(26, 35)).await.unwrap();
        assert_eq!(ids(&batch), vec![35, 34, 33, 32, 31, 29, 28, 27, 26]);
        assert_eq!(batch.total, 9);
    }

    #[tokio::test]
    async fn test_newer_than_counts_all_but_returns_page() {
        let source = MemorySource::generated(100);
        let batch = source.fetch_articles(&ArticleQuery::newer_than(90, 1)).await.unwrap();
        assert_eq!(batch.total, 10);
        assert_eq!(ids(&batch), vec![100]);
    }

    #[tokio::test]
    async fn test_category_filter() {
        let source = MemorySource::generated(50);
        let batch = source
            .fetch_articles(&ArticleQuery::page(1, 100).in_category("bitcoin"))
            .await
            .unwrap();
        assert_eq!(batch.total, 10);
        assert!(batch.items.iter().all(|a| a.in_category("bitcoin")));
    }

    #[tokio::test]
    async fn test_lookup_by_slug() {
        let source = MemorySource::generated(5);
        let found = source.fetch_article_by_slug("flash-3").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(3));
        assert!(source.fetch_article_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_categories_are_deduplicated_in_display_order() {
        let source = MemorySource::generated(20);
        let categories = source.fetch_categories().await.unwrap();
        assert_eq!(categories.len(), CATEGORIES.len());
        let orders: Vec<i64> = categories.iter().map(|c| c.display_order).collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted);
    }

    #[tokio::test]
    async fn test_insert_becomes_newest() {
        let source = MemorySource::generated(10);
        source.insert(sample_article(11)).await;
        let newest = source.fetch_articles(&ArticleQuery::page(1, 1)).await.unwrap();
        assert_eq!(newest.items[0].id, 11);
        assert_eq!(newest.total, 11);
    }
}
