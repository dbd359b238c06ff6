//! Content source abstractions.
//!
//! The feed never talks to the CMS directly; it goes through a
//! [`ContentSource`], which returns canonical [`Article`] records:
//!
//! - `StrapiSource`: the headless CMS over HTTP
//! - `MemorySource`: an in-process corpus for local runs and tests
//!
//! ## Identifier contract
//!
//! Implementations must hand out identifiers that are assigned once at
//! publish time, strictly increasing and contiguous from 1. A hole in the
//! sequence is read as a deletion; a source that skips identifiers on publish
//! will show those identifiers as deleted in Cold segments.

pub mod memory;
pub mod normalize;
pub mod strapi;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Article, Category, Config, SiteHeader, SourceKind};

// Re-export for convenience
pub use memory::MemorySource;
pub use strapi::StrapiSource;

/// Which slice of the identifier-ordered corpus to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Page-number pagination, 1-based
    Page { page: u32, page_size: u32 },
    /// Inclusive identifier range
    IdRange { start: u64, end: u64 },
    /// Identifiers strictly greater than `id`
    NewerThan { id: u64, page_size: u32 },
}

/// Article query. Results are always sorted by identifier, descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    pub window: Window,
    /// Restrict to a category slug
    pub category: Option<String>,
    /// Only identifiers strictly greater than this
    pub above_id: Option<u64>,
    /// Leave out one article
    pub exclude_id: Option<u64>,
}

impl ArticleQuery {
    pub fn page(page: u32, page_size: u32) -> Self {
        Self::from_window(Window::Page { page, page_size })
    }

    pub fn id_range(start: u64, end: u64) -> Self {
        Self::from_window(Window::IdRange { start, end })
    }

    pub fn newer_than(id: u64, page_size: u32) -> Self {
        Self::from_window(Window::NewerThan { id, page_size })
    }

    pub fn in_category(mut self, slug: impl Into<String>) -> Self {
        self.category = Some(slug.into());
        self
    }

    pub fn above(mut self, id: u64) -> Self {
        self.above_id = Some(id);
        self
    }

    pub fn excluding(mut self, id: u64) -> Self {
        self.exclude_id = Some(id);
        self
    }

    fn from_window(window: Window) -> Self {
        Self {
            window,
            category: None,
            above_id: None,
            exclude_id: None,
        }
    }

    /// Whether an article passes the query's filters (window included).
    pub fn matches(&self, article: &Article) -> bool {
        let in_window = match self.window {
            Window::Page { .. } => true,
            Window::IdRange { start, end } => (start..=end).contains(&article.id),
            Window::NewerThan { id, .. } => article.id > id,
        };
        in_window
            && self.above_id.is_none_or(|id| article.id > id)
            && self.exclude_id != Some(article.id)
            && self
                .category
                .as_deref()
                .is_none_or(|slug| article.in_category(slug))
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleBatch {
    /// Matching articles in this page, newest first
    pub items: Vec<Article>,
    /// Number of articles matching the filters across all pages
    pub total: u64,
}

/// Trait for content source backends.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Short name reported in response metadata.
    fn name(&self) -> &'static str;

    /// Fetch articles matching `query`, newest identifier first.
    async fn fetch_articles(&self, query: &ArticleQuery) -> Result<ArticleBatch>;

    /// Fetch one article by slug.
    async fn fetch_article_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    /// All categories, in display order.
    async fn fetch_categories(&self) -> Result<Vec<Category>>;

    /// Site header configuration, if the source carries one.
    async fn fetch_header(&self) -> Result<Option<SiteHeader>>;
}

/// Build the content source selected by configuration.
pub fn from_config(config: &Config) -> Result<Arc<dyn ContentSource>> {
    let source: Arc<dyn ContentSource> = match config.source.kind {
        SourceKind::Strapi => Arc::new(StrapiSource::new(&config.source)?),
        SourceKind::Memory => {
            log::info!(
                "Using in-memory content source with {} articles",
                config.source.memory_seed_count
            );
            Arc::new(MemorySource::generated(config.source.memory_seed_count))
        }
    };
    Ok(source)
}
