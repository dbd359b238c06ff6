// src/cache/tags.rs

//! Cache-tag policy.
//!
//! Read responses are cached at the edge with no expiry; correctness comes
//! from purging by tag when content changes. This module owns both halves:
//! the tag set each read response is annotated with, and the tag set each
//! change event purges. A purge is only effective if its tags intersect the
//! tags the affected responses were stored under, so both sides are built
//! from the same family constants.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::services::{Partition, PartitionLayout};
use crate::source::normalize::flatten_entry;

pub const HOT: &str = "flashes-hot";
pub const COLD: &str = "flashes-cold";
pub const LATEST: &str = "flashes-latest";
pub const UPDATES: &str = "flashes-updates";
pub const HISTORICAL: &str = "flashes-historical";
pub const CATEGORY: &str = "flashes-category";
pub const CATEGORIES: &str = "flashes-categories";
pub const DETAIL: &str = "flashes-detail";
pub const HEADER_CONFIG: &str = "header-config";
pub const HEADER_NAVIGATION: &str = "header-navigation";
pub const HEADER_GLOBAL: &str = "header-global";
pub const HEADER_FALLBACK: &str = "header-fallback";

/// Percent-encode a slug for use inside a tag.
fn encode(slug: &str) -> String {
    url::form_urlencoded::byte_serialize(slug.as_bytes()).collect()
}

/// A deduplicated set of cache tags.
///
/// Keeps insertion order for the header value; equality ignores order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheTags(Vec<String>);

impl CacheTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag unless already present.
    pub fn push(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.0.contains(&tag) {
            self.0.push(tag);
        }
    }

    pub fn with(mut self, tag: impl Into<String>) -> Self {
        self.push(tag);
        self
    }

    pub fn extend(&mut self, other: CacheTags) {
        for tag in other.0 {
            self.push(tag);
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Value for the `Cache-Tag` response header.
    pub fn to_header(&self) -> String {
        self.0.join(",")
    }

    fn as_set(&self) -> BTreeSet<&str> {
        self.iter().collect()
    }
}

impl PartialEq for CacheTags {
    fn eq(&self, other: &Self) -> bool {
        self.as_set() == other.as_set()
    }
}

impl Eq for CacheTags {}

impl<S: Into<String>> FromIterator<S> for CacheTags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = CacheTags::new();
        for tag in iter {
            tags.push(tag);
        }
        tags
    }
}

impl fmt::Display for CacheTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header())
    }
}

// --- Read-side tag generators ---

pub fn hot_tags(page: u32, limit: u32) -> CacheTags {
    CacheTags::from_iter([
        HOT.to_string(),
        format!("flashes-page-{page}"),
        LATEST.to_string(),
        format!("flashes-limit-{limit}"),
    ])
}

pub fn cold_tags(segment_id: u32) -> CacheTags {
    CacheTags::from_iter([
        COLD.to_string(),
        segment_tag(segment_id),
        HISTORICAL.to_string(),
    ])
}

pub fn segment_tag(segment_id: u32) -> String {
    format!("flashes-segment-{segment_id}")
}

pub fn updates_tags(last_id: u64) -> CacheTags {
    CacheTags::from_iter([
        UPDATES.to_string(),
        format!("flashes-check-{last_id}"),
        LATEST.to_string(),
    ])
}

pub fn category_tags(slug: &str, page: Option<u32>) -> CacheTags {
    let slug = encode(slug);
    let mut tags = CacheTags::from_iter([CATEGORY.to_string(), format!("flashes-category-{slug}")]);
    if let Some(page) = page {
        tags.push(format!("flashes-category-{slug}-page-{page}"));
    }
    tags
}

pub fn categories_index_tags() -> CacheTags {
    CacheTags::from_iter([CATEGORY, CATEGORIES])
}

pub fn detail_tags(id: u64, slug: &str) -> CacheTags {
    CacheTags::from_iter([
        DETAIL.to_string(),
        format!("flashes-{id}"),
        format!("flashes-slug-{}", encode(slug)),
    ])
}

pub fn header_tags(fallback: bool) -> CacheTags {
    let navigation = if fallback { HEADER_FALLBACK } else { HEADER_NAVIGATION };
    CacheTags::from_iter([HEADER_CONFIG, navigation, HEADER_GLOBAL])
}

/// What kind of response a cache entry holds, reported in `X-Cache-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheType {
    Hot,
    Cold,
    Updates,
    Category,
    Detail,
    Header,
}

impl CacheType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheType::Hot => "hot",
            CacheType::Cold => "cold",
            CacheType::Updates => "updates",
            CacheType::Category => "category",
            CacheType::Detail => "detail",
            CacheType::Header => "header",
        }
    }
}

/// Freshness class of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Cached until purged
    Permanent,
    /// Never cached (errors, webhooks)
    NoStore,
}

impl Freshness {
    pub fn cache_control(&self) -> &'static str {
        match self {
            Freshness::Permanent => "public, max-age=31536000, immutable",
            Freshness::NoStore => "no-store",
        }
    }

    pub fn cdn_cache_control(&self) -> Option<&'static str> {
        match self {
            Freshness::Permanent => Some("public, max-age=31536000"),
            Freshness::NoStore => None,
        }
    }
}

// --- Purge side ---

/// Content change category driving a purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeEvent {
    /// New or edited Hot article
    SingleUpdate,
    /// Edit to an article that already aged into Cold
    HistoricalUpdate { segment: Option<u32> },
    DeleteArticle,
    /// Layout/style deploy; no content tags
    StyleUpdate,
    /// Invalidate every content family
    CacheRebuild,
    HeaderChange,
    CategoryChange,
}

impl PurgeEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurgeEvent::SingleUpdate => "single_update",
            PurgeEvent::HistoricalUpdate { .. } => "historical_update",
            PurgeEvent::DeleteArticle => "delete_article",
            PurgeEvent::StyleUpdate => "style_update",
            PurgeEvent::CacheRebuild => "cache_rebuild",
            PurgeEvent::HeaderChange => "header_change",
            PurgeEvent::CategoryChange => "category_change",
        }
    }

    /// Base tag set purged for this event.
    pub fn tags(&self) -> CacheTags {
        match self {
            PurgeEvent::SingleUpdate => CacheTags::from_iter([HOT, LATEST, UPDATES]),
            PurgeEvent::HistoricalUpdate { segment: None } => CacheTags::from_iter([COLD]),
            PurgeEvent::HistoricalUpdate { segment: Some(id) } => {
                CacheTags::from_iter([segment_tag(*id)])
            }
            PurgeEvent::DeleteArticle => CacheTags::from_iter([HOT, COLD, LATEST]),
            PurgeEvent::StyleUpdate => CacheTags::new(),
            PurgeEvent::CacheRebuild => CacheTags::from_iter([
                HOT, COLD, UPDATES, CATEGORY, LATEST, HISTORICAL, DETAIL,
            ]),
            PurgeEvent::HeaderChange => CacheTags::from_iter([
                HEADER_CONFIG,
                HEADER_NAVIGATION,
                HEADER_GLOBAL,
                HEADER_FALLBACK,
            ]),
            PurgeEvent::CategoryChange => CacheTags::from_iter([CATEGORY]),
        }
    }
}

impl fmt::Display for PurgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurgeEvent::HistoricalUpdate { segment: Some(id) } => {
                write!(f, "{} (segment {id})", self.as_str())
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

impl FromStr for PurgeEvent {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "single" | "single_update" => Ok(PurgeEvent::SingleUpdate),
            "historical" | "historical_update" => Ok(PurgeEvent::HistoricalUpdate { segment: None }),
            "delete" | "delete_article" => Ok(PurgeEvent::DeleteArticle),
            "style" | "style_update" => Ok(PurgeEvent::StyleUpdate),
            "rebuild" | "cache_rebuild" => Ok(PurgeEvent::CacheRebuild),
            "header" | "header_change" => Ok(PurgeEvent::HeaderChange),
            "category" | "category_change" => Ok(PurgeEvent::CategoryChange),
            other => Err(AppError::validation(format!("unknown purge event '{other}'"))),
        }
    }
}

/// Cold segments a change reaches beyond its event's base tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SegmentReach {
    #[default]
    None,
    /// These segments' served ranges changed
    Segments(Vec<u32>),
    /// Which segments changed is unknown; purge the whole Cold family
    AllCold,
}

/// A purge event plus the article it concerns, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub event: PurgeEvent,
    pub article_id: Option<u64>,
    pub slug: Option<String>,
    pub categories: Vec<String>,
    pub segments: SegmentReach,
}

impl ContentChange {
    pub fn new(event: PurgeEvent) -> Self {
        Self {
            event,
            article_id: None,
            slug: None,
            categories: Vec::new(),
            segments: SegmentReach::None,
        }
    }

    /// Event tags plus the tags of every response showing this article.
    pub fn tags(&self) -> CacheTags {
        let mut tags = self.event.tags();
        if let Some(id) = self.article_id {
            tags.push(format!("flashes-{id}"));
        }
        if let Some(slug) = &self.slug {
            tags.push(format!("flashes-slug-{}", encode(slug)));
        }
        for category in &self.categories {
            tags.push(format!("flashes-category-{}", encode(category)));
        }
        match &self.segments {
            SegmentReach::None => {}
            SegmentReach::Segments(ids) => {
                for id in ids {
                    tags.push(segment_tag(*id));
                }
            }
            SegmentReach::AllCold => tags.push(COLD),
        }
        tags
    }
}

/// CMS webhook body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub entry: Value,
}

impl WebhookPayload {
    /// Identifier of the changed entry.
    pub fn entry_id(&self) -> Option<u64> {
        let entry = flatten_entry(&self.entry);
        match entry.get("id")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn entry_slug(&self) -> Option<String> {
        flatten_entry(&self.entry)
            .get("slug")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn entry_categories(&self) -> Vec<String> {
        let entry = flatten_entry(&self.entry);
        let Some(categories) = entry.get("categories") else {
            return Vec::new();
        };
        let list = categories.get("data").unwrap_or(categories);
        list.as_array()
            .map(|items| {
                items
                    .iter()
                    .map(flatten_entry)
                    .filter_map(|c| c.get("slug").and_then(Value::as_str).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn is_flash_model(&self) -> bool {
        matches!(self.model.as_str(), "flash" | "flashes" | "api::flash.flash")
    }

    /// Map the webhook onto a purge plan.
    ///
    /// `cold_boundary` is the id of the newest Cold article after the change.
    /// It tells Hot edits from historical ones, and names the segments a
    /// publish pushed articles into. When unknown an edit is treated as Hot.
    pub fn classify(&self, layout: &PartitionLayout, cold_boundary: Option<u64>) -> ContentChange {
        match self.model.as_str() {
            "header" => return ContentChange::new(PurgeEvent::HeaderChange),
            "category" | "categories" => return ContentChange::new(PurgeEvent::CategoryChange),
            _ if !self.is_flash_model() => return ContentChange::new(PurgeEvent::StyleUpdate),
            _ => {}
        }

        let article_id = self.entry_id();
        let event = match self.event.as_str() {
            "entry.delete" | "entry.unpublish" => PurgeEvent::DeleteArticle,
            "entry.update" => match (article_id, cold_boundary) {
                (Some(id), Some(boundary)) => match layout.locate(id, boundary) {
                    Partition::Hot { .. } => PurgeEvent::SingleUpdate,
                    Partition::Cold { segment_id } => PurgeEvent::HistoricalUpdate {
                        segment: Some(segment_id),
                    },
                },
                _ => PurgeEvent::SingleUpdate,
            },
            _ => PurgeEvent::SingleUpdate,
        };

        // Publishing moves the boundary up, growing the newest segment.
        let segments = match (self.event.as_str(), cold_boundary) {
            ("entry.create" | "entry.publish", Some(boundary)) => {
                SegmentReach::Segments(layout.moving_segments(boundary))
            }
            ("entry.create" | "entry.publish", None) => SegmentReach::AllCold,
            _ => SegmentReach::None,
        };

        ContentChange {
            event,
            article_id,
            slug: self.entry_slug(),
            categories: self.entry_categories(),
            segments,
        }
    }
}
