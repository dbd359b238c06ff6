//! Response shapes of the feed operations.
//!
//! Field names serialize in camelCase; they are the wire contract consumed by
//! the timeline UI.

use serde::{Deserialize, Serialize};

use crate::models::{Article, Category};

/// Page-number pagination metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Build pagination for `total` items split into pages of `limit`.
    pub fn from_total(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(limit.max(1)));
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Metadata attached to the last Hot page, pointing at the Cold path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HotTransition {
    pub is_last_hot_page: bool,
    /// Newest cold segment; absent when the corpus fits in the Hot window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_segment_id: Option<u32>,
    pub total_segments: u32,
}

/// A page of articles (Hot page or category page).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlashList {
    pub flashes: Vec<Article>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<HotTransition>,
}

/// A Cold segment.
///
/// Direction convention: `next_segment_id` is the next step of a "load more"
/// walk (`id - 1`), `previous_segment_id` steps back (`id + 1`), and the walk
/// terminates at segment 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColdSegment {
    pub segment_id: u32,
    pub flashes: Vec<Article>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_segment_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_segment_id: Option<u32>,
    pub is_last_segment: bool,
    pub total_segments: u32,
    pub active_count: usize,
    /// Identifiers inside the segment range the content source no longer returns
    pub deleted_ids: Vec<u64>,
}

/// Result of an update check against a watermark.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheck {
    pub new_count: u64,
    pub latest_id: u64,
    pub has_updates: bool,
}

/// Single article with related reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetail {
    pub flash: Article,
    pub related_flashes: Vec<Article>,
}

/// Category index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryList {
    pub categories: Vec<Category>,
}
