//! Article data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published flash article in canonical form.
///
/// Identifiers are assigned by the content source at publish time, grow
/// monotonically and are never reused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: u64,

    /// Unique, stable URL slug
    pub slug: String,

    pub title: String,

    /// Body markup
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub excerpt: String,

    /// Publish timestamp (absent only for malformed CMS entries)
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    pub author: Author,

    #[serde(default)]
    pub categories: Vec<Category>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<Image>,

    /// Advisory counters, never used for ordering or partitioning
    #[serde(default)]
    pub engagement: Engagement,

    /// Client-side "important only" filter flag
    #[serde(default)]
    pub is_important: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl Article {
    /// Slugs of all categories the article belongs to.
    pub fn category_slugs(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.slug.as_str())
    }

    /// Whether the article is filed under the given category.
    pub fn in_category(&self, slug: &str) -> bool {
        self.category_slugs().any(|s| s == slug)
    }
}

/// Author reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub id: u64,
    pub name: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            id: 0,
            name: "Unknown Author".to_string(),
        }
    }
}

/// Category reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordering hint for navigation
    #[serde(default)]
    pub display_order: i64,
}

/// Tag reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

/// Media reference with an absolute URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Engagement counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Engagement {
    pub views: u64,
    pub bullish: u64,
    pub bearish: u64,
}
