//! CMS payload normalization.
//!
//! Strapi answers in two shapes depending on its major version: flat entries
//! (v5) and `{ id, attributes: {..} }` entries with relations wrapped in
//! `{ data: .. }` (v4). Everything is flattened here before it reaches the
//! canonical models, so the rest of the crate never sees either shape.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::models::{
    Article, Author, Category, Engagement, Image, Logo, NavChild, NavItem, SiteHeader, Tag,
    TopBar,
};

/// Flatten a v4 `{ id, attributes }` entry; v5 entries pass through.
pub fn flatten_entry(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return value.clone();
    };
    let Some(attributes) = obj.get("attributes").and_then(Value::as_object) else {
        return value.clone();
    };

    let mut flat = attributes.clone();
    if let Some(id) = obj.get("id") {
        flat.insert("id".to_string(), id.clone());
    }
    Value::Object(flat)
}

/// Unwrap a relation field: `{ data: X }` → `X`, then flatten.
///
/// Returns `None` for missing or null relations.
fn relation(value: Option<&Value>) -> Option<Value> {
    let value = value?;
    let inner = match value.as_object().and_then(|o| o.get("data")) {
        Some(data) => data,
        None => value,
    };
    match inner {
        Value::Null => None,
        Value::Array(items) => Some(Value::Array(items.iter().map(flatten_entry).collect())),
        other => Some(flatten_entry(other)),
    }
}

fn relation_list(value: Option<&Value>) -> Vec<Value> {
    match relation(value) {
        Some(Value::Array(items)) => items,
        Some(single @ Value::Object(_)) => vec![single],
        _ => Vec::new(),
    }
}

/// First present key among aliases.
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn str_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    field(obj, keys).and_then(Value::as_str).map(str::to_string)
}

fn u64_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    field(obj, keys).and_then(|v| match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

fn i64_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    field(obj, keys).and_then(Value::as_i64)
}

fn bool_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    field(obj, keys).and_then(Value::as_bool)
}

fn time_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<DateTime<Utc>> {
    str_field(obj, keys)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Prefix a CMS-relative media path with the CMS base URL.
pub fn absolute_url(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//") {
        url.to_string()
    } else {
        format!("{}{}", base_url.trim_end_matches('/'), url)
    }
}

/// Convert one CMS flash entry into an [`Article`].
pub fn article(value: &Value, base_url: &str) -> Result<Article> {
    let flat = flatten_entry(value);
    let obj = flat
        .as_object()
        .ok_or_else(|| AppError::upstream(None, "flash entry is not an object"))?;

    let id = u64_field(obj, &["id"])
        .ok_or_else(|| AppError::upstream(None, "flash entry has no numeric id"))?;
    let slug = str_field(obj, &["slug"]).unwrap_or_else(|| id.to_string());

    let author = relation(obj.get("author"))
        .as_ref()
        .and_then(Value::as_object)
        .and_then(|a| {
            Some(Author {
                id: u64_field(a, &["id"]).unwrap_or_default(),
                name: str_field(a, &["name"])?,
            })
        })
        .unwrap_or_default();

    let categories = relation_list(obj.get("categories"))
        .iter()
        .filter_map(Value::as_object)
        .filter_map(category_from)
        .collect();

    let tags = relation_list(obj.get("tags"))
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|t| {
            Some(Tag {
                id: u64_field(t, &["id"])?,
                name: str_field(t, &["name"]).unwrap_or_default(),
                slug: str_field(t, &["slug"])?,
            })
        })
        .collect();

    let featured_image = relation(obj.get("featured_image").or_else(|| obj.get("featuredImage")))
        .as_ref()
        .and_then(Value::as_object)
        .and_then(|img| {
            let url = str_field(img, &["url"])?;
            Some(Image {
                url: absolute_url(base_url, &url),
                alt: str_field(img, &["alternativeText", "alt"]).unwrap_or_default(),
                width: u64_field(img, &["width"]).and_then(|w| u32::try_from(w).ok()),
                height: u64_field(img, &["height"]).and_then(|h| u32::try_from(h).ok()),
            })
        });

    Ok(Article {
        id,
        slug,
        title: str_field(obj, &["title"]).unwrap_or_default(),
        content: str_field(obj, &["content"]).unwrap_or_default(),
        excerpt: str_field(obj, &["excerpt"]).unwrap_or_default(),
        published_at: time_field(obj, &["published_datetime", "publishedAt", "published_at"]),
        updated_at: time_field(obj, &["updatedAt", "updated_at"]),
        author,
        categories,
        tags,
        featured_image,
        engagement: Engagement {
            views: u64_field(obj, &["view_count", "views", "viewCount"]).unwrap_or_default(),
            bullish: u64_field(obj, &["bullish_count", "bullishCount"]).unwrap_or_default(),
            bearish: u64_field(obj, &["bearish_count", "bearishCount"]).unwrap_or_default(),
        },
        is_important: bool_field(obj, &["is_important", "isImportant"]).unwrap_or(false),
        source_url: str_field(obj, &["source_url", "sourceUrl"]),
    })
}

fn category_from(obj: &Map<String, Value>) -> Option<Category> {
    Some(Category {
        id: u64_field(obj, &["id"])?,
        name: str_field(obj, &["name"]).unwrap_or_default(),
        slug: str_field(obj, &["slug"])?,
        description: str_field(obj, &["description"]),
        display_order: i64_field(obj, &["display_order", "displayOrder"]).unwrap_or_default(),
    })
}

/// Convert one CMS category entry.
pub fn category(value: &Value) -> Option<Category> {
    let flat = flatten_entry(value);
    flat.as_object().and_then(category_from)
}

fn is_active(obj: &Map<String, Value>) -> bool {
    bool_field(obj, &["isActive", "is_active"]) != Some(false)
}

fn logo(value: Option<&Value>, base_url: &str, fallback: Logo) -> Logo {
    relation(value)
        .as_ref()
        .and_then(Value::as_object)
        .and_then(|img| {
            let url = str_field(img, &["url"])?;
            Some(Logo {
                url: absolute_url(base_url, &url),
                alt: str_field(img, &["alternativeText", "alt"])
                    .filter(|a| !a.is_empty())
                    .unwrap_or(fallback.alt.clone()),
            })
        })
        .unwrap_or(fallback)
}

fn nav_child(obj: &Map<String, Value>) -> NavChild {
    NavChild {
        id: u64_field(obj, &["id"]).unwrap_or_default(),
        title: str_field(obj, &["title"]).unwrap_or_default(),
        url: str_field(obj, &["url"]).unwrap_or_default(),
        description: str_field(obj, &["description"]).unwrap_or_default(),
        icon: str_field(obj, &["icon"]).unwrap_or_default(),
        is_external: bool_field(obj, &["isExternal"]).unwrap_or(false),
        open_in_new_tab: bool_field(obj, &["openInNewTab"]).unwrap_or(false),
        order: i64_field(obj, &["order"]).unwrap_or_default(),
        badge: str_field(obj, &["badge"]).unwrap_or_default(),
        css_class: str_field(obj, &["cssClass"]).unwrap_or_default(),
    }
}

/// Active entries of a component list, sorted by their `order` field.
fn active_sorted(value: Option<&Value>) -> Option<Vec<&Map<String, Value>>> {
    let items = value?.as_array()?;
    let mut active: Vec<&Map<String, Value>> = items
        .iter()
        .filter_map(Value::as_object)
        .filter(|o| is_active(o))
        .collect();
    active.sort_by_key(|o| i64_field(o, &["order"]).unwrap_or_default());
    Some(active)
}

/// Convert the CMS header single-type, filling gaps from the built-in default.
pub fn header(value: &Value, base_url: &str) -> SiteHeader {
    let defaults = SiteHeader::default();
    let flat = flatten_entry(value);
    let Some(obj) = flat.as_object() else {
        return defaults;
    };

    let main_navigation = active_sorted(obj.get("mainNavigation"))
        .map(|items| {
            items
                .into_iter()
                .map(|item| NavItem {
                    text: str_field(item, &["title", "text"]).unwrap_or_default(),
                    url: str_field(item, &["url"]).unwrap_or_default(),
                    has_dropdown: bool_field(item, &["hasDropdown"]).unwrap_or(false),
                    children: active_sorted(item.get("dropdownItems"))
                        .unwrap_or_default()
                        .into_iter()
                        .map(nav_child)
                        .collect(),
                })
                .collect()
        })
        .unwrap_or(defaults.main_navigation);

    let top_bar = obj
        .get("topBar")
        .and_then(Value::as_object)
        .map(|bar| {
            let fallback = TopBar::default();
            TopBar {
                enable_top_bar: bool_field(bar, &["enableTopBar"]).unwrap_or(fallback.enable_top_bar),
                background_color: str_field(bar, &["backgroundColor"])
                    .filter(|s| !s.is_empty())
                    .unwrap_or(fallback.background_color),
                height: str_field(bar, &["height"])
                    .filter(|s| !s.is_empty())
                    .unwrap_or(fallback.height),
            }
        })
        .unwrap_or(defaults.top_bar);

    SiteHeader {
        logo_text: str_field(obj, &["logoText"])
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.logo_text),
        logo_url: str_field(obj, &["logoUrl"])
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.logo_url),
        logo_light: logo(obj.get("logoLight"), base_url, defaults.logo_light),
        logo_dark: logo(obj.get("logoDark"), base_url, defaults.logo_dark),
        main_navigation,
        enable_search: bool_field(obj, &["enableSearch"]).unwrap_or(defaults.enable_search),
        search_placeholder: str_field(obj, &["searchPlaceholder"])
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.search_placeholder),
        top_bar,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const BASE: &str = "https://cms.example.com";

    #[test]
    fn test_flat_v5_entry() {
        let entry = json!({
            "id": 42,
            "documentId": "abc",
            "title": "BTC breaks out",
            "slug": "btc-breaks-out",
            "content": "<p>body</p>",
            "published_datetime": "2025-06-01T10:00:00.000Z",
            "is_important": true,
            "view_count": 12,
            "bullish_count": 3,
            "author": { "id": 7, "name": "Ayşe" },
            "categories": [{ "id": 1, "name": "Bitcoin", "slug": "bitcoin", "display_order": 2 }],
            "featured_image": { "url": "/uploads/a.png", "alternativeText": "chart" }
        });

        let article = article(&entry, BASE).unwrap();
        assert_eq!(article.id, 42);
        assert_eq!(article.slug, "btc-breaks-out");
        assert!(article.is_important);
        assert_eq!(article.engagement.views, 12);
        assert_eq!(article.engagement.bullish, 3);
        assert_eq!(article.author.name, "Ayşe");
        assert_eq!(article.categories[0].display_order, 2);
        assert!(article.published_at.is_some());
        let image = article.featured_image.unwrap();
        assert_eq!(image.url, "https://cms.example.com/uploads/a.png");
        assert_eq!(image.alt, "chart");
    }

    #[test]
    fn test_v4_attributes_and_relation_wrappers() {
        let entry = json!({
            "id": 9,
            "attributes": {
                "title": "ETH",
                "slug": "eth",
                "publishedAt": "2025-06-01T10:00:00Z",
                "isImportant": false,
                "author": { "data": { "id": 2, "attributes": { "name": "Mehmet" } } },
                "categories": { "data": [{ "id": 3, "attributes": { "name": "Ethereum", "slug": "ethereum-solana" } }] },
                "featured_image": { "data": null }
            }
        });

        let article = article(&entry, BASE).unwrap();
        assert_eq!(article.id, 9);
        assert_eq!(article.author, Author { id: 2, name: "Mehmet".into() });
        assert_eq!(article.categories[0].slug, "ethereum-solana");
        assert!(article.featured_image.is_none());
    }

    #[test]
    fn test_missing_author_defaults() {
        let entry = json!({ "id": 1, "slug": "a", "title": "t" });
        let article = article(&entry, BASE).unwrap();
        assert_eq!(article.author.name, "Unknown Author");
        assert_eq!(article.engagement, Engagement::default());
    }

    #[test]
    fn test_entry_without_id_is_rejected() {
        assert!(article(&json!({ "slug": "x" }), BASE).is_err());
    }

    #[test]
    fn test_absolute_url_keeps_absolute() {
        assert_eq!(absolute_url(BASE, "https://cdn.x/a.png"), "https://cdn.x/a.png");
        assert_eq!(absolute_url("https://cms.example.com/", "/a.png"), "https://cms.example.com/a.png");
    }

    #[test]
    fn test_header_filters_inactive_and_sorts() {
        let data = json!({
            "logoText": "KS",
            "logoLight": { "url": "/uploads/light.png" },
            "mainNavigation": [
                { "title": "B", "url": "/b", "order": 2 },
                { "title": "Hidden", "url": "/h", "order": 0, "isActive": false },
                { "title": "A", "url": "/a", "order": 1, "hasDropdown": true,
                  "dropdownItems": [
                      { "id": 2, "title": "two", "url": "/2", "order": 2 },
                      { "id": 1, "title": "one", "url": "/1", "order": 1 }
                  ] }
            ],
            "topBar": { "backgroundColor": "#000" }
        });

        let header = header(&data, BASE);
        assert_eq!(header.logo_text, "KS");
        assert_eq!(header.logo_light.url, "https://cms.example.com/uploads/light.png");
        assert_eq!(header.logo_light.alt, "Kripto Saat Light Logo");
        let texts: Vec<&str> = header.main_navigation.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B"]);
        let children: Vec<u64> = header.main_navigation[0].children.iter().map(|c| c.id).collect();
        assert_eq!(children, vec![1, 2]);
        assert_eq!(header.top_bar.background_color, "#000");
        assert_eq!(header.top_bar.height, "40px");
        assert_eq!(header.search_placeholder, "Ara...");
    }

    #[test]
    fn test_header_without_navigation_uses_defaults() {
        let header = header(&json!({}), BASE);
        assert_eq!(header, SiteHeader::default());
    }
}
