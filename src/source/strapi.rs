//! Strapi REST content source.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{Article, Category, SiteHeader, SourceConfig};
use crate::source::{normalize, ArticleBatch, ArticleQuery, ContentSource, Window};
use crate::utils::http::create_async_client;

/// Strapi caps `pagination[pageSize]` at 100 unless reconfigured.
const MAX_PAGE_SIZE: u64 = 100;

/// Collection list envelope.
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    meta: ListMeta,
}

#[derive(Debug, Default, Deserialize)]
struct ListMeta {
    #[serde(default)]
    pagination: Option<PaginationMeta>,
}

#[derive(Debug, Deserialize)]
struct PaginationMeta {
    #[serde(default)]
    total: u64,
}

/// Single-type envelope.
#[derive(Debug, Deserialize)]
struct SingleResponse {
    #[serde(default)]
    data: Value,
}

/// Content source backed by a Strapi instance.
#[derive(Debug, Clone)]
pub struct StrapiSource {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl StrapiSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    async fn get<T>(&self, endpoint: &str, params: &[(String, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self.client.get(&url).query(params);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        log::debug!("GET {url} ({} params)", params.len());
        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream(None, format!("STRAPI connection error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(
                Some(status.as_u16()),
                format!("STRAPI API request failed: {status}"),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::upstream(None, format!("invalid STRAPI response: {e}")))
    }

    fn parse_articles(&self, response: ListResponse) -> Result<ArticleBatch> {
        let items = response
            .data
            .iter()
            .map(|entry| normalize::article(entry, &self.base_url))
            .collect::<Result<Vec<_>>>()?;
        let total = response
            .meta
            .pagination
            .map(|p| p.total)
            .unwrap_or(items.len() as u64);
        Ok(ArticleBatch { items, total })
    }
}

/// Query-string parameters for an article query.
pub fn article_params(query: &ArticleQuery) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();
    let mut push = |k: &str, v: String| params.push((k.to_string(), v));

    match query.window {
        Window::Page { page, page_size } => {
            push("pagination[page]", page.max(1).to_string());
            push("pagination[pageSize]", page_size.to_string());
        }
        Window::IdRange { start, end } => {
            let size = (end.saturating_sub(start) + 1).min(MAX_PAGE_SIZE);
            push("filters[id][$gte]", start.to_string());
            push("filters[id][$lte]", end.to_string());
            push("pagination[page]", "1".to_string());
            push("pagination[pageSize]", size.to_string());
        }
        Window::NewerThan { id, page_size } => {
            push("filters[id][$gt]", id.to_string());
            push("pagination[page]", "1".to_string());
            push("pagination[pageSize]", page_size.to_string());
        }
    }

    if let Some(id) = query.above_id {
        push("filters[id][$gt]", id.to_string());
    }
    if let Some(category) = &query.category {
        push("filters[categories][slug][$eq]", category.clone());
    }
    if let Some(id) = query.exclude_id {
        push("filters[id][$ne]", id.to_string());
    }
    push("sort", "id:desc".to_string());
    push("populate", "*".to_string());
    params
}

/// `params` with `pagination[page]` replaced.
fn with_page(params: &[(String, String)], page: u64) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| {
            if k == "pagination[page]" {
                (k.clone(), page.to_string())
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect()
}

fn header_params() -> Vec<(String, String)> {
    [
        ("populate[mainNavigation][populate]", "*"),
        ("populate[topBar]", "*"),
        ("populate[logoLight]", "*"),
        ("populate[logoDark]", "*"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[async_trait]
impl ContentSource for StrapiSource {
    fn name(&self) -> &'static str {
        "strapi"
    }

    async fn fetch_articles(&self, query: &ArticleQuery) -> Result<ArticleBatch> {
        let params = article_params(query);
        let response: ListResponse = self.get("/api/flashes", &params).await?;
        let mut batch = self.parse_articles(response)?;

        // Ranges wider than one Strapi page come back over several pages.
        if let Window::IdRange { .. } = query.window {
            for page in 2..=batch.total.div_ceil(MAX_PAGE_SIZE) {
                let response: ListResponse =
                    self.get("/api/flashes", &with_page(&params, page)).await?;
                batch.items.extend(self.parse_articles(response)?.items);
            }
        }
        Ok(batch)
    }

    async fn fetch_article_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let params = vec![
            ("filters[slug][$eq]".to_string(), slug.to_string()),
            ("pagination[pageSize]".to_string(), "1".to_string()),
            ("populate".to_string(), "*".to_string()),
        ];
        let response: ListResponse = self.get("/api/flashes", &params).await?;
        Ok(self.parse_articles(response)?.items.into_iter().next())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let params = vec![
            ("sort".to_string(), "display_order:asc".to_string()),
            ("pagination[pageSize]".to_string(), MAX_PAGE_SIZE.to_string()),
        ];
        let response: ListResponse = self.get("/api/categories", &params).await?;
        Ok(response.data.iter().filter_map(normalize::category).collect())
    }

    async fn fetch_header(&self) -> Result<Option<SiteHeader>> {
        let response: SingleResponse = match self.get("/api/header", &header_params()).await {
            Ok(response) => response,
            // Single type never created in the CMS
            Err(AppError::Upstream { status: Some(404), .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        if response.data.is_null() {
            return Ok(None);
        }
        Ok(Some(normalize::header(&response.data, &self.base_url)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn source() -> StrapiSource {
        let config = SourceConfig {
            url: "https://cms.example.com/".to_string(),
            ..SourceConfig::default()
        };
        StrapiSource::new(&config).unwrap()
    }

    #[test]
    fn test_page_params() {
        let params = article_params(&ArticleQuery::page(3, 25));
        assert_eq!(param(&params, "pagination[page]"), Some("3"));
        assert_eq!(param(&params, "pagination[pageSize]"), Some("25"));
        assert_eq!(param(&params, "sort"), Some("id:desc"));
        assert_eq!(param(&params, "populate"), Some("*"));
    }

    #[test]
    fn test_range_params_fetch_whole_range() {
        let params = article_params(&ArticleQuery::id_range(26, 50));
        assert_eq!(param(&params, "filters[id][$gte]"), Some("26"));
        assert_eq!(param(&params, "filters[id][$lte]"), Some("50"));
        assert_eq!(param(&params, "pagination[pageSize]"), Some("25"));
    }

    #[test]
    fn test_wide_range_is_paged() {
        let params = article_params(&ArticleQuery::id_range(1, 150));
        assert_eq!(param(&params, "pagination[pageSize]"), Some("100"));
        assert_eq!(param(&params, "pagination[page]"), Some("1"));

        let second = with_page(&params, 2);
        assert_eq!(param(&second, "pagination[page]"), Some("2"));
        assert_eq!(param(&second, "filters[id][$lte]"), Some("150"));
        assert_eq!(second.len(), params.len());
    }

    #[test]
    fn test_hot_page_params_filter_by_boundary() {
        let params = article_params(&ArticleQuery::page(10, 25).above(50));
        assert_eq!(param(&params, "filters[id][$gt]"), Some("50"));
        assert_eq!(param(&params, "pagination[page]"), Some("10"));
    }

    #[test]
    fn test_filters() {
        let params = article_params(
            &ArticleQuery::newer_than(90, 1)
                .in_category("bitcoin")
                .excluding(95),
        );
        assert_eq!(param(&params, "filters[id][$gt]"), Some("90"));
        assert_eq!(param(&params, "filters[categories][slug][$eq]"), Some("bitcoin"));
        assert_eq!(param(&params, "filters[id][$ne]"), Some("95"));
    }

    #[test]
    fn test_parse_list_response_uses_meta_total() {
        let response: ListResponse = serde_json::from_value(json!({
            "data": [
                { "id": 2, "slug": "b", "title": "B", "featured_image": { "url": "/u/b.png" } },
                { "id": 1, "slug": "a", "title": "A" }
            ],
            "meta": { "pagination": { "page": 1, "pageSize": 2, "pageCount": 150, "total": 300 } }
        }))
        .unwrap();

        let source = source();
        let batch = source.parse_articles(response).unwrap();
        assert_eq!(batch.total, 300);
        assert_eq!(batch.items.len(), 2);
        assert_eq!(
            batch.items[0].featured_image.as_ref().unwrap().url,
            "https://cms.example.com/u/b.png"
        );
    }

    #[test]
    fn test_parse_list_response_without_meta() {
        let response: ListResponse =
            serde_json::from_value(json!({ "data": [{ "id": 1, "slug": "a", "title": "A" }] }))
                .unwrap();
        let batch = source().parse_articles(response).unwrap();
        assert_eq!(batch.total, 1);
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let config = SourceConfig {
            api_token: Some("  ".to_string()),
            ..SourceConfig::default()
        };
        let source = StrapiSource::new(&config).unwrap();
        assert!(source.api_token.is_none());
        assert_eq!(source.name(), "strapi");
    }
}
