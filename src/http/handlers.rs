//! Read endpoints.
//!
//! Query and path values are taken as raw strings and parsed here so that a
//! malformed number produces the standard 400 envelope instead of the
//! framework's plain-text rejection.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::cache::{tags, CacheType};
use crate::http::response::{ApiError, ApiResult, Cached};
use crate::http::AppState;

/// Parse an optional numeric parameter, using `default` when absent.
fn parse_param<T: std::str::FromStr>(
    value: Option<&str>,
    default: T,
    message: impl FnOnce() -> String,
) -> ApiResult<T> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ApiError::bad_request(message())),
    }
}

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "source": state.flashes.source_name() })),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct TopParams {
    page: Option<String>,
    limit: Option<String>,
}

pub async fn top(
    State(state): State<AppState>,
    Query(params): Query<TopParams>,
) -> ApiResult<impl IntoResponse> {
    let mode = state.flashes.source_name();
    let feed = state.flashes.feed();
    let limit: u32 = parse_param(params.limit.as_deref(), feed.items_per_page, || {
        format!("Invalid limit. Must be between 1 and {}", feed.max_limit)
    })
    .map_err(|e| e.with_mode(mode))?;
    let page: u32 = parse_param(params.page.as_deref(), 1, || {
        format!(
            "Invalid page number. Must be between 1 and {}",
            state.flashes.layout().hot_pages_for(limit)
        )
    })
    .map_err(|e| e.with_mode(mode))?;

    let list = state
        .flashes
        .list_hot_page(page, limit)
        .await
        .map_err(|e| ApiError::from(e).with_mode(mode))?;

    Ok(Cached::new(list, tags::hot_tags(page, limit), CacheType::Hot).meta("mode", mode))
}

pub async fn segment(
    State(state): State<AppState>,
    Path(segment_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let mode = state.flashes.source_name();
    let segment_id: u32 = segment_id
        .trim()
        .parse()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ApiError::bad_request("Invalid segment ID. Must be a positive integer").with_mode(mode)
        })?;

    let segment = state
        .flashes
        .list_cold_segment(segment_id)
        .await
        .map_err(|e| ApiError::from(e).with_mode(mode))?;

    Ok(Cached::new(segment, tags::cold_tags(segment_id), CacheType::Cold).meta("mode", mode))
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckParams {
    #[serde(rename = "lastId")]
    last_id: Option<String>,
}

pub async fn check_updates(
    State(state): State<AppState>,
    Query(params): Query<CheckParams>,
) -> ApiResult<impl IntoResponse> {
    let mode = state.flashes.source_name();
    let last_id: u64 = parse_param(params.last_id.as_deref(), 0, || {
        "Invalid lastId. Must be a non-negative integer".to_string()
    })
    .map_err(|e| e.with_mode(mode))?;

    let check = state
        .updates
        .check_updates(last_id)
        .await
        .map_err(|e| ApiError::from(e).with_mode(mode))?;

    Ok(
        Cached::new(check, tags::updates_tags(last_id), CacheType::Updates)
            .meta("mode", mode)
            .meta("lastCheckedId", last_id)
            .meta("pollIntervalMs", state.updates.poll_interval_ms()),
    )
}

pub async fn flash_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let mode = state.flashes.source_name();
    let detail = state
        .flashes
        .get_article(&slug)
        .await
        .map_err(|e| ApiError::from(e).with_mode(mode))?;

    let tags = tags::detail_tags(detail.flash.id, &detail.flash.slug);
    let related = detail.related_flashes.len();
    Ok(Cached::new(detail, tags, CacheType::Detail)
        .meta("mode", mode)
        .meta("relatedCount", related))
}

pub async fn categories(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let mode = state.flashes.source_name();
    let list = state
        .flashes
        .list_categories()
        .await
        .map_err(|e| ApiError::from(e).with_mode(mode))?;

    let count = list.categories.len();
    Ok(
        Cached::new(list, tags::categories_index_tags(), CacheType::Category)
            .meta("mode", mode)
            .meta("count", count),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryParams {
    page: Option<String>,
}

pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<CategoryParams>,
) -> ApiResult<impl IntoResponse> {
    let mode = state.flashes.source_name();
    let page: u32 = parse_param(params.page.as_deref(), 1, || {
        "Invalid page number. Must be a positive integer".to_string()
    })
    .map_err(|e| e.with_mode(mode))?;

    let list = state
        .flashes
        .list_category(&slug, page)
        .await
        .map_err(|e| ApiError::from(e).with_mode(mode))?;

    Ok(
        Cached::new(list, tags::category_tags(&slug, Some(page)), CacheType::Category)
            .meta("mode", mode)
            .meta("categorySlug", slug)
            .meta("page", page),
    )
}

pub async fn header(State(state): State<AppState>) -> impl IntoResponse {
    let lookup = state.flashes.get_header().await;
    let cache_error = lookup.error.as_ref().map(|_| "true".to_string());
    Cached::new(lookup.header, tags::header_tags(lookup.fallback), CacheType::Header)
        .meta("fallback", lookup.fallback)
        .cache_error(cache_error)
}
