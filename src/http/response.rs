//! Response envelope and cache headers.
//!
//! Every endpoint answers `{ success, data?, error?, meta: { timestamp, .. } }`.
//! Successful reads are cached permanently under their tag set; errors and
//! webhook replies are `no-store`.

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cache::{CacheTags, CacheType, Freshness};
use crate::error::AppError;

pub const CDN_CACHE_CONTROL: HeaderName = HeaderName::from_static("cdn-cache-control");
pub const CACHE_TAG: HeaderName = HeaderName::from_static("cache-tag");
pub const X_CACHE_TYPE: HeaderName = HeaderName::from_static("x-cache-type");
pub const X_CACHE_GENERATED: HeaderName = HeaderName::from_static("x-cache-generated");
pub const X_CACHE_ERROR: HeaderName = HeaderName::from_static("x-cache-error");

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    meta: Map<String, Value>,
}

fn meta_with_timestamp(mut meta: Map<String, Value>) -> Map<String, Value> {
    meta.insert("timestamp".to_string(), Value::String(timestamp()));
    meta
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    // Tag and error strings come from slugs and upstream messages.
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

fn apply_freshness(headers: &mut HeaderMap, freshness: Freshness) {
    insert_header(headers, axum::http::header::CACHE_CONTROL, freshness.cache_control());
    if let Some(cdn) = freshness.cdn_cache_control() {
        insert_header(headers, CDN_CACHE_CONTROL, cdn);
    }
}

/// A successful, edge-cacheable read.
pub struct Cached<T> {
    data: T,
    meta: Map<String, Value>,
    tags: CacheTags,
    cache_type: CacheType,
    cache_error: Option<String>,
}

impl<T: Serialize> Cached<T> {
    pub fn new(data: T, tags: CacheTags, cache_type: CacheType) -> Self {
        Self {
            data,
            meta: Map::new(),
            tags,
            cache_type,
            cache_error: None,
        }
    }

    /// Add a `meta` field.
    pub fn meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    /// Mark the response as served from fallback data.
    pub fn cache_error(mut self, error: Option<String>) -> Self {
        self.cache_error = error;
        self
    }
}

impl<T: Serialize> IntoResponse for Cached<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            success: true,
            data: Some(self.data),
            error: None,
            meta: meta_with_timestamp(self.meta),
        };

        let mut headers = HeaderMap::new();
        apply_freshness(&mut headers, Freshness::Permanent);
        insert_header(&mut headers, CACHE_TAG, &self.tags.to_header());
        insert_header(&mut headers, X_CACHE_TYPE, self.cache_type.as_str());
        insert_header(&mut headers, X_CACHE_GENERATED, &timestamp());
        if let Some(error) = &self.cache_error {
            insert_header(&mut headers, X_CACHE_ERROR, error);
        }

        (StatusCode::OK, headers, Json(body)).into_response()
    }
}

/// A successful response that must not be cached.
pub struct Uncached<T> {
    data: T,
    meta: Map<String, Value>,
}

impl<T: Serialize> Uncached<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Map::new(),
        }
    }

    pub fn meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}

impl<T: Serialize> IntoResponse for Uncached<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            success: true,
            data: Some(self.data),
            error: None,
            meta: meta_with_timestamp(self.meta),
        };
        let mut headers = HeaderMap::new();
        apply_freshness(&mut headers, Freshness::NoStore);
        (StatusCode::OK, headers, Json(body)).into_response()
    }
}

/// Error reply in the standard envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    mode: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            mode: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Report which content source produced the error.
    pub fn with_mode(mut self, mode: &'static str) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            log::error!("request failed: {err}");
        }
        ApiError::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut meta = Map::new();
        if let Some(mode) = self.mode {
            meta.insert("mode".to_string(), Value::String(mode.to_string()));
        }
        let body: Envelope<()> = Envelope {
            success: false,
            data: None,
            error: Some(self.message),
            meta: meta_with_timestamp(meta),
        };
        let mut headers = HeaderMap::new();
        apply_freshness(&mut headers, Freshness::NoStore);
        (self.status, headers, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
