//! CMS webhooks that purge the edge cache.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::cache::{ContentChange, PurgeEvent, PurgeReport, WebhookPayload};
use crate::http::response::{ApiError, ApiResult, Uncached};
use crate::http::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeOutcome {
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<u32>,
    pub tags: Vec<String>,
    pub purge: PurgeReport,
}

async fn run_purge(state: &AppState, change: &ContentChange) -> ApiResult<PurgeOutcome> {
    let tags = change.tags();
    log::info!("Purging for {}: {}", change.event, tags);

    let purge = state
        .purger
        .purge_tags(tags.as_slice())
        .await
        .map_err(ApiError::from)?;

    Ok(PurgeOutcome {
        event: change.event.as_str(),
        segment_id: match change.event {
            PurgeEvent::HistoricalUpdate { segment } => segment,
            _ => None,
        },
        tags: tags.as_slice().to_vec(),
        purge,
    })
}

/// `POST /webhooks/content-changed`
pub async fn content_changed(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid webhook payload: {e}")))?;

    // Edits need the cold boundary to tell Hot from historical; publishes
    // need it to find the segments that grew.
    let needs_boundary = matches!(
        payload.event.as_str(),
        "entry.update" | "entry.create" | "entry.publish"
    );
    let boundary = if needs_boundary {
        match state.flashes.cold_boundary().await {
            Ok(boundary) => Some(boundary),
            Err(e) => {
                log::warn!("Cold boundary unavailable for {}: {e}", payload.event);
                None
            }
        }
    } else {
        None
    };

    let change = payload.classify(&state.flashes.layout(), boundary);
    let outcome = run_purge(&state, &change).await?;
    Ok(Uncached::new(outcome).meta("model", payload.model))
}

/// `POST /webhooks/header-purge`
pub async fn header_purge(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let outcome = run_purge(&state, &ContentChange::new(PurgeEvent::HeaderChange)).await?;
    Ok(Uncached::new(outcome).meta("message", "Header cache purged successfully"))
}
