//! HTTP endpoint handlers. These are thin wrappers over the catalog and the proposal gateway.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::gateway::validate_proposal;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_challenges(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let out: Vec<ChallengeOut> = state.catalog.all().iter().map(to_out).collect();
    Json(out)
}

/// Ids are matched as text so a malformed id is a 404 like any other unknown one.
#[instrument(level = "info", skip(state))]
pub async fn http_get_challenge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ChallengeOut>, ApiError> {
    let ch = id
        .parse::<u32>()
        .ok()
        .and_then(|n| state.catalog.get(n))
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;
    info!(target: "questmap_backend", id = ch.id, category = %ch.category, "HTTP challenge served");
    Ok(Json(to_out(ch)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_categories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.categories.as_ref().clone())
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_profile(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.profile.as_ref().clone())
}

/// Body is taken raw: a body that is not JSON must answer 500 with details, not an extractor 4xx.
#[instrument(level = "info", skip(state, body), fields(body_len = body.len()))]
pub async fn http_submit_business(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SubmitBusinessOut>, ApiError> {
    let summary = match validate_proposal(&body) {
        Ok(s) => s,
        Err(e @ ApiError::Unexpected(_)) => {
            tracing::error!(target: "questmap_backend", error = ?e, "Error processing submission");
            return Err(e);
        }
        Err(e) => {
            info!(target: "questmap_backend", error = %e, "Business proposal rejected");
            return Err(e);
        }
    };

    // Cosmetic latency so the form's loading state is visible.
    tokio::time::sleep(state.timing.submission_delay()).await;
    info!(
        target: "questmap_backend",
        business = %summary.business_name,
        title = %summary.challenge_title,
        category = %summary.category,
        marker_color = summary.marker_color,
        has_notes = summary.has_notes,
        "Business proposal received"
    );
    Ok(Json(SubmitBusinessOut { success: true, message: "Challenge submission received successfully" }))
}
