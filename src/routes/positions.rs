use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use tracing::info;

use super::{upstream_failure, SharedApi};
use crate::PositionChange;

// ---

pub fn router() -> Router<SharedApi> {
    // ---
    Router::new().route("/positions", post(handler))
}

/// Handle `POST /positions`: feed one position change to the zone notifier
/// and return the events it published.
async fn handler(
    State(api): State<SharedApi>,
    Json(change): Json<PositionChange>,
) -> impl IntoResponse {
    // ---
    info!("POST /positions - {}", change.entity_id);

    match api.on_position_change(&change).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => upstream_failure("POST /positions", e),
    }
}
