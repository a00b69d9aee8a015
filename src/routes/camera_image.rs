use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::{debug, info};

use super::{upstream_failure, SharedApi};

// ---

pub fn router() -> Router<SharedApi> {
    // ---
    Router::new().route("/cameras/{camera_id}/images/{image_id}", get(handler))
}

/// Handle `GET /cameras/{camera_id}/images/{image_id}`.
///
/// Returns the raw image bytes with their upstream mime type, or 404 when
/// the camera has no such image.
async fn handler(
    Path((camera_id, image_id)): Path<(u32, usize)>,
    State(api): State<SharedApi>,
) -> impl IntoResponse {
    // ---
    info!("GET /cameras/{}/images/{}", camera_id, image_id);

    match api.get_camera_image(camera_id, image_id).await {
        Ok(Some(image)) => {
            debug!(
                "Returning {} bytes of {} for camera {}",
                image.bytes.len(),
                image.mime_type,
                camera_id
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, image.mime_type)],
                image.bytes,
            )
                .into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => upstream_failure("GET /cameras/{camera_id}/images/{image_id}", e),
    }
}
