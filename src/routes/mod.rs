//! HTTP adapter gateway.
//!
//! Each sibling module exports a subrouter over the shared `Arc<ItsApi>`
//! state; this gateway merges them so `main.rs` only sees [`router`].

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use serde::Serialize;
use tracing::error;

use crate::{ItsApi, ItsError};

mod camera_image;
mod health;
mod positions;
mod readings;

// ---

pub type SharedApi = Arc<ItsApi>;

pub fn router(api: SharedApi) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(camera_image::router())
        .merge(positions::router())
        .merge(health::router())
        .with_state(api)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Upstream failures surface as `502 Bad Gateway`.
fn upstream_failure(route: &str, err: ItsError) -> Response {
    // ---
    error!("{} failed: {}", route, err);
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
}
