// src/routes/health.rs
//! Liveness endpoint for the ITS service.
//!
//! This module defines the `/health` route used by container orchestrators
//! and CI pipelines to verify that the service is running and able to
//! respond to HTTP requests. It follows the Explicit Module Boundary Pattern:
//! the handler stays private and the gateway (`mod.rs`) merges the exported
//! subrouter.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
///
/// Does not touch the upstream API or any cache.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges with the gateway router
/// whatever the state type.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
