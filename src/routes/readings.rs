use std::collections::BTreeMap;

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use serde::Deserialize;
use tracing::{debug, info};

use super::{bad_request, upstream_failure, SharedApi};
use crate::{Entities, Entity, SourceGroup};

// ---

pub fn router() -> Router<SharedApi> {
    // ---
    Router::new().route("/readings", get(handler))
}

async fn handler(
    Query(params): Query<ReadingsQuery>,
    State(api): State<SharedApi>,
) -> impl IntoResponse {
    // ---
    info!("GET /readings - {:?}", params);

    let group = match params.group.as_deref().map(parse_group).transpose() {
        Ok(group) => group,
        Err(message) => return bad_request(message),
    };

    let entities = match api.fetch_data().await {
        Ok(entities) => entities,
        Err(e) => return upstream_failure("GET /readings", e),
    };

    let filtered = apply_filters(entities, group, params.limit);
    debug!("GET /readings - Returning {} entities", filtered.len());
    (StatusCode::OK, Json(filtered)).into_response()
}

/// Query parameters for filtering entities
#[derive(Debug, Deserialize)]
pub struct ReadingsQuery {
    /// `weather`, `traffic` or `camera`
    group: Option<String>,
    limit: Option<u32>,
}

fn parse_group(name: &str) -> Result<SourceGroup, String> {
    SourceGroup::parse(name).ok_or_else(|| format!("Unknown group '{}'", name))
}

/// Keep the entities of `group`, in key order, up to `limit`.
fn apply_filters(
    entities: Entities,
    group: Option<SourceGroup>,
    limit: Option<u32>,
) -> BTreeMap<String, Entity> {
    // ---
    entities
        .into_iter()
        .filter(|(_, entity)| group.map_or(true, |g| entity.group() == g))
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .take(limit.map_or(usize::MAX, |l| l as usize))
        .collect()
}
