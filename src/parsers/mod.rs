//! Payload decoders, one per domain.
//!
//! Parsing is pure. Feature collections are decoded feature by feature so
//! that one bad feature is skipped instead of failing the whole batch.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ItsError, Result};

mod camera;
mod parking;
mod traffic;
mod weather;

pub use camera::{CameraFeature, CameraImages, CameraProperties, ImageRecord, PointGeometry};
pub use parking::{ParkingZoneFeature, ParkingZoneProperties, PolygonGeometry};
pub use traffic::{LineGeometry, TrafficData, TrafficFeature, TrafficFeed, TrafficProperties};
pub use weather::Weather;

// ---

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<serde_json::Value>,
}

/// Decode a GeoJSON feature collection into `T`s.
///
/// A document that is not a feature collection is a
/// [`ItsError::MalformedPayload`]; individual features that fail to decode
/// are logged and skipped.
pub(crate) fn parse_features<T: DeserializeOwned>(text: &str, domain: &str) -> Result<Vec<T>> {
    // ---
    let collection: FeatureCollection = serde_json::from_str(text)
        .map_err(|e| ItsError::MalformedPayload(format!("{} feature collection: {}", domain, e)))?;

    let total = collection.features.len();
    let mut features = Vec::with_capacity(total);
    for (i, item) in collection.features.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(feature) => features.push(feature),
            Err(e) => {
                tracing::warn!("Skipping {} feature {}: {}", domain, i, e);
            }
        }
    }

    tracing::debug!("Parsed {}/{} {} features", features.len(), total, domain);
    Ok(features)
}
