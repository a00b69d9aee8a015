//! Per-domain cache clients.
//!
//! Every client follows the same policy: serve the cache while
//! `now < deadline`, otherwise fetch, parse and recompute the deadline from
//! the payload. A failed refresh falls back to the previous cache and only
//! surfaces as an error when nothing was ever cached.

use std::collections::HashMap;

use crate::models::Reading;

mod camera;
mod parking;
mod traffic;
mod weather;

pub use camera::{CameraApi, ImageData, DEFAULT_IMAGE_MIME_TYPE};
pub use parking::ParkingZonesApi;
pub use traffic::{flow_per_hour, TrafficApi};
pub use weather::WeatherApi;

/// Readings keyed by their unique entity key.
pub type Readings = HashMap<String, Reading>;
