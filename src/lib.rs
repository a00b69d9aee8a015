//! Data-freshness caching layer over the Katowice ITS open-data API.
//!
//! Weather, traffic, camera and parking zone feeds are fetched through a
//! pluggable Fetch Port, cached until a per-domain validity deadline and
//! merged into one keyed entity map by [`ItsApi`]. Position changes of
//! tracked entities are matched against parking zone polygons and turned
//! into enter/leave events.
//!
//! Module gateways (`clients`, `parsers`, `routes`) follow the Explicit
//! Module Boundary Pattern: siblings are private and only the gateway's
//! re-exports are visible to the rest of the crate.

pub mod api;
pub mod cache;
pub mod clients;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod models;
pub mod notifier;
pub mod parsers;
pub mod routes;
pub mod zones;

pub use api::{Entities, ItsApi};
pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use context::Context;
pub use error::{ItsError, Result};
pub use fetch::{Endpoints, Fetcher, HttpFetcher};
pub use models::{CameraImage, Entity, Reading, ReadingValue, SourceGroup};
pub use notifier::{
    BroadcastPublisher, EventPublisher, PositionChange, ZoneEvent, ZoneEventKind,
    ZoneTransitionNotifier,
};
