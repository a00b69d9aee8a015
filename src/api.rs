//! Top-level aggregator over the four domain clients.
//!
//! `fetch_data` runs the domain fetches one after another (weather, traffic,
//! camera) and merges their keyed output into one map, later domains
//! overwriting earlier ones on a key collision. The parking zone fetch runs
//! last and only feeds the shared zone repository.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::clients::{CameraApi, ImageData, ParkingZonesApi, TrafficApi, WeatherApi};
use crate::context::Context;
use crate::error::Result;
use crate::models::Entity;
use crate::notifier::{EventPublisher, PositionChange, ZoneEvent, ZoneTransitionNotifier};
use crate::zones::SharedZones;

// ---

pub type Entities = HashMap<String, Entity>;

pub struct ItsApi {
    // ---
    weather: WeatherApi,
    traffic: TrafficApi,
    camera: CameraApi,
    parking: ParkingZonesApi,
    notifier: ZoneTransitionNotifier,
}

impl ItsApi {
    pub fn new(ctx: Context, publisher: Arc<dyn EventPublisher>, tracked: Vec<String>) -> Self {
        // ---
        let notifier =
            ZoneTransitionNotifier::new(ctx.zones.clone(), publisher, ctx.clock.clone(), tracked);
        if notifier.is_active() {
            info!("Zone transition tracking enabled");
        } else {
            info!("No tracked entities, zone transition tracking disabled");
        }

        ItsApi {
            weather: WeatherApi::new(ctx.clone()),
            traffic: TrafficApi::new(ctx.clone()),
            camera: CameraApi::new(ctx.clone()),
            parking: ParkingZonesApi::new(ctx),
            notifier,
        }
    }

    /// Every entity of every domain, keyed by entity key.
    ///
    /// Fails only when a domain has never loaded successfully.
    pub async fn fetch_data(&self) -> Result<Entities> {
        // ---
        let mut entities = Entities::new();

        let weather = self.weather.fetch().await?;
        entities.extend(weather.into_iter().map(|(k, r)| (k, Entity::Sensor(r))));

        let traffic = self.traffic.fetch().await?;
        entities.extend(traffic.into_iter().map(|(k, r)| (k, Entity::Sensor(r))));

        let cameras = self.camera.fetch().await?;
        entities.extend(cameras.into_iter().map(|(k, i)| (k, Entity::Image(i))));

        let zones = self.parking.fetch().await?;

        debug!(
            "Fetched {} entities, {} parking zones known",
            entities.len(),
            zones
        );
        Ok(entities)
    }

    /// Image bytes and type, or `None` when the camera has no such image yet.
    pub async fn get_camera_image(
        &self,
        camera_id: u32,
        image_id: usize,
    ) -> Result<Option<ImageData>> {
        self.camera.get_camera_image(camera_id, image_id).await
    }

    pub async fn on_position_change(&self, change: &PositionChange) -> Result<Vec<ZoneEvent>> {
        self.notifier.on_position_change(change).await
    }

    pub fn zones(&self) -> SharedZones {
        self.parking.zones()
    }

    pub fn weather(&self) -> &WeatherApi {
        &self.weather
    }

    pub fn traffic(&self) -> &TrafficApi {
        &self.traffic
    }

    pub fn camera(&self) -> &CameraApi {
        &self.camera
    }

    pub fn parking(&self) -> &ParkingZonesApi {
        &self.parking
    }
}
