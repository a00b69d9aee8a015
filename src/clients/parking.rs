use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{minutes, CacheState, Freshness, PARKING_ZONES_VALIDITY_MINUTES};
use crate::context::Context;
use crate::error::Result;
use crate::parsers::ParkingZoneFeature;
use crate::zones::SharedZones;

// ---

/// Parking zone client. Its only output is the shared zone repository; the
/// cache holds the number of zones loaded.
pub struct ParkingZonesApi {
    ctx: Context,
    state: Mutex<CacheState<usize>>,
}

impl ParkingZonesApi {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            state: Mutex::new(CacheState::new()),
        }
    }

    /// Refresh the repository when stale. Returns the number of known zones.
    pub async fn fetch(&self) -> Result<usize> {
        // ---
        let mut state = self.state.lock().await;
        let now = self.ctx.clock.now();

        if state.is_fresh(now) {
            debug!("Parking zones data is still valid until {:?}", state.deadline());
            return Ok(state.data().copied().unwrap_or_default());
        }

        match self.refresh(&mut state, now).await {
            Ok(count) => Ok(count),
            Err(e) => state.degrade("Parking zones", e),
        }
    }

    async fn refresh(&self, state: &mut CacheState<usize>, now: DateTime<Utc>) -> Result<usize> {
        // ---
        let text = self
            .ctx
            .fetcher
            .fetch_text(&self.ctx.endpoints.parking_zones())
            .await?;
        let features = ParkingZoneFeature::parse_listing(&text)?;

        let fetched = features.len();
        let zones: Vec<_> = features
            .into_iter()
            .filter_map(|feature| {
                let code = feature.properties.code.clone();
                let zone = feature.into_zone();
                if zone.is_none() {
                    warn!("Skipping parking zone {} with unusable geometry", code);
                }
                zone
            })
            .collect();

        // One write lock for the whole batch so lookups never see half a refresh.
        let total = {
            let mut repo = self.ctx.zones.write().await;
            for zone in zones {
                repo.add(zone);
            }
            repo.len()
        };

        let deadline = now + minutes(PARKING_ZONES_VALIDITY_MINUTES);
        state.store(total, deadline);

        info!(
            "Parking zones refreshed: {} fetched, {} known, valid until {}",
            fetched, total, deadline
        );
        Ok(total)
    }

    pub fn zones(&self) -> SharedZones {
        self.ctx.zones.clone()
    }

    pub async fn deadline(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.deadline()
    }

    pub async fn freshness(&self) -> Freshness {
        let now = self.ctx.clock.now();
        self.state.lock().await.freshness(now)
    }
}
