//! Parking zone enter/leave detection for tracked entities.
//!
//! A position change carries the previous and the new position of an entity.
//! Both are resolved to a zone; when the zone codes differ a `leave` event is
//! published for the old zone, then an `enter` event for the new one.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{ItsError, Result};
use crate::geo::Coordinate;
use crate::zones::SharedZones;

// ---

pub const EVENT_PARKING_ZONE_ENTER: &str = "parking_zone_enter";
pub const EVENT_PARKING_ZONE_LEAVE: &str = "parking_zone_leave";

/// Position update of one entity. Either side may be absent on the first
/// or last observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionChange {
    pub entity_id: String,
    #[serde(default)]
    pub old: Option<Coordinate>,
    #[serde(default)]
    pub new: Option<Coordinate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneEventKind {
    Enter,
    Leave,
}

impl ZoneEventKind {
    pub fn event_type(&self) -> &'static str {
        match self {
            ZoneEventKind::Enter => EVENT_PARKING_ZONE_ENTER,
            ZoneEventKind::Leave => EVENT_PARKING_ZONE_LEAVE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneEvent {
    // ---
    pub id: Uuid,
    pub kind: ZoneEventKind,
    pub entity_id: String,
    pub zone_code: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event-dispatch port.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event_type: &str, event: &ZoneEvent) -> Result<()>;
}

/// In-process bus on a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<(String, ZoneEvent)>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<(String, ZoneEvent)> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish(&self, event_type: &str, event: &ZoneEvent) -> Result<()> {
        // ---
        if self.sender.receiver_count() == 0 {
            debug!("No subscriber for {} on zone {}", event_type, event.zone_code);
            return Ok(());
        }
        self.sender
            .send((event_type.to_string(), event.clone()))
            .map(|_| ())
            .map_err(|e| ItsError::Publish(e.to_string()))
    }
}

pub struct ZoneTransitionNotifier {
    // ---
    zones: SharedZones,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    tracked: HashSet<String>,
}

impl ZoneTransitionNotifier {
    pub fn new(
        zones: SharedZones,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        tracked: impl IntoIterator<Item = String>,
    ) -> Self {
        // ---
        Self {
            zones,
            publisher,
            clock,
            tracked: tracked.into_iter().collect(),
        }
    }

    /// Tracking is off when no entity is configured.
    pub fn is_active(&self) -> bool {
        !self.tracked.is_empty()
    }

    pub fn is_tracked(&self, entity_id: &str) -> bool {
        self.tracked.contains(entity_id)
    }

    /// Publish the transitions implied by `change` and return them in order.
    ///
    /// Every event is offered to the publisher even when an earlier one is
    /// refused; the first refusal is then returned instead of the events.
    pub async fn on_position_change(&self, change: &PositionChange) -> Result<Vec<ZoneEvent>> {
        // ---
        if !self.is_tracked(&change.entity_id) {
            debug!("Ignoring position change of untracked {}", change.entity_id);
            return Ok(Vec::new());
        }

        let (old_zone, new_zone) = {
            let repo = self.zones.read().await;
            let lookup = |point: Option<Coordinate>| {
                point
                    .and_then(|p| repo.find_by_point(p))
                    .map(|zone| zone.code.clone())
            };
            (lookup(change.old), lookup(change.new))
        };

        if old_zone == new_zone {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let transitions = [
            old_zone.map(|code| (ZoneEventKind::Leave, code)),
            new_zone.map(|code| (ZoneEventKind::Enter, code)),
        ];

        let mut events = Vec::with_capacity(2);
        let mut first_error = None;
        for (kind, zone_code) in transitions.into_iter().flatten() {
            let event = ZoneEvent {
                id: Uuid::new_v4(),
                kind,
                entity_id: change.entity_id.clone(),
                zone_code,
                occurred_at: now,
            };
            info!(
                "{} {} zone {}",
                event.entity_id,
                kind.event_type(),
                event.zone_code
            );
            if let Err(e) = self.publisher.publish(kind.event_type(), &event).await {
                warn!("Publishing {} for {} failed: {}", kind.event_type(), event.entity_id, e);
                first_error.get_or_insert(e);
            }
            events.push(event);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(events),
        }
    }
}
