//! In-memory parking zone repository.
//!
//! Zones live for the lifetime of the process. A zone whose code reappears
//! in a later fetch is overwritten in place and keeps its original position
//! in the scan order.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::geo::{point_in_polygon, Coordinate, Polygon};

// ---

/// Repository handle shared by the parking zone client (writer) and the
/// zone transition notifier (reader).
pub type SharedZones = Arc<RwLock<ZoneRepository>>;

pub fn shared_zones() -> SharedZones {
    Arc::new(RwLock::new(ZoneRepository::new()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParkingZone {
    // ---
    pub code: String,
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub car_parking_spots: Option<u32>,
    pub occupied_parking_spots: Option<u32>,
    pub polygon: Polygon,
}

impl ParkingZone {
    pub fn new(code: impl Into<String>, polygon: Polygon) -> Self {
        // ---
        ParkingZone {
            code: code.into(),
            name: None,
            color: None,
            description: None,
            car_parking_spots: None,
            occupied_parking_spots: None,
            polygon,
        }
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        point_in_polygon(point, &self.polygon)
    }
}

#[derive(Debug, Default)]
pub struct ZoneRepository {
    // ---
    zones: Vec<ParkingZone>,
    index: HashMap<String, usize>,
}

impl ZoneRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by code. Last write wins, nothing is merged.
    pub fn add(&mut self, zone: ParkingZone) {
        // ---
        match self.index.get(&zone.code) {
            Some(&position) => self.zones[position] = zone,
            None => {
                self.index.insert(zone.code.clone(), self.zones.len());
                self.zones.push(zone);
            }
        }
    }

    /// First zone, in insertion order, whose polygon contains `point`.
    ///
    /// With overlapping zones the earliest inserted one wins.
    pub fn find_by_point(&self, point: Coordinate) -> Option<&ParkingZone> {
        self.zones.iter().find(|zone| zone.contains(point))
    }

    pub fn get(&self, code: &str) -> Option<&ParkingZone> {
        self.index.get(code).map(|&position| &self.zones[position])
    }

    pub fn get_all(&self) -> HashMap<String, ParkingZone> {
        self.zones
            .iter()
            .map(|zone| (zone.code.clone(), zone.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
