//! `/api/parkingZones` payload.

use serde::Deserialize;

use super::parse_features;
use crate::error::Result;
use crate::geo::Polygon;
use crate::zones::ParkingZone;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParkingZoneProperties {
    // ---
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "carParkingSpots", default)]
    pub car_parking_spots: Option<u32>,
    #[serde(rename = "occupiedParkingSpots", default)]
    pub occupied_parking_spots: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolygonGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParkingZoneFeature {
    pub properties: ParkingZoneProperties,
    pub geometry: PolygonGeometry,
}

impl ParkingZoneFeature {
    pub fn parse_listing(text: &str) -> Result<Vec<Self>> {
        parse_features(text, "parking zone")
    }

    /// Zone built from the outer ring, `None` when the ring is unusable.
    pub fn into_zone(self) -> Option<ParkingZone> {
        // ---
        let outer = self.geometry.coordinates.first()?;
        let polygon = Polygon::from_geojson_ring(outer)?;
        let props = self.properties;

        Some(ParkingZone {
            code: props.code,
            name: props.name,
            color: props.color,
            description: props.description,
            car_parking_spots: props.car_parking_spots,
            occupied_parking_spots: props.occupied_parking_spots,
            polygon,
        })
    }
}
