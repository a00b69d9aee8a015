//! `/api/traffic` payload.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::parse_features;
use crate::error::Result;
use crate::geo::Coordinate;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrafficData {
    // ---
    #[serde(rename = "avgSpeed", default)]
    pub avg_speed: Option<i64>,
    #[serde(default)]
    pub avg_time: Option<f64>,
    #[serde(default)]
    pub traffic: Option<i64>,
    /// Sampling period in minutes.
    #[serde(rename = "trafficPeriod", default)]
    pub traffic_period: Option<i64>,
    #[serde(default)]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrafficProperties {
    // ---
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub code: i64,
    #[serde(default)]
    pub data: Option<TrafficData>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LineGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Vec<Vec<f64>>>,
}

impl LineGeometry {
    /// Representative position of a measurement point.
    ///
    /// The point sits at the start of the second line when there is one,
    /// otherwise at the start of the first.
    pub fn anchor(&self) -> Option<Coordinate> {
        // ---
        let line = self.coordinates.get(1).or_else(|| self.coordinates.first())?;
        match line.first()?.as_slice() {
            [longitude, latitude, ..] => Some(Coordinate::new(*latitude, *longitude)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrafficFeature {
    pub properties: TrafficProperties,
    pub geometry: LineGeometry,
}

impl TrafficFeature {
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.properties.data.as_ref().and_then(|d| d.date_time)
    }
}

/// Every traffic measurement point in one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficFeed {
    pub features: Vec<TrafficFeature>,
}

impl TrafficFeed {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self {
            features: parse_features(text, "traffic")?,
        })
    }

    /// Newest observation time across all features.
    pub fn newest_observation(&self) -> Option<DateTime<Utc>> {
        self.features.iter().filter_map(TrafficFeature::observed_at).max()
    }
}
