//! `/api/v1/weather/air` payload.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::Result;

/// One weather and air quality snapshot. Every field is required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Weather {
    // ---
    /// Observation time.
    pub date: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: i64,
    pub pressure: i64,
    #[serde(rename = "windSpeed")]
    pub wind_speed: f64,
    #[serde(rename = "windDegrees")]
    pub wind_degrees: i64,
    pub description: String,
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
    pub aqi: i64,
}

impl Weather {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
