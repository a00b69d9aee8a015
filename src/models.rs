//! Data models handed to the host platform.
//!
//! A [`Reading`] is one sensor value plus the metadata the host needs to
//! render it. A [`CameraImage`] describes one camera angle. Both are wrapped in
//! [`Entity`] when the aggregator merges every domain into one keyed map.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---

/// Prefix shared by every entity key.
pub const DOMAIN: &str = "ktw_its";

/// Manufacturer shown on every device.
pub const DEFAULT_NAME: &str = "ITS Katowice";

/// Public landing page of the data provider.
pub const CONFIGURATION_URL: &str = "https://its.katowice.eu";

/// A reading value or attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<i64> for ReadingValue {
    fn from(v: i64) -> Self {
        ReadingValue::Integer(v)
    }
}

impl From<f64> for ReadingValue {
    fn from(v: f64) -> Self {
        ReadingValue::Float(v)
    }
}

impl From<String> for ReadingValue {
    fn from(v: String) -> Self {
        ReadingValue::Text(v)
    }
}

impl From<&str> for ReadingValue {
    fn from(v: &str) -> Self {
        ReadingValue::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for ReadingValue {
    fn from(v: DateTime<Utc>) -> Self {
        ReadingValue::Timestamp(v)
    }
}

/// Freeform attributes attached to a reading or image.
pub type Attributes = BTreeMap<String, ReadingValue>;

/// Logical source a reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceGroup {
    Weather,
    Traffic,
    Camera,
    Parking,
}

impl SourceGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceGroup::Weather => "weather",
            SourceGroup::Traffic => "traffic",
            SourceGroup::Camera => "camera",
            SourceGroup::Parking => "parking",
        }
    }

    /// Parse a group name as used in query strings.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "weather" => Some(SourceGroup::Weather),
            "traffic" => Some(SourceGroup::Traffic),
            "camera" => Some(SourceGroup::Camera),
            "parking" => Some(SourceGroup::Parking),
            _ => None,
        }
    }
}

/// What a reading measures. Drives host-side formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    Temperature,
    Pressure,
    Humidity,
    WindSpeed,
    WindDirection,
    Aqi,
    CarbonMonoxide,
    NitrogenMonoxide,
    NitrogenDioxide,
    Ozone,
    SulphurDioxide,
    Pm25,
    Pm10,
    Timestamp,
    Speed,
    Duration,
    Enum,
}

impl MeasurementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementKind::Temperature => "temperature",
            MeasurementKind::Pressure => "pressure",
            MeasurementKind::Humidity => "humidity",
            MeasurementKind::WindSpeed => "wind_speed",
            MeasurementKind::WindDirection => "wind_direction",
            MeasurementKind::Aqi => "aqi",
            MeasurementKind::CarbonMonoxide => "carbon_monoxide",
            MeasurementKind::NitrogenMonoxide => "nitrogen_monoxide",
            MeasurementKind::NitrogenDioxide => "nitrogen_dioxide",
            MeasurementKind::Ozone => "ozone",
            MeasurementKind::SulphurDioxide => "sulphur_dioxide",
            MeasurementKind::Pm25 => "pm25",
            MeasurementKind::Pm10 => "pm10",
            MeasurementKind::Timestamp => "timestamp",
            MeasurementKind::Speed => "speed",
            MeasurementKind::Duration => "duration",
            MeasurementKind::Enum => "enum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Diagnostic,
}

/// Device grouping shown by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    // ---
    pub identifier: String,
    pub name: String,
    pub manufacturer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    pub configuration_url: String,
}

impl DeviceInfo {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        // ---
        DeviceInfo {
            identifier: identifier.into(),
            name: name.into(),
            manufacturer: DEFAULT_NAME.to_string(),
            serial_number: None,
            configuration_url: CONFIGURATION_URL.to_string(),
        }
    }

    pub fn serial_number(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }
}

/// A named measurement, immutable once built.
///
/// Fresh readings are produced on every successful parse and replace the
/// previous reading stored under the same key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    // ---
    pub key: String,
    pub group: SourceGroup,
    pub value: ReadingValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MeasurementKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<EntityCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

/// Builder style constructors
impl Reading {
    // ---
    pub fn new(key: impl Into<String>, group: SourceGroup, value: impl Into<ReadingValue>) -> Self {
        // ---
        Reading {
            key: key.into(),
            group,
            value: value.into(),
            kind: None,
            unit: None,
            name: None,
            icon: None,
            category: None,
            options: None,
            device: None,
            attributes: Attributes::new(),
        }
    }

    pub fn kind(mut self, kind: MeasurementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn diagnostic(mut self) -> Self {
        self.category = Some(EntityCategory::Diagnostic);
        self
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.options = Some(options.iter().map(|o| o.to_string()).collect());
        self
    }

    pub fn device(mut self, device: DeviceInfo) -> Self {
        self.device = Some(device);
        self
    }

    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// One camera angle exposed as an image entity.
///
/// `image_last_updated` is the only mutable part: it is refreshed by the
/// per-camera image check and cleared when that check goes stale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraImage {
    // ---
    pub key: String,
    pub camera_id: u32,
    pub camera_name: String,
    pub camera_description: String,
    pub image_id: usize,
    pub image_last_updated: Option<DateTime<Utc>>,
    pub device: DeviceInfo,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

/// Anything the aggregator hands back to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum Entity {
    Sensor(Reading),
    Image(CameraImage),
}

impl Entity {
    pub fn group(&self) -> SourceGroup {
        // ---
        match self {
            Entity::Sensor(reading) => reading.group,
            Entity::Image(_) => SourceGroup::Camera,
        }
    }

    pub fn as_reading(&self) -> Option<&Reading> {
        match self {
            Entity::Sensor(reading) => Some(reading),
            Entity::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&CameraImage> {
        match self {
            Entity::Image(image) => Some(image),
            Entity::Sensor(_) => None,
        }
    }
}
