//! `/api/cameras` listing and `/api/cameras/{id}/images` payloads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::parse_features;
use crate::error::Result;
use crate::geo::Coordinate;

/// Listing state of a camera that is online.
pub const CAMERA_STATE_ACTIVE: i64 = 1;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CameraProperties {
    // ---
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub state: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl PointGeometry {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self.coordinates.as_slice() {
            [longitude, latitude, ..] => Some(Coordinate::new(*latitude, *longitude)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CameraFeature {
    pub properties: CameraProperties,
    pub geometry: PointGeometry,
}

impl CameraFeature {
    pub fn parse_listing(text: &str) -> Result<Vec<Self>> {
        parse_features(text, "camera")
    }

    pub fn is_active(&self) -> bool {
        self.properties.state == CAMERA_STATE_ACTIVE
    }

    /// Number of viewing angles: pan-tilt-zoom cameras cycle through four.
    pub fn angle_count(&self) -> usize {
        if self.properties.kind == "ptz" {
            4
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageRecord {
    // ---
    pub filename: String,
    #[serde(rename = "addTime")]
    pub add_time: DateTime<Utc>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(rename = "mimeType", default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
}

/// Image list of one camera, newest first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CameraImages {
    pub images: Vec<ImageRecord>,
}

impl CameraImages {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn newest(&self) -> Option<&ImageRecord> {
        self.images.first()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::error::ItsError;
    use chrono::TimeZone;

    #[test]
    fn test_parse_listing() {
        // ---
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature",
             "properties":{"id":372,"name":"K1","description":"Rondo","state":1,"type":"ptz","image":"marker.svg"},
             "geometry":{"type":"Point","coordinates":[19.02,50.26]}},
            {"type":"Feature",
             "properties":{"id":373,"name":"K2","description":"Dworzec","state":0,"type":"static"},
             "geometry":{"type":"Point","coordinates":[19.01,50.25]}}
        ]}"#;
        let cameras = CameraFeature::parse_listing(json).unwrap();

        assert_eq!(cameras.len(), 2);
        assert!(cameras[0].is_active());
        assert_eq!(cameras[0].angle_count(), 4);
        assert_eq!(
            cameras[0].geometry.coordinate(),
            Some(Coordinate::new(50.26, 19.02))
        );
        assert!(!cameras[1].is_active());
        assert_eq!(cameras[1].angle_count(), 1);
    }

    #[test]
    fn test_parse_images() {
        // ---
        let json = r#"{"images":[
            {"filename":"image24-05-01_12-00-00.jpg","addTime":"2024-05-01T12:00:00+00:00","size":1024,"mimeType":"image/jpeg","code":"a","digest":"d1"},
            {"filename":"image24-05-01_11-55-00.jpg","addTime":"2024-05-01T11:55:00+00:00"}
        ]}"#;
        let images = CameraImages::parse(json).unwrap();

        let newest = images.newest().unwrap();
        assert_eq!(newest.filename, "image24-05-01_12-00-00.jpg");
        assert_eq!(newest.add_time, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        assert_eq!(newest.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(images.images.len(), 2);
    }

    #[test]
    fn test_parse_images_requires_list() {
        // ---
        assert!(matches!(
            CameraImages::parse(r#"{"pictures":[]}"#),
            Err(ItsError::MalformedPayload(_))
        ));
        assert!(CameraImages::parse(r#"{"images":[]}"#).unwrap().newest().is_none());
    }
}
