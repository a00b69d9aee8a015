//! Shared fixtures for the integration tests: a scripted Fetch Port that
//! counts calls per URL, a manually driven clock and canned payloads.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use ktw_its::{Clock, Context, Fetcher, ItsError, Result};

pub const BASE_URL: &str = "http://its.test";

// ---

pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

pub fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, min, 0).unwrap()
}

#[derive(Clone)]
enum Response {
    Text(String),
    Bytes(Vec<u8>),
    Failure(String),
}

/// Scripted [`Fetcher`]. Unscripted URLs fail with a network error.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, Response>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StubFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond_text(&self, url: &str, body: impl Into<String>) {
        self.set(url, Response::Text(body.into()));
    }

    pub fn respond_bytes(&self, url: &str, body: &[u8]) {
        self.set(url, Response::Bytes(body.to_vec()));
    }

    pub fn fail(&self, url: &str) {
        self.set(url, Response::Failure(format!("connection refused: {}", url)));
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn set(&self, url: &str, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    fn respond(&self, url: &str) -> Result<Response> {
        // ---
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        match self.responses.lock().unwrap().get(url).cloned() {
            Some(Response::Failure(message)) => Err(ItsError::Network(message)),
            Some(response) => Ok(response),
            None => Err(ItsError::Network(format!("no stub for {}", url))),
        }
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        match self.respond(url)? {
            Response::Text(text) => Ok(text),
            Response::Bytes(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Response::Failure(message) => Err(ItsError::Network(message)),
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        match self.respond(url)? {
            Response::Text(text) => Ok(text.into_bytes()),
            Response::Bytes(bytes) => Ok(bytes),
            Response::Failure(message) => Err(ItsError::Network(message)),
        }
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, minutes: i64) {
        *self.now.lock().unwrap() += Duration::minutes(minutes);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn create_test_context(fetcher: &Arc<StubFetcher>, clock: &Arc<ManualClock>) -> Context {
    Context::new(fetcher.clone(), clock.clone(), BASE_URL)
}

// --- payloads

pub const WEATHER_URL: &str = "http://its.test/api/v1/weather/air";
pub const TRAFFIC_URL: &str = "http://its.test/api/traffic";
pub const CAMERAS_URL: &str = "http://its.test/api/cameras";
pub const PARKING_URL: &str = "http://its.test/api/parkingZones";

pub fn weather_json(observed: DateTime<Utc>, temperature: f64) -> String {
    // ---
    format!(
        r#"{{
        "date": "{}",
        "sunrise": "2024-05-01T03:12:00Z",
        "sunset": "2024-05-01T18:21:00Z",
        "temperature": {},
        "humidity": 61,
        "pressure": 1013,
        "windSpeed": 3.6,
        "windDegrees": 240,
        "description": "scattered clouds",
        "co": 230.31,
        "no": 0.12,
        "no2": 9.6,
        "o3": 71.53,
        "so2": 2.15,
        "pm2_5": 7.21,
        "pm10": 9.87,
        "nh3": 1.03,
        "aqi": 2
    }}"#,
        observed.to_rfc3339(),
        temperature
    )
}

/// One traffic feature per `(code, observed, period)`.
pub fn traffic_json(features: &[(i64, DateTime<Utc>, i64)]) -> String {
    // ---
    let features: Vec<String> = features
        .iter()
        .map(|(code, observed, period)| {
            format!(
                r#"{{"type":"Feature",
                    "properties":{{"name":"Point {code}","description":"DTS-{code}","code":{code},
                        "data":{{"avgSpeed":48,"avg_time":21.5,"traffic":30,"trafficPeriod":{period},
                                 "date_time":"{observed}","color":"green"}}}},
                    "geometry":{{"type":"MultiLineString",
                        "coordinates":[[[19.01,50.26],[19.02,50.26]],[[19.03,50.27],[19.04,50.27]]]}}}}"#,
                code = code,
                period = period,
                observed = observed.to_rfc3339()
            )
        })
        .collect();
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}

/// One camera feature per `(id, name, kind, state)`.
pub fn cameras_json(cameras: &[(u32, &str, &str, i64)]) -> String {
    // ---
    let features: Vec<String> = cameras
        .iter()
        .map(|(id, name, kind, state)| {
            format!(
                r#"{{"type":"Feature",
                    "properties":{{"id":{id},"name":"{name}","description":"Camera {name}","state":{state},"type":"{kind}"}},
                    "geometry":{{"type":"Point","coordinates":[19.02,50.26]}}}}"#,
                id = id,
                name = name,
                kind = kind,
                state = state
            )
        })
        .collect();
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}

pub fn camera_images_url(camera_id: u32) -> String {
    url(&format!("/api/cameras/{}/images", camera_id))
}

pub fn camera_image_url(camera_id: u32, filename: &str) -> String {
    url(&format!("/api/camera/image/{}/{}", camera_id, filename))
}

/// Image list, newest first.
pub fn camera_images_json(images: &[(&str, DateTime<Utc>)]) -> String {
    // ---
    let images: Vec<String> = images
        .iter()
        .map(|(filename, added)| {
            format!(
                r#"{{"filename":"{}","addTime":"{}","size":1024,"mimeType":"image/jpeg"}}"#,
                filename,
                added.to_rfc3339()
            )
        })
        .collect();
    format!(r#"{{"images":[{}]}}"#, images.join(","))
}

/// Square zones `(code, lat, lon)` with a side of 0.01 degree.
pub fn parking_json(zones: &[(&str, f64, f64)]) -> String {
    // ---
    let features: Vec<String> = zones
        .iter()
        .map(|(code, lat, lon)| {
            let (lat2, lon2) = (lat + 0.01, lon + 0.01);
            format!(
                r#"{{"type":"Feature",
                    "properties":{{"code":"{code}","name":"Zone {code}","carParkingSpots":50}},
                    "geometry":{{"type":"Polygon","coordinates":[[[{lon},{lat}],[{lon2},{lat}],[{lon2},{lat2}],[{lon},{lat2}],[{lon},{lat}]]]}}}}"#,
                code = code,
                lat = lat,
                lon = lon,
                lat2 = lat2,
                lon2 = lon2
            )
        })
        .collect();
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}

/// Script every listing endpoint with one consistent snapshot observed at `now`.
pub fn script_all(fetcher: &StubFetcher, now: DateTime<Utc>) {
    // ---
    fetcher.respond_text(WEATHER_URL, weather_json(now, 17.4));
    fetcher.respond_text(TRAFFIC_URL, traffic_json(&[(1201, now, 15)]));
    fetcher.respond_text(CAMERAS_URL, cameras_json(&[(372, "K1", "ptz", 1)]));
    fetcher.respond_text(PARKING_URL, parking_json(&[("A", 50.0, 19.0), ("B", 50.1, 19.1)]));
}
