use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::Readings;
use crate::cache::{minutes, CacheState, Freshness, TRAFFIC_VALIDITY_MINUTES};
use crate::context::Context;
use crate::error::{ItsError, Result};
use crate::models::{
    Attributes, DeviceInfo, MeasurementKind, Reading, ReadingValue, SourceGroup, DOMAIN,
};
use crate::parsers::{TrafficFeature, TrafficFeed};

/// Sampling periods the detectors report, in minutes.
const TRAFFIC_PERIOD_OPTIONS: [&str; 3] = ["3", "10", "15"];

// ---

/// Traffic detector client. Valid until the newest observation + 5 min.
pub struct TrafficApi {
    ctx: Context,
    state: Mutex<CacheState<Readings>>,
}

impl TrafficApi {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            state: Mutex::new(CacheState::new()),
        }
    }

    pub async fn fetch(&self) -> Result<Readings> {
        // ---
        let mut state = self.state.lock().await;
        let now = self.ctx.clock.now();

        if state.is_fresh(now) {
            debug!("Traffic data is still valid until {:?}", state.deadline());
            return Ok(state.data().cloned().unwrap_or_default());
        }

        match self.refresh(&mut state, now).await {
            Ok(readings) => Ok(readings),
            Err(e) => state.degrade("Traffic", e),
        }
    }

    async fn refresh(
        &self,
        state: &mut CacheState<Readings>,
        now: DateTime<Utc>,
    ) -> Result<Readings> {
        // ---
        let text = self
            .ctx
            .fetcher
            .fetch_text(&self.ctx.endpoints.traffic())
            .await?;
        let feed = TrafficFeed::parse(&text)?;

        let observed = match feed.newest_observation() {
            Some(observed) => observed,
            None => {
                warn!("Traffic payload carries no observation time, using fetch time");
                now
            }
        };
        let deadline = observed + minutes(TRAFFIC_VALIDITY_MINUTES);

        let readings: Vec<Reading> = feed.features.iter().flat_map(traffic_readings).collect();
        let count = readings.len();
        state.upsert(deadline, |cached| {
            cached.extend(readings.into_iter().map(|r| (r.key.clone(), r)));
        });

        info!(
            "Traffic refreshed: {} readings from {} features, valid until {}",
            count,
            feed.features.len(),
            deadline
        );
        Ok(state.data().cloned().unwrap_or_default())
    }

    pub async fn deadline(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.deadline()
    }

    pub async fn freshness(&self) -> Freshness {
        let now = self.ctx.clock.now();
        self.state.lock().await.freshness(now)
    }
}

/// Vehicles per hour extrapolated from a count over `period_minutes`.
///
/// Truncates toward zero, e.g. 10 vehicles in 7 minutes is 85 per hour.
pub fn flow_per_hour(period_minutes: i64, count: i64) -> Result<i64> {
    // ---
    if period_minutes == 0 {
        return Err(ItsError::DivisionByZero {
            metric: "traffic_flow_per_hour".to_string(),
        });
    }
    Ok((60.0 / period_minutes as f64 * count as f64) as i64)
}

/// The five derived readings of one measurement point.
///
/// A feature without a data block or observation time yields nothing. A
/// metric whose input is absent, or a flow over a zero period, is left out
/// while the others are still produced.
pub(crate) fn traffic_readings(feature: &TrafficFeature) -> Vec<Reading> {
    // ---
    let props = &feature.properties;
    let (data, observed) = match (&props.data, feature.observed_at()) {
        (Some(data), Some(observed)) => (data, observed),
        _ => {
            debug!("Skipping traffic feature {} without observation", props.code);
            return Vec::new();
        }
    };

    let mut attributes = Attributes::new();
    attributes.insert("update_date".to_string(), observed.into());
    if let Some(color) = &data.color {
        attributes.insert("color".to_string(), color.clone().into());
    }
    if let Some(anchor) = feature.geometry.anchor() {
        attributes.insert("longitude".to_string(), anchor.longitude.into());
        attributes.insert("latitude".to_string(), anchor.latitude.into());
    }

    let device = DeviceInfo::new(
        props.code.to_string(),
        format!("Traffic volume {} [{}]", props.name, props.code),
    )
    .serial_number(props.description.clone());

    let key = |metric: &str| format!("{}_{}_{}", DOMAIN, props.code, metric);
    let base = |metric: &str, value: ReadingValue| {
        Reading::new(key(metric), SourceGroup::Traffic, value)
            .device(device.clone())
            .attributes(attributes.clone())
    };

    let mut readings = Vec::with_capacity(5);
    if let Some(avg_speed) = data.avg_speed {
        readings.push(
            base("avg_speed", avg_speed.into())
                .name("Average speed")
                .kind(MeasurementKind::Speed)
                .unit("km/h"),
        );
    }
    if let Some(avg_time) = data.avg_time {
        readings.push(
            base("avg_time", avg_time.into())
                .name("Average time")
                .kind(MeasurementKind::Duration)
                .unit("s")
                .icon("mdi:car-clock"),
        );
    }
    if let Some(count) = data.traffic {
        readings.push(
            base("traffic", count.into())
                .name("Traffic")
                .icon("mdi:car-info")
                .diagnostic(),
        );
    }
    if let (Some(period), Some(count)) = (data.traffic_period, data.traffic) {
        match flow_per_hour(period, count) {
            Ok(flow) => readings.push(
                base("traffic_flow_per_hour", flow.into())
                    .name("Traffic flow per hour")
                    .unit("vehicle/h")
                    .icon("mdi:car-multiple"),
            ),
            Err(e) => warn!("Traffic feature {}: {}", props.code, e),
        }
    }
    if let Some(period) = data.traffic_period {
        readings.push(
            base("traffic_period", period.to_string().into())
                .name("Traffic period")
                .kind(MeasurementKind::Enum)
                .options(&TRAFFIC_PERIOD_OPTIONS)
                .icon("mdi:traffic-cone")
                .diagnostic(),
        );
    }
    readings
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::parsers::{LineGeometry, TrafficData, TrafficProperties};
    use chrono::TimeZone;

    fn create_test_feature(period: Option<i64>, count: Option<i64>) -> TrafficFeature {
        // ---
        TrafficFeature {
            properties: TrafficProperties {
                name: "Chorzowska".to_string(),
                description: "DTS-12".to_string(),
                code: 1201,
                data: Some(TrafficData {
                    avg_speed: Some(48),
                    avg_time: Some(21.5),
                    traffic: count,
                    traffic_period: period,
                    date_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 11, 55, 0).unwrap()),
                    color: Some("green".to_string()),
                }),
            },
            geometry: LineGeometry {
                kind: "MultiLineString".to_string(),
                coordinates: vec![vec![vec![19.01, 50.26]], vec![vec![19.03, 50.27]]],
            },
        }
    }

    fn value_of<'a>(readings: &'a [Reading], key: &str) -> Option<&'a ReadingValue> {
        readings.iter().find(|r| r.key == key).map(|r| &r.value)
    }

    #[test]
    fn test_flow_per_hour() {
        // ---
        assert_eq!(flow_per_hour(15, 30).unwrap(), 120);
        assert_eq!(flow_per_hour(3, 7).unwrap(), 140);
        assert_eq!(flow_per_hour(7, 10).unwrap(), 85);
        assert!(matches!(
            flow_per_hour(0, 30),
            Err(ItsError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_five_readings_per_feature() {
        // ---
        let readings = traffic_readings(&create_test_feature(Some(15), Some(30)));

        assert_eq!(readings.len(), 5);
        assert_eq!(
            value_of(&readings, "ktw_its_1201_avg_speed"),
            Some(&ReadingValue::Integer(48))
        );
        assert_eq!(
            value_of(&readings, "ktw_its_1201_avg_time"),
            Some(&ReadingValue::Float(21.5))
        );
        assert_eq!(
            value_of(&readings, "ktw_its_1201_traffic"),
            Some(&ReadingValue::Integer(30))
        );
        assert_eq!(
            value_of(&readings, "ktw_its_1201_traffic_flow_per_hour"),
            Some(&ReadingValue::Integer(120))
        );
        assert_eq!(
            value_of(&readings, "ktw_its_1201_traffic_period"),
            Some(&ReadingValue::Text("15".to_string()))
        );
    }

    #[test]
    fn test_zero_period_drops_only_flow() {
        // ---
        let readings = traffic_readings(&create_test_feature(Some(0), Some(30)));

        assert_eq!(readings.len(), 4);
        assert!(value_of(&readings, "ktw_its_1201_traffic_flow_per_hour").is_none());
        assert!(value_of(&readings, "ktw_its_1201_avg_speed").is_some());
        assert!(value_of(&readings, "ktw_its_1201_traffic_period").is_some());
    }

    #[test]
    fn test_readings_share_attributes() {
        // ---
        let readings = traffic_readings(&create_test_feature(Some(15), Some(30)));
        let first = &readings[0].attributes;

        assert!(readings.iter().all(|r| &r.attributes == first));
        assert_eq!(first.get("color"), Some(&ReadingValue::Text("green".to_string())));
        assert_eq!(first.get("latitude"), Some(&ReadingValue::Float(50.27)));
        assert_eq!(first.get("longitude"), Some(&ReadingValue::Float(19.03)));
        assert_eq!(
            first.get("update_date"),
            Some(&ReadingValue::Timestamp(
                Utc.with_ymd_and_hms(2024, 5, 1, 11, 55, 0).unwrap()
            ))
        );
    }

    #[test]
    fn test_feature_without_data_yields_nothing() {
        // ---
        let mut feature = create_test_feature(Some(15), Some(30));
        feature.properties.data = None;
        assert!(traffic_readings(&feature).is_empty());
    }
}
