use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::Readings;
use crate::cache::{minutes, CacheState, Freshness, WEATHER_VALIDITY_MINUTES};
use crate::context::Context;
use crate::error::Result;
use crate::models::{Attributes, MeasurementKind, Reading, ReadingValue, SourceGroup, DOMAIN};
use crate::parsers::Weather;

const MICROGRAMS_PER_CUBIC_METER: &str = "µg/m³";

// ---

/// Weather and air quality client. Valid until observation time + 20 min.
pub struct WeatherApi {
    ctx: Context,
    state: Mutex<CacheState<Readings>>,
}

impl WeatherApi {
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
            debug!("Weather data is still valid until {:?}", state.deadline());
            return Ok(state.data().cloned().unwrap_or_default());
        }

        match self.refresh(&mut state).await {
            Ok(readings) => Ok(readings),
            Err(e) => state.degrade("Weather", e),
        }
    }

    async fn refresh(&self, state: &mut CacheState<Readings>) -> Result<Readings> {
        // ---
        let text = self
            .ctx
            .fetcher
            .fetch_text(&self.ctx.endpoints.weather())
            .await?;
        let weather = Weather::parse(&text)?;
        let deadline = weather.date + minutes(WEATHER_VALIDITY_MINUTES);

        let readings = weather_readings(&weather);
        let count = readings.len();
        state.upsert(deadline, |cached| {
            cached.extend(readings.into_iter().map(|r| (r.key.clone(), r)));
        });

        info!(
            "Weather refreshed: {} readings observed at {}, valid until {}",
            count, weather.date, deadline
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

fn weather_key(kind: MeasurementKind) -> String {
    format!("{}_weather_{}", DOMAIN, kind.as_str())
}

fn weather_reading(kind: MeasurementKind, value: impl Into<ReadingValue>) -> Reading {
    Reading::new(weather_key(kind), SourceGroup::Weather, value).kind(kind)
}

/// One reading per measured quantity of a snapshot.
pub(crate) fn weather_readings(weather: &Weather) -> Vec<Reading> {
    // ---
    use MeasurementKind::*;

    let mut description = Attributes::new();
    description.insert("description".to_string(), weather.description.clone().into());

    let pollutants = [
        (NitrogenMonoxide, weather.no),
        (NitrogenDioxide, weather.no2),
        (Ozone, weather.o3),
        (SulphurDioxide, weather.so2),
        (Pm25, weather.pm2_5),
        (Pm10, weather.pm10),
    ];

    let mut readings = vec![
        weather_reading(Temperature, weather.temperature)
            .unit("°C")
            .attributes(description),
        weather_reading(Pressure, weather.pressure).unit("hPa"),
        weather_reading(Humidity, weather.humidity).unit("%"),
        weather_reading(WindSpeed, weather.wind_speed).unit("m/s"),
        weather_reading(WindDirection, weather.wind_degrees)
            .unit("°")
            .icon("mdi:compass-outline"),
        weather_reading(Aqi, weather.aqi),
        weather_reading(CarbonMonoxide, weather.co).unit("ppm"),
    ];
    readings.extend(
        pollutants
            .into_iter()
            .map(|(kind, value)| weather_reading(kind, value).unit(MICROGRAMS_PER_CUBIC_METER)),
    );
    readings.push(
        Reading::new(format!("{}_weather_sunrise", DOMAIN), SourceGroup::Weather, weather.sunrise)
            .kind(Timestamp)
            .name("Sunrise"),
    );
    readings.push(
        Reading::new(format!("{}_weather_sunset", DOMAIN), SourceGroup::Weather, weather.sunset)
            .kind(Timestamp)
            .name("Sunset"),
    );
    readings
}
