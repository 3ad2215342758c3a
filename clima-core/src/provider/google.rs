use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::ProviderUnavailable,
    http::fetch_json,
    model::Coordinate,
    provider::{ProviderId, ProviderResult},
};

use super::WeatherProvider;

/// Keyed grid provider: one lookup endpoint returns current, hourly and daily
/// data in one of two layouts.
#[derive(Debug, Clone)]
pub struct GoogleWeatherProvider {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl GoogleWeatherProvider {
    pub fn new(http: Client, base_url: String, api_key: Option<String>) -> Self {
        Self { api_key, base_url, http }
    }

    async fn lookup(&self, coord: Coordinate) -> Result<ProviderResult, ProviderUnavailable> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderUnavailable::MissingCredential(ProviderId::Google))?;

        tracing::debug!(%coord, "requesting google weather lookup");

        let request = self
            .http
            .get(&self.base_url)
            .query(&[("location", coord.as_query().as_str()), ("key", api_key)]);

        let wire: GoogleWire = fetch_json(request)
            .await
            .map_err(|source| ProviderUnavailable::Http { provider: ProviderId::Google, source })?;

        Ok(ProviderResult::Grid(GoogleWeather::from_wire(wire)))
    }
}

#[async_trait]
impl WeatherProvider for GoogleWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_weather(&self, coord: Coordinate) -> Result<ProviderResult, ProviderUnavailable> {
        self.lookup(coord).await
    }

    async fn fetch_forecast_window(
        &self,
        coord: Coordinate,
    ) -> Result<ProviderResult, ProviderUnavailable> {
        self.lookup(coord).await
    }
}

/// Condition either as plain text or as a `{type, description: {text}}` object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GoogleCondition {
    Text(String),
    Described {
        #[serde(rename = "type")]
        kind: Option<String>,
        description: Option<GoogleText>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoogleText {
    pub text: String,
}

impl GoogleCondition {
    pub fn text(&self) -> Option<&str> {
        match self {
            GoogleCondition::Text(text) => Some(text.as_str()),
            GoogleCondition::Described { description: Some(d), .. } => Some(d.text.as_str()),
            GoogleCondition::Described { kind, .. } => kind.as_deref(),
        }
    }
}

/// Current block. Each quantity may arrive under either of two names; the
/// plain name wins.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleCurrent {
    temperature: Option<f64>,
    temperature_celsius: Option<f64>,
    humidity: Option<f64>,
    relative_humidity: Option<f64>,
    wind_speed: Option<f64>,
    wind_speed_kmh: Option<f64>,
    wind_direction: Option<f64>,
    wind_direction_degrees: Option<f64>,
    pressure: Option<f64>,
    pressure_mb: Option<f64>,
    visibility: Option<f64>,
    visibility_km: Option<f64>,
    uv_index: Option<f64>,
    uv_index_value: Option<f64>,
    condition: Option<GoogleCondition>,
    condition_text: Option<String>,
    feels_like: Option<f64>,
    feels_like_celsius: Option<f64>,
    pub is_daytime: Option<bool>,
    pub precipitation: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub wind_gust: Option<f64>,
}

impl GoogleCurrent {
    pub fn temperature(&self) -> Option<f64> {
        self.temperature.or(self.temperature_celsius)
    }
    pub fn humidity(&self) -> Option<f64> {
        self.humidity.or(self.relative_humidity)
    }
    pub fn wind_speed(&self) -> Option<f64> {
        self.wind_speed.or(self.wind_speed_kmh)
    }
    pub fn wind_direction(&self) -> Option<f64> {
        self.wind_direction.or(self.wind_direction_degrees)
    }
    pub fn pressure(&self) -> Option<f64> {
        self.pressure.or(self.pressure_mb)
    }
    pub fn visibility(&self) -> Option<f64> {
        self.visibility.or(self.visibility_km)
    }
    pub fn uv_index(&self) -> Option<f64> {
        self.uv_index.or(self.uv_index_value)
    }
    pub fn feels_like(&self) -> Option<f64> {
        self.feels_like.or(self.feels_like_celsius)
    }
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_ref().and_then(GoogleCondition::text).or(self.condition_text.as_deref())
    }
}

/// Hourly data as one object per hour.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleHourlyEntry {
    pub time: Option<String>,
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub pressure: Option<f64>,
    pub condition: Option<GoogleCondition>,
    pub precipitation: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub is_daytime: Option<bool>,
}

/// Hourly data as parallel arrays.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GoogleHourlyColumns {
    time: Vec<Option<String>>,
    temperature: Vec<Option<f64>>,
    feels_like: Vec<Option<f64>>,
    humidity: Vec<Option<f64>>,
    wind_speed: Vec<Option<f64>>,
    wind_direction: Vec<Option<f64>>,
    pressure: Vec<Option<f64>>,
    condition: Vec<Option<GoogleCondition>>,
    precipitation: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    is_daytime: Vec<Option<bool>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleDailyEntry {
    pub time: Option<String>,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub condition: Option<GoogleCondition>,
    pub precipitation: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub uv_index: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GoogleDailyColumns {
    time: Vec<Option<String>>,
    temperature_max: Vec<Option<f64>>,
    temperature_min: Vec<Option<f64>>,
    condition: Vec<Option<GoogleCondition>>,
    precipitation: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    uv_index: Vec<Option<f64>>,
    wind_speed: Vec<Option<f64>>,
    wind_direction: Vec<Option<f64>>,
    sunrise: Vec<Option<String>>,
    sunset: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleAlert {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTimeZone {
    pub id: String,
}

/// Body exactly as received; either layout may be present for each series.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GoogleWire {
    current: Option<GoogleCurrent>,
    hourly: Option<GoogleHourlyColumns>,
    hourly_forecast: Option<Vec<GoogleHourlyEntry>>,
    daily: Option<GoogleDailyColumns>,
    daily_forecast: Option<Vec<GoogleDailyEntry>>,
    alerts: Option<Vec<GoogleAlert>>,
    time_zone: Option<GoogleTimeZone>,
    utc_offset_seconds: Option<i32>,
}

/// Which layout a series arrived in.
enum Layout<C, R> {
    Columns(C),
    Rows(Vec<R>),
    Absent,
}

impl<C, R> Layout<C, R> {
    /// Arrays win over per-entry objects when both are sent.
    fn detect(columns: Option<C>, rows: Option<Vec<R>>) -> Self {
        match (columns, rows) {
            (Some(columns), _) => Layout::Columns(columns),
            (None, Some(rows)) => Layout::Rows(rows),
            (None, None) => Layout::Absent,
        }
    }
}

/// Grid provider result with both series reduced to one entry per instant.
#[derive(Debug, Clone, Default)]
pub struct GoogleWeather {
    pub current: Option<GoogleCurrent>,
    pub hourly: Vec<GoogleHourlyEntry>,
    pub daily: Vec<GoogleDailyEntry>,
    pub alerts: Vec<GoogleAlert>,
    pub time_zone: Option<String>,
    pub utc_offset_seconds: Option<i32>,
}

impl GoogleWeather {
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<GoogleWire>(value).map(Self::from_wire)
    }

    fn from_wire(wire: GoogleWire) -> Self {
        let hourly = match Layout::detect(wire.hourly, wire.hourly_forecast) {
            Layout::Columns(c) => hourly_rows(c),
            Layout::Rows(rows) => rows,
            Layout::Absent => Vec::new(),
        };
        let daily = match Layout::detect(wire.daily, wire.daily_forecast) {
            Layout::Columns(c) => daily_rows(c),
            Layout::Rows(rows) => rows,
            Layout::Absent => Vec::new(),
        };

        Self {
            current: wire.current,
            hourly,
            daily,
            alerts: wire.alerts.unwrap_or_default(),
            time_zone: wire.time_zone.map(|tz| tz.id),
            utc_offset_seconds: wire.utc_offset_seconds,
        }
    }
}

fn at<T: Clone>(column: &[Option<T>], i: usize) -> Option<T> {
    column.get(i).cloned().flatten()
}

/// The `time` array defines the length; shorter columns read as missing.
fn hourly_rows(c: GoogleHourlyColumns) -> Vec<GoogleHourlyEntry> {
    (0..c.time.len())
        .map(|i| GoogleHourlyEntry {
            time: at(&c.time, i),
            temperature: at(&c.temperature, i),
            feels_like: at(&c.feels_like, i),
            humidity: at(&c.humidity, i),
            wind_speed: at(&c.wind_speed, i),
            wind_direction: at(&c.wind_direction, i),
            pressure: at(&c.pressure, i),
            condition: at(&c.condition, i),
            precipitation: at(&c.precipitation, i),
            precipitation_probability: at(&c.precipitation_probability, i),
            is_daytime: at(&c.is_daytime, i),
        })
        .collect()
}

fn daily_rows(c: GoogleDailyColumns) -> Vec<GoogleDailyEntry> {
    (0..c.time.len())
        .map(|i| GoogleDailyEntry {
            time: at(&c.time, i),
            temperature_max: at(&c.temperature_max, i),
            temperature_min: at(&c.temperature_min, i),
            condition: at(&c.condition, i),
            precipitation: at(&c.precipitation, i),
            precipitation_probability: at(&c.precipitation_probability, i),
            uv_index: at(&c.uv_index, i),
            wind_speed: at(&c.wind_speed, i),
            wind_direction: at(&c.wind_direction, i),
            sunrise: at(&c.sunrise, i),
            sunset: at(&c.sunset, i),
        })
        .collect()
}
