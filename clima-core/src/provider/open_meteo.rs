use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::ProviderUnavailable,
    http::fetch_json,
    model::Coordinate,
    provider::{ProviderId, ProviderResult},
};

use super::WeatherProvider;

const FORECAST_DAYS: u32 = 10;
const FORECAST_HOURS: u32 = 24;

/// Field names requested from the point provider, per section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMeteoFields {
    pub current: Vec<&'static str>,
    pub hourly: Vec<&'static str>,
    pub daily: Vec<&'static str>,
}

impl Default for OpenMeteoFields {
    fn default() -> Self {
        Self {
            current: vec![
                "temperature_2m",
                "relative_humidity_2m",
                "apparent_temperature",
                "is_day",
                "precipitation",
                "weather_code",
                "cloud_cover",
                "pressure_msl",
                "wind_speed_10m",
                "wind_direction_10m",
                "wind_gusts_10m",
            ],
            hourly: vec![
                "temperature_2m",
                "relative_humidity_2m",
                "apparent_temperature",
                "precipitation_probability",
                "precipitation",
                "weather_code",
                "pressure_msl",
                "wind_speed_10m",
                "wind_direction_10m",
                "is_day",
            ],
            daily: vec![
                "weather_code",
                "temperature_2m_max",
                "temperature_2m_min",
                "sunrise",
                "sunset",
                "uv_index_max",
                "precipitation_sum",
                "precipitation_probability_max",
                "wind_speed_10m_max",
                "wind_direction_10m_dominant",
            ],
        }
    }
}

/// Keyless point provider returning parallel arrays keyed by field name.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    fields: Arc<OpenMeteoFields>,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(http: Client, base_url: String) -> Self {
        Self::with_fields(http, base_url, Arc::new(OpenMeteoFields::default()))
    }

    pub fn with_fields(http: Client, base_url: String, fields: Arc<OpenMeteoFields>) -> Self {
        Self { base_url, fields, http }
    }

    async fn forecast(&self, coord: Coordinate, with_hourly: bool) -> Result<ProviderResult, ProviderUnavailable> {
        let mut query: Vec<(&str, String)> = vec![
            ("latitude", coord.latitude.to_string()),
            ("longitude", coord.longitude.to_string()),
            ("current", self.fields.current.join(",")),
            ("daily", self.fields.daily.join(",")),
            ("timezone", "auto".to_string()),
            ("forecast_days", FORECAST_DAYS.to_string()),
        ];
        if with_hourly {
            query.push(("hourly", self.fields.hourly.join(",")));
            query.push(("forecast_hours", FORECAST_HOURS.to_string()));
        }

        tracing::debug!(%coord, with_hourly, "requesting open-meteo forecast");

        let weather: OpenMeteoWeather = fetch_json(self.http.get(&self.base_url).query(&query))
            .await
            .map_err(|source| ProviderUnavailable::Http { provider: ProviderId::OpenMeteo, source })?;

        Ok(ProviderResult::Point(weather))
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    async fn fetch_weather(&self, coord: Coordinate) -> Result<ProviderResult, ProviderUnavailable> {
        self.forecast(coord, true).await
    }

    async fn fetch_forecast_window(
        &self,
        coord: Coordinate,
    ) -> Result<ProviderResult, ProviderUnavailable> {
        self.forecast(coord, false).await
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OmCurrent {
    pub time: Option<String>,
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub is_day: Option<i64>,
    pub precipitation: Option<f64>,
    pub weather_code: Option<i64>,
    pub cloud_cover: Option<f64>,
    pub pressure_msl: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_direction_10m: Option<f64>,
    pub wind_gusts_10m: Option<f64>,
}

/// Parallel arrays; entries may be `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OmHourly {
    pub time: Vec<String>,
    pub temperature_2m: Vec<Option<f64>>,
    pub relative_humidity_2m: Vec<Option<f64>>,
    pub apparent_temperature: Vec<Option<f64>>,
    pub precipitation_probability: Vec<Option<f64>>,
    pub precipitation: Vec<Option<f64>>,
    pub weather_code: Vec<Option<i64>>,
    pub pressure_msl: Vec<Option<f64>>,
    pub wind_speed_10m: Vec<Option<f64>>,
    pub wind_direction_10m: Vec<Option<f64>>,
    pub is_day: Vec<Option<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OmDaily {
    pub time: Vec<String>,
    pub weather_code: Vec<Option<i64>>,
    pub temperature_2m_max: Vec<Option<f64>>,
    pub temperature_2m_min: Vec<Option<f64>>,
    pub sunrise: Vec<Option<String>>,
    pub sunset: Vec<Option<String>>,
    pub uv_index_max: Vec<Option<f64>>,
    pub precipitation_sum: Vec<Option<f64>>,
    pub precipitation_probability_max: Vec<Option<f64>>,
    pub wind_speed_10m_max: Vec<Option<f64>>,
    pub wind_direction_10m_dominant: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpenMeteoWeather {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub utc_offset_seconds: Option<i32>,
    pub current: Option<OmCurrent>,
    pub hourly: Option<OmHourly>,
    pub daily: Option<OmDaily>,
}

impl OpenMeteoWeather {
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
