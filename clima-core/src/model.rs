use std::{collections::BTreeSet, fmt};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{condition::CanonicalCondition, geocode::GeocoderId, provider::ProviderId};

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// `"-12.05°, -77.04°"`, used when no place name can be found.
    pub fn display_string(&self) -> String {
        format!("{:.2}°, {:.2}°", self.latitude, self.longitude)
    }

    /// `"lat,lng"` as expected by the grid provider and its geocoder.
    pub(crate) fn as_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Fields of [`CurrentConditions`] that may be filled with a fixed default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentField {
    Temperature,
    Humidity,
    WindSpeed,
    WindDirection,
    Pressure,
    Visibility,
    UvIndex,
    Condition,
    FeelsLike,
    IsDaytime,
    Precipitation,
    PrecipitationProbability,
    CloudCover,
    WindGust,
}

/// Single-instant snapshot. Units: °C, %, km/h, degrees, hPa, km, mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub pressure: f64,
    pub visibility: f64,
    pub uv_index: f64,
    pub condition: CanonicalCondition,
    pub feels_like: f64,
    pub is_daytime: bool,
    pub precipitation: f64,
    pub precipitation_probability: f64,
    pub cloud_cover: f64,
    pub wind_gust: f64,
    /// Fields that were absent upstream and hold a documented default.
    pub defaulted: BTreeSet<CurrentField>,
}

impl CurrentConditions {
    pub fn is_defaulted(&self, field: CurrentField) -> bool {
        self.defaulted.contains(&field)
    }
}

/// One hourly instant; pushed into [`HourlySeries`] as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub precipitation_probability: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub pressure: f64,
    pub condition: CanonicalCondition,
    pub is_day: bool,
}

/// Parallel hourly sequences. Index `i` of every vector describes the same
/// local instant, so all vectors always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<NaiveDateTime>,
    pub temperature: Vec<f64>,
    pub feels_like: Vec<f64>,
    pub humidity: Vec<f64>,
    pub precipitation: Vec<f64>,
    pub precipitation_probability: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub wind_direction: Vec<f64>,
    pub pressure: Vec<f64>,
    pub condition: Vec<CanonicalCondition>,
    pub is_day: Vec<bool>,
}

impl HourlySeries {
    pub fn push(&mut self, p: HourlyPoint) {
        self.time.push(p.time);
        self.temperature.push(p.temperature);
        self.feels_like.push(p.feels_like);
        self.humidity.push(p.humidity);
        self.precipitation.push(p.precipitation);
        self.precipitation_probability.push(p.precipitation_probability);
        self.wind_speed.push(p.wind_speed);
        self.wind_direction.push(p.wind_direction);
        self.pressure.push(p.pressure);
        self.condition.push(p.condition);
        self.is_day.push(p.is_day);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Instant `i`, or `None` when any sequence is too short to describe it.
    pub fn point(&self, i: usize) -> Option<HourlyPoint> {
        Some(HourlyPoint {
            time: *self.time.get(i)?,
            temperature: *self.temperature.get(i)?,
            feels_like: *self.feels_like.get(i)?,
            humidity: *self.humidity.get(i)?,
            precipitation: *self.precipitation.get(i)?,
            precipitation_probability: *self.precipitation_probability.get(i)?,
            wind_speed: *self.wind_speed.get(i)?,
            wind_direction: *self.wind_direction.get(i)?,
            pressure: *self.pressure.get(i)?,
            condition: *self.condition.get(i)?,
            is_day: *self.is_day.get(i)?,
        })
    }

    /// Instants in order, stopping at the shortest sequence.
    pub fn points(&self) -> impl Iterator<Item = HourlyPoint> + '_ {
        (0..self.len()).map_while(|i| self.point(i))
    }

    /// True when every sequence has the length of `time`.
    pub fn is_aligned(&self) -> bool {
        let n = self.time.len();
        [
            self.temperature.len(),
            self.feels_like.len(),
            self.humidity.len(),
            self.precipitation.len(),
            self.precipitation_probability.len(),
            self.wind_speed.len(),
            self.wind_direction.len(),
            self.pressure.len(),
            self.condition.len(),
            self.is_day.len(),
        ]
        .iter()
        .all(|len| *len == n)
    }
}

/// One calendar day; pushed into [`DailySeries`] as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub time: NaiveDate,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub condition: CanonicalCondition,
    pub precipitation: f64,
    pub precipitation_probability: f64,
    pub uv_index_max: f64,
    pub wind_speed_max: f64,
    pub wind_direction: f64,
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

/// Parallel daily sequences, `time[0]` being the local today.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<NaiveDate>,
    pub temperature_max: Vec<f64>,
    pub temperature_min: Vec<f64>,
    pub condition: Vec<CanonicalCondition>,
    pub precipitation: Vec<f64>,
    pub precipitation_probability: Vec<f64>,
    pub uv_index_max: Vec<f64>,
    pub wind_speed_max: Vec<f64>,
    pub wind_direction: Vec<f64>,
    pub sunrise: Vec<NaiveTime>,
    pub sunset: Vec<NaiveTime>,
}

impl DailySeries {
    pub fn push(&mut self, p: DailyPoint) {
        self.time.push(p.time);
        self.temperature_max.push(p.temperature_max);
        self.temperature_min.push(p.temperature_min);
        self.condition.push(p.condition);
        self.precipitation.push(p.precipitation);
        self.precipitation_probability.push(p.precipitation_probability);
        self.uv_index_max.push(p.uv_index_max);
        self.wind_speed_max.push(p.wind_speed_max);
        self.wind_direction.push(p.wind_direction);
        self.sunrise.push(p.sunrise);
        self.sunset.push(p.sunset);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn point(&self, i: usize) -> Option<DailyPoint> {
        Some(DailyPoint {
            time: *self.time.get(i)?,
            temperature_max: *self.temperature_max.get(i)?,
            temperature_min: *self.temperature_min.get(i)?,
            condition: *self.condition.get(i)?,
            precipitation: *self.precipitation.get(i)?,
            precipitation_probability: *self.precipitation_probability.get(i)?,
            uv_index_max: *self.uv_index_max.get(i)?,
            wind_speed_max: *self.wind_speed_max.get(i)?,
            wind_direction: *self.wind_direction.get(i)?,
            sunrise: *self.sunrise.get(i)?,
            sunset: *self.sunset.get(i)?,
        })
    }

    pub fn points(&self) -> impl Iterator<Item = DailyPoint> + '_ {
        (0..self.len()).map_while(|i| self.point(i))
    }

    pub fn is_aligned(&self) -> bool {
        let n = self.time.len();
        [
            self.temperature_max.len(),
            self.temperature_min.len(),
            self.condition.len(),
            self.precipitation.len(),
            self.precipitation_probability.len(),
            self.uv_index_max.len(),
            self.wind_speed_max.len(),
            self.wind_direction.len(),
            self.sunrise.len(),
            self.sunset.len(),
        ]
        .iter()
        .all(|len| *len == n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Unknown,
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl AlertSeverity {
    /// Classify a free-form severity label by substring, most severe first.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("extreme") {
            Self::Extreme
        } else if lower.contains("severe") {
            Self::Severe
        } else if lower.contains("moderate") {
            Self::Moderate
        } else if lower.contains("minor") {
            Self::Minor
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Canonical weather output, whichever provider produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherModel {
    pub provider: ProviderId,
    pub coordinate: Coordinate,
    /// Offset of the location's local time from UTC.
    pub utc_offset_seconds: i32,
    pub current: CurrentConditions,
    pub hourly: HourlySeries,
    pub daily: DailySeries,
    pub alerts: Vec<WeatherAlert>,
    /// Provider values outside plausible metric ranges; kept as received.
    pub flags: Vec<String>,
}

/// Provider tag attached to a [`ForecastWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastSource {
    pub provider: ProviderId,
    pub fallback: bool,
}

impl fmt::Display for ForecastSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fallback {
            write!(f, "{} (fallback)", self.provider)
        } else {
            write!(f, "{}", self.provider)
        }
    }
}

/// Looser 10-day structure. Sections the provider did not send are empty,
/// never missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastWindow {
    pub source: ForecastSource,
    pub current: CurrentConditions,
    pub hourly: HourlySeries,
    pub daily: DailySeries,
    pub alerts: Vec<WeatherAlert>,
}

/// Where a [`PlaceName`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceSource {
    Geocoder(GeocoderId),
    ReferenceTable,
    /// The coordinate itself, formatted.
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceName {
    pub name: String,
    pub source: PlaceSource,
}

impl fmt::Display for PlaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A forward-search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityCandidate {
    pub name: String,
    pub country: String,
    pub coordinate: Coordinate,
    pub formatted_address: String,
}
