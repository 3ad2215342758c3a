//! Provider result → canonical [`WeatherModel`].
//!
//! Values are copied as received: every provider is assumed to report metric
//! units (°C, km/h, hPa, km, mm). Values outside plausible ranges are flagged
//! on the model and logged, never rewritten.
//!
//! Fields a provider does not send are filled from the constants in
//! [`defaults`] and recorded in [`CurrentConditions::defaulted`].

use std::collections::BTreeSet;

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Timelike, Utc,
};

use crate::{
    condition::{CanonicalCondition, ConditionCodeMapper, ProviderCode},
    model::{
        AlertSeverity, Coordinate, CurrentConditions, CurrentField, DailyPoint, DailySeries,
        ForecastSource, ForecastWindow, HourlyPoint, HourlySeries, WeatherAlert, WeatherModel,
    },
    provider::{
        ProviderId, ProviderResult,
        google::{GoogleAlert, GoogleCurrent, GoogleDailyEntry, GoogleHourlyEntry, GoogleWeather},
        open_meteo::{OmCurrent, OmDaily, OmHourly, OpenMeteoWeather},
    },
};

/// Maximum number of days kept in the daily series.
pub const MAX_FORECAST_DAYS: usize = 10;

/// Fixed values used for fields a provider omits.
pub mod defaults {
    use chrono::NaiveTime;

    pub const TEMPERATURE: f64 = 0.0;
    pub const HUMIDITY: f64 = 0.0;
    pub const WIND_SPEED: f64 = 0.0;
    pub const WIND_DIRECTION: f64 = 0.0;
    /// Standard sea-level pressure, hPa.
    pub const PRESSURE: f64 = 1013.0;
    pub const VISIBILITY_KM: f64 = 10.0;
    pub const UV_INDEX: f64 = 5.0;
    pub const PRECIPITATION: f64 = 0.0;
    pub const PRECIPITATION_PROBABILITY: f64 = 10.0;
    pub const CLOUD_COVER: f64 = 20.0;
    /// Local hours `[DAY_START_HOUR, DAY_END_HOUR)` count as daytime.
    pub const DAY_START_HOUR: u32 = 6;
    pub const DAY_END_HOUR: u32 = 18;

    pub fn sunrise() -> NaiveTime {
        NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn sunset() -> NaiveTime {
        NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

/// Local wall clock of the forecast location.
#[derive(Debug, Clone, Copy)]
pub struct LocalTime {
    pub offset: FixedOffset,
    pub now: NaiveDateTime,
}

impl LocalTime {
    /// Resolve the location's offset: explicit seconds, then an IANA zone
    /// name, then the solar offset from longitude.
    pub fn resolve(
        now: DateTime<Utc>,
        utc_offset_seconds: Option<i32>,
        time_zone: Option<&str>,
        coord: Coordinate,
    ) -> Self {
        let offset = utc_offset_seconds
            .and_then(FixedOffset::east_opt)
            .or_else(|| {
                time_zone
                    .and_then(|tz| tz.parse::<chrono_tz::Tz>().ok())
                    .map(|tz| now.with_timezone(&tz).offset().fix())
            })
            .unwrap_or_else(|| solar_offset(coord.longitude));

        Self { offset, now: now.with_timezone(&offset).naive_local() }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    pub fn utc_offset_seconds(&self) -> i32 {
        self.offset.local_minus_utc()
    }

    /// Provider timestamps: RFC 3339 (converted to local) or naive local.
    fn parse_datetime(&self, raw: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&self.offset).naive_local());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
            .ok()
    }

    fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        if let Some(dt) = self.parse_datetime(raw) {
            return Some(dt.date());
        }
        NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
    }

    fn parse_time_of_day(&self, raw: &str) -> Option<NaiveTime> {
        if let Some(dt) = self.parse_datetime(raw) {
            return Some(dt.time());
        }
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()
    }
}

fn solar_offset(longitude: f64) -> FixedOffset {
    let hours = if longitude.is_finite() { (longitude / 15.0).round() as i32 } else { 0 };
    FixedOffset::east_opt(hours.clamp(-12, 14) * 3600).unwrap_or_else(|| Utc.fix())
}

fn is_daytime_hour(time: NaiveDateTime) -> bool {
    (defaults::DAY_START_HOUR..defaults::DAY_END_HOUR).contains(&time.hour())
}

/// Collects values for the current block and remembers which were defaulted.
#[derive(Default)]
struct CurrentBuilder {
    defaulted: BTreeSet<CurrentField>,
}

impl CurrentBuilder {
    fn take(&mut self, value: Option<f64>, field: CurrentField, default: f64) -> f64 {
        value.unwrap_or_else(|| {
            self.defaulted.insert(field);
            default
        })
    }

    fn mark(&mut self, field: CurrentField) {
        self.defaulted.insert(field);
    }
}

/// Normalise any provider result into the canonical model.
pub fn to_weather_model(
    result: ProviderResult,
    coord: Coordinate,
    mapper: &ConditionCodeMapper,
    now: DateTime<Utc>,
) -> WeatherModel {
    let mut model = match result {
        ProviderResult::Grid(weather) => from_google(weather, coord, mapper, now),
        ProviderResult::Point(weather) => from_open_meteo(weather, coord, mapper, now),
    };
    model.flags = plausibility_flags(&model.current);
    for flag in &model.flags {
        tracing::warn!(provider = %model.provider, %coord, "implausible provider value: {flag}");
    }
    model
}

/// Normalise into the looser forecast-window structure.
pub fn to_forecast_window(
    result: ProviderResult,
    coord: Coordinate,
    mapper: &ConditionCodeMapper,
    now: DateTime<Utc>,
    fallback: bool,
) -> ForecastWindow {
    let model = to_weather_model(result, coord, mapper, now);
    ForecastWindow {
        source: ForecastSource { provider: model.provider, fallback },
        current: model.current,
        hourly: model.hourly,
        daily: model.daily,
        alerts: model.alerts,
    }
}

fn from_google(
    weather: GoogleWeather,
    coord: Coordinate,
    mapper: &ConditionCodeMapper,
    now: DateTime<Utc>,
) -> WeatherModel {
    let local = LocalTime::resolve(now, weather.utc_offset_seconds, weather.time_zone.as_deref(), coord);
    let current = google_current(weather.current.unwrap_or_default(), mapper, &local);

    let mut hourly = HourlySeries::default();
    for entry in &weather.hourly {
        if let Some(point) = google_hour(entry, mapper, &local) {
            hourly.push(point);
        }
    }

    let days = weather.daily.iter().filter_map(|entry| google_day(entry, mapper, &local));
    let daily = from_today(days, local.today());

    WeatherModel {
        provider: ProviderId::Google,
        coordinate: coord,
        utc_offset_seconds: local.utc_offset_seconds(),
        current,
        hourly,
        daily,
        alerts: weather.alerts.into_iter().map(google_alert).collect(),
        flags: Vec::new(),
    }
}

fn google_condition(text: Option<&str>, mapper: &ConditionCodeMapper) -> Option<CanonicalCondition> {
    text.map(|t| mapper.to_canonical(ProviderCode::Text(t), ProviderId::Google))
}

fn google_current(c: GoogleCurrent, mapper: &ConditionCodeMapper, local: &LocalTime) -> CurrentConditions {
    let mut b = CurrentBuilder::default();

    let temperature = b.take(c.temperature(), CurrentField::Temperature, defaults::TEMPERATURE);
    let feels_like = b.take(c.feels_like(), CurrentField::FeelsLike, temperature);
    let wind_speed = b.take(c.wind_speed(), CurrentField::WindSpeed, defaults::WIND_SPEED);
    let condition = google_condition(c.condition(), mapper).unwrap_or_else(|| {
        b.mark(CurrentField::Condition);
        CanonicalCondition::Clear
    });
    let is_daytime = c.is_daytime.unwrap_or_else(|| {
        b.mark(CurrentField::IsDaytime);
        is_daytime_hour(local.now)
    });

    CurrentConditions {
        temperature,
        humidity: b.take(c.humidity(), CurrentField::Humidity, defaults::HUMIDITY),
        wind_speed,
        wind_direction: b.take(c.wind_direction(), CurrentField::WindDirection, defaults::WIND_DIRECTION),
        pressure: b.take(c.pressure(), CurrentField::Pressure, defaults::PRESSURE),
        visibility: b.take(c.visibility(), CurrentField::Visibility, defaults::VISIBILITY_KM),
        uv_index: b.take(c.uv_index(), CurrentField::UvIndex, defaults::UV_INDEX),
        condition,
        feels_like,
        is_daytime,
        precipitation: b.take(c.precipitation, CurrentField::Precipitation, defaults::PRECIPITATION),
        precipitation_probability: b.take(
            c.precipitation_probability,
            CurrentField::PrecipitationProbability,
            defaults::PRECIPITATION_PROBABILITY,
        ),
        cloud_cover: b.take(c.cloud_cover, CurrentField::CloudCover, defaults::CLOUD_COVER),
        wind_gust: b.take(c.wind_gust, CurrentField::WindGust, wind_speed),
        defaulted: b.defaulted,
    }
}

fn google_hour(e: &GoogleHourlyEntry, mapper: &ConditionCodeMapper, local: &LocalTime) -> Option<HourlyPoint> {
    let time = local.parse_datetime(e.time.as_deref()?)?;
    let temperature = e.temperature.unwrap_or(defaults::TEMPERATURE);
    Some(HourlyPoint {
        time,
        temperature,
        feels_like: e.feels_like.unwrap_or(temperature),
        humidity: e.humidity.unwrap_or(defaults::HUMIDITY),
        precipitation: e.precipitation.unwrap_or(defaults::PRECIPITATION),
        precipitation_probability: e.precipitation_probability.unwrap_or(defaults::PRECIPITATION_PROBABILITY),
        wind_speed: e.wind_speed.unwrap_or(defaults::WIND_SPEED),
        wind_direction: e.wind_direction.unwrap_or(defaults::WIND_DIRECTION),
        pressure: e.pressure.unwrap_or(defaults::PRESSURE),
        condition: google_condition(e.condition.as_ref().and_then(|c| c.text()), mapper).unwrap_or_default(),
        is_day: e.is_daytime.unwrap_or_else(|| is_daytime_hour(time)),
    })
}

fn google_day(e: &GoogleDailyEntry, mapper: &ConditionCodeMapper, local: &LocalTime) -> Option<DailyPoint> {
    let time = local.parse_date(e.time.as_deref()?)?;
    Some(DailyPoint {
        time,
        temperature_max: e.temperature_max.unwrap_or(defaults::TEMPERATURE),
        temperature_min: e.temperature_min.unwrap_or(defaults::TEMPERATURE),
        condition: google_condition(e.condition.as_ref().and_then(|c| c.text()), mapper).unwrap_or_default(),
        precipitation: e.precipitation.unwrap_or(defaults::PRECIPITATION),
        precipitation_probability: e.precipitation_probability.unwrap_or(defaults::PRECIPITATION_PROBABILITY),
        uv_index_max: e.uv_index.unwrap_or(defaults::UV_INDEX),
        wind_speed_max: e.wind_speed.unwrap_or(defaults::WIND_SPEED),
        wind_direction: e.wind_direction.unwrap_or(defaults::WIND_DIRECTION),
        sunrise: e.sunrise.as_deref().and_then(|s| local.parse_time_of_day(s)).unwrap_or_else(defaults::sunrise),
        sunset: e.sunset.as_deref().and_then(|s| local.parse_time_of_day(s)).unwrap_or_else(defaults::sunset),
    })
}

fn google_alert(a: GoogleAlert) -> WeatherAlert {
    WeatherAlert {
        title: a.title.unwrap_or_else(|| "Weather alert".to_string()),
        description: a.description.unwrap_or_default(),
        severity: AlertSeverity::from_label(a.severity.as_deref().unwrap_or_default()),
        start_time: a.start_time,
        end_time: a.end_time,
    }
}

fn from_open_meteo(
    weather: OpenMeteoWeather,
    coord: Coordinate,
    mapper: &ConditionCodeMapper,
    now: DateTime<Utc>,
) -> WeatherModel {
    let local = LocalTime::resolve(now, weather.utc_offset_seconds, weather.timezone.as_deref(), coord);

    WeatherModel {
        provider: ProviderId::OpenMeteo,
        coordinate: coord,
        utc_offset_seconds: local.utc_offset_seconds(),
        current: open_meteo_current(weather.current.unwrap_or_default(), mapper, &local),
        hourly: weather.hourly.map(|h| open_meteo_hourly(h, mapper, &local)).unwrap_or_default(),
        daily: weather.daily.map(|d| open_meteo_daily(d, mapper, &local)).unwrap_or_default(),
        alerts: Vec::new(),
        flags: Vec::new(),
    }
}

fn open_meteo_current(c: OmCurrent, mapper: &ConditionCodeMapper, local: &LocalTime) -> CurrentConditions {
    let mut b = CurrentBuilder::default();

    let temperature = b.take(c.temperature_2m, CurrentField::Temperature, defaults::TEMPERATURE);
    let wind_speed = b.take(c.wind_speed_10m, CurrentField::WindSpeed, defaults::WIND_SPEED);
    let condition = match c.weather_code {
        Some(code) => mapper.to_canonical(ProviderCode::Code(code), ProviderId::OpenMeteo),
        None => {
            b.mark(CurrentField::Condition);
            CanonicalCondition::Clear
        }
    };
    let is_daytime = match c.is_day {
        Some(flag) => flag == 1,
        None => {
            b.mark(CurrentField::IsDaytime);
            is_daytime_hour(local.now)
        }
    };

    CurrentConditions {
        temperature,
        humidity: b.take(c.relative_humidity_2m, CurrentField::Humidity, defaults::HUMIDITY),
        wind_speed,
        wind_direction: b.take(c.wind_direction_10m, CurrentField::WindDirection, defaults::WIND_DIRECTION),
        pressure: b.take(c.pressure_msl, CurrentField::Pressure, defaults::PRESSURE),
        // Not offered by the point provider's current block.
        visibility: b.take(None, CurrentField::Visibility, defaults::VISIBILITY_KM),
        uv_index: b.take(None, CurrentField::UvIndex, defaults::UV_INDEX),
        condition,
        feels_like: b.take(c.apparent_temperature, CurrentField::FeelsLike, temperature),
        is_daytime,
        precipitation: b.take(c.precipitation, CurrentField::Precipitation, defaults::PRECIPITATION),
        precipitation_probability: b.take(
            None,
            CurrentField::PrecipitationProbability,
            defaults::PRECIPITATION_PROBABILITY,
        ),
        cloud_cover: b.take(c.cloud_cover, CurrentField::CloudCover, defaults::CLOUD_COVER),
        wind_gust: b.take(c.wind_gusts_10m, CurrentField::WindGust, wind_speed),
        defaulted: b.defaulted,
    }
}

fn at<T: Copy>(column: &[Option<T>], i: usize) -> Option<T> {
    column.get(i).copied().flatten()
}

fn open_meteo_hourly(h: OmHourly, mapper: &ConditionCodeMapper, local: &LocalTime) -> HourlySeries {
    let mut series = HourlySeries::default();
    for (i, raw) in h.time.iter().enumerate() {
        let Some(time) = local.parse_datetime(raw) else {
            tracing::debug!(%raw, "skipping hourly entry with unreadable time");
            continue;
        };
        let temperature = at(&h.temperature_2m, i).unwrap_or(defaults::TEMPERATURE);
        series.push(HourlyPoint {
            time,
            temperature,
            feels_like: at(&h.apparent_temperature, i).unwrap_or(temperature),
            humidity: at(&h.relative_humidity_2m, i).unwrap_or(defaults::HUMIDITY),
            precipitation: at(&h.precipitation, i).unwrap_or(defaults::PRECIPITATION),
            precipitation_probability: at(&h.precipitation_probability, i)
                .unwrap_or(defaults::PRECIPITATION_PROBABILITY),
            wind_speed: at(&h.wind_speed_10m, i).unwrap_or(defaults::WIND_SPEED),
            wind_direction: at(&h.wind_direction_10m, i).unwrap_or(defaults::WIND_DIRECTION),
            pressure: at(&h.pressure_msl, i).unwrap_or(defaults::PRESSURE),
            condition: at(&h.weather_code, i)
                .map(|code| mapper.to_canonical(ProviderCode::Code(code), ProviderId::OpenMeteo))
                .unwrap_or_default(),
            is_day: at(&h.is_day, i).map(|flag| flag == 1).unwrap_or_else(|| is_daytime_hour(time)),
        });
    }
    series
}

fn open_meteo_daily(d: OmDaily, mapper: &ConditionCodeMapper, local: &LocalTime) -> DailySeries {
    let text_at = |column: &[Option<String>], i: usize| column.get(i).cloned().flatten();

    let days = d.time.iter().enumerate().filter_map(|(i, raw)| {
        let time = local.parse_date(raw)?;
        Some(DailyPoint {
            time,
            temperature_max: at(&d.temperature_2m_max, i).unwrap_or(defaults::TEMPERATURE),
            temperature_min: at(&d.temperature_2m_min, i).unwrap_or(defaults::TEMPERATURE),
            condition: at(&d.weather_code, i)
                .map(|code| mapper.to_canonical(ProviderCode::Code(code), ProviderId::OpenMeteo))
                .unwrap_or_default(),
            precipitation: at(&d.precipitation_sum, i).unwrap_or(defaults::PRECIPITATION),
            precipitation_probability: at(&d.precipitation_probability_max, i)
                .unwrap_or(defaults::PRECIPITATION_PROBABILITY),
            uv_index_max: at(&d.uv_index_max, i).unwrap_or(defaults::UV_INDEX),
            wind_speed_max: at(&d.wind_speed_10m_max, i).unwrap_or(defaults::WIND_SPEED),
            wind_direction: at(&d.wind_direction_10m_dominant, i).unwrap_or(defaults::WIND_DIRECTION),
            sunrise: text_at(&d.sunrise, i)
                .and_then(|s| local.parse_time_of_day(&s))
                .unwrap_or_else(defaults::sunrise),
            sunset: text_at(&d.sunset, i)
                .and_then(|s| local.parse_time_of_day(&s))
                .unwrap_or_else(defaults::sunset),
        })
    });

    from_today(days, local.today())
}

/// Drop days before `today` and cap the window.
fn from_today(days: impl Iterator<Item = DailyPoint>, today: NaiveDate) -> DailySeries {
    let mut series = DailySeries::default();
    for day in days.skip_while(|d| d.time < today).take(MAX_FORECAST_DAYS) {
        series.push(day);
    }
    if series.time.first().is_some_and(|first| *first != today) {
        tracing::warn!(%today, first = ?series.time.first(), "daily forecast does not start today");
    }
    series
}

fn plausibility_flags(c: &CurrentConditions) -> Vec<String> {
    let mut flags = Vec::new();
    let mut check = |name: &str, value: f64, range: std::ops::RangeInclusive<f64>| {
        if !range.contains(&value) {
            flags.push(format!("{name}={value} outside {}..={}", range.start(), range.end()));
        }
    };
    check("temperature", c.temperature, -90.0..=60.0);
    check("humidity", c.humidity, 0.0..=100.0);
    check("pressure", c.pressure, 850.0..=1100.0);
    check("wind_speed", c.wind_speed, 0.0..=f64::MAX);
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single().expect("valid instant")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    const LIMA: Coordinate = Coordinate::new(-12.0464, -77.0428);

    fn open_meteo_fixture() -> OpenMeteoWeather {
        OpenMeteoWeather::from_json(json!({
            "timezone": "America/Lima",
            "utc_offset_seconds": -18000,
            "current": {
                "temperature_2m": 18.4,
                "relative_humidity_2m": 81,
                "apparent_temperature": 17.9,
                "is_day": 0,
                "precipitation": 0.0,
                "weather_code": 3,
                "cloud_cover": 96,
                "pressure_msl": 1014.2,
                "wind_speed_10m": 11.2,
                "wind_direction_10m": 200,
                "wind_gusts_10m": 20.5
            },
            "hourly": {
                "time": ["2026-10-18T22:00", "2026-10-18T23:00", "2026-10-19T00:00"],
                "temperature_2m": [18.1, 17.9, null],
                "relative_humidity_2m": [82, 83],
                "precipitation_probability": [5, 5, 10],
                "weather_code": [3, 61, 95],
                "is_day": [0, 0, 0]
            },
            "daily": {
                "time": ["2026-10-18", "2026-10-19", "2026-10-20"],
                "weather_code": [3, 61, 0],
                "temperature_2m_max": [21.0, 20.5, 22.1],
                "temperature_2m_min": [16.0, 15.8, 16.2],
                "sunrise": ["2026-10-18T05:41", "2026-10-19T05:40", null],
                "sunset": ["2026-10-18T18:07", "2026-10-19T18:07", "2026-10-20T18:08"],
                "uv_index_max": [9.5, 8.0, 10.1]
            }
        }))
        .expect("fixture parses")
    }

    #[test]
    fn open_meteo_fills_documented_defaults_for_missing_current_fields() {
        let model = to_weather_model(
            ProviderResult::Point(open_meteo_fixture()),
            LIMA,
            &ConditionCodeMapper::standard(),
            utc(2026, 10, 19, 3),
        );

        let current = &model.current;
        assert_eq!(current.temperature, 18.4);
        assert_eq!(current.condition, CanonicalCondition::Cloudy);
        assert!(!current.is_daytime);
        assert!(!current.is_defaulted(CurrentField::Temperature));

        assert_eq!(current.visibility, defaults::VISIBILITY_KM);
        assert_eq!(current.uv_index, defaults::UV_INDEX);
        assert_eq!(current.precipitation_probability, defaults::PRECIPITATION_PROBABILITY);
        assert!(current.is_defaulted(CurrentField::Visibility));
        assert!(current.is_defaulted(CurrentField::UvIndex));
        assert!(current.is_defaulted(CurrentField::PrecipitationProbability));
        assert_eq!(current.defaulted.len(), 3);
        assert!(model.flags.is_empty());
    }

    #[test]
    fn open_meteo_series_are_aligned_and_missing_values_defaulted() {
        let model = to_weather_model(
            ProviderResult::Point(open_meteo_fixture()),
            LIMA,
            &ConditionCodeMapper::standard(),
            utc(2026, 10, 19, 3),
        );

        assert_eq!(model.hourly.len(), 3);
        assert!(model.hourly.is_aligned());
        assert_eq!(model.hourly.temperature[2], defaults::TEMPERATURE);
        assert_eq!(model.hourly.humidity[2], defaults::HUMIDITY);
        assert_eq!(model.hourly.condition[1], CanonicalCondition::LightRain);
        assert_eq!(model.hourly.condition[2], CanonicalCondition::Thunderstorm);

        assert_eq!(model.daily.len(), 3);
        assert!(model.daily.is_aligned());
        assert_eq!(model.daily.sunrise[2], defaults::sunrise());
        assert_eq!(model.daily.uv_index_max[0], 9.5);
    }

    #[test]
    fn daily_starts_on_local_today_across_a_utc_day_boundary() {
        // 03:00 UTC on the 19th is still the evening of the 18th in Lima.
        let model = to_weather_model(
            ProviderResult::Point(open_meteo_fixture()),
            LIMA,
            &ConditionCodeMapper::standard(),
            utc(2026, 10, 19, 3),
        );
        assert_eq!(model.daily.time[0], date(2026, 10, 18));
        assert_eq!(model.utc_offset_seconds, -18000);

        // Six hours later it is the 19th locally; the stale first day is dropped.
        let model = to_weather_model(
            ProviderResult::Point(open_meteo_fixture()),
            LIMA,
            &ConditionCodeMapper::standard(),
            utc(2026, 10, 19, 9),
        );
        assert_eq!(model.daily.time[0], date(2026, 10, 19));
        assert_eq!(model.daily.len(), 2);
        assert!(model.daily.is_aligned());
    }

    #[test]
    fn google_time_zone_id_decides_today() {
        let weather = GoogleWeather::from_json(json!({
            "timeZone": {"id": "Asia/Tokyo"},
            "daily": {
                "time": ["2026-10-18", "2026-10-19", "2026-10-20"],
                "temperatureMax": [20, 21, 22],
                "temperatureMin": [10, 11, 12],
                "condition": ["Sunny", "Heavy Thunderstorm", "Light Snow"]
            }
        }))
        .expect("parse");

        // 20:00 UTC on the 18th is 05:00 on the 19th in Tokyo.
        let model = to_weather_model(
            ProviderResult::Grid(weather),
            Coordinate::new(35.68, 139.69),
            &ConditionCodeMapper::standard(),
            utc(2026, 10, 18, 20),
        );

        assert_eq!(model.utc_offset_seconds, 9 * 3600);
        assert_eq!(model.daily.time, vec![date(2026, 10, 19), date(2026, 10, 20)]);
        assert_eq!(
            model.daily.condition,
            vec![CanonicalCondition::Thunderstorm, CanonicalCondition::SnowLight]
        );
        assert_eq!(model.daily.sunrise[0], defaults::sunrise());
    }

    #[test]
    fn google_without_time_zone_uses_solar_offset() {
        let local = LocalTime::resolve(utc(2026, 10, 18, 12), None, None, LIMA);
        assert_eq!(local.utc_offset_seconds(), -5 * 3600);

        let local = LocalTime::resolve(utc(2026, 10, 18, 12), None, Some("Not/AZone"), Coordinate::new(0.0, 0.0));
        assert_eq!(local.utc_offset_seconds(), 0);
    }

    #[test]
    fn google_current_records_every_defaulted_field() {
        let weather = GoogleWeather::from_json(json!({
            "current": {"temperature": 23.0, "humidity": 55, "condition": "Partly Cloudy"},
            "alerts": [
                {"title": "Heat", "description": "Very hot", "severity": "SEVERE",
                 "startTime": "2026-10-18T12:00:00Z", "endTime": "2026-10-18T20:00:00Z"}
            ]
        }))
        .expect("parse");

        let model = to_weather_model(
            ProviderResult::Grid(weather),
            LIMA,
            &ConditionCodeMapper::standard(),
            utc(2026, 10, 18, 17),
        );

        let c = &model.current;
        assert_eq!(c.temperature, 23.0);
        assert_eq!(c.condition, CanonicalCondition::PartlyCloudy);
        assert_eq!(c.feels_like, 23.0);
        assert!(c.is_defaulted(CurrentField::FeelsLike));
        assert!(c.is_defaulted(CurrentField::UvIndex));
        assert!(c.is_defaulted(CurrentField::IsDaytime));
        assert!(!c.is_defaulted(CurrentField::Humidity));
        // 12:00 local in Lima.
        assert!(c.is_daytime);

        assert!(model.hourly.is_empty());
        assert!(model.daily.is_empty());
        assert_eq!(model.alerts.len(), 1);
        assert_eq!(model.alerts[0].severity, AlertSeverity::Severe);
    }

    #[test]
    fn google_hourly_rfc3339_times_are_converted_to_local() {
        let weather = GoogleWeather::from_json(json!({
            "utcOffsetSeconds": -18000,
            "hourlyForecast": [
                {"time": "2026-10-18T15:00:00Z", "temperature": 20.0},
                {"time": "not a time", "temperature": 99.0},
                {"time": "2026-10-18T16:00:00Z", "temperature": 21.0, "isDaytime": false}
            ]
        }))
        .expect("parse");

        let model = to_weather_model(
            ProviderResult::Grid(weather),
            LIMA,
            &ConditionCodeMapper::standard(),
            utc(2026, 10, 18, 14),
        );

        assert_eq!(model.hourly.len(), 2);
        assert!(model.hourly.is_aligned());
        assert_eq!(model.hourly.time[0].hour(), 10);
        assert!(model.hourly.is_day[0]);
        assert!(!model.hourly.is_day[1]);
        assert_eq!(model.hourly.feels_like[1], 21.0);
    }

    #[test]
    fn daily_series_is_capped_at_ten_days() {
        let times: Vec<String> = (18..=31).map(|d| format!("2026-10-{d:02}")).collect();
        let weather = OpenMeteoWeather::from_json(json!({
            "utc_offset_seconds": 0,
            "daily": {"time": times}
        }))
        .expect("parse");

        let model = to_weather_model(
            ProviderResult::Point(weather),
            Coordinate::new(0.0, 0.0),
            &ConditionCodeMapper::standard(),
            utc(2026, 10, 18, 12),
        );
        assert_eq!(model.daily.len(), MAX_FORECAST_DAYS);
        assert!(model.daily.is_aligned());
        assert_eq!(model.daily.temperature_max[0], defaults::TEMPERATURE);
    }

    #[test]
    fn implausible_values_are_flagged_not_changed() {
        let weather = OpenMeteoWeather::from_json(json!({
            "utc_offset_seconds": 0,
            "current": {"temperature_2m": 300.0, "relative_humidity_2m": 140, "pressure_msl": 1013}
        }))
        .expect("parse");

        let model = to_weather_model(
            ProviderResult::Point(weather),
            Coordinate::new(0.0, 0.0),
            &ConditionCodeMapper::standard(),
            utc(2026, 10, 18, 12),
        );
        assert_eq!(model.current.temperature, 300.0);
        assert_eq!(model.current.humidity, 140.0);
        assert_eq!(model.flags.len(), 2);
        assert!(model.flags.iter().any(|f| f.starts_with("temperature")));
        assert!(model.flags.iter().any(|f| f.starts_with("humidity")));
    }

    #[test]
    fn forecast_window_keeps_empty_sections() {
        let weather = OpenMeteoWeather::from_json(json!({"utc_offset_seconds": 0})).expect("parse");
        let window = to_forecast_window(
            ProviderResult::Point(weather),
            Coordinate::new(0.0, 0.0),
            &ConditionCodeMapper::standard(),
            utc(2026, 10, 18, 12),
            true,
        );

        assert_eq!(window.source, ForecastSource { provider: ProviderId::OpenMeteo, fallback: true });
        assert!(window.daily.is_empty() && window.daily.is_aligned());
        assert!(window.hourly.is_empty() && window.hourly.is_aligned());
        assert!(window.alerts.is_empty());
    }
}
