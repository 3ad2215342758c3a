//! Plain-text rendering of the canonical model.

use clima_core::{
    ConditionCodeMapper, ForecastWindow, PlaceName, Snapshot,
    model::{CityCandidate, CurrentConditions, CurrentField, DailySeries, HourlySeries, WeatherAlert},
};

const HOURS_SHOWN: usize = 12;

pub fn snapshot(snapshot: &Snapshot, mapper: &ConditionCodeMapper) {
    let weather = &snapshot.weather;
    println!("{}  ({})", snapshot.place, snapshot.coordinate.display_string());
    println!("source: {}", weather.provider);
    println!();
    current(&weather.current, mapper);
    alerts(&weather.alerts);
    hourly(&weather.hourly, mapper);
    daily(&weather.daily, mapper);

    if !weather.flags.is_empty() {
        println!();
        println!("Suspicious values from {}:", weather.provider);
        for flag in &weather.flags {
            println!("  {flag}");
        }
    }
}

pub fn forecast_window(place: &PlaceName, window: &ForecastWindow, mapper: &ConditionCodeMapper) {
    println!("{place}");
    println!("source: {}", window.source);
    println!();
    current(&window.current, mapper);
    alerts(&window.alerts);
    daily(&window.daily, mapper);
}

pub fn candidates(hits: &[CityCandidate]) {
    if hits.is_empty() {
        println!("No cities found.");
        return;
    }
    for hit in hits {
        println!("{:<24} {:<12} {}", hit.name, hit.country, hit.coordinate.display_string());
    }
}

fn current(c: &CurrentConditions, mapper: &ConditionCodeMapper) {
    // Defaulted values are marked so they are not mistaken for measurements.
    let mark = |field: CurrentField| if c.is_defaulted(field) { "*" } else { "" };

    println!(
        "{} {}  {:.1}°C (feels like {:.1}°C{})",
        mapper.to_icon(c.condition, c.is_daytime),
        c.condition.label(),
        c.temperature,
        c.feels_like,
        mark(CurrentField::FeelsLike),
    );
    println!(
        "humidity {:.0}%  wind {:.0} km/h @ {:.0}° (gusts {:.0}{})  pressure {:.0} hPa{}",
        c.humidity,
        c.wind_speed,
        c.wind_direction,
        c.wind_gust,
        mark(CurrentField::WindGust),
        c.pressure,
        mark(CurrentField::Pressure),
    );
    println!(
        "visibility {:.0} km{}  UV {:.0}{}  rain chance {:.0}%{}  clouds {:.0}%{}",
        c.visibility,
        mark(CurrentField::Visibility),
        c.uv_index,
        mark(CurrentField::UvIndex),
        c.precipitation_probability,
        mark(CurrentField::PrecipitationProbability),
        c.cloud_cover,
        mark(CurrentField::CloudCover),
    );
    if !c.defaulted.is_empty() {
        println!("(* not reported by the provider)");
    }
}

fn alerts(alerts: &[WeatherAlert]) {
    for alert in alerts {
        println!();
        println!("! {:?}: {}", alert.severity, alert.title);
        if !alert.description.is_empty() {
            println!("  {}", alert.description);
        }
    }
}

fn hourly(h: &HourlySeries, mapper: &ConditionCodeMapper) {
    if h.is_empty() {
        return;
    }
    println!();
    for hour in h.points().take(HOURS_SHOWN) {
        println!(
            "{}  {} {:>5.1}°C  {:>3.0}%",
            hour.time.format("%H:%M"),
            mapper.to_icon(hour.condition, hour.is_day),
            hour.temperature,
            hour.precipitation_probability,
        );
    }
}

fn daily(d: &DailySeries, mapper: &ConditionCodeMapper) {
    if d.is_empty() {
        return;
    }
    println!();
    for day in d.points() {
        println!(
            "{}  {} {:>5.1}° / {:>5.1}°  {:>3.0}%  {}",
            day.time.format("%a %d %b"),
            mapper.to_icon(day.condition, true),
            day.temperature_max,
            day.temperature_min,
            day.precipitation_probability,
            day.condition.label(),
        );
    }
}
