//! Place names for coordinates, and forward city search.
//!
//! [`CityNameResolver`] walks an ordered list of strategies and stops at the
//! first usable name. The last two steps (reference table, formatted
//! coordinate) cannot fail, so resolution always produces a non-empty name.

use std::sync::Arc;

use reqwest::Client;

use crate::{
    Config,
    config::CityReference,
    error::GeocodeUnavailable,
    geocode::{CitySearch, ReverseGeocoder, city_search_from_config, reverse_geocoders_from_config, usable_name},
    model::{CityCandidate, Coordinate, PlaceName, PlaceSource},
};

/// Queries shorter than this return no candidates and hit no service.
pub const MIN_QUERY_CHARS: usize = 2;

/// First table entry whose latitude and longitude both lie within its tolerance.
pub fn nearest_reference<'a>(table: &'a [CityReference], coord: Coordinate) -> Option<&'a CityReference> {
    table.iter().find(|city| {
        (coord.latitude - city.latitude).abs() <= city.tolerance
            && (coord.longitude - city.longitude).abs() <= city.tolerance
    })
}

#[derive(Debug, Clone)]
pub struct CityNameResolver {
    geocoders: Vec<Arc<dyn ReverseGeocoder>>,
    table: Arc<[CityReference]>,
}

impl CityNameResolver {
    pub fn new(geocoders: Vec<Arc<dyn ReverseGeocoder>>, table: Arc<[CityReference]>) -> Self {
        Self { geocoders, table }
    }

    pub fn from_config(config: &Config, http: &Client) -> Self {
        Self::new(reverse_geocoders_from_config(config, http), config.cities.clone().into())
    }

    pub async fn resolve_city_name(&self, coord: Coordinate) -> PlaceName {
        for geocoder in &self.geocoders {
            let id = geocoder.id();
            if !geocoder.is_configured() {
                tracing::debug!(geocoder = %id, "skipping geocoder without credential");
                continue;
            }

            tracing::debug!(geocoder = %id, %coord, "reverse geocoding");
            match geocoder.reverse(coord).await {
                Ok(name) => match usable_name(name.as_deref()) {
                    Some(name) => {
                        tracing::info!(geocoder = %id, %name, "resolved place name");
                        return PlaceName { name, source: PlaceSource::Geocoder(id) };
                    }
                    None => tracing::debug!(geocoder = %id, "geocoder returned no name"),
                },
                Err(e) => tracing::warn!(geocoder = %id, error = %e, "reverse geocoding failed"),
            }
        }

        if let Some(city) = nearest_reference(&self.table, coord) {
            tracing::info!(name = %city.name, "place name from reference table");
            return PlaceName { name: city.name.clone(), source: PlaceSource::ReferenceTable };
        }

        PlaceName { name: coord.display_string(), source: PlaceSource::Default }
    }
}

/// Forward search over an ordered list of strategies.
#[derive(Debug, Clone)]
pub struct CitySearcher {
    strategies: Vec<Arc<dyn CitySearch>>,
}

impl CitySearcher {
    pub fn new(strategies: Vec<Arc<dyn CitySearch>>) -> Self {
        Self { strategies }
    }

    pub fn from_config(config: &Config, http: &Client) -> Self {
        Self::new(city_search_from_config(config, http))
    }

    /// The first strategy with hits wins. An empty list comes back only after
    /// every configured strategy was asked; fails when all of them failed.
    pub async fn search_cities(&self, query: &str) -> Result<Vec<CityCandidate>, GeocodeUnavailable> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Ok(Vec::new());
        }

        let mut failures = Vec::new();
        let mut answered = false;
        for strategy in &self.strategies {
            let id = strategy.id();
            if !strategy.is_configured() {
                tracing::debug!(geocoder = %id, "skipping search without credential");
                continue;
            }

            match strategy.search(query).await {
                Ok(hits) if hits.is_empty() => {
                    tracing::debug!(geocoder = %id, query, "city search found nothing");
                    answered = true;
                }
                Ok(hits) => {
                    tracing::info!(geocoder = %id, hits = hits.len(), query, "city search");
                    return Ok(hits);
                }
                Err(e) => {
                    tracing::warn!(geocoder = %id, error = %e, query, "city search failed");
                    failures.push(format!("{id}: {e}"));
                }
            }
        }

        if answered {
            return Ok(Vec::new());
        }

        Err(GeocodeUnavailable::Exhausted(if failures.is_empty() {
            format!("{query} (no search service configured)")
        } else {
            format!("{query} ({})", failures.join("; "))
        }))
    }
}
