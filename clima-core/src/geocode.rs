use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    error::GeocodeUnavailable,
    geocode::{bigdatacloud::BigDataCloudGeocoder, google::GoogleGeocoder, nominatim::NominatimGeocoder},
    model::{CityCandidate, Coordinate},
};

pub mod bigdatacloud;
pub mod google;
pub mod nominatim;

/// Placeholder some upstreams return instead of an empty name.
pub const UNKNOWN_PLACE: &str = "Ubicación desconocida";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeocoderId {
    /// Keyed, shares the grid provider's credential by default.
    Google,
    BigDataCloud,
    /// Public OSM service; requires a descriptive user agent.
    Nominatim,
}

impl GeocoderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeocoderId::Google => "google",
            GeocoderId::BigDataCloud => "big-data-cloud",
            GeocoderId::Nominatim => "nominatim",
        }
    }
}

impl std::fmt::Display for GeocoderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinate → place name.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    fn id(&self) -> GeocoderId;

    fn is_configured(&self) -> bool {
        true
    }

    /// `Ok(None)` when the service answered but knows no name here.
    async fn reverse(&self, coord: Coordinate) -> Result<Option<String>, GeocodeUnavailable>;
}

/// Free-text query → candidate cities.
#[async_trait]
pub trait CitySearch: Send + Sync + Debug {
    fn id(&self) -> GeocoderId;

    fn is_configured(&self) -> bool {
        true
    }

    async fn search(&self, query: &str) -> Result<Vec<CityCandidate>, GeocodeUnavailable>;
}

/// Trimmed name, or `None` when it is empty or the unknown placeholder.
pub(crate) fn usable_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty() && *n != UNKNOWN_PLACE)
        .map(str::to_owned)
}

/// First comma-separated part of a formatted address.
pub(crate) fn first_part(address: &str) -> Option<String> {
    usable_name(address.split(',').next())
}

/// Reverse geocoders in the order they are tried.
pub fn reverse_geocoders_from_config(config: &Config, http: &Client) -> Vec<Arc<dyn ReverseGeocoder>> {
    vec![
        Arc::new(GoogleGeocoder::from_config(config, http)),
        Arc::new(BigDataCloudGeocoder::new(
            http.clone(),
            config.endpoints.bigdatacloud.clone(),
            config.geocoding.language.clone(),
        )),
        Arc::new(NominatimGeocoder::from_config(config, http)),
    ]
}

/// Forward search strategies in the order they are tried.
pub fn city_search_from_config(config: &Config, http: &Client) -> Vec<Arc<dyn CitySearch>> {
    vec![
        Arc::new(GoogleGeocoder::from_config(config, http)),
        Arc::new(NominatimGeocoder::from_config(config, http)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn unknown_and_blank_names_are_not_usable() {
        assert_eq!(usable_name(Some("  Arequipa ")), Some("Arequipa".to_string()));
        assert_eq!(usable_name(Some("   ")), None);
        assert_eq!(usable_name(Some(UNKNOWN_PLACE)), None);
        assert_eq!(usable_name(None), None);
    }

    #[test]
    fn first_part_of_address() {
        assert_eq!(first_part("Miraflores, Lima, Perú"), Some("Miraflores".to_string()));
        assert_eq!(first_part(""), None);
    }

    #[test]
    fn chains_follow_the_documented_order() {
        let http = Client::new();
        let mut cfg = Config::default();

        let reverse: Vec<_> = reverse_geocoders_from_config(&cfg, &http).iter().map(|g| g.id()).collect();
        assert_eq!(reverse, vec![GeocoderId::Google, GeocoderId::BigDataCloud, GeocoderId::Nominatim]);

        let search = city_search_from_config(&cfg, &http);
        assert_eq!(search.iter().map(|s| s.id()).collect::<Vec<_>>(), vec![GeocoderId::Google, GeocoderId::Nominatim]);
        assert!(!search[0].is_configured());

        cfg.upsert_provider_api_key(ProviderId::Google, "KEY".into());
        assert!(reverse_geocoders_from_config(&cfg, &http)[0].is_configured());
    }
}
