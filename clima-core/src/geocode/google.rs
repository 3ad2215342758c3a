use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    Config,
    error::GeocodeUnavailable,
    http::fetch_json,
    model::{CityCandidate, Coordinate},
};

use super::{CitySearch, GeocoderId, ReverseGeocoder, first_part, usable_name};

/// Component types tried, in order, for a reverse lookup name.
const REVERSE_NAME_TYPES: &[&str] = &[
    "locality",
    "administrative_area_level_2",
    "administrative_area_level_1",
    "sublocality",
    "sublocality_level_1",
];

/// Component types tried for a search hit name.
const SEARCH_NAME_TYPES: &[&str] = &["locality", "administrative_area_level_2"];

/// Keyed geocoder supporting both `latlng=` and `address=` lookups.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    api_key: Option<String>,
    base_url: String,
    language: String,
    region: Option<String>,
    default_country: String,
    http: Client,
}

impl GoogleGeocoder {
    pub fn new(http: Client, base_url: String, api_key: Option<String>, language: String) -> Self {
        Self {
            api_key,
            base_url,
            language,
            region: None,
            default_country: String::new(),
            http,
        }
    }

    pub fn from_config(config: &Config, http: &Client) -> Self {
        Self {
            region: config.geocoding.search_region.clone(),
            default_country: config.geocoding.default_country.clone(),
            ..Self::new(
                http.clone(),
                config.endpoints.google_geocode.clone(),
                config.geocoding_api_key().map(str::to_owned),
                config.geocoding.language.clone(),
            )
        }
    }

    async fn lookup(&self, query: &[(&str, &str)]) -> Result<Vec<GeocodeResult>, GeocodeUnavailable> {
        let key = self.api_key.as_deref().ok_or(GeocodeUnavailable::MissingCredential(GeocoderId::Google))?;

        let mut request = self
            .http
            .get(&self.base_url)
            .query(query)
            .query(&[("key", key), ("language", self.language.as_str())]);
        if let Some(region) = &self.region {
            request = request.query(&[("region", region.as_str())]);
        }

        let body: GeocodeResponse = fetch_json(request)
            .await
            .map_err(|source| GeocodeUnavailable::Http { geocoder: GeocoderId::Google, source })?;

        match body.status.as_str() {
            "OK" => Ok(body.results),
            "ZERO_RESULTS" => Ok(Vec::new()),
            status => Err(GeocodeUnavailable::Rejected {
                geocoder: GeocoderId::Google,
                status: match &body.error_message {
                    Some(msg) => format!("{status} ({msg})"),
                    None => status.to_string(),
                },
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    #[serde(default)]
    formatted_address: String,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GeocodeResult {
    fn component(&self, kind: &str) -> Option<&str> {
        self.address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == kind))
            .map(|c| c.long_name.as_str())
    }

    fn name(&self, kinds: &[&str]) -> Option<String> {
        kinds
            .iter()
            .find_map(|kind| usable_name(self.component(kind)))
            .or_else(|| first_part(&self.formatted_address))
    }
}

#[async_trait]
impl ReverseGeocoder for GoogleGeocoder {
    fn id(&self) -> GeocoderId {
        GeocoderId::Google
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn reverse(&self, coord: Coordinate) -> Result<Option<String>, GeocodeUnavailable> {
        let results = self.lookup(&[("latlng", coord.as_query().as_str())]).await?;
        Ok(results.first().and_then(|r| r.name(REVERSE_NAME_TYPES)))
    }
}

#[async_trait]
impl CitySearch for GoogleGeocoder {
    fn id(&self) -> GeocoderId {
        GeocoderId::Google
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, query: &str) -> Result<Vec<CityCandidate>, GeocodeUnavailable> {
        let results = self.lookup(&[("address", query)]).await?;

        Ok(results
            .iter()
            .filter_map(|r| {
                let location = &r.geometry.as_ref()?.location;
                Some(CityCandidate {
                    name: r.name(SEARCH_NAME_TYPES)?,
                    country: usable_name(r.component("country")).unwrap_or_else(|| self.default_country.clone()),
                    coordinate: Coordinate::new(location.lat, location.lng),
                    formatted_address: r.formatted_address.clone(),
                })
            })
            .collect())
    }
}
