//! OpenStreetMap Nominatim, used for reverse lookups and free-text search.
//! No key is needed, but the public service rejects clients without a
//! descriptive user agent; the shared HTTP client sends one.

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

const SEARCH_LIMIT: u32 = 5;

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    language: String,
    country_codes: Option<String>,
    default_country: String,
    http: Client,
}

impl NominatimGeocoder {
    pub fn new(http: Client, base_url: String, language: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            language,
            country_codes: None,
            default_country: String::new(),
            http,
        }
    }

    pub fn from_config(config: &Config, http: &Client) -> Self {
        Self {
            country_codes: config.geocoding.search_country_codes.clone(),
            default_country: config.geocoding.default_country.clone(),
            ..Self::new(http.clone(), config.endpoints.nominatim.clone(), config.geocoding.language.clone())
        }
    }

    fn unavailable(source: crate::error::HttpFailure) -> GeocodeUnavailable {
        GeocodeUnavailable::Http { geocoder: GeocoderId::Nominatim, source }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

impl Address {
    fn place(&self) -> Option<String> {
        [&self.city, &self.town, &self.village, &self.municipality, &self.county]
            .into_iter()
            .find_map(|part| usable_name(part.as_deref()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReverseResponse {
    display_name: Option<String>,
    address: Option<Address>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    address: Option<Address>,
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    fn id(&self) -> GeocoderId {
        GeocoderId::Nominatim
    }

    async fn reverse(&self, coord: Coordinate) -> Result<Option<String>, GeocodeUnavailable> {
        let request = self.http.get(format!("{}/reverse", self.base_url)).query(&[
            ("format", "json".to_string()),
            ("lat", coord.latitude.to_string()),
            ("lon", coord.longitude.to_string()),
            ("accept-language", self.language.clone()),
        ]);

        let body: ReverseResponse = fetch_json(request).await.map_err(Self::unavailable)?;

        if let Some(error) = body.error {
            tracing::debug!(%coord, %error, "nominatim found nothing");
            return Ok(None);
        }

        Ok(body
            .address
            .as_ref()
            .and_then(Address::place)
            .or_else(|| body.display_name.as_deref().and_then(first_part)))
    }
}

#[async_trait]
impl CitySearch for NominatimGeocoder {
    fn id(&self) -> GeocoderId {
        GeocoderId::Nominatim
    }

    async fn search(&self, query: &str) -> Result<Vec<CityCandidate>, GeocodeUnavailable> {
        let mut params = vec![
            ("q", query.to_string()),
            ("format", "json".to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
            ("addressdetails", "1".to_string()),
            ("accept-language", self.language.clone()),
        ];
        if let Some(codes) = &self.country_codes {
            params.push(("countrycodes", codes.clone()));
        }

        let request = self.http.get(format!("{}/search", self.base_url)).query(&params);
        let hits: Vec<SearchHit> = fetch_json(request).await.map_err(Self::unavailable)?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let (Ok(lat), Ok(lon)) = (hit.lat.parse::<f64>(), hit.lon.parse::<f64>()) else {
                    tracing::debug!(lat = %hit.lat, lon = %hit.lon, "skipping search hit with bad coordinates");
                    return None;
                };
                Some(CityCandidate {
                    name: first_part(&hit.display_name)?,
                    country: hit
                        .address
                        .as_ref()
                        .and_then(|a| usable_name(a.country.as_deref()))
                        .unwrap_or_else(|| self.default_country.clone()),
                    coordinate: Coordinate::new(lat, lon),
                    formatted_address: hit.display_name,
                })
            })
            .collect())
    }
}
