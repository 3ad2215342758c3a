use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{error::GeocodeUnavailable, http::fetch_json, model::Coordinate};

use super::{GeocoderId, ReverseGeocoder, usable_name};

/// Keyless client-side reverse geocoder.
#[derive(Debug, Clone)]
pub struct BigDataCloudGeocoder {
    base_url: String,
    language: String,
    http: Client,
}

impl BigDataCloudGeocoder {
    pub fn new(http: Client, base_url: String, language: String) -> Self {
        Self { base_url, language, http }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReverseResponse {
    city: Option<String>,
    locality: Option<String>,
}

#[async_trait]
impl ReverseGeocoder for BigDataCloudGeocoder {
    fn id(&self) -> GeocoderId {
        GeocoderId::BigDataCloud
    }

    async fn reverse(&self, coord: Coordinate) -> Result<Option<String>, GeocodeUnavailable> {
        let request = self.http.get(&self.base_url).query(&[
            ("latitude", coord.latitude.to_string()),
            ("longitude", coord.longitude.to_string()),
            ("localityLanguage", self.language.clone()),
        ]);

        let body: ReverseResponse = fetch_json(request)
            .await
            .map_err(|source| GeocodeUnavailable::Http { geocoder: GeocoderId::BigDataCloud, source })?;

        Ok(usable_name(body.city.as_deref()).or_else(|| usable_name(body.locality.as_deref())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn city_wins_over_locality() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("latitude", "-8.1116"))
            .and(query_param("longitude", "-79.0288"))
            .and(query_param("localityLanguage", "es"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "city": "Trujillo",
                "locality": "Centro Histórico"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let g = BigDataCloudGeocoder::new(Client::new(), mock_server.uri(), "es".into());
        let name = g.reverse(Coordinate::new(-8.1116, -79.0288)).await.expect("ok");
        assert_eq!(name.as_deref(), Some("Trujillo"));
    }

    #[tokio::test]
    async fn empty_city_uses_locality_then_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("latitude", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"city": "", "locality": "Sechura"})))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("latitude", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"city": "", "locality": ""})))
            .mount(&mock_server)
            .await;

        let g = BigDataCloudGeocoder::new(Client::new(), mock_server.uri(), "es".into());
        assert_eq!(g.reverse(Coordinate::new(1.0, 0.0)).await.expect("ok").as_deref(), Some("Sechura"));
        assert_eq!(g.reverse(Coordinate::new(2.0, 0.0)).await.expect("ok"), None);
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&mock_server)
            .await;

        let g = BigDataCloudGeocoder::new(Client::new(), mock_server.uri(), "es".into());
        let err = g.reverse(Coordinate::new(0.0, 0.0)).await.unwrap_err();
        assert!(matches!(err, GeocodeUnavailable::Http { geocoder: GeocoderId::BigDataCloud, .. }));
    }
}
