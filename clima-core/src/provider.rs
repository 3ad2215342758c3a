use crate::{
    Config,
    error::ProviderUnavailable,
    model::Coordinate,
    provider::{
        google::{GoogleWeather, GoogleWeatherProvider},
        open_meteo::{OpenMeteoProvider, OpenMeteoWeather},
    },
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod google;
pub mod open_meteo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    /// Keyed grid provider, preferred when a credential is configured.
    Google,
    /// Keyless point provider, always available.
    OpenMeteo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Google => "google",
            ProviderId::OpenMeteo => "open-meteo",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Google, ProviderId::OpenMeteo]
    }

    pub fn requires_credential(&self) -> bool {
        matches!(self, ProviderId::Google)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "google" => Ok(ProviderId::Google),
            "open-meteo" | "openmeteo" => Ok(ProviderId::OpenMeteo),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: google, open-meteo."
            )),
        }
    }
}

/// Raw provider-shaped response, handed straight to the transform.
#[derive(Debug, Clone)]
pub enum ProviderResult {
    Grid(GoogleWeather),
    Point(OpenMeteoWeather),
}

impl ProviderResult {
    pub fn provider(&self) -> ProviderId {
        match self {
            ProviderResult::Grid(_) => ProviderId::Google,
            ProviderResult::Point(_) => ProviderId::OpenMeteo,
        }
    }
}

/// One upstream weather API. Implementations make exactly one request per
/// call and never retry.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// False when a required credential is missing; the reconciler skips
    /// unconfigured providers without calling them.
    fn is_configured(&self) -> bool {
        true
    }

    /// Current conditions plus hourly and daily forecast.
    async fn fetch_weather(&self, coord: Coordinate) -> Result<ProviderResult, ProviderUnavailable>;

    /// Current conditions plus the 10-day daily window.
    async fn fetch_forecast_window(
        &self,
        coord: Coordinate,
    ) -> Result<ProviderResult, ProviderUnavailable>;
}

/// Construct a provider from config and explicit ProviderId.
///
/// Providers without a configured credential are still built; they report
/// `is_configured() == false` and fail with `MissingCredential` if called.
pub fn provider_from_config(id: ProviderId, config: &Config, http: &Client) -> Arc<dyn WeatherProvider> {
    match id {
        ProviderId::Google => Arc::new(GoogleWeatherProvider::new(
            http.clone(),
            config.endpoints.google_weather.clone(),
            config.provider_api_key(ProviderId::Google).map(str::to_owned),
        )),
        ProviderId::OpenMeteo => {
            Arc::new(OpenMeteoProvider::new(http.clone(), config.endpoints.open_meteo.clone()))
        }
    }
}
