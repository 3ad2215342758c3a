use reqwest::StatusCode;
use thiserror::Error;

use crate::{geocode::GeocoderId, provider::ProviderId};

/// Failure of a single HTTP/JSON round trip.
#[derive(Debug, Error)]
pub enum HttpFailure {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed JSON body: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// A weather provider could not produce a result for this request.
#[derive(Debug, Error)]
pub enum ProviderUnavailable {
    #[error("no API key configured for provider '{0}'")]
    MissingCredential(ProviderId),

    #[error("provider '{provider}' unavailable: {source}")]
    Http {
        provider: ProviderId,
        #[source]
        source: HttpFailure,
    },
}

impl ProviderUnavailable {
    pub fn provider(&self) -> ProviderId {
        match self {
            Self::MissingCredential(id) => *id,
            Self::Http { provider, .. } => *provider,
        }
    }
}

/// Every weather provider was tried and none produced data.
///
/// Only the attempt log is kept; the underlying errors were already logged
/// where they were caught.
#[derive(Debug, Error)]
#[error("weather data is unavailable ({})", describe_attempts(.attempts))]
pub struct WeatherUnavailable {
    pub attempts: Vec<(ProviderId, String)>,
}

fn describe_attempts(attempts: &[(ProviderId, String)]) -> String {
    if attempts.is_empty() {
        return "no provider attempted".to_string();
    }
    attempts
        .iter()
        .map(|(id, reason)| format!("{id}: {reason}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A geocoder could not resolve a place.
#[derive(Debug, Error)]
pub enum GeocodeUnavailable {
    #[error("no API key configured for geocoder '{0}'")]
    MissingCredential(GeocoderId),

    #[error("geocoder '{geocoder}' unavailable: {source}")]
    Http {
        geocoder: GeocoderId,
        #[source]
        source: HttpFailure,
    },

    #[error("geocoder '{geocoder}' rejected the request: {status}")]
    Rejected { geocoder: GeocoderId, status: String },

    #[error("no geocoder could find '{0}'")]
    Exhausted(String),
}

/// Device location errors. Never surfaced past the location resolver.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location service unavailable")]
    Unavailable,
    #[error("location request timed out")]
    Timeout,
}
