//! The facade presentation code talks to.

use std::{fmt, sync::Arc};

use crate::{
    Config,
    city::{CityNameResolver, CitySearcher},
    error::{GeocodeUnavailable, WeatherUnavailable},
    http::build_client,
    location::{LocationResolver, PositionSource},
    model::{CityCandidate, Coordinate, ForecastWindow, PlaceName, WeatherModel},
    provider::ProviderId,
    reconciler::{Attempt, WeatherReconciler},
};

/// Progress of one refresh.
///
/// `Idle → ResolvingLocation → FetchingWeather(preferred) →
/// [FetchingWeather(fallback)] → Ready | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ResolvingLocation,
    FetchingWeather { provider: ProviderId, fallback: bool },
    Ready,
    /// Only reached when every provider failed.
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Ready | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => f.write_str("idle"),
            Phase::ResolvingLocation => f.write_str("resolving location"),
            Phase::FetchingWeather { provider, fallback: false } => write!(f, "fetching weather from {provider}"),
            Phase::FetchingWeather { provider, fallback: true } => {
                write!(f, "fetching weather from {provider} (fallback)")
            }
            Phase::Ready => f.write_str("ready"),
            Phase::Failed => f.write_str("failed"),
        }
    }
}

/// Everything one screen needs.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub coordinate: Coordinate,
    pub place: PlaceName,
    pub weather: WeatherModel,
}

#[derive(Debug, Clone)]
pub struct WeatherSession {
    location: LocationResolver,
    names: CityNameResolver,
    search: CitySearcher,
    reconciler: WeatherReconciler,
}

impl WeatherSession {
    pub fn new(
        location: LocationResolver,
        names: CityNameResolver,
        search: CitySearcher,
        reconciler: WeatherReconciler,
    ) -> Self {
        Self { location, names, search, reconciler }
    }

    /// Wire every component from `config`, sharing one HTTP client.
    pub fn from_config(config: &Config, position: Arc<dyn PositionSource>) -> anyhow::Result<Self> {
        let http = build_client(&config.geocoding.user_agent, config.http.timeout())?;

        Ok(Self::new(
            LocationResolver::from_config(&config.location, position),
            CityNameResolver::from_config(config, &http),
            CitySearcher::from_config(config, &http),
            WeatherReconciler::from_config(config, &http)?,
        ))
    }

    pub async fn resolve_location(&self) -> Coordinate {
        self.location.resolve().await
    }

    pub async fn resolve_city_name(&self, coord: Coordinate) -> PlaceName {
        self.names.resolve_city_name(coord).await
    }

    pub async fn get_weather_data(&self, coord: Coordinate) -> Result<WeatherModel, WeatherUnavailable> {
        self.reconciler.get_weather_data(coord).await
    }

    pub async fn get_10_day_forecast(&self, coord: Coordinate) -> Result<ForecastWindow, WeatherUnavailable> {
        self.reconciler.get_10_day_forecast(coord).await
    }

    pub async fn search_cities(&self, query: &str) -> Result<Vec<CityCandidate>, GeocodeUnavailable> {
        self.search.search_cities(query).await
    }

    /// Full load from the device position.
    pub async fn refresh(&self, mut observer: impl FnMut(Phase)) -> Result<Snapshot, WeatherUnavailable> {
        observer(Phase::Idle);
        observer(Phase::ResolvingLocation);
        let coord = self.resolve_location().await;
        self.load(coord, observer).await
    }

    /// Load for a known coordinate, e.g. a city picked from search.
    pub async fn refresh_at(
        &self,
        coord: Coordinate,
        mut observer: impl FnMut(Phase),
    ) -> Result<Snapshot, WeatherUnavailable> {
        observer(Phase::Idle);
        self.load(coord, observer).await
    }

    async fn load(&self, coord: Coordinate, mut observer: impl FnMut(Phase)) -> Result<Snapshot, WeatherUnavailable> {
        let weather = self.reconciler.get_weather_data_observed(coord, |Attempt { provider, fallback }| {
            observer(Phase::FetchingWeather { provider, fallback })
        });
        let (weather, place) = tokio::join!(weather, self.resolve_city_name(coord));

        match weather {
            Ok(weather) => {
                observer(Phase::Ready);
                Ok(Snapshot { coordinate: coord, place, weather })
            }
            Err(e) => {
                tracing::error!(error = %e, %coord, "no weather provider could answer");
                observer(Phase::Failed);
                Err(e)
            }
        }
    }
}
