use std::sync::Arc;

use reqwest::Client;

use crate::{
    Config,
    clock::{Clock, SystemClock},
    condition::ConditionCodeMapper,
    error::{ProviderUnavailable, WeatherUnavailable},
    model::{Coordinate, ForecastWindow, WeatherModel},
    provider::{ProviderId, ProviderResult, WeatherProvider, provider_from_config},
    transform::{to_forecast_window, to_weather_model},
};

/// Which provider is being asked, reported to an observer before each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub provider: ProviderId,
    pub fallback: bool,
}

/// Picks between the preferred and the fallback provider.
///
/// The preferred provider is asked first when configured; on any failure the
/// fallback is asked exactly once. Calls are sequential, never speculative,
/// and nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct WeatherReconciler {
    preferred: Option<Arc<dyn WeatherProvider>>,
    fallback: Arc<dyn WeatherProvider>,
    mapper: Arc<ConditionCodeMapper>,
    clock: Arc<dyn Clock>,
}

impl WeatherReconciler {
    pub fn new(
        preferred: Option<Arc<dyn WeatherProvider>>,
        fallback: Arc<dyn WeatherProvider>,
        mapper: Arc<ConditionCodeMapper>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { preferred, fallback, mapper, clock }
    }

    /// Preferred provider from config, and the keyless provider as fallback.
    /// When the keyless provider is itself preferred there is no second try.
    pub fn from_config(config: &Config, http: &Client) -> anyhow::Result<Self> {
        let preferred_id = config.preferred_provider_id()?;
        let preferred = (preferred_id != ProviderId::OpenMeteo)
            .then(|| provider_from_config(preferred_id, config, http));

        Ok(Self::new(
            preferred,
            provider_from_config(ProviderId::OpenMeteo, config, http),
            Arc::new(ConditionCodeMapper::standard()),
            Arc::new(SystemClock),
        ))
    }

    pub fn mapper(&self) -> &ConditionCodeMapper {
        &self.mapper
    }

    pub async fn get_weather_data(&self, coord: Coordinate) -> Result<WeatherModel, WeatherUnavailable> {
        self.get_weather_data_observed(coord, |_| {}).await
    }

    /// Like [`get_weather_data`](Self::get_weather_data), calling `on_attempt`
    /// before each provider request.
    pub async fn get_weather_data_observed(
        &self,
        coord: Coordinate,
        on_attempt: impl FnMut(Attempt),
    ) -> Result<WeatherModel, WeatherUnavailable> {
        let (result, _) = self
            .reconcile(coord, on_attempt, |provider, coord| async move {
                provider.fetch_weather(coord).await
            })
            .await?;

        Ok(to_weather_model(result, coord, &self.mapper, self.clock.now()))
    }

    /// Same provider order, returning only the forecast window and which
    /// provider produced it.
    pub async fn get_10_day_forecast(&self, coord: Coordinate) -> Result<ForecastWindow, WeatherUnavailable> {
        let (result, fallback) = self
            .reconcile(coord, |_| {}, |provider, coord| async move {
                provider.fetch_forecast_window(coord).await
            })
            .await?;

        Ok(to_forecast_window(result, coord, &self.mapper, self.clock.now(), fallback))
    }

    async fn reconcile<F, Fut>(
        &self,
        coord: Coordinate,
        mut on_attempt: impl FnMut(Attempt),
        fetch: F,
    ) -> Result<(ProviderResult, bool), WeatherUnavailable>
    where
        F: Fn(Arc<dyn WeatherProvider>, Coordinate) -> Fut,
        Fut: std::future::Future<Output = Result<ProviderResult, ProviderUnavailable>>,
    {
        let mut attempts = Vec::new();

        if let Some(preferred) = &self.preferred {
            let id = preferred.id();
            if preferred.is_configured() {
                on_attempt(Attempt { provider: id, fallback: false });
                tracing::debug!(provider = %id, %coord, "fetching from preferred provider");

                match fetch(Arc::clone(preferred), coord).await {
                    Ok(result) => {
                        tracing::info!(provider = %id, %coord, "weather from preferred provider");
                        return Ok((result, false));
                    }
                    Err(e) => {
                        tracing::warn!(provider = %id, error = %e, "preferred provider failed, falling back");
                        attempts.push((id, e.to_string()));
                    }
                }
            } else {
                tracing::debug!(provider = %id, "preferred provider not configured, skipping");
            }
        }

        let id = self.fallback.id();
        on_attempt(Attempt { provider: id, fallback: true });
        tracing::debug!(provider = %id, %coord, "fetching from fallback provider");

        match fetch(Arc::clone(&self.fallback), coord).await {
            Ok(result) => {
                tracing::info!(provider = %id, %coord, "weather from fallback provider");
                Ok((result, true))
            }
            Err(e) => {
                tracing::warn!(provider = %id, error = %e, "fallback provider failed");
                attempts.push((id, e.to_string()));
                Err(WeatherUnavailable { attempts })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::FixedClock,
        condition::CanonicalCondition,
        error::HttpFailure,
        model::CurrentField,
        provider::{google::GoogleWeather, open_meteo::OpenMeteoWeather},
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct StubProvider {
        id: ProviderId,
        configured: bool,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(id: ProviderId, fail: bool) -> Arc<Self> {
            Arc::new(Self { id, configured: true, fail, calls: AtomicUsize::new(0) })
        }

        fn unconfigured(id: ProviderId) -> Arc<Self> {
            Arc::new(Self { id, configured: false, fail: false, calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Echo the coordinate back as the temperature so callers can tell
        /// results apart.
        fn respond(&self, coord: Coordinate) -> Result<ProviderResult, ProviderUnavailable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderUnavailable::Http {
                    provider: self.id,
                    source: HttpFailure::Status { status: StatusCode::BAD_GATEWAY, body: "upstream".into() },
                });
            }
            let result = match self.id {
                ProviderId::Google => ProviderResult::Grid(
                    GoogleWeather::from_json(json!({
                        "utcOffsetSeconds": -18000,
                        "current": {"temperature": coord.latitude, "condition": "Heavy Thunderstorm"},
                        "dailyForecast": [{"time": "2026-10-18", "temperatureMax": 24, "temperatureMin": 17}]
                    }))
                    .expect("fixture"),
                ),
                ProviderId::OpenMeteo => ProviderResult::Point(
                    OpenMeteoWeather::from_json(json!({
                        "utc_offset_seconds": -18000,
                        "current": {
                            "temperature_2m": coord.latitude,
                            "relative_humidity_2m": 80,
                            "apparent_temperature": coord.latitude,
                            "is_day": 1,
                            "precipitation": 0,
                            "weather_code": 95,
                            "cloud_cover": 50,
                            "pressure_msl": 1012,
                            "wind_speed_10m": 10,
                            "wind_direction_10m": 180,
                            "wind_gusts_10m": 15
                        },
                        "daily": {"time": ["2026-10-18", "2026-10-19"]}
                    }))
                    .expect("fixture"),
                ),
            };
            Ok(result)
        }
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn fetch_weather(&self, coord: Coordinate) -> Result<ProviderResult, ProviderUnavailable> {
            self.respond(coord)
        }

        async fn fetch_forecast_window(
            &self,
            coord: Coordinate,
        ) -> Result<ProviderResult, ProviderUnavailable> {
            self.respond(coord)
        }
    }

    fn reconciler(preferred: Arc<StubProvider>, fallback: Arc<StubProvider>) -> WeatherReconciler {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 10, 18, 15, 0, 0).single().expect("instant"));
        WeatherReconciler::new(
            Some(preferred),
            fallback,
            Arc::new(ConditionCodeMapper::standard()),
            Arc::new(clock),
        )
    }

    const LIMA: Coordinate = Coordinate::new(-12.0464, -77.0428);

    #[tokio::test]
    async fn preferred_success_skips_fallback() {
        let google = StubProvider::new(ProviderId::Google, false);
        let meteo = StubProvider::new(ProviderId::OpenMeteo, false);
        let r = reconciler(google.clone(), meteo.clone());

        let model = r.get_weather_data(LIMA).await.expect("weather");

        assert_eq!(model.provider, ProviderId::Google);
        assert_eq!(model.current.condition, CanonicalCondition::Thunderstorm);
        assert_eq!(google.calls(), 1);
        assert_eq!(meteo.calls(), 0);
    }

    #[tokio::test]
    async fn preferred_failure_calls_fallback_exactly_once() {
        let google = StubProvider::new(ProviderId::Google, true);
        let meteo = StubProvider::new(ProviderId::OpenMeteo, false);
        let r = reconciler(google.clone(), meteo.clone());

        let mut seen = Vec::new();
        let model = r.get_weather_data_observed(LIMA, |a| seen.push(a)).await.expect("weather");

        assert_eq!(model.provider, ProviderId::OpenMeteo);
        assert_eq!(model.current.condition, CanonicalCondition::Thunderstorm);
        assert_eq!(google.calls(), 1);
        assert_eq!(meteo.calls(), 1);
        assert_eq!(
            seen,
            vec![
                Attempt { provider: ProviderId::Google, fallback: false },
                Attempt { provider: ProviderId::OpenMeteo, fallback: true },
            ]
        );
    }

    #[tokio::test]
    async fn both_failing_is_weather_unavailable() {
        let google = StubProvider::new(ProviderId::Google, true);
        let meteo = StubProvider::new(ProviderId::OpenMeteo, true);
        let r = reconciler(google.clone(), meteo.clone());

        let err = r.get_weather_data(LIMA).await.unwrap_err();

        assert_eq!(meteo.calls(), 1);
        let providers: Vec<_> = err.attempts.iter().map(|(id, _)| *id).collect();
        assert_eq!(providers, vec![ProviderId::Google, ProviderId::OpenMeteo]);
        assert!(err.to_string().starts_with("weather data is unavailable"));
    }

    #[tokio::test]
    async fn missing_credential_calls_only_fallback_with_defaults() {
        let google = StubProvider::unconfigured(ProviderId::Google);
        let meteo = StubProvider::new(ProviderId::OpenMeteo, false);
        let r = reconciler(google.clone(), meteo.clone());

        let model = r.get_weather_data(LIMA).await.expect("weather");

        assert_eq!(google.calls(), 0);
        assert_eq!(meteo.calls(), 1);
        assert_eq!(model.provider, ProviderId::OpenMeteo);
        assert_eq!(model.current.uv_index, crate::transform::defaults::UV_INDEX);
        assert!(model.current.is_defaulted(CurrentField::UvIndex));
        assert!(model.current.is_defaulted(CurrentField::Visibility));
        assert!(!model.current.is_defaulted(CurrentField::Humidity));
        assert!(model.hourly.is_aligned());
        assert!(model.daily.is_aligned());
    }

    #[tokio::test]
    async fn missing_credential_and_failing_fallback_records_one_attempt() {
        let google = StubProvider::unconfigured(ProviderId::Google);
        let meteo = StubProvider::new(ProviderId::OpenMeteo, true);
        let r = reconciler(google, meteo);

        let err = r.get_weather_data(LIMA).await.unwrap_err();
        assert_eq!(err.attempts.len(), 1);
        assert_eq!(err.attempts[0].0, ProviderId::OpenMeteo);
    }

    #[tokio::test]
    async fn forecast_window_is_tagged_with_its_source() {
        let google = StubProvider::new(ProviderId::Google, false);
        let meteo = StubProvider::new(ProviderId::OpenMeteo, false);
        let window = reconciler(google, meteo).get_10_day_forecast(LIMA).await.expect("window");
        assert_eq!(window.source.to_string(), "google");
        assert_eq!(window.daily.temperature_max, vec![24.0]);

        let google = StubProvider::new(ProviderId::Google, true);
        let meteo = StubProvider::new(ProviderId::OpenMeteo, false);
        let window = reconciler(google, meteo.clone()).get_10_day_forecast(LIMA).await.expect("window");
        assert_eq!(window.source.to_string(), "open-meteo (fallback)");
        assert_eq!(window.daily.len(), 2);
        assert!(window.daily.is_aligned());
        assert!(window.hourly.is_empty() && window.hourly.is_aligned());
        assert_eq!(meteo.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_calls_keep_their_own_coordinates() {
        let google = StubProvider::new(ProviderId::Google, true);
        let meteo = StubProvider::new(ProviderId::OpenMeteo, false);
        let r = reconciler(google, meteo.clone());

        let a = Coordinate::new(-12.0, -77.0);
        let b = Coordinate::new(-16.4, -71.5);
        let (ma, mb) = tokio::join!(r.get_weather_data(a), r.get_weather_data(b));
        let (ma, mb) = (ma.expect("a"), mb.expect("b"));

        assert_eq!(ma.coordinate, a);
        assert_eq!(ma.current.temperature, a.latitude);
        assert_eq!(mb.coordinate, b);
        assert_eq!(mb.current.temperature, b.latitude);
        assert_eq!(meteo.calls(), 2);
    }

    #[test]
    fn preferring_the_keyless_provider_disables_the_second_try() {
        let mut cfg = Config::default();
        cfg.set_preferred_provider(ProviderId::OpenMeteo);
        let r = WeatherReconciler::from_config(&cfg, &Client::new()).expect("config");
        assert!(r.preferred.is_none());
        assert_eq!(r.fallback.id(), ProviderId::OpenMeteo);

        let r = WeatherReconciler::from_config(&Config::default(), &Client::new()).expect("config");
        assert_eq!(r.preferred.as_ref().map(|p| p.id()), Some(ProviderId::Google));
    }
}
