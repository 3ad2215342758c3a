use std::{fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    config::{LocationConfig, NamedLocation},
    error::LocationError,
    model::Coordinate,
};

/// Device positioning, as exposed by the platform.
#[async_trait]
pub trait PositionSource: Send + Sync + Debug {
    /// May prompt the user.
    async fn request_permission(&self) -> Result<(), LocationError>;

    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

/// A position known up front, e.g. passed on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinate);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn request_permission(&self) -> Result<(), LocationError> {
        Ok(())
    }

    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

/// No positioning available; behaves like a denied permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPosition;

#[async_trait]
impl PositionSource for NoPosition {
    async fn request_permission(&self) -> Result<(), LocationError> {
        Err(LocationError::PermissionDenied)
    }

    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unavailable)
    }
}

/// Device position, or the configured fallback city. Never fails.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    source: Arc<dyn PositionSource>,
    fallback: NamedLocation,
    timeout: Duration,
}

impl LocationResolver {
    pub fn new(source: Arc<dyn PositionSource>, fallback: NamedLocation, timeout: Duration) -> Self {
        Self { source, fallback, timeout }
    }

    pub fn from_config(config: &LocationConfig, source: Arc<dyn PositionSource>) -> Self {
        Self::new(source, config.fallback.clone(), config.position_timeout())
    }

    pub fn fallback(&self) -> &NamedLocation {
        &self.fallback
    }

    pub async fn resolve(&self) -> Coordinate {
        match self.device_position().await {
            Ok(coord) => {
                tracing::debug!(%coord, "using device position");
                coord
            }
            Err(e) => {
                tracing::warn!(error = %e, fallback = %self.fallback.name, "device position unavailable, using fallback");
                self.fallback.coordinate()
            }
        }
    }

    async fn device_position(&self) -> Result<Coordinate, LocationError> {
        self.source.request_permission().await?;

        let coord = tokio::time::timeout(self.timeout, self.source.current_position())
            .await
            .map_err(|_| LocationError::Timeout)??;

        let valid = coord.latitude.is_finite()
            && coord.longitude.is_finite()
            && coord.latitude.abs() <= 90.0
            && coord.longitude.abs() <= 180.0;
        if valid { Ok(coord) } else { Err(LocationError::Unavailable) }
    }
}
