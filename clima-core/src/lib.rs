//! Core library for the `clima` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Two weather providers behind one trait, reconciled with a fallback
//! - A canonical weather model and the transforms into it
//! - Place names for coordinates via a chain of geocoders
//!
//! It is used by `clima-cli`, but the [`WeatherSession`] facade can back any
//! other front end.

pub mod city;
pub mod clock;
pub mod condition;
pub mod config;
pub mod error;
pub mod geocode;
pub mod http;
pub mod location;
pub mod model;
pub mod provider;
pub mod reconciler;
pub mod session;
pub mod transform;

pub use condition::{CanonicalCondition, ConditionCodeMapper};
pub use config::{Config, ProviderConfig};
pub use error::{GeocodeUnavailable, LocationError, ProviderUnavailable, WeatherUnavailable};
pub use model::{Coordinate, ForecastWindow, PlaceName, WeatherModel};
pub use provider::{ProviderId, WeatherProvider};
pub use reconciler::WeatherReconciler;
pub use session::{Phase, Snapshot, WeatherSession};
