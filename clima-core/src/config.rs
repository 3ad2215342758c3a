use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use crate::{model::Coordinate, provider::ProviderId};

/// Value shipped in sample configs; treated as "no key".
pub const PLACEHOLDER_API_KEY: &str = "YOUR_GOOGLE_API_KEY_HERE";

/// Environment variable that supplies the grid provider key.
pub const GOOGLE_API_KEY_ENV: &str = "CLIMA_GOOGLE_API_KEY";

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Reverse/forward geocoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Sent on every request; the public OSM geocoder requires one.
    pub user_agent: String,
    pub language: String,
    /// Separate key for the primary geocoder. Falls back to the google provider key.
    pub api_key: Option<String>,
    pub search_region: Option<String>,
    pub search_country_codes: Option<String>,
    /// Country reported for search hits that carry none.
    pub default_country: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            user_agent: "ClimaApp/1.0 (clima-cli)".to_string(),
            language: "es".to_string(),
            api_key: None,
            search_region: Some("pe".to_string()),
            search_country_codes: Some("pe".to_string()),
            default_country: "Perú".to_string(),
        }
    }
}

/// A named place with coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedLocation {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NamedLocation {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Used whenever the device position cannot be obtained.
    pub fallback: NamedLocation,
    /// How long to wait for a device fix.
    pub position_timeout_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fallback: NamedLocation {
                name: "Lima".to_string(),
                country: "Perú".to_string(),
                latitude: -12.0464,
                longitude: -77.0428,
            },
            position_timeout_secs: 15,
        }
    }
}

impl LocationConfig {
    pub fn position_timeout(&self) -> Duration {
        Duration::from_secs(self.position_timeout_secs)
    }
}

/// Entry of the static nearest-city table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityReference {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Maximum absolute difference, in degrees, on each axis.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    0.5
}

pub fn default_cities() -> Vec<CityReference> {
    [
        ("Lima", -12.0464, -77.0428),
        ("Arequipa", -16.4090, -71.5375),
        ("Trujillo", -8.1116, -79.0288),
        ("Chiclayo", -6.7714, -79.8409),
        ("Piura", -5.1945, -80.6328),
        ("Iquitos", -3.7491, -73.2538),
        ("Cusco", -13.5319, -71.9675),
        ("Pucallpa", -8.3833, -74.5333),
        ("Tacna", -18.0066, -70.2469),
        ("Juliaca", -15.5000, -70.1333),
    ]
    .into_iter()
    .map(|(name, latitude, longitude)| CityReference {
        name: name.to_string(),
        latitude,
        longitude,
        tolerance: default_tolerance(),
    })
    .collect()
}

/// Upstream base URLs. Overridable so tests can point at a local server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub google_weather: String,
    pub open_meteo: String,
    pub google_geocode: String,
    pub bigdatacloud: String,
    pub nominatim: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            google_weather: "https://weather.googleapis.com/v1/weather:lookup".to_string(),
            open_meteo: "https://api.open-meteo.com/v1/forecast".to_string(),
            google_geocode: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            bigdatacloud: "https://api.bigdatacloud.net/data/reverse-geocode-client".to_string(),
            nominatim: "https://nominatim.openstreetmap.org".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider tried first, e.g. "google". Defaults to google when unset.
    pub preferred_provider: Option<String>,

    /// Example TOML:
    /// [providers.google]
    /// api_key = "..."
    pub providers: HashMap<String, ProviderConfig>,

    pub geocoding: GeocodingConfig,
    pub location: LocationConfig,
    pub cities: Vec<CityReference>,
    pub endpoints: Endpoints,
    pub http: HttpConfig,

    /// Grid provider key taken from the environment. Never written to disk.
    #[serde(skip)]
    env_google_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preferred_provider: None,
            providers: HashMap::new(),
            geocoding: GeocodingConfig::default(),
            location: LocationConfig::default(),
            cities: default_cities(),
            endpoints: Endpoints::default(),
            http: HttpConfig::default(),
            env_google_key: None,
        }
    }
}

impl Config {
    /// Return the preferred provider as a strongly-typed ProviderId.
    pub fn preferred_provider_id(&self) -> Result<ProviderId> {
        match self.preferred_provider.as_deref() {
            None => Ok(ProviderId::Google),
            Some(s) => ProviderId::try_from(s),
        }
    }

    pub fn set_preferred_provider(&mut self, id: ProviderId) {
        self.preferred_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    /// Environment overrides are applied on top.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        cfg.apply_env(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "clima", "clima")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply environment overrides through `lookup`.
    /// They take precedence over the file but are kept out of `save`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(GOOGLE_API_KEY_ENV).filter(|k| usable_key(k.trim())) {
            self.env_google_key = Some(key.trim().to_string());
        }
    }

    /// Set/replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    /// Returns API key for a provider, ignoring empty and placeholder values.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        if provider_id == ProviderId::Google {
            if let Some(key) = self.env_google_key.as_deref() {
                return Some(key);
            }
        }
        self.providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.api_key.trim())
            .filter(|key| usable_key(key))
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    /// Key for the primary geocoder: its own, else the google provider's.
    pub fn geocoding_api_key(&self) -> Option<&str> {
        self.geocoding
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| usable_key(key))
            .or_else(|| self.provider_api_key(ProviderId::Google))
    }
}

fn usable_key(key: &str) -> bool {
    !key.is_empty() && key != PLACEHOLDER_API_KEY
}
