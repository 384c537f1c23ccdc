use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::models::ScoringWeights;
use crate::services::ResolverOptions;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub cors: CorsSettings,
    pub catalog: CatalogSettings,
    pub routing: RoutingSettings,
    pub cache: CacheSettings,
    pub scoring: ScoringSettings,
    pub maps: MapsSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// Allowed origins; `"*"` allows any origin
    pub allowed_origins: Vec<String>,
    pub max_age_secs: usize,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://127.0.0.1:5500".to_string(),
                "http://localhost:5500".to_string(),
            ],
            max_age_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// JSON catalog to load instead of the bundled one
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    pub osrm_url: String,
    pub nominatim_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_concurrency: usize,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub straight_line_fallback: bool,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            osrm_url: "https://router.project-osrm.org".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("study-spot-match/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
            max_concurrency: 4,
            max_retries: 3,
            backoff_ms: 500,
            max_backoff_ms: 10_000,
            straight_line_fallback: true,
        }
    }
}

impl RoutingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            max_concurrency: self.max_concurrency,
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            straight_line_fallback: self.straight_line_fallback,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub geocode_ttl_secs: u64,
    pub geocode_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            geocode_ttl_secs: 3600,
            geocode_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_proximity_weight")]
    pub proximity: f64,
    #[serde(default = "default_amenities_weight")]
    pub amenities: f64,
    #[serde(default = "default_noise_weight")]
    pub noise: f64,
    #[serde(default = "default_space_type_weight")]
    pub space_type: f64,
    #[serde(default = "default_indoor_outdoor_weight")]
    pub indoor_outdoor: f64,
    #[serde(default = "default_access_weight")]
    pub access: f64,
    #[serde(default = "default_hours_weight")]
    pub hours: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            proximity: default_proximity_weight(),
            amenities: default_amenities_weight(),
            noise: default_noise_weight(),
            space_type: default_space_type_weight(),
            indoor_outdoor: default_indoor_outdoor_weight(),
            access: default_access_weight(),
            hours: default_hours_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            proximity: config.proximity,
            amenities: config.amenities,
            noise: config.noise,
            space_type: config.space_type,
            indoor_outdoor: config.indoor_outdoor,
            access: config.access,
            hours: config.hours,
        }
    }
}

fn default_proximity_weight() -> f64 { ScoringWeights::DEFAULT.proximity }
fn default_amenities_weight() -> f64 { ScoringWeights::DEFAULT.amenities }
fn default_noise_weight() -> f64 { ScoringWeights::DEFAULT.noise }
fn default_space_type_weight() -> f64 { ScoringWeights::DEFAULT.space_type }
fn default_indoor_outdoor_weight() -> f64 { ScoringWeights::DEFAULT.indoor_outdoor }
fn default_access_weight() -> f64 { ScoringWeights::DEFAULT.access }
fn default_hours_weight() -> f64 { ScoringWeights::DEFAULT.hours }

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MapsSettings {
    /// Browser key handed to the front end; the endpoint 404s without one
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

fn environment() -> Environment {
    Environment::with_prefix("STUDYSPOT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors.allowed_origins")
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with STUDYSPOT__)
    ///    e.g., STUDYSPOT__SERVER__PORT -> server.port
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?;

        let settings = apply_maps_key_override(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }
}

/// `GOOGLE_MAPS_API_KEY` wins over the configured maps key when set
fn apply_maps_key_override(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("GOOGLE_MAPS_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Config::builder()
            .add_source(settings)
            .set_override("maps.api_key", key)?
            .build(),
        _ => Ok(settings),
    }
}
