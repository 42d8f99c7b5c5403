use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::gesture::GestureConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub geocoding: GeocodingSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub gesture: GestureSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    /// Upper bound for simple reads
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Upper bound for swipes and profile writes
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,
}

fn default_read_timeout() -> u64 { 10 }
fn default_write_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingSettings {
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,
    #[serde(default = "default_read_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_url(),
            timeout_secs: default_read_timeout(),
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_geocoding_url() -> String { "https://turkey-geolocation-rest-api.vercel.app".to_string() }
fn default_cache_ttl() -> u64 { 3600 }
fn default_cache_capacity() -> u64 { 512 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_radius_km")]
    pub radius_km: u16,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self { radius_km: default_radius_km() }
    }
}

fn default_radius_km() -> u16 { 50 }

#[derive(Debug, Clone, Deserialize)]
pub struct GestureSettings {
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_threshold_fraction")]
    pub threshold_fraction: f64,
    #[serde(default = "default_velocity_threshold")]
    pub velocity_threshold: f64,
    #[serde(default = "default_exit_multiplier")]
    pub exit_multiplier: f64,
    #[serde(default = "default_exit_duration_ms")]
    pub exit_duration_ms: u64,
    #[serde(default = "default_max_rotation_deg")]
    pub max_rotation_deg: f64,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            threshold_fraction: default_threshold_fraction(),
            velocity_threshold: default_velocity_threshold(),
            exit_multiplier: default_exit_multiplier(),
            exit_duration_ms: default_exit_duration_ms(),
            max_rotation_deg: default_max_rotation_deg(),
        }
    }
}

fn default_viewport_width() -> f64 { 390.0 }
fn default_threshold_fraction() -> f64 { 0.25 }
fn default_velocity_threshold() -> f64 { 800.0 }
fn default_exit_multiplier() -> f64 { 1.5 }
fn default_exit_duration_ms() -> u64 { 300 }
fn default_max_rotation_deg() -> f64 { 15.0 }

impl From<&GestureSettings> for GestureConfig {
    fn from(settings: &GestureSettings) -> Self {
        GestureConfig {
            viewport_width: settings.viewport_width,
            threshold_fraction: settings.threshold_fraction,
            velocity_threshold: settings.velocity_threshold,
            exit_multiplier: settings.exit_multiplier,
            exit_duration_ms: settings.exit_duration_ms,
            max_rotation_deg: settings.max_rotation_deg,
        }
    }
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
fn default_log_format() -> String { "pretty".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ROOMIE_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ROOMIE__API__BASE_URL -> api.base_url
            .add_source(
                Environment::with_prefix("ROOMIE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("ROOMIE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply the short-form overrides used by deployment scripts
///
/// `ROOMIE_API_URL` and `ROOMIE_GEOCODING_URL` win over file values.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(api_url) = env::var("ROOMIE_API_URL") {
        builder = builder.set_override("api.base_url", api_url)?;
    }
    if let Ok(geocoding_url) = env::var("ROOMIE_GEOCODING_URL") {
        builder = builder.set_override("geocoding.base_url", geocoding_url)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_gesture_settings() {
        let gesture = GestureSettings::default();
        assert_eq!(gesture.threshold_fraction, 0.25);
        assert_eq!(gesture.exit_multiplier, 1.5);
        assert_eq!(gesture.exit_duration_ms, 300);

        let config = GestureConfig::from(&gesture);
        assert_eq!(config.threshold(), 97.5);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("roomie-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "[api]\nbase_url = \"http://localhost:4000\"\n\n[matching]\nradius_km = 15\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.api.base_url, "http://localhost:4000");
        assert_eq!(settings.matching.radius_km, 15);
        assert_eq!(settings.gesture.exit_duration_ms, 300);
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let path = std::env::temp_dir().join(format!("roomie-missing-{}.toml", uuid::Uuid::new_v4()));
        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    fn test_minimal_file_fills_defaults() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                "[api]\nbase_url = \"http://localhost:3000\"\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.api.read_timeout_secs, 10);
        assert_eq!(settings.api.write_timeout_secs, 30);
        assert_eq!(settings.matching.radius_km, 50);
        assert_eq!(settings.geocoding.cache_ttl_secs, 3600);
        assert!(settings.geocoding.base_url.starts_with("https://"));
    }
}
