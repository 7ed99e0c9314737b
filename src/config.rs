use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingSettings {
    pub max_distance_km: Option<f64>,
    pub default_limit: Option<u16>,
    pub max_limit: Option<u16>,
    pub exclude_imprecise: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

/// Points per scoring factor
#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_compatible_points")]
    pub compatible: u8,
    #[serde(default = "default_exact_match_points")]
    pub exact_match: u8,
    #[serde(default = "default_eligible_points")]
    pub eligible: u8,
    #[serde(default = "default_within_5km_points")]
    pub within_5km: u8,
    #[serde(default = "default_within_10km_points")]
    pub within_10km: u8,
    #[serde(default = "default_within_20km_points")]
    pub within_20km: u8,
    #[serde(default = "default_within_50km_points")]
    pub within_50km: u8,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            compatible: default_compatible_points(),
            exact_match: default_exact_match_points(),
            eligible: default_eligible_points(),
            within_5km: default_within_5km_points(),
            within_10km: default_within_10km_points(),
            within_20km: default_within_20km_points(),
            within_50km: default_within_50km_points(),
        }
    }
}

fn default_compatible_points() -> u8 { 40 }
fn default_exact_match_points() -> u8 { 10 }
fn default_eligible_points() -> u8 { 20 }
fn default_within_5km_points() -> u8 { 30 }
fn default_within_10km_points() -> u8 { 25 }
fn default_within_20km_points() -> u8 { 20 }
fn default_within_50km_points() -> u8 { 10 }

impl WeightsConfig {
    /// Closer distance tiers must never be worth fewer points than farther ones
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tiers = [
            ("within_5km", self.within_5km),
            ("within_10km", self.within_10km),
            ("within_20km", self.within_20km),
            ("within_50km", self.within_50km),
        ];

        for pair in tiers.windows(2) {
            let (near, near_points) = pair[0];
            let (far, far_points) = pair[1];
            if near_points < far_points {
                return Err(ConfigError::Message(format!(
                    "scoring.weights.{} ({}) must be at least scoring.weights.{} ({})",
                    near, near_points, far, far_points
                )));
            }
        }
        Ok(())
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            compatible: config.compatible,
            exact_match: config.exact_match,
            eligible: config.eligible,
            within_5km: config.within_5km,
            within_10km: config.within_10km,
            within_20km: config.within_20km,
            within_50km: config.within_50km,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    pub timeout_secs: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: None,
            model: default_llm_model(),
            timeout_secs: None,
        }
    }
}

fn default_llm_endpoint() -> String { "https://api.openai.com/v1".to_string() }
fn default_llm_model() -> String { "gpt-4o-mini".to_string() }

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

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with DONOR_MATCH)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., DONOR_MATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("DONOR_MATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        Self::from_config(settings)
    }

    /// Load configuration from a custom path
    ///
    /// Environment variables apply on top of the file, as in [`Settings::load`].
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("DONOR_MATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(substitute_env_vars(settings)?)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        settings.scoring.weights.validate()?;
        Ok(settings)
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights::from(&self.scoring.weights)
    }
}

/// Apply well-known environment variables that do not follow the prefix scheme
///
/// `LLM_API_KEY` and `OPENAI_API_KEY` (in that order) override `llm.api_key`.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let api_key = env::var("LLM_API_KEY")
        .or_else(|_| env::var("OPENAI_API_KEY"))
        .ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(key) = api_key {
        builder = builder.set_override("llm.api_key", key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_weights() {
        let weights = ScoringWeights::from(&WeightsConfig::default());
        assert_eq!(weights, ScoringWeights::default());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                r#"
                [server]
                port = 9090

                [scoring.weights]
                eligible = 15
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.scoring_weights().eligible, 15);
        assert_eq!(settings.scoring_weights().compatible, 40);
        assert!(settings.llm.api_key.is_none());
        assert_eq!(settings.matching.max_distance_km, None);
    }

    #[test]
    fn test_weights_must_not_favour_farther_tiers() {
        let weights = WeightsConfig {
            within_5km: 30,
            within_10km: 35,
            ..WeightsConfig::default()
        };
        let err = weights.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Message(ref msg) if msg.contains("within_5km")));

        let flat = WeightsConfig {
            within_5km: 10,
            within_10km: 10,
            within_20km: 10,
            within_50km: 10,
            ..WeightsConfig::default()
        };
        assert!(flat.validate().is_ok());
        assert!(WeightsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_from_file_applies_api_key_and_checks_weights() {
        let dir = std::env::temp_dir();
        let good = dir.join(format!("donor-match-{}.toml", uuid::Uuid::new_v4()));
        let bad = dir.join(format!("donor-match-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&good, "[server]\nport = 9191\n").unwrap();
        std::fs::write(&bad, "[scoring.weights]\nwithin_5km = 30\nwithin_10km = 35\n").unwrap();

        std::env::set_var("LLM_API_KEY", "sk-from-env");
        let loaded = Settings::load_from(&good);
        let rejected = Settings::load_from(&bad);
        std::env::remove_var("LLM_API_KEY");
        std::fs::remove_file(&good).ok();
        std::fs::remove_file(&bad).ok();

        let settings = loaded.unwrap();
        assert_eq!(settings.server.port, 9191);
        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-from-env"));
        assert!(matches!(rejected, Err(ConfigError::Message(_))));
    }
}
