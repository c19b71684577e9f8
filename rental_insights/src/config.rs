//! Layered application configuration

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use listing_prep::sources::is_supported;
use listing_prep::PrepConfig;
use rental_forecast::ForecastConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory searched for `default.toml`
pub const CONFIG_DIR: &str = "config";
/// Prefix of overriding environment variables, e.g. `RENTAL__FORECAST__HORIZON=3`
pub const ENV_PREFIX: &str = "RENTAL";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Settings for a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the extracted city exports
    pub data_dir: PathBuf,
    /// Directory receiving merged and final tables
    pub output_dir: PathBuf,
    /// Cities processed when none is given on the command line
    pub cities: Vec<String>,
    pub log_level: String,
    pub log_json: bool,
    pub forecast: ForecastConfig,
    pub prep: PrepConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            cities: Vec::new(),
            log_level: "info".to_string(),
            log_json: false,
            forecast: ForecastConfig::default(),
            prep: PrepConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reject settings that would fail later in the run
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(AppError::InvalidConfig(format!(
                "log_level must be one of {:?}, got '{}'",
                LOG_LEVELS, self.log_level
            )));
        }
        if let Some(city) = self.cities.iter().find(|c| !is_supported(c)) {
            return Err(AppError::InvalidConfig(format!(
                "city '{}' is not supported",
                city
            )));
        }
        if self.prep.top_amenities == 0 {
            return Err(AppError::InvalidConfig(
                "prep.top_amenities must be positive".to_string(),
            ));
        }
        self.forecast.validate()?;
        Ok(())
    }
}

/// Load configuration from `config/default.toml`, an optional explicit file and
/// `RENTAL__*` environment variables, later sources overriding earlier ones
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    load_config_from(
        Path::new(CONFIG_DIR),
        explicit,
        Environment::with_prefix(ENV_PREFIX).separator("__"),
    )
}

/// Same as [`load_config`] with an explicit config directory and environment source
pub fn load_config_from(
    config_dir: &Path,
    explicit: Option<&Path>,
    environment: Environment,
) -> Result<AppConfig> {
    if !config_dir.exists() {
        info!(
            dir = %config_dir.display(),
            "config directory not found; relying on defaults and environment variables"
        );
    }

    let mut builder = Config::builder()
        .add_source(File::from(config_dir.join("default")).required(false));
    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config: AppConfig = builder
        .add_source(environment.try_parsing(true))
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}
