use std::{path::PathBuf, time::Duration};

use cablewatch_core::{
    Environment, FeatureId, LogLevel, StorageSettings, Thresholds, load_settings,
};
use config::ConfigError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub log_level: LogLevel,
    pub environment: Environment,
    pub storage: StorageSettings,
    /// GeoJSON feature collection imported before the first tick.
    pub infrastructure_path: Option<PathBuf>,
    /// Replaces the watched flags of the dataset when non-empty.
    #[serde(default)]
    pub watched_features: Vec<FeatureId>,
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub position_window: Duration,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        load_settings("CABLEWATCH_PROCESSORS")
    }
}
