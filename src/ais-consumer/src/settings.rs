use std::time::Duration;

use cablewatch_core::{Environment, LogLevel, StorageSettings, load_settings};
use config::ConfigError;
use serde::Deserialize;

/// South-west and north-east corner as `[latitude, longitude]` pairs.
pub type BoundingBox = [[f64; 2]; 2];

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub log_level: LogLevel,
    pub environment: Environment,
    pub storage: StorageSettings,
    pub feed: Option<FeedSettings>,
    #[serde(with = "humantime_serde")]
    pub commit_interval: Duration,
    pub channel_buffer_size: usize,
    pub num_ingest_workers: u32,
    #[serde(with = "humantime_serde")]
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: usize,
    pub max_line_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    pub api_address: String,
    pub api_key: String,
    pub bounding_boxes: Vec<BoundingBox>,
    #[serde(default)]
    pub message_types: Vec<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        load_settings("CABLEWATCH_AIS_CONSUMER")
    }
}
