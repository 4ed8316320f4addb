#![deny(warnings)]
#![deny(rust_2018_idioms)]

use ais_consumer::settings::Settings;
use cablewatch_core::StorageSettings;
use config::{Config, File};

pub mod consumer;
pub mod helper;

#[test]
fn test_local_settings_are_valid() {
    let settings = Config::builder()
        .add_source(File::with_name("config/local.yml").required(true))
        .set_override("feed.api_key", "test")
        .unwrap()
        .set_override("environment", "Local")
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize::<Settings>()
        .unwrap();

    assert!(matches!(settings.storage, StorageSettings::Postgres(_)));
    assert!(settings.feed.is_some());
}

#[test]
fn test_development_settings_are_valid() {
    let settings = Config::builder()
        .add_source(File::with_name("config/development.yml").required(true))
        .set_override("feed.api_key", "test")
        .unwrap()
        .set_override("storage.postgres.password", "test")
        .unwrap()
        .set_override("environment", "Development")
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize::<Settings>()
        .unwrap();

    assert_eq!(settings.feed.unwrap().message_types.len(), 5);
}

#[test]
fn test_test_settings_are_valid() {
    let settings = Config::builder()
        .add_source(File::with_name("config/test.yml").required(true))
        .set_override("environment", "Test")
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize::<Settings>()
        .unwrap();

    assert!(matches!(settings.storage, StorageSettings::Memory));
    assert!(settings.feed.is_none());
    assert_eq!(settings.max_reconnect_attempts, 3);
}
