use std::{sync::Arc, time::Duration};

use cablewatch_core::{
    AlertEvent, DashboardOutbound, Environment, ImportSummary, LogLevel, Mmsi, NewAisPosition,
    PositionStore, ProximityOutbound, StorageSettings, Thresholds, VesselId, VesselRegistry,
    VesselZoneState,
};
use chrono::{DateTime, Utc};
use futures::Future;
use memory::MemoryAdapter;
use processors::{App, Settings, TickOutcome, TickSummary};
use serde_json::{Value, json};

pub struct TestHelper {
    pub adapter: MemoryAdapter,
    pub app: App,
    base: DateTime<Utc>,
}

pub fn test_settings() -> Settings {
    Settings {
        log_level: LogLevel::Debug,
        environment: Environment::Test,
        storage: StorageSettings::Memory,
        infrastructure_path: None,
        watched_features: vec![],
        tick_interval: Duration::from_millis(10),
        position_window: Duration::from_secs(3600),
        thresholds: Thresholds::default(),
    }
}

/// Runs the closure against a fresh memory store with [`cable_collection`] imported.
pub async fn test<T, Fut>(test_closure: T)
where
    T: FnOnce(TestHelper) -> Fut,
    Fut: Future<Output = ()>,
{
    let helper = TestHelper::new(&test_settings());
    helper.import(&cable_collection()).await;

    test_closure(helper).await;
}

impl TestHelper {
    pub fn new(settings: &Settings) -> TestHelper {
        let adapter = MemoryAdapter::new();
        let app = App::with_adapter(settings, Arc::new(adapter.clone())).unwrap();

        TestHelper {
            adapter,
            app,
            base: Utc::now() - chrono::Duration::minutes(10),
        }
    }

    pub async fn import(&self, geojson: &Value) -> ImportSummary {
        self.app
            .importer()
            .import(&geojson.to_string())
            .await
            .unwrap()
    }

    /// Adds a position at latitude 57.5 observed `seconds` after the helper's base time.
    pub async fn add_position(&self, mmsi: Mmsi, longitude: f64, seconds: i64) -> VesselId {
        let mut position = NewAisPosition::test_default(mmsi, longitude, 57.5);
        position.observed_at = self.base + chrono::Duration::seconds(seconds);

        self.add(position).await
    }

    pub async fn add(&self, position: NewAisPosition) -> VesselId {
        let vessel_id = self.adapter.get_or_create(position.mmsi).await.unwrap();
        self.adapter
            .add_positions(vec![position.into_report(vessel_id)])
            .await
            .unwrap();
        vessel_id
    }

    pub async fn tick(&self) -> TickSummary {
        match self.app.processor().run_single().await.unwrap() {
            TickOutcome::Completed(summary) => summary,
            TickOutcome::Skipped => panic!("tick was skipped"),
        }
    }

    pub async fn alerts(&self) -> Vec<AlertEvent> {
        self.adapter.alerts().await.unwrap()
    }

    pub async fn zone_state(&self, vessel_id: VesselId) -> VesselZoneState {
        self.adapter
            .zone_states(&[vessel_id])
            .await
            .unwrap()
            .pop()
            .unwrap()
    }
}

/// A watched cable running north along longitude 10 and an unwatched one along
/// longitude 12, both from latitude 57 to 58.
pub fn cable_collection() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "id": "test-cable", "name": "Test Cable", "watched": true },
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[10.0, 57.0], [10.0, 57.3], [10.0, 58.0]]
                }
            },
            {
                "type": "Feature",
                "properties": { "id": "other-cable", "name": "Other Cable", "watched": false },
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[12.0, 57.0], [12.0, 58.0]]
                }
            }
        ]
    })
}
