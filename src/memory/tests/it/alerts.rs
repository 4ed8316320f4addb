use cablewatch_core::{
    AlertCategory, AlertInbound, AlertUpsert, DashboardOutbound, FeatureId, ProximityOutbound,
    TickUpdate, VesselId, VesselZoneState, Zone,
};
use chrono::{Duration, Utc};
use memory::MemoryAdapter;

fn upsert(vessel_id: VesselId, category: AlertCategory, minutes: i64) -> AlertUpsert {
    AlertUpsert {
        vessel_id,
        category,
        message: format!("{category} alert"),
        observed_at: Utc::now() + Duration::minutes(minutes),
    }
}

#[tokio::test]
async fn test_repeated_alerts_increment_count() {
    let adapter = MemoryAdapter::new();
    let vessel_id = VesselId::new(3);

    for i in 0..3 {
        adapter
            .commit_tick(TickUpdate {
                states: vec![],
                alerts: vec![upsert(vessel_id, AlertCategory::Approach, i)],
            })
            .await
            .unwrap();
    }

    let alerts = adapter.alerts().await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].count, 3);
    assert!(alerts[0].last_seen > alerts[0].first_seen);
}

#[tokio::test]
async fn test_disregard_removes_every_alert_of_the_vessel() {
    let adapter = MemoryAdapter::new();
    let vessel_id = VesselId::new(3);
    let other = VesselId::new(4);

    adapter
        .commit_tick(TickUpdate {
            states: vec![],
            alerts: vec![
                upsert(vessel_id, AlertCategory::Approach, 0),
                upsert(vessel_id, AlertCategory::Over, 1),
                upsert(other, AlertCategory::Crossing, 2),
            ],
        })
        .await
        .unwrap();

    assert_eq!(adapter.disregard_alerts(vessel_id).await.unwrap(), 2);
    assert_eq!(adapter.disregard_alerts(vessel_id).await.unwrap(), 0);

    let alerts = adapter.alerts().await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].vessel_id, other);
}

#[tokio::test]
async fn test_zone_states_are_replaced_per_vessel() {
    let adapter = MemoryAdapter::new();
    let vessel_id = VesselId::new(9);

    for zone in [Zone::Far, Zone::Approach] {
        adapter
            .commit_tick(TickUpdate {
                states: vec![VesselZoneState {
                    vessel_id,
                    last_zone: zone,
                    feature_id: Some(FeatureId::new("f")),
                    last_position_at: Some(Utc::now()),
                }],
                alerts: vec![],
            })
            .await
            .unwrap();
    }

    let states = adapter
        .zone_states(&[vessel_id, VesselId::new(10)])
        .await
        .unwrap();

    assert_eq!(states.len(), 1);
    assert_eq!(states[0].last_zone, Zone::Approach);
}
