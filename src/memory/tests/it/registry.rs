use cablewatch_core::{
    AlertInbound, DashboardOutbound, Mmsi, NewAisPosition, PositionStore, ProximityOutbound,
    TickUpdate, VesselDescriptor, VesselRegistry, VesselZoneState, Zone,
};
use chrono::{Duration, Utc};
use futures::future::join_all;
use memory::MemoryAdapter;

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_first_sightings_create_a_single_vessel() {
    let adapter = MemoryAdapter::new();
    let mmsi = Mmsi::test_random();

    let handles = (0..32).map(|_| {
        let adapter = adapter.clone();
        tokio::spawn(async move { adapter.get_or_create(mmsi).await.unwrap() })
    });

    let ids: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(adapter.vessels().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_merge_descriptor_coalesces_stored_fields() {
    let adapter = MemoryAdapter::new();
    let mmsi = Mmsi::test_random();

    adapter
        .merge_descriptor(mmsi, VesselDescriptor::test_default())
        .await
        .unwrap();
    adapter
        .merge_descriptor(
            mmsi,
            VesselDescriptor {
                callsign: Some("LK99".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let vessel = adapter.vessel(mmsi).await.unwrap().unwrap();

    assert_eq!(vessel.descriptor.name.as_deref(), Some("NORDIC STAR"));
    assert_eq!(vessel.descriptor.callsign.as_deref(), Some("LK99"));
    assert_eq!(vessel.descriptor.type_code, Some(70));
}

#[tokio::test]
async fn test_duplicate_positions_are_stored_once() {
    let adapter = MemoryAdapter::new();
    let mmsi = Mmsi::test_random();
    let vessel_id = adapter.get_or_create(mmsi).await.unwrap();

    let report = NewAisPosition::test_default(mmsi, 10.5, 58.2).into_report(vessel_id);

    assert_eq!(adapter.add_positions(vec![report.clone()]).await.unwrap(), 1);
    assert_eq!(adapter.add_positions(vec![report]).await.unwrap(), 0);
    assert_eq!(adapter.positions(vessel_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_vessel_tracks_start_at_the_last_evaluated_position() {
    let adapter = MemoryAdapter::new();
    let mmsi = Mmsi::test_random();
    let vessel_id = adapter.get_or_create(mmsi).await.unwrap();
    let now = Utc::now();
    let observed_at = |i: i64| now - Duration::minutes(10 - i);

    let positions = (0..3)
        .map(|i| {
            let mut p = NewAisPosition::test_default(mmsi, 10.0 + i as f64, 58.0);
            p.observed_at = observed_at(i);
            p.into_report(vessel_id)
        })
        .collect();
    adapter.add_positions(positions).await.unwrap();

    let window = now - Duration::minutes(30);
    let tracks = adapter.vessel_tracks(window).await.unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].latest.longitude, 12.0);
    assert_eq!(tracks[0].trail.len(), 2);
    assert_eq!(tracks[0].trail[0].longitude, 10.0);

    adapter
        .commit_tick(TickUpdate {
            states: vec![VesselZoneState {
                vessel_id,
                last_zone: Zone::Far,
                feature_id: None,
                last_position_at: Some(observed_at(1)),
            }],
            alerts: vec![],
        })
        .await
        .unwrap();

    let tracks = adapter.vessel_tracks(window).await.unwrap();
    assert_eq!(tracks[0].trail.len(), 1);
    assert_eq!(tracks[0].trail[0].longitude, 11.0);

    let tracks = adapter
        .vessel_tracks(now - Duration::minutes(8) - Duration::seconds(30))
        .await
        .unwrap();

    assert_eq!(tracks.len(), 1);
    assert!(tracks[0].trail.is_empty());

    assert!(adapter.vessel_tracks(now).await.unwrap().is_empty());
}
