use std::time::Duration;

use cablewatch_core::Mmsi;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use crate::helper::{
    position_message, static_message, test, test_settings, test_with_settings,
};

fn at(seconds: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, seconds).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_position_reports_are_persisted() {
    test(|mut helper| async move {
        let mmsi = Mmsi::test_random();

        helper.feed.send(&position_message(mmsi, 58.1, 10.4, at(0))).await;
        helper.feed.send(&position_message(mmsi, 58.2, 10.5, at(10))).await;
        helper.wait_for_received(2).await;
        helper.shutdown().await.unwrap();

        let positions = helper.positions(mmsi).await;

        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].observed_at, at(0));
        assert_eq!(positions[1].latitude, 58.2);
        assert_eq!(positions[1].heading, Some(86));
        assert_eq!(helper.counters.snapshot().positions, 2);
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_first_sightings_from_both_report_kinds_create_one_vessel() {
    test(|mut helper| async move {
        let mmsi = Mmsi::test_random();

        helper
            .feed
            .send(&static_message(mmsi, Some("NORDIC STAR"), None))
            .await;
        helper.feed.send(&position_message(mmsi, 58.1, 10.4, at(0))).await;
        helper.wait_for_received(2).await;
        helper.shutdown().await.unwrap();

        let vessels = helper.vessels().await;

        assert_eq!(vessels.len(), 1);
        assert_eq!(vessels[0].mmsi, mmsi);
        assert_eq!(vessels[0].descriptor.name.as_deref(), Some("NORDIC STAR"));
        assert_eq!(helper.positions(mmsi).await.len(), 1);
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_static_reports_never_erase_known_fields() {
    test(|mut helper| async move {
        let mmsi = Mmsi::test_random();

        helper
            .feed
            .send(&static_message(mmsi, Some("NORDIC STAR@@@@"), Some("LK45")))
            .await;
        helper.wait_for_received(1).await;
        helper.wait_for_vessels(1).await;

        helper
            .feed
            .send(&static_message(mmsi, None, Some("LK99")))
            .await;
        helper.wait_for_received(2).await;
        helper.shutdown().await.unwrap();

        let vessel = helper.vessel(mmsi).await;

        assert_eq!(vessel.descriptor.name.as_deref(), Some("NORDIC STAR"));
        assert_eq!(vessel.descriptor.callsign.as_deref(), Some("LK99"));
        assert_eq!(vessel.descriptor.dimension_to_bow, Some(120));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_position_name_hint_is_merged_into_the_vessel() {
    test(|mut helper| async move {
        let mmsi = Mmsi::test_random();

        let mut message = position_message(mmsi, 58.1, 10.4, at(0));
        message["MetaData"]["ShipName"] = json!("KNARR  ");
        helper.feed.send(&message).await;
        helper.wait_for_received(1).await;
        helper.shutdown().await.unwrap();

        assert_eq!(
            helper.vessel(mmsi).await.descriptor.name.as_deref(),
            Some("KNARR")
        );
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unusable_reports_are_counted_not_stored() {
    test(|mut helper| async move {
        let mmsi = Mmsi::test_random();
        let unknown = json!({
            "MessageType": "SafetyBroadcastMessage",
            "MetaData": { "MMSI": mmsi.into_inner() }
        });

        helper.feed.send(&position_message(mmsi, 91.0, 10.4, at(0))).await;
        helper.feed.send(&unknown).await;
        helper.feed.send_string("{ not json".into()).await;
        helper.wait_for_received(3).await;
        helper.shutdown().await.unwrap();

        let snapshot = helper.counters.snapshot();

        assert_eq!(snapshot.missing_coordinates, 1);
        assert_eq!(snapshot.unknown_category, 1);
        assert_eq!(snapshot.malformed, 1);
        assert_eq!(snapshot.positions, 0);
        assert!(helper.vessels().await.is_empty());
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_lines_are_dropped_and_the_stream_continues() {
    let mut settings = test_settings();
    settings.max_line_length = 256;

    test_with_settings(settings, |mut helper| async move {
        let mmsi = Mmsi::test_random();

        helper.feed.send_string("x".repeat(1024)).await;
        helper.feed.send(&position_message(mmsi, 58.1, 10.4, at(0))).await;
        helper.wait_for_received(2).await;
        helper.shutdown().await.unwrap();

        assert_eq!(helper.counters.snapshot().malformed, 1);
        assert_eq!(helper.positions(mmsi).await.len(), 1);
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_buffered_lines_are_flushed_on_shutdown() {
    let mut settings = test_settings();
    settings.commit_interval = Duration::from_secs(3600);

    test_with_settings(settings, |mut helper| async move {
        let mmsi = Mmsi::test_random();

        // The first interval tick fires immediately.
        tokio::time::sleep(Duration::from_millis(50)).await;
        helper.feed.send(&position_message(mmsi, 58.1, 10.4, at(0))).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(helper.counters.snapshot().received, 0);

        helper.shutdown().await.unwrap();

        assert_eq!(helper.counters.snapshot().received, 1);
        assert_eq!(helper.positions(mmsi).await.len(), 1);
    })
    .await;
}
