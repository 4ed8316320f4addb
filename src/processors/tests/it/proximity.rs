use cablewatch_core::{AlertCategory, AlertInbound, FeatureId, InfrastructureInbound, Mmsi, Zone};
use chrono::{Duration, Utc};

use crate::helper::test;

const FAR: f64 = 10.2;
const APPROACH: f64 = 10.03;
const HELD: f64 = 10.06;
const OVER: f64 = 10.005;

#[tokio::test]
async fn test_first_sighting_only_seeds_the_zone() {
    test(|helper| async move {
        let vessel_id = helper.add_position(Mmsi::test_random(), OVER, 0).await;

        let summary = helper.tick().await;

        assert_eq!(summary.evaluated, 1);
        assert_eq!(summary.escalations, 0);
        assert!(helper.alerts().await.is_empty());
        assert_eq!(helper.zone_state(vessel_id).await.last_zone, Zone::Over);
    })
    .await;
}

#[tokio::test]
async fn test_escalation_into_approach_creates_an_alert() {
    test(|helper| async move {
        let mmsi = Mmsi::test_random();
        let vessel_id = helper.add_position(mmsi, FAR, 0).await;
        helper.tick().await;

        helper.add_position(mmsi, APPROACH, 10).await;
        let summary = helper.tick().await;

        let alerts = helper.alerts().await;

        assert_eq!(summary.escalations, 1);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].vessel_id, vessel_id);
        assert_eq!(alerts[0].category, AlertCategory::Approach);
        assert_eq!(alerts[0].count, 1);
        assert!(alerts[0].message.contains("Test Cable"));
    })
    .await;
}

#[tokio::test]
async fn test_repeated_escalations_increment_one_alert() {
    test(|helper| async move {
        let mmsi = Mmsi::test_random();

        for (i, longitude) in [FAR, APPROACH, FAR, APPROACH, FAR, APPROACH]
            .into_iter()
            .enumerate()
        {
            helper.add_position(mmsi, longitude, i as i64 * 10).await;
            helper.tick().await;
        }

        let alerts = helper.alerts().await;

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].count, 3);
        assert!(alerts[0].last_seen > alerts[0].first_seen);
    })
    .await;
}

#[tokio::test]
async fn test_approach_is_held_inside_the_exit_threshold() {
    test(|helper| async move {
        let mmsi = Mmsi::test_random();
        let vessel_id = helper.add_position(mmsi, FAR, 0).await;
        helper.tick().await;
        helper.add_position(mmsi, APPROACH, 10).await;
        helper.tick().await;

        helper.add_position(mmsi, HELD, 20).await;
        helper.tick().await;
        assert_eq!(helper.zone_state(vessel_id).await.last_zone, Zone::Approach);

        helper.add_position(mmsi, APPROACH, 30).await;
        helper.tick().await;

        let alerts = helper.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].count, 1);
    })
    .await;
}

#[tokio::test]
async fn test_escalation_to_over_is_a_separate_alert() {
    test(|helper| async move {
        let mmsi = Mmsi::test_random();
        helper.add_position(mmsi, FAR, 0).await;
        helper.tick().await;
        helper.add_position(mmsi, APPROACH, 10).await;
        helper.tick().await;
        helper.add_position(mmsi, OVER, 20).await;
        helper.tick().await;

        let categories: Vec<_> = helper
            .alerts()
            .await
            .into_iter()
            .map(|a| a.category)
            .collect();

        assert_eq!(categories.len(), 2);
        assert!(categories.contains(&AlertCategory::Approach));
        assert!(categories.contains(&AlertCategory::Over));
    })
    .await;
}

#[tokio::test]
async fn test_crossing_is_reported_once_per_trajectory_segment() {
    test(|helper| async move {
        let mmsi = Mmsi::test_random();
        helper.add_position(mmsi, 9.8, 0).await;
        helper.tick().await;

        helper.add_position(mmsi, FAR, 10).await;
        let summary = helper.tick().await;
        assert_eq!(summary.crossings, 1);

        let summary = helper.tick().await;
        assert_eq!(summary.evaluated, 0);

        let alerts = helper.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::Crossing);
        assert_eq!(alerts[0].count, 1);
    })
    .await;
}

#[tokio::test]
async fn test_crossing_between_ticks_is_detected_on_any_leg() {
    test(|helper| async move {
        let mmsi = Mmsi::test_random();
        helper.add_position(mmsi, 9.8, 0).await;
        helper.tick().await;

        helper.add_position(mmsi, 10.2, 10).await;
        helper.add_position(mmsi, 10.3, 20).await;
        let summary = helper.tick().await;
        assert_eq!(summary.crossings, 1);

        helper.add_position(mmsi, 10.4, 30).await;
        let summary = helper.tick().await;
        assert_eq!(summary.evaluated, 1);
        assert_eq!(summary.crossings, 0);

        let alerts = helper.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::Crossing);
        assert_eq!(alerts[0].count, 1);
    })
    .await;
}

#[tokio::test]
async fn test_only_watched_features_are_classified() {
    test(|helper| async move {
        let mmsi = Mmsi::test_random();
        helper.add_position(mmsi, 12.2, 0).await;
        helper.tick().await;
        helper.add_position(mmsi, 12.005, 10).await;
        helper.tick().await;

        assert!(helper.alerts().await.is_empty());

        helper
            .adapter
            .set_watched_features(&[FeatureId::new("other-cable")])
            .await
            .unwrap();
        helper.add_position(mmsi, 12.2, 20).await;
        helper.tick().await;
        helper.add_position(mmsi, 12.005, 30).await;
        helper.tick().await;

        let alerts = helper.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::Over);
        assert!(alerts[0].message.contains("Other Cable"));
    })
    .await;
}

#[tokio::test]
async fn test_positions_outside_the_window_are_not_evaluated() {
    test(|helper| async move {
        let mut position = cablewatch_core::NewAisPosition::test_default(
            Mmsi::test_random(),
            OVER,
            57.5,
        );
        position.observed_at = Utc::now() - Duration::hours(2);
        helper.add(position).await;

        let summary = helper.tick().await;

        assert_eq!(summary.vessels, 0);
    })
    .await;
}

#[tokio::test]
async fn test_disregard_clears_the_alerts_of_a_vessel() {
    test(|helper| async move {
        let mmsi = Mmsi::test_random();
        let vessel_id = helper.add_position(mmsi, FAR, 0).await;
        helper.tick().await;
        helper.add_position(mmsi, APPROACH, 10).await;
        helper.tick().await;

        assert_eq!(helper.adapter.disregard_alerts(vessel_id).await.unwrap(), 1);
        assert!(helper.alerts().await.is_empty());
    })
    .await;
}
