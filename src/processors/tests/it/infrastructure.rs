use std::path::Path;

use cablewatch_core::{DashboardOutbound, FeatureId, ProximityOutbound};
use serde_json::json;

use crate::helper::{TestHelper, cable_collection, test, test_settings};

#[tokio::test]
async fn test_sample_dataset_is_imported() {
    let helper = TestHelper::new(&test_settings());

    let summary = helper
        .app
        .importer()
        .import_file(Path::new("data/infrastructure.geojson"))
        .await
        .unwrap();

    assert_eq!(summary.features, 3);
    assert_eq!(summary.segments, 4);
    assert_eq!(summary.line_segments, 9);
    assert_eq!(summary.invalid_segments, 0);

    let watched = helper.adapter.watched_features().await.unwrap();
    assert_eq!(watched.len(), 2);
}

#[tokio::test]
async fn test_reimport_does_not_duplicate_line_segments() {
    test(|helper| async move {
        helper.import(&cable_collection()).await;
        helper.import(&cable_collection()).await;

        let lines = helper
            .adapter
            .line_segments(&FeatureId::new("test-cable"))
            .await
            .unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(helper.adapter.infrastructure_features().await.unwrap().len(), 2);
    })
    .await;
}

#[tokio::test]
async fn test_degenerate_geometry_is_counted_and_skipped() {
    let helper = TestHelper::new(&test_settings());

    let summary = helper
        .import(&json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "id": "broken", "name": "Broken", "watched": true },
                "geometry": {
                    "type": "MultiLineString",
                    "coordinates": [
                        [[10.0, 57.0]],
                        [[10.0, 57.0], [10.0, 57.0], [10.0, 57.5]]
                    ]
                }
            }]
        }))
        .await;

    assert_eq!(summary.invalid_segments, 1);
    assert_eq!(summary.segments, 1);
    assert_eq!(summary.degenerate_lines, 1);
    assert_eq!(summary.line_segments, 1);

    let features = helper.adapter.infrastructure_features().await.unwrap();
    assert_eq!(features[0].segments.len(), 1);
    assert_eq!(features[0].segments[0].index, 1);
}

#[tokio::test]
async fn test_app_run_imports_and_applies_watched_override() {
    let mut settings = test_settings();
    settings.infrastructure_path = Some("data/infrastructure.geojson".into());
    settings.watched_features = vec![FeatureId::new("kattegat-north")];

    let helper = TestHelper::new(&settings);
    let adapter = helper.adapter.clone();

    helper
        .app
        .run(tokio_util::sync::CancellationToken::new())
        .await
        .unwrap();

    let watched = adapter.watched_features().await.unwrap();
    assert_eq!(watched.len(), 1);
    assert_eq!(watched[0].id, FeatureId::new("kattegat-north"));
    assert_eq!(watched[0].lines.len(), 2);
}
