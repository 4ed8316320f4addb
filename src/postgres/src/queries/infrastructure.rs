use std::collections::BTreeMap;

use cablewatch_core::{
    DecomposedFeature, DecomposedSegment, FeatureId, FeatureRecord, LineSegment, SegmentRecord,
    WatchedFeature,
};
use sqlx::types::Json;
use tracing::instrument;

use crate::{
    PostgresAdapter,
    error::Result,
    models::{FeatureRow, LineSegmentRow, SegmentRow},
};

impl PostgresAdapter {
    /// Replaces the feature's segments and their line segments in a single transaction,
    /// segments missing from `feature` are removed together with their line segments.
    #[instrument(skip_all, fields(app.feature_id = %feature.feature.id))]
    pub(crate) async fn import_feature_impl(&self, feature: DecomposedFeature) -> Result<()> {
        let DecomposedFeature {
            feature,
            segments,
            summary: _,
        } = feature;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
INSERT INTO
    infrastructure_features (feature_id, "name", color, watched)
VALUES
    ($1, $2, $3, $4)
ON CONFLICT (feature_id) DO UPDATE
SET
    "name" = EXCLUDED."name",
    color = EXCLUDED.color,
    watched = EXCLUDED.watched,
    updated_at = NOW()
            "#,
        )
        .bind(feature.id.as_str())
        .bind(&feature.name)
        .bind(&feature.color)
        .bind(feature.watched)
        .execute(&mut *tx)
        .await?;

        let indices: Vec<i32> = segments.iter().map(|s| s.segment.index as i32).collect();

        sqlx::query(
            r#"
DELETE FROM infrastructure_segments
WHERE
    feature_id = $1
    AND segment_index <> ALL ($2::INT[])
            "#,
        )
        .bind(feature.id.as_str())
        .bind(&indices)
        .execute(&mut *tx)
        .await?;

        for DecomposedSegment { segment, lines } in segments {
            let coordinates: Vec<[f64; 2]> =
                segment.coordinates.iter().map(|c| [c.x, c.y]).collect();

            sqlx::query(
                r#"
INSERT INTO
    infrastructure_segments (feature_id, segment_index, coordinates)
VALUES
    ($1, $2, $3)
ON CONFLICT (feature_id, segment_index) DO UPDATE
SET
    coordinates = EXCLUDED.coordinates
                "#,
            )
            .bind(feature.id.as_str())
            .bind(segment.index as i32)
            .bind(Json(coordinates))
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
DELETE FROM infrastructure_line_segments
WHERE
    feature_id = $1
    AND segment_index = $2
                "#,
            )
            .bind(feature.id.as_str())
            .bind(segment.index as i32)
            .execute(&mut *tx)
            .await?;

            let len = lines.len();
            let mut line_index = Vec::with_capacity(len);
            let mut start_longitude = Vec::with_capacity(len);
            let mut start_latitude = Vec::with_capacity(len);
            let mut end_longitude = Vec::with_capacity(len);
            let mut end_latitude = Vec::with_capacity(len);

            for l in lines {
                line_index.push(l.index as i32);
                start_longitude.push(l.line.start.x);
                start_latitude.push(l.line.start.y);
                end_longitude.push(l.line.end.x);
                end_latitude.push(l.line.end.y);
            }

            sqlx::query(
                r#"
INSERT INTO
    infrastructure_line_segments (
        feature_id,
        segment_index,
        line_index,
        start_longitude,
        start_latitude,
        end_longitude,
        end_latitude
    )
SELECT
    $1,
    $2,
    u.*
FROM
    UNNEST(
        $3::INT[],
        $4::DOUBLE PRECISION[],
        $5::DOUBLE PRECISION[],
        $6::DOUBLE PRECISION[],
        $7::DOUBLE PRECISION[]
    ) u
                "#,
            )
            .bind(feature.id.as_str())
            .bind(segment.index as i32)
            .bind(line_index)
            .bind(start_longitude)
            .bind(start_latitude)
            .bind(end_longitude)
            .bind(end_latitude)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    pub(crate) async fn set_watched_features_impl(&self, ids: &[FeatureId]) -> Result<()> {
        let ids: Vec<&str> = ids.iter().map(FeatureId::as_str).collect();

        sqlx::query(
            r#"
UPDATE infrastructure_features
SET
    watched = (feature_id = ANY ($1::TEXT[])),
    updated_at = NOW()
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub(crate) async fn watched_features_impl(&self) -> Result<Vec<WatchedFeature>> {
        let features: Vec<FeatureRow> = sqlx::query_as(
            r#"
SELECT
    feature_id,
    "name",
    color
FROM
    infrastructure_features
WHERE
    watched
ORDER BY
    feature_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let lines: Vec<LineSegmentRow> = sqlx::query_as(
            r#"
SELECT
    l.feature_id,
    l.segment_index,
    l.line_index,
    l.start_longitude,
    l.start_latitude,
    l.end_longitude,
    l.end_latitude
FROM
    infrastructure_line_segments l
    INNER JOIN infrastructure_features f ON f.feature_id = l.feature_id
WHERE
    f.watched
ORDER BY
    l.feature_id,
    l.segment_index,
    l.line_index
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut watched: BTreeMap<String, WatchedFeature> = features
            .into_iter()
            .map(|f| {
                (
                    f.feature_id.clone(),
                    WatchedFeature {
                        id: FeatureId::new(f.feature_id),
                        name: f.name,
                        lines: vec![],
                    },
                )
            })
            .collect();

        for l in lines {
            if let Some(f) = watched.get_mut(&l.feature_id) {
                f.lines.push(l.line());
            }
        }

        Ok(watched.into_values().collect())
    }

    pub(crate) async fn infrastructure_features_impl(&self) -> Result<Vec<FeatureRecord>> {
        let features: Vec<FeatureRow> = sqlx::query_as(
            r#"
SELECT
    feature_id,
    "name",
    color
FROM
    infrastructure_features
ORDER BY
    feature_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let segments: Vec<SegmentRow> = sqlx::query_as(
            r#"
SELECT
    feature_id,
    segment_index,
    coordinates
FROM
    infrastructure_segments
ORDER BY
    feature_id,
    segment_index
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records: BTreeMap<String, FeatureRecord> = features
            .into_iter()
            .map(|f| {
                (
                    f.feature_id.clone(),
                    FeatureRecord {
                        id: FeatureId::new(f.feature_id),
                        name: f.name,
                        color: f.color,
                        segments: vec![],
                    },
                )
            })
            .collect();

        for s in segments {
            if let Some(f) = records.get_mut(&s.feature_id) {
                f.segments.push(SegmentRecord::from(s));
            }
        }

        Ok(records.into_values().collect())
    }

    pub(crate) async fn line_segments_impl(
        &self,
        feature_id: &FeatureId,
    ) -> Result<Vec<LineSegment>> {
        let rows: Vec<LineSegmentRow> = sqlx::query_as(
            r#"
SELECT
    feature_id,
    segment_index,
    line_index,
    start_longitude,
    start_latitude,
    end_longitude,
    end_latitude
FROM
    infrastructure_line_segments
WHERE
    feature_id = $1
ORDER BY
    segment_index,
    line_index
            "#,
        )
        .bind(feature_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LineSegment::from).collect())
    }
}
