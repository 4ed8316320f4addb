use std::collections::BTreeMap;

use cablewatch_core::{AisPosition, NewPositionReport, VesselId, VesselTrack};
use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::{
    PostgresAdapter,
    error::Result,
    models::{PositionRow, TrackRow},
};

impl PostgresAdapter {
    /// Positions already stored for the same vessel and observation time are skipped.
    #[instrument(skip_all, fields(app.num_positions = positions.len()))]
    pub(crate) async fn add_positions_impl(
        &self,
        positions: Vec<NewPositionReport>,
    ) -> Result<u64> {
        let len = positions.len();
        let mut vessel_id = Vec::with_capacity(len);
        let mut longitude = Vec::with_capacity(len);
        let mut latitude = Vec::with_capacity(len);
        let mut speed_over_ground = Vec::with_capacity(len);
        let mut course_over_ground = Vec::with_capacity(len);
        let mut heading = Vec::with_capacity(len);
        let mut nav_status = Vec::with_capacity(len);
        let mut observed_at = Vec::with_capacity(len);

        for p in positions {
            vessel_id.push(p.vessel_id.into_inner());
            longitude.push(p.longitude);
            latitude.push(p.latitude);
            speed_over_ground.push(p.speed_over_ground);
            course_over_ground.push(p.course_over_ground);
            heading.push(p.heading);
            nav_status.push(p.nav_status);
            observed_at.push(p.observed_at);
        }

        let result = sqlx::query(
            r#"
INSERT INTO
    positions (
        vessel_id,
        longitude,
        latitude,
        speed_over_ground,
        course_over_ground,
        heading,
        nav_status,
        observed_at
    )
SELECT
    *
FROM
    UNNEST(
        $1::BIGINT[],
        $2::DOUBLE PRECISION[],
        $3::DOUBLE PRECISION[],
        $4::DOUBLE PRECISION[],
        $5::DOUBLE PRECISION[],
        $6::INT[],
        $7::INT[],
        $8::TIMESTAMPTZ[]
    )
ON CONFLICT (vessel_id, observed_at) DO NOTHING
            "#,
        )
        .bind(vessel_id)
        .bind(longitude)
        .bind(latitude)
        .bind(speed_over_ground)
        .bind(course_over_ground)
        .bind(heading)
        .bind(nav_status)
        .bind(observed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub(crate) async fn positions_impl(&self, vessel_id: VesselId) -> Result<Vec<AisPosition>> {
        let rows: Vec<PositionRow> = sqlx::query_as(
            r#"
SELECT
    p.vessel_id,
    v.mmsi,
    p.longitude,
    p.latitude,
    p.speed_over_ground,
    p.course_over_ground,
    p.heading,
    p.nav_status,
    p.observed_at
FROM
    positions p
    INNER JOIN vessels v ON v.vessel_id = p.vessel_id
WHERE
    p.vessel_id = $1
ORDER BY
    p.observed_at
            "#,
        )
        .bind(vessel_id.into_inner())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AisPosition::try_from).collect()
    }

    /// Per vessel, the positions inside the window that have not been evaluated yet,
    /// preceded by the last evaluated one.
    pub(crate) async fn vessel_tracks_impl(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<VesselTrack>> {
        let rows: Vec<TrackRow> = sqlx::query_as(
            r#"
WITH
    evaluated AS (
        SELECT
            s.vessel_id,
            MAX(p.observed_at) AS observed_at
        FROM
            vessel_zone_states s
            INNER JOIN positions p ON p.vessel_id = s.vessel_id
        WHERE
            p.observed_at >= $1
            AND p.observed_at <= s.last_position_at
        GROUP BY
            s.vessel_id
    )
SELECT
    p.vessel_id,
    v.mmsi,
    v."name",
    p.longitude,
    p.latitude,
    p.speed_over_ground,
    p.course_over_ground,
    p.heading,
    p.nav_status,
    p.observed_at
FROM
    positions p
    INNER JOIN vessels v ON v.vessel_id = p.vessel_id
    LEFT JOIN evaluated e ON e.vessel_id = p.vessel_id
WHERE
    p.observed_at >= COALESCE(e.observed_at, $1)
ORDER BY
    p.vessel_id,
    p.observed_at
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut tracks: BTreeMap<i64, (Option<String>, Vec<AisPosition>)> = BTreeMap::new();

        for row in rows {
            let TrackRow { position, name } = row;
            let position = AisPosition::try_from(position)?;

            let (track_name, positions) = tracks
                .entry(position.vessel_id.into_inner())
                .or_default();
            *track_name = name;
            positions.push(position);
        }

        Ok(tracks
            .into_values()
            .filter_map(|(name, positions)| VesselTrack::from_positions(name, positions))
            .collect())
    }
}
