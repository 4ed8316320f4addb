use cablewatch_core::{AlertEvent, TickUpdate, VesselId, VesselZoneState};
use tracing::instrument;

use crate::{
    PostgresAdapter,
    error::Result,
    models::{AlertEventRow, ZoneStateRow},
};

impl PostgresAdapter {
    /// Zone states and alert upserts of one tick are committed together or not at all.
    #[instrument(skip_all, fields(
        app.num_states = update.states.len(),
        app.num_alerts = update.alerts.len()
    ))]
    pub(crate) async fn commit_tick_impl(&self, update: TickUpdate) -> Result<()> {
        let TickUpdate { states, alerts } = update;

        let len = states.len();
        let mut vessel_id = Vec::with_capacity(len);
        let mut last_zone = Vec::with_capacity(len);
        let mut feature_id = Vec::with_capacity(len);
        let mut last_position_at = Vec::with_capacity(len);

        for s in states {
            vessel_id.push(s.vessel_id.into_inner());
            last_zone.push(s.last_zone.to_string());
            feature_id.push(s.feature_id.map(|f| f.into_inner()));
            last_position_at.push(s.last_position_at);
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
INSERT INTO
    vessel_zone_states (vessel_id, last_zone, feature_id, last_position_at)
SELECT
    *
FROM
    UNNEST(
        $1::BIGINT[],
        $2::TEXT[],
        $3::TEXT[],
        $4::TIMESTAMPTZ[]
    )
ON CONFLICT (vessel_id) DO UPDATE
SET
    last_zone = EXCLUDED.last_zone,
    feature_id = EXCLUDED.feature_id,
    last_position_at = EXCLUDED.last_position_at,
    updated_at = NOW()
            "#,
        )
        .bind(vessel_id)
        .bind(last_zone)
        .bind(feature_id)
        .bind(last_position_at)
        .execute(&mut *tx)
        .await?;

        for a in alerts {
            sqlx::query(
                r#"
INSERT INTO
    alert_events (
        vessel_id,
        category,
        message,
        count,
        first_seen,
        last_seen
    )
VALUES
    ($1, $2, $3, 1, $4, $4)
ON CONFLICT (vessel_id, category) DO UPDATE
SET
    count = alert_events.count + 1,
    message = EXCLUDED.message,
    last_seen = EXCLUDED.last_seen
                "#,
            )
            .bind(a.vessel_id.into_inner())
            .bind(a.category.to_string())
            .bind(a.message)
            .bind(a.observed_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    pub(crate) async fn disregard_alerts_impl(&self, vessel_id: VesselId) -> Result<u64> {
        let result = sqlx::query(
            r#"
DELETE FROM alert_events
WHERE
    vessel_id = $1
            "#,
        )
        .bind(vessel_id.into_inner())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub(crate) async fn zone_states_impl(
        &self,
        vessel_ids: &[VesselId],
    ) -> Result<Vec<VesselZoneState>> {
        let ids: Vec<i64> = vessel_ids.iter().map(|v| v.into_inner()).collect();

        let rows: Vec<ZoneStateRow> = sqlx::query_as(
            r#"
SELECT
    vessel_id,
    last_zone,
    feature_id,
    last_position_at
FROM
    vessel_zone_states
WHERE
    vessel_id = ANY ($1::BIGINT[])
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VesselZoneState::try_from).collect()
    }

    pub(crate) async fn alerts_impl(&self) -> Result<Vec<AlertEvent>> {
        let rows: Vec<AlertEventRow> = sqlx::query_as(
            r#"
SELECT
    vessel_id,
    category,
    message,
    count,
    first_seen,
    last_seen
FROM
    alert_events
ORDER BY
    last_seen DESC,
    vessel_id,
    category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AlertEvent::try_from).collect()
    }
}
