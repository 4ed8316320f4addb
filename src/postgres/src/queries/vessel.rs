use cablewatch_core::{AisVessel, Mmsi, VesselDescriptor, VesselId};
use sqlx::PgExecutor;

use crate::{PostgresAdapter, error::Result, models::VesselRow};

impl PostgresAdapter {
    /// Conflicts on `mmsi` resolve to the existing row, so concurrent first sightings share
    /// one identity.
    pub(crate) async fn get_or_create_impl<'e, E>(
        &self,
        executor: E,
        mmsi: Mmsi,
    ) -> Result<VesselId>
    where
        E: PgExecutor<'e>,
    {
        let vessel_id: i64 = sqlx::query_scalar(
            r#"
INSERT INTO
    vessels (mmsi)
VALUES
    ($1)
ON CONFLICT (mmsi) DO UPDATE
SET
    mmsi = EXCLUDED.mmsi
RETURNING
    vessel_id
            "#,
        )
        .bind(mmsi.into_inner())
        .fetch_one(executor)
        .await?;

        Ok(VesselId::new(vessel_id))
    }

    pub(crate) async fn merge_descriptor_impl(
        &self,
        mmsi: Mmsi,
        incoming: VesselDescriptor,
    ) -> Result<VesselId> {
        let mut tx = self.pool.begin().await?;

        let vessel_id = self.get_or_create_impl(&mut *tx, mmsi).await?;

        let stored: VesselRow = sqlx::query_as(
            r#"
SELECT
    vessel_id,
    mmsi,
    "name",
    callsign,
    type_code,
    dimension_to_bow,
    dimension_to_stern,
    dimension_to_port,
    dimension_to_starboard
FROM
    vessels
WHERE
    vessel_id = $1
FOR UPDATE
            "#,
        )
        .bind(vessel_id.into_inner())
        .fetch_one(&mut *tx)
        .await?;

        let merged = stored.descriptor().merge(incoming);

        sqlx::query(
            r#"
UPDATE vessels
SET
    "name" = $2,
    callsign = $3,
    type_code = $4,
    dimension_to_bow = $5,
    dimension_to_stern = $6,
    dimension_to_port = $7,
    dimension_to_starboard = $8,
    updated_at = NOW()
WHERE
    vessel_id = $1
            "#,
        )
        .bind(vessel_id.into_inner())
        .bind(merged.name)
        .bind(merged.callsign)
        .bind(merged.type_code)
        .bind(merged.dimension_to_bow)
        .bind(merged.dimension_to_stern)
        .bind(merged.dimension_to_port)
        .bind(merged.dimension_to_starboard)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(vessel_id)
    }

    pub(crate) async fn vessels_impl(&self, mmsi: Option<Mmsi>) -> Result<Vec<AisVessel>> {
        let rows: Vec<VesselRow> = sqlx::query_as(
            r#"
SELECT
    vessel_id,
    mmsi,
    "name",
    callsign,
    type_code,
    dimension_to_bow,
    dimension_to_stern,
    dimension_to_port,
    dimension_to_starboard
FROM
    vessels
WHERE
    $1::INT IS NULL
    OR mmsi = $1
ORDER BY
    mmsi
            "#,
        )
        .bind(mmsi.map(Mmsi::into_inner))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AisVessel::try_from).collect()
    }
}
