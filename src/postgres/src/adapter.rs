use async_trait::async_trait;
use cablewatch_core::*;
use chrono::{DateTime, Utc};
use snafu::ResultExt;
use sqlx::{
    ConnectOptions, PgPool,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use tracing::info;

use crate::error::{
    Result,
    error::{ConnectionSnafu, MigrateSnafu},
};

#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    pub(crate) pool: PgPool,
}

impl PostgresAdapter {
    pub async fn new(settings: &PsqlSettings) -> Result<PostgresAdapter> {
        let mut opts = PgConnectOptions::new()
            .username(&settings.username)
            .host(&settings.ip)
            .port(settings.port)
            .options([("plan_cache_mode", "force_custom_plan")]);

        if let Some(password) = &settings.password {
            opts = opts.password(password);
        }

        if let Some(db_name) = &settings.db_name {
            opts = opts.database(db_name);
        }

        if let Some(application_name) = &settings.application_name {
            opts = opts.application_name(application_name);
        }

        if let Some(root_cert_path) = &settings.root_cert {
            opts = opts
                .ssl_root_cert(root_cert_path)
                .ssl_mode(PgSslMode::VerifyFull);
        }

        match settings.log_statements {
            PsqlLogStatements::Enable => (),
            PsqlLogStatements::Disable => {
                opts = opts.disable_statement_logging();
            }
        }

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .connect_with(opts)
            .await
            .context(ConnectionSnafu)?;

        Ok(PostgresAdapter { pool })
    }

    pub async fn do_migrations(&self) -> Result<()> {
        sqlx::migrate!()
            .set_ignore_missing(true)
            .run(&self.pool)
            .await
            .context(MigrateSnafu)
    }
}

#[async_trait]
impl VesselRegistry for PostgresAdapter {
    async fn get_or_create(&self, mmsi: Mmsi) -> CoreResult<VesselId> {
        Ok(self.get_or_create_impl(&self.pool, mmsi).await?)
    }

    async fn merge_descriptor(
        &self,
        mmsi: Mmsi,
        incoming: VesselDescriptor,
    ) -> CoreResult<VesselId> {
        Ok(self.merge_descriptor_impl(mmsi, incoming).await?)
    }
}

#[async_trait]
impl PositionStore for PostgresAdapter {
    async fn add_positions(&self, positions: Vec<NewPositionReport>) -> CoreResult<u64> {
        Ok(self.add_positions_impl(positions).await?)
    }
}

#[async_trait]
impl InfrastructureInbound for PostgresAdapter {
    async fn import_feature(&self, feature: DecomposedFeature) -> CoreResult<()> {
        Ok(self.import_feature_impl(feature).await?)
    }

    async fn set_watched_features(&self, ids: &[FeatureId]) -> CoreResult<()> {
        Ok(self.set_watched_features_impl(ids).await?)
    }
}

#[async_trait]
impl AlertInbound for PostgresAdapter {
    async fn commit_tick(&self, update: TickUpdate) -> CoreResult<()> {
        Ok(self.commit_tick_impl(update).await?)
    }

    async fn disregard_alerts(&self, vessel_id: VesselId) -> CoreResult<u64> {
        Ok(self.disregard_alerts_impl(vessel_id).await?)
    }
}

#[async_trait]
impl ProximityOutbound for PostgresAdapter {
    async fn watched_features(&self) -> CoreResult<Vec<WatchedFeature>> {
        Ok(self.watched_features_impl().await?)
    }

    async fn vessel_tracks(&self, since: DateTime<Utc>) -> CoreResult<Vec<VesselTrack>> {
        Ok(self.vessel_tracks_impl(since).await?)
    }

    async fn zone_states(&self, vessel_ids: &[VesselId]) -> CoreResult<Vec<VesselZoneState>> {
        Ok(self.zone_states_impl(vessel_ids).await?)
    }
}

#[async_trait]
impl DashboardOutbound for PostgresAdapter {
    async fn vessels(&self) -> CoreResult<Vec<AisVessel>> {
        Ok(self.vessels_impl(None).await?)
    }

    async fn vessel(&self, mmsi: Mmsi) -> CoreResult<Option<AisVessel>> {
        Ok(self.vessels_impl(Some(mmsi)).await?.pop())
    }

    async fn positions(&self, vessel_id: VesselId) -> CoreResult<Vec<AisPosition>> {
        Ok(self.positions_impl(vessel_id).await?)
    }

    async fn infrastructure_features(&self) -> CoreResult<Vec<FeatureRecord>> {
        Ok(self.infrastructure_features_impl().await?)
    }

    async fn line_segments(&self, feature_id: &FeatureId) -> CoreResult<Vec<LineSegment>> {
        Ok(self.line_segments_impl(feature_id).await?)
    }

    async fn alerts(&self) -> CoreResult<Vec<AlertEvent>> {
        Ok(self.alerts_impl().await?)
    }
}

#[async_trait]
impl StorageLifecycle for PostgresAdapter {
    async fn close(&self) {
        info!("closing postgres pool");
        self.pool.close().await;
    }
}
