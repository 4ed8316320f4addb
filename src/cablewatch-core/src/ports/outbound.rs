use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::*;

#[async_trait]
pub trait ProximityOutbound: Send + Sync {
    async fn watched_features(&self) -> CoreResult<Vec<WatchedFeature>>;
    /// Latest and previous position of every vessel with a position observed after
    /// `since`.
    async fn vessel_tracks(&self, since: DateTime<Utc>) -> CoreResult<Vec<VesselTrack>>;
    async fn zone_states(&self, vessel_ids: &[VesselId]) -> CoreResult<Vec<VesselZoneState>>;
}

#[async_trait]
pub trait DashboardOutbound: Send + Sync {
    async fn vessels(&self) -> CoreResult<Vec<AisVessel>>;
    async fn vessel(&self, mmsi: Mmsi) -> CoreResult<Option<AisVessel>>;
    /// Positions of a vessel ordered by observation time.
    async fn positions(&self, vessel_id: VesselId) -> CoreResult<Vec<AisPosition>>;
    async fn infrastructure_features(&self) -> CoreResult<Vec<FeatureRecord>>;
    async fn line_segments(&self, feature_id: &FeatureId) -> CoreResult<Vec<LineSegment>>;
    async fn alerts(&self) -> CoreResult<Vec<AlertEvent>>;
}
