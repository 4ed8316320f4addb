use async_trait::async_trait;

use crate::*;

#[async_trait]
pub trait VesselRegistry: Send + Sync {
    /// Returns the identity of `mmsi`, creating it on first sighting. Concurrent first
    /// sightings of the same mmsi resolve to a single identity.
    async fn get_or_create(&self, mmsi: Mmsi) -> CoreResult<VesselId>;
    /// Coalesces `incoming` into the stored descriptor of `mmsi`, creating the vessel if
    /// needed.
    async fn merge_descriptor(
        &self,
        mmsi: Mmsi,
        incoming: VesselDescriptor,
    ) -> CoreResult<VesselId>;
}

#[async_trait]
pub trait PositionStore: Send + Sync {
    async fn add_positions(&self, positions: Vec<NewPositionReport>) -> CoreResult<u64>;
}

#[async_trait]
pub trait InfrastructureInbound: Send + Sync {
    /// Upserts the feature and replaces all of its segments and line segments.
    async fn import_feature(&self, feature: DecomposedFeature) -> CoreResult<()>;
    /// Marks exactly the given features as watched.
    async fn set_watched_features(&self, ids: &[FeatureId]) -> CoreResult<()>;
}

#[async_trait]
pub trait AlertInbound: Send + Sync {
    async fn commit_tick(&self, update: TickUpdate) -> CoreResult<()>;
    /// Removes every alert of the vessel, returning the number of removed alerts.
    async fn disregard_alerts(&self, vessel_id: VesselId) -> CoreResult<u64>;
}

#[async_trait]
pub trait StorageLifecycle: Send + Sync {
    async fn close(&self);
}
