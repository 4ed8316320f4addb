mod inbound;
mod outbound;

pub use inbound::*;
pub use outbound::*;

/// Everything the ingestion binary needs from storage.
pub trait AisIngestion: VesselRegistry + PositionStore + StorageLifecycle + 'static {}

impl<T> AisIngestion for T where T: VesselRegistry + PositionStore + StorageLifecycle + 'static {}

/// Everything the processing binary needs from storage.
pub trait ProcessorStorage:
    InfrastructureInbound + AlertInbound + ProximityOutbound + StorageLifecycle + 'static
{
}

impl<T> ProcessorStorage for T where
    T: InfrastructureInbound + AlertInbound + ProximityOutbound + StorageLifecycle + 'static
{
}
