use std::{collections::HashMap, sync::Arc};

use async_channel::Receiver;
use cablewatch_core::{
    AisIngestion, DataMessage, Mmsi, NewPositionReport, VesselDescriptor, VesselId, retry,
};
use tracing::{error, instrument};

use crate::error::Result;

/// Applies normalized batches to the vessel registry and position store.
pub struct IngestWorker {
    adapter: Arc<dyn AisIngestion>,
    receiver: Receiver<DataMessage>,
}

impl IngestWorker {
    pub fn new(adapter: Arc<dyn AisIngestion>, receiver: Receiver<DataMessage>) -> Self {
        Self { adapter, receiver }
    }

    /// Runs until the channel is closed and drained.
    pub async fn run(self) {
        while let Ok(message) = self.receiver.recv().await {
            if let Err(e) = self.process(message).await {
                error!("failed to ingest batch: {e:?}");
            }
        }
    }

    #[instrument(skip_all, fields(app.num_positions, app.num_descriptors))]
    pub async fn process(&self, message: DataMessage) -> Result<()> {
        let DataMessage {
            positions,
            descriptors,
        } = message;

        let span = tracing::Span::current();
        span.record("app.num_positions", positions.len());
        span.record("app.num_descriptors", descriptors.len());

        let mut vessel_ids: HashMap<Mmsi, VesselId> = HashMap::new();

        for d in descriptors {
            match self.merge(d.mmsi, d.descriptor).await {
                Ok(id) => {
                    vessel_ids.insert(d.mmsi, id);
                }
                Err(e) => error!("failed to merge descriptor of {}: {e:?}", d.mmsi),
            }
        }

        let mut reports: Vec<NewPositionReport> = Vec::with_capacity(positions.len());

        for mut p in positions {
            let vessel_id = match (p.name_hint.take(), vessel_ids.get(&p.mmsi)) {
                (Some(name), _) => self.merge(p.mmsi, VesselDescriptor::with_name(name)).await,
                (None, Some(id)) => Ok(*id),
                (None, None) => self.get_or_create(p.mmsi).await,
            };

            match vessel_id {
                Ok(id) => {
                    vessel_ids.insert(p.mmsi, id);
                    reports.push(p.into_report(id));
                }
                Err(e) => error!("failed to resolve vessel {}: {e:?}", p.mmsi),
            }
        }

        if !reports.is_empty() {
            retry(|| self.adapter.add_positions(reports.clone())).await?;
        }

        Ok(())
    }

    async fn merge(&self, mmsi: Mmsi, descriptor: VesselDescriptor) -> Result<VesselId> {
        Ok(retry(|| self.adapter.merge_descriptor(mmsi, descriptor.clone())).await?)
    }

    async fn get_or_create(&self, mmsi: Mmsi) -> Result<VesselId> {
        Ok(retry(|| self.adapter.get_or_create(mmsi)).await?)
    }
}
