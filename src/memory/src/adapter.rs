use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use cablewatch_core::*;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

use crate::state::State;

#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    state: Arc<Mutex<State>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VesselRegistry for MemoryAdapter {
    async fn get_or_create(&self, mmsi: Mmsi) -> CoreResult<VesselId> {
        Ok(self.state.lock().await.get_or_create(mmsi))
    }

    async fn merge_descriptor(
        &self,
        mmsi: Mmsi,
        incoming: VesselDescriptor,
    ) -> CoreResult<VesselId> {
        let mut state = self.state.lock().await;
        let vessel_id = state.get_or_create(mmsi);

        if let Some(v) = state.vessels.get_mut(&mmsi) {
            v.descriptor = std::mem::take(&mut v.descriptor).merge(incoming);
        }

        Ok(vessel_id)
    }
}

#[async_trait]
impl PositionStore for MemoryAdapter {
    async fn add_positions(&self, positions: Vec<NewPositionReport>) -> CoreResult<u64> {
        let mut state = self.state.lock().await;
        let mut inserted = 0;

        for p in positions {
            let vessel = state.positions.entry(p.vessel_id).or_default();
            if let std::collections::btree_map::Entry::Vacant(e) = vessel.entry(p.observed_at) {
                e.insert(p);
                inserted += 1;
            }
        }

        Ok(inserted)
    }
}

#[async_trait]
impl InfrastructureInbound for MemoryAdapter {
    async fn import_feature(&self, feature: DecomposedFeature) -> CoreResult<()> {
        let DecomposedFeature {
            feature,
            segments,
            summary: _,
        } = feature;

        let mut state = self.state.lock().await;
        let id = feature.id.clone();

        state.features.insert(id.clone(), feature);

        let indices: HashSet<u32> = segments.iter().map(|s| s.segment.index).collect();
        let stale: Vec<u32> = state
            .segments
            .get(&id)
            .map(|s| s.keys().filter(|i| !indices.contains(i)).copied().collect())
            .unwrap_or_default();

        for index in stale {
            state.line_segments.remove(&(id.clone(), index));
            if let Some(s) = state.segments.get_mut(&id) {
                s.remove(&index);
            }
        }

        for DecomposedSegment { segment, lines } in segments {
            let index = segment.index;
            state
                .segments
                .entry(id.clone())
                .or_default()
                .insert(index, segment);
            state.line_segments.insert((id.clone(), index), lines);
        }

        Ok(())
    }

    async fn set_watched_features(&self, ids: &[FeatureId]) -> CoreResult<()> {
        let mut state = self.state.lock().await;

        for (id, feature) in state.features.iter_mut() {
            feature.watched = ids.contains(id);
        }

        Ok(())
    }
}

#[async_trait]
impl AlertInbound for MemoryAdapter {
    async fn commit_tick(&self, update: TickUpdate) -> CoreResult<()> {
        let TickUpdate { states, alerts } = update;
        let mut state = self.state.lock().await;

        for s in states {
            state.zone_states.insert(s.vessel_id, s);
        }

        for a in alerts {
            let key = (a.vessel_id, a.category);
            let existing = state.alerts.remove(&key);
            state.alerts.insert(key, AlertEvent::upsert(existing, a));
        }

        Ok(())
    }

    async fn disregard_alerts(&self, vessel_id: VesselId) -> CoreResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.alerts.len();

        state.alerts.retain(|(id, _), _| *id != vessel_id);

        Ok((before - state.alerts.len()) as u64)
    }
}

#[async_trait]
impl ProximityOutbound for MemoryAdapter {
    async fn watched_features(&self) -> CoreResult<Vec<WatchedFeature>> {
        let state = self.state.lock().await;

        Ok(state
            .features
            .values()
            .filter(|f| f.watched)
            .map(|f| WatchedFeature {
                id: f.id.clone(),
                name: f.name.clone(),
                lines: state
                    .line_segments
                    .range((f.id.clone(), 0)..=(f.id.clone(), u32::MAX))
                    .flat_map(|(_, lines)| lines.iter().map(|l| l.line))
                    .collect(),
            })
            .collect())
    }

    async fn vessel_tracks(&self, since: DateTime<Utc>) -> CoreResult<Vec<VesselTrack>> {
        let state = self.state.lock().await;

        let mut tracks: Vec<VesselTrack> = state
            .positions
            .iter()
            .filter_map(|(vessel_id, positions)| {
                let mut recent: Vec<AisPosition> = positions
                    .range(since..)
                    .filter_map(|(_, p)| state.position(p))
                    .collect();

                let evaluated_at = state
                    .zone_states
                    .get(vessel_id)
                    .and_then(|s| s.last_position_at);
                if let Some(evaluated_at) = evaluated_at {
                    let start = recent
                        .iter()
                        .rposition(|p| p.observed_at <= evaluated_at)
                        .unwrap_or(0);
                    recent.drain(..start);
                }

                let name = recent
                    .last()
                    .and_then(|p| state.vessels.get(&p.mmsi))
                    .and_then(|v| v.descriptor.name.clone());

                VesselTrack::from_positions(name, recent)
            })
            .collect();

        tracks.sort_by_key(|t| t.vessel_id);

        Ok(tracks)
    }

    async fn zone_states(&self, vessel_ids: &[VesselId]) -> CoreResult<Vec<VesselZoneState>> {
        let state = self.state.lock().await;

        Ok(vessel_ids
            .iter()
            .filter_map(|id| state.zone_states.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl DashboardOutbound for MemoryAdapter {
    async fn vessels(&self) -> CoreResult<Vec<AisVessel>> {
        let state = self.state.lock().await;

        Ok(state
            .vessels
            .iter()
            .map(|(mmsi, v)| v.to_vessel(*mmsi))
            .collect())
    }

    async fn vessel(&self, mmsi: Mmsi) -> CoreResult<Option<AisVessel>> {
        let state = self.state.lock().await;

        Ok(state.vessels.get(&mmsi).map(|v| v.to_vessel(mmsi)))
    }

    async fn positions(&self, vessel_id: VesselId) -> CoreResult<Vec<AisPosition>> {
        let state = self.state.lock().await;

        Ok(state
            .positions
            .get(&vessel_id)
            .map(|p| p.values().filter_map(|p| state.position(p)).collect())
            .unwrap_or_default())
    }

    async fn infrastructure_features(&self) -> CoreResult<Vec<FeatureRecord>> {
        let state = self.state.lock().await;

        Ok(state
            .features
            .values()
            .map(|f| FeatureRecord {
                id: f.id.clone(),
                name: f.name.clone(),
                color: f.color.clone(),
                segments: state
                    .segments
                    .get(&f.id)
                    .map(|s| s.values().map(SegmentRecord::from).collect())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn line_segments(&self, feature_id: &FeatureId) -> CoreResult<Vec<LineSegment>> {
        let state = self.state.lock().await;

        Ok(state
            .line_segments
            .range((feature_id.clone(), 0)..=(feature_id.clone(), u32::MAX))
            .flat_map(|(_, lines)| lines.iter().cloned())
            .collect())
    }

    async fn alerts(&self) -> CoreResult<Vec<AlertEvent>> {
        let state = self.state.lock().await;

        let mut alerts: Vec<AlertEvent> = state.alerts.values().cloned().collect();
        alerts.sort_by(|a, b| {
            b.last_seen
                .cmp(&a.last_seen)
                .then_with(|| a.vessel_id.cmp(&b.vessel_id))
                .then_with(|| a.category.cmp(&b.category))
        });

        Ok(alerts)
    }
}

#[async_trait]
impl StorageLifecycle for MemoryAdapter {
    async fn close(&self) {
        info!("closing in-memory storage");
    }
}
