use std::collections::{BTreeMap, HashMap};

use cablewatch_core::{
    AisPosition, AisVessel, AlertCategory, AlertEvent, FeatureId, InfrastructureFeature,
    LineSegment, Mmsi, NewPositionReport, Segment, VesselDescriptor, VesselId, VesselZoneState,
};
use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
pub(crate) struct State {
    next_vessel_id: i64,
    pub(crate) vessels: BTreeMap<Mmsi, StoredVessel>,
    pub(crate) mmsis: HashMap<VesselId, Mmsi>,
    pub(crate) positions: HashMap<VesselId, BTreeMap<DateTime<Utc>, NewPositionReport>>,
    pub(crate) features: BTreeMap<FeatureId, InfrastructureFeature>,
    pub(crate) segments: BTreeMap<FeatureId, BTreeMap<u32, Segment>>,
    pub(crate) line_segments: BTreeMap<(FeatureId, u32), Vec<LineSegment>>,
    pub(crate) zone_states: HashMap<VesselId, VesselZoneState>,
    pub(crate) alerts: HashMap<(VesselId, AlertCategory), AlertEvent>,
}

#[derive(Debug, Clone)]
pub(crate) struct StoredVessel {
    pub vessel_id: VesselId,
    pub descriptor: VesselDescriptor,
}

impl State {
    pub(crate) fn get_or_create(&mut self, mmsi: Mmsi) -> VesselId {
        if let Some(v) = self.vessels.get(&mmsi) {
            return v.vessel_id;
        }

        self.next_vessel_id += 1;
        let vessel_id = VesselId::new(self.next_vessel_id);

        self.vessels.insert(
            mmsi,
            StoredVessel {
                vessel_id,
                descriptor: VesselDescriptor::default(),
            },
        );
        self.mmsis.insert(vessel_id, mmsi);

        vessel_id
    }

    pub(crate) fn position(&self, report: &NewPositionReport) -> Option<AisPosition> {
        let mmsi = *self.mmsis.get(&report.vessel_id)?;

        Some(AisPosition {
            vessel_id: report.vessel_id,
            mmsi,
            longitude: report.longitude,
            latitude: report.latitude,
            speed_over_ground: report.speed_over_ground,
            course_over_ground: report.course_over_ground,
            heading: report.heading,
            nav_status: report.nav_status,
            observed_at: report.observed_at,
        })
    }
}

impl StoredVessel {
    pub(crate) fn to_vessel(&self, mmsi: Mmsi) -> AisVessel {
        AisVessel {
            vessel_id: self.vessel_id,
            mmsi,
            descriptor: self.descriptor.clone(),
        }
    }
}
