use cablewatch_core::{
    AisPosition, AisVessel, AlertCategory, AlertEvent, FeatureId, LineSegment, Mmsi,
    SegmentRecord, VesselDescriptor, VesselId, VesselZoneState, Zone,
};
use chrono::{DateTime, Utc};
use geo::{Line, coord};
use sqlx::{FromRow, types::Json};

use crate::error::Error;

#[derive(Debug, FromRow)]
pub struct VesselRow {
    pub vessel_id: i64,
    pub mmsi: i32,
    pub name: Option<String>,
    pub callsign: Option<String>,
    pub type_code: Option<i32>,
    pub dimension_to_bow: Option<i32>,
    pub dimension_to_stern: Option<i32>,
    pub dimension_to_port: Option<i32>,
    pub dimension_to_starboard: Option<i32>,
}

#[derive(Debug, FromRow)]
pub struct PositionRow {
    pub vessel_id: i64,
    pub mmsi: i32,
    pub longitude: f64,
    pub latitude: f64,
    pub speed_over_ground: Option<f64>,
    pub course_over_ground: Option<f64>,
    pub heading: Option<i32>,
    pub nav_status: Option<i32>,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct TrackRow {
    #[sqlx(flatten)]
    pub position: PositionRow,
    pub name: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct FeatureRow {
    pub feature_id: String,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct SegmentRow {
    pub feature_id: String,
    pub segment_index: i32,
    pub coordinates: Json<Vec<[f64; 2]>>,
}

#[derive(Debug, FromRow)]
pub struct LineSegmentRow {
    pub feature_id: String,
    pub segment_index: i32,
    pub line_index: i32,
    pub start_longitude: f64,
    pub start_latitude: f64,
    pub end_longitude: f64,
    pub end_latitude: f64,
}

#[derive(Debug, FromRow)]
pub struct ZoneStateRow {
    pub vessel_id: i64,
    pub last_zone: String,
    pub feature_id: Option<String>,
    pub last_position_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
pub struct AlertEventRow {
    pub vessel_id: i64,
    pub category: String,
    pub message: String,
    pub count: i32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl VesselRow {
    pub fn descriptor(&self) -> VesselDescriptor {
        VesselDescriptor {
            name: self.name.clone(),
            callsign: self.callsign.clone(),
            type_code: self.type_code,
            dimension_to_bow: self.dimension_to_bow,
            dimension_to_stern: self.dimension_to_stern,
            dimension_to_port: self.dimension_to_port,
            dimension_to_starboard: self.dimension_to_starboard,
        }
    }
}

impl TryFrom<VesselRow> for AisVessel {
    type Error = Error;

    fn try_from(value: VesselRow) -> Result<Self, Self::Error> {
        Ok(AisVessel {
            vessel_id: VesselId::new(value.vessel_id),
            mmsi: Mmsi::try_from(value.mmsi as i64)?,
            descriptor: value.descriptor(),
        })
    }
}

impl TryFrom<PositionRow> for AisPosition {
    type Error = Error;

    fn try_from(value: PositionRow) -> Result<Self, Self::Error> {
        let PositionRow {
            vessel_id,
            mmsi,
            longitude,
            latitude,
            speed_over_ground,
            course_over_ground,
            heading,
            nav_status,
            observed_at,
        } = value;

        Ok(AisPosition {
            vessel_id: VesselId::new(vessel_id),
            mmsi: Mmsi::try_from(mmsi as i64)?,
            longitude,
            latitude,
            speed_over_ground,
            course_over_ground,
            heading,
            nav_status,
            observed_at,
        })
    }
}

impl From<SegmentRow> for SegmentRecord {
    fn from(value: SegmentRow) -> Self {
        SegmentRecord {
            index: value.segment_index as u32,
            coordinates: value.coordinates.0,
        }
    }
}

impl LineSegmentRow {
    pub fn line(&self) -> Line<f64> {
        Line::new(
            coord! { x: self.start_longitude, y: self.start_latitude },
            coord! { x: self.end_longitude, y: self.end_latitude },
        )
    }
}

impl From<LineSegmentRow> for LineSegment {
    fn from(value: LineSegmentRow) -> Self {
        LineSegment {
            line: value.line(),
            feature_id: FeatureId::new(value.feature_id),
            segment_index: value.segment_index as u32,
            index: value.line_index as u32,
        }
    }
}

impl TryFrom<ZoneStateRow> for VesselZoneState {
    type Error = Error;

    fn try_from(value: ZoneStateRow) -> Result<Self, Self::Error> {
        Ok(VesselZoneState {
            vessel_id: VesselId::new(value.vessel_id),
            last_zone: Zone::parse(&value.last_zone)?,
            feature_id: value.feature_id.map(FeatureId::new),
            last_position_at: value.last_position_at,
        })
    }
}

impl TryFrom<AlertEventRow> for AlertEvent {
    type Error = Error;

    fn try_from(value: AlertEventRow) -> Result<Self, Self::Error> {
        Ok(AlertEvent {
            vessel_id: VesselId::new(value.vessel_id),
            category: AlertCategory::parse(&value.category)?,
            message: value.message,
            count: value.count,
            first_seen: value.first_seen,
            last_seen: value.last_seen,
        })
    }
}
