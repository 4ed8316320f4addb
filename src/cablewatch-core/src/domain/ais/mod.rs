use std::fmt::Display;

use chrono::{DateTime, Utc};
use geo::{Coord, Line};
use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::{CoreResult, error::error::InvalidMmsiSnafu};

/// Largest value a nine digit radio identifier can take.
pub const MAX_MMSI: i64 = 999_999_999;

/// AIS "heading not available" marker.
pub const HEADING_NOT_AVAILABLE: i32 = 511;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct Mmsi(i32);

/// Opaque, stable identifier assigned by the vessel registry on first sighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct VesselId(i64);

/// Identity and descriptor fields of a vessel, every field is optional as static reports
/// frequently omit some of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct VesselDescriptor {
    pub name: Option<String>,
    pub callsign: Option<String>,
    pub type_code: Option<i32>,
    pub dimension_to_bow: Option<i32>,
    pub dimension_to_stern: Option<i32>,
    pub dimension_to_port: Option<i32>,
    pub dimension_to_starboard: Option<i32>,
}

/// A normalized dynamic report, only constructed when both coordinates resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAisPosition {
    pub mmsi: Mmsi,
    pub longitude: f64,
    pub latitude: f64,
    pub speed_over_ground: Option<f64>,
    pub course_over_ground: Option<f64>,
    pub heading: Option<i32>,
    pub nav_status: Option<i32>,
    pub observed_at: DateTime<Utc>,
    pub name_hint: Option<String>,
}

/// A normalized static report.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVesselDescriptor {
    pub mmsi: Mmsi,
    pub observed_at: DateTime<Utc>,
    pub descriptor: VesselDescriptor,
}

/// A position report bound to a registry identity, ready to be appended to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPositionReport {
    pub vessel_id: VesselId,
    pub longitude: f64,
    pub latitude: f64,
    pub speed_over_ground: Option<f64>,
    pub course_over_ground: Option<f64>,
    pub heading: Option<i32>,
    pub nav_status: Option<i32>,
    pub observed_at: DateTime<Utc>,
}

/// Canonical stored position as consumed by the dashboard layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AisPosition {
    pub vessel_id: VesselId,
    pub mmsi: Mmsi,
    pub longitude: f64,
    pub latitude: f64,
    pub speed_over_ground: Option<f64>,
    pub course_over_ground: Option<f64>,
    pub heading: Option<i32>,
    pub nav_status: Option<i32>,
    pub observed_at: DateTime<Utc>,
}

/// Canonical vessel descriptor record, `descriptor.name` is the last known name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AisVessel {
    pub vessel_id: VesselId,
    pub mmsi: Mmsi,
    #[serde(flatten)]
    pub descriptor: VesselDescriptor,
}

/// The positions of a vessel inside the processing window that a tick has not yet
/// evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselTrack {
    pub vessel_id: VesselId,
    pub mmsi: Mmsi,
    pub name: Option<String>,
    pub latest: AisPosition,
    /// Positions preceding `latest` in observation order. Starts at the last position an
    /// earlier tick evaluated when that position is still inside the window.
    pub trail: Vec<AisPosition>,
}

/// A batch of normalized reports handed from the consumer to the ingestion workers.
#[derive(Debug, Clone, Default)]
pub struct DataMessage {
    pub positions: Vec<NewAisPosition>,
    pub descriptors: Vec<NewVesselDescriptor>,
}

impl VesselDescriptor {
    /// Field-wise coalesce: an incoming value replaces the stored one only when present.
    pub fn merge(self, incoming: VesselDescriptor) -> VesselDescriptor {
        let VesselDescriptor {
            name,
            callsign,
            type_code,
            dimension_to_bow,
            dimension_to_stern,
            dimension_to_port,
            dimension_to_starboard,
        } = incoming;

        VesselDescriptor {
            name: name.or(self.name),
            callsign: callsign.or(self.callsign),
            type_code: type_code.or(self.type_code),
            dimension_to_bow: dimension_to_bow.or(self.dimension_to_bow),
            dimension_to_stern: dimension_to_stern.or(self.dimension_to_stern),
            dimension_to_port: dimension_to_port.or(self.dimension_to_port),
            dimension_to_starboard: dimension_to_starboard.or(self.dimension_to_starboard),
        }
    }

    pub fn with_name(name: String) -> VesselDescriptor {
        VesselDescriptor {
            name: Some(name),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == VesselDescriptor::default()
    }
}

impl NewAisPosition {
    pub fn into_report(self, vessel_id: VesselId) -> NewPositionReport {
        let NewAisPosition {
            mmsi: _,
            longitude,
            latitude,
            speed_over_ground,
            course_over_ground,
            heading,
            nav_status,
            observed_at,
            name_hint: _,
        } = self;

        NewPositionReport {
            vessel_id,
            longitude,
            latitude,
            speed_over_ground,
            course_over_ground,
            heading,
            nav_status,
            observed_at,
        }
    }
}

impl AisPosition {
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

impl VesselTrack {
    /// Builds a track from positions in observation order, `None` when empty.
    pub fn from_positions(name: Option<String>, mut positions: Vec<AisPosition>) -> Option<Self> {
        let latest = positions.pop()?;

        Some(Self {
            vessel_id: latest.vessel_id,
            mmsi: latest.mmsi,
            name,
            latest,
            trail: positions,
        })
    }

    /// Consecutive trajectory legs ending at `latest`, oldest first, together with the
    /// observation time of each leg's end.
    pub fn legs(&self) -> impl Iterator<Item = (Line<f64>, DateTime<Utc>)> + '_ {
        let points = || self.trail.iter().chain(std::iter::once(&self.latest));

        points()
            .zip(points().skip(1))
            .map(|(from, to)| (Line::new(from.coord(), to.coord()), to.observed_at))
    }
}

impl DataMessage {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.descriptors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len() + self.descriptors.len()
    }
}

impl Mmsi {
    pub fn into_inner(self) -> i32 {
        self.0
    }
}

impl TryFrom<i64> for Mmsi {
    type Error = crate::Error;

    fn try_from(value: i64) -> CoreResult<Self> {
        ensure!((1..=MAX_MMSI).contains(&value), InvalidMmsiSnafu { value });
        Ok(Self(value as i32))
    }
}

impl From<Mmsi> for i32 {
    fn from(value: Mmsi) -> Self {
        value.0
    }
}

impl Display for Mmsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl VesselId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl Display for VesselId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(feature = "test")]
mod test {
    use rand::Rng;

    use super::*;

    impl Mmsi {
        pub fn test_new(mmsi: i32) -> Self {
            Self(mmsi)
        }

        pub fn test_random() -> Self {
            Self(rand::rng().random_range(100_000_000..=MAX_MMSI as i32))
        }
    }

    impl NewAisPosition {
        pub fn test_default(mmsi: Mmsi, longitude: f64, latitude: f64) -> NewAisPosition {
            NewAisPosition {
                mmsi,
                longitude,
                latitude,
                speed_over_ground: Some(8.4),
                course_over_ground: Some(123.3),
                heading: Some(120),
                nav_status: Some(0),
                observed_at: Utc::now(),
                name_hint: None,
            }
        }
    }

    impl VesselDescriptor {
        pub fn test_default() -> VesselDescriptor {
            VesselDescriptor {
                name: Some("NORDIC STAR".to_string()),
                callsign: Some("LK45".to_string()),
                type_code: Some(70),
                dimension_to_bow: Some(120),
                dimension_to_stern: Some(30),
                dimension_to_port: Some(10),
                dimension_to_starboard: Some(12),
            }
        }
    }
}
