use cablewatch_core::{
    HEADING_NOT_AVAILABLE, Mmsi, NewAisPosition, NewVesselDescriptor, VesselDescriptor,
};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::*;

/// Result of normalizing a single inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Position(NewAisPosition),
    Descriptor(NewVesselDescriptor),
    /// Message type outside the known allow-lists.
    Ignored,
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Unparseable envelope, missing discriminator or missing/invalid mmsi.
    Malformed,
    /// Dynamic report without a resolvable latitude or longitude.
    MissingCoordinates,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MessageNormalizer;

impl MessageNormalizer {
    /// `received_at` is used as the observation time when the envelope carries no usable
    /// timestamp.
    pub fn normalize(&self, line: &str, received_at: DateTime<Utc>) -> Normalized {
        let Ok(root) = serde_json::from_str::<Value>(line) else {
            return Normalized::Dropped(DropReason::Malformed);
        };
        let Some(report) = Report::from_root(&root) else {
            return Normalized::Dropped(DropReason::Malformed);
        };
        let Some(kind) = report.discriminator.kind() else {
            return Normalized::Ignored;
        };
        let Some(mmsi) = resolve(&report, MMSI).and_then(|v| Mmsi::try_from(v).ok()) else {
            return Normalized::Dropped(DropReason::Malformed);
        };

        let observed_at = resolve(&report, OBSERVED_AT).unwrap_or(received_at);

        match kind {
            ReportKind::Dynamic => self.position(&report, mmsi, observed_at),
            ReportKind::Static => Normalized::Descriptor(NewVesselDescriptor {
                mmsi,
                observed_at,
                descriptor: descriptor(&report),
            }),
        }
    }

    fn position(
        &self,
        report: &Report<'_>,
        mmsi: Mmsi,
        observed_at: DateTime<Utc>,
    ) -> Normalized {
        let latitude = resolve_valid(report, LATITUDE, |v| v.abs() <= 90.0);
        let longitude = resolve_valid(report, LONGITUDE, |v| v.abs() <= 180.0);

        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Normalized::Dropped(DropReason::MissingCoordinates);
        };

        Normalized::Position(NewAisPosition {
            mmsi,
            longitude,
            latitude,
            speed_over_ground: resolve(report, SPEED_OVER_GROUND),
            course_over_ground: resolve(report, COURSE_OVER_GROUND),
            heading: resolve(report, HEADING)
                .and_then(to_i32)
                .filter(|h| *h != HEADING_NOT_AVAILABLE),
            nav_status: resolve(report, NAV_STATUS).and_then(to_i32),
            observed_at,
            name_hint: resolve(report, NAME_HINT),
        })
    }
}

fn descriptor(report: &Report<'_>) -> VesselDescriptor {
    VesselDescriptor {
        name: resolve(report, NAME),
        callsign: resolve(report, CALLSIGN),
        type_code: resolve(report, TYPE_CODE).and_then(to_i32),
        dimension_to_bow: resolve(report, DIMENSION_TO_BOW).and_then(to_i32),
        dimension_to_stern: resolve(report, DIMENSION_TO_STERN).and_then(to_i32),
        dimension_to_port: resolve(report, DIMENSION_TO_PORT).and_then(to_i32),
        dimension_to_starboard: resolve(report, DIMENSION_TO_STARBOARD).and_then(to_i32),
    }
}

fn to_i32(value: i64) -> Option<i32> {
    i32::try_from(value).ok()
}
