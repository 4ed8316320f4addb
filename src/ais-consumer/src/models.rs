//! Borrowed view over an inbound report envelope and the ordered field aliases used to
//! resolve canonical values from it.
//!
//! The feed delivers many shapes for the same logical field, so every canonical field is
//! resolved by trying a list of plain accessor functions in priority order.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

pub type Accessor<T> = fn(&Report<'_>) -> Option<T>;

/// Variant names under which the feed nests the message payload.
pub const DYNAMIC_REPORT_NAMES: [&str; 4] = [
    "PositionReport",
    "StandardClassBPositionReport",
    "ExtendedClassBPositionReport",
    "LongRangeAisBroadcastMessage",
];
pub const STATIC_REPORT_NAMES: [&str; 2] = ["ShipStaticData", "StaticDataReport"];

/// Numeric AIS message types.
pub const DYNAMIC_REPORT_CODES: [u64; 6] = [1, 2, 3, 18, 19, 27];
pub const STATIC_REPORT_CODES: [u64; 2] = [5, 24];

const DISCRIMINATOR_KEYS: [&str; 4] = ["MessageType", "messageType", "message_type", "type"];
const PAYLOAD_KEYS: [&str; 2] = ["Message", "message"];
const METADATA_KEYS: [&str; 4] = ["MetaData", "Metadata", "metadata", "meta"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discriminator<'a> {
    Name(&'a str),
    Code(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Dynamic,
    Static,
}

#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub discriminator: Discriminator<'a>,
    payload: &'a Map<String, Value>,
    metadata: &'a Map<String, Value>,
}

impl<'a> Discriminator<'a> {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(Discriminator::Code),
            Value::String(s) => Some(
                s.trim()
                    .parse::<u64>()
                    .map(Discriminator::Code)
                    .unwrap_or(Discriminator::Name(s)),
            ),
            _ => None,
        }
    }

    /// `None` for anything outside the known allow-lists.
    pub fn kind(&self) -> Option<ReportKind> {
        match self {
            Discriminator::Name(n) if DYNAMIC_REPORT_NAMES.contains(n) => Some(ReportKind::Dynamic),
            Discriminator::Name(n) if STATIC_REPORT_NAMES.contains(n) => Some(ReportKind::Static),
            Discriminator::Code(c) if DYNAMIC_REPORT_CODES.contains(c) => Some(ReportKind::Dynamic),
            Discriminator::Code(c) if STATIC_REPORT_CODES.contains(c) => Some(ReportKind::Static),
            Discriminator::Name(_) | Discriminator::Code(_) => None,
        }
    }
}

impl<'a> Report<'a> {
    /// Locates the discriminator, payload and metadata of an envelope. Envelopes without a
    /// payload or metadata block are read flat from the root object.
    pub fn from_root(root: &'a Value) -> Option<Report<'a>> {
        let root = root.as_object()?;

        let discriminator = DISCRIMINATOR_KEYS
            .iter()
            .find_map(|k| root.get(*k).and_then(Discriminator::from_value))?;

        let payload = match PAYLOAD_KEYS.iter().find_map(|k| root.get(*k)?.as_object()) {
            Some(message) => {
                let variant = match &discriminator {
                    Discriminator::Name(n) => message.get(*n).and_then(Value::as_object),
                    Discriminator::Code(_) => None,
                };
                variant
                    .or_else(|| {
                        DYNAMIC_REPORT_NAMES
                            .iter()
                            .chain(STATIC_REPORT_NAMES.iter())
                            .find_map(|n| message.get(*n)?.as_object())
                    })
                    .unwrap_or(message)
            }
            None => root,
        };

        let metadata = METADATA_KEYS
            .iter()
            .find_map(|k| root.get(*k)?.as_object())
            .unwrap_or(root);

        Some(Report {
            discriminator,
            payload,
            metadata,
        })
    }

    pub fn payload(&self, path: &[&str]) -> Option<&'a Value> {
        lookup(self.payload, path)
    }

    pub fn metadata(&self, path: &[&str]) -> Option<&'a Value> {
        lookup(self.metadata, path)
    }

    pub fn payload_f64(&self, path: &[&str]) -> Option<f64> {
        self.payload(path).and_then(as_f64)
    }

    pub fn metadata_f64(&self, path: &[&str]) -> Option<f64> {
        self.metadata(path).and_then(as_f64)
    }

    pub fn payload_i64(&self, path: &[&str]) -> Option<i64> {
        self.payload(path).and_then(as_i64)
    }

    pub fn metadata_i64(&self, path: &[&str]) -> Option<i64> {
        self.metadata(path).and_then(as_i64)
    }

    pub fn payload_text(&self, path: &[&str]) -> Option<String> {
        self.payload(path).and_then(as_text)
    }

    pub fn metadata_text(&self, path: &[&str]) -> Option<String> {
        self.metadata(path).and_then(as_text)
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut current = map;
    for p in parents {
        current = current.get(*p)?.as_object()?;
    }
    current.get(*last).filter(|v| !v.is_null())
}

fn as_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|v: &f64| v.is_finite())
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// AIS pads text fields with `@`, such values are trimmed and empty results are `None`.
fn as_text(value: &Value) -> Option<String> {
    let text = value
        .as_str()?
        .trim_matches(|c: char| c == '@' || c.is_whitespace());

    (!text.is_empty()).then(|| text.to_string())
}

/// First value produced by `accessors`, in order.
pub fn resolve<T>(report: &Report<'_>, accessors: &[Accessor<T>]) -> Option<T> {
    accessors.iter().find_map(|a| a(report))
}

/// First value produced by `accessors` that satisfies `valid`, values failing it count as
/// unresolved and the next alias is tried.
pub fn resolve_valid<T>(
    report: &Report<'_>,
    accessors: &[Accessor<T>],
    valid: impl Fn(&T) -> bool,
) -> Option<T> {
    accessors.iter().filter_map(|a| a(report)).find(|v| valid(v))
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }

    let value = value.strip_suffix(" UTC").unwrap_or(value);
    if let Ok(t) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f %z") {
        return Some(t.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|t| t.and_utc())
}

pub const MMSI: &[Accessor<i64>] = &[
    |r| r.metadata_i64(&["MMSI"]),
    |r| r.metadata_i64(&["mmsi"]),
    |r| r.payload_i64(&["UserID"]),
    |r| r.payload_i64(&["mmsi"]),
];

pub const LATITUDE: &[Accessor<f64>] = &[
    |r| r.payload_f64(&["Latitude"]),
    |r| r.payload_f64(&["latitude"]),
    |r| r.payload_f64(&["lat"]),
    |r| r.metadata_f64(&["latitude"]),
    |r| r.metadata_f64(&["Latitude"]),
    |r| r.metadata_f64(&["lat"]),
];

pub const LONGITUDE: &[Accessor<f64>] = &[
    |r| r.payload_f64(&["Longitude"]),
    |r| r.payload_f64(&["longitude"]),
    |r| r.payload_f64(&["lon"]),
    |r| r.payload_f64(&["lng"]),
    |r| r.metadata_f64(&["longitude"]),
    |r| r.metadata_f64(&["Longitude"]),
    |r| r.metadata_f64(&["lon"]),
];

pub const SPEED_OVER_GROUND: &[Accessor<f64>] = &[
    |r| r.payload_f64(&["Sog"]),
    |r| r.payload_f64(&["speedOverGround"]),
    |r| r.payload_f64(&["sog"]),
];

pub const COURSE_OVER_GROUND: &[Accessor<f64>] = &[
    |r| r.payload_f64(&["Cog"]),
    |r| r.payload_f64(&["courseOverGround"]),
    |r| r.payload_f64(&["cog"]),
];

pub const HEADING: &[Accessor<i64>] = &[
    |r| r.payload_i64(&["TrueHeading"]),
    |r| r.payload_i64(&["trueHeading"]),
    |r| r.payload_i64(&["heading"]),
];

pub const NAV_STATUS: &[Accessor<i64>] = &[
    |r| r.payload_i64(&["NavigationalStatus"]),
    |r| r.payload_i64(&["navigationalStatus"]),
    |r| r.payload_i64(&["nav_status"]),
];

pub const OBSERVED_AT: &[Accessor<DateTime<Utc>>] = &[
    |r| r.metadata_text(&["time_utc"]).as_deref().and_then(parse_timestamp),
    |r| r.metadata_text(&["TimeUtc"]).as_deref().and_then(parse_timestamp),
    |r| r.metadata_text(&["timestamp"]).as_deref().and_then(parse_timestamp),
    |r| r.metadata_text(&["msgtime"]).as_deref().and_then(parse_timestamp),
];

pub const NAME_HINT: &[Accessor<String>] = &[
    |r| r.metadata_text(&["ShipName"]),
    |r| r.metadata_text(&["shipName"]),
    |r| r.metadata_text(&["name"]),
];

pub const NAME: &[Accessor<String>] = &[
    |r| r.payload_text(&["Name"]),
    |r| r.payload_text(&["ReportA", "Name"]),
    |r| r.payload_text(&["name"]),
    |r| r.metadata_text(&["ShipName"]),
];

pub const CALLSIGN: &[Accessor<String>] = &[
    |r| r.payload_text(&["CallSign"]),
    |r| r.payload_text(&["ReportB", "CallSign"]),
    |r| r.payload_text(&["callSign"]),
    |r| r.payload_text(&["call_sign"]),
];

pub const TYPE_CODE: &[Accessor<i64>] = &[
    |r| r.payload_i64(&["Type"]),
    |r| r.payload_i64(&["ReportB", "ShipType"]),
    |r| r.payload_i64(&["shipType"]),
    |r| r.payload_i64(&["ship_type"]),
];

pub const DIMENSION_TO_BOW: &[Accessor<i64>] = &[
    |r| r.payload_i64(&["Dimension", "A"]),
    |r| r.payload_i64(&["ReportB", "Dimension", "A"]),
    |r| r.payload_i64(&["dimensionA"]),
    |r| r.payload_i64(&["to_bow"]),
];

pub const DIMENSION_TO_STERN: &[Accessor<i64>] = &[
    |r| r.payload_i64(&["Dimension", "B"]),
    |r| r.payload_i64(&["ReportB", "Dimension", "B"]),
    |r| r.payload_i64(&["dimensionB"]),
    |r| r.payload_i64(&["to_stern"]),
];

pub const DIMENSION_TO_PORT: &[Accessor<i64>] = &[
    |r| r.payload_i64(&["Dimension", "C"]),
    |r| r.payload_i64(&["ReportB", "Dimension", "C"]),
    |r| r.payload_i64(&["dimensionC"]),
    |r| r.payload_i64(&["to_port"]),
];

pub const DIMENSION_TO_STARBOARD: &[Accessor<i64>] = &[
    |r| r.payload_i64(&["Dimension", "D"]),
    |r| r.payload_i64(&["ReportB", "Dimension", "D"]),
    |r| r.payload_i64(&["dimensionD"]),
    |r| r.payload_i64(&["to_starboard"]),
];
