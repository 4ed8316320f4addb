use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

use crate::{
    Classification, CoreResult, FeatureId, VesselId, Zone,
    error::error::{NoAlertCategorySnafu, UnknownAlertCategorySnafu, UnknownZoneSnafu},
};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
    VariantArray,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertCategory {
    Approach,
    Over,
    Crossing,
}

/// Classifier memory for a single vessel.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselZoneState {
    pub vessel_id: VesselId,
    pub last_zone: Zone,
    /// Nearest watched feature at the last classification.
    pub feature_id: Option<FeatureId>,
    /// Timestamp of the latest position already evaluated for crossings.
    pub last_position_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneTransition {
    /// First classification of a vessel, never alerts.
    Seed,
    Escalation(AlertCategory),
    Steady,
    DeEscalation,
}

/// An alert occurrence to be merged into the `(vessel_id, category)` alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertUpsert {
    pub vessel_id: VesselId,
    pub category: AlertCategory,
    pub message: String,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub vessel_id: VesselId,
    pub category: AlertCategory,
    pub message: String,
    pub count: i32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneStep {
    pub state: VesselZoneState,
    pub transition: ZoneTransition,
}

/// Everything a single tick wants to persist, committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickUpdate {
    pub states: Vec<VesselZoneState>,
    pub alerts: Vec<AlertUpsert>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlertStateMachine;

impl AlertCategory {
    pub fn for_zone(zone: Zone) -> CoreResult<AlertCategory> {
        match zone {
            Zone::Approach => Ok(AlertCategory::Approach),
            Zone::Over => Ok(AlertCategory::Over),
            Zone::Unknown | Zone::Far => NoAlertCategorySnafu { zone }.fail(),
        }
    }

    pub fn parse(value: &str) -> CoreResult<AlertCategory> {
        AlertCategory::from_str(value).map_err(|_| {
            UnknownAlertCategorySnafu {
                value: value.to_string(),
            }
            .build()
        })
    }
}

impl Zone {
    pub fn parse(value: &str) -> CoreResult<Zone> {
        Zone::from_str(value).map_err(|_| {
            UnknownZoneSnafu {
                value: value.to_string(),
            }
            .build()
        })
    }
}

impl ZoneTransition {
    pub fn between(previous: Zone, next: Zone) -> ZoneTransition {
        if previous == Zone::Unknown {
            return ZoneTransition::Seed;
        }
        match next.cmp(&previous) {
            std::cmp::Ordering::Greater => match AlertCategory::for_zone(next) {
                Ok(category) => ZoneTransition::Escalation(category),
                // Far and unknown never rank above a known previous zone.
                Err(_) => ZoneTransition::Steady,
            },
            std::cmp::Ordering::Equal => ZoneTransition::Steady,
            std::cmp::Ordering::Less => ZoneTransition::DeEscalation,
        }
    }

    pub fn escalation(&self) -> Option<AlertCategory> {
        match self {
            ZoneTransition::Escalation(c) => Some(*c),
            ZoneTransition::Seed | ZoneTransition::Steady | ZoneTransition::DeEscalation => None,
        }
    }
}

impl AlertEvent {
    /// Merges an occurrence into the existing alert for its key, creating it with a count
    /// of one when absent.
    pub fn upsert(existing: Option<AlertEvent>, upsert: AlertUpsert) -> AlertEvent {
        let AlertUpsert {
            vessel_id,
            category,
            message,
            observed_at,
        } = upsert;

        match existing {
            Some(e) => AlertEvent {
                vessel_id: e.vessel_id,
                category: e.category,
                message,
                count: e.count + 1,
                first_seen: e.first_seen,
                last_seen: observed_at,
            },
            None => AlertEvent {
                vessel_id,
                category,
                message,
                count: 1,
                first_seen: observed_at,
                last_seen: observed_at,
            },
        }
    }
}

impl AlertStateMachine {
    /// Advances the zone state of `vessel_id` with a new classification.
    ///
    /// The state always moves to the new zone, the caller emits an alert only for
    /// [`ZoneTransition::Escalation`].
    pub fn step(
        &self,
        vessel_id: VesselId,
        previous: Option<&VesselZoneState>,
        classification: &Classification,
        position_at: DateTime<Utc>,
    ) -> ZoneStep {
        let previous_zone = previous.map(|p| p.last_zone).unwrap_or(Zone::Unknown);
        let last_position_at = previous
            .and_then(|p| p.last_position_at)
            .map(|t| t.max(position_at))
            .unwrap_or(position_at);

        ZoneStep {
            transition: ZoneTransition::between(previous_zone, classification.zone),
            state: VesselZoneState {
                vessel_id,
                last_zone: classification.zone,
                feature_id: classification.feature_id.clone(),
                last_position_at: Some(last_position_at),
            },
        }
    }
}

impl VesselZoneState {
    /// Whether a position observed at `at` has not been evaluated yet.
    pub fn is_unevaluated(state: Option<&VesselZoneState>, at: DateTime<Utc>) -> bool {
        state
            .and_then(|s| s.last_position_at)
            .is_none_or(|last| at > last)
    }
}

impl TickUpdate {
    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.alerts.is_empty()
    }
}
