use geo::Coord;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

use crate::{FeatureId, VesselZoneState, WatchedFeature, distance_to_segment};

/// Discrete proximity classification, ordered by severity.
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
pub enum Zone {
    Unknown,
    Far,
    Approach,
    Over,
}

/// Zone thresholds in planar degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Thresholds {
    /// Below this distance a vessel is over the feature.
    pub over: f64,
    /// Below this distance a vessel is approaching the feature.
    pub approach: f64,
    /// An approaching vessel only returns to far once it is further than this from the
    /// feature it approached.
    pub exit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub zone: Zone,
    pub distance: f64,
    /// The nearest watched feature, `None` when nothing is watched.
    pub feature_id: Option<FeatureId>,
}

#[derive(Debug, Clone, Default)]
pub struct ProximityClassifier {
    thresholds: Thresholds,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            over: 0.01,
            approach: 0.05,
            exit: 0.10,
        }
    }
}

impl ProximityClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Minimum distance over every line segment of the feature, infinite for a feature
    /// without line segments.
    pub fn distance_to_feature(point: Coord<f64>, feature: &WatchedFeature) -> f64 {
        feature
            .lines
            .iter()
            .map(|l| distance_to_segment(point, l))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn zone_for_distance(&self, distance: f64) -> Zone {
        if distance < self.thresholds.over {
            Zone::Over
        } else if distance < self.thresholds.approach {
            Zone::Approach
        } else {
            Zone::Far
        }
    }

    /// Classifies `point` against the nearest watched feature.
    ///
    /// A vessel whose previous state was approach or over against feature `f` is held
    /// in approach while its distance to `f` stays within the exit threshold, even if
    /// it would otherwise be far.
    pub fn classify(
        &self,
        point: Coord<f64>,
        features: &[WatchedFeature],
        previous: Option<&VesselZoneState>,
    ) -> Classification {
        let nearest = features
            .iter()
            .map(|f| (f, Self::distance_to_feature(point, f)))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let classification = match nearest {
            Some((feature, distance)) => Classification {
                zone: self.zone_for_distance(distance),
                distance,
                feature_id: Some(feature.id.clone()),
            },
            None => Classification {
                zone: Zone::Far,
                distance: f64::INFINITY,
                feature_id: None,
            },
        };

        if classification.zone != Zone::Far {
            return classification;
        }

        let held = previous
            .filter(|p| matches!(p.last_zone, Zone::Approach | Zone::Over))
            .and_then(|p| p.feature_id.as_ref())
            .and_then(|id| features.iter().find(|f| &f.id == id))
            .map(|f| (f, Self::distance_to_feature(point, f)))
            .filter(|(_, distance)| *distance <= self.thresholds.exit);

        match held {
            Some((feature, distance)) => Classification {
                zone: Zone::Approach,
                distance,
                feature_id: Some(feature.id.clone()),
            },
            None => classification,
        }
    }
}
