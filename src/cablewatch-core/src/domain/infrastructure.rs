use std::fmt::Display;

use geo::{Coord, Line};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FeatureId(String);

/// A named linear infrastructure feature, static reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfrastructureFeature {
    pub id: FeatureId,
    pub name: String,
    pub color: Option<String>,
    /// Only watched features take part in proximity classification.
    pub watched: bool,
}

/// One contiguous path component of a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub feature_id: FeatureId,
    pub index: u32,
    pub coordinates: Vec<Coord<f64>>,
}

/// The straight piece between two consecutive points of a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    pub feature_id: FeatureId,
    pub segment_index: u32,
    pub index: u32,
    pub line: Line<f64>,
}

/// Result of decomposing a single segment.
#[derive(Debug, Clone, PartialEq)]
pub enum Decomposition {
    Valid {
        lines: Vec<LineSegment>,
        degenerate_lines: u32,
    },
    /// Fewer than two points, nothing can be derived from it.
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecomposedSegment {
    pub segment: Segment,
    pub lines: Vec<LineSegment>,
}

/// A feature with every valid path component and its derived line segments, the unit
/// that storage replaces atomically on import.
#[derive(Debug, Clone, PartialEq)]
pub struct DecomposedFeature {
    pub feature: InfrastructureFeature,
    pub segments: Vec<DecomposedSegment>,
    pub summary: ImportSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub features: u32,
    pub segments: u32,
    pub line_segments: u32,
    pub invalid_segments: u32,
    pub degenerate_lines: u32,
}

/// A watched feature with all of its line segments flattened, what the classifier and
/// the crossing detector consume on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchedFeature {
    pub id: FeatureId,
    pub name: String,
    pub lines: Vec<Line<f64>>,
}

/// Infrastructure feature as rendered by the map layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub id: FeatureId,
    pub name: String,
    pub color: Option<String>,
    pub segments: Vec<SegmentRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRecord {
    pub index: u32,
    pub coordinates: Vec<[f64; 2]>,
}

pub struct SegmentDecomposer;

impl SegmentDecomposer {
    /// Decomposes every path component of a feature. Path indices are kept as segment
    /// indices, so an invalid component leaves a gap rather than renumbering the rest.
    pub fn decompose_feature(
        feature: InfrastructureFeature,
        paths: Vec<Vec<Coord<f64>>>,
    ) -> DecomposedFeature {
        let mut summary = ImportSummary {
            features: 1,
            ..Default::default()
        };

        let mut segments = Vec::with_capacity(paths.len());

        for (index, coordinates) in paths.into_iter().enumerate() {
            let segment = Segment {
                feature_id: feature.id.clone(),
                index: index as u32,
                coordinates,
            };

            match segment.decompose() {
                Decomposition::Invalid => summary.invalid_segments += 1,
                Decomposition::Valid {
                    lines,
                    degenerate_lines,
                } => {
                    summary.segments += 1;
                    summary.line_segments += lines.len() as u32;
                    summary.degenerate_lines += degenerate_lines;
                    segments.push(DecomposedSegment { segment, lines });
                }
            }
        }

        DecomposedFeature {
            feature,
            segments,
            summary,
        }
    }
}

impl Segment {
    /// Pairs consecutive points, point `i` to point `i + 1` becomes line segment `i`.
    /// Zero length pairs are skipped and counted, their index is not reused.
    pub fn decompose(&self) -> Decomposition {
        if self.coordinates.len() < 2 {
            return Decomposition::Invalid;
        }

        let mut degenerate_lines = 0;
        let lines = self
            .coordinates
            .windows(2)
            .enumerate()
            .filter_map(|(i, pair)| {
                if pair[0] == pair[1] {
                    degenerate_lines += 1;
                    None
                } else {
                    Some(LineSegment {
                        feature_id: self.feature_id.clone(),
                        segment_index: self.index,
                        index: i as u32,
                        line: Line::new(pair[0], pair[1]),
                    })
                }
            })
            .collect();

        Decomposition::Valid {
            lines,
            degenerate_lines,
        }
    }
}

impl ImportSummary {
    pub fn add(&mut self, other: &ImportSummary) {
        self.features += other.features;
        self.segments += other.segments;
        self.line_segments += other.line_segments;
        self.invalid_segments += other.invalid_segments;
        self.degenerate_lines += other.degenerate_lines;
    }
}

impl FeatureId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FeatureId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&Segment> for SegmentRecord {
    fn from(value: &Segment) -> Self {
        SegmentRecord {
            index: value.index,
            coordinates: value.coordinates.iter().map(|c| [c.x, c.y]).collect(),
        }
    }
}
