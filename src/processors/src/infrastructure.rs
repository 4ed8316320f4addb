use std::{path::Path, sync::Arc};

use cablewatch_core::{
    FeatureId, ImportSummary, InfrastructureFeature, ProcessorStorage, SegmentDecomposer, retry,
};
use geo::{Coord, Geometry};
use geozero::{ToGeo, geojson::GeoJson};
use serde::Deserialize;
use snafu::{OptionExt, ResultExt};
use tracing::{info, instrument, warn};

use crate::error::{
    Result, SkippedFeature,
    error::ReadInfrastructureSnafu,
    skipped::{
        InvalidGeometrySnafu, MissingGeometrySnafu, MissingIdSnafu, UnsupportedGeometrySnafu,
    },
};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<GeoJsonFeature>,
}

#[derive(Debug, Deserialize)]
struct GeoJsonFeature {
    id: Option<FeatureKey>,
    #[serde(default)]
    properties: FeatureProperties,
    geometry: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    id: Option<FeatureKey>,
    name: Option<String>,
    color: Option<String>,
    #[serde(default)]
    watched: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureKey {
    Text(String),
    Number(i64),
}

/// A parsed feature with one coordinate list per path component.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeature {
    pub feature: InfrastructureFeature,
    pub paths: Vec<Vec<Coord<f64>>>,
}

/// Loads a GeoJSON feature collection of line features into storage.
#[derive(Clone)]
pub struct InfrastructureImporter {
    adapter: Arc<dyn ProcessorStorage>,
}

impl InfrastructureImporter {
    pub fn new(adapter: Arc<dyn ProcessorStorage>) -> Self {
        Self { adapter }
    }

    pub async fn import_file(&self, path: &Path) -> Result<ImportSummary> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .context(ReadInfrastructureSnafu {
                path: path.display().to_string(),
            })?;

        self.import(&contents).await
    }

    /// Every feature is replaced in its own storage call, a failing feature does not undo
    /// the ones imported before it.
    #[instrument(skip_all, fields(app.num_features))]
    pub async fn import(&self, geojson: &str) -> Result<ImportSummary> {
        let features = parse_features(geojson)?;
        tracing::Span::current().record("app.num_features", features.len());

        let mut summary = ImportSummary::default();

        for ParsedFeature { feature, paths } in features {
            let decomposed = SegmentDecomposer::decompose_feature(feature, paths);
            summary.add(&decomposed.summary);

            if decomposed.summary.invalid_segments > 0 || decomposed.summary.degenerate_lines > 0 {
                warn!(
                    feature = decomposed.feature.id.as_str(),
                    invalid_segments = decomposed.summary.invalid_segments,
                    degenerate_lines = decomposed.summary.degenerate_lines,
                    "skipped degenerate geometry"
                );
            }

            retry(|| self.adapter.import_feature(decomposed.clone())).await?;
        }

        info!(
            features = summary.features,
            segments = summary.segments,
            line_segments = summary.line_segments,
            invalid_segments = summary.invalid_segments,
            degenerate_lines = summary.degenerate_lines,
            "imported infrastructure"
        );

        Ok(summary)
    }

    pub async fn set_watched(&self, ids: &[FeatureId]) -> Result<()> {
        retry(|| self.adapter.set_watched_features(ids)).await?;
        info!("watching {} features", ids.len());
        Ok(())
    }
}

/// Parses a feature collection, features without an id or without line geometry are
/// skipped with a warning.
pub fn parse_features(geojson: &str) -> Result<Vec<ParsedFeature>> {
    let collection: FeatureCollection = serde_json::from_str(geojson)?;

    Ok(collection
        .features
        .into_iter()
        .enumerate()
        .filter_map(|(i, f)| match parse_feature(f) {
            Ok(parsed) => Some(parsed),
            Err(reason) => {
                warn!("skipped feature {i}: {reason:?}");
                None
            }
        })
        .collect())
}

fn parse_feature(feature: GeoJsonFeature) -> std::result::Result<ParsedFeature, SkippedFeature> {
    let GeoJsonFeature {
        id,
        properties,
        geometry,
    } = feature;

    let id = properties
        .id
        .or(id)
        .map(FeatureKey::into_feature_id)
        .context(MissingIdSnafu)?;

    let geometry = geometry.context(MissingGeometrySnafu)?;
    let geometry_type = geometry
        .get("type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let geometry = GeoJson(&geometry.to_string())
        .to_geo()
        .context(InvalidGeometrySnafu)?;

    let paths = match geometry {
        Geometry::LineString(l) => vec![l.0],
        Geometry::MultiLineString(m) => m.0.into_iter().map(|l| l.0).collect(),
        _ => return UnsupportedGeometrySnafu { geometry_type }.fail(),
    };

    Ok(ParsedFeature {
        feature: InfrastructureFeature {
            name: properties.name.unwrap_or_else(|| id.as_str().to_string()),
            id,
            color: properties.color,
            watched: properties.watched,
        },
        paths,
    })
}

impl FeatureKey {
    fn into_feature_id(self) -> FeatureId {
        match self {
            FeatureKey::Text(v) => FeatureId::new(v),
            FeatureKey::Number(v) => FeatureId::new(v.to_string()),
        }
    }
}
