//! Turns stored feature records into live map features.
//!
//! Runs inside the load task so the whole batch is ready before it reaches
//! the scene. Records that cannot be decoded are skipped with a reason.

use serde_json::Value;
use thiserror::Error;

use crate::map::geometry::{GeometryData, GeometryError, LineGeometry};
use crate::map::style::{LineStyle, StyleDefaults};
use crate::map::{LineItem, MapFeature, PinItem};

use super::store::{StoredFeature, StoredMap};
use super::wkt::{self, WktError};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("record is not a feature: {0}")]
    Record(#[from] serde_json::Error),
    #[error("record has an empty target id")]
    MissingTarget,
    #[error(transparent)]
    Geometry(#[from] WktError),
    #[error(transparent)]
    Line(#[from] GeometryError),
}

/// Settings that shape decoded lines.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOptions {
    pub min_branch_points: usize,
    pub style_defaults: StyleDefaults,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFeature {
    pub target: Option<String>,
    pub reason: String,
}

/// Everything decoded from one map, delivered to the scene in one step.
#[derive(Debug, Default)]
pub struct FeatureBatch {
    pub features: Vec<MapFeature>,
    pub skipped: Vec<SkippedFeature>,
    /// Features that loaded with some of their branches left out
    pub trimmed: Vec<SkippedFeature>,
}

pub fn decode_batch(map: &StoredMap, options: &DecodeOptions) -> FeatureBatch {
    let mut batch = FeatureBatch::default();
    for value in &map.features {
        match decode_feature(value, options, &mut batch.trimmed) {
            Ok(feature) => batch.features.push(feature),
            Err(error) => batch.skipped.push(SkippedFeature {
                target: value
                    .get("target")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                reason: error.to_string(),
            }),
        }
    }
    batch
}

fn decode_feature(
    value: &Value,
    options: &DecodeOptions,
    trimmed: &mut Vec<SkippedFeature>,
) -> Result<MapFeature, DecodeError> {
    let record: StoredFeature = serde_json::from_value(value.clone())?;
    let target = record.target.trim();
    if target.is_empty() {
        return Err(DecodeError::MissingTarget);
    }

    let feature = match wkt::decode(&record.geometry)? {
        GeometryData::Point(position) => MapFeature::Pin(PinItem::loaded(target, position)),
        GeometryData::LineString(points) => {
            let geometry = LineGeometry::new(points, options.min_branch_points)?;
            MapFeature::Line(LineItem::new(target, geometry, style_of(&record, options)))
        }
        GeometryData::MultiLineString(branches) => {
            // Degenerate branches are dropped rather than failing the whole line
            let min = options.min_branch_points.max(2);
            let total = branches.len();
            let kept: Vec<_> = branches.into_iter().filter(|b| b.len() >= min).collect();
            if kept.len() < total {
                trimmed.push(SkippedFeature {
                    target: Some(target.to_string()),
                    reason: format!(
                        "dropped {} of {} branches shorter than {} points",
                        total - kept.len(),
                        total,
                        min
                    ),
                });
            }
            let geometry = LineGeometry::multi(kept, options.min_branch_points)?;
            MapFeature::Line(LineItem::new(target, geometry, style_of(&record, options)))
        }
    };
    Ok(feature)
}

fn style_of(record: &StoredFeature, options: &DecodeOptions) -> LineStyle {
    LineStyle::from_stored(
        record.style_color.as_ref(),
        record.style_width.as_ref(),
        record.style_pattern.as_ref(),
        &options.style_defaults,
    )
}
