//! Result types for async map operations.

use std::path::PathBuf;

use bevy::math::UVec2;

use crate::map::GeometryData;

use super::decode::FeatureBatch;

/// Background image found while loading a map.
pub struct BackgroundInfo {
    pub path: PathBuf,
    pub size: UVec2,
}

/// Result of an async load operation
pub struct LoadResult {
    pub map_id: String,
    pub batch: Option<FeatureBatch>,
    pub background: Option<BackgroundInfo>,
    /// Set when the map has a background that could not be read
    pub background_error: Option<String>,
    pub error: Option<String>,
}

/// Result of an async save operation
pub struct SaveResult {
    pub map_id: String,
    pub target: String,
    pub geometry: GeometryData,
    pub error: Option<String>,
}
