//! Message types for map persistence operations.

use bevy::prelude::*;

use crate::map::GeometryData;

/// Open a map from the active store, replacing the current one
#[derive(Message)]
pub struct OpenMapRequest {
    pub map_id: String,
}

/// Close the current map, discarding any in-progress drawing
#[derive(Message)]
pub struct CloseMapRequest;

/// A feature's geometry was edited and committed; persist it
#[derive(Message, Debug, Clone)]
pub struct GeometryChanged {
    pub map_id: String,
    pub target: String,
    pub geometry: GeometryData,
}

/// Send every failed save to the store again
#[derive(Message)]
pub struct RetryFailedSavesRequest;
