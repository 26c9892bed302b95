//! Resource types for map persistence state tracking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::Task;

use crate::map::GeometryData;

use super::messages::GeometryChanged;
use super::results::{LoadResult, SaveResult};
use super::store::GeometryStore;

/// The store maps are loaded from and saved to.
#[derive(Resource, Clone)]
pub struct ActiveStore(pub Arc<dyn GeometryStore>);

#[derive(Resource, Default)]
pub struct MapLoadError {
    pub message: Option<String>,
}

/// A save that the store refused. The edit stays applied locally.
#[derive(Debug, Clone)]
pub struct SaveFailure {
    pub map_id: String,
    pub target: String,
    pub geometry: GeometryData,
    pub message: String,
}

/// Resource tracking save failures for display to user.
#[derive(Resource, Default)]
pub struct MapSaveError {
    pub failures: Vec<SaveFailure>,
}

impl MapSaveError {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Record a failure, replacing an older one for the same feature geometry.
    pub fn record(&mut self, failure: SaveFailure) {
        self.forget(&failure.map_id, &failure.target, &failure.geometry);
        self.failures.push(failure);
    }

    /// Drop the failure for a feature once a newer save of it succeeded.
    pub fn forget(&mut self, map_id: &str, target: &str, geometry: &GeometryData) {
        let key = SaveKey::new(map_id, target, geometry);
        self.failures
            .retain(|f| SaveKey::new(&f.map_id, &f.target, &f.geometry) != key);
    }
}

/// One stored geometry. A pin and a line may share a target id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SaveKey {
    pub map_id: String,
    pub target: String,
    pub is_point: bool,
}

impl SaveKey {
    pub fn new(map_id: &str, target: &str, geometry: &GeometryData) -> Self {
        Self {
            map_id: map_id.to_string(),
            target: target.to_string(),
            is_point: matches!(geometry, GeometryData::Point(_)),
        }
    }

    pub fn of(request: &GeometryChanged) -> Self {
        Self::new(&request.map_id, &request.target, &request.geometry)
    }
}

/// Keeps saves of one feature in edit order: at most one is running, and
/// only the newest of the edits made meanwhile is written after it.
#[derive(Resource, Default)]
pub struct SaveQueue {
    running: HashSet<SaveKey>,
    waiting: HashMap<SaveKey, GeometryChanged>,
}

impl SaveQueue {
    /// Returns the request if it can start now; otherwise it waits behind the
    /// running save and replaces any older waiting request.
    pub fn submit(&mut self, request: GeometryChanged) -> Option<GeometryChanged> {
        let key = SaveKey::of(&request);
        if self.running.contains(&key) {
            self.waiting.insert(key, request);
            None
        } else {
            self.running.insert(key);
            Some(request)
        }
    }

    /// The running save for `key` finished. Returns the waiting request that
    /// starts next, if any.
    pub fn finish(&mut self, key: &SaveKey) -> Option<GeometryChanged> {
        let next = self.waiting.remove(key);
        if next.is_none() {
            self.running.remove(key);
        }
        next
    }

    /// Saves running or waiting.
    pub fn pending(&self) -> usize {
        self.running.len() + self.waiting.len()
    }
}

/// Resource tracking async map I/O operations
#[derive(Resource, Default)]
pub struct AsyncMapOperation {
    /// Whether a load operation is in progress
    pub is_loading: bool,
    /// Number of saves still running
    pub pending_saves: usize,
    /// Description of the current operation
    pub operation_description: Option<String>,
}

impl AsyncMapOperation {
    pub fn is_busy(&self) -> bool {
        self.is_loading
    }
}

/// Component for save task
#[derive(Component)]
pub struct SaveGeometryTask(pub Task<SaveResult>);

/// Component for load task
#[derive(Component)]
pub struct LoadMapTask(pub Task<LoadResult>);
