//! Geometry save system and task polling.
//!
//! Every committed edit is written back on a task. Saves of the same feature
//! run one at a time through [`SaveQueue`] so the store always ends with the
//! newest geometry. A failed save keeps the local edit and is recorded in
//! [`MapSaveError`] so the user can retry.

use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use futures_lite::future;

use super::messages::{GeometryChanged, RetryFailedSavesRequest};
use super::resources::{
    ActiveStore, AsyncMapOperation, MapSaveError, SaveFailure, SaveGeometryTask, SaveKey,
    SaveQueue,
};
use super::results::SaveResult;
use super::store::GeometryStore;

fn spawn_save(commands: &mut Commands, store: Arc<dyn GeometryStore>, request: GeometryChanged) {
    let task = IoTaskPool::get().spawn(async move { save_geometry(store.as_ref(), request) });
    commands.spawn(SaveGeometryTask(task));
}

/// Starts an async save for every committed geometry change
pub fn save_geometry_system(
    mut commands: Commands,
    mut events: MessageReader<GeometryChanged>,
    mut async_op: ResMut<AsyncMapOperation>,
    mut queue: ResMut<SaveQueue>,
    store: Res<ActiveStore>,
) {
    for event in events.read() {
        match queue.submit(event.clone()) {
            Some(request) => spawn_save(&mut commands, store.0.clone(), request),
            None => debug!("Save of '{}' waits for the running one", event.target),
        }
    }
    async_op.pending_saves = queue.pending();
}

pub fn save_geometry(store: &dyn GeometryStore, request: GeometryChanged) -> SaveResult {
    let error = store
        .save_geometry(&request.map_id, &request.target, &request.geometry)
        .err()
        .map(|e| format!("Failed to save '{}': {}", request.target, e));
    SaveResult {
        map_id: request.map_id,
        target: request.target,
        geometry: request.geometry,
        error,
    }
}

/// Book a finished save. Returns the newer save of the same feature that
/// should start next. A failure superseded by such a save is not recorded.
pub fn settle_save(
    result: SaveResult,
    queue: &mut SaveQueue,
    save_error: &mut MapSaveError,
) -> Option<GeometryChanged> {
    let next = queue.finish(&SaveKey::new(&result.map_id, &result.target, &result.geometry));

    match result.error {
        Some(message) if next.is_some() => {
            warn!("{} (a newer edit is being saved)", message);
        }
        Some(message) => {
            error!("{}", message);
            save_error.record(SaveFailure {
                map_id: result.map_id,
                target: result.target,
                geometry: result.geometry,
                message,
            });
        }
        None => {
            debug!(
                "Saved {} for '{}'",
                result.geometry.type_name(),
                result.target
            );
            save_error.forget(&result.map_id, &result.target, &result.geometry);
        }
    }
    next
}

/// Polls save tasks, records failures and starts saves that were waiting
pub fn poll_save_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut SaveGeometryTask)>,
    mut async_op: ResMut<AsyncMapOperation>,
    mut queue: ResMut<SaveQueue>,
    mut save_error: ResMut<MapSaveError>,
    store: Res<ActiveStore>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();

        if let Some(next) = settle_save(result, &mut queue, &mut save_error) {
            spawn_save(&mut commands, store.0.clone(), next);
        }
        async_op.pending_saves = queue.pending();
    }
}

/// Re-sends every failed save
pub fn retry_failed_saves_system(
    mut events: MessageReader<RetryFailedSavesRequest>,
    mut save_error: ResMut<MapSaveError>,
    mut writer: MessageWriter<GeometryChanged>,
) {
    for _ in events.read() {
        for failure in save_error.failures.drain(..) {
            info!("Retrying save of '{}'", failure.target);
            writer.write(GeometryChanged {
                map_id: failure.map_id,
                target: failure.target,
                geometry: failure.geometry,
            });
        }
    }
}
