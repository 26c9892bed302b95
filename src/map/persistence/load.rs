//! Map load system and task polling.

use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use bevy::window::PrimaryWindow;
use futures_lite::future;

use crate::config::{AppConfig, UpdateLastMapRequest};
use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use crate::editor::{Background, MapScene};

use super::decode::{DecodeOptions, decode_batch};
use super::messages::{CloseMapRequest, OpenMapRequest};
use super::resources::{ActiveStore, AsyncMapOperation, LoadMapTask, MapLoadError};
use super::results::{BackgroundInfo, LoadResult};
use super::store::GeometryStore;

/// Starts an async load operation (store I/O and decoding)
pub fn load_map_system(
    mut commands: Commands,
    mut events: MessageReader<OpenMapRequest>,
    mut async_op: ResMut<AsyncMapOperation>,
    store: Res<ActiveStore>,
    config: Res<AppConfig>,
) {
    for event in events.read() {
        // Don't start a new load if one is already in progress
        if async_op.is_busy() {
            warn!("Load operation already in progress");
            continue;
        }

        let map_id = event.map_id.trim().to_string();
        if map_id.is_empty() {
            warn!("Ignoring request to open a map without an id");
            continue;
        }

        async_op.is_loading = true;
        async_op.operation_description = Some(format!("Loading {}...", map_id));

        let store = store.0.clone();
        let options = config.data.editor.decode_options();
        let task = IoTaskPool::get().spawn(async move { load_map(store.as_ref(), map_id, &options) });

        commands.spawn(LoadMapTask(task));
    }
}

/// Fetch one map from the store and decode every feature in it.
pub fn load_map(store: &dyn GeometryStore, map_id: String, options: &DecodeOptions) -> LoadResult {
    let stored = match store.load_features(&map_id) {
        Ok(stored) => stored,
        Err(e) => {
            return LoadResult {
                error: Some(format!("Failed to load map '{}': {}", map_id, e)),
                map_id,
                batch: None,
                background: None,
                background_error: None,
            };
        }
    };

    let batch = decode_batch(&stored, options);

    let (background, background_error) = match &stored.background {
        None => (None, None),
        Some(path) => {
            let resolved = store.resolve_path(path);
            match image::image_dimensions(&resolved) {
                Ok((width, height)) => (
                    Some(BackgroundInfo {
                        path: resolved,
                        size: UVec2::new(width, height),
                    }),
                    None,
                ),
                Err(e) => (
                    None,
                    Some(format!(
                        "Background image {:?} could not be read: {}",
                        resolved, e
                    )),
                ),
            }
        }
    };

    LoadResult {
        map_id,
        batch: Some(batch),
        background,
        background_error,
        error: None,
    }
}

/// Polls load tasks and hands the finished batch to the scene in one step
#[allow(clippy::too_many_arguments)]
pub fn poll_load_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut LoadMapTask)>,
    mut async_op: ResMut<AsyncMapOperation>,
    mut scene: ResMut<MapScene>,
    mut load_error: ResMut<MapLoadError>,
    asset_server: Res<AssetServer>,
    window: Query<&Window, With<PrimaryWindow>>,
    mut config_events: MessageWriter<UpdateLastMapRequest>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };

        // Clear async state
        async_op.is_loading = false;
        async_op.operation_description = None;
        load_error.message = None;
        commands.entity(entity).despawn();

        if let Some(error) = result.error {
            error!("{}", error);
            load_error.message = Some(error);
            continue;
        }

        let Some(batch) = result.batch else {
            continue;
        };

        for skipped in &batch.skipped {
            warn!(
                "Skipped feature {} in map '{}': {}",
                skipped.target.as_deref().unwrap_or("<unnamed>"),
                result.map_id,
                skipped.reason
            );
        }

        for trimmed in &batch.trimmed {
            warn!(
                "Feature {} in map '{}' {}",
                trimmed.target.as_deref().unwrap_or("<unnamed>"),
                result.map_id,
                trimmed.reason
            );
        }

        if let Some(message) = &result.background_error {
            warn!("{}; continuing without background", message);
        }

        let background = result.background.map(|info| Background {
            handle: asset_server.load(info.path.clone()),
            path: info.path,
            size: info.size,
        });

        let viewport = window
            .single()
            .map(|w| Vec2::new(w.width(), w.height()))
            .unwrap_or(Vec2::new(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT));

        let loaded = batch.features.len();
        scene.open(result.map_id.clone(), batch.features, background, viewport);

        info!(
            "Opened map '{}' with {} features ({} skipped)",
            result.map_id,
            loaded,
            batch.skipped.len()
        );
        config_events.write(UpdateLastMapRequest {
            map_id: result.map_id,
        });
    }
}

/// Detaches the current map from the scene
pub fn close_map_system(mut events: MessageReader<CloseMapRequest>, mut scene: ResMut<MapScene>) {
    for _ in events.read() {
        if let Some(map_id) = scene.map_id() {
            info!("Closing map '{}'", map_id);
        }
        scene.close();
    }
}
