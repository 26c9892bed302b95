//! Map data model: geometry, coordinate mapping, features, and persistence.

pub mod coords;
pub mod feature;
pub mod geometry;
pub mod line;
pub mod paint;
pub mod persistence;
pub mod pin;
pub mod style;

pub use coords::ViewTransform;
pub use feature::{
    FeatureNotification, FeatureRegistry, HitPart, HitRadii, ItemContext, ItemEvent, MapFeature,
    MarkerRadii, PaintContext,
};
pub use geometry::GeometryData;
pub use line::{BranchAnchor, LineItem, MenuAction, MenuEntry};
pub use paint::{MarkerShape, Painter};
pub use persistence::{
    ActiveStore, AsyncMapOperation, CloseMapRequest, GeometryChanged, JsonFileStore,
    MapLoadError, MapSaveError, OpenMapRequest, RetryFailedSavesRequest,
};
pub use pin::PinItem;

use std::sync::Arc;

use bevy::prelude::*;

use crate::config::{AppConfig, ConfigLoaded};

/// Open the configured store directory
fn init_store(mut commands: Commands, config: Res<AppConfig>) {
    let root = config
        .data
        .store_dir
        .clone()
        .unwrap_or_else(crate::paths::stores_dir);
    if let Err(e) = std::fs::create_dir_all(&root) {
        warn!("Could not create map store directory {:?}: {}", root, e);
    }
    info!("Using map store at {:?}", root);
    commands.insert_resource(ActiveStore(Arc::new(JsonFileStore::new(root))));
}

/// Reopen the map that was open when the app last closed
fn open_last_map(config: Res<AppConfig>, mut events: MessageWriter<OpenMapRequest>) {
    if let Some(map_id) = &config.data.last_map_id {
        info!("Reopening last map '{}'", map_id);
        events.write(OpenMapRequest {
            map_id: map_id.clone(),
        });
    }
}

pub struct MapPlugin;

impl Plugin for MapPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MapLoadError>()
            .init_resource::<MapSaveError>()
            .init_resource::<AsyncMapOperation>()
            .init_resource::<persistence::SaveQueue>()
            .add_message::<OpenMapRequest>()
            .add_message::<CloseMapRequest>()
            .add_message::<GeometryChanged>()
            .add_message::<RetryFailedSavesRequest>()
            .add_systems(
                Startup,
                (init_store, open_last_map).chain().after(ConfigLoaded),
            )
            .add_systems(
                Update,
                (
                    persistence::load_map_system.run_if(on_message::<OpenMapRequest>),
                    persistence::close_map_system.run_if(on_message::<CloseMapRequest>),
                    persistence::retry_failed_saves_system
                        .run_if(on_message::<RetryFailedSavesRequest>),
                    persistence::save_geometry_system.run_if(on_message::<GeometryChanged>),
                    persistence::poll_save_tasks,
                    persistence::poll_load_tasks,
                )
                    .chain(),
            );
    }
}
