//! Interactive editing of the open map.
//!
//! ## Module Structure
//!
//! - `scene`: [`MapScene`], the single owner of view, features and controller
//! - `controller`: The edit-mode state machine
//! - `tools`: Mode enum plus shortcut and cursor systems
//! - `hit_testing`: Pointer position to feature part resolution
//! - `snapping`: Snap targets for line points
//! - `input`, `camera`, `rendering`, `gizmo`: Bevy glue
//! - `params`, `conditions`: Shared system params and run conditions

mod camera;
pub mod conditions;
pub mod controller;
mod gizmo;
pub mod hit_testing;
mod input;
pub mod messages;
pub mod params;
mod rendering;
pub mod scene;
pub mod snapping;
pub mod tools;

pub use controller::EditorKey;
pub use messages::{EditRejected, NavigateToTarget};
pub use params::NotificationWriters;
pub use scene::{Background, MapScene};
pub use tools::ModeKind;

use bevy::prelude::*;

use crate::config::AppConfig;

use gizmo::MapGizmoGroup;

/// Apply loaded or edited settings to the live scene.
fn sync_editor_settings(config: Res<AppConfig>, mut scene: ResMut<MapScene>) {
    if config.is_changed() && scene.settings() != &config.data.editor {
        scene.set_settings(config.data.editor.clone());
    }
}

pub struct EditorPlugin;

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MapScene>()
            .add_message::<NavigateToTarget>()
            .add_message::<EditRejected>()
            .init_gizmo_group::<MapGizmoGroup>()
            .add_systems(
                Startup,
                (camera::spawn_camera, gizmo::configure_map_gizmos),
            )
            .add_systems(
                Update,
                (
                    sync_editor_settings,
                    camera::sync_viewport,
                    (
                        tools::handle_mode_shortcuts,
                        input::handle_pointer_input,
                        camera::camera_zoom.run_if(conditions::scene_is_open),
                    )
                        .chain()
                        .run_if(conditions::no_dialog_open),
                    tools::update_cursor_icon,
                    input::log_navigation,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    rendering::detect_background_failure,
                    rendering::sync_background,
                    rendering::draw_scene,
                )
                    .chain()
                    .after(tools::update_cursor_icon),
            );
    }
}
