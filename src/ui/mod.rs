mod context_menu;
pub mod dialogs;
mod toolbar;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::config::ConfigResetNotification;
use crate::editor::{EditRejected, NavigateToTarget};
use crate::map::{AsyncMapOperation, MapLoadError, MapSaveError};

/// Resource that tracks whether any modal dialog is currently open.
/// Editor input handlers should check this to avoid processing input
/// when the user is interacting with a dialog.
#[derive(Resource, Default)]
pub struct DialogState {
    /// True when any modal dialog is open that should block editor input
    pub any_modal_open: bool,
}

/// Last thing worth telling the user, shown in the status bar
#[derive(Resource, Default)]
pub struct StatusLine {
    pub message: Option<String>,
}

/// System to aggregate all dialog open states into a single resource.
/// Runs in First schedule before input handlers.
fn update_dialog_state(
    open_map: Res<dialogs::OpenMapDialog>,
    config_reset: Res<ConfigResetNotification>,
    save_error: Res<MapSaveError>,
    load_error: Res<MapLoadError>,
    async_op: Res<AsyncMapOperation>,
    mut dialog_state: ResMut<DialogState>,
) {
    dialog_state.any_modal_open = open_map.show
        || config_reset.show
        || save_error.has_failures()
        || load_error.message.is_some()
        || async_op.is_busy();
}

fn update_status(
    mut navigate_events: MessageReader<NavigateToTarget>,
    mut rejected_events: MessageReader<EditRejected>,
    mut status: ResMut<StatusLine>,
) {
    for event in navigate_events.read() {
        status.message = Some(format!("Go to {}", event.target));
    }
    for event in rejected_events.read() {
        status.message = Some(format!("{}: {}", event.target, event.reason));
    }
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogState>()
            .init_resource::<StatusLine>()
            .init_resource::<dialogs::OpenMapDialog>()
            .add_systems(
                EguiPrimaryContextPass,
                (
                    // Top panels first, then the bottom bar
                    toolbar::toolbar_ui,
                    toolbar::mode_settings_ui,
                    toolbar::status_bar_ui,
                )
                    .chain(),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    // Last: popups and dialogs
                    context_menu::context_menu_ui,
                    dialogs::open_map_dialog_ui,
                    dialogs::load_error_dialog_ui,
                    dialogs::save_error_dialog_ui,
                    dialogs::config_reset_notification_ui,
                    dialogs::async_operation_modal_ui,
                )
                    .after(toolbar::status_bar_ui),
            )
            .add_systems(Update, update_status)
            // Update dialog state at the start of each frame
            .add_systems(First, update_dialog_state);
    }
}
