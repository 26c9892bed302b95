use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::config::ConfigResetNotification;
use crate::map::{
    ActiveStore, AsyncMapOperation, MapLoadError, MapSaveError, OpenMapRequest,
    RetryFailedSavesRequest,
};
use crate::theme;

#[derive(Resource, Default)]
pub struct OpenMapDialog {
    pub show: bool,
    pub map_id: String,
    /// Re-read the store's map list on the next frame
    pub needs_refresh: bool,
    pub known_maps: Vec<String>,
    pub list_error: Option<String>,
}

/// Renders the open-map dialog with the maps the store knows about
pub fn open_map_dialog_ui(
    mut contexts: EguiContexts,
    mut dialog: ResMut<OpenMapDialog>,
    store: Res<ActiveStore>,
    mut open_events: MessageWriter<OpenMapRequest>,
) -> Result {
    if !dialog.show {
        return Ok(());
    }

    if dialog.needs_refresh {
        dialog.needs_refresh = false;
        match store.0.list_maps() {
            Ok(maps) => {
                dialog.known_maps = maps;
                dialog.list_error = None;
            }
            Err(e) => {
                warn!("Could not list maps: {}", e);
                dialog.known_maps.clear();
                dialog.list_error = Some(e.to_string());
            }
        }
    }

    let mut open = None;
    egui::Window::new("Open Map")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            if let Some(error) = &dialog.list_error {
                ui.colored_label(theme::ERROR_TEXT, error);
            }

            if !dialog.known_maps.is_empty() {
                egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                    for map_id in &dialog.known_maps {
                        if ui.selectable_label(false, map_id).clicked() {
                            open = Some(map_id.clone());
                        }
                    }
                });
                ui.separator();
            }

            ui.horizontal(|ui| {
                ui.label("Map id:");
                ui.text_edit_singleline(&mut dialog.map_id);
            });
            ui.horizontal(|ui| {
                let has_id = !dialog.map_id.trim().is_empty();
                if ui.add_enabled(has_id, egui::Button::new("Open")).clicked() {
                    open = Some(dialog.map_id.trim().to_string());
                }
                if ui.button("Cancel").clicked() {
                    dialog.show = false;
                }
            });
        });

    if let Some(map_id) = open {
        open_events.write(OpenMapRequest { map_id });
        dialog.show = false;
    }

    Ok(())
}

/// Renders the load error dialog
pub fn load_error_dialog_ui(
    mut contexts: EguiContexts,
    mut load_error: ResMut<MapLoadError>,
) -> Result {
    let Some(error) = load_error.message.clone() else {
        return Ok(());
    };

    egui::Window::new("Load Error")
        .collapsible(false)
        .resizable(true)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                ui.colored_label(theme::ERROR_TEXT, error);
            });
            if ui.button("OK").clicked() {
                load_error.message = None;
            }
        });

    Ok(())
}

/// Lists saves the store refused. The edits are still on the map.
pub fn save_error_dialog_ui(
    mut contexts: EguiContexts,
    mut save_error: ResMut<MapSaveError>,
    mut retry_events: MessageWriter<RetryFailedSavesRequest>,
) -> Result {
    if !save_error.has_failures() {
        return Ok(());
    }

    egui::Window::new("Save Failed")
        .collapsible(false)
        .resizable(true)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("These changes are shown on the map but were not stored:");
            ui.add_space(5.0);
            egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                for failure in &save_error.failures {
                    ui.label(egui::RichText::new(&failure.target).strong());
                    ui.colored_label(theme::ERROR_TEXT, &failure.message);
                }
            });
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui.button("Retry").clicked() {
                    retry_events.write(RetryFailedSavesRequest);
                }
                if ui.button("Dismiss").clicked() {
                    warn!("Dismissed {} unsaved changes", save_error.failures.len());
                    save_error.failures.clear();
                }
            });
        });

    Ok(())
}

/// Tells the user their config file was unreadable and defaults are in use
pub fn config_reset_notification_ui(
    mut contexts: EguiContexts,
    mut notification: ResMut<ConfigResetNotification>,
) -> Result {
    if !notification.show {
        return Ok(());
    }

    egui::Window::new("Settings Reset")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("The settings file could not be read. Default settings are in use.");
            if let Some(reason) = &notification.reason {
                ui.add_space(5.0);
                ui.label(egui::RichText::new(reason).weak());
            }
            ui.add_space(10.0);
            if ui.button("OK").clicked() {
                notification.show = false;
            }
        });

    Ok(())
}

/// Blocking indicator while a map loads
pub fn async_operation_modal_ui(
    mut contexts: EguiContexts,
    async_op: Res<AsyncMapOperation>,
) -> Result {
    if !async_op.is_busy() {
        return Ok(());
    }

    egui::Window::new("Please Wait")
        .collapsible(false)
        .resizable(false)
        .title_bar(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(
                    async_op
                        .operation_description
                        .as_deref()
                        .unwrap_or("Working..."),
                );
            });
        });

    Ok(())
}
