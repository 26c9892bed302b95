use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::editor::{MapScene, NotificationWriters};

/// Popup with the actions a line offers at the right-clicked point.
/// A press on the map closes it through the controller.
pub fn context_menu_ui(
    mut contexts: EguiContexts,
    mut scene: ResMut<MapScene>,
    time: Res<Time>,
    mut writers: NotificationWriters,
) -> Result {
    let Some(menu) = scene.controller().context_menu() else {
        return Ok(());
    };
    let title = menu.target.key.target.clone();
    let position = egui::pos2(menu.view_position.x, menu.view_position.y);
    let entries: Vec<(String, bool)> = menu
        .entries
        .iter()
        .map(|entry| (entry.label.clone(), entry.enabled))
        .collect();

    let mut chosen = None;
    let mut dismissed = false;
    let ctx = contexts.ctx_mut()?;
    egui::Area::new(egui::Id::new("feature_context_menu"))
        .order(egui::Order::Foreground)
        .fixed_pos(position)
        .show(ctx, |ui| {
            egui::Frame::menu(ui.style()).show(ui, |ui| {
                ui.set_min_width(140.0);
                ui.label(egui::RichText::new(&title).strong());
                ui.separator();
                for (index, (label, enabled)) in entries.iter().enumerate() {
                    if ui.add_enabled(*enabled, egui::Button::new(label)).clicked() {
                        chosen = Some(index);
                    }
                }
                ui.separator();
                if ui.button("Cancel").clicked() {
                    dismissed = true;
                }
            });
        });

    if let Some(index) = chosen {
        let notifications = scene.apply_menu_entry(index, time.elapsed());
        let map_id = scene.map_id().map(str::to_string);
        writers.forward(map_id.as_deref(), notifications);
    } else if dismissed {
        scene.close_context_menu();
    }

    Ok(())
}
