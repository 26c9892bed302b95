use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::common::FeatureKind;
use crate::editor::{EditorKey, MapScene, ModeKind, NotificationWriters};
use crate::map::{AsyncMapOperation, CloseMapRequest};
use crate::theme;

use super::StatusLine;
use super::dialogs::OpenMapDialog;

/// Main toolbar showing modes and map controls
pub fn toolbar_ui(
    mut contexts: EguiContexts,
    mut scene: ResMut<MapScene>,
    mut open_dialog: ResMut<OpenMapDialog>,
    mut close_events: MessageWriter<CloseMapRequest>,
) -> Result {
    egui::TopBottomPanel::top("main_toolbar")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;

                // Mode buttons with keyboard shortcuts
                let active = scene.mode();
                for kind in ModeKind::selectable() {
                    let button = egui::Button::new(
                        egui::RichText::new(mode_button_label(kind)).size(14.0).strong(),
                    )
                    .min_size(egui::vec2(0.0, 28.0))
                    .selected(active == *kind);

                    let response = ui.add(button);
                    if response.clicked() {
                        scene.set_mode(*kind);
                    }
                    response.on_hover_text(kind.display_name());
                }

                // Branch creation has no button; show that it is running
                if active == ModeKind::BranchCreation {
                    ui.add_space(4.0);
                    ui.add(egui::Button::new(
                        egui::RichText::new(active.display_name()).size(14.0).strong(),
                    )
                    .selected(true));
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                ui.label(format!("Zoom: {:.0}%", scene.view().zoom() * 100.0));
                if ui
                    .add_enabled(scene.background().is_some(), egui::Button::new("Fit"))
                    .clicked()
                {
                    scene.fit_to_view();
                }

                // Right-aligned map controls
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(scene.is_open(), egui::Button::new("Close Map"))
                        .clicked()
                    {
                        close_events.write(CloseMapRequest);
                    }
                    if ui.button("Open Map...").clicked() {
                        open_dialog.show = true;
                        open_dialog.needs_refresh = true;
                    }
                    if let Some(map_id) = scene.map_id() {
                        ui.label(egui::RichText::new(map_id).strong());
                    }
                });
            });
        });
    Ok(())
}

/// Secondary toolbar with the draft name and hints for the active mode
pub fn mode_settings_ui(
    mut contexts: EguiContexts,
    mut scene: ResMut<MapScene>,
    time: Res<Time>,
    mut writers: NotificationWriters,
) -> Result {
    let mode = scene.mode();
    if mode == ModeKind::Idle {
        return Ok(());
    }

    let mut finish_line = false;
    egui::TopBottomPanel::top("mode_settings")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 6))
                .fill(theme::TOOL_SETTINGS_BG),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 6.0;

                match mode {
                    ModeKind::PinPlacement | ModeKind::LineDrawing => {
                        ui.label("Target:");
                        ui.add(
                            egui::TextEdit::singleline(scene.draft_target_mut())
                                .hint_text("auto")
                                .desired_width(160.0),
                        );

                        if mode == ModeKind::LineDrawing {
                            ui.add_space(12.0);
                            let points = scene.controller().pending_points().len();
                            let min = scene.settings().min_branch_points();
                            ui.label(format!("{} points", points));
                            if ui
                                .add_enabled(points >= min, egui::Button::new("Finish Line"))
                                .clicked()
                            {
                                finish_line = true;
                            }
                        }
                    }
                    _ => {}
                }

                ui.add_space(12.0);
                ui.label(
                    egui::RichText::new(mode_hint(mode))
                        .color(theme::HINT_TEXT)
                        .size(11.0),
                );
            });
        });

    if finish_line {
        let notifications = scene.handle_key(EditorKey::Enter, time.elapsed());
        let map_id = scene.map_id().map(str::to_string);
        writers.forward(map_id.as_deref(), notifications);
    }
    Ok(())
}

/// Bottom bar with feature counts, pending saves and the last status message
pub fn status_bar_ui(
    mut contexts: EguiContexts,
    scene: Res<MapScene>,
    status: Res<StatusLine>,
    async_op: Res<AsyncMapOperation>,
) -> Result {
    egui::TopBottomPanel::bottom("status_bar").show(contexts.ctx_mut()?, |ui| {
        ui.horizontal(|ui| {
            if scene.is_open() {
                let registry = scene.registry();
                ui.label(format!(
                    "{} pins, {} lines",
                    registry.count_of(FeatureKind::Pin),
                    registry.count_of(FeatureKind::Line)
                ));
            } else {
                ui.label(egui::RichText::new("No map open").color(theme::HINT_TEXT));
            }

            if async_op.pending_saves > 0 {
                ui.separator();
                ui.spinner();
                ui.label(format!("Saving {}...", async_op.pending_saves));
            }

            if let Some(message) = &status.message {
                ui.separator();
                ui.label(message);
            }
        });
    });
    Ok(())
}

/// Get the button label for a mode (with keyboard shortcut)
fn mode_button_label(kind: &ModeKind) -> &'static str {
    match kind {
        ModeKind::Idle => "Navigate [Esc]",
        ModeKind::PinPlacement => "Pin [P]",
        ModeKind::LineDrawing => "Line [L]",
        ModeKind::Edit => "Edit [E]",
        ModeKind::BranchCreation => "Branch",
    }
}

fn mode_hint(mode: ModeKind) -> &'static str {
    match mode {
        ModeKind::Idle => "",
        ModeKind::PinPlacement => "Click to place the pin",
        ModeKind::LineDrawing => "Click to add points, right-click to undo, Enter to finish",
        ModeKind::BranchCreation => "Click the branch end point, right-click or Esc to cancel",
        ModeKind::Edit => {
            "Drag points to move, click a segment to add, Shift+click to delete, right-click for more"
        }
    }
}
