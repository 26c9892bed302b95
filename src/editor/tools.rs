use bevy::prelude::*;
use bevy::window::{CursorIcon, PrimaryWindow, SystemCursorIcon};
use bevy_egui::EguiContexts;

use crate::map::BranchAnchor;

use super::controller::EditorKey;
use super::params::{NotificationWriters, is_cursor_over_ui, is_typing};
use super::scene::MapScene;

/// What the editor is doing. One enum, so the states are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditMode {
    #[default]
    Idle,
    PinPlacement,
    LineDrawing {
        pending: Vec<IVec2>,
    },
    BranchCreation {
        target: String,
        anchor: BranchAnchor,
        return_to: ModeKind,
    },
    Edit,
}

impl EditMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            EditMode::Idle => ModeKind::Idle,
            EditMode::PinPlacement => ModeKind::PinPlacement,
            EditMode::LineDrawing { .. } => ModeKind::LineDrawing,
            EditMode::BranchCreation { .. } => ModeKind::BranchCreation,
            EditMode::Edit => ModeKind::Edit,
        }
    }

    /// Fresh state for a mode the user can pick directly.
    pub fn enter(kind: ModeKind) -> Option<EditMode> {
        match kind {
            ModeKind::Idle => Some(EditMode::Idle),
            ModeKind::PinPlacement => Some(EditMode::PinPlacement),
            ModeKind::LineDrawing => Some(EditMode::LineDrawing {
                pending: Vec::new(),
            }),
            ModeKind::Edit => Some(EditMode::Edit),
            ModeKind::BranchCreation => None,
        }
    }
}

/// Data-free view of [`EditMode`] for the toolbar and run conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeKind {
    #[default]
    Idle,
    PinPlacement,
    LineDrawing,
    BranchCreation,
    Edit,
}

impl ModeKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ModeKind::Idle => "Navigate (Esc)",
            ModeKind::PinPlacement => "Place Pin (P)",
            ModeKind::LineDrawing => "Draw Line (L)",
            ModeKind::BranchCreation => "Create Branch",
            ModeKind::Edit => "Edit (E)",
        }
    }

    /// Modes offered on the toolbar. Branch creation is entered from a line's menu.
    pub fn selectable() -> &'static [ModeKind] {
        &[
            ModeKind::Idle,
            ModeKind::PinPlacement,
            ModeKind::LineDrawing,
            ModeKind::Edit,
        ]
    }

    pub fn from_shortcut(key: KeyCode) -> Option<ModeKind> {
        match key {
            KeyCode::KeyP => Some(ModeKind::PinPlacement),
            KeyCode::KeyL => Some(ModeKind::LineDrawing),
            KeyCode::KeyE => Some(ModeKind::Edit),
            _ => None,
        }
    }

    /// Whether items show control points and treat clicks as edits.
    pub fn is_edit_mode(&self) -> bool {
        matches!(self, ModeKind::Edit | ModeKind::BranchCreation)
    }
}

/// Mode plus the name the next created feature will get.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub mode: EditMode,
    /// Target id for the next pin or line; blank means auto-named
    pub draft_target: String,
}

impl EditorState {
    pub fn kind(&self) -> ModeKind {
        self.mode.kind()
    }

    /// Take the draft name, if the user typed one.
    pub fn take_draft_target(&mut self) -> Option<String> {
        let name = self.draft_target.trim().to_string();
        self.draft_target.clear();
        (!name.is_empty()).then_some(name)
    }
}

/// Escape, Enter and the mode shortcuts P / L / E.
pub fn handle_mode_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut contexts: EguiContexts,
    time: Res<Time>,
    mut scene: ResMut<MapScene>,
    mut writers: NotificationWriters,
) {
    // Don't change modes if typing in a text field
    if is_typing(&mut contexts) {
        return;
    }

    let mut keys = Vec::new();
    if keyboard.just_pressed(KeyCode::Escape) {
        keys.push(EditorKey::Escape);
    }
    if keyboard.any_just_pressed([KeyCode::Enter, KeyCode::NumpadEnter]) {
        keys.push(EditorKey::Enter);
    }
    keys.extend(
        keyboard
            .get_just_pressed()
            .filter_map(|key| ModeKind::from_shortcut(*key))
            .map(EditorKey::Mode),
    );
    if keys.is_empty() {
        return;
    }

    let now = time.elapsed();
    let mut notifications = Vec::new();
    for key in keys {
        notifications.extend(scene.handle_key(key, now));
    }
    let map_id = scene.map_id().map(str::to_string);
    writers.forward(map_id.as_deref(), notifications);
}

pub fn update_cursor_icon(
    scene: Res<MapScene>,
    window_query: Query<Entity, With<PrimaryWindow>>,
    mut commands: Commands,
    mut contexts: EguiContexts,
) {
    let Ok(entity) = window_query.single() else {
        return;
    };

    // Use default cursor over UI, mode cursor over the map
    if is_cursor_over_ui(&mut contexts) {
        commands
            .entity(entity)
            .insert(CursorIcon::System(SystemCursorIcon::Default));
        return;
    }

    commands
        .entity(entity)
        .insert(scene.controller().pointer_hint().cursor_icon());
}
