//! Window input to scene input.
//!
//! Mouse buttons and cursor motion become [`PointerInput`] in view space,
//! which for the primary window is simply the logical cursor position.
//! Presses over egui panels are left to egui; releases always reach the
//! scene so a drag that ends over a panel or outside the window still commits.

use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::common::Modifiers;

use super::controller::{PointerButton, PointerInput};
use super::messages::NavigateToTarget;
use super::params::{NotificationWriters, WindowParams, is_cursor_over_ui};
use super::scene::MapScene;

const BUTTONS: [(MouseButton, PointerButton); 3] = [
    (MouseButton::Left, PointerButton::Primary),
    (MouseButton::Right, PointerButton::Secondary),
    (MouseButton::Middle, PointerButton::Middle),
];

pub fn current_modifiers(keyboard: &ButtonInput<KeyCode>) -> Modifiers {
    Modifiers {
        shift: keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]),
        ctrl: keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]),
        alt: keyboard.any_pressed([KeyCode::AltLeft, KeyCode::AltRight]),
    }
}

/// Pointer inputs for one frame.
///
/// Presses over UI are dropped. Releases are always reported; with the
/// cursor outside the window they use the last position seen inside it.
pub fn pointer_inputs(
    mouse_button: &ButtonInput<MouseButton>,
    cursor: Option<Vec2>,
    last_cursor: &mut Option<Vec2>,
    over_ui: bool,
    modifiers: Modifiers,
) -> Vec<PointerInput> {
    let mut inputs = Vec::new();

    if let Some(cursor) = cursor
        && *last_cursor != Some(cursor)
    {
        *last_cursor = Some(cursor);
        inputs.push(PointerInput::Move { position: cursor });
    }
    let Some(position) = cursor.or(*last_cursor) else {
        return inputs;
    };

    for (mouse, button) in BUTTONS {
        if cursor.is_some() && mouse_button.just_pressed(mouse) && !over_ui {
            inputs.push(PointerInput::Press {
                button,
                position,
                modifiers,
            });
        }
        if mouse_button.just_released(mouse) {
            inputs.push(PointerInput::Release { button, position });
        }
    }
    inputs
}

#[allow(clippy::too_many_arguments)]
pub fn handle_pointer_input(
    mouse_button: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    window: WindowParams,
    mut contexts: EguiContexts,
    time: Res<Time>,
    mut scene: ResMut<MapScene>,
    mut writers: NotificationWriters,
    mut last_cursor: Local<Option<Vec2>>,
) {
    let now = time.elapsed();
    let cursor = window.cursor_position();
    let over_ui = cursor.is_some() && is_cursor_over_ui(&mut contexts);
    let inputs = pointer_inputs(
        &mouse_button,
        cursor,
        &mut last_cursor,
        over_ui,
        current_modifiers(&keyboard),
    );

    let mut notifications = Vec::new();
    for input in inputs {
        notifications.extend(scene.handle_pointer(input, now));
    }

    let map_id = scene.map_id().map(str::to_string);
    writers.forward(map_id.as_deref(), notifications);
}

pub fn log_navigation(mut events: MessageReader<NavigateToTarget>) {
    for event in events.read() {
        info!("Navigate to '{}'", event.target);
    }
}
