use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::constants::{WHEEL_LINE_PIXELS, WHEEL_PIXEL_DIVISOR};

use super::params::{WindowParams, is_cursor_over_ui};
use super::scene::MapScene;

/// The single 2D camera. It stays at the origin; pan and zoom live in the
/// scene's view transform and are applied when drawing.
#[derive(Component)]
pub struct EditorCamera;

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        EditorCamera,
        Transform::from_translation(Vec3::new(0.0, 0.0, 1000.0)),
    ));
}

/// Zoom factor for one wheel event. A notch of 120 pixels zooms by 10%.
pub fn wheel_zoom_factor(unit: MouseScrollUnit, y: f32) -> f32 {
    let pixels = match unit {
        MouseScrollUnit::Line => y * WHEEL_LINE_PIXELS,
        MouseScrollUnit::Pixel => y,
    };
    1.0 + pixels / WHEEL_PIXEL_DIVISOR
}

/// Mouse wheel zooms around the cursor.
pub fn camera_zoom(
    mut scroll_events: MessageReader<MouseWheel>,
    mut scene: ResMut<MapScene>,
    window: WindowParams,
    mut contexts: EguiContexts,
) {
    if is_cursor_over_ui(&mut contexts) {
        scroll_events.clear();
        return;
    }
    let Some(cursor) = window.cursor_position() else {
        scroll_events.clear();
        return;
    };

    for event in scroll_events.read() {
        let factor = wheel_zoom_factor(event.unit, event.y);
        scene.zoom_at(cursor, factor);
    }
}

/// Keep the scene's idea of the viewport in step with the window.
pub fn sync_viewport(window: WindowParams, mut scene: ResMut<MapScene>) {
    scene.set_viewport(window.size());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_notch_zooms_ten_percent() {
        assert!((wheel_zoom_factor(MouseScrollUnit::Line, 1.0) - 1.1).abs() < 1e-6);
        assert!((wheel_zoom_factor(MouseScrollUnit::Line, -1.0) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_scroll_is_proportional() {
        assert!((wheel_zoom_factor(MouseScrollUnit::Pixel, 60.0) - 1.05).abs() < 1e-6);
    }
}
