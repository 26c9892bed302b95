//! Common SystemParam bundles used by editor systems.
//!
//! ## Available Bundles
//!
//! - [`WindowParams`]: Primary window access for cursor and view/world conversion
//! - [`NotificationWriters`]: Turns feature notifications into app messages
//!
//! ## Helper Functions
//!
//! - [`is_cursor_over_ui`]: Check if cursor is over egui UI (for input gating)
//! - [`view_to_world`]: Window-space to gizmo world space

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use crate::map::{FeatureNotification, GeometryChanged};

use super::messages::{EditRejected, NavigateToTarget};

/// Bundled primary window query
#[derive(SystemParam)]
pub struct WindowParams<'w, 's> {
    pub window: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
}

impl WindowParams<'_, '_> {
    /// Cursor position in view space (logical pixels, origin top-left)
    pub fn cursor_position(&self) -> Option<Vec2> {
        self.window.single().ok()?.cursor_position()
    }

    /// Window size in logical pixels, or the default size before the window exists
    pub fn size(&self) -> Vec2 {
        self.window
            .single()
            .map(|w| Vec2::new(w.width(), w.height()))
            .unwrap_or(Vec2::new(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT))
    }
}

/// Convert a view position to world space for a camera at the origin.
///
/// View space has y down from the top-left corner; world space has y up from
/// the window center.
pub fn view_to_world(view: Vec2, window_size: Vec2) -> Vec2 {
    Vec2::new(view.x - window_size.x * 0.5, window_size.y * 0.5 - view.y)
}

/// Message writers for everything a feature can report
#[derive(SystemParam)]
pub struct NotificationWriters<'w> {
    pub geometry: MessageWriter<'w, GeometryChanged>,
    pub navigate: MessageWriter<'w, NavigateToTarget>,
    pub rejected: MessageWriter<'w, EditRejected>,
}

impl NotificationWriters<'_> {
    /// Forward notifications from the open map `map_id`.
    pub fn forward(&mut self, map_id: Option<&str>, notifications: Vec<FeatureNotification>) {
        for notification in notifications {
            match notification {
                FeatureNotification::Navigate { target } => {
                    self.navigate.write(NavigateToTarget { target });
                }
                FeatureNotification::GeometryChanged { key, geometry } => {
                    let Some(map_id) = map_id else {
                        warn!("Dropping change to {}: no map is open", key);
                        continue;
                    };
                    self.geometry.write(GeometryChanged {
                        map_id: map_id.to_string(),
                        target: key.target,
                        geometry,
                    });
                }
                FeatureNotification::Rejected { key, error } => {
                    self.rejected.write(EditRejected {
                        target: key.target,
                        reason: error.to_string(),
                    });
                }
            }
        }
    }
}

/// Check if the cursor is over egui UI
pub fn is_cursor_over_ui(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false)
}

/// Check if egui is consuming keyboard input (a text field has focus)
pub fn is_typing(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_keyboard_input())
        .unwrap_or(false)
}
