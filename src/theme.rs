//! Centralized color theme for the application.
//!
//! This module provides all colors used throughout the editor UI and rendering.
//! Modify values here to change the application's color scheme.

use bevy::prelude::Color;
use bevy_egui::egui;

// ============================================================================
// Pin Colors
// ============================================================================

/// Pin marker fill
pub const PIN_COLOR: Color = Color::srgb(0.85, 0.2, 0.25);

/// Ring drawn around a pin the pointer is over
pub const PIN_HOVER_RING: Color = Color::srgb(1.0, 0.85, 0.3);

// ============================================================================
// Control Point Colors
// ============================================================================

/// Junction (shared point) markers
pub const JUNCTION_COLOR: Color = Color::srgb(1.0, 0.55, 0.0);

/// Marker or segment under the pointer in edit mode
pub const HOVER_HIGHLIGHT: Color = Color::srgb(1.0, 1.0, 0.4);

/// Snap target indicator while dragging
pub const SNAP_INDICATOR: Color = Color::srgb(0.2, 1.0, 0.6);

/// Branch colors in edit mode, indexed by stable branch order
pub const BRANCH_PALETTE: [Color; 8] = [
    Color::srgb(0.0, 0.47, 1.0),
    Color::srgb(1.0, 0.2, 0.2),
    Color::srgb(0.2, 0.8, 0.2),
    Color::srgb(1.0, 0.6, 0.0),
    Color::srgb(0.6, 0.2, 0.8),
    Color::srgb(0.0, 0.8, 0.8),
    Color::srgb(1.0, 0.4, 0.8),
    Color::srgb(0.6, 0.4, 0.2),
];

/// Color for a branch given its position in stable id order
pub fn branch_color(order: usize) -> Color {
    BRANCH_PALETTE[order % BRANCH_PALETTE.len()]
}

// ============================================================================
// Drawing Preview Colors
// ============================================================================

/// Pending line / branch preview
pub const PREVIEW_COLOR: Color = Color::srgba(0.2, 0.6, 1.0, 0.9);

/// Image outline when no background could be loaded
pub const IMAGE_OUTLINE: Color = Color::srgba(0.5, 0.5, 0.5, 0.4);

// ============================================================================
// UI Colors (egui)
// ============================================================================

/// Secondary toolbar background
pub const TOOL_SETTINGS_BG: egui::Color32 = egui::Color32::from_rgb(45, 45, 48);

/// Error text in dialogs
pub const ERROR_TEXT: egui::Color32 = egui::Color32::from_rgb(230, 90, 90);

/// Muted hint text
pub const HINT_TEXT: egui::Color32 = egui::Color32::GRAY;
