//! Gizmo group and [`Painter`] implementation for map features.

use std::f32::consts::SQRT_2;

use bevy::gizmos::config::{GizmoConfigGroup, GizmoConfigStore};
use bevy::prelude::*;

use crate::constants::MAX_STROKE_WIDTH;
use crate::map::{MarkerShape, Painter};

use super::params::view_to_world;

/// Custom gizmo group for pins, lines and editing previews
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct MapGizmoGroup;

/// Thin single-pixel strokes; wide lines are built from parallel strokes.
pub fn configure_map_gizmos(mut config_store: ResMut<GizmoConfigStore>) {
    let (config, _) = config_store.config_mut::<MapGizmoGroup>();
    config.line.width = 1.0;
}

/// Draws view-space shapes with gizmos for a camera sitting at the origin.
pub struct GizmoPainter<'a, 'w, 's> {
    pub gizmos: &'a mut Gizmos<'w, 's, MapGizmoGroup>,
    pub window_size: Vec2,
}

impl GizmoPainter<'_, '_, '_> {
    fn world(&self, view: Vec2) -> Vec2 {
        view_to_world(view, self.window_size)
    }
}

/// Offsets across the stroke for a line `width` pixels wide.
pub fn stroke_offsets(width: f32) -> impl Iterator<Item = f32> {
    let strokes = width.round().max(1.0).min(MAX_STROKE_WIDTH) as usize;
    let half = (strokes - 1) as f32 * 0.5;
    (0..strokes).map(move |i| i as f32 - half)
}

impl Painter for GizmoPainter<'_, '_, '_> {
    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        let a = self.world(from);
        let b = self.world(to);
        let normal = (b - a).normalize_or_zero().perp();
        for offset in stroke_offsets(width) {
            self.gizmos
                .line_2d(a + normal * offset, b + normal * offset, color);
        }
    }

    fn marker(&mut self, center: Vec2, shape: MarkerShape, radius: f32, color: Color) {
        let center = self.world(center);
        match shape {
            MarkerShape::Circle => {
                self.gizmos
                    .circle_2d(Isometry2d::from_translation(center), radius, color);
            }
            MarkerShape::Square => {
                self.gizmos.rect_2d(
                    Isometry2d::from_translation(center),
                    Vec2::splat(radius * 2.0),
                    color,
                );
            }
            MarkerShape::Diamond => {
                self.gizmos.rect_2d(
                    Isometry2d::new(center, Rot2::degrees(45.0)),
                    Vec2::splat(radius * SQRT_2),
                    color,
                );
            }
        }
    }
}
