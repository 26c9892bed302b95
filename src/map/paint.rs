//! Drawing surface used by map items.
//!
//! Items describe what they look like in view coordinates through [`Painter`];
//! the editor implements it on top of gizmos. Tests use [`RecordingPainter`].

use bevy::math::Vec2;
use bevy::prelude::Color;

use super::style::{DashPattern, Dasher};

/// Marker glyph for points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Square,
    Diamond,
}

pub trait Painter {
    /// Straight stroke between two view positions.
    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color);

    /// Point marker centered at a view position.
    fn marker(&mut self, center: Vec2, shape: MarkerShape, radius: f32, color: Color);

    /// Polyline with an optional dash pattern.
    fn polyline(&mut self, points: &[Vec2], width: f32, pattern: DashPattern, color: Color) {
        let mut dasher = Dasher::new(pattern.lengths(), width.max(1.0));
        let mut pieces = Vec::new();
        for pair in points.windows(2) {
            dasher.segment(pair[0], pair[1], &mut pieces);
        }
        for (a, b) in pieces {
            self.line(a, b, width, color);
        }
    }
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    Line { from: Vec2, to: Vec2, width: f32 },
    Marker { center: Vec2, shape: MarkerShape, radius: f32 },
}

/// Painter that records every call, for assertions in tests.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingPainter {
    pub ops: Vec<PaintOp>,
}

#[cfg(test)]
impl RecordingPainter {
    pub fn markers(&self) -> Vec<(Vec2, MarkerShape)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Marker { center, shape, .. } => Some((*center, *shape)),
                PaintOp::Line { .. } => None,
            })
            .collect()
    }

    pub fn line_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PaintOp::Line { .. }))
            .count()
    }
}

#[cfg(test)]
impl Painter for RecordingPainter {
    fn line(&mut self, from: Vec2, to: Vec2, width: f32, _color: Color) {
        self.ops.push(PaintOp::Line { from, to, width });
    }

    fn marker(&mut self, center: Vec2, shape: MarkerShape, radius: f32, _color: Color) {
        self.ops.push(PaintOp::Marker {
            center,
            shape,
            radius,
        });
    }
}
