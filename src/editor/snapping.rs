//! Snapping of dragged and newly placed line points onto existing geometry.
//!
//! Control points win over segments; within a kind the nearest candidate wins.

use bevy::math::{IVec2, Vec2};

use crate::common::FeatureKey;
use crate::map::MapFeature;
use crate::map::line::nearest_on_segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapKind {
    Point,
    Segment,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    pub position: IVec2,
    pub kind: SnapKind,
}

/// Geometry that must not attract the point being moved: everything of
/// `key` sitting at `position` (the dragged point and its junction partners),
/// plus the segments attached to it.
pub struct SnapExclusion<'a> {
    pub key: &'a FeatureKey,
    pub position: IVec2,
}

/// Find a snap target within `threshold` canonical units of `position`.
pub fn find_snap<'a>(
    features: impl IntoIterator<Item = &'a MapFeature>,
    position: Vec2,
    threshold: f32,
    exclude: Option<&SnapExclusion>,
) -> Option<Snap> {
    let mut best_point: Option<(f32, IVec2)> = None;
    let mut best_segment: Option<(f32, Vec2)> = None;

    for feature in features {
        let excluded_at = exclude
            .filter(|e| *e.key == feature.key())
            .map(|e| e.position);

        match feature {
            MapFeature::Pin(pin) => {
                consider_point(&mut best_point, position, pin.position(), threshold);
            }
            MapFeature::Line(line) => {
                for branch in line.geometry().branches() {
                    for point in branch {
                        if Some(*point) == excluded_at {
                            continue;
                        }
                        consider_point(&mut best_point, position, *point, threshold);
                    }
                    for pair in branch.windows(2) {
                        if excluded_at.is_some_and(|x| pair[0] == x || pair[1] == x) {
                            continue;
                        }
                        let (nearest, distance) =
                            nearest_on_segment(position, pair[0].as_vec2(), pair[1].as_vec2());
                        if distance <= threshold
                            && best_segment.is_none_or(|(d, _)| distance < d)
                        {
                            best_segment = Some((distance, nearest));
                        }
                    }
                }
            }
        }
    }

    if let Some((_, point)) = best_point {
        return Some(Snap {
            position: point,
            kind: SnapKind::Point,
        });
    }
    best_segment.map(|(_, nearest)| Snap {
        position: nearest.round().as_ivec2(),
        kind: SnapKind::Segment,
    })
}

fn consider_point(best: &mut Option<(f32, IVec2)>, position: Vec2, point: IVec2, threshold: f32) {
    let distance = position.distance(point.as_vec2());
    if distance <= threshold && best.is_none_or(|(d, _)| distance < d) {
        *best = Some((distance, point));
    }
}
