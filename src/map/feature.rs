//! Map features (pins and lines) behind one interface, plus the scene registry.
//!
//! Items never reach back into the scene. Anything the outside world needs to
//! know about (navigation, geometry edits, rejected edits) is returned as a
//! [`FeatureNotification`] from [`MapFeature::on_event`].

use std::collections::BTreeMap;
use std::time::Duration;

use bevy::math::{IVec2, Rect, Vec2};

use crate::common::{FeatureKey, FeatureKind, Modifiers};

use super::coords::ViewTransform;
use super::geometry::{GeometryData, GeometryError, PointRef};
use super::line::LineItem;
use super::paint::Painter;
use super::pin::PinItem;

/// Which part of a feature a position falls on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitPart {
    Pin,
    ControlPoint(PointRef),
    /// A segment between points `segment` and `segment + 1` of a branch
    Segment {
        branch: usize,
        segment: usize,
        nearest: Vec2,
    },
}

/// One candidate from a feature's own hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemHit {
    pub part: HitPart,
    /// Distance from the query position, canonical units
    pub distance: f32,
}

/// Hit radii already converted to canonical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRadii {
    pub pin: f32,
    pub control_point: f32,
    pub junction: f32,
    pub segment: f32,
}

impl HitRadii {
    pub fn scaled(&self, factor: f32) -> HitRadii {
        HitRadii {
            pin: self.pin * factor,
            control_point: self.control_point * factor,
            junction: self.junction * factor,
            segment: self.segment * factor,
        }
    }
}

/// Input routed to a single feature. Positions are clamped canonical points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemEvent {
    Press {
        part: HitPart,
        at: IVec2,
        modifiers: Modifiers,
    },
    Drag {
        at: IVec2,
    },
    Release {
        at: IVec2,
    },
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemContext {
    pub now: Duration,
    pub edit_mode: bool,
    /// Clicks this soon after a pin was created do not navigate
    pub suppression: Duration,
}

/// View-space marker radii for painting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerRadii {
    pub pin: f32,
    pub control_point: f32,
    pub junction: f32,
}

pub struct PaintContext<'a> {
    pub view: &'a ViewTransform,
    pub edit_mode: bool,
    pub hovered: Option<HitPart>,
    pub radii: MarkerRadii,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureNotification {
    /// The user activated a feature; the host should show its target
    Navigate { target: String },
    /// Committed geometry change to persist
    GeometryChanged {
        key: FeatureKey,
        geometry: GeometryData,
    },
    /// An edit was refused; nothing changed
    Rejected {
        key: FeatureKey,
        error: GeometryError,
    },
}

#[derive(Debug, Clone)]
pub enum MapFeature {
    Pin(PinItem),
    Line(LineItem),
}

impl MapFeature {
    pub fn key(&self) -> FeatureKey {
        match self {
            MapFeature::Pin(pin) => FeatureKey::pin(pin.target()),
            MapFeature::Line(line) => FeatureKey::line(line.target()),
        }
    }

    pub fn kind(&self) -> FeatureKind {
        match self {
            MapFeature::Pin(_) => FeatureKind::Pin,
            MapFeature::Line(_) => FeatureKind::Line,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            MapFeature::Pin(pin) => pin.target(),
            MapFeature::Line(line) => line.target(),
        }
    }

    /// Canonical-space box enclosing everything the feature draws.
    pub fn bounding_box(&self, radii: &HitRadii) -> Rect {
        match self {
            MapFeature::Pin(pin) => pin.bounding_box(radii.pin),
            MapFeature::Line(line) => line.bounding_box(
                radii
                    .junction
                    .max(radii.segment)
                    .max(radii.control_point),
            ),
        }
    }

    pub fn hit_test(&self, position: Vec2, radii: &HitRadii, edit_mode: bool) -> Vec<ItemHit> {
        match self {
            MapFeature::Pin(pin) => pin.hit_test(position, radii.pin).into_iter().collect(),
            MapFeature::Line(line) => line.hit_test(position, radii, edit_mode),
        }
    }

    pub fn paint(&mut self, painter: &mut dyn Painter, ctx: &PaintContext) {
        match self {
            MapFeature::Pin(pin) => pin.paint(painter, ctx),
            MapFeature::Line(line) => line.paint(painter, ctx),
        }
    }

    pub fn on_event(&mut self, event: ItemEvent, ctx: &ItemContext) -> Vec<FeatureNotification> {
        match self {
            MapFeature::Pin(pin) => pin.on_event(event, ctx),
            MapFeature::Line(line) => line.on_event(event, ctx),
        }
    }

    /// Whether a press started a drag that the feature still owns.
    pub fn is_dragging(&self) -> bool {
        match self {
            MapFeature::Pin(pin) => pin.is_dragging(),
            MapFeature::Line(line) => line.dragging().is_some(),
        }
    }

    pub fn as_line(&self) -> Option<&LineItem> {
        match self {
            MapFeature::Line(line) => Some(line),
            MapFeature::Pin(_) => None,
        }
    }

    pub fn as_line_mut(&mut self) -> Option<&mut LineItem> {
        match self {
            MapFeature::Line(line) => Some(line),
            MapFeature::Pin(_) => None,
        }
    }

    pub fn as_pin(&self) -> Option<&PinItem> {
        match self {
            MapFeature::Pin(pin) => Some(pin),
            MapFeature::Line(_) => None,
        }
    }
}

/// Live features of the open map, at most one per (target, kind).
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    features: BTreeMap<FeatureKey, MapFeature>,
}

impl FeatureRegistry {
    /// Insert a feature, replacing any existing one with the same key in one step.
    pub fn insert(&mut self, feature: MapFeature) -> Option<MapFeature> {
        self.features.insert(feature.key(), feature)
    }

    pub fn get(&self, key: &FeatureKey) -> Option<&MapFeature> {
        self.features.get(key)
    }

    pub fn get_mut(&mut self, key: &FeatureKey) -> Option<&mut MapFeature> {
        self.features.get_mut(key)
    }

    pub fn contains(&self, key: &FeatureKey) -> bool {
        self.features.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn clear(&mut self) {
        self.features.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapFeature> {
        self.features.values()
    }

    pub fn count_of(&self, kind: FeatureKind) -> usize {
        self.features.keys().filter(|k| k.kind == kind).count()
    }

    /// Lines first, then pins, so pins draw on top.
    pub fn paint_order_mut(&mut self) -> impl Iterator<Item = &mut MapFeature> {
        let (pins, lines): (Vec<_>, Vec<_>) = self
            .features
            .values_mut()
            .partition(|f| f.kind() == FeatureKind::Pin);
        lines.into_iter().chain(pins)
    }

    /// A target name not yet used by any feature of `kind`, like "Pin 3".
    pub fn unused_name(&self, kind: FeatureKind) -> String {
        (1..)
            .map(|n| format!("{} {}", kind.display_name(), n))
            .find(|name| {
                !self.contains(&FeatureKey {
                    kind,
                    target: name.clone(),
                })
            })
            .unwrap_or_else(|| kind.display_name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::geometry::LineGeometry;
    use crate::map::style::LineStyle;

    fn pin(target: &str, x: i32, y: i32) -> MapFeature {
        MapFeature::Pin(PinItem::loaded(target, IVec2::new(x, y)))
    }

    fn line(target: &str) -> MapFeature {
        let geometry = LineGeometry::new(vec![IVec2::ZERO, IVec2::new(10, 0)], 2).unwrap();
        MapFeature::Line(LineItem::new(target, geometry, LineStyle::default()))
    }

    #[test]
    fn test_registry_replaces_duplicate_key() {
        let mut registry = FeatureRegistry::default();
        assert!(registry.insert(pin("Town", 1, 1)).is_none());
        let replaced = registry.insert(pin("Town", 5, 5));
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 1);
        let current = registry.get(&FeatureKey::pin("Town")).unwrap();
        assert_eq!(current.as_pin().unwrap().position(), IVec2::new(5, 5));
    }

    #[test]
    fn test_registry_same_target_different_kinds() {
        let mut registry = FeatureRegistry::default();
        registry.insert(pin("Town", 1, 1));
        registry.insert(line("Town"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.count_of(FeatureKind::Pin), 1);
        assert_eq!(registry.count_of(FeatureKind::Line), 1);
    }

    #[test]
    fn test_paint_order_lines_before_pins() {
        let mut registry = FeatureRegistry::default();
        registry.insert(pin("A", 1, 1));
        registry.insert(line("B"));
        let kinds: Vec<FeatureKind> = registry.paint_order_mut().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec![FeatureKind::Line, FeatureKind::Pin]);
    }

    #[test]
    fn test_unused_name_skips_taken() {
        let mut registry = FeatureRegistry::default();
        registry.insert(pin("Pin 1", 0, 0));
        registry.insert(pin("Pin 2", 0, 0));
        assert_eq!(registry.unused_name(FeatureKind::Pin), "Pin 3");
        assert_eq!(registry.unused_name(FeatureKind::Line), "Line 1");
    }

    #[test]
    fn test_hit_radii_scaled() {
        let radii = HitRadii {
            pin: 10.0,
            control_point: 6.0,
            junction: 8.0,
            segment: 8.0,
        };
        assert_eq!(radii.scaled(0.5).pin, 5.0);
        assert_eq!(radii.scaled(2.0).segment, 16.0);
    }
}
