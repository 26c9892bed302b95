//! Pin item: a single point feature that navigates to its target when clicked.

use std::time::Duration;

use bevy::math::{IVec2, Rect, Vec2};
use bevy::prelude::*;

use crate::common::FeatureKey;
use crate::theme;

use super::feature::{FeatureNotification, HitPart, ItemContext, ItemEvent, ItemHit, PaintContext};
use super::geometry::GeometryData;
use super::paint::{MarkerShape, Painter};

#[derive(Debug, Clone)]
pub struct PinItem {
    target: String,
    position: IVec2,
    /// Elapsed app time when the user placed this pin; `None` for loaded pins
    created_at: Option<Duration>,
    /// Position before the current drag started
    drag_origin: Option<IVec2>,
    /// A drag event arrived since the press
    drag_moved: bool,
}

impl PinItem {
    /// A pin the user just placed.
    pub fn placed(target: impl Into<String>, position: IVec2, now: Duration) -> Self {
        Self {
            target: target.into(),
            position,
            created_at: Some(now),
            drag_origin: None,
            drag_moved: false,
        }
    }

    /// A pin restored from the store.
    pub fn loaded(target: impl Into<String>, position: IVec2) -> Self {
        Self {
            target: target.into(),
            position,
            created_at: None,
            drag_origin: None,
            drag_moved: false,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn position(&self) -> IVec2 {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    /// True while clicks should be ignored because the pin was just created.
    pub fn is_activation_suppressed(&self, now: Duration, window: Duration) -> bool {
        self.created_at
            .is_some_and(|created| now.saturating_sub(created) < window)
    }

    pub fn bounding_box(&self, radius: f32) -> Rect {
        Rect::from_center_half_size(self.position.as_vec2(), Vec2::splat(radius))
    }

    pub fn hit_test(&self, position: Vec2, radius: f32) -> Option<ItemHit> {
        let distance = position.distance(self.position.as_vec2());
        (distance <= radius).then_some(ItemHit {
            part: HitPart::Pin,
            distance,
        })
    }

    pub fn paint(&self, painter: &mut dyn Painter, ctx: &PaintContext) {
        let center = ctx.view.point_to_view(self.position);
        painter.marker(center, MarkerShape::Circle, ctx.radii.pin, theme::PIN_COLOR);
        painter.marker(
            center,
            MarkerShape::Circle,
            ctx.radii.pin * 0.35,
            Color::WHITE,
        );
        if ctx.hovered == Some(HitPart::Pin) || self.is_dragging() {
            painter.marker(
                center,
                MarkerShape::Circle,
                ctx.radii.pin + 3.0,
                theme::PIN_HOVER_RING,
            );
        }
    }

    pub fn on_event(&mut self, event: ItemEvent, ctx: &ItemContext) -> Vec<FeatureNotification> {
        match event {
            ItemEvent::Press { .. } if ctx.edit_mode => {
                self.drag_origin = Some(self.position);
                self.drag_moved = false;
                Vec::new()
            }
            ItemEvent::Press { .. } => {
                if self.is_activation_suppressed(ctx.now, ctx.suppression) {
                    debug!("Ignoring click on just-created pin '{}'", self.target);
                    return Vec::new();
                }
                vec![FeatureNotification::Navigate {
                    target: self.target.clone(),
                }]
            }
            ItemEvent::Drag { at } => {
                if self.is_dragging() {
                    self.drag_moved = true;
                    self.position = at;
                }
                Vec::new()
            }
            ItemEvent::Release { at } => {
                let Some(origin) = self.drag_origin.take() else {
                    return Vec::new();
                };
                if !std::mem::take(&mut self.drag_moved) {
                    return Vec::new();
                }
                self.position = at;
                if self.position == origin {
                    return Vec::new();
                }
                info!("Pin '{}' moved to {}", self.target, self.position);
                vec![FeatureNotification::GeometryChanged {
                    key: FeatureKey::pin(&self.target),
                    geometry: GeometryData::Point(self.position),
                }]
            }
            ItemEvent::Cancel => {
                if let Some(origin) = self.drag_origin.take() {
                    self.position = origin;
                }
                self.drag_moved = false;
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Modifiers;
    use crate::map::coords::ViewTransform;
    use crate::map::feature::MarkerRadii;
    use crate::map::paint::RecordingPainter;

    const WINDOW: Duration = Duration::from_millis(500);

    fn ctx(now_ms: u64, edit_mode: bool) -> ItemContext {
        ItemContext {
            now: Duration::from_millis(now_ms),
            edit_mode,
            suppression: WINDOW,
        }
    }

    fn press(at: IVec2) -> ItemEvent {
        ItemEvent::Press {
            part: HitPart::Pin,
            at,
            modifiers: Modifiers::NONE,
        }
    }

    #[test]
    fn test_click_within_suppression_window_ignored() {
        let mut pin = PinItem::placed("Town", IVec2::new(100, 100), Duration::ZERO);
        let out = pin.on_event(press(IVec2::new(100, 100)), &ctx(100, false));
        assert!(out.is_empty());
    }

    #[test]
    fn test_click_after_suppression_window_navigates() {
        let mut pin = PinItem::placed("Town", IVec2::new(100, 100), Duration::ZERO);
        let out = pin.on_event(press(IVec2::new(100, 100)), &ctx(600, false));
        assert_eq!(
            out,
            vec![FeatureNotification::Navigate {
                target: "Town".to_string()
            }]
        );
    }

    #[test]
    fn test_loaded_pin_never_suppressed() {
        let pin = PinItem::loaded("Town", IVec2::ZERO);
        assert!(!pin.is_activation_suppressed(Duration::ZERO, WINDOW));
    }

    #[test]
    fn test_edit_mode_click_does_not_navigate() {
        let mut pin = PinItem::loaded("Town", IVec2::ZERO);
        let out = pin.on_event(press(IVec2::ZERO), &ctx(10_000, true));
        assert!(out.is_empty());
        assert!(pin.is_dragging());
    }

    #[test]
    fn test_drag_commits_on_release() {
        let mut pin = PinItem::loaded("Town", IVec2::new(10, 10));
        let c = ctx(0, true);
        pin.on_event(press(IVec2::new(10, 10)), &c);
        assert!(pin.on_event(ItemEvent::Drag { at: IVec2::new(20, 15) }, &c).is_empty());
        assert_eq!(pin.position(), IVec2::new(20, 15));

        let out = pin.on_event(ItemEvent::Release { at: IVec2::new(30, 30) }, &c);
        assert_eq!(
            out,
            vec![FeatureNotification::GeometryChanged {
                key: FeatureKey::pin("Town"),
                geometry: GeometryData::Point(IVec2::new(30, 30)),
            }]
        );
        assert!(!pin.is_dragging());
    }

    #[test]
    fn test_release_without_movement_is_silent() {
        let mut pin = PinItem::loaded("Town", IVec2::new(10, 10));
        let c = ctx(0, true);
        pin.on_event(press(IVec2::new(10, 10)), &c);
        assert!(pin.on_event(ItemEvent::Release { at: IVec2::new(10, 10) }, &c).is_empty());
    }

    #[test]
    fn test_click_off_center_does_not_move() {
        let mut pin = PinItem::loaded("Town", IVec2::new(10, 10));
        let c = ctx(0, true);
        pin.on_event(press(IVec2::new(13, 12)), &c);
        assert!(pin.on_event(ItemEvent::Release { at: IVec2::new(13, 12) }, &c).is_empty());
        assert_eq!(pin.position(), IVec2::new(10, 10));
        assert!(!pin.is_dragging());
    }

    #[test]
    fn test_cancel_restores_position() {
        let mut pin = PinItem::loaded("Town", IVec2::new(10, 10));
        let c = ctx(0, true);
        pin.on_event(press(IVec2::new(10, 10)), &c);
        pin.on_event(ItemEvent::Drag { at: IVec2::new(50, 50) }, &c);
        pin.on_event(ItemEvent::Cancel, &c);
        assert_eq!(pin.position(), IVec2::new(10, 10));
    }

    #[test]
    fn test_drag_without_press_ignored() {
        let mut pin = PinItem::loaded("Town", IVec2::new(10, 10));
        pin.on_event(ItemEvent::Drag { at: IVec2::new(50, 50) }, &ctx(0, true));
        assert_eq!(pin.position(), IVec2::new(10, 10));
    }

    #[test]
    fn test_hit_test_radius() {
        let pin = PinItem::loaded("Town", IVec2::new(100, 100));
        assert!(pin.hit_test(Vec2::new(106.0, 100.0), 10.0).is_some());
        assert!(pin.hit_test(Vec2::new(111.0, 100.0), 10.0).is_none());
    }

    #[test]
    fn test_paint_uses_view_position() {
        let pin = PinItem::loaded("Town", IVec2::new(10, 20));
        let view = ViewTransform::new(Vec2::new(5.0, 5.0), 2.0);
        let mut painter = RecordingPainter::default();
        let ctx = PaintContext {
            view: &view,
            edit_mode: false,
            hovered: None,
            radii: MarkerRadii {
                pin: 8.0,
                control_point: 6.0,
                junction: 8.0,
            },
        };
        pin.paint(&mut painter, &ctx);
        let markers = painter.markers();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].0, Vec2::new(25.0, 45.0));
    }
}
