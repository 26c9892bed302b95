//! Mapping between canonical image-pixel space and view (screen) space.
//!
//! `view = canonical * zoom + pan`. View space has its origin at the top-left
//! of the window with y pointing down, the same as the background image.
//! This is the only place zoom and pan live; everything that needs view
//! coordinates asks the [`ViewTransform`].

use bevy::math::{IVec2, UVec2, Vec2};

use crate::constants::{MAX_ZOOM, MIN_ZOOM};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransform {
    pan: Vec2,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
    /// Background image size; `None` when no image is loaded
    image_size: Option<UVec2>,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            image_size: None,
        }
    }
}

impl ViewTransform {
    pub fn new(pan: Vec2, zoom: f32) -> Self {
        let mut view = Self::default();
        view.pan = pan;
        view.zoom = view.clamp_zoom(zoom);
        view
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn image_size(&self) -> Option<UVec2> {
        self.image_size
    }

    pub fn set_image_size(&mut self, size: Option<UVec2>) {
        self.image_size = size;
    }

    /// Update the zoom limits; the current zoom is pulled into the new range.
    pub fn set_zoom_limits(&mut self, min_zoom: f32, max_zoom: f32) {
        let min_zoom = min_zoom.max(f32::EPSILON);
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom.max(min_zoom);
        self.zoom = self.clamp_zoom(self.zoom);
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        if zoom.is_finite() {
            zoom.clamp(self.min_zoom, self.max_zoom)
        } else {
            self.zoom
        }
    }

    /// View position to canonical position (unclamped, sub-pixel).
    pub fn to_canonical(&self, view: Vec2) -> Vec2 {
        (view - self.pan) / self.zoom
    }

    /// View position to the nearest integer canonical point.
    pub fn to_canonical_point(&self, view: Vec2) -> IVec2 {
        self.to_canonical(view).round().as_ivec2()
    }

    /// Canonical position to view position.
    pub fn to_view(&self, canonical: Vec2) -> Vec2 {
        canonical * self.zoom + self.pan
    }

    pub fn point_to_view(&self, canonical: IVec2) -> Vec2 {
        self.to_view(canonical.as_vec2())
    }

    /// Restrict a canonical point to the image area `[0, w) x [0, h)`.
    ///
    /// Without a background image there is nothing to clamp against.
    pub fn clamp(&self, point: IVec2) -> IVec2 {
        match self.image_size {
            Some(size) if size.x > 0 && size.y > 0 => {
                let max = size.as_ivec2() - IVec2::ONE;
                point.clamp(IVec2::ZERO, max)
            }
            _ => point,
        }
    }

    /// Set a new zoom while keeping the canonical point under `anchor_view` fixed.
    pub fn zoom_at(&mut self, anchor_view: Vec2, new_zoom: f32) {
        let new_zoom = self.clamp_zoom(new_zoom);
        if (new_zoom - self.zoom).abs() < f32::EPSILON {
            return;
        }
        let anchor = self.to_canonical(anchor_view);
        self.zoom = new_zoom;
        self.pan = anchor_view - anchor * self.zoom;
    }

    /// Multiply the zoom by `factor` around `anchor_view`.
    pub fn zoom_by(&mut self, anchor_view: Vec2, factor: f32) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        self.zoom_at(anchor_view, self.zoom * factor);
    }

    pub fn pan_by(&mut self, delta_view: Vec2) {
        self.pan += delta_view;
    }

    /// Fit the image into the viewport, centered, never zooming past 1:1.
    pub fn fit(&mut self, viewport: Vec2) {
        let Some(size) = self.image_size else {
            self.pan = Vec2::ZERO;
            return;
        };
        if size.x == 0 || size.y == 0 || viewport.x <= 0.0 || viewport.y <= 0.0 {
            return;
        }
        let image = size.as_vec2();
        let fit_zoom = (viewport.x / image.x).min(viewport.y / image.y).min(1.0);
        self.zoom = self.clamp_zoom(fit_zoom);
        self.pan = (viewport - image * self.zoom) * 0.5;
    }

    /// Convert a tolerance in view pixels into canonical units.
    pub fn view_to_canonical_distance(&self, pixels: f32) -> f32 {
        pixels / self.zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec2, b: Vec2, tolerance: f32) {
        assert!(
            a.distance(b) <= tolerance,
            "{:?} and {:?} differ by more than {}",
            a,
            b,
            tolerance
        );
    }

    #[test]
    fn test_default_is_identity() {
        let view = ViewTransform::default();
        assert_eq!(view.to_view(Vec2::new(12.0, 34.0)), Vec2::new(12.0, 34.0));
        assert_eq!(view.to_canonical(Vec2::new(12.0, 34.0)), Vec2::new(12.0, 34.0));
    }

    #[test]
    fn test_round_trip_across_zoom_and_pan() {
        let pans = [
            Vec2::ZERO,
            Vec2::new(-3000.0, -2000.0),
            Vec2::new(800.0, 450.0),
        ];
        let samples = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1599.0, 899.0),
            Vec2::new(800.0, 450.0),
            Vec2::new(17.3, 923.9),
        ];
        for zoom in [0.25, 1.0, 4.0] {
            for pan in pans {
                let view = ViewTransform::new(pan, zoom);
                for p in samples {
                    assert_close(view.to_view(view.to_canonical(p)), p, 1.0);
                }
            }
        }
    }

    #[test]
    fn test_round_trip_through_integer_point() {
        let view = ViewTransform::new(Vec2::new(5.0, 7.0), 0.25);
        let canonical = IVec2::new(400, 300);
        let back = view.to_canonical_point(view.point_to_view(canonical));
        assert_eq!(back, canonical);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut view = ViewTransform::new(Vec2::new(30.0, -10.0), 1.0);
        let anchor = Vec2::new(320.0, 240.0);
        let before = view.to_canonical(anchor);

        view.zoom_at(anchor, 2.0);

        assert_eq!(view.zoom(), 2.0);
        assert_close(view.to_canonical(anchor), before, 1e-3);
        assert_close(view.to_view(before), anchor, 1e-3);
    }

    #[test]
    fn test_repeated_zoom_does_not_drift() {
        let mut view = ViewTransform::default();
        let anchor = Vec2::new(611.0, 97.0);
        let before = view.to_canonical(anchor);
        for _ in 0..20 {
            view.zoom_by(anchor, 1.1);
        }
        for _ in 0..20 {
            view.zoom_by(anchor, 1.0 / 1.1);
        }
        assert_close(view.to_canonical(anchor), before, 0.5);
    }

    #[test]
    fn test_zoom_clamped_to_limits() {
        let mut view = ViewTransform::default();
        view.zoom_at(Vec2::ZERO, 50.0);
        assert_eq!(view.zoom(), MAX_ZOOM);
        view.zoom_at(Vec2::ZERO, 0.001);
        assert_eq!(view.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_zoom_at_limit_leaves_pan_alone() {
        let mut view = ViewTransform::new(Vec2::new(12.0, 12.0), MAX_ZOOM);
        view.zoom_at(Vec2::new(100.0, 100.0), MAX_ZOOM * 2.0);
        assert_eq!(view.pan(), Vec2::new(12.0, 12.0));
    }

    #[test]
    fn test_zoom_by_ignores_bad_factor() {
        let mut view = ViewTransform::default();
        view.zoom_by(Vec2::ZERO, 0.0);
        view.zoom_by(Vec2::ZERO, -2.0);
        view.zoom_by(Vec2::ZERO, f32::NAN);
        assert_eq!(view.zoom(), 1.0);
    }

    #[test]
    fn test_set_zoom_limits_pulls_zoom_into_range() {
        let mut view = ViewTransform::new(Vec2::ZERO, 8.0);
        view.set_zoom_limits(0.5, 4.0);
        assert_eq!(view.zoom(), 4.0);
    }

    #[test]
    fn test_clamp_to_image() {
        let mut view = ViewTransform::default();
        view.set_image_size(Some(UVec2::new(100, 50)));
        assert_eq!(view.clamp(IVec2::new(-5, 20)), IVec2::new(0, 20));
        assert_eq!(view.clamp(IVec2::new(100, 50)), IVec2::new(99, 49));
        assert_eq!(view.clamp(IVec2::new(42, 7)), IVec2::new(42, 7));
    }

    #[test]
    fn test_clamp_without_image_is_identity() {
        let view = ViewTransform::default();
        assert_eq!(view.clamp(IVec2::new(-5, 9000)), IVec2::new(-5, 9000));
    }

    #[test]
    fn test_pan_by() {
        let mut view = ViewTransform::default();
        view.pan_by(Vec2::new(10.0, -4.0));
        assert_eq!(view.to_view(Vec2::ZERO), Vec2::new(10.0, -4.0));
    }

    #[test]
    fn test_fit_centers_image() {
        let mut view = ViewTransform::default();
        view.set_image_size(Some(UVec2::new(2000, 1000)));
        view.fit(Vec2::new(1000.0, 1000.0));
        assert_eq!(view.zoom(), 0.5);
        assert_close(view.to_view(Vec2::new(1000.0, 500.0)), Vec2::new(500.0, 500.0), 1e-3);
    }

    #[test]
    fn test_fit_small_image_stays_one_to_one() {
        let mut view = ViewTransform::default();
        view.set_image_size(Some(UVec2::new(100, 100)));
        view.fit(Vec2::new(1000.0, 800.0));
        assert_eq!(view.zoom(), 1.0);
        assert_eq!(view.pan(), Vec2::new(450.0, 350.0));
    }

    #[test]
    fn test_tolerance_shrinks_when_zoomed_in() {
        let view = ViewTransform::new(Vec2::ZERO, 4.0);
        assert_eq!(view.view_to_canonical_distance(8.0), 2.0);
    }
}
