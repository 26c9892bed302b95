//! The open map: background, features, view and the edit controller.
//!
//! [`MapScene`] is a plain resource so every interaction can be driven and
//! tested without an `App`. Bevy systems only translate window input into
//! [`PointerInput`]/[`EditorKey`] and forward the returned notifications.

use std::path::PathBuf;
use std::time::Duration;

use bevy::prelude::*;

use crate::config::EditorSettings;
use crate::map::{FeatureNotification, FeatureRegistry, MapFeature, PaintContext, Painter, ViewTransform};

use super::controller::{ControllerEnv, EditController, EditorKey, PointerInput};
use super::tools::ModeKind;

/// Background image of the open map.
#[derive(Debug, Clone)]
pub struct Background {
    pub handle: Handle<Image>,
    pub path: PathBuf,
    /// Pixel size; defines the canonical coordinate space
    pub size: UVec2,
}

#[derive(Resource, Default)]
pub struct MapScene {
    map_id: Option<String>,
    view: ViewTransform,
    background: Option<Background>,
    registry: FeatureRegistry,
    controller: EditController,
    settings: EditorSettings,
    /// Window size in logical pixels, used to fit the image on open
    viewport: Vec2,
}

impl MapScene {
    pub fn new(settings: EditorSettings) -> Self {
        let mut scene = Self::default();
        scene.set_settings(settings);
        scene
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Attach a freshly loaded map, replacing whatever was open.
    pub fn open(
        &mut self,
        map_id: String,
        features: Vec<MapFeature>,
        background: Option<Background>,
        viewport: Vec2,
    ) {
        self.close();

        self.view = ViewTransform::default();
        self.view
            .set_zoom_limits(self.settings.min_zoom, self.settings.max_zoom);
        self.view.set_image_size(background.as_ref().map(|b| b.size));
        self.viewport = viewport;
        self.view.fit(viewport);

        for feature in features {
            self.register(feature);
        }

        self.background = background;
        self.map_id = Some(map_id);
    }

    /// Detach the map. Pending drawing and drags are discarded.
    pub fn close(&mut self) {
        let (controller, mut env) = self.split(Duration::ZERO);
        controller.reset(&mut env);
        self.registry.clear();
        self.background = None;
        self.view.set_image_size(None);
        self.map_id = None;
    }

    pub fn map_id(&self) -> Option<&str> {
        self.map_id.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.map_id.is_some()
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Drop a background the renderer could not load; editing continues without it.
    pub fn clear_background(&mut self) {
        if let Some(background) = self.background.take() {
            warn!("Background {:?} unavailable; continuing without it", background.path);
        }
        self.view.set_image_size(None);
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn controller(&self) -> &EditController {
        &self.controller
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: EditorSettings) {
        self.view.set_zoom_limits(settings.min_zoom, settings.max_zoom);
        self.settings = settings;
    }

    pub fn mode(&self) -> ModeKind {
        self.controller.kind()
    }

    /// Name for the next pin or line; blank means auto-named.
    pub fn draft_target_mut(&mut self) -> &mut String {
        &mut self.controller.state_mut().draft_target
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    /// Recenter and fit the background into the window.
    pub fn fit_to_view(&mut self) {
        self.view.fit(self.viewport);
    }

    /// Add a feature, replacing any with the same id and kind.
    pub fn register(&mut self, feature: MapFeature) {
        if let Some(previous) = self.registry.insert(feature) {
            warn!("Duplicate {}; keeping the later one", previous.key());
        }
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    pub fn handle_pointer(&mut self, input: PointerInput, now: Duration) -> Vec<FeatureNotification> {
        if !self.is_open() {
            return Vec::new();
        }
        let (controller, mut env) = self.split(now);
        controller.handle_pointer(input, &mut env)
    }

    pub fn handle_key(&mut self, key: EditorKey, now: Duration) -> Vec<FeatureNotification> {
        let (controller, mut env) = self.split(now);
        controller.handle_key(key, &mut env)
    }

    pub fn set_mode(&mut self, kind: ModeKind) {
        let (controller, mut env) = self.split(Duration::ZERO);
        controller.set_mode(kind, &mut env);
    }

    pub fn apply_menu_entry(&mut self, index: usize, now: Duration) -> Vec<FeatureNotification> {
        let (controller, mut env) = self.split(now);
        controller.apply_menu_entry(index, &mut env)
    }

    pub fn close_context_menu(&mut self) {
        self.controller.close_context_menu();
    }

    /// Zoom by `factor` keeping the point under `anchor_view` still.
    pub fn zoom_at(&mut self, anchor_view: Vec2, factor: f32) {
        self.view.zoom_by(anchor_view, factor);
    }

    fn split(&mut self, now: Duration) -> (&mut EditController, ControllerEnv<'_>) {
        (
            &mut self.controller,
            ControllerEnv {
                registry: &mut self.registry,
                view: &mut self.view,
                settings: &self.settings,
                now,
            },
        )
    }

    // ------------------------------------------------------------------
    // Painting
    // ------------------------------------------------------------------

    /// Paint lines, then pins, then in-progress previews, all in view space.
    pub fn paint(&mut self, painter: &mut dyn Painter) {
        let radii = self.settings.marker_radii();
        let edit_mode = self.controller.kind().is_edit_mode();
        let hovered = self.controller.hovered();

        for feature in self.registry.paint_order_mut() {
            let key = feature.key();
            let ctx = PaintContext {
                view: &self.view,
                edit_mode,
                hovered: hovered.filter(|h| h.key == key).map(|h| h.part),
                radii,
            };
            feature.paint(painter, &ctx);
        }

        self.controller
            .paint_overlay(painter, &self.view, radii.control_point);
    }
}
