//! Edit-mode controller: the interaction state machine.
//!
//! Pointer and key input arrive in view coordinates; the controller converts
//! them, asks the hit tester who is addressed, and forwards the event to that
//! feature or to the current mode (pin placement, line drawing, branch
//! creation). Feature notifications are passed straight back to the caller.

use std::time::Duration;

use bevy::prelude::*;

use crate::common::{FeatureKey, FeatureKind, Modifiers, PointerHint};
use crate::config::EditorSettings;
use crate::map::geometry::LineGeometry;
use crate::map::style::{DashPattern, LineStyle};
use crate::map::{
    FeatureNotification, FeatureRegistry, GeometryData, HitPart, ItemContext, ItemEvent,
    LineItem, MapFeature, MarkerShape, MenuAction, MenuEntry, Painter, PinItem, ViewTransform,
};
use crate::theme;

use super::hit_testing::{self, HitQuery, HitTarget, InteractionKind};
use super::snapping::{self, Snap, SnapExclusion};
use super::tools::{EditMode, EditorState, ModeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Pointer input in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Press {
        button: PointerButton,
        position: Vec2,
        modifiers: Modifiers,
    },
    Move {
        position: Vec2,
    },
    Release {
        button: PointerButton,
        position: Vec2,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Escape,
    Enter,
    Mode(ModeKind),
}

/// An open context menu for one line.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub target: HitTarget,
    pub entries: Vec<MenuEntry>,
    /// Where the menu was requested, in view coordinates
    pub view_position: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
enum Drag {
    /// A feature accepted a press and owns the pointer until release
    Feature(HitTarget),
    Pan { last: Vec2 },
}

/// The parts of the scene the controller works on.
pub struct ControllerEnv<'a> {
    pub registry: &'a mut FeatureRegistry,
    pub view: &'a mut ViewTransform,
    pub settings: &'a EditorSettings,
    pub now: Duration,
}

#[derive(Debug, Default)]
pub struct EditController {
    state: EditorState,
    drag: Option<Drag>,
    hovered: Option<HitTarget>,
    context_menu: Option<ContextMenu>,
    snap: Option<Snap>,
    /// Last pointer position, clamped canonical
    cursor: Option<IVec2>,
}

impl EditController {
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }

    pub fn kind(&self) -> ModeKind {
        self.state.kind()
    }

    pub fn hovered(&self) -> Option<&HitTarget> {
        self.hovered.as_ref()
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.context_menu.as_ref()
    }

    pub fn snap(&self) -> Option<Snap> {
        self.snap
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, Some(Drag::Feature(_)))
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.drag, Some(Drag::Pan { .. }))
    }

    /// Points collected so far while drawing a line.
    pub fn pending_points(&self) -> &[IVec2] {
        match &self.state.mode {
            EditMode::LineDrawing { pending } => pending,
            _ => &[],
        }
    }

    pub fn pointer_hint(&self) -> PointerHint {
        match &self.drag {
            Some(Drag::Pan { .. }) => return PointerHint::Pan,
            Some(Drag::Feature(_)) => return PointerHint::Move,
            None => {}
        }
        match self.kind() {
            ModeKind::PinPlacement | ModeKind::LineDrawing | ModeKind::BranchCreation => {
                PointerHint::Place
            }
            ModeKind::Edit => match self.hovered.as_ref().map(|h| &h.part) {
                Some(HitPart::Segment { .. }) => PointerHint::InsertPoint,
                Some(_) => PointerHint::Move,
                None => PointerHint::None,
            },
            ModeKind::Idle => match self.hovered {
                Some(_) => PointerHint::Navigate,
                None => PointerHint::None,
            },
        }
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    pub fn handle_pointer(
        &mut self,
        input: PointerInput,
        env: &mut ControllerEnv,
    ) -> Vec<FeatureNotification> {
        match input {
            PointerInput::Press {
                button: PointerButton::Middle,
                position,
                ..
            } => {
                self.context_menu = None;
                self.begin_pan(position);
                Vec::new()
            }
            PointerInput::Press {
                button: PointerButton::Primary,
                position,
                modifiers,
            } => {
                self.context_menu = None;
                self.primary_press(position, modifiers, env)
            }
            PointerInput::Press {
                button: PointerButton::Secondary,
                position,
                ..
            } => self.secondary_press(position, env),
            PointerInput::Move { position } => self.pointer_moved(position, env),
            PointerInput::Release { button, position } => self.release(button, position, env),
        }
    }

    pub fn handle_key(&mut self, key: EditorKey, env: &mut ControllerEnv) -> Vec<FeatureNotification> {
        match key {
            EditorKey::Escape => {
                if self.context_menu.take().is_some() {
                    return Vec::new();
                }
                if self.cancel_drag(env) {
                    return Vec::new();
                }
                let next = match &self.state.mode {
                    EditMode::BranchCreation { return_to, .. } => {
                        EditMode::enter(*return_to).unwrap_or_default()
                    }
                    _ => EditMode::Idle,
                };
                self.switch_mode(next);
                Vec::new()
            }
            EditorKey::Enter => self.finish_line(env),
            EditorKey::Mode(kind) => {
                self.set_mode(kind, env);
                Vec::new()
            }
        }
    }

    /// Switch to a user-selectable mode. Selecting the active mode is a no-op.
    pub fn set_mode(&mut self, kind: ModeKind, env: &mut ControllerEnv) {
        if kind == self.kind() {
            return;
        }
        let Some(next) = EditMode::enter(kind) else {
            warn!("{:?} cannot be selected directly", kind);
            return;
        };
        self.cancel_drag(env);
        self.context_menu = None;
        self.switch_mode(next);
    }

    pub fn close_context_menu(&mut self) {
        self.context_menu = None;
    }

    /// Run the menu entry at `index` and close the menu.
    pub fn apply_menu_entry(
        &mut self,
        index: usize,
        env: &mut ControllerEnv,
    ) -> Vec<FeatureNotification> {
        let Some(menu) = self.context_menu.take() else {
            return Vec::new();
        };
        let Some(entry) = menu.entries.get(index) else {
            return Vec::new();
        };
        if !entry.enabled {
            debug!("Menu entry '{}' is disabled", entry.label);
            return Vec::new();
        }

        match entry.action {
            MenuAction::CreateBranch(anchor) => {
                info!("Creating a branch on {}", menu.target.key);
                self.state.mode = EditMode::BranchCreation {
                    target: menu.target.key.target.clone(),
                    anchor,
                    return_to: self.kind(),
                };
                Vec::new()
            }
            action => env
                .registry
                .get_mut(&menu.target.key)
                .and_then(MapFeature::as_line_mut)
                .map(|line| line.apply_menu_action(action))
                .unwrap_or_default(),
        }
    }

    /// Drop everything in flight. Used when the map closes.
    pub fn reset(&mut self, env: &mut ControllerEnv) {
        self.cancel_drag(env);
        self.switch_mode(EditMode::Idle);
        self.context_menu = None;
        self.hovered = None;
        self.cursor = None;
    }

    // ------------------------------------------------------------------
    // Pointer handling
    // ------------------------------------------------------------------

    fn primary_press(
        &mut self,
        position: Vec2,
        modifiers: Modifiers,
        env: &mut ControllerEnv,
    ) -> Vec<FeatureNotification> {
        let canonical = env.view.to_canonical(position);
        let at = env.view.clamp(canonical.round().as_ivec2());

        match self.kind() {
            ModeKind::Idle | ModeKind::Edit => {
                let Some(target) = self.resolve(InteractionKind::Click, canonical, env) else {
                    self.begin_pan(position);
                    return Vec::new();
                };
                let ctx = self.item_context(env);
                let Some(feature) = env.registry.get_mut(&target.key) else {
                    return Vec::new();
                };
                let notifications = feature.on_event(
                    ItemEvent::Press {
                        part: target.part,
                        at,
                        modifiers,
                    },
                    &ctx,
                );
                if feature.is_dragging() {
                    self.drag = Some(Drag::Feature(target));
                }
                notifications
            }
            ModeKind::PinPlacement => self.place_pin(at, env),
            ModeKind::LineDrawing => {
                let at = self.snapped(canonical, None, env).unwrap_or(at);
                if let EditMode::LineDrawing { pending } = &mut self.state.mode
                    && pending.last() != Some(&at)
                {
                    pending.push(at);
                }
                Vec::new()
            }
            ModeKind::BranchCreation => {
                let at = self.snapped(canonical, None, env).unwrap_or(at);
                self.finish_branch(at, env)
            }
        }
    }

    fn secondary_press(&mut self, position: Vec2, env: &mut ControllerEnv) -> Vec<FeatureNotification> {
        match self.kind() {
            ModeKind::Edit => {
                let canonical = env.view.to_canonical(position);
                let hit = self.resolve(InteractionKind::Click, canonical, env);
                self.context_menu = hit.and_then(|target| {
                    let line = env.registry.get(&target.key)?.as_line()?;
                    let entries = line.context_menu(&target.part);
                    (!entries.is_empty()).then_some(ContextMenu {
                        target,
                        entries,
                        view_position: position,
                    })
                });
            }
            ModeKind::LineDrawing => {
                // Undo the last point
                if let EditMode::LineDrawing { pending } = &mut self.state.mode {
                    pending.pop();
                }
            }
            ModeKind::BranchCreation => {
                if let EditMode::BranchCreation { return_to, .. } = &self.state.mode {
                    let next = EditMode::enter(*return_to).unwrap_or_default();
                    self.switch_mode(next);
                }
            }
            ModeKind::Idle | ModeKind::PinPlacement => {
                self.context_menu = None;
            }
        }
        Vec::new()
    }

    fn pointer_moved(&mut self, position: Vec2, env: &mut ControllerEnv) -> Vec<FeatureNotification> {
        let canonical = env.view.to_canonical(position);
        let at = env.view.clamp(canonical.round().as_ivec2());
        self.cursor = Some(at);
        self.snap = None;

        let mut notifications = Vec::new();
        match self.drag.clone() {
            Some(Drag::Pan { last }) => {
                env.view.pan_by(position - last);
                self.drag = Some(Drag::Pan { last: position });
            }
            Some(Drag::Feature(target)) => {
                let at = self.drag_position(&target.key, canonical, at, env);
                let ctx = self.item_context(env);
                if let Some(feature) = env.registry.get_mut(&target.key) {
                    notifications = feature.on_event(ItemEvent::Drag { at }, &ctx);
                }
            }
            None => {
                if matches!(
                    self.kind(),
                    ModeKind::LineDrawing | ModeKind::BranchCreation
                ) {
                    self.snap = self.find_snap(canonical, None, env);
                }
            }
        }

        let kind = if self.is_dragging() {
            InteractionKind::DragContinue
        } else {
            InteractionKind::Hover
        };
        // Hover is recomputed in canonical space after a pan moved the view
        let canonical = env.view.to_canonical(position);
        self.hovered = self.resolve(kind, canonical, env);
        notifications
    }

    fn release(
        &mut self,
        button: PointerButton,
        position: Vec2,
        env: &mut ControllerEnv,
    ) -> Vec<FeatureNotification> {
        match (self.drag.take(), button) {
            (Some(Drag::Feature(target)), PointerButton::Primary) => {
                let canonical = env.view.to_canonical(position);
                let at = env.view.clamp(canonical.round().as_ivec2());
                let at = self.drag_position(&target.key, canonical, at, env);
                self.snap = None;
                let ctx = self.item_context(env);
                env.registry
                    .get_mut(&target.key)
                    .map(|feature| feature.on_event(ItemEvent::Release { at }, &ctx))
                    .unwrap_or_default()
            }
            (Some(Drag::Pan { .. }), _) => Vec::new(),
            (other, _) => {
                self.drag = other;
                Vec::new()
            }
        }
    }

    // ------------------------------------------------------------------
    // Mode actions
    // ------------------------------------------------------------------

    fn place_pin(&mut self, at: IVec2, env: &mut ControllerEnv) -> Vec<FeatureNotification> {
        let target = self
            .state
            .take_draft_target()
            .unwrap_or_else(|| env.registry.unused_name(FeatureKind::Pin));
        let pin = PinItem::placed(target.clone(), at, env.now);
        if env.registry.insert(MapFeature::Pin(pin)).is_some() {
            warn!("Replaced existing pin '{}'", target);
        }
        info!("Placed pin '{}' at {}", target, at);
        self.switch_mode(EditMode::Idle);
        vec![FeatureNotification::GeometryChanged {
            key: FeatureKey::pin(target),
            geometry: GeometryData::Point(at),
        }]
    }

    fn finish_line(&mut self, env: &mut ControllerEnv) -> Vec<FeatureNotification> {
        let EditMode::LineDrawing { pending } = &self.state.mode else {
            return Vec::new();
        };
        let min = env.settings.min_branch_points();
        if pending.len() < min {
            info!("A line needs at least {} points ({} so far)", min, pending.len());
            return Vec::new();
        }
        let points = pending.clone();

        let target = self
            .state
            .take_draft_target()
            .unwrap_or_else(|| env.registry.unused_name(FeatureKind::Line));
        let key = FeatureKey::line(&target);
        let geometry = match LineGeometry::new(points, min) {
            Ok(geometry) => geometry,
            Err(error) => {
                warn!("Could not create line '{}': {}", target, error);
                return vec![FeatureNotification::Rejected { key, error }];
            }
        };
        let style = LineStyle::from_stored(None, None, None, &env.settings.style_defaults());
        let line = LineItem::new(target.clone(), geometry, style);
        let data = line.geometry().to_data();
        let count = line.geometry().branches()[0].len();

        if env.registry.insert(MapFeature::Line(line)).is_some() {
            warn!("Replaced existing line '{}'", target);
        }
        info!("Created line '{}' with {} points", target, count);
        self.state.mode = EditMode::Idle;
        vec![FeatureNotification::GeometryChanged {
            key,
            geometry: data,
        }]
    }

    fn finish_branch(&mut self, end: IVec2, env: &mut ControllerEnv) -> Vec<FeatureNotification> {
        let EditMode::BranchCreation {
            target,
            anchor,
            return_to,
        } = &self.state.mode
        else {
            return Vec::new();
        };
        if end == anchor.position {
            debug!("Branch end is on its start point; waiting for another click");
            return Vec::new();
        }
        let (target, anchor, return_to) = (target.clone(), *anchor, *return_to);
        self.state.mode = EditMode::enter(return_to).unwrap_or_default();

        match env
            .registry
            .get_mut(&FeatureKey::line(&target))
            .and_then(MapFeature::as_line_mut)
        {
            Some(line) => line.commit_branch(anchor, end),
            None => {
                warn!("Line '{}' is gone; branch discarded", target);
                Vec::new()
            }
        }
    }

    fn switch_mode(&mut self, next: EditMode) {
        match &self.state.mode {
            EditMode::LineDrawing { pending } if !pending.is_empty() => {
                debug!("Discarded {} pending line points", pending.len());
            }
            EditMode::BranchCreation { target, .. } => {
                debug!("Branch creation on '{}' cancelled", target);
            }
            _ => {}
        }
        if self.state.kind() != next.kind() {
            info!("Mode: {}", next.kind().display_name());
        }
        self.state.mode = next;
        self.snap = None;
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn begin_pan(&mut self, position: Vec2) {
        self.drag = Some(Drag::Pan { last: position });
    }

    /// Cancel a feature drag, restoring the feature. Returns whether one was active.
    fn cancel_drag(&mut self, env: &mut ControllerEnv) -> bool {
        match self.drag.take() {
            Some(Drag::Feature(target)) => {
                let ctx = self.item_context(env);
                if let Some(feature) = env.registry.get_mut(&target.key) {
                    feature.on_event(ItemEvent::Cancel, &ctx);
                }
                self.snap = None;
                debug!("Drag on {} cancelled", target.key);
                true
            }
            Some(Drag::Pan { .. }) | None => false,
        }
    }

    fn item_context(&self, env: &ControllerEnv) -> ItemContext {
        ItemContext {
            now: env.now,
            edit_mode: self.kind().is_edit_mode(),
            suppression: env.settings.suppression(),
        }
    }

    fn resolve(
        &self,
        kind: InteractionKind,
        position: Vec2,
        env: &ControllerEnv,
    ) -> Option<HitTarget> {
        let active_drag = match &self.drag {
            Some(Drag::Feature(target)) => Some(target),
            _ => None,
        };
        hit_testing::resolve(
            env.registry.iter(),
            &HitQuery {
                position,
                zoom: env.view.zoom(),
                kind,
                edit_mode: self.kind().is_edit_mode(),
                active_drag,
                radii: env.settings.hit_radii(),
                hover_scale: env.settings.hover_tolerance_scale,
            },
        )
    }

    fn find_snap(
        &self,
        position: Vec2,
        exclude: Option<&SnapExclusion>,
        env: &ControllerEnv,
    ) -> Option<Snap> {
        if !env.settings.snapping_enabled {
            return None;
        }
        let threshold = env.view.view_to_canonical_distance(env.settings.snap_threshold);
        snapping::find_snap(env.registry.iter(), position, threshold, exclude)
    }

    /// Snap a free position, remembering the snap for the indicator.
    fn snapped(
        &mut self,
        position: Vec2,
        exclude: Option<&SnapExclusion>,
        env: &ControllerEnv,
    ) -> Option<IVec2> {
        self.snap = self.find_snap(position, exclude, env);
        self.snap.map(|snap| env.view.clamp(snap.position))
    }

    /// Where a dragged feature goes: line points snap, pins follow the pointer.
    fn drag_position(
        &mut self,
        key: &FeatureKey,
        canonical: Vec2,
        at: IVec2,
        env: &ControllerEnv,
    ) -> IVec2 {
        let dragged_point = env
            .registry
            .get(key)
            .and_then(MapFeature::as_line)
            .and_then(|line| line.geometry().point(line.dragging()?));
        let Some(position) = dragged_point else {
            return at;
        };
        let exclusion = SnapExclusion { key, position };
        self.snapped(canonical, Some(&exclusion), env).unwrap_or(at)
    }

    // ------------------------------------------------------------------
    // Painting
    // ------------------------------------------------------------------

    /// In-progress previews: the pending line, the branch being created and
    /// the snap indicator.
    pub fn paint_overlay(&self, painter: &mut dyn Painter, view: &ViewTransform, marker_radius: f32) {
        let cursor = self.snap.map(|s| s.position).or(self.cursor);

        match &self.state.mode {
            EditMode::LineDrawing { pending } => {
                let mut points: Vec<Vec2> = pending.iter().map(|p| view.point_to_view(*p)).collect();
                for point in &points {
                    painter.marker(*point, MarkerShape::Circle, marker_radius, theme::PREVIEW_COLOR);
                }
                if let Some(cursor) = cursor
                    && !points.is_empty()
                {
                    points.push(view.point_to_view(cursor));
                }
                painter.polyline(&points, 2.0, DashPattern::Dashed, theme::PREVIEW_COLOR);
            }
            EditMode::BranchCreation { anchor, .. } => {
                let start = view.point_to_view(anchor.position);
                painter.marker(start, MarkerShape::Diamond, marker_radius, theme::PREVIEW_COLOR);
                if let Some(cursor) = cursor {
                    painter.polyline(
                        &[start, view.point_to_view(cursor)],
                        2.0,
                        DashPattern::Dashed,
                        theme::PREVIEW_COLOR,
                    );
                }
            }
            _ => {}
        }

        if let Some(snap) = self.snap {
            painter.marker(
                view.point_to_view(snap.position),
                MarkerShape::Circle,
                marker_radius + 4.0,
                theme::SNAP_INDICATOR,
            );
        }
    }
}
