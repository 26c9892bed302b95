//! Line item: a simple or branching polyline with direct-manipulation editing.
//!
//! In edit mode a plain click on a segment inserts a point, Shift-click on a
//! control point deletes it, and dragging a control point moves it (committed
//! on release). Everything else goes through the context menu.

use bevy::math::{IVec2, Rect, Vec2};
use bevy::prelude::*;

use crate::common::FeatureKey;
use crate::theme;

use super::feature::{
    FeatureNotification, HitPart, HitRadii, ItemContext, ItemEvent, ItemHit, PaintContext,
};
use super::geometry::{GeometryError, LineGeometry, PointRef, PointRole, branch_display_name};
use super::paint::{MarkerShape, Painter};
use super::style::LineStyle;

/// Where a new branch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchAnchor {
    pub position: IVec2,
    /// Insert `position` into this (branch, index) first when it is not a point yet
    pub insert_at: Option<PointRef>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuAction {
    AddPoint { branch: usize, segment: usize, at: IVec2 },
    DeletePoint(PointRef),
    CreateBranch(BranchAnchor),
    ConvertToBranching,
    DeleteBranch(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub label: String,
    pub action: MenuAction,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct LineItem {
    target: String,
    geometry: LineGeometry,
    style: LineStyle,
    dragging: Option<PointRef>,
    /// A drag event arrived since the press
    drag_moved: bool,
}

impl LineItem {
    pub fn new(target: impl Into<String>, geometry: LineGeometry, style: LineStyle) -> Self {
        Self {
            target: target.into(),
            geometry,
            style,
            dragging: None,
            drag_moved: false,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn key(&self) -> FeatureKey {
        FeatureKey::line(&self.target)
    }

    pub fn geometry(&self) -> &LineGeometry {
        &self.geometry
    }

    pub fn style(&self) -> &LineStyle {
        &self.style
    }

    pub fn dragging(&self) -> Option<PointRef> {
        self.dragging
    }

    pub fn bounding_box(&self, margin: f32) -> Rect {
        self.geometry.bounds().as_rect().inflate(margin)
    }

    // ------------------------------------------------------------------
    // Hit testing
    // ------------------------------------------------------------------

    /// Nearest control point (edit mode only) and nearest segment within tolerance.
    pub fn hit_test(&self, position: Vec2, radii: &HitRadii, edit_mode: bool) -> Vec<ItemHit> {
        let mut hits = Vec::with_capacity(2);

        if edit_mode {
            let mut best: Option<ItemHit> = None;
            for (b, branch) in self.geometry.branches().iter().enumerate() {
                for (i, point) in branch.iter().enumerate() {
                    let at = PointRef::new(b, i);
                    let radius = match self.geometry.point_role(at) {
                        Some(PointRole::Junction) => radii.junction,
                        _ => radii.control_point,
                    };
                    let distance = position.distance(point.as_vec2());
                    if distance <= radius && best.is_none_or(|h| distance < h.distance) {
                        best = Some(ItemHit {
                            part: HitPart::ControlPoint(at),
                            distance,
                        });
                    }
                }
            }
            hits.extend(best);
        }

        let mut best: Option<ItemHit> = None;
        for (b, branch) in self.geometry.branches().iter().enumerate() {
            for (s, pair) in branch.windows(2).enumerate() {
                let (nearest, distance) =
                    nearest_on_segment(position, pair[0].as_vec2(), pair[1].as_vec2());
                if distance <= radii.segment && best.is_none_or(|h| distance < h.distance) {
                    best = Some(ItemHit {
                        part: HitPart::Segment {
                            branch: b,
                            segment: s,
                            nearest,
                        },
                        distance,
                    });
                }
            }
        }
        hits.extend(best);
        hits
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn on_event(&mut self, event: ItemEvent, ctx: &ItemContext) -> Vec<FeatureNotification> {
        match event {
            ItemEvent::Press { .. } if !ctx.edit_mode => vec![FeatureNotification::Navigate {
                target: self.target.clone(),
            }],
            ItemEvent::Press {
                part: HitPart::ControlPoint(at),
                modifiers,
                ..
            } => {
                if modifiers.shift {
                    let result = self.geometry.delete_point(at.branch, at.index);
                    return self.notify(result);
                }
                match self.geometry.begin_interactive(at) {
                    Ok(()) => {
                        self.dragging = Some(at);
                        self.drag_moved = false;
                        Vec::new()
                    }
                    Err(error) => vec![self.rejected(error)],
                }
            }
            ItemEvent::Press {
                part:
                    HitPart::Segment {
                        branch,
                        segment,
                        nearest,
                    },
                ..
            } => {
                let result =
                    self.geometry
                        .insert_point(branch, segment + 1, nearest.round().as_ivec2());
                self.notify(result)
            }
            ItemEvent::Press {
                part: HitPart::Pin, ..
            } => Vec::new(),
            ItemEvent::Drag { at } => {
                if self.dragging.is_some() {
                    self.drag_moved = true;
                    self.geometry.move_point_interactive(at);
                }
                Vec::new()
            }
            ItemEvent::Release { at } => {
                if self.dragging.take().is_none() {
                    return Vec::new();
                }
                // A press and release without movement is a click, not a move
                if !std::mem::take(&mut self.drag_moved) {
                    self.geometry.cancel_interactive();
                    return Vec::new();
                }
                self.geometry.move_point_interactive(at);
                if self.geometry.commit_interactive() {
                    vec![self.changed()]
                } else {
                    Vec::new()
                }
            }
            ItemEvent::Cancel => {
                if self.dragging.take().is_some() {
                    self.drag_moved = false;
                    self.geometry.cancel_interactive();
                }
                Vec::new()
            }
        }
    }

    // ------------------------------------------------------------------
    // Context menu
    // ------------------------------------------------------------------

    /// Menu entries for a right-click on `part`, in a fixed order.
    pub fn context_menu(&self, part: &HitPart) -> Vec<MenuEntry> {
        let geometry = &self.geometry;
        let (branch, add_point, delete_point, anchor) = match *part {
            HitPart::ControlPoint(at) => {
                let position = geometry.point(at).unwrap_or_default();
                (
                    at.branch,
                    None,
                    Some(at),
                    BranchAnchor {
                        position,
                        insert_at: None,
                    },
                )
            }
            HitPart::Segment {
                branch,
                segment,
                nearest,
            } => {
                let at = nearest.round().as_ivec2();
                (
                    branch,
                    Some(MenuAction::AddPoint {
                        branch,
                        segment,
                        at,
                    }),
                    None,
                    BranchAnchor {
                        position: at,
                        insert_at: Some(PointRef::new(branch, segment + 1)),
                    },
                )
            }
            HitPart::Pin => return Vec::new(),
        };

        let branch_name = geometry
            .stable_branch_ids()
            .get(branch)
            .map(|id| branch_display_name(id))
            .unwrap_or_else(|| format!("Branch {}", branch));

        vec![
            MenuEntry {
                label: "Add Point".to_string(),
                enabled: add_point.is_some(),
                action: add_point.unwrap_or(MenuAction::AddPoint {
                    branch,
                    segment: 0,
                    at: anchor.position,
                }),
            },
            MenuEntry {
                label: "Delete Point".to_string(),
                enabled: delete_point.is_some() && geometry.can_delete_point(branch),
                action: MenuAction::DeletePoint(
                    delete_point.unwrap_or(PointRef::new(branch, 0)),
                ),
            },
            MenuEntry {
                label: "Create Branch".to_string(),
                enabled: geometry.is_multi(),
                action: MenuAction::CreateBranch(anchor),
            },
            MenuEntry {
                label: "Convert to Branching Line".to_string(),
                enabled: !geometry.is_multi(),
                action: MenuAction::ConvertToBranching,
            },
            MenuEntry {
                label: format!("Delete {}", branch_name),
                enabled: geometry.branch_count() > 1,
                action: MenuAction::DeleteBranch(branch),
            },
        ]
    }

    /// Apply a geometry-only menu action. Branch creation is driven by the
    /// editor controller through [`LineItem::commit_branch`].
    pub fn apply_menu_action(&mut self, action: MenuAction) -> Vec<FeatureNotification> {
        let result = match action {
            MenuAction::AddPoint {
                branch,
                segment,
                at,
            } => self.geometry.insert_point(branch, segment + 1, at),
            MenuAction::DeletePoint(at) => self.geometry.delete_point(at.branch, at.index),
            MenuAction::ConvertToBranching => self.geometry.convert_to_multi_branch(),
            MenuAction::DeleteBranch(index) => self.geometry.delete_branch(index),
            MenuAction::CreateBranch(_) => return Vec::new(),
        };
        self.notify(result)
    }

    /// Add a two-point branch from `anchor` to `end`, inserting the anchor into
    /// its host branch first when it lies mid-segment.
    pub fn commit_branch(&mut self, anchor: BranchAnchor, end: IVec2) -> Vec<FeatureNotification> {
        if !self.geometry.is_multi() {
            return vec![self.rejected(GeometryError::RequiresConversion)];
        }
        if self.geometry.min_points() > 2 {
            return vec![self.rejected(GeometryError::BranchTooShort {
                len: 2,
                min: self.geometry.min_points(),
            })];
        }
        if let Some(at) = anchor.insert_at
            && let Err(error) = self.geometry.insert_point(at.branch, at.index, anchor.position)
        {
            return vec![self.rejected(error)];
        }
        let result = self
            .geometry
            .add_branch(vec![anchor.position, end])
            .map(|index| {
                info!("Line '{}' gained branch {}", self.target, index);
            });
        self.notify(result)
    }

    // ------------------------------------------------------------------
    // Painting
    // ------------------------------------------------------------------

    pub fn paint(&mut self, painter: &mut dyn Painter, ctx: &PaintContext) {
        let zoom = ctx.view.zoom();
        let pan = ctx.view.pan();
        let width = self.style.width as f32;
        let slots: Vec<usize> = self
            .geometry
            .stable_branch_ids()
            .iter()
            .map(|id| palette_slot(id))
            .collect();
        let slot_of = |branch: usize| slots.get(branch).copied().unwrap_or(0);

        let branches: Vec<Vec<Vec2>> = self
            .geometry
            .display_points(zoom)
            .iter()
            .map(|b| b.iter().map(|p| *p + pan).collect())
            .collect();

        for (b, points) in branches.iter().enumerate() {
            let color = if ctx.edit_mode {
                theme::branch_color(slot_of(b))
            } else {
                self.style.color
            };
            painter.polyline(points, width, self.style.pattern, color);
        }

        if !ctx.edit_mode {
            return;
        }

        if let Some(HitPart::Segment {
            branch, segment, ..
        }) = ctx.hovered
            && let Some(points) = branches.get(branch)
            && let (Some(a), Some(b)) = (points.get(segment), points.get(segment + 1))
        {
            painter.line(*a, *b, width + 2.0, theme::HOVER_HIGHLIGHT);
        }

        let hovered_point = match ctx.hovered {
            Some(HitPart::ControlPoint(at)) => self.geometry.point(at),
            _ => None,
        };

        let mut drawn_junctions: Vec<IVec2> = Vec::new();
        for (b, branch) in self.geometry.branches().iter().enumerate() {
            for (i, point) in branch.iter().enumerate() {
                let Some(role) = self.geometry.point_role(PointRef::new(b, i)) else {
                    continue;
                };
                let (shape, radius, color) = match role {
                    PointRole::Junction => {
                        if drawn_junctions.contains(point) {
                            continue;
                        }
                        drawn_junctions.push(*point);
                        (MarkerShape::Diamond, ctx.radii.junction, theme::JUNCTION_COLOR)
                    }
                    PointRole::Endpoint => (
                        MarkerShape::Square,
                        ctx.radii.control_point,
                        theme::branch_color(slot_of(b)),
                    ),
                    PointRole::Vertex => (
                        MarkerShape::Circle,
                        ctx.radii.control_point,
                        theme::branch_color(slot_of(b)),
                    ),
                };
                let color = if hovered_point == Some(*point) {
                    theme::HOVER_HIGHLIGHT
                } else {
                    color
                };
                painter.marker(ctx.view.point_to_view(*point), shape, radius, color);
            }
        }
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    fn changed(&self) -> FeatureNotification {
        FeatureNotification::GeometryChanged {
            key: self.key(),
            geometry: self.geometry.to_data(),
        }
    }

    fn rejected(&self, error: GeometryError) -> FeatureNotification {
        warn!("Edit on line '{}' rejected: {}", self.target, error);
        FeatureNotification::Rejected {
            key: self.key(),
            error,
        }
    }

    fn notify(&self, result: Result<(), GeometryError>) -> Vec<FeatureNotification> {
        match result {
            Ok(()) => vec![self.changed()],
            Err(error) => vec![self.rejected(error)],
        }
    }
}

/// Palette index for a stable branch id: the main branch is 0, `branch_N` is N.
fn palette_slot(stable_id: &str) -> usize {
    stable_id
        .strip_prefix("branch_")
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// Closest point on segment `a-b` to `p`, and its distance.
pub fn nearest_on_segment(p: Vec2, a: Vec2, b: Vec2) -> (Vec2, f32) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 0.0001 {
        return (a, p.distance(a));
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    let nearest = a + ab * t;
    (nearest, p.distance(nearest))
}

#[cfg(test)]
mod tests;
