//! Unit tests for the line item.

use std::time::Duration;

use bevy::math::{IVec2, Vec2};

use super::*;
use crate::common::Modifiers;
use crate::map::coords::ViewTransform;
use crate::map::feature::MarkerRadii;
use crate::map::geometry::GeometryData;
use crate::map::paint::RecordingPainter;

fn p(x: i32, y: i32) -> IVec2 {
    IVec2::new(x, y)
}

fn edit_ctx() -> ItemContext {
    ItemContext {
        now: Duration::from_secs(5),
        edit_mode: true,
        suppression: Duration::from_millis(500),
    }
}

fn radii() -> HitRadii {
    HitRadii {
        pin: 10.0,
        control_point: 6.0,
        junction: 8.0,
        segment: 8.0,
    }
}

fn river() -> LineItem {
    let geometry = LineGeometry::new(vec![p(0, 0), p(100, 0), p(100, 100)], 2).unwrap();
    LineItem::new("River", geometry, LineStyle::default())
}

fn two_point() -> LineItem {
    let geometry = LineGeometry::new(vec![p(0, 0), p(100, 0)], 2).unwrap();
    LineItem::new("Road", geometry, LineStyle::default())
}

fn press(part: HitPart, modifiers: Modifiers) -> ItemEvent {
    ItemEvent::Press {
        part,
        at: IVec2::ZERO,
        modifiers,
    }
}

// ============================================================================
// Hit testing
// ============================================================================

#[test]
fn test_segment_hit_returns_nearest_point() {
    let line = river();
    let hits = line.hit_test(Vec2::new(40.0, 5.0), &radii(), false);
    assert_eq!(hits.len(), 1);
    match hits[0].part {
        HitPart::Segment {
            branch,
            segment,
            nearest,
        } => {
            assert_eq!((branch, segment), (0, 0));
            assert_eq!(nearest, Vec2::new(40.0, 0.0));
        }
        other => panic!("expected segment, got {:?}", other),
    }
    assert_eq!(hits[0].distance, 5.0);
}

#[test]
fn test_control_points_only_hit_in_edit_mode() {
    let line = river();
    let navigate = line.hit_test(Vec2::new(101.0, 1.0), &radii(), false);
    assert!(navigate
        .iter()
        .all(|h| !matches!(h.part, HitPart::ControlPoint(_))));

    let edit = line.hit_test(Vec2::new(101.0, 1.0), &radii(), true);
    assert!(edit
        .iter()
        .any(|h| h.part == HitPart::ControlPoint(PointRef::new(0, 1))));
}

#[test]
fn test_miss_returns_nothing() {
    let line = river();
    assert!(line.hit_test(Vec2::new(50.0, 50.0), &radii(), true).is_empty());
}

#[test]
fn test_nearest_on_degenerate_segment() {
    let (nearest, distance) = nearest_on_segment(Vec2::new(3.0, 4.0), Vec2::ZERO, Vec2::ZERO);
    assert_eq!(nearest, Vec2::ZERO);
    assert_eq!(distance, 5.0);
}

#[test]
fn test_nearest_clamped_to_segment_end() {
    let (nearest, _) = nearest_on_segment(Vec2::new(20.0, 0.0), Vec2::ZERO, Vec2::X * 10.0);
    assert_eq!(nearest, Vec2::X * 10.0);
}

// ============================================================================
// Edit events
// ============================================================================

#[test]
fn test_navigate_outside_edit_mode() {
    let mut line = river();
    let ctx = ItemContext {
        edit_mode: false,
        ..edit_ctx()
    };
    let out = line.on_event(press(HitPart::ControlPoint(PointRef::new(0, 0)), Modifiers::NONE), &ctx);
    assert_eq!(
        out,
        vec![FeatureNotification::Navigate {
            target: "River".to_string()
        }]
    );
    assert_eq!(line.geometry().revision(), 0);
}

#[test]
fn test_segment_click_inserts_point() {
    let mut line = river();
    let part = HitPart::Segment {
        branch: 0,
        segment: 0,
        nearest: Vec2::new(40.2, 0.0),
    };
    let out = line.on_event(press(part, Modifiers::NONE), &edit_ctx());
    assert_eq!(line.geometry().branch(0).unwrap()[1], p(40, 0));
    assert_eq!(
        out,
        vec![FeatureNotification::GeometryChanged {
            key: FeatureKey::line("River"),
            geometry: GeometryData::LineString(vec![p(0, 0), p(40, 0), p(100, 0), p(100, 100)]),
        }]
    );
}

#[test]
fn test_shift_click_deletes_point() {
    let mut line = river();
    let out = line.on_event(
        press(HitPart::ControlPoint(PointRef::new(0, 1)), Modifiers::SHIFT),
        &edit_ctx(),
    );
    assert_eq!(line.geometry().branch(0).unwrap().len(), 2);
    assert!(matches!(out[0], FeatureNotification::GeometryChanged { .. }));
}

#[test]
fn test_shift_click_on_two_point_line_rejected_without_change() {
    let mut line = two_point();
    let out = line.on_event(
        press(HitPart::ControlPoint(PointRef::new(0, 0)), Modifiers::SHIFT),
        &edit_ctx(),
    );
    assert_eq!(line.geometry().branch(0).unwrap().len(), 2);
    assert_eq!(
        out,
        vec![FeatureNotification::Rejected {
            key: FeatureKey::line("Road"),
            error: GeometryError::TooShort { branch: 0, min: 2 },
        }]
    );
}

#[test]
fn test_drag_control_point_commits_once() {
    let mut line = river();
    let ctx = edit_ctx();
    assert!(line
        .on_event(press(HitPart::ControlPoint(PointRef::new(0, 1)), Modifiers::NONE), &ctx)
        .is_empty());
    assert_eq!(line.dragging(), Some(PointRef::new(0, 1)));

    assert!(line.on_event(ItemEvent::Drag { at: p(120, 10) }, &ctx).is_empty());
    assert!(line.on_event(ItemEvent::Drag { at: p(130, 20) }, &ctx).is_empty());
    assert_eq!(line.geometry().revision(), 0);

    let out = line.on_event(ItemEvent::Release { at: p(140, 30) }, &ctx);
    assert_eq!(out.len(), 1);
    assert_eq!(line.geometry().branch(0).unwrap()[1], p(140, 30));
    assert_eq!(line.geometry().revision(), 1);
    assert_eq!(line.dragging(), None);
}

#[test]
fn test_release_without_drag_keeps_point() {
    let mut line = river();
    let ctx = edit_ctx();
    line.on_event(press(HitPart::ControlPoint(PointRef::new(0, 1)), Modifiers::NONE), &ctx);

    let out = line.on_event(ItemEvent::Release { at: p(103, 3) }, &ctx);

    assert!(out.is_empty());
    assert_eq!(line.geometry().branch(0).unwrap()[1], p(100, 0));
    assert_eq!(line.geometry().revision(), 0);
    assert_eq!(line.dragging(), None);
}

#[test]
fn test_cancel_drag_restores_point() {
    let mut line = river();
    let ctx = edit_ctx();
    line.on_event(press(HitPart::ControlPoint(PointRef::new(0, 1)), Modifiers::NONE), &ctx);
    line.on_event(ItemEvent::Drag { at: p(120, 10) }, &ctx);
    line.on_event(ItemEvent::Cancel, &ctx);
    assert_eq!(line.geometry().branch(0).unwrap()[1], p(100, 0));
}

// ============================================================================
// Context menu
// ============================================================================

fn entry<'a>(entries: &'a [MenuEntry], label: &str) -> &'a MenuEntry {
    entries
        .iter()
        .find(|e| e.label.starts_with(label))
        .unwrap()
}

#[test]
fn test_menu_on_simple_line_segment() {
    let line = river();
    let menu = line.context_menu(&HitPart::Segment {
        branch: 0,
        segment: 1,
        nearest: Vec2::new(100.0, 50.0),
    });
    assert_eq!(menu.len(), 5);
    assert!(entry(&menu, "Add Point").enabled);
    assert!(!entry(&menu, "Delete Point").enabled);
    assert!(!entry(&menu, "Create Branch").enabled);
    assert!(entry(&menu, "Convert").enabled);
    let delete_branch = entry(&menu, "Delete Main Line");
    assert!(!delete_branch.enabled);
}

#[test]
fn test_menu_delete_point_respects_minimum() {
    let line = two_point();
    let menu = line.context_menu(&HitPart::ControlPoint(PointRef::new(0, 0)));
    assert!(!entry(&menu, "Delete Point").enabled);

    let line = river();
    let menu = line.context_menu(&HitPart::ControlPoint(PointRef::new(0, 0)));
    assert!(entry(&menu, "Delete Point").enabled);
    assert!(!entry(&menu, "Add Point").enabled);
}

#[test]
fn test_menu_after_conversion() {
    let mut line = river();
    line.apply_menu_action(MenuAction::ConvertToBranching);
    let menu = line.context_menu(&HitPart::ControlPoint(PointRef::new(0, 1)));
    assert!(entry(&menu, "Create Branch").enabled);
    assert!(!entry(&menu, "Convert").enabled);
}

#[test]
fn test_menu_for_pin_part_is_empty() {
    assert!(river().context_menu(&HitPart::Pin).is_empty());
}

#[test]
fn test_apply_add_point() {
    let mut line = river();
    let out = line.apply_menu_action(MenuAction::AddPoint {
        branch: 0,
        segment: 1,
        at: p(100, 50),
    });
    assert_eq!(line.geometry().branch(0).unwrap()[2], p(100, 50));
    assert!(matches!(out[0], FeatureNotification::GeometryChanged { .. }));
}

#[test]
fn test_apply_convert_emits_multilinestring() {
    let mut line = river();
    let out = line.apply_menu_action(MenuAction::ConvertToBranching);
    assert!(matches!(
        &out[0],
        FeatureNotification::GeometryChanged {
            geometry: GeometryData::MultiLineString(branches),
            ..
        } if branches.len() == 1
    ));
}

#[test]
fn test_apply_delete_last_branch_rejected() {
    let mut line = river();
    let out = line.apply_menu_action(MenuAction::DeleteBranch(0));
    assert!(matches!(
        out[0],
        FeatureNotification::Rejected {
            error: GeometryError::LastBranch,
            ..
        }
    ));
}

// ============================================================================
// Branch creation
// ============================================================================

#[test]
fn test_commit_branch_requires_conversion() {
    let mut line = river();
    let anchor = BranchAnchor {
        position: p(100, 0),
        insert_at: None,
    };
    let out = line.commit_branch(anchor, p(200, 0));
    assert!(matches!(
        out[0],
        FeatureNotification::Rejected {
            error: GeometryError::RequiresConversion,
            ..
        }
    ));
    assert_eq!(line.geometry().branch_count(), 1);
}

#[test]
fn test_commit_branch_mid_segment_creates_junction() {
    let mut line = river();
    line.apply_menu_action(MenuAction::ConvertToBranching);
    let anchor = BranchAnchor {
        position: p(50, 0),
        insert_at: Some(PointRef::new(0, 1)),
    };
    let out = line.commit_branch(anchor, p(50, 80));
    assert_eq!(out.len(), 1);
    assert_eq!(line.geometry().branch_count(), 2);
    assert_eq!(line.geometry().branch(0).unwrap()[1], p(50, 0));
    assert!(line.geometry().is_junction(p(50, 0)));
}

#[test]
fn test_commit_branch_rejected_when_minimum_above_two() {
    let geometry = LineGeometry::multi(vec![vec![p(0, 0), p(5, 5), p(10, 10)]], 3).unwrap();
    let mut line = LineItem::new("Trail", geometry, LineStyle::default());
    let anchor = BranchAnchor {
        position: p(5, 5),
        insert_at: None,
    };
    let out = line.commit_branch(anchor, p(20, 5));
    assert!(matches!(out[0], FeatureNotification::Rejected { .. }));
    assert_eq!(line.geometry().revision(), 0);
}

// ============================================================================
// Painting
// ============================================================================

fn paint(line: &mut LineItem, edit_mode: bool, hovered: Option<HitPart>) -> RecordingPainter {
    let view = ViewTransform::default();
    let mut painter = RecordingPainter::default();
    let ctx = PaintContext {
        view: &view,
        edit_mode,
        hovered,
        radii: MarkerRadii {
            pin: 8.0,
            control_point: 6.0,
            junction: 8.0,
        },
    };
    line.paint(&mut painter, &ctx);
    painter
}

#[test]
fn test_paint_without_edit_mode_has_no_markers() {
    let mut line = river();
    let painter = paint(&mut line, false, None);
    assert!(painter.markers().is_empty());
    assert_eq!(painter.line_count(), 2);
}

#[test]
fn test_paint_marker_shapes_by_role() {
    let geometry = LineGeometry::multi(
        vec![
            vec![p(0, 0), p(10, 0), p(20, 0)],
            vec![p(10, 0), p(10, 10)],
        ],
        2,
    )
    .unwrap();
    let mut line = LineItem::new("Delta", geometry, LineStyle::default());
    let painter = paint(&mut line, true, None);
    let markers = painter.markers();

    // endpoints (0,0), (20,0), (10,10) are squares; the shared point is one diamond
    let squares = markers
        .iter()
        .filter(|(_, s)| *s == MarkerShape::Square)
        .count();
    let diamonds: Vec<_> = markers
        .iter()
        .filter(|(_, s)| *s == MarkerShape::Diamond)
        .collect();
    assert_eq!(squares, 3);
    assert_eq!(diamonds.len(), 1);
    assert_eq!(diamonds[0].0, Vec2::new(10.0, 0.0));
}

#[test]
fn test_paint_hovered_segment_adds_highlight() {
    let mut line = river();
    let plain = paint(&mut line, true, None).line_count();
    let hovered = paint(
        &mut line,
        true,
        Some(HitPart::Segment {
            branch: 0,
            segment: 0,
            nearest: Vec2::new(10.0, 0.0),
        }),
    )
    .line_count();
    assert_eq!(hovered, plain + 1);
}

#[test]
fn test_palette_slot() {
    assert_eq!(palette_slot("main_stem"), 0);
    assert_eq!(palette_slot("branch_3"), 3);
}
