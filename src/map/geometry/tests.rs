//! Unit tests for the line geometry model.

use bevy::math::{IVec2, Vec2};

use super::*;

fn p(x: i32, y: i32) -> IVec2 {
    IVec2::new(x, y)
}

fn simple_line() -> LineGeometry {
    LineGeometry::new(vec![p(0, 0), p(10, 0), p(20, 10)], 2).unwrap()
}

/// Three branches meeting at (10, 0)
fn three_way_junction() -> LineGeometry {
    LineGeometry::multi(
        vec![
            vec![p(0, 0), p(10, 0)],
            vec![p(10, 0), p(20, 0)],
            vec![p(10, 0), p(10, 10)],
        ],
        2,
    )
    .unwrap()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_rejects_single_point() {
    let err = LineGeometry::new(vec![p(0, 0)], 2).unwrap_err();
    assert_eq!(err, GeometryError::BranchTooShort { len: 1, min: 2 });
}

#[test]
fn test_min_points_never_below_two() {
    let line = LineGeometry::new(vec![p(0, 0), p(1, 1)], 0).unwrap();
    assert_eq!(line.min_points(), 2);
}

#[test]
fn test_multi_rejects_empty() {
    assert!(LineGeometry::multi(vec![], 2).is_err());
}

#[test]
fn test_multi_rejects_short_branch() {
    let err = LineGeometry::multi(vec![vec![p(0, 0), p(1, 0)], vec![p(5, 5)]], 2).unwrap_err();
    assert_eq!(err, GeometryError::BranchTooShort { len: 1, min: 2 });
}

#[test]
fn test_new_line_is_not_branching() {
    let line = simple_line();
    assert!(!line.is_branching());
    assert!(!line.is_multi());
    assert_eq!(line.kind(), GeometryKind::LineString);
    assert_eq!(line.revision(), 0);
}

// ============================================================================
// Bounds
// ============================================================================

#[test]
fn test_bounds_after_construction() {
    let line = simple_line();
    assert_eq!(line.bounds(), Bounds { min: p(0, 0), max: p(20, 10) });
}

#[test]
fn test_bounds_follow_every_mutation() {
    let mut line = simple_line();

    line.insert_point(0, 1, p(-5, 30)).unwrap();
    assert_eq!(line.bounds(), Bounds { min: p(-5, 0), max: p(20, 30) });

    line.move_point(0, 1, p(3, 3)).unwrap();
    assert_eq!(line.bounds(), Bounds { min: p(0, 0), max: p(20, 10) });

    line.delete_point(0, 3).unwrap();
    assert_eq!(line.bounds(), Bounds { min: p(0, 0), max: p(10, 3) });

    line.convert_to_multi_branch().unwrap();
    line.add_branch(vec![p(10, 0), p(50, -20)]).unwrap();
    assert_eq!(line.bounds(), Bounds { min: p(0, -20), max: p(50, 3) });

    line.delete_branch(1).unwrap();
    assert_eq!(line.bounds(), Bounds { min: p(0, 0), max: p(10, 3) });
}

#[test]
fn test_bounds_contains_all_points() {
    let line = three_way_junction();
    let bounds = line.bounds();
    for point in line.branches().iter().flatten() {
        assert!(bounds.contains(*point));
    }
}

#[test]
fn test_bounds_from_points_empty() {
    assert!(Bounds::from_points(Vec::<IVec2>::new()).is_none());
}

// ============================================================================
// Point edits
// ============================================================================

#[test]
fn test_delete_point_from_two_point_line_rejected() {
    let mut line = LineGeometry::new(vec![p(0, 0), p(10, 10)], 2).unwrap();
    let err = line.delete_point(0, 0).unwrap_err();
    assert_eq!(err, GeometryError::TooShort { branch: 0, min: 2 });
    assert_eq!(line.branch(0).unwrap().len(), 2);
    assert_eq!(line.revision(), 0);
}

#[test]
fn test_delete_point_respects_configured_minimum() {
    let mut line = LineGeometry::new(vec![p(0, 0), p(5, 5), p(10, 10)], 3).unwrap();
    assert!(!line.can_delete_point(0));
    assert!(line.delete_point(0, 1).is_err());
}

#[test]
fn test_insert_point_bumps_revision() {
    let mut line = simple_line();
    line.insert_point(0, 3, p(30, 10)).unwrap();
    assert_eq!(line.branch(0).unwrap().len(), 4);
    assert_eq!(line.revision(), 1);
}

#[test]
fn test_insert_point_out_of_range() {
    let mut line = simple_line();
    assert_eq!(
        line.insert_point(0, 9, p(1, 1)),
        Err(GeometryError::PointOutOfRange { branch: 0, index: 9 })
    );
    assert_eq!(
        line.insert_point(4, 0, p(1, 1)),
        Err(GeometryError::BranchOutOfRange(4))
    );
    assert_eq!(line.revision(), 0);
}

#[test]
fn test_move_point_out_of_range() {
    let mut line = simple_line();
    assert!(line.move_point(0, 7, p(1, 1)).is_err());
    assert!(line.move_point(2, 0, p(1, 1)).is_err());
}

#[test]
fn test_point_roles() {
    let line = simple_line();
    assert_eq!(line.point_role(PointRef::new(0, 0)), Some(PointRole::Endpoint));
    assert_eq!(line.point_role(PointRef::new(0, 1)), Some(PointRole::Vertex));
    assert_eq!(line.point_role(PointRef::new(0, 2)), Some(PointRole::Endpoint));
    assert_eq!(line.point_role(PointRef::new(0, 3)), None);
}

// ============================================================================
// Branching
// ============================================================================

#[test]
fn test_add_branch_requires_conversion() {
    let mut line = simple_line();
    assert_eq!(
        line.add_branch(vec![p(10, 0), p(10, 20)]),
        Err(GeometryError::RequiresConversion)
    );
    assert_eq!(line.branch_count(), 1);

    line.convert_to_multi_branch().unwrap();
    assert!(line.is_multi());
    assert!(!line.is_branching());

    assert_eq!(line.add_branch(vec![p(10, 0), p(10, 20)]), Ok(1));
    assert_eq!(line.branch_count(), 2);
    assert!(line.is_branching());
}

#[test]
fn test_convert_twice_rejected() {
    let mut line = simple_line();
    line.convert_to_multi_branch().unwrap();
    assert_eq!(
        line.convert_to_multi_branch(),
        Err(GeometryError::AlreadyMultiBranch)
    );
}

#[test]
fn test_add_short_branch_rejected() {
    let mut line = simple_line();
    line.convert_to_multi_branch().unwrap();
    assert!(matches!(
        line.add_branch(vec![p(1, 1)]),
        Err(GeometryError::BranchTooShort { .. })
    ));
}

#[test]
fn test_delete_last_branch_rejected() {
    let mut line = simple_line();
    line.convert_to_multi_branch().unwrap();
    assert_eq!(line.delete_branch(0), Err(GeometryError::LastBranch));
    assert_eq!(line.delete_branch(3), Err(GeometryError::BranchOutOfRange(3)));
}

#[test]
fn test_is_branching_tracks_branch_count() {
    let mut line = three_way_junction();
    assert!(line.is_branching());
    line.delete_branch(2).unwrap();
    assert!(line.is_branching());
    line.delete_branch(1).unwrap();
    assert!(!line.is_branching());
    assert!(line.is_multi());
}

#[test]
fn test_to_data_matches_kind() {
    let mut line = simple_line();
    assert!(matches!(line.to_data(), GeometryData::LineString(ref pts) if pts.len() == 3));
    line.convert_to_multi_branch().unwrap();
    assert!(matches!(line.to_data(), GeometryData::MultiLineString(ref b) if b.len() == 1));
}

// ============================================================================
// Junctions
// ============================================================================

#[test]
fn test_three_branches_form_junction() {
    let line = three_way_junction();
    assert!(line.is_junction(p(10, 0)));
    assert_eq!(line.junctions(), vec![p(10, 0)]);
    assert_eq!(line.point_role(PointRef::new(1, 0)), Some(PointRole::Junction));
}

#[test]
fn test_junction_reclassified_after_branch_delete() {
    let mut line = three_way_junction();
    line.delete_branch(2).unwrap();
    assert!(!line.is_junction(p(10, 0)));
    assert_eq!(line.point_role(PointRef::new(1, 0)), Some(PointRole::Endpoint));
}

#[test]
fn test_branch_from_line_interior_is_junction() {
    let mut line = LineGeometry::new(vec![p(0, 0), p(10, 0), p(20, 0)], 2).unwrap();
    line.convert_to_multi_branch().unwrap();
    line.add_branch(vec![p(10, 0), p(10, 10)]).unwrap();
    assert!(line.is_junction(p(10, 0)));
}

#[test]
fn test_two_endpoints_touching_are_not_junction() {
    let line = LineGeometry::multi(vec![vec![p(0, 0), p(10, 0)], vec![p(10, 0), p(20, 0)]], 2)
        .unwrap();
    assert!(!line.is_junction(p(10, 0)));
}

#[test]
fn test_moving_junction_moves_all_occurrences() {
    let mut line = three_way_junction();
    line.move_point(1, 0, p(12, 2)).unwrap();
    assert_eq!(line.branch(0).unwrap()[1], p(12, 2));
    assert_eq!(line.branch(1).unwrap()[0], p(12, 2));
    assert_eq!(line.branch(2).unwrap()[0], p(12, 2));
    assert!(line.is_junction(p(12, 2)));
}

// ============================================================================
// Interactive phase
// ============================================================================

#[test]
fn test_interactive_move_defers_revision() {
    let mut line = simple_line();
    line.begin_interactive(PointRef::new(0, 1)).unwrap();
    assert!(line.move_point_interactive(p(10, 50)));
    assert!(line.move_point_interactive(p(10, 60)));
    assert_eq!(line.revision(), 0);
    assert_eq!(line.bounds().max, p(20, 60));

    assert!(line.commit_interactive());
    assert_eq!(line.revision(), 1);
    // The phase is over, so a second commit has nothing to apply
    assert!(!line.commit_interactive());
    assert_eq!(line.revision(), 1);
}

#[test]
fn test_interactive_cancel_restores() {
    let mut line = three_way_junction();
    line.begin_interactive(PointRef::new(0, 1)).unwrap();
    line.move_point_interactive(p(40, 40));
    line.cancel_interactive();
    assert_eq!(line.branch(2).unwrap()[0], p(10, 0));
    assert_eq!(line.bounds().max, p(20, 10));
    assert!(line.is_junction(p(10, 0)));
    assert_eq!(line.revision(), 0);
}

#[test]
fn test_interactive_commit_without_movement() {
    let mut line = simple_line();
    line.begin_interactive(PointRef::new(0, 0)).unwrap();
    assert!(!line.commit_interactive());
    assert_eq!(line.revision(), 0);
}

#[test]
fn test_interactive_move_without_begin() {
    let mut line = simple_line();
    assert!(!line.move_point_interactive(p(1, 1)));
}

#[test]
fn test_interactive_junction_drag_moves_partners() {
    let mut line = three_way_junction();
    line.begin_interactive(PointRef::new(2, 0)).unwrap();
    line.move_point_interactive(p(11, 1));
    assert_eq!(line.branch(0).unwrap()[1], p(11, 1));
    assert!(line.commit_interactive());
    assert!(line.is_junction(p(11, 1)));
}

// ============================================================================
// Display cache
// ============================================================================

#[test]
fn test_display_points_scaled() {
    let mut line = simple_line();
    let display = line.display_points(2.0);
    assert_eq!(display[0][2], Vec2::new(40.0, 20.0));
}

#[test]
fn test_display_cache_invalidated_by_mutation() {
    let mut line = simple_line();
    let _ = line.display_points(1.0);
    line.move_point(0, 0, p(-4, -4)).unwrap();
    assert_eq!(line.display_points(1.0)[0][0], Vec2::new(-4.0, -4.0));
}

#[test]
fn test_display_cache_invalidated_by_interactive_move() {
    let mut line = simple_line();
    let _ = line.display_points(1.0);
    line.begin_interactive(PointRef::new(0, 0)).unwrap();
    line.move_point_interactive(p(7, 7));
    assert_eq!(line.display_points(1.0)[0][0], Vec2::new(7.0, 7.0));
}

// ============================================================================
// Stable branch ids
// ============================================================================

#[test]
fn test_stable_id_single_branch() {
    assert_eq!(simple_line().stable_branch_ids(), vec!["main_line"]);
}

#[test]
fn test_stable_ids_sorted_by_start_point() {
    let line = LineGeometry::multi(
        vec![
            vec![p(0, 0), p(100, 0)],
            vec![p(80, 0), p(80, 40)],
            vec![p(20, 0), p(20, 40)],
        ],
        2,
    )
    .unwrap();
    assert_eq!(
        line.stable_branch_ids(),
        vec!["main_stem", "branch_2", "branch_1"]
    );
}

#[test]
fn test_branch_display_names() {
    assert_eq!(branch_display_name("main_line"), "Main Line");
    assert_eq!(branch_display_name("main_stem"), "Main Stem");
    assert_eq!(branch_display_name("branch_3"), "Branch 3");
    assert_eq!(branch_display_name("other"), "other");
}
