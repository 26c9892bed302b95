//! Line geometry model: one or more branches of integer image-pixel points.
//!
//! A [`LineGeometry`] is either a simple line (`LineString`, exactly one branch)
//! or a branching line (`MultiLineString`, one or more branches). Conversion
//! from simple to branching is explicit and one-way.
//!
//! Every committed mutation goes through the same refresh step: junctions are
//! reclassified, the display cache is dropped, bounds are recomputed and the
//! revision counter is bumped. Rejected mutations leave the geometry untouched.
//!
//! Dragging a point uses the interactive phase ([`LineGeometry::begin_interactive`]
//! through [`LineGeometry::commit_interactive`]) which skips junction
//! reclassification until release.

use std::collections::{HashMap, HashSet};

use bevy::math::{IVec2, Rect, Vec2};
use thiserror::Error;

use crate::constants::MIN_BRANCH_POINTS;

/// Ordered points of one branch.
pub type Branch = Vec<IVec2>;

/// Storage kind of a line, mirrored into persisted geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryKind {
    #[default]
    LineString,
    MultiLineString,
}

/// Geometry exchanged with the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryData {
    Point(IVec2),
    LineString(Vec<IVec2>),
    MultiLineString(Vec<Vec<IVec2>>),
}

impl GeometryData {
    pub fn type_name(&self) -> &'static str {
        match self {
            GeometryData::Point(_) => "Point",
            GeometryData::LineString(_) => "LineString",
            GeometryData::MultiLineString(_) => "MultiLineString",
        }
    }
}

/// Address of one point: branch index plus position within the branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointRef {
    pub branch: usize,
    pub index: usize,
}

impl PointRef {
    pub fn new(branch: usize, index: usize) -> Self {
        Self { branch, index }
    }
}

/// How a control point is drawn and hit-tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRole {
    Vertex,
    Endpoint,
    Junction,
}

/// Inclusive axis-aligned box in canonical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub min: IVec2,
    pub max: IVec2,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = IVec2>) -> Option<Bounds> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(
            Bounds {
                min: first,
                max: first,
            },
            |bounds, p| Bounds {
                min: bounds.min.min(p),
                max: bounds.max.max(p),
            },
        ))
    }

    pub fn contains(&self, point: IVec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn as_rect(&self) -> Rect {
        Rect::from_corners(self.min.as_vec2(), self.max.as_vec2())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("branch {branch} cannot have fewer than {min} points")]
    TooShort { branch: usize, min: usize },
    #[error("a branch needs at least {min} points, got {len}")]
    BranchTooShort { len: usize, min: usize },
    #[error("convert the line to a branching line before adding branches")]
    RequiresConversion,
    #[error("the line is already a branching line")]
    AlreadyMultiBranch,
    #[error("cannot delete the last remaining branch")]
    LastBranch,
    #[error("branch {0} does not exist")]
    BranchOutOfRange(usize),
    #[error("point {index} does not exist on branch {branch}")]
    PointOutOfRange { branch: usize, index: usize },
}

/// Scaled copy of the branches used for painting.
#[derive(Debug, Clone)]
struct DisplayCache {
    scale: f32,
    branches: Vec<Vec<Vec2>>,
}

/// Live drag state: the moved point, its junction partners and their original positions.
#[derive(Debug, Clone)]
struct InteractiveMove {
    moved: Vec<PointRef>,
    original: IVec2,
}

#[derive(Debug, Clone)]
pub struct LineGeometry {
    branches: Vec<Branch>,
    kind: GeometryKind,
    min_points: usize,
    /// Junction position -> incident segment connections (always >= 3)
    junctions: HashMap<IVec2, usize>,
    bounds: Bounds,
    display: Option<DisplayCache>,
    interactive: Option<InteractiveMove>,
    revision: u64,
}

impl LineGeometry {
    /// Create a simple (single branch) line.
    pub fn new(points: Vec<IVec2>, min_points: usize) -> Result<Self, GeometryError> {
        let min_points = min_points.max(MIN_BRANCH_POINTS);
        if points.len() < min_points {
            return Err(GeometryError::BranchTooShort {
                len: points.len(),
                min: min_points,
            });
        }
        Ok(Self::from_parts(
            vec![points],
            GeometryKind::LineString,
            min_points,
        ))
    }

    /// Create a branching line from one or more branches.
    pub fn multi(branches: Vec<Branch>, min_points: usize) -> Result<Self, GeometryError> {
        let min_points = min_points.max(MIN_BRANCH_POINTS);
        if branches.is_empty() {
            return Err(GeometryError::BranchTooShort {
                len: 0,
                min: min_points,
            });
        }
        if let Some(short) = branches.iter().find(|b| b.len() < min_points) {
            return Err(GeometryError::BranchTooShort {
                len: short.len(),
                min: min_points,
            });
        }
        Ok(Self::from_parts(
            branches,
            GeometryKind::MultiLineString,
            min_points,
        ))
    }

    fn from_parts(branches: Vec<Branch>, kind: GeometryKind, min_points: usize) -> Self {
        let mut geometry = Self {
            branches,
            kind,
            min_points,
            junctions: HashMap::new(),
            bounds: Bounds::default(),
            display: None,
            interactive: None,
            revision: 0,
        };
        geometry.refresh();
        geometry
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branch(&self, index: usize) -> Option<&Branch> {
        self.branches.get(index)
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    pub fn point(&self, at: PointRef) -> Option<IVec2> {
        self.branches.get(at.branch)?.get(at.index).copied()
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// True when the line has more than one branch.
    pub fn is_branching(&self) -> bool {
        self.branches.len() > 1
    }

    /// True once the line was converted (or loaded) as a branching line.
    pub fn is_multi(&self) -> bool {
        self.kind == GeometryKind::MultiLineString
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Number of committed changes since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_junction(&self, position: IVec2) -> bool {
        self.junctions.contains_key(&position)
    }

    /// Junction positions in a stable order.
    pub fn junctions(&self) -> Vec<IVec2> {
        let mut positions: Vec<IVec2> = self.junctions.keys().copied().collect();
        positions.sort_by_key(|p| (p.x, p.y));
        positions
    }

    pub fn point_role(&self, at: PointRef) -> Option<PointRole> {
        let branch = self.branches.get(at.branch)?;
        let position = *branch.get(at.index)?;
        Some(if self.is_junction(position) {
            PointRole::Junction
        } else if at.index == 0 || at.index + 1 == branch.len() {
            PointRole::Endpoint
        } else {
            PointRole::Vertex
        })
    }

    /// All occurrences of a position across branches.
    pub fn occurrences(&self, position: IVec2) -> Vec<PointRef> {
        self.branches
            .iter()
            .enumerate()
            .flat_map(|(b, branch)| {
                branch
                    .iter()
                    .enumerate()
                    .filter(move |(_, p)| **p == position)
                    .map(move |(i, _)| PointRef::new(b, i))
            })
            .collect()
    }

    /// Whether deleting a point from this branch would be accepted.
    pub fn can_delete_point(&self, branch: usize) -> bool {
        self.branches
            .get(branch)
            .is_some_and(|b| b.len() > self.min_points)
    }

    /// Branch coordinates scaled for display, rebuilt after any mutation or scale change.
    pub fn display_points(&mut self, scale: f32) -> &[Vec<Vec2>] {
        let stale = self
            .display
            .as_ref()
            .is_none_or(|cache| cache.scale != scale);
        if stale {
            let branches = self
                .branches
                .iter()
                .map(|b| b.iter().map(|p| p.as_vec2() * scale).collect())
                .collect();
            self.display = Some(DisplayCache { scale, branches });
        }
        match &self.display {
            Some(cache) => &cache.branches,
            None => &[],
        }
    }

    pub fn to_data(&self) -> GeometryData {
        match self.kind {
            GeometryKind::LineString => {
                GeometryData::LineString(self.branches.first().cloned().unwrap_or_default())
            }
            GeometryKind::MultiLineString => GeometryData::MultiLineString(self.branches.clone()),
        }
    }

    // ------------------------------------------------------------------
    // Committed mutations
    // ------------------------------------------------------------------

    pub fn insert_point(
        &mut self,
        branch: usize,
        index: usize,
        point: IVec2,
    ) -> Result<(), GeometryError> {
        let target = self
            .branches
            .get_mut(branch)
            .ok_or(GeometryError::BranchOutOfRange(branch))?;
        if index > target.len() {
            return Err(GeometryError::PointOutOfRange { branch, index });
        }
        target.insert(index, point);
        self.commit();
        Ok(())
    }

    pub fn delete_point(&mut self, branch: usize, index: usize) -> Result<(), GeometryError> {
        let min = self.min_points;
        let target = self
            .branches
            .get_mut(branch)
            .ok_or(GeometryError::BranchOutOfRange(branch))?;
        if index >= target.len() {
            return Err(GeometryError::PointOutOfRange { branch, index });
        }
        if target.len() <= min {
            return Err(GeometryError::TooShort { branch, min });
        }
        target.remove(index);
        self.commit();
        Ok(())
    }

    /// Move a point. Moving a junction moves every occurrence of it.
    pub fn move_point(
        &mut self,
        branch: usize,
        index: usize,
        point: IVec2,
    ) -> Result<(), GeometryError> {
        let at = PointRef::new(branch, index);
        let moved = self.linked_points(at)?;
        for r in moved {
            self.branches[r.branch][r.index] = point;
        }
        self.commit();
        Ok(())
    }

    /// Append a branch; only allowed on branching lines. Returns the new branch index.
    pub fn add_branch(&mut self, points: Branch) -> Result<usize, GeometryError> {
        if !self.is_multi() {
            return Err(GeometryError::RequiresConversion);
        }
        if points.len() < self.min_points {
            return Err(GeometryError::BranchTooShort {
                len: points.len(),
                min: self.min_points,
            });
        }
        self.branches.push(points);
        self.commit();
        Ok(self.branches.len() - 1)
    }

    /// Turn a simple line into a branching line holding the same single branch.
    pub fn convert_to_multi_branch(&mut self) -> Result<(), GeometryError> {
        if self.is_multi() {
            return Err(GeometryError::AlreadyMultiBranch);
        }
        self.kind = GeometryKind::MultiLineString;
        self.commit();
        Ok(())
    }

    pub fn delete_branch(&mut self, index: usize) -> Result<(), GeometryError> {
        if index >= self.branches.len() {
            return Err(GeometryError::BranchOutOfRange(index));
        }
        if self.branches.len() <= 1 {
            return Err(GeometryError::LastBranch);
        }
        self.branches.remove(index);
        self.commit();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Interactive (drag) phase
    // ------------------------------------------------------------------

    /// Start a live move of one point (and its junction partners).
    pub fn begin_interactive(&mut self, at: PointRef) -> Result<(), GeometryError> {
        let original = self
            .point(at)
            .ok_or(GeometryError::PointOutOfRange {
                branch: at.branch,
                index: at.index,
            })?;
        let moved = self.linked_points(at)?;
        self.interactive = Some(InteractiveMove { moved, original });
        Ok(())
    }

    /// Cheap preview move: updates positions and bounds only.
    pub fn move_point_interactive(&mut self, point: IVec2) -> bool {
        let Some(state) = &self.interactive else {
            return false;
        };
        for r in &state.moved {
            self.branches[r.branch][r.index] = point;
        }
        self.display = None;
        self.bounds = compute_bounds(&self.branches);
        true
    }

    /// Finish the live move. Returns true when the geometry actually changed.
    pub fn commit_interactive(&mut self) -> bool {
        let Some(state) = self.interactive.take() else {
            return false;
        };
        let changed = state
            .moved
            .first()
            .and_then(|r| self.point(*r))
            .is_some_and(|p| p != state.original);
        if changed {
            self.commit();
        } else {
            self.refresh();
        }
        changed
    }

    /// Abort the live move and restore the original positions.
    pub fn cancel_interactive(&mut self) {
        let Some(state) = self.interactive.take() else {
            return;
        };
        for r in &state.moved {
            self.branches[r.branch][r.index] = state.original;
        }
        self.refresh();
    }

    // ------------------------------------------------------------------
    // Branch identity
    // ------------------------------------------------------------------

    /// Stable identifier per branch index.
    ///
    /// A single branch is `main_line`. With several, branch 0 is `main_stem`
    /// and the rest are numbered `branch_1..` ordered by their start point.
    pub fn stable_branch_ids(&self) -> Vec<String> {
        if self.branches.len() <= 1 {
            return vec!["main_line".to_string(); self.branches.len()];
        }
        let mut ids = vec![String::new(); self.branches.len()];
        ids[0] = "main_stem".to_string();
        let mut others: Vec<usize> = (1..self.branches.len()).collect();
        others.sort_by_key(|&i| {
            let start = self.branches[i].first().copied().unwrap_or_default();
            (start.x, start.y, i)
        });
        for (n, index) in others.into_iter().enumerate() {
            ids[index] = format!("branch_{}", n + 1);
        }
        ids
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// The point plus, if it is a junction, every other occurrence of it.
    fn linked_points(&self, at: PointRef) -> Result<Vec<PointRef>, GeometryError> {
        let Some(position) = self.point(at) else {
            return Err(if at.branch >= self.branches.len() {
                GeometryError::BranchOutOfRange(at.branch)
            } else {
                GeometryError::PointOutOfRange {
                    branch: at.branch,
                    index: at.index,
                }
            });
        };
        if self.is_junction(position) {
            Ok(self.occurrences(position))
        } else {
            Ok(vec![at])
        }
    }

    fn refresh(&mut self) {
        self.junctions = classify_junctions(&self.branches);
        self.display = None;
        self.bounds = compute_bounds(&self.branches);
    }

    fn commit(&mut self) {
        self.interactive = None;
        self.refresh();
        self.revision += 1;
    }
}

/// Human readable name for a stable branch id.
pub fn branch_display_name(stable_id: &str) -> String {
    match stable_id {
        "main_line" => "Main Line".to_string(),
        "main_stem" => "Main Stem".to_string(),
        other => match other.strip_prefix("branch_") {
            Some(n) => format!("Branch {}", n),
            None => other.to_string(),
        },
    }
}

fn compute_bounds(branches: &[Branch]) -> Bounds {
    Bounds::from_points(branches.iter().flatten().copied()).unwrap_or_default()
}

/// Positions shared by more than one branch with at least three segment connections.
fn classify_junctions(branches: &[Branch]) -> HashMap<IVec2, usize> {
    let mut connections: HashMap<IVec2, usize> = HashMap::new();
    let mut owners: HashMap<IVec2, HashSet<usize>> = HashMap::new();

    for (b, branch) in branches.iter().enumerate() {
        let last = branch.len().saturating_sub(1);
        for (i, point) in branch.iter().enumerate() {
            let links = usize::from(i > 0) + usize::from(i < last);
            *connections.entry(*point).or_default() += links;
            owners.entry(*point).or_default().insert(b);
        }
    }

    connections
        .into_iter()
        .filter(|(point, count)| {
            *count >= 3 && owners.get(point).is_some_and(|set| set.len() > 1)
        })
        .collect()
}

#[cfg(test)]
mod tests;
