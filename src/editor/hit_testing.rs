//! Resolves a pointer position to the single feature part it addresses.
//!
//! Every feature reports its own candidates (see [`MapFeature::hit_test`]);
//! this module ranks them. Click resolution is strict: a pin beats a control
//! point, which beats a segment. Hovering in edit mode is permissive: larger
//! tolerances, and line elements rank above pins so that a line running under
//! a pin can still be grabbed. During a drag the dragged feature keeps the
//! pointer no matter what else passes beneath it.

use std::cmp::Ordering;

use bevy::math::Vec2;

use crate::common::FeatureKey;
use crate::map::{HitPart, HitRadii, MapFeature};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Click,
    Hover,
    DragContinue,
}

/// The resolved target of a pointer interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct HitTarget {
    pub key: FeatureKey,
    pub part: HitPart,
}

pub struct HitQuery<'a> {
    /// Canonical position
    pub position: Vec2,
    pub zoom: f32,
    pub kind: InteractionKind,
    pub edit_mode: bool,
    pub active_drag: Option<&'a HitTarget>,
    /// Click tolerances in view pixels
    pub radii: HitRadii,
    pub hover_scale: f32,
}

impl HitQuery<'_> {
    /// Tolerances for this query in canonical units.
    fn canonical_radii(&self) -> HitRadii {
        let mut factor = 1.0 / self.zoom.max(f32::EPSILON);
        if self.kind != InteractionKind::Click {
            factor *= self.hover_scale.max(1.0);
        }
        self.radii.scaled(factor)
    }

    /// Lower ranks win.
    fn rank(&self, part: &HitPart) -> u8 {
        let hover_in_edit = self.edit_mode && self.kind != InteractionKind::Click;
        match (part, hover_in_edit) {
            (HitPart::Pin, false) => 0,
            (HitPart::ControlPoint(_), false) => 1,
            (HitPart::Segment { .. }, false) => 2,
            (HitPart::ControlPoint(_), true) => 0,
            (HitPart::Segment { .. }, true) => 1,
            (HitPart::Pin, true) => 2,
        }
    }
}

/// Pick the single best target under `query.position`, or `None`.
pub fn resolve<'a>(
    features: impl IntoIterator<Item = &'a MapFeature>,
    query: &HitQuery,
) -> Option<HitTarget> {
    if query.kind == InteractionKind::DragContinue
        && let Some(active) = query.active_drag
    {
        return Some(active.clone());
    }

    let radii = query.canonical_radii();
    let mut best: Option<(u8, f32, HitTarget)> = None;

    for feature in features {
        if !feature.bounding_box(&radii).contains(query.position) {
            continue;
        }
        for hit in feature.hit_test(query.position, &radii, query.edit_mode) {
            let rank = query.rank(&hit.part);
            let candidate = (
                rank,
                hit.distance,
                HitTarget {
                    key: feature.key(),
                    part: hit.part,
                },
            );
            let better = match &best {
                None => true,
                Some(current) => compare(&candidate, current) == Ordering::Less,
            };
            if better {
                best = Some(candidate);
            }
        }
    }

    best.map(|(_, _, target)| target)
}

/// Rank, then distance, then target id.
fn compare(a: &(u8, f32, HitTarget), b: &(u8, f32, HitTarget)) -> Ordering {
    a.0.cmp(&b.0)
        .then(a.1.total_cmp(&b.1))
        .then_with(|| a.2.key.cmp(&b.2.key))
}
