//! Common types shared across multiple modules.
//!
//! Feature identity and the input modifier snapshot are used by the map items,
//! the hit tester and the editor controller alike.

use std::fmt;

use bevy::window::{CursorIcon, SystemCursorIcon};

/// Kind of a map feature. A scene holds at most one feature per (id, kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    Pin,
    Line,
}

impl FeatureKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            FeatureKind::Pin => "Pin",
            FeatureKind::Line => "Line",
        }
    }
}

/// Identifies one feature in the scene: the target node id plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureKey {
    pub kind: FeatureKind,
    pub target: String,
}

impl FeatureKey {
    pub fn pin(target: impl Into<String>) -> Self {
        Self {
            kind: FeatureKind::Pin,
            target: target.into(),
        }
    }

    pub fn line(target: impl Into<String>) -> Self {
        Self {
            kind: FeatureKind::Line,
            target: target.into(),
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind.display_name(), self.target)
    }
}

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
    };

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt
    }
}

/// What the pointer is currently doing, used to pick a cursor icon.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum PointerHint {
    #[default]
    None,
    Navigate,
    Move,
    InsertPoint,
    Place,
    Pan,
}

impl PointerHint {
    /// Get the appropriate cursor icon for this hint.
    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            PointerHint::None => CursorIcon::System(SystemCursorIcon::Default),
            PointerHint::Navigate => CursorIcon::System(SystemCursorIcon::Pointer),
            PointerHint::Move => CursorIcon::System(SystemCursorIcon::Move),
            PointerHint::InsertPoint => CursorIcon::System(SystemCursorIcon::Copy),
            PointerHint::Place => CursorIcon::System(SystemCursorIcon::Crosshair),
            PointerHint::Pan => CursorIcon::System(SystemCursorIcon::Grabbing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_key_ordering_groups_by_kind() {
        let mut keys = vec![
            FeatureKey::line("a"),
            FeatureKey::pin("b"),
            FeatureKey::pin("a"),
        ];
        keys.sort();
        assert_eq!(keys[0], FeatureKey::pin("a"));
        assert_eq!(keys[1], FeatureKey::pin("b"));
        assert_eq!(keys[2], FeatureKey::line("a"));
    }

    #[test]
    fn test_same_target_different_kind_are_distinct() {
        assert_ne!(FeatureKey::pin("Town"), FeatureKey::line("Town"));
    }

    #[test]
    fn test_feature_key_display() {
        assert_eq!(FeatureKey::line("River").to_string(), "Line 'River'");
    }

    #[test]
    fn test_modifiers_any() {
        assert!(!Modifiers::NONE.any());
        assert!(Modifiers::SHIFT.any());
    }

    #[test]
    fn test_pointer_hint_default() {
        assert_eq!(PointerHint::default(), PointerHint::None);
    }
}
