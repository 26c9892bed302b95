//! Messages the editor sends to the rest of the app.

use bevy::prelude::*;

/// The user activated a pin or line outside edit mode.
#[derive(Message, Debug, Clone)]
pub struct NavigateToTarget {
    pub target: String,
}

/// An edit was refused by the geometry model; nothing changed.
#[derive(Message, Debug, Clone)]
pub struct EditRejected {
    pub target: String,
    pub reason: String,
}
