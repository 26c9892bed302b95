//! Drawing the open map: background sprite plus gizmo features.

use std::path::PathBuf;

use bevy::asset::LoadState;
use bevy::gizmos::prelude::*;
use bevy::prelude::*;

use crate::map::{Painter, ViewTransform};
use crate::theme;

use super::gizmo::{GizmoPainter, MapGizmoGroup};
use super::params::{WindowParams, view_to_world};
use super::scene::MapScene;

/// Sprite showing the background image of the open map
#[derive(Component)]
pub struct BackgroundSprite {
    pub path: PathBuf,
}

const BACKGROUND_Z: f32 = -10.0;

/// World transform that places an image of `size` according to `view`.
pub fn background_transform(view: &ViewTransform, size: UVec2, window_size: Vec2) -> Transform {
    let center = view.to_view(size.as_vec2() * 0.5);
    let world = view_to_world(center, window_size);
    Transform::from_translation(world.extend(BACKGROUND_Z))
        .with_scale(Vec3::new(view.zoom(), view.zoom(), 1.0))
}

/// Spawns, moves and removes the background sprite to follow the scene.
pub fn sync_background(
    mut commands: Commands,
    scene: Res<MapScene>,
    window: WindowParams,
    mut sprites: Query<(Entity, &BackgroundSprite, &mut Transform)>,
) {
    let Some(background) = scene.background() else {
        for (entity, _, _) in sprites.iter() {
            commands.entity(entity).despawn();
        }
        return;
    };

    let transform = background_transform(scene.view(), background.size, window.size());
    let mut found = false;
    for (entity, sprite, mut current) in sprites.iter_mut() {
        if sprite.path == background.path && !found {
            found = true;
            if *current != transform {
                *current = transform;
            }
        } else {
            commands.entity(entity).despawn();
        }
    }

    if !found {
        debug!("Showing background {:?}", background.path);
        commands.spawn((
            Sprite {
                image: background.handle.clone(),
                custom_size: Some(background.size.as_vec2()),
                ..default()
            },
            transform,
            BackgroundSprite {
                path: background.path.clone(),
            },
        ));
    }
}

/// A background the asset server could not decode is dropped from the scene.
pub fn detect_background_failure(asset_server: Res<AssetServer>, mut scene: ResMut<MapScene>) {
    let failed = scene
        .background()
        .is_some_and(|bg| matches!(asset_server.load_state(&bg.handle), LoadState::Failed(_)));
    if failed {
        scene.clear_background();
    }
}

pub fn draw_scene(
    mut gizmos: Gizmos<MapGizmoGroup>,
    mut scene: ResMut<MapScene>,
    window: WindowParams,
) {
    let mut painter = GizmoPainter {
        gizmos: &mut gizmos,
        window_size: window.size(),
    };

    if let Some(size) = scene.view().image_size() {
        let view = scene.view();
        let corners = [
            Vec2::ZERO,
            Vec2::new(size.x as f32, 0.0),
            size.as_vec2(),
            Vec2::new(0.0, size.y as f32),
            Vec2::ZERO,
        ]
        .map(|corner| view.to_view(corner));
        for pair in corners.windows(2) {
            painter.line(pair[0], pair[1], 1.0, theme::IMAGE_OUTLINE);
        }
    }

    scene.paint(&mut painter);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_centered_at_identity() {
        // An image exactly filling the window sits at the world origin
        let view = ViewTransform::default();
        let transform = background_transform(&view, UVec2::new(800, 600), Vec2::new(800.0, 600.0));
        assert_eq!(transform.translation, Vec3::new(0.0, 0.0, BACKGROUND_Z));
        assert_eq!(transform.scale, Vec3::ONE);
    }

    #[test]
    fn test_background_follows_pan_and_zoom() {
        let view = ViewTransform::new(Vec2::new(100.0, 50.0), 2.0);
        let transform = background_transform(&view, UVec2::new(100, 100), Vec2::new(800.0, 600.0));
        // Image center (50, 50) maps to view (200, 150)
        assert_eq!(transform.translation.truncate(), Vec2::new(-200.0, 150.0));
        assert_eq!(transform.scale, Vec3::new(2.0, 2.0, 1.0));
    }
}
