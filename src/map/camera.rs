use bevy::prelude::*;
use bevy_pancam::{DirectionKeys, PanCam};

use crate::EguiBlockInputState;
use crate::map::{DEFAULT_CENTER, DEFAULT_ZOOM, MapCamera, MapLayer};
use crate::types::zoom_to_scale;

pub fn setup_map_camera(mut commands: Commands) {
    let starting = DEFAULT_CENTER.to_world();

    commands.spawn((
        Camera2d,
        MapCamera,
        MapLayer,
        Projection::Orthographic(OrthographicProjection {
            scale: zoom_to_scale(DEFAULT_ZOOM),
            ..OrthographicProjection::default_2d()
        }),
        Transform {
            translation: Vec3::new(starting.x, starting.y, 1.0),
            ..Default::default()
        },
        PanCam {
            grab_buttons: vec![MouseButton::Middle],
            move_keys: DirectionKeys {
                up: vec![KeyCode::ArrowUp],
                down: vec![KeyCode::ArrowDown],
                left: vec![KeyCode::ArrowLeft],
                right: vec![KeyCode::ArrowRight],
            },
            speed: 400.,
            enabled: true,
            zoom_to_cursor: true,
            min_scale: 0.0001,
            max_scale: f32::INFINITY,
            min_x: f32::NEG_INFINITY,
            max_x: f32::INFINITY,
            min_y: f32::NEG_INFINITY,
            max_y: f32::INFINITY,
        },
    ));
}

pub fn handle_pancam(mut query: Query<&mut PanCam>, state: Res<EguiBlockInputState>) {
    if state.is_changed() {
        for mut pancam in &mut query {
            pancam.enabled = !state.block_input;
        }
    }
}
