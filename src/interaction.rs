use bevy::{prelude::*, window::PrimaryWindow};

use crate::EguiBlockInputState;
use crate::globe::GlobeScene;
use crate::map::{MARKER_RADIUS_PX, MARKER_ZOOM, MapCamera, MapViewState, recenter, set_zoom};
use crate::types::{NetworkData, load_network, world_to_coord};

pub struct InteractionSystemPlugin;

impl Plugin for InteractionSystemPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, handle_marker_click)
            .add_systems(Update, file_drop);
    }
}

/// Clicking a marker opens its info panel (closing any other), recenters on
/// it, and zooms in. Clicks on empty map are ignored.
fn handle_marker_click(
    buttons: Res<ButtonInput<MouseButton>>,
    q_windows: Query<&Window, With<PrimaryWindow>>,
    mut camera: Query<
        (&Camera, &GlobalTransform, &mut Transform, &mut Projection),
        With<MapCamera>,
    >,
    state: Option<ResMut<MapViewState>>,
    egui_state: Res<EguiBlockInputState>,
) {
    let Some(mut state) = state else {
        return;
    };
    if !buttons.just_pressed(MouseButton::Left) || egui_state.block_input {
        return;
    }
    let Ok((camera, camera_transform, mut transform, mut projection)) = camera.single_mut() else {
        return;
    };
    let Ok(window) = q_windows.single() else {
        return;
    };
    let Some(position) = window.cursor_position() else {
        return;
    };
    let Ok(world_pos) = camera.viewport_to_world_2d(camera_transform, position) else {
        return;
    };

    let Projection::Orthographic(ortho) = &*projection else {
        return;
    };
    let pick_radius = (MARKER_RADIUS_PX * ortho.scale) as f64;

    let clicked = world_to_coord(world_pos);
    let Some(marker) = state.markers.nearest_neighbor(&[clicked.long, clicked.lat]) else {
        return;
    };
    let dx = marker.pos.long - clicked.long;
    let dy = marker.pos.lat - clicked.lat;
    if dx * dx + dy * dy > pick_radius * pick_radius {
        return;
    }
    let index = marker.index;
    let pos = marker.pos;

    state.open_panel = Some(index);
    recenter(&mut transform, pos);
    set_zoom(&mut projection, MARKER_ZOOM);
}

/// Dropping a network dataset onto the window swaps it in and respawns the
/// live renderer's node visuals.
fn file_drop(
    mut evr_dnd: EventReader<FileDragAndDrop>,
    mut network: ResMut<NetworkData>,
    map_state: Option<ResMut<MapViewState>>,
    globe_scene: Option<ResMut<GlobeScene>>,
) {
    for ev in evr_dnd.read() {
        if let FileDragAndDrop::DroppedFile { path_buf, .. } = ev {
            if path_buf.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(path) = path_buf.to_str() else {
                continue;
            };
            match load_network(path) {
                Ok(data) => {
                    info!(
                        "loaded {} nodes and {} links from {path}",
                        data.nodes.len(),
                        data.links.len()
                    );
                    *network = data;
                    if let Some(mut state) = map_state {
                        state.respawn = true;
                    }
                    if let Some(mut scene) = globe_scene {
                        scene.respawn = true;
                    }
                    return;
                }
                Err(err) => warn!("ignoring dropped file {path}: {err}"),
            }
        }
    }
}
