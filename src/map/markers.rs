use bevy::prelude::*;

use crate::map::{LabelMode, MapCamera, MapLayer, MapViewState, marker_index};
use crate::types::{Coord, NetworkData, NetworkNode, status_color};

/// On-screen marker radius; markers stay this size at every zoom level.
pub const MARKER_RADIUS_PX: f32 = 12.0;
const OUTLINE_RATIO: f32 = 1.17;
const LABEL_FONT_SIZE: f32 = 14.0;

#[derive(Component)]
pub struct MarkerNode {
    pub index: usize,
}

#[derive(Component)]
pub struct MarkerLabel {
    pub index: usize,
}

pub struct MarkerSpec {
    pub index: usize,
    pub pos: Coord,
    pub color: Srgba,
    pub label: String,
    pub title: String,
}

/// One spec per node: position, status color, and the 1-based number label.
pub fn marker_specs(nodes: &[NetworkNode]) -> Vec<MarkerSpec> {
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| MarkerSpec {
            index,
            pos: node.coord(),
            color: status_color(&node.status),
            label: (index + 1).to_string(),
            title: node.name.clone(),
        })
        .collect()
}

/// Tears down and re-places all markers whenever the view state asks for it,
/// e.g. after initialization or a dataset swap.
pub fn respawn_markers(
    mut commands: Commands,
    existing: Query<Entity, With<MarkerNode>>,
    network: Res<NetworkData>,
    mut state: ResMut<MapViewState>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    if !state.respawn {
        return;
    }
    state.respawn = false;

    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }
    state.markers = marker_index(&network.nodes);
    state.open_panel = None;

    let elevation = 10.0;
    for spec in marker_specs(&network.nodes) {
        let world = spec.pos.to_world();
        let (label_text, label_visibility) = match state.labels {
            LabelMode::Index => (spec.label.clone(), Visibility::Inherited),
            LabelMode::Name => (spec.title.clone(), Visibility::Inherited),
            LabelMode::Hidden => (spec.label.clone(), Visibility::Hidden),
        };

        commands
            .spawn((
                Mesh2d(meshes.add(Circle::new(1.0))),
                MeshMaterial2d(materials.add(Color::from(spec.color))),
                Transform::from_translation(Vec3::new(world.x, world.y, elevation)),
                MarkerNode { index: spec.index },
                MapLayer,
            ))
            .with_children(|parent| {
                parent.spawn((
                    Mesh2d(meshes.add(Annulus::new(1.0, OUTLINE_RATIO))),
                    MeshMaterial2d(materials.add(Color::WHITE)),
                    Transform::from_xyz(0.0, 0.0, 0.5),
                ));
                parent.spawn((
                    Text2d::new(label_text),
                    TextFont {
                        font_size: LABEL_FONT_SIZE,
                        ..default()
                    },
                    TextColor(Color::WHITE),
                    Transform::from_xyz(0.0, 0.0, 1.0)
                        .with_scale(Vec3::splat(1.0 / MARKER_RADIUS_PX)),
                    label_visibility,
                    MarkerLabel { index: spec.index },
                ));
            });
    }
}

/// Counteracts camera zoom so markers keep a constant pixel size.
pub fn scale_markers(
    camera: Query<&Projection, With<MapCamera>>,
    mut markers: Query<&mut Transform, (With<MarkerNode>, Without<MapCamera>)>,
) {
    let Ok(Projection::Orthographic(ortho)) = camera.single() else {
        return;
    };
    let scale = MARKER_RADIUS_PX * ortho.scale;
    for mut transform in markers.iter_mut() {
        transform.scale = Vec3::splat(scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NODE_ACTIVE_COLOR, NODE_STANDBY_COLOR, demo_network};

    #[test]
    fn one_spec_per_node_with_one_based_labels() {
        let demo = demo_network();
        let specs = marker_specs(&demo.nodes);

        assert_eq!(specs.len(), demo.nodes.len());
        for (i, spec) in specs.iter().enumerate() {
            assert_eq!(spec.label, (i + 1).to_string());
            assert_eq!(spec.pos, demo.nodes[i].coord());
            assert_eq!(spec.title, demo.nodes[i].name);
        }
    }

    #[test]
    fn spec_colors_follow_status() {
        let demo = demo_network();
        let specs = marker_specs(&demo.nodes);

        assert_eq!(specs[0].color, NODE_ACTIVE_COLOR);
        assert_eq!(specs[3].color, NODE_STANDBY_COLOR);
        assert_eq!(specs[4].color, NODE_STANDBY_COLOR);
    }

    #[test]
    fn empty_node_sequence_yields_no_specs() {
        assert!(marker_specs(&[]).is_empty());
    }
}
