use bevy::prelude::*;
use bevy::render::render_resource::Face;

use crate::globe::{FLOW_STEP, GlobeLayer, GlobeScene};
use crate::types::{Coord, LINK_PRIMARY_COLOR, LINK_SECONDARY_COLOR, NetworkData, NetworkLink};

/// Hub-side endpoints render larger than far-side ones.
pub const SOURCE_MARKER_RADIUS: f32 = 0.08;
pub const TARGET_MARKER_RADIUS: f32 = 0.06;

/// Baked texture glow dot radii, texture pixels.
const SOURCE_GLOW_PX: f64 = 8.0;
const TARGET_GLOW_PX: f64 = 6.0;

const LINE_ALPHA: f32 = 0.8;
const PULSE_RADIUS: f32 = 0.012;

/// Endpoint markers, so a dataset swap can clear them without touching the
/// rest of the scene.
#[derive(Component)]
pub struct LinkMarker;

/// One drawn link: both endpoints projected onto the unit sphere, plus the
/// flow phase the render loop keeps advancing.
#[derive(Debug, Clone)]
pub struct LinkFlow {
    pub source: Vec3,
    pub target: Vec3,
    pub phase: f32,
}

impl LinkFlow {
    pub fn new(link: &NetworkLink) -> Self {
        LinkFlow {
            source: link.source.pos.to_unit_sphere().as_vec3(),
            target: link.target.pos.to_unit_sphere().as_vec3(),
            phase: 0.0,
        }
    }
}

/// Where the pulse currently sits along the line, 0 at the source.
pub fn pulse_position(phase: f32) -> f32 {
    phase.fract()
}

/// Glow dots baked into the earth texture, one per link endpoint.
pub fn link_glow_points(links: &[NetworkLink]) -> Vec<(Coord, f64)> {
    links
        .iter()
        .flat_map(|link| {
            [
                (link.source.pos, SOURCE_GLOW_PX),
                (link.target.pos, TARGET_GLOW_PX),
            ]
        })
        .collect()
}

pub fn spawn_links(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    links: &[NetworkLink],
) -> Vec<LinkFlow> {
    links
        .iter()
        .map(|link| {
            let flow = LinkFlow::new(link);
            spawn_endpoint_marker(
                commands,
                meshes,
                materials,
                flow.source,
                SOURCE_MARKER_RADIUS,
                LINK_PRIMARY_COLOR,
            );
            spawn_endpoint_marker(
                commands,
                meshes,
                materials,
                flow.target,
                TARGET_MARKER_RADIUS,
                LINK_SECONDARY_COLOR,
            );
            flow
        })
        .collect()
}

/// A glowing sphere: emissive core plus a translucent back-face shell at
/// twice the radius.
fn spawn_endpoint_marker(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    position: Vec3,
    radius: f32,
    color: Srgba,
) {
    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(radius).mesh().uv(32, 32))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::from(color),
            emissive: Color::from(color).to_linear() * 0.8,
            ..default()
        })),
        Transform::from_translation(position),
        LinkMarker,
        GlobeLayer,
    ));

    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(radius * 2.0).mesh().uv(32, 32))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::from(color.with_alpha(0.3)),
            emissive: Color::from(color).to_linear() * 0.3,
            alpha_mode: AlphaMode::Blend,
            cull_mode: Some(Face::Front),
            ..default()
        })),
        Transform::from_translation(position),
        LinkMarker,
        GlobeLayer,
    ));
}

/// The flow half of the render loop: advance each link's phase, draw its
/// line, and run a pulse from source to target.
pub fn animate_links(mut scene: ResMut<GlobeScene>, mut gizmos: Gizmos) {
    let line_color = Color::from(LINK_PRIMARY_COLOR.with_alpha(LINE_ALPHA));

    for link in scene.links.iter_mut() {
        link.phase += FLOW_STEP;
        gizmos.line(link.source, link.target, line_color);

        let pulse = link
            .source
            .lerp(link.target, pulse_position(link.phase));
        gizmos.sphere(pulse, PULSE_RADIUS, Color::WHITE);
    }
}

/// Rebuilds endpoint markers and flows after a dataset swap.
pub fn respawn_links(
    mut commands: Commands,
    existing: Query<Entity, With<LinkMarker>>,
    network: Res<NetworkData>,
    mut scene: ResMut<GlobeScene>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !scene.respawn {
        return;
    }
    scene.respawn = false;

    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }
    scene.links = spawn_links(&mut commands, &mut meshes, &mut materials, &network.links);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::demo_network;

    #[test]
    fn flows_project_endpoints_onto_the_unit_sphere() {
        let demo = demo_network();
        let flows: Vec<LinkFlow> = demo.links.iter().map(LinkFlow::new).collect();

        assert_eq!(flows.len(), demo.links.len());
        for flow in &flows {
            assert!((flow.source.length() - 1.0).abs() < 1e-5);
            assert!((flow.target.length() - 1.0).abs() < 1e-5);
            assert_eq!(flow.phase, 0.0);
        }
    }

    #[test]
    fn glow_points_cover_both_ends_of_every_link() {
        let demo = demo_network();
        let points = link_glow_points(&demo.links);

        assert_eq!(points.len(), demo.links.len() * 2);
        // Sources bake bigger dots than targets.
        assert_eq!(points[0].1, SOURCE_GLOW_PX);
        assert_eq!(points[1].1, TARGET_GLOW_PX);
    }

    #[test]
    fn pulse_stays_inside_the_line() {
        for phase in [0.0, 0.3, 0.99, 1.0, 2.7, 153.4] {
            let t = pulse_position(phase);
            assert!((0.0..1.0).contains(&t), "phase {phase} gave {t}");
        }
    }
}
