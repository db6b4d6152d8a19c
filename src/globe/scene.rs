use bevy::prelude::*;
use bevy::render::render_resource::Face;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy::window::PrimaryWindow;
use bevy_tasks::futures_lite::future;
use image::RgbaImage;

use crate::WORLD_OUTLINE_PATH;
use crate::globe::{GlobeLayer, LinkFlow, ROTATION_STEP, TEXTURE_DEADLINE_SECS, link_glow_points, spawn_links};
use crate::texture::{TEXTURE_HEIGHT, TEXTURE_WIDTH, build_earth_texture, into_bevy_image, load_world_outline};
use crate::types::{LINK_PRIMARY_COLOR, NetworkData};

const CAMERA_DISTANCE: f32 = 2.5;
const CAMERA_FOV_DEG: f32 = 75.0;
const ATMOSPHERE_RADIUS: f32 = 1.05;
const OCEAN_COLOR: Srgba = Srgba::new(0.102, 0.227, 0.322, 1.0);

/// The sphere that spins. Link markers stay put.
#[derive(Component)]
pub struct GlobeMesh;

/// Scene handle: exists exactly while an initialized globe is live, and owns
/// the per-link flow phases the render loop advances.
#[derive(Resource)]
pub struct GlobeScene {
    pub links: Vec<LinkFlow>,
    pub respawn: bool,
}

#[derive(Resource)]
pub struct TextureLoading {
    task: Task<Result<RgbaImage, String>>,
    deadline: Timer,
}

/// Starts the texture task. The scene itself is only assembled once the
/// readiness poll resolves.
pub fn begin_globe_init(
    mut commands: Commands,
    windows: Query<&Window, With<PrimaryWindow>>,
    network: Res<NetworkData>,
) {
    if windows.is_empty() {
        error!("globe surface not found, skipping globe initialization");
        return;
    }

    let glow_points = link_glow_points(&network.links);
    let task_pool = AsyncComputeTaskPool::get();
    let task = task_pool.spawn(async move {
        load_world_outline(WORLD_OUTLINE_PATH)
            .map(|landmasses| {
                build_earth_texture(&landmasses, &glow_points, TEXTURE_WIDTH, TEXTURE_HEIGHT)
            })
            .map_err(|err| err.to_string())
    });

    commands.insert_resource(TextureLoading {
        task,
        deadline: Timer::from_seconds(TEXTURE_DEADLINE_SECS, TimerMode::Once),
    });
}

/// Deadline-bounded readiness poll. Unlike the map renderer's bounded
/// attempts, the wait itself always completes: the deadline resolves it, and
/// only the availability check afterwards can abort. A task that finishes
/// with an error still yields a scene, just untextured.
pub fn poll_texture(
    mut commands: Commands,
    time: Res<Time>,
    mut loading: ResMut<TextureLoading>,
    mut images: ResMut<Assets<Image>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    network: Res<NetworkData>,
) {
    loading.deadline.tick(time.delta());

    if let Some(result) = future::block_on(future::poll_once(&mut loading.task)) {
        let texture = match result {
            Ok(img) => Some(images.add(into_bevy_image(img))),
            Err(err) => {
                warn!("earth texture failed ({err}), continuing untextured");
                None
            }
        };
        build_scene(&mut commands, &mut meshes, &mut materials, texture, &network);
        commands.remove_resource::<TextureLoading>();
    } else if loading.deadline.finished() {
        error!(
            "earth texture not ready after {TEXTURE_DEADLINE_SECS}s, skipping globe initialization"
        );
        commands.remove_resource::<TextureLoading>();
    }
}

fn build_scene(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    texture: Option<Handle<Image>>,
    network: &NetworkData,
) {
    commands.spawn((
        Name::new("Globe Camera"),
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: CAMERA_FOV_DEG.to_radians(),
            near: 0.1,
            far: 1000.0,
            ..default()
        }),
        Transform::from_xyz(0.0, 0.0, CAMERA_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y),
        GlobeLayer,
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 600.0,
        ..default()
    });
    commands.spawn((
        Name::new("Accent Light"),
        PointLight {
            color: Color::from(LINK_PRIMARY_COLOR),
            intensity: 2_000_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(5.0, 3.0, 5.0),
        GlobeLayer,
    ));

    let untextured = texture.is_none();
    commands.spawn((
        Name::new("Globe"),
        Mesh3d(meshes.add(Sphere::new(1.0).mesh().uv(64, 64))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: if untextured {
                Color::from(OCEAN_COLOR)
            } else {
                Color::WHITE
            },
            base_color_texture: texture,
            emissive: Color::from(OCEAN_COLOR).to_linear() * 0.3,
            perceptual_roughness: 1.0,
            metallic: 0.0,
            ..default()
        })),
        Transform::default(),
        GlobeMesh,
        GlobeLayer,
    ));

    commands.spawn((
        Name::new("Atmosphere"),
        Mesh3d(meshes.add(Sphere::new(ATMOSPHERE_RADIUS).mesh().uv(64, 64))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::from(LINK_PRIMARY_COLOR.with_alpha(0.2)),
            emissive: Color::from(LINK_PRIMARY_COLOR).to_linear() * 0.1,
            alpha_mode: AlphaMode::Blend,
            cull_mode: Some(Face::Front),
            ..default()
        })),
        GlobeLayer,
    ));

    let links = spawn_links(commands, meshes, materials, &network.links);
    commands.insert_resource(GlobeScene {
        links,
        respawn: false,
    });
    info!("globe renderer initialized with {} links", network.links.len());
}

/// Advances the globe yaw each rendered frame.
pub fn rotate_globe(mut globes: Query<&mut Transform, With<GlobeMesh>>) {
    for mut transform in globes.iter_mut() {
        transform.rotate_y(ROTATION_STEP);
    }
}

/// Full teardown. Safe to run when nothing is live, and leaves the next
/// initialization a clean slate with exactly one render loop.
pub fn teardown(mut commands: Commands, layers: Query<Entity, With<GlobeLayer>>) {
    for entity in layers.iter() {
        commands.entity(entity).despawn();
    }
    commands.remove_resource::<GlobeScene>();
    commands.remove_resource::<TextureLoading>();
    commands.insert_resource(AmbientLight::default());
}
