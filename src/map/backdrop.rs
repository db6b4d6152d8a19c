use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy::window::PrimaryWindow;
use bevy_tasks::futures_lite::future;
use crossbeam_channel::{Receiver, TryRecvError, bounded};
use image::RgbaImage;

use crate::map::{MapCommand, MapLayer, MapViewState};
use crate::settings::ViewerSettings;
use crate::texture::{TEXTURE_HEIGHT, TEXTURE_WIDTH, build_earth_texture, into_bevy_image, load_world_outline};
use crate::WORLD_OUTLINE_PATH;
use crate::types::NetworkData;

/// How many polls the map renderer is willing to wait for its backdrop.
pub const MAX_LOAD_ATTEMPTS: u32 = 50;
const POLL_INTERVAL_SECS: f32 = 0.1;

/// World extent of the backdrop sprite, one unit per degree.
const BACKDROP_SIZE: Vec2 = Vec2::new(360.0, 180.0);

#[derive(Resource)]
pub struct BackdropLoading {
    rx: Receiver<Result<RgbaImage, String>>,
    timer: Timer,
    attempts: u32,
}

#[derive(Component)]
pub struct TaskComponent(pub Task<()>);

/// Starts rendering the world backdrop off-thread. The polling system picks
/// the result up; if the primary window is gone there is nothing to draw
/// into and initialization stops here.
pub fn begin_backdrop_load(
    mut commands: Commands,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    if windows.is_empty() {
        error!("map surface not found, skipping map initialization");
        return;
    }

    let task_pool = AsyncComputeTaskPool::get();
    let (tx, rx) = bounded(1);
    let task = task_pool.spawn(async move {
        let result = load_world_outline(WORLD_OUTLINE_PATH)
            .map(|landmasses| {
                build_earth_texture(&landmasses, &[], TEXTURE_WIDTH, TEXTURE_HEIGHT)
            })
            .map_err(|err| err.to_string());
        let _ = tx.send(result);
    });
    // Dropping the task on teardown cancels an in-flight load.
    commands.spawn((TaskComponent(task), MapLayer));

    commands.insert_resource(BackdropLoading {
        rx,
        timer: Timer::from_seconds(POLL_INTERVAL_SECS, TimerMode::Repeating),
        attempts: 0,
    });
}

pub fn cleanup_tasks(mut commands: Commands, mut tasks: Query<(Entity, &mut TaskComponent)>) {
    for (entity, mut task) in tasks.iter_mut() {
        if future::block_on(future::poll_once(&mut task.0)).is_some() {
            commands.entity(entity).despawn();
        }
    }
}

/// Bounded-attempt readiness poll. Each 100 ms tick checks the channel once;
/// running out of attempts is an explicit failure and the map stays empty.
pub fn poll_backdrop(
    mut commands: Commands,
    time: Res<Time>,
    mut loading: ResMut<BackdropLoading>,
    mut images: ResMut<Assets<Image>>,
    network: Res<NetworkData>,
    settings: Res<ViewerSettings>,
    mut events: EventWriter<MapCommand>,
) {
    loading.timer.tick(time.delta());
    for _ in 0..loading.timer.times_finished_this_tick() {
        match loading.rx.try_recv() {
            Ok(Ok(img)) => {
                let handle = images.add(into_bevy_image(img));
                commands.spawn((
                    Sprite {
                        image: handle,
                        custom_size: Some(BACKDROP_SIZE),
                        ..default()
                    },
                    Transform::from_xyz(0.0, 0.0, 0.0),
                    MapLayer,
                ));
                commands.insert_resource(MapViewState::new(&network.nodes));
                if settings.show_labels {
                    events.write(MapCommand::ToggleLabels(true));
                }
                if settings.auto_rotate {
                    events.write(MapCommand::ToggleRotation(true));
                }
                commands.remove_resource::<BackdropLoading>();
                info!(
                    "map renderer initialized with {} markers",
                    network.nodes.len()
                );
                return;
            }
            Ok(Err(err)) => {
                error!("world backdrop failed to load: {err}");
                commands.remove_resource::<BackdropLoading>();
                return;
            }
            Err(TryRecvError::Empty) => {
                loading.attempts += 1;
                if loading.attempts >= MAX_LOAD_ATTEMPTS {
                    error!(
                        "world backdrop not ready after {MAX_LOAD_ATTEMPTS} attempts, giving up"
                    );
                    commands.remove_resource::<BackdropLoading>();
                    return;
                }
            }
            Err(TryRecvError::Disconnected) => {
                error!("world backdrop loader went away");
                commands.remove_resource::<BackdropLoading>();
                return;
            }
        }
    }
}
