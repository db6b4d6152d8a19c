//! # Map Renderer
//!
//! 2D map backend: a flat world backdrop with one marker per network node,
//! dashed great-circle connection lines between a fixed set of node pairs,
//! and host-driven view operations.
//!
//! ## Lifecycle
//! - `OnEnter(RendererKind::Map)` spawns the camera and kicks off the world
//!   backdrop load on the async compute pool. Readiness is polled on a fixed
//!   cadence with a bounded attempt budget; exhausting the budget logs an
//!   error and aborts initialization.
//! - `OnExit(RendererKind::Map)` tears everything down (entities, rotation
//!   timer, in-flight load), so re-entering the state starts clean.
//!
//! ## Operations (via `MapCommand` events)
//! - `ToggleRotation`: 50 ms auto-pan timer, 0.5 degrees per tick, idempotent
//! - `Reset`: default center/zoom, rotation stopped, info panels closed
//! - `ToggleLabels`: marker labels switch between node names and hidden
//! - `FocusNode`: recenter/zoom plus exact-position info panel lookup
//!
//! ## Sub-modules
//! - `camera`: 2D camera + pan/zoom setup
//! - `backdrop`: async world-outline load, bounded polling, backdrop sprite
//! - `markers`: marker/label spawning and screen-fixed scaling
//! - `connections`: dashed geodesic connection lines
//! - `controls`: view state, rotation timer, command handling
//! - `ui`: info panels and the map toolbar

mod backdrop;
mod camera;
mod connections;
mod controls;
mod markers;
mod ui;

pub use backdrop::*;
pub use camera::*;
pub use connections::*;
pub use controls::*;
pub use markers::*;
pub use ui::*;

use bevy::prelude::*;
use bevy_egui::EguiPreUpdateSet;

use crate::RendererKind;
use crate::types::Coord;

pub const DEFAULT_CENTER: Coord = Coord::new(37.5, -95.0);
pub const DEFAULT_ZOOM: u32 = 4;
/// Zoom applied when a marker is clicked.
pub const MARKER_ZOOM: u32 = 6;
/// Zoom applied by the focus operation.
pub const FOCUS_ZOOM: u32 = 7;

/// Everything the map renderer spawns carries this, so teardown is one query.
#[derive(Component)]
pub struct MapLayer;

/// The map renderer's own camera.
#[derive(Component)]
pub struct MapCamera;

pub struct MapRendererPlugin;

impl Plugin for MapRendererPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MapCommand>()
            .add_systems(
                OnEnter(RendererKind::Map),
                (setup_map_camera, begin_backdrop_load),
            )
            .add_systems(OnExit(RendererKind::Map), teardown)
            .add_systems(
                Update,
                (
                    poll_backdrop.run_if(resource_exists::<BackdropLoading>),
                    cleanup_tasks,
                    handle_pancam,
                    (
                        respawn_markers,
                        scale_markers,
                        draw_connections,
                        handle_commands,
                        tick_rotation,
                        (map_toolbar, info_panel, node_list)
                            .after(EguiPreUpdateSet::InitContexts),
                    )
                        .run_if(resource_exists::<MapViewState>),
                )
                    .run_if(in_state(RendererKind::Map)),
            );
    }
}

fn teardown(mut commands: Commands, layers: Query<Entity, With<MapLayer>>) {
    for entity in layers.iter() {
        commands.entity(entity).despawn();
    }
    commands.remove_resource::<MapViewState>();
    commands.remove_resource::<BackdropLoading>();
}
