//! 3D globe backend: a textured sphere with glowing link markers and a
//! continuous render loop, torn down wholesale on state exit.

mod links;
mod scene;

pub use links::*;
pub use scene::*;

use bevy::prelude::*;

use crate::RendererKind;

/// Globe yaw advance per rendered frame, radians.
pub const ROTATION_STEP: f32 = 0.0005;
/// Flow phase advance per rendered frame.
pub const FLOW_STEP: f32 = 0.01;
/// How long the texture task may take before initialization gives up on it.
pub const TEXTURE_DEADLINE_SECS: f32 = 5.0;

#[derive(Component)]
pub struct GlobeLayer;

pub struct GlobeRendererPlugin;

impl Plugin for GlobeRendererPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(RendererKind::Globe), begin_globe_init)
            .add_systems(OnExit(RendererKind::Globe), teardown)
            .add_systems(
                Update,
                (
                    poll_texture.run_if(resource_exists::<TextureLoading>),
                    (rotate_globe, animate_links, respawn_links)
                        .run_if(resource_exists::<GlobeScene>),
                )
                    .run_if(in_state(RendererKind::Globe)),
            );
    }
}
