use bevy::{
    prelude::*,
    winit::{UpdateMode, WinitSettings},
};
use bevy_egui::EguiPlugin;
use serde::{Deserialize, Serialize};

use debug::DebugPlugin;
use globe::GlobeRendererPlugin;
use interaction::InteractionSystemPlugin;
use map::MapRendererPlugin;
use settings::SettingsPlugin;

pub mod debug;
pub mod globe;
pub mod interaction;
pub mod map;
pub mod settings;
pub mod texture;
pub mod types;

pub const NETWORK_DATA_PATH: &str = "assets/network.json";
pub const WORLD_OUTLINE_PATH: &str = "assets/world.geojson";

/// The two swappable rendering backends. Entering a state initializes that
/// renderer, leaving it disposes it.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    #[default]
    Map,
    Globe,
}

fn main() {
    let settings = settings::load_or_default();
    let network = types::load_network(NETWORK_DATA_PATH).unwrap_or_else(|err| {
        eprintln!("network dataset unavailable ({err}), using the demo set");
        types::demo_network()
    });

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Globe Viewer".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .add_plugins(DebugPlugin)
        .add_plugins(EguiPlugin {
            enable_multipass_for_primary_context: false,
        })
        .insert_resource(EguiBlockInputState::default())
        .insert_resource(network)
        .insert_state(settings.renderer)
        .insert_resource(settings)
        .insert_resource(WinitSettings {
            unfocused_mode: UpdateMode::Reactive {
                wait: std::time::Duration::from_secs(1),
                react_to_device_events: true,
                react_to_user_events: true,
                react_to_window_events: true,
            },
            ..Default::default()
        })
        .insert_resource(ClearColor(Color::from(Srgba {
            red: 0.102,
            green: 0.102,
            blue: 0.18,
            alpha: 1.0,
        })))
        .add_plugins((
            MapRendererPlugin,
            GlobeRendererPlugin,
            InteractionSystemPlugin,
            SettingsPlugin,
        ))
        .add_systems(Update, absorb_egui_inputs)
        .run();
}

#[derive(Resource, Default)]
pub struct EguiBlockInputState {
    pub block_input: bool,
}

fn absorb_egui_inputs(
    mut contexts: bevy_egui::EguiContexts,
    mut state: ResMut<EguiBlockInputState>,
) {
    let ctx = contexts.ctx_mut();
    state.block_input = ctx.wants_pointer_input() || ctx.is_pointer_over_area();
}
