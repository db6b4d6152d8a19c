use bevy::{
    color::palettes::css::GOLD,
    diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin},
    prelude::*,
};

/// FPS and entity-count readout, debug builds only.
pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        if cfg!(debug_assertions) {
            app.add_plugins(FrameTimeDiagnosticsPlugin::default())
                .add_systems(Startup, spawn_perf_overlay)
                .add_systems(Update, update_perf_overlay);
        }
    }
}

#[derive(Component)]
struct PerfReadout;

fn spawn_perf_overlay(mut commands: Commands) {
    commands
        .spawn((
            Text::new("fps / entities: "),
            TextFont {
                font_size: 18.0,
                ..default()
            },
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(5.0),
                right: Val::Px(5.0),
                ..default()
            },
        ))
        .with_child((
            TextSpan::default(),
            TextFont {
                font_size: 18.0,
                ..default()
            },
            TextColor(GOLD.into()),
            PerfReadout,
        ));
}

fn update_perf_overlay(
    diagnostics: Res<DiagnosticsStore>,
    entities: Query<Entity>,
    mut readout: Query<&mut TextSpan, With<PerfReadout>>,
) {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
        .unwrap_or(0.0);
    let entity_count = entities.iter().count();

    for mut span in &mut readout {
        **span = format!("{fps:.1} / {entity_count}");
    }
}
