use std::{fs::File, io::BufReader, path::PathBuf};

use bevy::prelude::*;
use bevy_egui::{
    EguiContexts, EguiPreUpdateSet,
    egui::{self, Color32, RichText},
};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::RendererKind;

/// Host-side configuration: which backend comes up, and the initial state of
/// the map view toggles. Read once at startup; absent or malformed files
/// fall back to defaults.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerSettings {
    pub renderer: RendererKind,
    pub show_labels: bool,
    pub auto_rotate: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        ViewerSettings {
            renderer: RendererKind::Map,
            show_labels: false,
            auto_rotate: false,
        }
    }
}

fn settings_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dirs = ProjectDirs::from("", "", "globe-viewer").ok_or("no home directory")?;
    Ok(dirs.config_dir().join("settings.json"))
}

pub fn load_settings() -> Result<ViewerSettings, Box<dyn std::error::Error>> {
    let file = File::open(settings_path()?)?;
    let reader = BufReader::new(file);
    let settings = serde_json::from_reader(reader)?;
    Ok(settings)
}

pub fn load_or_default() -> ViewerSettings {
    match load_settings() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("settings unavailable ({err}), using defaults");
            ViewerSettings::default()
        }
    }
}

pub struct SettingsPlugin;

impl Plugin for SettingsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            renderer_switch_ui.after(EguiPreUpdateSet::InitContexts),
        );
    }
}

/// Top-left backend switcher. Picking the other backend disposes the live
/// renderer and initializes the new one through the state transition.
fn renderer_switch_ui(
    mut contexts: EguiContexts,
    current: Res<State<RendererKind>>,
    mut next: ResMut<NextState<RendererKind>>,
) {
    let ctx = contexts.ctx_mut();

    egui::Area::new("renderer_switch".into())
        .fixed_pos(egui::pos2(10.0, 10.0))
        .show(ctx, |ui| {
            egui::Frame::new()
                .fill(Color32::from_rgba_premultiplied(30, 30, 30, 220))
                .corner_radius(10.0)
                .shadow(egui::epaint::Shadow {
                    color: Color32::from_black_alpha(60),
                    offset: [5, 5],
                    blur: 10,
                    spread: 5,
                })
                .show(ui, |ui| {
                    ui.spacing_mut().item_spacing = egui::vec2(8.0, 6.0);
                    ui.label(
                        RichText::new("View")
                            .color(Color32::from_rgb(221, 221, 221))
                            .strong(),
                    );
                    for (kind, name) in [(RendererKind::Map, "Map"), (RendererKind::Globe, "Globe")]
                    {
                        if ui.radio(*current.get() == kind, name).clicked()
                            && *current.get() != kind
                        {
                            next.set(kind);
                        }
                    }
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_parse_with_partial_fields() {
        let settings: ViewerSettings = serde_json::from_str(r#"{ "renderer": "globe" }"#).unwrap();
        assert_eq!(settings.renderer, RendererKind::Globe);
        assert!(!settings.show_labels);
        assert!(!settings.auto_rotate);
    }

    #[test]
    fn defaults_start_on_the_map() {
        let settings = ViewerSettings::default();
        assert_eq!(settings.renderer, RendererKind::Map);
    }

    #[test]
    fn unknown_renderer_is_an_error() {
        assert!(serde_json::from_str::<ViewerSettings>(r#"{ "renderer": "teapot" }"#).is_err());
    }
}
