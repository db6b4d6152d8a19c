use bevy::prelude::*;
use bevy_egui::{
    EguiContexts,
    egui::{self, Color32, RichText},
};

use crate::map::{LabelMode, MapCamera, MapCommand, MapViewState};
use crate::types::NetworkData;

fn panel_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(Color32::from_rgba_premultiplied(30, 30, 30, 220))
        .corner_radius(10.0)
        .shadow(egui::epaint::Shadow {
            color: Color32::from_black_alpha(60),
            offset: [5, 5],
            blur: 10,
            spread: 5,
        })
}

fn toolbar_button(selected: bool, text: &str) -> egui::Button<'static> {
    let fill = if selected {
        Color32::from_rgb(70, 130, 180)
    } else {
        Color32::from_rgb(40, 40, 40)
    };
    egui::Button::new(RichText::new(text.to_owned()).color(Color32::WHITE))
        .fill(fill)
        .corner_radius(8.0)
}

/// Bottom-center toolbar with the host-driven view toggles.
pub fn map_toolbar(
    mut contexts: EguiContexts,
    state: Res<MapViewState>,
    mut events: EventWriter<MapCommand>,
) {
    let ctx = contexts.ctx_mut();

    let toolbar_width = 225.0;
    let toolbar_height = 40.0;

    let screen_rect = ctx.screen_rect();
    let toolbar_pos = egui::pos2(
        (screen_rect.width() - toolbar_width) / 2.0,
        screen_rect.height() - toolbar_height - 10.0,
    );

    egui::Area::new("map_toolbar".into())
        .fixed_pos(toolbar_pos)
        .show(ctx, |ui| {
            panel_frame().show(ui, |ui| {
                ui.set_width(toolbar_width);
                ui.set_height(toolbar_height);

                ui.horizontal_centered(|ui| {
                    ui.spacing_mut().item_spacing = egui::vec2(8.0, 0.0);
                    ui.add(egui::Label::new(""));

                    let rotating = state.rotation.is_enabled();
                    if ui
                        .add_sized([64.0, 30.0], toolbar_button(rotating, "Rotate"))
                        .clicked()
                    {
                        events.write(MapCommand::ToggleRotation(!rotating));
                    }
                    let named = state.labels == LabelMode::Name;
                    if ui
                        .add_sized([64.0, 30.0], toolbar_button(named, "Labels"))
                        .clicked()
                    {
                        events.write(MapCommand::ToggleLabels(!named));
                    }
                    if ui
                        .add_sized([64.0, 30.0], toolbar_button(false, "Reset"))
                        .clicked()
                    {
                        events.write(MapCommand::Reset);
                    }
                });
            });
        });
}

/// The open node's details, anchored next to its marker.
pub fn info_panel(
    mut contexts: EguiContexts,
    mut state: ResMut<MapViewState>,
    network: Res<NetworkData>,
    camera: Query<(&Camera, &GlobalTransform), With<MapCamera>>,
) {
    let Some(index) = state.open_panel else {
        return;
    };
    let Some(node) = network.nodes.get(index) else {
        state.open_panel = None;
        return;
    };
    let Ok((camera, camera_transform)) = camera.single() else {
        return;
    };

    let world = node.coord().to_world();
    let Ok(screen) = camera.world_to_viewport(camera_transform, world.extend(0.0)) else {
        return;
    };

    let ctx = contexts.ctx_mut();
    egui::Area::new("node_info".into())
        .fixed_pos(egui::pos2(screen.x + 18.0, screen.y - 18.0))
        .show(ctx, |ui| {
            panel_frame().show(ui, |ui| {
                ui.set_min_width(170.0);
                ui.spacing_mut().item_spacing = egui::vec2(6.0, 4.0);

                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(&node.name)
                            .color(Color32::from_rgb(221, 221, 221))
                            .strong(),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("x").clicked() {
                            state.open_panel = None;
                        }
                    });
                });
                ui.label(format!("Status: {}", node.status));
                ui.label(format!("Capacity: {} Gbps", node.capacity));
                ui.label(
                    RichText::new(format!(
                        "Lat: {:.4}, Lng: {:.4}",
                        node.latitude, node.longitude
                    ))
                    .color(Color32::from_rgb(135, 135, 135))
                    .size(11.0),
                );
            });
        });
}

/// Right-hand node list; clicking an entry drives the focus operation.
pub fn node_list(
    mut contexts: EguiContexts,
    network: Res<NetworkData>,
    mut events: EventWriter<MapCommand>,
) {
    let ctx = contexts.ctx_mut();

    let listbox_width = 200.0;
    let screen_rect = ctx.screen_rect();
    let listbox_pos = egui::pos2(screen_rect.width() - 210.0, 10.0);

    egui::Area::new("node_list".into())
        .fixed_pos(listbox_pos)
        .show(ctx, |ui| {
            panel_frame().show(ui, |ui| {
                ui.set_min_width(listbox_width);
                ui.set_max_width(listbox_width);
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.set_max_width(listbox_width - 10.0);
                        for node in network.nodes.iter() {
                            if ui
                                .button(RichText::new(node.name.clone()).color(Color32::WHITE))
                                .clicked()
                            {
                                events.write(MapCommand::FocusNode {
                                    lat: node.latitude,
                                    lng: node.longitude,
                                    name: node.name.clone(),
                                });
                            }
                        }
                    });
                });
            });
        });
}
