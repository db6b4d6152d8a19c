use std::time::Duration;

use bevy::prelude::*;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::map::{DEFAULT_CENTER, DEFAULT_ZOOM, FOCUS_ZOOM, MapCamera, MarkerLabel};
use crate::types::{Coord, NetworkData, NetworkNode, normalize_longitude, zoom_to_scale};

pub const ROTATION_TICK_SECS: f32 = 0.05;
pub const ROTATION_STEP_DEG: f64 = 0.5;

/// View operations driven by the host's UI controls.
#[derive(Event, Debug, Clone)]
pub enum MapCommand {
    ToggleRotation(bool),
    Reset,
    ToggleLabels(bool),
    FocusNode { lat: f64, lng: f64, name: String },
}

/// What marker labels currently display. Markers start out numbered; the
/// label toggle switches between node names and nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    Index,
    Name,
    Hidden,
}

/// One marker in the spatial index, keyed by node position.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRef {
    pub index: usize,
    pub pos: Coord,
}

impl RTreeObject for MarkerRef {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.pos.long, self.pos.lat])
    }
}

impl PointDistance for MarkerRef {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.pos.long - point[0];
        let dy = self.pos.lat - point[1];
        dx * dx + dy * dy
    }
}

/// The auto-pan timer. Not a true rotation: each tick shifts the view center
/// longitude by a fixed step, wrapping the accumulator at 360.
#[derive(Debug, Default)]
pub struct RotationState {
    timer: Option<Timer>,
    pub degrees: f64,
}

impl RotationState {
    pub fn set(&mut self, enable: bool) {
        if enable {
            if self.timer.is_none() {
                self.timer = Some(Timer::from_seconds(
                    ROTATION_TICK_SECS,
                    TimerMode::Repeating,
                ));
            }
        } else {
            self.timer = None;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.timer.is_some()
    }

    /// Advances the timer and returns the longitude shift owed for `delta`.
    pub fn advance(&mut self, delta: Duration) -> f64 {
        let Some(timer) = self.timer.as_mut() else {
            return 0.0;
        };
        timer.tick(delta);
        let pan = ROTATION_STEP_DEG * timer.times_finished_this_tick() as f64;
        self.degrees = (self.degrees + pan) % 360.0;
        pan
    }
}

/// Per-initialization view state. Created once the backdrop is ready,
/// removed on teardown.
#[derive(Resource)]
pub struct MapViewState {
    pub markers: RTree<MarkerRef>,
    pub rotation: RotationState,
    pub open_panel: Option<usize>,
    pub labels: LabelMode,
    pub respawn: bool,
}

impl MapViewState {
    pub fn new(nodes: &[NetworkNode]) -> Self {
        MapViewState {
            markers: marker_index(nodes),
            rotation: RotationState::default(),
            open_panel: None,
            labels: LabelMode::Index,
            respawn: true,
        }
    }

    /// The marker whose stored position equals (lat, lng) exactly. No fuzzy
    /// matching: a near miss opens nothing.
    pub fn find_exact(&self, lat: f64, lng: f64) -> Option<usize> {
        self.markers
            .iter()
            .find(|marker| marker.pos.lat == lat && marker.pos.long == lng)
            .map(|marker| marker.index)
    }

    pub fn reset(&mut self) {
        self.rotation.set(false);
        self.open_panel = None;
    }
}

pub fn marker_index(nodes: &[NetworkNode]) -> RTree<MarkerRef> {
    RTree::bulk_load(
        nodes
            .iter()
            .enumerate()
            .map(|(index, node)| MarkerRef {
                index,
                pos: node.coord(),
            })
            .collect(),
    )
}

pub fn recenter(transform: &mut Transform, pos: Coord) {
    let world = pos.to_world();
    transform.translation.x = world.x;
    transform.translation.y = world.y;
}

pub fn set_zoom(projection: &mut Projection, level: u32) {
    if let Projection::Orthographic(ortho) = projection {
        ortho.scale = zoom_to_scale(level);
    }
}

pub fn handle_commands(
    mut events: EventReader<MapCommand>,
    mut state: ResMut<MapViewState>,
    network: Res<NetworkData>,
    mut camera: Query<(&mut Transform, &mut Projection), With<MapCamera>>,
    mut labels: Query<(&MarkerLabel, &mut Text2d, &mut Visibility)>,
) {
    for command in events.read() {
        match command {
            MapCommand::ToggleRotation(enable) => state.rotation.set(*enable),
            MapCommand::Reset => {
                state.reset();
                if let Ok((mut transform, mut projection)) = camera.single_mut() {
                    recenter(&mut transform, DEFAULT_CENTER);
                    set_zoom(&mut projection, DEFAULT_ZOOM);
                }
            }
            MapCommand::ToggleLabels(show) => {
                state.labels = if *show { LabelMode::Name } else { LabelMode::Hidden };
                for (label, mut text, mut visibility) in labels.iter_mut() {
                    if *show {
                        if let Some(node) = network.nodes.get(label.index) {
                            text.0 = node.name.clone();
                        }
                        *visibility = Visibility::Inherited;
                    } else {
                        *visibility = Visibility::Hidden;
                    }
                }
            }
            MapCommand::FocusNode { lat, lng, .. } => {
                if let Ok((mut transform, mut projection)) = camera.single_mut() {
                    recenter(&mut transform, Coord::new(*lat, *lng));
                    set_zoom(&mut projection, FOCUS_ZOOM);
                }
                if let Some(index) = state.find_exact(*lat, *lng) {
                    state.open_panel = Some(index);
                }
            }
        }
    }
}

pub fn tick_rotation(
    time: Res<Time>,
    mut state: ResMut<MapViewState>,
    mut camera: Query<&mut Transform, With<MapCamera>>,
) {
    let pan = state.rotation.advance(time.delta());
    if pan == 0.0 {
        return;
    }
    if let Ok(mut transform) = camera.single_mut() {
        transform.translation.x =
            normalize_longitude(transform.translation.x as f64 + pan) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::demo_network;

    fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn rotation_ticks_accumulate_and_wrap() {
        let mut rotation = RotationState::default();
        rotation.set(true);

        // 100 ms covers two 50 ms ticks.
        assert_eq!(rotation.advance(millis(100)), 1.0);
        assert_eq!(rotation.degrees, 1.0);

        // 40 s worth of ticks pushes the accumulator past 360.
        rotation.advance(millis(40_000));
        assert!((rotation.degrees - 41.0).abs() < 1e-9);
    }

    #[test]
    fn enabling_twice_does_not_restart_the_timer() {
        let mut rotation = RotationState::default();
        rotation.set(true);

        // Half a tick elapses, then a redundant enable.
        assert_eq!(rotation.advance(millis(30)), 0.0);
        rotation.set(true);
        // The earlier 30 ms still count; a fresh timer would not fire here.
        assert_eq!(rotation.advance(millis(30)), ROTATION_STEP_DEG);
    }

    #[test]
    fn disabling_is_idempotent() {
        let mut rotation = RotationState::default();
        rotation.set(false);
        assert!(!rotation.is_enabled());
        assert_eq!(rotation.advance(millis(500)), 0.0);

        rotation.set(true);
        rotation.set(false);
        rotation.set(false);
        assert!(!rotation.is_enabled());
    }

    #[test]
    fn focus_requires_an_exact_position_match() {
        let demo = demo_network();
        let state = MapViewState::new(&demo.nodes);

        assert_eq!(state.find_exact(35.0456, -85.3097), Some(0));
        assert_eq!(state.find_exact(42.3601, -71.0589), Some(4));
        // One ulp-ish off: nothing opens.
        assert_eq!(state.find_exact(35.0456001, -85.3097), None);
        assert_eq!(state.find_exact(0.0, 0.0), None);
    }

    #[test]
    fn reset_stops_rotation_and_closes_panels() {
        let demo = demo_network();
        let mut state = MapViewState::new(&demo.nodes);
        state.rotation.set(true);
        state.open_panel = Some(2);

        state.reset();
        assert!(!state.rotation.is_enabled());
        assert_eq!(state.open_panel, None);
    }

    #[test]
    fn marker_index_holds_every_node() {
        let demo = demo_network();
        let state = MapViewState::new(&demo.nodes);
        assert_eq!(state.markers.size(), demo.nodes.len());

        let nearest = state
            .markers
            .nearest_neighbor(&[-85.3, 35.0])
            .expect("markers present");
        assert_eq!(nearest.index, 0);
    }
}
