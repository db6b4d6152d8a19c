use bevy::prelude::*;
use geo::{Haversine, InterpolatePoint, Point};

use crate::types::{Coord, LINK_PRIMARY_COLOR, NetworkData, valid_connections};

const LINE_ALPHA: f32 = 0.6;
/// Geodesic sample spacing, km of arc per sample.
const KM_PER_SAMPLE: f64 = 50.0;

/// Points along the great circle from `a` to `b`, endpoints included.
pub fn geodesic_points(a: Coord, b: Coord, samples: usize) -> Vec<Coord> {
    let start = Point::new(a.long, a.lat);
    let end = Point::new(b.long, b.lat);
    (0..=samples)
        .map(|i| {
            let p = Haversine.point_at_ratio_between(start, end, i as f64 / samples as f64);
            Coord::new(p.y(), p.x())
        })
        .collect()
}

pub fn sample_count(a: Coord, b: Coord) -> usize {
    (a.distance_km(&b) / KM_PER_SAMPLE).ceil().clamp(8.0, 128.0) as usize
}

/// Every other geodesic segment, which is what makes the line dashed.
/// Segments jumping across the antimeridian are dropped instead of smearing
/// across the whole map.
pub fn dash_segments(points: &[Coord]) -> Vec<(Vec2, Vec2)> {
    points
        .windows(2)
        .step_by(2)
        .filter(|pair| (pair[0].long - pair[1].long).abs() < 180.0)
        .map(|pair| (pair[0].to_world(), pair[1].to_world()))
        .collect()
}

pub fn draw_connections(mut gizmos: Gizmos, network: Res<NetworkData>) {
    let color = Color::from(LINK_PRIMARY_COLOR.with_alpha(LINE_ALPHA));

    for (from, to) in valid_connections(&network.nodes) {
        let a = network.nodes[from].coord();
        let b = network.nodes[to].coord();
        for (start, end) in dash_segments(&geodesic_points(a, b, sample_count(a, b))) {
            gizmos.line_2d(start, end, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHATTANOOGA: Coord = Coord::new(35.0456, -85.3097);
    const BOSTON: Coord = Coord::new(42.3601, -71.0589);

    #[test]
    fn geodesic_hits_both_endpoints() {
        let points = geodesic_points(CHATTANOOGA, BOSTON, 16);
        assert_eq!(points.len(), 17);
        assert!((points[0].lat - CHATTANOOGA.lat).abs() < 1e-6);
        assert!((points[0].long - CHATTANOOGA.long).abs() < 1e-6);
        assert!((points[16].lat - BOSTON.lat).abs() < 1e-6);
        assert!((points[16].long - BOSTON.long).abs() < 1e-6);
    }

    #[test]
    fn geodesic_midpoint_bows_poleward() {
        // Great circles between mid-latitude points arc toward the pole
        // relative to the straight latitude interpolation.
        let points = geodesic_points(CHATTANOOGA, BOSTON, 2);
        let straight_lat = (CHATTANOOGA.lat + BOSTON.lat) / 2.0;
        assert!(points[1].lat > straight_lat);
    }

    #[test]
    fn dashes_skip_alternate_segments() {
        let points = geodesic_points(CHATTANOOGA, BOSTON, 16);
        // 16 segments, every other one drawn.
        assert_eq!(dash_segments(&points).len(), 8);
    }

    #[test]
    fn antimeridian_jumps_are_dropped() {
        let points = vec![
            Coord::new(0.0, 179.0),
            Coord::new(0.0, -179.5),
            Coord::new(0.0, -178.5),
            Coord::new(0.0, -177.0),
        ];
        // The (179, -179.5) pair is a 358.5 degree jump on the flat map.
        let segments = dash_segments(&points);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].0.x, -178.5);
    }

    #[test]
    fn longer_spans_get_more_samples() {
        let close = sample_count(CHATTANOOGA, Coord::new(36.0104, -84.2696));
        let far = sample_count(CHATTANOOGA, BOSTON);
        assert!(far > close);
        assert!((8..=128).contains(&close));
        assert!((8..=128).contains(&far));
    }
}
