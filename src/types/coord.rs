use bevy::math::{DVec3, Vec2};
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, Copy)]
pub struct Coord {
    pub lat: f64,
    #[serde(rename = "lng")]
    pub long: f64,
}

impl Coord {
    pub const fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }

    /// Projects onto the unit sphere. Colatitude is measured from the north
    /// pole, azimuth carries the 180 degree longitude offset so that the
    /// equirectangular texture seam lands on the antimeridian.
    pub fn to_unit_sphere(&self) -> DVec3 {
        let phi = (90.0 - self.lat).to_radians();
        let theta = (self.long + 180.0).to_radians();

        DVec3 {
            x: phi.sin() * theta.cos(),
            y: phi.cos(),
            z: phi.sin() * theta.sin(),
        }
    }

    /// Position on the flat map plane, one world unit per degree.
    pub fn to_world(&self) -> Vec2 {
        Vec2::new(self.long as f32, self.lat as f32)
    }

    /// Texture coordinates in an equirectangular image, (0,0) top-left.
    pub fn to_uv(&self) -> (f64, f64) {
        ((self.long + 180.0) / 360.0, (90.0 - self.lat) / 180.0)
    }

    pub fn distance_km(&self, other: &Coord) -> f64 {
        Haversine.distance(
            Point::new(self.long, self.lat),
            Point::new(other.long, other.lat),
        ) / 1000.0
    }
}

pub fn world_to_coord(pos: Vec2) -> Coord {
    Coord::new(pos.y as f64, normalize_longitude(pos.x as f64))
}

/// Orthographic camera scale for a slippy-map style zoom level, in world
/// units (degrees) per screen pixel.
pub fn zoom_to_scale(level: u32) -> f32 {
    360.0 / (256.0 * 2_i32.pow(level) as f32)
}

pub fn normalize_longitude(lon: f64) -> f64 {
    let mut lon = lon;
    while lon > 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_vec3_close(actual: DVec3, expected: DVec3) {
        assert!(
            (actual - expected).length() < EPS,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn sphere_projection_axis_cases() {
        // Equator at the prime meridian faces negative x under the
        // 180 degree azimuth offset.
        assert_vec3_close(
            Coord::new(0.0, 0.0).to_unit_sphere(),
            DVec3::new(-1.0, 0.0, 0.0),
        );
        assert_vec3_close(
            Coord::new(90.0, 0.0).to_unit_sphere(),
            DVec3::new(0.0, 1.0, 0.0),
        );
        assert_vec3_close(
            Coord::new(-90.0, 0.0).to_unit_sphere(),
            DVec3::new(0.0, -1.0, 0.0),
        );
        assert_vec3_close(
            Coord::new(0.0, 90.0).to_unit_sphere(),
            DVec3::new(0.0, 0.0, -1.0),
        );
    }

    #[test]
    fn sphere_projection_is_unit_length() {
        for &(lat, long) in &[(35.0456, -85.3097), (42.3601, -71.0589), (-33.9, 151.2)] {
            let p = Coord::new(lat, long).to_unit_sphere();
            assert!((p.length() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn uv_mapping_spans_texture() {
        assert_eq!(Coord::new(0.0, 0.0).to_uv(), (0.5, 0.5));
        assert_eq!(Coord::new(90.0, -180.0).to_uv(), (0.0, 0.0));
        assert_eq!(Coord::new(-90.0, 180.0).to_uv(), (1.0, 1.0));
    }

    #[test]
    fn longitude_wraps_into_range() {
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(540.0), 180.0);
        assert_eq!(normalize_longitude(45.0), 45.0);
    }

    #[test]
    fn zoom_scale_halves_per_level() {
        assert!((zoom_to_scale(4) - 360.0 / 4096.0).abs() < 1e-6);
        assert!((zoom_to_scale(5) - zoom_to_scale(4) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn haversine_distance_sanity() {
        // Chattanooga to Atlanta is roughly 170 km.
        let d = Coord::new(35.0456, -85.3097).distance_km(&Coord::new(33.749, -84.388));
        assert!((100.0..250.0).contains(&d), "got {d}");
    }
}
