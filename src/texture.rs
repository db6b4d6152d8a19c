use std::{fs::File, io::BufReader};

use bevy::{
    asset::RenderAssetUsages,
    prelude::Image,
    render::render_resource::{Extent3d, TextureDimension, TextureFormat},
};
use geojson::GeoJson;
use image::{Rgba, RgbaImage};

use crate::types::Coord;

pub const TEXTURE_WIDTH: u32 = 2048;
pub const TEXTURE_HEIGHT: u32 = 1024;

const OCEAN: [u8; 4] = [26, 58, 82, 255];
const LAND: [u8; 4] = [45, 80, 22, 255];
const GLOW: [u8; 4] = [102, 126, 234, 204];

/// Parses the bundled world outline into simplified landmass polygons.
/// Geometry follows the geojson convention, x = longitude, y = latitude.
pub fn load_world_outline(path: &str) -> Result<Vec<geo::Polygon<f64>>, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let geojson = GeoJson::from_reader(reader)?;

    let mut polygons = Vec::new();
    if let GeoJson::FeatureCollection(collection) = geojson {
        for feature in collection.features {
            if let Some(geometry) = feature.geometry {
                match geometry.value {
                    geojson::Value::Polygon(poly) => {
                        if let Some(ring) = poly.into_iter().next() {
                            polygons.push(ring_to_polygon(ring));
                        }
                    }
                    geojson::Value::MultiPolygon(multi_poly) => {
                        for poly in multi_poly {
                            if let Some(ring) = poly.into_iter().next() {
                                polygons.push(ring_to_polygon(ring));
                            }
                        }
                    }
                    _ => continue,
                }
            }
        }
    }

    Ok(polygons)
}

fn ring_to_polygon(ring: Vec<Vec<f64>>) -> geo::Polygon<f64> {
    geo::Polygon::new(
        geo::LineString(
            ring.into_iter()
                .map(|p| geo::Coord { x: p[0], y: p[1] })
                .collect(),
        ),
        vec![],
    )
}

/// Paints the equirectangular earth texture: deep ocean fill, scanline-filled
/// landmasses, and a baked glow dot per supplied point. Both renderers use
/// this; the map backdrop passes no glow points.
pub fn build_earth_texture(
    landmasses: &[geo::Polygon<f64>],
    glow_points: &[(Coord, f64)],
    width: u32,
    height: u32,
) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, Rgba(OCEAN));

    for polygon in landmasses {
        fill_polygon(&mut img, polygon);
    }

    for &(coord, radius) in glow_points {
        bake_glow(&mut img, coord, radius);
    }

    img
}

/// Even-odd scanline fill of a polygon's exterior ring.
fn fill_polygon(img: &mut RgbaImage, polygon: &geo::Polygon<f64>) {
    let (width, height) = (img.width(), img.height());
    let ring = &polygon.exterior().0;
    if ring.len() < 3 {
        return;
    }

    for y in 0..height {
        let lat = 90.0 - (y as f64 + 0.5) * 180.0 / height as f64;

        let mut crossings = Vec::new();
        for edge in ring.windows(2) {
            let (a, b) = (edge[0], edge[1]);
            if (a.y > lat) != (b.y > lat) {
                crossings.push(a.x + (lat - a.y) / (b.y - a.y) * (b.x - a.x));
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap());

        for pair in crossings.chunks_exact(2) {
            let x0 = ((pair[0] + 180.0) / 360.0 * width as f64).floor().max(0.0) as u32;
            let x1 = ((pair[1] + 180.0) / 360.0 * width as f64).ceil() as u32;
            for x in x0..x1.min(width) {
                img.put_pixel(x, y, Rgba(LAND));
            }
        }
    }
}

/// Blends a radially falling-off glow dot into the texture. Solid inside
/// `radius`, fading out to twice that.
fn bake_glow(img: &mut RgbaImage, coord: Coord, radius: f64) {
    let (width, height) = (img.width(), img.height());
    let (u, v) = coord.to_uv();
    let cx = u * width as f64;
    let cy = v * height as f64;
    let reach = (radius * 2.0).ceil() as i64;

    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let x = cx as i64 + dx;
            let y = cy as i64 + dy;
            if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                continue;
            }

            let dist = ((dx * dx + dy * dy) as f64).sqrt();
            if dist > radius * 2.0 {
                continue;
            }
            let falloff = if dist <= radius {
                1.0
            } else {
                1.0 - (dist - radius) / radius
            };
            let alpha = GLOW[3] as f64 / 255.0 * falloff;

            let pixel = img.get_pixel_mut(x as u32, y as u32);
            for channel in 0..3 {
                let blended =
                    GLOW[channel] as f64 * alpha + pixel.0[channel] as f64 * (1.0 - alpha);
                pixel.0[channel] = blended.round() as u8;
            }
        }
    }
}

/// Hands the finished raster to Bevy.
pub fn into_bevy_image(img: RgbaImage) -> Image {
    let (width, height) = (img.width(), img.height());
    Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        img.into_raw(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_landmass() -> geo::Polygon<f64> {
        geo::Polygon::new(
            geo::LineString(vec![
                geo::Coord { x: -60.0, y: 30.0 },
                geo::Coord { x: 60.0, y: 30.0 },
                geo::Coord { x: 60.0, y: -30.0 },
                geo::Coord { x: -60.0, y: -30.0 },
                geo::Coord { x: -60.0, y: 30.0 },
            ]),
            vec![],
        )
    }

    #[test]
    fn land_inside_ocean_outside() {
        let img = build_earth_texture(&[square_landmass()], &[], 256, 128);

        // (lat 0, lng 0) sits inside the square, the mid-Pacific does not.
        assert_eq!(img.get_pixel(128, 64).0, LAND);
        assert_eq!(img.get_pixel(235, 64).0, OCEAN);
        // Poles are ocean.
        assert_eq!(img.get_pixel(128, 0).0, OCEAN);
    }

    #[test]
    fn glow_dot_brightens_its_pixel() {
        let coord = Coord::new(0.0, 150.0);
        let plain = build_earth_texture(&[], &[], 256, 128);
        let glowing = build_earth_texture(&[], &[(coord, 4.0)], 256, 128);

        let (u, v) = coord.to_uv();
        let (x, y) = ((u * 256.0) as u32, (v * 128.0) as u32);
        assert_ne!(glowing.get_pixel(x, y).0, plain.get_pixel(x, y).0);
        // Far corner untouched.
        assert_eq!(glowing.get_pixel(2, 2).0, OCEAN);
    }

    #[test]
    fn degenerate_rings_are_ignored() {
        let line = geo::Polygon::new(
            geo::LineString(vec![
                geo::Coord { x: 0.0, y: 0.0 },
                geo::Coord { x: 10.0, y: 10.0 },
            ]),
            vec![],
        );
        let img = build_earth_texture(&[line], &[], 64, 32);
        assert!(img.pixels().all(|p| p.0 == OCEAN));
    }

    #[test]
    fn missing_outline_file_errors() {
        assert!(load_world_outline("does/not/exist.geojson").is_err());
    }

    #[test]
    fn bundled_world_outline_rasterizes() {
        let landmasses = load_world_outline("assets/world.geojson").unwrap();
        assert!(landmasses.len() >= 6);

        let img = build_earth_texture(&landmasses, &[], 512, 256);
        // Kansas is land, the mid-Pacific is not.
        let (u, v) = Coord::new(39.0, -98.0).to_uv();
        assert_eq!(img.get_pixel((u * 512.0) as u32, (v * 256.0) as u32).0, LAND);
        let (u, v) = Coord::new(0.0, -150.0).to_uv();
        assert_eq!(img.get_pixel((u * 512.0) as u32, (v * 256.0) as u32).0, OCEAN);
    }
}
