//! Where the sphere's surface image comes from.

use std::path::Path;

use selene_render::DecodedImage;
use tracing::info;

use crate::error::AppError;

/// Width of the built-in moon texture. Height is half of it.
pub const MOON_TEXTURE_WIDTH: u32 = 1024;

/// Decode a PNG or JPEG into RGBA8.
pub fn load_texture(path: &Path) -> Result<DecodedImage, AppError> {
    let decoded = image::open(path).map_err(|source| AppError::Texture {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    info!("Loaded texture {} ({width}x{height})", path.display());
    Ok(DecodedImage::rgba8(width, height, rgba.into_raw()))
}

/// Configured texture if a path is given, otherwise the procedural moon.
pub fn texture_or_default(path: Option<&Path>) -> Result<DecodedImage, AppError> {
    match path {
        Some(path) => load_texture(path),
        None => {
            info!("No texture configured, using the procedural moon");
            Ok(procedural_moon(MOON_TEXTURE_WIDTH))
        }
    }
}

struct Crater {
    x: f32,
    y: f32,
    radius: f32,
    depth: f32,
}

/// Small xorshift generator so the moon looks the same on every run.
struct Xorshift(u32);

impl Xorshift {
    fn next_unit(&mut self) -> f32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        (x >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// Equirectangular grey moon with shaded craters, `width` x `width / 2`.
///
/// Craters wrap around horizontally so the seam at u = 0 is invisible.
pub fn procedural_moon(width: u32) -> DecodedImage {
    let width = width.max(2);
    let height = width / 2;
    let mut rng = Xorshift(0x5e1e_e5ed);

    let craters: Vec<Crater> = (0..96)
        .map(|_| Crater {
            x: rng.next_unit() * width as f32,
            y: rng.next_unit() * height as f32,
            radius: (0.01 + 0.05 * rng.next_unit().powi(3)) * width as f32,
            depth: 0.15 + 0.25 * rng.next_unit(),
        })
        .collect();

    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        // Darker maria band across the middle latitudes.
        let latitude = (y as f32 + 0.5) / height as f32;
        let base = 0.62 - 0.08 * (1.0 - (latitude * 2.0 - 1.0).abs()).powi(2);

        for x in 0..width {
            let mut shade = base;
            for crater in &craters {
                let mut dx = (x as f32 + 0.5 - crater.x).abs();
                dx = dx.min(width as f32 - dx);
                let dy = y as f32 + 0.5 - crater.y;
                let d = (dx * dx + dy * dy).sqrt() / crater.radius;
                if d < 1.0 {
                    shade -= crater.depth * (1.0 - d * d) * 0.5;
                } else if d < 1.2 {
                    // Raised rim.
                    shade += crater.depth * 0.25 * (1.0 - (d - 1.1).abs() * 10.0).max(0.0);
                }
            }
            let v = (shade.clamp(0.0, 1.0) * 255.0).round() as u8;
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }

    DecodedImage::rgba8(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedural_moon_dimensions() {
        let moon = procedural_moon(256);
        assert_eq!((moon.width, moon.height), (256, 128));
        assert_eq!(moon.pixels.len(), moon.expected_len());
    }

    #[test]
    fn test_procedural_moon_is_opaque_grey() {
        let moon = procedural_moon(128);
        for px in moon.pixels.chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn test_procedural_moon_is_deterministic_and_varied() {
        let a = procedural_moon(128);
        let b = procedural_moon(128);
        assert_eq!(a, b);

        let min = a.pixels.chunks_exact(4).map(|p| p[0]).min().unwrap();
        let max = a.pixels.chunks_exact(4).map(|p| p[0]).max().unwrap();
        assert!(max - min > 25, "moon has no visible craters");
    }

    #[test]
    fn test_missing_texture_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.png");
        let err = load_texture(&missing).unwrap_err();
        assert!(matches!(err, AppError::Texture { ref path, .. } if *path == missing));
    }

    #[test]
    fn test_png_is_decoded_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        let img = image::RgbImage::from_fn(4, 2, |x, _| image::Rgb([x as u8 * 60, 10, 20]));
        img.save(&path).unwrap();

        let decoded = load_texture(&path).unwrap();
        assert_eq!((decoded.width, decoded.height), (4, 2));
        assert_eq!(&decoded.pixels[4..8], &[60, 10, 20, 255]);
    }
}
