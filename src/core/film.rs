//! The film accumulates filtered radiance samples per pixel, with a
//! separate atomically-updated splat plane for light-tracing style
//! contributions that cross tile boundaries. Pixel (0, 0) is top-left;
//! stored values are linear radiance.

// std
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::Ordering;
// others
use atomic::Atomic;
use image::codecs::hdr::HdrEncoder;
use image::Rgb;
// spica
use crate::core::base::{Float, Spectrum};
use crate::core::geometry::Point2f;
use crate::core::stats;
use crate::filters::Filter;

#[derive(Debug, Default, Copy, Clone)]
struct Pixel {
    rgb: [Float; 3],
    filter_weight_sum: Float,
}

pub struct Film {
    pub width: usize,
    pub height: usize,
    pub filter: Filter,
    pixels: Vec<Pixel>,
    splats: Vec<[Atomic<Float>; 3]>,
}

impl Film {
    pub fn new(width: usize, height: usize, filter: Filter) -> Self {
        let mut splats = Vec::with_capacity(width * height);
        for _ in 0..width * height {
            splats.push([
                Atomic::new(0.0 as Float),
                Atomic::new(0.0 as Float),
                Atomic::new(0.0 as Float),
            ]);
        }
        Film {
            width,
            height,
            filter,
            pixels: vec![Pixel::default(); width * height],
            splats,
        }
    }
    /// A tile covering `[x0, x1) x [y0, y1)`, expanded by the filter
    /// radius so boundary samples keep their full footprint.
    pub fn get_film_tile(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> FilmTile {
        FilmTile::new(x0, y0, x1, y1, self.filter, self.width, self.height)
    }
    /// Tiles may overlap by the filter radius, but merging runs on one
    /// thread, so the adds cannot race.
    pub fn merge_film_tile(&mut self, tile: FilmTile) {
        for y in tile.y0..tile.y1 {
            for x in tile.x0..tile.x1 {
                let src = tile.pixels[(y - tile.y0) * (tile.x1 - tile.x0) + (x - tile.x0)];
                let dst = &mut self.pixels[y * self.width + x];
                for c in 0..3 {
                    dst.rgb[c] += src.rgb[c];
                }
                dst.filter_weight_sum += src.filter_weight_sum;
            }
        }
    }
    /// Atomically accumulate a splat at a raster position.
    pub fn add_splat(&self, p: Point2f, l: Spectrum) {
        if l.has_nans() {
            stats::record_dropped_sample();
            return;
        }
        let x = p.x as usize;
        let y = p.y as usize;
        if x >= self.width || y >= self.height {
            return;
        }
        let slot = &self.splats[y * self.width + x];
        for c in 0..3 {
            let _ = slot[c].fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(v + l.c[c])
            });
        }
    }
    pub fn pixel_radiance(&self, x: usize, y: usize, splat_scale: Float) -> Spectrum {
        let pixel = self.pixels[y * self.width + x];
        let mut rgb = [0.0 as Float; 3];
        if pixel.filter_weight_sum > 0.0 as Float {
            for c in 0..3 {
                rgb[c] = (pixel.rgb[c] / pixel.filter_weight_sum).max(0.0 as Float);
            }
        }
        let slot = &self.splats[y * self.width + x];
        for c in 0..3 {
            rgb[c] += slot[c].load(Ordering::Relaxed) * splat_scale;
        }
        Spectrum::from_rgb(&rgb)
    }
    pub fn write_image(&self, path: &Path, splat_scale: Float) -> Result<(), image::ImageError> {
        let mut data: Vec<Rgb<f32>> = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let s = self.pixel_radiance(x, y, splat_scale);
                data.push(Rgb([s.c[0], s.c[1], s.c[2]]));
            }
        }
        let file = File::create(path)?;
        HdrEncoder::new(BufWriter::new(file)).encode(&data, self.width, self.height)?;
        log::info!("wrote {}x{} HDR image to {:?}", self.width, self.height, path);
        Ok(())
    }
}

/// A worker-private accumulation rectangle.
pub struct FilmTile {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
    filter: Filter,
    pixels: Vec<Pixel>,
}

impl FilmTile {
    /// Tile over `[x0, x1) x [y0, y1)`, expanded by the filter radius and
    /// clipped to the film.
    pub fn new(
        x0: u32,
        y0: u32,
        x1: u32,
        y1: u32,
        filter: Filter,
        film_width: usize,
        film_height: usize,
    ) -> FilmTile {
        let extra = (filter.radius() - 0.5 as Float).ceil().max(0.0) as i64;
        let px0 = (x0 as i64 - extra).max(0);
        let py0 = (y0 as i64 - extra).max(0);
        let px1 = (x1 as i64 + extra).min(film_width as i64);
        let py1 = (y1 as i64 + extra).min(film_height as i64);
        FilmTile {
            x0: px0 as usize,
            y0: py0 as usize,
            x1: px1 as usize,
            y1: py1 as usize,
            filter,
            pixels: vec![Pixel::default(); ((px1 - px0) * (py1 - py0)) as usize],
        }
    }
    /// Filter a radiance sample into every pixel whose footprint covers
    /// it. Non-finite samples are dropped so one bad path cannot poison
    /// the pixel.
    pub fn add_sample(&mut self, p_film: Point2f, l: Spectrum) {
        if l.has_nans() {
            stats::record_dropped_sample();
            log::warn!("dropped non-finite radiance sample at {:?}", p_film);
            return;
        }
        let r = self.filter.radius();
        // pixels whose centers lie within the filter radius
        let lo_x = ((p_film.x - 0.5 as Float - r).ceil().max(self.x0 as Float)) as usize;
        let hi_x = ((p_film.x - 0.5 as Float + r).floor().min((self.x1 - 1) as Float)) as usize;
        let lo_y = ((p_film.y - 0.5 as Float - r).ceil().max(self.y0 as Float)) as usize;
        let hi_y = ((p_film.y - 0.5 as Float + r).floor().min((self.y1 - 1) as Float)) as usize;
        for y in lo_y..=hi_y {
            for x in lo_x..=hi_x {
                let offset = Point2f {
                    x: (x as Float + 0.5) - p_film.x,
                    y: (y as Float + 0.5) - p_film.y,
                };
                let weight = self.filter.evaluate(&offset);
                if weight <= 0.0 as Float {
                    continue;
                }
                let pixel =
                    &mut self.pixels[(y - self.y0) * (self.x1 - self.x0) + (x - self.x0)];
                for c in 0..3 {
                    pixel.rgb[c] += l.c[c] * weight;
                }
                pixel.filter_weight_sum += weight;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_filter_hits_exactly_one_pixel() {
        let film = Film::new(8, 8, Filter::default());
        let mut tile = film.get_film_tile(0, 0, 8, 8);
        tile.add_sample(Point2f { x: 3.5, y: 4.5 }, Spectrum::new(2.0));
        let mut film = film;
        film.merge_film_tile(tile);
        assert!((film.pixel_radiance(3, 4, 1.0).c[0] - 2.0).abs() < 1e-5);
        assert!(film.pixel_radiance(2, 4, 1.0).is_black());
    }

    #[test]
    fn nan_samples_are_dropped() {
        let film = Film::new(4, 4, Filter::default());
        let mut tile = film.get_film_tile(0, 0, 4, 4);
        tile.add_sample(
            Point2f { x: 1.5, y: 1.5 },
            Spectrum::rgb(std::f32::NAN, 1.0, 1.0),
        );
        let mut film = film;
        film.merge_film_tile(tile);
        assert!(film.pixel_radiance(1, 1, 1.0).is_black());
    }

    #[test]
    fn splats_accumulate_atomically() {
        let film = std::sync::Arc::new(Film::new(2, 2, Filter::default()));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let f = film.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    f.add_splat(Point2f { x: 0.5, y: 0.5 }, Spectrum::new(1.0));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        let total = film.pixel_radiance(0, 0, 1.0);
        assert!((total.c[0] - 400.0).abs() < 1e-3);
    }
}
