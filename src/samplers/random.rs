//! Uniform pseudo-random sample tables; the baseline generator.

// spica
use crate::core::base::Float;
use crate::core::geometry::{Point2f, Point2i};
use crate::core::rng::Rng;
use crate::core::sampler::{PixelSample, SampleRequests};

#[derive(Debug, Clone)]
pub struct RandomSampler {
    spp: usize,
    pub requests: SampleRequests,
    rng: Rng,
    pixel: Point2i,
}

impl RandomSampler {
    pub fn new(spp: usize) -> Self {
        RandomSampler {
            spp: spp.max(1),
            requests: SampleRequests::default(),
            rng: Rng::default(),
            pixel: Point2i::default(),
        }
    }
    pub fn samples_per_pixel(&self) -> usize {
        self.spp
    }
    /// Seeding depends only on the pixel, so tile order cannot change
    /// the image.
    pub fn start_pixel(&mut self, p: Point2i) {
        self.pixel = p;
        let sequence: u64 = ((p.x as u32 as u64) << 32) | (p.y as u32 as u64);
        self.rng.set_sequence(sequence);
    }
    pub fn start_sample(&mut self, _sample_index: usize) -> PixelSample {
        let mut ps = PixelSample::default();
        for &n in &self.requests.sizes_1d {
            let mut table: Vec<Float> = Vec::with_capacity(n);
            for _ in 0..n {
                table.push(self.rng.uniform_float());
            }
            ps.arrays_1d.push(table);
        }
        for &n in &self.requests.sizes_2d {
            let mut table: Vec<Point2f> = Vec::with_capacity(n);
            for _ in 0..n {
                table.push(Point2f {
                    x: self.rng.uniform_float(),
                    y: self.rng.uniform_float(),
                });
            }
            ps.arrays_2d.push(table);
        }
        ps
    }
    pub fn get_1d(&mut self) -> Float {
        self.rng.uniform_float()
    }
    pub fn get_2d(&mut self) -> Point2f {
        Point2f {
            x: self.rng.uniform_float(),
            y: self.rng.uniform_float(),
        }
    }
    pub fn clone_with_seed(&self, seed: u64) -> RandomSampler {
        let mut s = self.clone();
        s.rng = Rng::new(seed);
        s
    }
}
