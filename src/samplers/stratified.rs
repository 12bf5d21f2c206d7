//! Jittered stratified sample tables, with Latin-hypercube padding for
//! array dimensions whose size is not a perfect square.

// spica
use crate::core::base::Float;
use crate::core::geometry::{Point2f, Point2i};
use crate::core::rng::Rng;
use crate::core::sampler::{PixelSample, SampleRequests};
use crate::core::sampling::{
    latin_hypercube, shuffle, stratified_sample_1d, stratified_sample_2d,
};

#[derive(Debug, Clone)]
pub struct StratifiedSampler {
    spp: usize,
    pub requests: SampleRequests,
    rng: Rng,
    pixel: Point2i,
}

impl StratifiedSampler {
    pub fn new(spp: usize) -> Self {
        StratifiedSampler {
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
            let mut table: Vec<Float> = vec![0.0; n];
            stratified_sample_1d(&mut table, n as i32, &mut self.rng, true);
            shuffle(&mut table, n as i32, 1, &mut self.rng);
            ps.arrays_1d.push(table);
        }
        for &n in &self.requests.sizes_2d {
            let mut table: Vec<Point2f> = vec![Point2f::default(); n];
            // a square count stratifies cleanly; anything else falls back
            // to Latin hypercube
            let nx = (n as Float).sqrt() as usize;
            if nx * nx == n && n > 1 {
                stratified_sample_2d(&mut table, nx as i32, nx as i32, &mut self.rng, true);
                shuffle(&mut table, n as i32, 1, &mut self.rng);
            } else {
                latin_hypercube(&mut table, n as u32, &mut self.rng);
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
    pub fn clone_with_seed(&self, seed: u64) -> StratifiedSampler {
        let mut s = self.clone();
        s.rng = Rng::new(seed);
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stratified_tables_cover_strata() {
        let mut sampler = StratifiedSampler::new(1);
        let offset = sampler.requests.request_2d_array(16);
        sampler.start_pixel(Point2i { x: 0, y: 0 });
        let ps = sampler.start_sample(0);
        let table = ps.get_2d_array(offset);
        // all 16 samples fall in distinct 4x4 strata before the shuffle
        // moved their order, so every cell must be covered
        let mut seen = [false; 16];
        for s in table {
            let cx = (s.x * 4.0) as usize;
            let cy = (s.y * 4.0) as usize;
            seen[cy.min(3) * 4 + cx.min(3)] = true;
        }
        assert!(seen.iter().all(|&b| b));
    }
}
