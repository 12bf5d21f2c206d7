//! Direct lighting only: every area light is multi-importance-sampled
//! with one light sample and one BSDF sample per table entry; no indirect
//! bounces are spawned.

// spica
use crate::core::base::{Float, Spectrum};
use crate::core::geometry::Ray;
use crate::core::integrator::estimate_direct;
use crate::core::sampler::{PixelSample, Sampler};
use crate::core::scene::Scene;

pub struct DirectLightingIntegrator {
    /// Samples per light per pixel sample.
    pub n_samples: usize,
    light_sample_offsets: Vec<usize>,
    bsdf_sample_offsets: Vec<usize>,
}

impl DirectLightingIntegrator {
    pub fn new(n_samples: usize) -> Self {
        DirectLightingIntegrator {
            n_samples: n_samples.max(1),
            light_sample_offsets: Vec::new(),
            bsdf_sample_offsets: Vec::new(),
        }
    }
    pub fn preprocess(&mut self, scene: &Scene, sampler: &mut Sampler) {
        self.light_sample_offsets.clear();
        self.bsdf_sample_offsets.clear();
        for _ in 0..scene.lights.len() {
            self.light_sample_offsets
                .push(sampler.request_2d_array(self.n_samples));
            self.bsdf_sample_offsets
                .push(sampler.request_2d_array(self.n_samples));
        }
    }
    pub fn li(
        &self,
        r: &Ray,
        scene: &Scene,
        _sampler: &mut Sampler,
        ps: &PixelSample,
    ) -> Spectrum {
        let mut l: Spectrum = Spectrum::default();
        let mut isect = match scene.intersect(r) {
            Some(isect) => isect,
            None => {
                for light in &scene.infinite_lights {
                    l += light.le(r);
                }
                return l;
            }
        };
        l += scene.le(&isect, &isect.wo);
        scene.compute_scattering_functions(&mut isect);
        if isect.bsdf.is_none() {
            return l;
        }
        for (light_index, light) in scene.lights.iter().enumerate() {
            let u_light = ps.get_2d_array(self.light_sample_offsets[light_index]);
            let u_bsdf = ps.get_2d_array(self.bsdf_sample_offsets[light_index]);
            let mut ld: Spectrum = Spectrum::default();
            for i in 0..self.n_samples {
                ld += estimate_direct(&isect, scene, light_index, light, u_light[i], u_bsdf[i]);
            }
            l += ld / self.n_samples as Float;
        }
        l
    }
}
