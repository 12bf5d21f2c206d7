//! Ambient occlusion: the unoccluded fraction of the hemisphere above
//! the first hit.

// spica
use crate::core::base::{Float, Spectrum};
use crate::core::geometry::{
    nrm_cross_vec3, nrm_faceforward_vec3, vec3_dot_nrmf, Normal3f, Ray, Vector3f,
};
use crate::core::sampler::{PixelSample, Sampler};
use crate::core::sampling::{
    cosine_hemisphere_pdf, cosine_sample_hemisphere, uniform_hemisphere_pdf,
    uniform_sample_hemisphere,
};
use crate::core::scene::Scene;

pub struct AoIntegrator {
    pub cos_sample: bool,
    pub n_samples: usize,
    /// Occlusion rays shorter than this never count as blocked; zero
    /// disables the cutoff.
    pub max_distance: Float,
    sample_offset: usize,
}

impl AoIntegrator {
    pub fn new(cos_sample: bool, n_samples: usize, max_distance: Float) -> Self {
        AoIntegrator {
            cos_sample,
            n_samples: n_samples.max(1),
            max_distance,
            sample_offset: 0,
        }
    }
    pub fn preprocess(&mut self, _scene: &Scene, sampler: &mut Sampler) {
        self.sample_offset = sampler.request_2d_array(self.n_samples);
    }
    pub fn li(&self, r: &Ray, scene: &Scene, ps: &PixelSample) -> Spectrum {
        let mut l: Spectrum = Spectrum::default();
        if let Some(isect) = scene.intersect(r) {
            // probe frame from true geometry, not shading geometry
            let n: Normal3f = nrm_faceforward_vec3(&isect.n, &-r.d);
            let s: Vector3f = isect.dpdu;
            let t: Vector3f = nrm_cross_vec3(&n, &s);
            let u = ps.get_2d_array(self.sample_offset);
            for sample in u.iter().take(self.n_samples) {
                let mut wi: Vector3f;
                let pdf: Float;
                if self.cos_sample {
                    wi = cosine_sample_hemisphere(sample);
                    pdf = cosine_hemisphere_pdf(wi.z.abs());
                } else {
                    wi = uniform_sample_hemisphere(sample);
                    pdf = uniform_hemisphere_pdf();
                }
                if pdf <= 0.0 as Float {
                    continue;
                }
                // local frame to world space
                wi = Vector3f {
                    x: s.x * wi.x + t.x * wi.y + n.x * wi.z,
                    y: s.y * wi.x + t.y * wi.y + n.y * wi.z,
                    z: s.z * wi.x + t.z * wi.y + n.z * wi.z,
                };
                let probe: Ray = isect.spawn_ray(&wi);
                if self.max_distance > 0.0 as Float {
                    probe.t_max.set(self.max_distance);
                }
                if !scene.intersect_p(&probe) {
                    l += Spectrum::new(
                        vec3_dot_nrmf(&wi, &n) / (pdf * self.n_samples as Float),
                    );
                }
            }
        }
        l
    }
}
