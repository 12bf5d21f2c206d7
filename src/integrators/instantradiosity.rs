//! Instant radiosity: a pre-traced set of virtual point lights stands in
//! for indirect illumination; each camera hit sums their contributions
//! through a bounded geometry term that caps the variance spikes near
//! the VPLs.

// spica
use crate::core::base::{Float, Spectrum};
use crate::core::geometry::{
    nrm_dot_vec3f, pnt3_distance_squaredf, vec3_abs_dot_nrmf, Normal3f, Point3f, Ray, Vector3f,
};
use crate::core::integrator::uniform_sample_one_light;
use crate::core::reflection::BxdfType;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::core::stats;
use crate::lights::VisibilityTester;

#[derive(Debug, Clone)]
struct VirtualPointLight {
    p: Point3f,
    n: Normal3f,
    /// Path throughput carried to this VPL, divided by the path count.
    beta: Spectrum,
}

pub struct InstantRadiosityIntegrator {
    pub n_light_paths: usize,
    pub max_depth: u32,
    /// Squared-distance clamp of the geometry term.
    pub g_clamp_distance: Float,
    vpls: Vec<VirtualPointLight>,
}

impl InstantRadiosityIntegrator {
    pub fn new(n_light_paths: usize, max_depth: u32, g_clamp_distance: Float) -> Self {
        InstantRadiosityIntegrator {
            n_light_paths: n_light_paths.max(1),
            max_depth,
            g_clamp_distance: g_clamp_distance.max(1e-3),
            vpls: Vec::new(),
        }
    }
    /// Trace the VPL set once, before any tile is rendered.
    pub fn preprocess(&mut self, scene: &Scene, sampler: &mut Sampler) {
        self.vpls.clear();
        let mut vpl_sampler = sampler.clone_with_seed(0x51ca);
        let inv_paths: Float = 1.0 as Float / self.n_light_paths as Float;
        for _ in 0..self.n_light_paths {
            let mut pick_pdf: Float = 0.0;
            let (_light_index, light) =
                match scene.sample_light(vpl_sampler.get_1d(), &mut pick_pdf) {
                    Some(pair) => pair,
                    None => break,
                };
            if pick_pdf <= 0.0 as Float {
                continue;
            }
            let mut ray: Ray = Ray::default();
            let mut n_light: Normal3f = Normal3f::default();
            let mut pdf_pos: Float = 0.0;
            let mut pdf_dir: Float = 0.0;
            let le: Spectrum = light.sample_le(
                vpl_sampler.get_2d(),
                vpl_sampler.get_2d(),
                &mut ray,
                &mut n_light,
                &mut pdf_pos,
                &mut pdf_dir,
            );
            if le.is_black() || pdf_pos == 0.0 as Float || pdf_dir == 0.0 as Float {
                continue;
            }
            let mut beta: Spectrum = le * vec3_abs_dot_nrmf(&ray.d, &n_light)
                / (pick_pdf * pdf_pos * pdf_dir);
            for _bounce in 0..self.max_depth {
                let mut isect = match scene.intersect(&ray) {
                    Some(isect) => isect,
                    None => break,
                };
                scene.compute_scattering_functions(&mut isect);
                let bsdf = match isect.bsdf {
                    Some(ref bsdf) => bsdf.clone(),
                    None => break,
                };
                self.vpls.push(VirtualPointLight {
                    p: isect.p,
                    n: isect.shading_n,
                    beta: beta * inv_paths,
                });
                stats::record_virtual_light();
                let mut wi: Vector3f = Vector3f::default();
                let mut pdf: Float = 0.0;
                let mut sampled_type: u8 = u8::max_value();
                let f: Spectrum = bsdf.sample_f(
                    &isect.wo,
                    &mut wi,
                    &vpl_sampler.get_2d(),
                    &mut pdf,
                    BxdfType::BsdfAll as u8,
                    &mut sampled_type,
                );
                if f.is_black() || pdf == 0.0 as Float {
                    break;
                }
                beta *= f * vec3_abs_dot_nrmf(&wi, &isect.shading_n) / pdf;
                // deterministic throughput cutoff keeps the VPL count
                // bounded
                if beta.max_component_value() < 1e-3 as Float {
                    break;
                }
                ray = isect.spawn_ray(&wi);
            }
        }
        log::info!("instant radiosity traced {} virtual point lights", self.vpls.len());
    }
    pub fn li(&self, r: &Ray, scene: &Scene, sampler: &mut Sampler) -> Spectrum {
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
        let bsdf = match isect.bsdf {
            Some(ref bsdf) => bsdf.clone(),
            None => return l,
        };
        // direct lighting as usual
        l += uniform_sample_one_light(
            &isect,
            scene,
            sampler.get_1d(),
            sampler.get_2d(),
            sampler.get_2d(),
        );
        // indirect through the VPL set
        for vpl in &self.vpls {
            let d: Vector3f = vpl.p - isect.p;
            let dist2: Float = pnt3_distance_squaredf(&vpl.p, &isect.p);
            if dist2 <= 0.0 as Float {
                continue;
            }
            let wi: Vector3f = d / dist2.sqrt();
            let cos_surface: Float = nrm_dot_vec3f(&isect.shading_n, &wi).max(0.0 as Float);
            let cos_vpl: Float = nrm_dot_vec3f(&vpl.n, &-wi).max(0.0 as Float);
            if cos_surface <= 0.0 as Float || cos_vpl <= 0.0 as Float {
                continue;
            }
            // bounded geometry term: the squared distance never drops
            // under the clamp, which caps the singularity near the VPL
            let g: Float = cos_surface * cos_vpl
                / dist2.max(self.g_clamp_distance * self.g_clamp_distance);
            let f = bsdf.f(&isect.wo, &wi, BxdfType::BsdfAll as u8);
            if f.is_black() || g <= 0.0 as Float {
                continue;
            }
            let vis = VisibilityTester {
                p0: isect.p,
                n0: isect.n,
                p1: vpl.p,
            };
            if vis.unoccluded(scene) {
                l += f * vpl.beta * g;
            }
        }
        l
    }
}
