//! Light tracing: paths start at the lights and every vertex is
//! connected to the camera explicitly; all image contributions arrive as
//! film splats.

// spica
use crate::core::base::{Float, Spectrum};
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::geometry::{vec3_abs_dot_nrmf, Normal3f, Ray, Vector3f};
use crate::core::reflection::BxdfType;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::lights::VisibilityTester;

pub struct LightTracerIntegrator {
    pub max_depth: u32,
}

impl LightTracerIntegrator {
    pub fn new(max_depth: u32) -> Self {
        LightTracerIntegrator { max_depth }
    }
    pub fn preprocess(&mut self, _scene: &Scene, _sampler: &mut Sampler) {}
    /// Trace one light subpath and splat its camera connections; the
    /// pixel's own estimate is always black.
    pub fn li(
        &self,
        scene: &Scene,
        sampler: &mut Sampler,
        camera: &Camera,
        film: &Film,
    ) -> Spectrum {
        let mut pick_pdf: Float = 0.0;
        let (_light_index, light) = match scene.sample_light(sampler.get_1d(), &mut pick_pdf) {
            Some(pair) => pair,
            None => return Spectrum::default(),
        };
        if pick_pdf <= 0.0 as Float {
            return Spectrum::default();
        }
        let mut ray: Ray = Ray::default();
        let mut n_light: Normal3f = Normal3f::default();
        let mut pdf_pos: Float = 0.0;
        let mut pdf_dir: Float = 0.0;
        let le: Spectrum = light.sample_le(
            sampler.get_2d(),
            sampler.get_2d(),
            &mut ray,
            &mut n_light,
            &mut pdf_pos,
            &mut pdf_dir,
        );
        if le.is_black() || pdf_pos == 0.0 as Float || pdf_dir == 0.0 as Float {
            return Spectrum::default();
        }
        let mut beta: Spectrum =
            le * vec3_abs_dot_nrmf(&ray.d, &n_light) / (pick_pdf * pdf_pos * pdf_dir);
        for _bounce in 0..self.max_depth {
            let mut isect = match scene.intersect(&ray) {
                Some(isect) => isect,
                None => break,
            };
            scene.compute_scattering_functions(&mut isect);
            let bsdf = match isect.bsdf {
                Some(ref bsdf) => bsdf.clone(),
                None => {
                    ray = isect.spawn_ray(&ray.d);
                    continue;
                }
            };
            // explicit connection to the camera
            let mut wi_cam: Vector3f = Vector3f::default();
            let mut cam_pdf: Float = 0.0;
            if let Some((importance, raster)) =
                camera.sample_wi(&isect.p, &mut wi_cam, &mut cam_pdf)
            {
                if cam_pdf > 0.0 as Float {
                    let f = bsdf.f(&isect.wo, &wi_cam, BxdfType::BsdfAll as u8);
                    if !f.is_black() {
                        let vis = VisibilityTester {
                            p0: isect.p,
                            n0: isect.n,
                            p1: camera.eye(),
                        };
                        if vis.unoccluded(scene) {
                            let splat = beta
                                * f
                                * vec3_abs_dot_nrmf(&wi_cam, &isect.shading_n)
                                * importance
                                / cam_pdf;
                            film.add_splat(raster, splat);
                        }
                    }
                }
            }
            // continue the walk
            let mut wi: Vector3f = Vector3f::default();
            let mut pdf: Float = 0.0;
            let mut sampled_type: u8 = u8::max_value();
            let f: Spectrum = bsdf.sample_f(
                &isect.wo,
                &mut wi,
                &sampler.get_2d(),
                &mut pdf,
                BxdfType::BsdfAll as u8,
                &mut sampled_type,
            );
            if f.is_black() || pdf == 0.0 as Float {
                break;
            }
            beta *= f * vec3_abs_dot_nrmf(&wi, &isect.shading_n) / pdf;
            // trim low-throughput walks
            if beta.max_component_value() < 1e-3 as Float {
                if sampler.get_1d() < 0.5 as Float {
                    break;
                }
                beta *= 2.0 as Float;
            }
            ray = isect.spawn_ray(&wi);
        }
        Spectrum::default()
    }
}
