//! Unidirectional path tracing with Russian-roulette termination,
//! MIS-based direct lighting at every vertex, and the subsurface probe
//! when a BSSRDF entry event is sampled.

// spica
use crate::core::base::{Float, Spectrum};
use crate::core::geometry::{vec3_abs_dot_nrmf, vec3_dot_nrmf, Ray, Vector3f};
use crate::core::integrator::uniform_sample_one_light;
use crate::core::reflection::BxdfType;
use crate::core::sampler::{PixelSample, Sampler};
use crate::core::scene::Scene;
use crate::core::stats;

pub struct PathIntegrator {
    pub max_depth: u32,
    pub rr_threshold: Float,
}

impl PathIntegrator {
    pub fn new(max_depth: u32, rr_threshold: Float) -> Self {
        PathIntegrator {
            max_depth,
            rr_threshold,
        }
    }
    pub fn preprocess(&mut self, _scene: &Scene, _sampler: &mut Sampler) {}
    pub fn li(
        &self,
        r: &Ray,
        scene: &Scene,
        sampler: &mut Sampler,
        _ps: &PixelSample,
    ) -> Spectrum {
        let mut l: Spectrum = Spectrum::default();
        let mut beta: Spectrum = Spectrum::new(1.0 as Float);
        let mut ray: Ray = r.clone();
        let mut specular_bounce: bool = false;
        let mut bounces: u32 = 0_u32;
        // eta_scale tracks radiance scaling from refractive boundaries so
        // Russian roulette does not terminate rays that are about to be
        // refracted back out of a medium
        let mut eta_scale: Float = 1.0;
        loop {
            match scene.intersect(&ray) {
                Some(mut isect) => {
                    // emitted light only counts when it was not already
                    // importance-sampled at the previous vertex
                    if bounces == 0 || specular_bounce {
                        l += beta * scene.le(&isect, &-ray.d);
                    }
                    if bounces >= self.max_depth {
                        break;
                    }
                    scene.compute_scattering_functions(&mut isect);
                    if isect.bsdf.is_none() {
                        ray = isect.spawn_ray(&ray.d);
                        continue;
                    }
                    // direct lighting via MIS (skipped for pure speculars)
                    let bsdf_flags: u8 =
                        BxdfType::BsdfAll as u8 & !(BxdfType::BsdfSpecular as u8);
                    let has_non_specular = isect
                        .bsdf
                        .as_ref()
                        .map(|b| b.num_components(bsdf_flags) > 0)
                        .unwrap_or(false);
                    if has_non_specular {
                        let ld: Spectrum = beta
                            * uniform_sample_one_light(
                                &isect,
                                scene,
                                sampler.get_1d(),
                                sampler.get_2d(),
                                sampler.get_2d(),
                            );
                        if ld.has_nans() {
                            stats::record_dropped_sample();
                        } else {
                            l += ld;
                        }
                    }
                    // extend the path with a BSDF sample
                    let wo: Vector3f = -ray.d;
                    let mut wi: Vector3f = Vector3f::default();
                    let mut pdf: Float = 0.0 as Float;
                    let mut sampled_type: u8 = u8::max_value();
                    let f: Spectrum = isect.bsdf.as_ref().map(|b| {
                        b.sample_f(
                            &wo,
                            &mut wi,
                            &sampler.get_2d(),
                            &mut pdf,
                            BxdfType::BsdfAll as u8,
                            &mut sampled_type,
                        )
                    }).unwrap_or_default();
                    if f.is_black() || pdf == 0.0 as Float {
                        break;
                    }
                    beta *= f * vec3_abs_dot_nrmf(&wi, &isect.shading_n) / pdf;
                    specular_bounce = (sampled_type & BxdfType::BsdfSpecular as u8) != 0_u8;
                    if (sampled_type & BxdfType::BsdfSpecular as u8) != 0_u8
                        && (sampled_type & BxdfType::BsdfTransmission as u8) != 0_u8
                    {
                        let eta: Float = isect.bsdf.as_ref().map(|b| b.eta).unwrap_or(1.0);
                        if vec3_dot_nrmf(&wo, &isect.n) > 0.0 as Float {
                            eta_scale *= eta * eta;
                        } else {
                            eta_scale *= 1.0 as Float / (eta * eta);
                        }
                    }
                    ray = isect.spawn_ray(&wi);
                    // subsurface transport when the entry lobe was a
                    // transmission and a BSSRDF is attached
                    if let Some(ref bssrdf) = isect.bssrdf {
                        if (sampled_type & BxdfType::BsdfTransmission as u8) != 0_u8 {
                            let mut sss_pdf: Float = 0.0;
                            let (s, pi_opt) = bssrdf.sample_s(
                                scene,
                                &isect,
                                sampler.get_1d(),
                                &sampler.get_2d(),
                                &mut sss_pdf,
                            );
                            if s.is_black() || sss_pdf == 0.0 as Float {
                                break;
                            }
                            beta *= s / sss_pdf;
                            if let Some(mut pi) = pi_opt {
                                scene.compute_scattering_functions(&mut pi);
                                pi.wo = Vector3f::from(pi.shading_n);
                                if pi.bsdf.is_some() {
                                    // direct subsurface component
                                    l += beta
                                        * uniform_sample_one_light(
                                            &pi,
                                            scene,
                                            sampler.get_1d(),
                                            sampler.get_2d(),
                                            sampler.get_2d(),
                                        );
                                    // indirect: continue the walk from
                                    // the exit point
                                    let mut wi: Vector3f = Vector3f::default();
                                    let mut pdf: Float = 0.0;
                                    let mut sampled_type: u8 = u8::max_value();
                                    let f: Spectrum = pi
                                        .bsdf
                                        .as_ref()
                                        .map(|b| {
                                            b.sample_f(
                                                &pi.wo,
                                                &mut wi,
                                                &sampler.get_2d(),
                                                &mut pdf,
                                                BxdfType::BsdfAll as u8,
                                                &mut sampled_type,
                                            )
                                        })
                                        .unwrap_or_default();
                                    if f.is_black() || pdf == 0.0 as Float {
                                        break;
                                    }
                                    beta *= f * vec3_abs_dot_nrmf(&wi, &pi.shading_n) / pdf;
                                    specular_bounce =
                                        (sampled_type & BxdfType::BsdfSpecular as u8) != 0_u8;
                                    ray = pi.spawn_ray(&wi);
                                }
                            } else {
                                break;
                            }
                        }
                    }
                    // Russian roulette, with refraction scaling factored
                    // out of the survival probability
                    let rr_beta: Spectrum = beta * eta_scale;
                    if rr_beta.max_component_value() < self.rr_threshold && bounces > 3 {
                        let q: Float =
                            (0.05 as Float).max(1.0 as Float - rr_beta.max_component_value());
                        if sampler.get_1d() < q {
                            break;
                        }
                        beta = beta / (1.0 as Float - q);
                    }
                }
                None => {
                    // escaped: the environment contributes only when it
                    // was not importance-sampled at the previous vertex
                    if bounces == 0 || specular_bounce {
                        for light in &scene.infinite_lights {
                            l += beta * light.le(&ray);
                        }
                    } else {
                        // the MIS weight for the environment was already
                        // accounted for by estimate_direct's BSDF sample
                    }
                    break;
                }
            }
            bounces += 1_u32;
        }
        l
    }
}
