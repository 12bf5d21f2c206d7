//! Whitted-style ray tracing: direct lighting from every light plus
//! perfect specular reflection and refraction, recursed by depth.

// spica
use crate::core::base::{Float, Spectrum};
use crate::core::geometry::{vec3_abs_dot_nrmf, Ray, Vector3f};
use crate::core::reflection::BxdfType;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::lights::{LightRef, VisibilityTester};

pub struct WhittedIntegrator {
    pub max_depth: u32,
}

impl WhittedIntegrator {
    pub fn new(max_depth: u32) -> Self {
        WhittedIntegrator { max_depth }
    }
    pub fn preprocess(&mut self, _scene: &Scene, _sampler: &mut Sampler) {}
    pub fn li(&self, r: &Ray, scene: &Scene, sampler: &mut Sampler, depth: u32) -> Spectrum {
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
        let wo: Vector3f = isect.wo;
        l += scene.le(&isect, &wo);
        scene.compute_scattering_functions(&mut isect);
        let bsdf = match isect.bsdf {
            Some(ref bsdf) => bsdf.clone(),
            None => return l,
        };
        // direct illumination from every light
        let iref = LightRef {
            p: isect.p,
            n: isect.n,
        };
        for light in &scene.lights {
            let mut wi: Vector3f = Vector3f::default();
            let mut pdf: Float = 0.0;
            let mut vis = VisibilityTester::default();
            let li = light.sample_li(&iref, sampler.get_2d(), &mut wi, &mut pdf, &mut vis);
            if pdf <= 0.0 as Float || li.is_black() {
                continue;
            }
            let f = bsdf.f(&wo, &wi, BxdfType::BsdfAll as u8);
            if !f.is_black() && vis.unoccluded(scene) {
                l += f * li * vec3_abs_dot_nrmf(&wi, &isect.shading_n) / pdf;
            }
        }
        if depth + 1 < self.max_depth {
            l += self.specular_bounce(
                r,
                scene,
                sampler,
                &isect,
                &bsdf,
                BxdfType::BsdfReflection as u8 | BxdfType::BsdfSpecular as u8,
                depth,
            );
            l += self.specular_bounce(
                r,
                scene,
                sampler,
                &isect,
                &bsdf,
                BxdfType::BsdfTransmission as u8 | BxdfType::BsdfSpecular as u8,
                depth,
            );
        }
        l
    }
    #[allow(clippy::too_many_arguments)]
    fn specular_bounce(
        &self,
        _r: &Ray,
        scene: &Scene,
        sampler: &mut Sampler,
        isect: &crate::core::interaction::SurfaceInteraction,
        bsdf: &crate::core::reflection::Bsdf,
        flags: u8,
        depth: u32,
    ) -> Spectrum {
        let wo: Vector3f = isect.wo;
        let mut wi: Vector3f = Vector3f::default();
        let mut pdf: Float = 0.0;
        let mut sampled_type: u8 = u8::max_value();
        let f: Spectrum = bsdf.sample_f(
            &wo,
            &mut wi,
            &sampler.get_2d(),
            &mut pdf,
            flags,
            &mut sampled_type,
        );
        let cos: Float = vec3_abs_dot_nrmf(&wi, &isect.shading_n);
        if pdf > 0.0 as Float && !f.is_black() && cos != 0.0 as Float {
            let ray = isect.spawn_ray(&wi);
            f * self.li(&ray, scene, sampler, depth + 1) * cos / pdf
        } else {
            Spectrum::default()
        }
    }
}
