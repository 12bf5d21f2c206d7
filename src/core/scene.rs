//! The scene owns primitives and lights; the accelerator holds indices
//! into the primitive array and is immutable once built.

// std
use std::sync::Arc;
// spica
use crate::accelerators::Accelerator;
use crate::core::base::{Float, Spectrum};
use crate::core::geometry::{Bounds3f, Ray, Vector3f};
use crate::core::interaction::{BssrdfIntersections, SurfaceInteraction};
use crate::core::primitive::Primitive;
use crate::core::sampling::Distribution1D;
use crate::lights::Light;

pub struct Scene {
    pub lights: Vec<Arc<Light>>,
    /// Indices of lights that contribute to escaped rays.
    pub infinite_lights: Vec<Arc<Light>>,
    pub aggregate: Accelerator,
    world_bound: Bounds3f,
    light_power_distribution: Distribution1D,
}

impl Scene {
    pub fn new(aggregate: Accelerator, lights: Vec<Arc<Light>>) -> Self {
        let world_bound = aggregate.world_bound();
        for light in &lights {
            light.preprocess(&world_bound);
        }
        let infinite_lights: Vec<Arc<Light>> = lights
            .iter()
            .filter(|l| l.is_infinite())
            .cloned()
            .collect();
        let power: Vec<Float> = lights.iter().map(|l| l.power().y().max(1e-6)).collect();
        let light_power_distribution = Distribution1D::new(power);
        Scene {
            lights,
            infinite_lights,
            aggregate,
            world_bound,
            light_power_distribution,
        }
    }
    pub fn world_bound(&self) -> Bounds3f {
        self.world_bound
    }
    pub fn primitives(&self) -> &[Arc<Primitive>] {
        self.aggregate.primitives()
    }
    pub fn primitive(&self, index: u32) -> &Primitive {
        &self.aggregate.primitives()[index as usize]
    }
    pub fn intersect(&self, ray: &Ray) -> Option<SurfaceInteraction> {
        let mut isect = SurfaceInteraction::no_hit();
        if self.aggregate.intersect(ray, &mut isect) {
            isect.adjust_shading_normal();
            Some(isect)
        } else {
            None
        }
    }
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        self.aggregate.intersect_p(ray)
    }
    pub fn intersect_sss(&self, ray: &Ray, material_id: usize) -> BssrdfIntersections {
        let mut bag = self.aggregate.intersect_sss(ray, material_id);
        for hit in bag.hits.iter_mut() {
            hit.adjust_shading_normal();
        }
        bag
    }
    /// Emitted radiance where `isect` lies on an area light.
    pub fn le(&self, isect: &SurfaceInteraction, w: &Vector3f) -> Spectrum {
        if let Some(prim_index) = isect.primitive {
            if let Some(light_index) = self.primitive(prim_index).area_light {
                return self.lights[light_index as usize].l(&isect.n, w);
            }
        }
        Spectrum::default()
    }
    /// Build the scattering event for a hit: BSDF, optional BSSRDF, and
    /// the emission term when the primitive doubles as an area light.
    pub fn compute_scattering_functions(&self, isect: &mut SurfaceInteraction) {
        if let Some(prim_index) = isect.primitive {
            let prim = self.primitive(prim_index);
            if let Some(ref material) = prim.material {
                let material_id = prim.material_id();
                let material = material.clone();
                material.compute_scattering_functions(isect, material_id);
            }
        }
        isect.emission = self.le(isect, &isect.wo);
    }
    /// Pick a light proportional to emitted power.
    pub fn sample_light(&self, u: Float, pdf: &mut Float) -> Option<(usize, &Arc<Light>)> {
        if self.lights.is_empty() {
            *pdf = 0.0 as Float;
            return None;
        }
        let index = self.light_power_distribution.sample_discrete(u, Some(pdf));
        self.lights.get(index).map(|l| (index, l))
    }
    pub fn light_pdf(&self, index: usize) -> Float {
        self.light_power_distribution.discrete_pdf(index)
    }
}
