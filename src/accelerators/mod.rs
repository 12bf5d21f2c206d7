//! Spatial acceleration structures.

pub mod wide_bvh;

// std
use std::sync::Arc;
// spica
use crate::core::geometry::{Bounds3f, Ray};
use crate::core::interaction::{BssrdfIntersections, SurfaceInteraction};
use crate::core::primitive::Primitive;
use crate::accelerators::wide_bvh::WideBvh;

/// A 4-wide or 8-wide BVH; the width is fixed when the scene is built.
#[derive(Debug)]
pub enum Accelerator {
    Qbvh(WideBvh<4>),
    Obvh(WideBvh<8>),
}

impl Accelerator {
    pub fn build(primitives: Vec<Arc<Primitive>>, wide: bool) -> Self {
        if wide {
            Accelerator::Obvh(WideBvh::new(primitives))
        } else {
            Accelerator::Qbvh(WideBvh::new(primitives))
        }
    }
    pub fn world_bound(&self) -> Bounds3f {
        match self {
            Accelerator::Qbvh(bvh) => bvh.world_bound(),
            Accelerator::Obvh(bvh) => bvh.world_bound(),
        }
    }
    pub fn intersect(&self, ray: &Ray, isect: &mut SurfaceInteraction) -> bool {
        match self {
            Accelerator::Qbvh(bvh) => bvh.intersect(ray, isect),
            Accelerator::Obvh(bvh) => bvh.intersect(ray, isect),
        }
    }
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        match self {
            Accelerator::Qbvh(bvh) => bvh.intersect_p(ray),
            Accelerator::Obvh(bvh) => bvh.intersect_p(ray),
        }
    }
    pub fn intersect_sss(&self, ray: &Ray, material_id: usize) -> BssrdfIntersections {
        match self {
            Accelerator::Qbvh(bvh) => bvh.intersect_sss(ray, material_id),
            Accelerator::Obvh(bvh) => bvh.intersect_sss(ray, material_id),
        }
    }
    pub fn primitives(&self) -> &[Arc<Primitive>] {
        match self {
            Accelerator::Qbvh(bvh) => &bvh.primitives,
            Accelerator::Obvh(bvh) => &bvh.primitives,
        }
    }
    /// Reference nearest-hit: a linear scan over every primitive. The
    /// traversal must agree with this up to numerical ties.
    pub fn intersect_brute_force(&self, ray: &Ray, isect: &mut SurfaceInteraction) -> bool {
        let mut hit = false;
        for prim in self.primitives() {
            if prim.intersect(ray, isect) {
                hit = true;
            }
        }
        if hit {
            isect.t = ray.t_max.get();
        }
        hit
    }
    pub fn node_count(&self) -> usize {
        match self {
            Accelerator::Qbvh(bvh) => bvh.nodes.len(),
            Accelerator::Obvh(bvh) => bvh.nodes.len(),
        }
    }
}
