//! A primitive couples a shape with a material handle and an optional area
//! light back-reference. The scene owns all primitives; accelerators refer
//! to them by index.

// std
use std::sync::Arc;
// spica
use crate::core::base::Float;
use crate::core::geometry::{Bounds3f, Ray};
use crate::core::interaction::SurfaceInteraction;
use crate::core::material::Material;
use crate::shapes::Shape;

#[derive(Debug, Clone)]
pub struct Primitive {
    pub shape: Shape,
    pub material: Option<Arc<Material>>,
    /// Index of the area light this primitive emits for, if any.
    pub area_light: Option<u32>,
    /// This primitive's index in the scene's primitive array.
    pub index: u32,
}

impl Primitive {
    pub fn new(shape: Shape, material: Option<Arc<Material>>, index: u32) -> Self {
        Primitive {
            shape,
            material,
            area_light: None,
            index,
        }
    }
    pub fn world_bound(&self) -> Bounds3f {
        self.shape.world_bound()
    }
    pub fn intersect(&self, ray: &Ray, isect: &mut SurfaceInteraction) -> bool {
        let mut t_hit: Float = 0.0;
        if !self.shape.intersect(ray, &mut t_hit, isect) {
            return false;
        }
        ray.t_max.set(t_hit);
        isect.primitive = Some(self.index);
        true
    }
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        self.shape.intersect_p(ray)
    }
    /// Identifier used by subsurface probes to stay on one object.
    pub fn material_id(&self) -> usize {
        self.material
            .as_ref()
            .map(|m| Arc::as_ptr(m) as usize)
            .unwrap_or(0)
    }
}
