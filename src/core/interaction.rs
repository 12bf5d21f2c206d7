//! Hit records. A `SurfaceInteraction` with `t == infinity` and no
//! primitive reference encodes "no hit".

// spica
use crate::core::base::Float;
use crate::core::bssrdf::Bssrdf;
use crate::core::geometry::{
    nrm_faceforward_nrm, pnt3_offset_ray_origin, Normal3f, Point2f, Point3f, Ray, Vector3f,
};
use crate::core::reflection::Bsdf;
use crate::core::spectrum::Spectrum;

#[derive(Debug, Default, Clone)]
pub struct SurfaceInteraction {
    /// Hit parameter along the ray; infinity when nothing was hit.
    pub t: Float,
    pub p: Point3f,
    pub wo: Vector3f,
    /// Geometric normal.
    pub n: Normal3f,
    /// Shading normal (interpolated for meshes).
    pub shading_n: Normal3f,
    /// Surface tangent, used to build the shading frame.
    pub dpdu: Vector3f,
    pub uv: Point2f,
    /// Index of the intersected primitive in the scene's primitive array.
    pub primitive: Option<u32>,
    pub bsdf: Option<Bsdf>,
    pub bssrdf: Option<Bssrdf>,
    pub emission: Spectrum,
}

impl SurfaceInteraction {
    pub fn no_hit() -> Self {
        SurfaceInteraction {
            t: std::f32::INFINITY,
            ..Default::default()
        }
    }
    pub fn is_hit(&self) -> bool {
        self.primitive.is_some()
    }
    /// Spawn a ray leaving the hit point in direction `d`, offset off the
    /// surface to avoid self-intersection.
    pub fn spawn_ray(&self, d: &Vector3f) -> Ray {
        let o: Point3f = pnt3_offset_ray_origin(&self.p, &self.n, d);
        Ray::new(o, *d)
    }
    pub fn spawn_ray_to(&self, p: &Point3f) -> Ray {
        let d: Vector3f = p - &self.p;
        let o: Point3f = pnt3_offset_ray_origin(&self.p, &self.n, &d);
        Ray::new_with_span(o, d, 0.0 as Float, 1.0 as Float - 1e-3 as Float)
    }
    /// Make the shading normal agree with the geometric orientation.
    pub fn adjust_shading_normal(&mut self) {
        if self.shading_n == Normal3f::default() {
            self.shading_n = self.n;
        } else {
            self.n = nrm_faceforward_nrm(&self.n, &self.shading_n);
        }
    }
}

pub const MAX_SSS_INTERSECTIONS: usize = 4;

/// Fixed-capacity bag of hits along one subsurface probe ray. Keeps the
/// nearest `MAX_SSS_INTERSECTIONS` hits; when full, the entry with the
/// largest `t` is evicted.
#[derive(Debug, Default, Clone)]
pub struct BssrdfIntersections {
    pub hits: Vec<SurfaceInteraction>,
    pub maxt: Float,
}

impl BssrdfIntersections {
    pub fn new() -> Self {
        BssrdfIntersections {
            hits: Vec::with_capacity(MAX_SSS_INTERSECTIONS),
            maxt: 0.0 as Float,
        }
    }
    pub fn len(&self) -> usize {
        self.hits.len()
    }
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
    pub fn is_full(&self) -> bool {
        self.hits.len() == MAX_SSS_INTERSECTIONS
    }
    pub fn add(&mut self, hit: SurfaceInteraction) {
        if self.hits.len() < MAX_SSS_INTERSECTIONS {
            self.maxt = self.maxt.max(hit.t);
            self.hits.push(hit);
            return;
        }
        if hit.t >= self.maxt {
            return;
        }
        // evict the hit with the largest t
        let mut worst: usize = 0;
        for i in 1..self.hits.len() {
            if self.hits[i].t > self.hits[worst].t {
                worst = i;
            }
        }
        self.hits[worst] = hit;
        self.maxt = self
            .hits
            .iter()
            .fold(0.0 as Float, |acc, h| acc.max(h.t));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit_at(t: Float) -> SurfaceInteraction {
        SurfaceInteraction {
            t,
            primitive: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn bag_evicts_largest_t() {
        let mut bag = BssrdfIntersections::new();
        for t in [4.0, 1.0, 3.0, 2.0] {
            bag.add(hit_at(t));
        }
        assert!(bag.is_full());
        assert_eq!(bag.maxt, 4.0);
        // 0.5 replaces the t = 4 entry
        bag.add(hit_at(0.5));
        assert_eq!(bag.len(), MAX_SSS_INTERSECTIONS);
        assert_eq!(bag.maxt, 3.0);
        // a hit beyond maxt is ignored
        bag.add(hit_at(9.0));
        assert_eq!(bag.maxt, 3.0);
    }

    #[test]
    fn no_hit_encoding() {
        let isect = SurfaceInteraction::no_hit();
        assert!(!isect.is_hit());
        assert!(isect.t.is_infinite());
    }
}
