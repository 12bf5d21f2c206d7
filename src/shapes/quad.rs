//! Analytic parallelograms ("squares" in scene descriptions).

// spica
use crate::core::base::Float;
use crate::core::geometry::{
    bnd3_expand, bnd3_union_pnt3f, vec3_cross_vec3, vec3_dot_vec3f, Bounds3f, Normal3f, Point2f,
    Point3f, Ray, Vector3f,
};
use crate::core::interaction::SurfaceInteraction;

#[derive(Debug, Clone)]
pub struct Quad {
    /// One corner of the parallelogram.
    pub p: Point3f,
    pub e0: Vector3f,
    pub e1: Vector3f,
}

impl Quad {
    pub fn new(p: Point3f, e0: Vector3f, e1: Vector3f) -> Self {
        Quad { p, e0, e1 }
    }
    pub fn normal(&self) -> Normal3f {
        Normal3f::from(vec3_cross_vec3(&self.e0, &self.e1).normalize())
    }
    pub fn world_bound(&self) -> Bounds3f {
        let b = Bounds3f::new(self.p, self.p + self.e0);
        let b = bnd3_union_pnt3f(&b, &(self.p + self.e1));
        let b = bnd3_union_pnt3f(&b, &(self.p + self.e0 + self.e1));
        bnd3_expand(&b, 1e-4)
    }
    pub fn area(&self) -> Float {
        vec3_cross_vec3(&self.e0, &self.e1).length()
    }
    pub fn intersect(&self, ray: &Ray, t_hit: &mut Float, isect: &mut SurfaceInteraction) -> bool {
        let n: Vector3f = Vector3f::from(self.normal());
        let denom: Float = vec3_dot_vec3f(&ray.d, &n);
        if denom.abs() < 1e-9 {
            return false;
        }
        let t: Float = vec3_dot_vec3f(&(self.p - ray.o), &n) / denom;
        if t < ray.t_min || t > ray.t_max.get() {
            return false;
        }
        let hit: Point3f = ray.position(t);
        let local: Vector3f = hit - self.p;
        // project onto the (possibly non-orthogonal) edge basis
        let e00: Float = self.e0.length_squared();
        let e11: Float = self.e1.length_squared();
        let e01: Float = vec3_dot_vec3f(&self.e0, &self.e1);
        let det: Float = e00 * e11 - e01 * e01;
        if det.abs() < 1e-12 {
            return false;
        }
        let d0: Float = vec3_dot_vec3f(&local, &self.e0);
        let d1: Float = vec3_dot_vec3f(&local, &self.e1);
        let u: Float = (d0 * e11 - d1 * e01) / det;
        let v: Float = (d1 * e00 - d0 * e01) / det;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return false;
        }
        *t_hit = t;
        isect.t = t;
        isect.p = hit;
        isect.wo = -ray.d;
        isect.n = self.normal();
        isect.shading_n = isect.n;
        isect.dpdu = self.e0.normalize();
        isect.uv = Point2f { x: u, y: v };
        true
    }
    pub fn sample(&self, u: Point2f) -> (Point3f, Normal3f) {
        let p: Point3f = self.p + self.e0 * u.x + self.e1 * u.y;
        (p, self.normal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_inside_miss_outside() {
        let quad = Quad::new(
            Point3f {
                x: -1.0,
                y: -1.0,
                z: 3.0,
            },
            Vector3f {
                x: 2.0,
                y: 0.0,
                z: 0.0,
            },
            Vector3f {
                x: 0.0,
                y: 2.0,
                z: 0.0,
            },
        );
        let mut t_hit: Float = 0.0;
        let mut isect = SurfaceInteraction::no_hit();
        let inside = Ray::new(
            Point3f::default(),
            Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        );
        assert!(quad.intersect(&inside, &mut t_hit, &mut isect));
        assert!((t_hit - 3.0).abs() < 1e-5);
        assert!((isect.uv.x - 0.5).abs() < 1e-5);
        let outside = Ray::new(
            Point3f {
                x: 3.0,
                y: 0.0,
                z: 0.0,
            },
            Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        );
        assert!(!quad.intersect(&outside, &mut t_hit, &mut isect));
    }
}
