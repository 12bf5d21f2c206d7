//! Analytic spheres.

// std
use std::f32::consts::PI;
// spica
use crate::core::base::{quadratic, Float};
use crate::core::geometry::{Bounds3f, Normal3f, Point2f, Point3f, Ray, Vector3f};
use crate::core::interaction::SurfaceInteraction;
use crate::core::sampling::uniform_sample_sphere;

#[derive(Debug, Clone)]
pub struct Sphere {
    pub center: Point3f,
    pub radius: Float,
}

impl Sphere {
    pub fn new(center: Point3f, radius: Float) -> Self {
        Sphere { center, radius }
    }
    pub fn world_bound(&self) -> Bounds3f {
        let r = Vector3f {
            x: self.radius,
            y: self.radius,
            z: self.radius,
        };
        Bounds3f::new(self.center - r, self.center + r)
    }
    pub fn area(&self) -> Float {
        4.0 as Float * PI * self.radius * self.radius
    }
    pub fn intersect(&self, ray: &Ray, t_hit: &mut Float, isect: &mut SurfaceInteraction) -> bool {
        // compute quadratic sphere coefficients
        let oc: Vector3f = ray.o - self.center;
        let a: Float = ray.d.length_squared();
        let b: Float = 2.0 as Float * (oc.x * ray.d.x + oc.y * ray.d.y + oc.z * ray.d.z);
        let c: Float = oc.length_squared() - self.radius * self.radius;
        let mut t0: Float = 0.0;
        let mut t1: Float = 0.0;
        if !quadratic(a, b, c, &mut t0, &mut t1) {
            return false;
        }
        // check shape t0 and t1 for nearest intersection in the span
        if t0 > ray.t_max.get() || t1 < ray.t_min {
            return false;
        }
        let mut t_shape_hit: Float = t0;
        if t_shape_hit < ray.t_min {
            t_shape_hit = t1;
            if t_shape_hit > ray.t_max.get() {
                return false;
            }
        }
        let mut p_hit: Point3f = ray.position(t_shape_hit);
        // refine the hit point back onto the sphere
        let to_hit: Vector3f = p_hit - self.center;
        p_hit = self.center + to_hit * (self.radius / to_hit.length());
        let n: Normal3f = Normal3f::from((p_hit - self.center).normalize());
        let mut phi: Float = p_hit.y - self.center.y;
        phi = phi.atan2(p_hit.x - self.center.x);
        if phi < 0.0 {
            phi += 2.0 as Float * PI;
        }
        let theta: Float =
            crate::core::base::clamp_t((p_hit.z - self.center.z) / self.radius, -1.0, 1.0).acos();
        *t_hit = t_shape_hit;
        isect.t = t_shape_hit;
        isect.p = p_hit;
        isect.wo = -ray.d;
        isect.n = n;
        isect.shading_n = n;
        // tangent along increasing phi
        isect.dpdu = Vector3f {
            x: -(p_hit.y - self.center.y),
            y: p_hit.x - self.center.x,
            z: 0.0,
        };
        if isect.dpdu.length_squared() < 1e-12 {
            isect.dpdu = Vector3f {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            };
        } else {
            isect.dpdu = isect.dpdu.normalize();
        }
        isect.uv = Point2f {
            x: phi * crate::core::base::INV_2_PI,
            y: theta * crate::core::base::INV_PI,
        };
        true
    }
    pub fn sample(&self, u: Point2f) -> (Point3f, Normal3f) {
        let d: Vector3f = uniform_sample_sphere(u);
        let p: Point3f = self.center + d * self.radius;
        (p, Normal3f::from(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_through_center() {
        let s = Sphere::new(Point3f::default(), 1.0);
        let ray = Ray::new(
            Point3f {
                x: 0.0,
                y: 0.0,
                z: -3.0,
            },
            Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        );
        let mut t_hit: Float = 0.0;
        let mut isect = SurfaceInteraction::no_hit();
        assert!(s.intersect(&ray, &mut t_hit, &mut isect));
        assert!((t_hit - 2.0).abs() < 1e-4);
        // normal points back toward the ray origin
        assert!(isect.n.z < 0.0);
    }

    #[test]
    fn origin_inside_hits_far_wall() {
        let s = Sphere::new(Point3f::default(), 1.0);
        let ray = Ray::new(
            Point3f::default(),
            Vector3f {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            },
        );
        let mut t_hit: Float = 0.0;
        let mut isect = SurfaceInteraction::no_hit();
        assert!(s.intersect(&ray, &mut t_hit, &mut isect));
        assert!((t_hit - 1.0).abs() < 1e-4);
    }
}
