//! Analytic disks.

// std
use std::f32::consts::PI;
// spica
use crate::core::base::Float;
use crate::core::geometry::{
    bnd3_expand, vec3_coordinate_system, vec3_dot_vec3f, Bounds3f, Normal3f, Point2f, Point3f,
    Ray, Vector3f,
};
use crate::core::interaction::SurfaceInteraction;
use crate::core::sampling::concentric_sample_disk;

#[derive(Debug, Clone)]
pub struct Disk {
    pub center: Point3f,
    pub normal: Normal3f,
    pub radius: Float,
}

impl Disk {
    pub fn new(center: Point3f, normal: Normal3f, radius: Float) -> Self {
        Disk {
            center,
            normal: normal.normalize(),
            radius,
        }
    }
    fn frame(&self) -> (Vector3f, Vector3f) {
        let mut u: Vector3f = Vector3f::default();
        let mut v: Vector3f = Vector3f::default();
        vec3_coordinate_system(&Vector3f::from(self.normal), &mut u, &mut v);
        (u, v)
    }
    pub fn world_bound(&self) -> Bounds3f {
        let r = Vector3f {
            x: self.radius,
            y: self.radius,
            z: self.radius,
        };
        bnd3_expand(&Bounds3f::new(self.center - r, self.center + r), 1e-4)
    }
    pub fn area(&self) -> Float {
        PI * self.radius * self.radius
    }
    pub fn intersect(&self, ray: &Ray, t_hit: &mut Float, isect: &mut SurfaceInteraction) -> bool {
        let n: Vector3f = Vector3f::from(self.normal);
        let denom: Float = vec3_dot_vec3f(&ray.d, &n);
        if denom.abs() < 1e-9 {
            return false;
        }
        let t: Float = vec3_dot_vec3f(&(self.center - ray.o), &n) / denom;
        if t < ray.t_min || t > ray.t_max.get() {
            return false;
        }
        let p: Point3f = ray.position(t);
        if (p - self.center).length_squared() > self.radius * self.radius {
            return false;
        }
        let (u_axis, _v_axis) = self.frame();
        *t_hit = t;
        isect.t = t;
        isect.p = p;
        isect.wo = -ray.d;
        isect.n = self.normal;
        isect.shading_n = self.normal;
        isect.dpdu = u_axis;
        let local: Vector3f = p - self.center;
        isect.uv = Point2f {
            x: 0.5 + 0.5 * vec3_dot_vec3f(&local, &u_axis) / self.radius,
            y: 0.5 + 0.5 * vec3_dot_vec3f(&local, &_v_axis) / self.radius,
        };
        true
    }
    pub fn sample(&self, u: Point2f) -> (Point3f, Normal3f) {
        let d: Point2f = concentric_sample_disk(&u);
        let (u_axis, v_axis) = self.frame();
        let p: Point3f = self.center + (u_axis * d.x + v_axis * d.y) * self.radius;
        (p, self.normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_ray_hits_center() {
        let disk = Disk::new(
            Point3f {
                x: 0.0,
                y: 0.0,
                z: 2.0,
            },
            Normal3f {
                x: 0.0,
                y: 0.0,
                z: -1.0,
            },
            1.0,
        );
        let ray = Ray::new(
            Point3f::default(),
            Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        );
        let mut t_hit: Float = 0.0;
        let mut isect = SurfaceInteraction::no_hit();
        assert!(disk.intersect(&ray, &mut t_hit, &mut isect));
        assert!((t_hit - 2.0).abs() < 1e-5);
        // outside the radius: miss
        let wide = Ray::new(
            Point3f {
                x: 1.5,
                y: 0.0,
                z: 0.0,
            },
            Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        );
        assert!(!disk.intersect(&wide, &mut t_hit, &mut isect));
    }
}
