//! Line segments with a width profile, the geometry underneath hair.

// spica
use crate::core::base::{clamp_t, lerp, Float};
use crate::core::geometry::{
    bnd3_expand, vec3_dot_vec3f, Bounds3f, Normal3f, Point2f, Point3f, Ray, Vector3f,
};
use crate::core::interaction::SurfaceInteraction;

/// Closest-approach test between a ray and the segment `p0 + s * axis`,
/// `s` in `[0, 1]`. Accepts the hit when the distance at closest approach
/// is within the interpolated half width. Returns `(t, s)`.
pub fn ray_segment_nearest(
    ray: &Ray,
    p0: &Point3f,
    axis: &Vector3f,
    width0: Float,
    width1: Float,
) -> Option<(Float, Float)> {
    let w: Vector3f = ray.o - p0;
    let b: Float = vec3_dot_vec3f(&ray.d, axis);
    let c: Float = axis.length_squared();
    let d0: Float = vec3_dot_vec3f(&ray.d, &w);
    let e: Float = vec3_dot_vec3f(axis, &w);
    let denom: Float = c - b * b;
    // parallel ray and segment never register a hit
    if denom.abs() < 1e-9 {
        return None;
    }
    let s: Float = clamp_t((e - d0 * b) / denom, 0.0 as Float, 1.0 as Float);
    let t: Float = s * b - d0;
    if t < ray.t_min || t > ray.t_max.get() {
        return None;
    }
    let on_ray: Point3f = ray.position(t);
    let on_seg: Point3f = *p0 + *axis * s;
    let half_width: Float = 0.5 as Float * lerp(s, width0, width1);
    if (on_ray - on_seg).length_squared() > half_width * half_width {
        return None;
    }
    Some((t, s))
}

#[derive(Debug, Clone)]
pub struct LineSegment {
    pub p0: Point3f,
    pub p1: Point3f,
    pub width0: Float,
    pub width1: Float,
}

impl LineSegment {
    pub fn new(p0: Point3f, p1: Point3f, width0: Float, width1: Float) -> Self {
        LineSegment {
            p0,
            p1,
            width0,
            width1,
        }
    }
    pub fn axis(&self) -> Vector3f {
        self.p1 - self.p0
    }
    pub fn world_bound(&self) -> Bounds3f {
        bnd3_expand(
            &Bounds3f::new(self.p0, self.p1),
            0.5 as Float * self.width0.max(self.width1),
        )
    }
    pub fn area(&self) -> Float {
        // ribbon area: length times average width
        self.axis().length() * 0.5 as Float * (self.width0 + self.width1)
    }
    pub fn intersect(&self, ray: &Ray, t_hit: &mut Float, isect: &mut SurfaceInteraction) -> bool {
        let axis = self.axis();
        if let Some((t, s)) = ray_segment_nearest(ray, &self.p0, &axis, self.width0, self.width1) {
            *t_hit = t;
            self.fill_interaction(ray, t, s, isect);
            true
        } else {
            false
        }
    }
    pub fn fill_interaction(
        &self,
        ray: &Ray,
        t: Float,
        s: Float,
        isect: &mut SurfaceInteraction,
    ) {
        let on_seg: Point3f = self.p0 + self.axis() * s;
        let p: Point3f = ray.position(t);
        let mut n: Vector3f = p - on_seg;
        if n.length_squared() < 1e-12 {
            // ray went through the axis; fall back to facing the ray
            n = -ray.d;
        }
        isect.t = t;
        isect.p = p;
        isect.wo = -ray.d;
        isect.n = Normal3f::from(n.normalize());
        isect.shading_n = isect.n;
        isect.dpdu = self.axis().normalize();
        // v runs across the fiber width: 0 at one silhouette edge, 1 at
        // the other, as seen from the ray
        let side: Vector3f = crate::core::geometry::vec3_cross_vec3(&self.axis(), &ray.d);
        let half_width: Float = 0.5 as Float * lerp(s, self.width0, self.width1);
        let v: Float = if side.length_squared() > 1e-12 && half_width > 0.0 as Float {
            let offset: Float =
                vec3_dot_vec3f(&(p - on_seg), &side.normalize()) / half_width;
            0.5 as Float * (clamp_t(offset, -1.0, 1.0) + 1.0 as Float)
        } else {
            0.5
        };
        isect.uv = Point2f { x: s, y: v };
    }
    pub fn sample(&self, u: Point2f) -> (Point3f, Normal3f) {
        let s: Float = u.x;
        let p: Point3f = self.p0 + self.axis() * s;
        // orientation is ill-defined for a curve; pick a stable side
        let axis = self.axis().normalize();
        let up = if axis.z.abs() < 0.9 {
            Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            }
        } else {
            Vector3f {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            }
        };
        let n = crate::core::geometry::vec3_cross_vec3(&axis, &up).normalize();
        (p, Normal3f::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perpendicular_ray_hits_segment() {
        let seg = LineSegment::new(
            Point3f {
                x: -1.0,
                y: 0.0,
                z: 0.0,
            },
            Point3f {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            },
            0.2,
            0.2,
        );
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
        assert!(seg.intersect(&ray, &mut t_hit, &mut isect));
        assert!((t_hit - 3.0).abs() < 1e-4);
        assert!((isect.uv.x - 0.5).abs() < 1e-4);
    }

    #[test]
    fn ray_outside_width_misses() {
        let seg = LineSegment::new(
            Point3f {
                x: -1.0,
                y: 0.0,
                z: 0.0,
            },
            Point3f {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            },
            0.2,
            0.2,
        );
        let ray = Ray::new(
            Point3f {
                x: 0.0,
                y: 0.5,
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
        assert!(!seg.intersect(&ray, &mut t_hit, &mut isect));
    }
}
