//! Points, vectors, normals, bounding boxes, and rays, plus the scalar
//! ray/box slab test the accelerator builds on.

// std
use std::cell::Cell;
use std::ops;
use std::ops::{Index, IndexMut};
// others
use serde::{Deserialize, Serialize};
// spica
use crate::core::base::{clamp_t, gamma, Float};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum XYEnum {
    X = 0,
    Y = 1,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum XYZEnum {
    X = 0,
    Y = 1,
    Z = 2,
}

impl From<u8> for XYZEnum {
    fn from(d: u8) -> Self {
        match d {
            0 => XYZEnum::X,
            1 => XYZEnum::Y,
            _ => XYZEnum::Z,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector2f {
    pub x: Float,
    pub y: Float,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point2f {
    pub x: Float,
    pub y: Float,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point2i {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector3f {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point3f {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normal3f {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl_op_ex!(+|a: &Vector2f, b: &Vector2f| -> Vector2f {
    Vector2f { x: a.x + b.x, y: a.y + b.y }
});
impl_op_ex!(-|a: &Point2f, b: &Point2f| -> Vector2f {
    Vector2f { x: a.x - b.x, y: a.y - b.y }
});
impl_op_ex!(-|a: &Point2f, b: &Vector2f| -> Point2f {
    Point2f { x: a.x - b.x, y: a.y - b.y }
});
impl_op_ex!(+|a: &Point2f, b: &Vector2f| -> Point2f {
    Point2f { x: a.x + b.x, y: a.y + b.y }
});
impl_op_ex_commutative!(*|a: &Point2f, b: Float| -> Point2f {
    Point2f { x: a.x * b, y: a.y * b }
});

impl_op_ex!(+|a: &Vector3f, b: &Vector3f| -> Vector3f {
    Vector3f { x: a.x + b.x, y: a.y + b.y, z: a.z + b.z }
});
impl_op_ex!(-|a: &Vector3f, b: &Vector3f| -> Vector3f {
    Vector3f { x: a.x - b.x, y: a.y - b.y, z: a.z - b.z }
});
impl_op_ex!(-|a: &Vector3f| -> Vector3f { Vector3f { x: -a.x, y: -a.y, z: -a.z } });
impl_op_ex_commutative!(*|a: &Vector3f, b: Float| -> Vector3f {
    Vector3f { x: a.x * b, y: a.y * b, z: a.z * b }
});
impl_op_ex!(/|a: &Vector3f, b: Float| -> Vector3f {
    let inv = 1.0 as Float / b;
    Vector3f { x: a.x * inv, y: a.y * inv, z: a.z * inv }
});
impl_op_ex!(+=|a: &mut Vector3f, b: &Vector3f| { a.x += b.x; a.y += b.y; a.z += b.z; });

impl_op_ex!(+|a: &Point3f, b: &Vector3f| -> Point3f {
    Point3f { x: a.x + b.x, y: a.y + b.y, z: a.z + b.z }
});
impl_op_ex!(+|a: &Point3f, b: &Point3f| -> Point3f {
    Point3f { x: a.x + b.x, y: a.y + b.y, z: a.z + b.z }
});
impl_op_ex!(-|a: &Point3f, b: &Point3f| -> Vector3f {
    Vector3f { x: a.x - b.x, y: a.y - b.y, z: a.z - b.z }
});
impl_op_ex!(-|a: &Point3f, b: &Vector3f| -> Point3f {
    Point3f { x: a.x - b.x, y: a.y - b.y, z: a.z - b.z }
});
impl_op_ex_commutative!(*|a: &Point3f, b: Float| -> Point3f {
    Point3f { x: a.x * b, y: a.y * b, z: a.z * b }
});
impl_op_ex!(+=|a: &mut Point3f, b: &Vector3f| { a.x += b.x; a.y += b.y; a.z += b.z; });
impl_op_ex!(*=|a: &mut Point3f, b: Float| { a.x *= b; a.y *= b; a.z *= b; });

impl_op_ex!(+|a: &Normal3f, b: &Normal3f| -> Normal3f {
    Normal3f { x: a.x + b.x, y: a.y + b.y, z: a.z + b.z }
});
impl_op_ex!(-|a: &Normal3f| -> Normal3f { Normal3f { x: -a.x, y: -a.y, z: -a.z } });
impl_op_ex_commutative!(*|a: &Normal3f, b: Float| -> Normal3f {
    Normal3f { x: a.x * b, y: a.y * b, z: a.z * b }
});

impl Index<XYEnum> for Point2f {
    type Output = Float;
    fn index(&self, i: XYEnum) -> &Float {
        match i {
            XYEnum::X => &self.x,
            _ => &self.y,
        }
    }
}

impl Index<XYZEnum> for Vector3f {
    type Output = Float;
    fn index(&self, i: XYZEnum) -> &Float {
        match i {
            XYZEnum::X => &self.x,
            XYZEnum::Y => &self.y,
            _ => &self.z,
        }
    }
}

impl IndexMut<XYZEnum> for Vector3f {
    fn index_mut(&mut self, i: XYZEnum) -> &mut Float {
        match i {
            XYZEnum::X => &mut self.x,
            XYZEnum::Y => &mut self.y,
            _ => &mut self.z,
        }
    }
}

impl Index<XYZEnum> for Point3f {
    type Output = Float;
    fn index(&self, i: XYZEnum) -> &Float {
        match i {
            XYZEnum::X => &self.x,
            XYZEnum::Y => &self.y,
            _ => &self.z,
        }
    }
}

impl From<Normal3f> for Vector3f {
    fn from(n: Normal3f) -> Self {
        Vector3f {
            x: n.x,
            y: n.y,
            z: n.z,
        }
    }
}

impl From<Vector3f> for Normal3f {
    fn from(v: Vector3f) -> Self {
        Normal3f {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Point3f> for Vector3f {
    fn from(p: Point3f) -> Self {
        Vector3f {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

impl Vector3f {
    pub fn length_squared(&self) -> Float {
        self.x * self.x + self.y * self.y + self.z * self.z
    }
    pub fn length(&self) -> Float {
        self.length_squared().sqrt()
    }
    pub fn normalize(&self) -> Vector3f {
        *self / self.length()
    }
    pub fn abs(&self) -> Vector3f {
        Vector3f {
            x: self.x.abs(),
            y: self.y.abs(),
            z: self.z.abs(),
        }
    }
    pub fn max_component(&self) -> Float {
        self.x.max(self.y.max(self.z))
    }
    pub fn max_dimension(&self) -> XYZEnum {
        if self.x > self.y {
            if self.x > self.z {
                XYZEnum::X
            } else {
                XYZEnum::Z
            }
        } else if self.y > self.z {
            XYZEnum::Y
        } else {
            XYZEnum::Z
        }
    }
}

impl Normal3f {
    pub fn length_squared(&self) -> Float {
        self.x * self.x + self.y * self.y + self.z * self.z
    }
    pub fn length(&self) -> Float {
        self.length_squared().sqrt()
    }
    pub fn normalize(&self) -> Normal3f {
        let inv = 1.0 as Float / self.length();
        Normal3f {
            x: self.x * inv,
            y: self.y * inv,
            z: self.z * inv,
        }
    }
}

pub fn vec3_dot_vec3f(a: &Vector3f, b: &Vector3f) -> Float {
    a.x * b.x + a.y * b.y + a.z * b.z
}

pub fn vec3_abs_dot_vec3f(a: &Vector3f, b: &Vector3f) -> Float {
    vec3_dot_vec3f(a, b).abs()
}

pub fn vec3_dot_nrmf(a: &Vector3f, b: &Normal3f) -> Float {
    a.x * b.x + a.y * b.y + a.z * b.z
}

pub fn vec3_abs_dot_nrmf(a: &Vector3f, b: &Normal3f) -> Float {
    vec3_dot_nrmf(a, b).abs()
}

pub fn nrm_dot_vec3f(a: &Normal3f, b: &Vector3f) -> Float {
    a.x * b.x + a.y * b.y + a.z * b.z
}

pub fn nrm_dot_nrmf(a: &Normal3f, b: &Normal3f) -> Float {
    a.x * b.x + a.y * b.y + a.z * b.z
}

pub fn vec3_cross_vec3(a: &Vector3f, b: &Vector3f) -> Vector3f {
    // double precision guards against catastrophic cancellation
    let (ax, ay, az) = (a.x as f64, a.y as f64, a.z as f64);
    let (bx, by, bz) = (b.x as f64, b.y as f64, b.z as f64);
    Vector3f {
        x: (ay * bz - az * by) as Float,
        y: (az * bx - ax * bz) as Float,
        z: (ax * by - ay * bx) as Float,
    }
}

pub fn nrm_cross_vec3(a: &Normal3f, b: &Vector3f) -> Vector3f {
    vec3_cross_vec3(&Vector3f::from(*a), b)
}

pub fn nrm_faceforward_vec3(n: &Normal3f, v: &Vector3f) -> Normal3f {
    if nrm_dot_vec3f(n, v) < 0.0 as Float {
        -(*n)
    } else {
        *n
    }
}

pub fn nrm_faceforward_nrm(n: &Normal3f, n2: &Normal3f) -> Normal3f {
    if nrm_dot_nrmf(n, n2) < 0.0 as Float {
        -(*n)
    } else {
        *n
    }
}

/// Construct an orthonormal basis around `v1` (assumed normalized).
pub fn vec3_coordinate_system(v1: &Vector3f, v2: &mut Vector3f, v3: &mut Vector3f) {
    if v1.x.abs() > v1.y.abs() {
        *v2 = Vector3f {
            x: -v1.z,
            y: 0.0,
            z: v1.x,
        } / (v1.x * v1.x + v1.z * v1.z).sqrt();
    } else {
        *v2 = Vector3f {
            x: 0.0,
            y: v1.z,
            z: -v1.y,
        } / (v1.y * v1.y + v1.z * v1.z).sqrt();
    }
    *v3 = vec3_cross_vec3(v1, v2);
}

pub fn pnt3_distancef(p1: &Point3f, p2: &Point3f) -> Float {
    (p1 - p2).length()
}

pub fn pnt3_distance_squaredf(p1: &Point3f, p2: &Point3f) -> Float {
    (p1 - p2).length_squared()
}

pub fn spherical_direction(sin_theta: Float, cos_theta: Float, phi: Float) -> Vector3f {
    Vector3f {
        x: sin_theta * phi.cos(),
        y: sin_theta * phi.sin(),
        z: cos_theta,
    }
}

pub fn spherical_direction_vec3(
    sin_theta: Float,
    cos_theta: Float,
    phi: Float,
    x: &Vector3f,
    y: &Vector3f,
    z: &Vector3f,
) -> Vector3f {
    *x * (sin_theta * phi.cos()) + *y * (sin_theta * phi.sin()) + *z * cos_theta
}

/// Offset a spawned ray origin along the surface normal so that it does not
/// immediately re-intersect the surface it left.
pub fn pnt3_offset_ray_origin(p: &Point3f, n: &Normal3f, w: &Vector3f) -> Point3f {
    let d: Float = vec3_abs_dot_nrmf(w, n) * gamma(7) + crate::core::base::SHADOW_EPSILON;
    let mut offset: Vector3f = Vector3f::from(*n) * d;
    if vec3_dot_nrmf(w, n) < 0.0 as Float {
        offset = -offset;
    }
    *p + offset
}

#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize)]
pub struct Bounds2i {
    pub p_min: Point2i,
    pub p_max: Point2i,
}

impl Bounds2i {
    pub fn new(p_min: Point2i, p_max: Point2i) -> Self {
        Bounds2i { p_min, p_max }
    }
    pub fn area(&self) -> i32 {
        (self.p_max.x - self.p_min.x) * (self.p_max.y - self.p_min.y)
    }
    pub fn inside_exclusive(&self, p: Point2i) -> bool {
        p.x >= self.p_min.x && p.x < self.p_max.x && p.y >= self.p_min.y && p.y < self.p_max.y
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Bounds3f {
    pub p_min: Point3f,
    pub p_max: Point3f,
}

impl Default for Bounds3f {
    fn default() -> Self {
        // an inverted box unions correctly with everything
        Bounds3f {
            p_min: Point3f {
                x: std::f32::INFINITY,
                y: std::f32::INFINITY,
                z: std::f32::INFINITY,
            },
            p_max: Point3f {
                x: std::f32::NEG_INFINITY,
                y: std::f32::NEG_INFINITY,
                z: std::f32::NEG_INFINITY,
            },
        }
    }
}

impl Bounds3f {
    pub fn new(p1: Point3f, p2: Point3f) -> Self {
        Bounds3f {
            p_min: Point3f {
                x: p1.x.min(p2.x),
                y: p1.y.min(p2.y),
                z: p1.z.min(p2.z),
            },
            p_max: Point3f {
                x: p1.x.max(p2.x),
                y: p1.y.max(p2.y),
                z: p1.z.max(p2.z),
            },
        }
    }
    pub fn diagonal(&self) -> Vector3f {
        self.p_max - self.p_min
    }
    pub fn centroid(&self) -> Point3f {
        self.p_min * 0.5 + self.p_max * 0.5
    }
    pub fn surface_area(&self) -> Float {
        if self.p_max.x < self.p_min.x {
            return 0.0 as Float;
        }
        let d: Vector3f = self.diagonal();
        2.0 as Float * (d.x * d.y + d.x * d.z + d.y * d.z)
    }
    pub fn maximum_extent(&self) -> u8 {
        let d: Vector3f = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0_u8
        } else if d.y > d.z {
            1_u8
        } else {
            2_u8
        }
    }
    pub fn offset(&self, p: &Point3f) -> Vector3f {
        let mut o: Vector3f = p - &self.p_min;
        if self.p_max.x > self.p_min.x {
            o.x /= self.p_max.x - self.p_min.x;
        }
        if self.p_max.y > self.p_min.y {
            o.y /= self.p_max.y - self.p_min.y;
        }
        if self.p_max.z > self.p_min.z {
            o.z /= self.p_max.z - self.p_min.z;
        }
        o
    }
    pub fn bounding_sphere(&self, center: &mut Point3f, radius: &mut Float) {
        *center = self.p_min * 0.5 + self.p_max * 0.5;
        *radius = if pnt3_inside_bnd3(center, self) {
            pnt3_distancef(center, &self.p_max)
        } else {
            0.0
        };
    }
    /// Slab test. Returns the entry parameter of the ray against the box
    /// clamped to `ray.t_min`, or a negative value on a miss. A ray whose
    /// origin is inside the box reports its `t_min` (0 for primary rays).
    pub fn intersect_span(&self, ray: &Ray) -> Float {
        let mut t0: Float = ray.t_min;
        let mut t1: Float = ray.t_max.get();
        for i in 0..3_u8 {
            let axis = XYZEnum::from(i);
            let inv_d: Float = ray.inv_d[axis];
            let mut t_near: Float = (self.p_min[axis] - ray.o[axis]) * inv_d;
            let mut t_far: Float = (self.p_max[axis] - ray.o[axis]) * inv_d;
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }
            // widen t_far to keep borderline hits
            t_far *= 1.0 as Float + 2.0 as Float * gamma(3);
            t0 = if t_near > t0 { t_near } else { t0 };
            t1 = if t_far < t1 { t_far } else { t1 };
            if t0 > t1 {
                return -1.0 as Float;
            }
        }
        t0
    }
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        self.intersect_span(ray) >= 0.0 as Float
    }
}

pub fn bnd3_union_bnd3f(b1: &Bounds3f, b2: &Bounds3f) -> Bounds3f {
    Bounds3f {
        p_min: Point3f {
            x: b1.p_min.x.min(b2.p_min.x),
            y: b1.p_min.y.min(b2.p_min.y),
            z: b1.p_min.z.min(b2.p_min.z),
        },
        p_max: Point3f {
            x: b1.p_max.x.max(b2.p_max.x),
            y: b1.p_max.y.max(b2.p_max.y),
            z: b1.p_max.z.max(b2.p_max.z),
        },
    }
}

pub fn bnd3_union_pnt3f(b: &Bounds3f, p: &Point3f) -> Bounds3f {
    Bounds3f {
        p_min: Point3f {
            x: b.p_min.x.min(p.x),
            y: b.p_min.y.min(p.y),
            z: b.p_min.z.min(p.z),
        },
        p_max: Point3f {
            x: b.p_max.x.max(p.x),
            y: b.p_max.y.max(p.y),
            z: b.p_max.z.max(p.z),
        },
    }
}

pub fn bnd3_expand(b: &Bounds3f, delta: Float) -> Bounds3f {
    Bounds3f {
        p_min: b.p_min
            - Vector3f {
                x: delta,
                y: delta,
                z: delta,
            },
        p_max: b.p_max
            + Vector3f {
                x: delta,
                y: delta,
                z: delta,
            },
    }
}

pub fn pnt3_inside_bnd3(p: &Point3f, b: &Bounds3f) -> bool {
    p.x >= b.p_min.x
        && p.x <= b.p_max.x
        && p.y >= b.p_min.y
        && p.y <= b.p_max.y
        && p.z >= b.p_min.z
        && p.z <= b.p_max.z
}

/// A ray with precomputed reciprocal direction and per-axis sign bits for
/// slab tests. `t_max` shrinks as closer hits are found.
#[derive(Debug, Clone)]
pub struct Ray {
    pub o: Point3f,
    pub d: Vector3f,
    pub t_min: Float,
    pub t_max: Cell<Float>,
    pub inv_d: Vector3f,
    pub dir_is_neg: [u8; 3],
}

impl Default for Ray {
    fn default() -> Self {
        Ray::new(
            Point3f::default(),
            Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        )
    }
}

impl Ray {
    pub fn new(o: Point3f, d: Vector3f) -> Self {
        Ray::new_with_span(o, d, 0.0 as Float, std::f32::INFINITY)
    }
    pub fn new_with_span(o: Point3f, d: Vector3f, t_min: Float, t_max: Float) -> Self {
        let inv_d = Vector3f {
            x: 1.0 as Float / d.x,
            y: 1.0 as Float / d.y,
            z: 1.0 as Float / d.z,
        };
        Ray {
            o,
            d,
            t_min,
            t_max: Cell::new(t_max),
            inv_d,
            dir_is_neg: [
                (inv_d.x < 0.0) as u8,
                (inv_d.y < 0.0) as u8,
                (inv_d.z < 0.0) as u8,
            ],
        }
    }
    pub fn position(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}

pub fn clamp_point01(p: Point2f) -> Point2f {
    Point2f {
        x: clamp_t(p.x, 0.0, 1.0),
        y: clamp_t(p.y, 0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slab_test_hits_and_misses() {
        let b = Bounds3f::new(
            Point3f {
                x: -1.0,
                y: -1.0,
                z: -1.0,
            },
            Point3f {
                x: 1.0,
                y: 1.0,
                z: 1.0,
            },
        );
        let hit = Ray::new(
            Point3f {
                x: 0.0,
                y: 0.0,
                z: -5.0,
            },
            Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        );
        let t = b.intersect_span(&hit);
        assert!((t - 4.0).abs() < 1e-4);
        let miss = Ray::new(
            Point3f {
                x: 0.0,
                y: 5.0,
                z: -5.0,
            },
            Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        );
        assert!(b.intersect_span(&miss) < 0.0);
        // origin inside the box reports the near end of the span
        let inside = Ray::new(
            Point3f::default(),
            Vector3f {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            },
        );
        assert_eq!(b.intersect_span(&inside), 0.0);
    }

    #[test]
    fn coordinate_system_is_orthonormal() {
        let v1 = Vector3f {
            x: 0.3,
            y: -0.5,
            z: 0.8,
        }
        .normalize();
        let mut v2 = Vector3f::default();
        let mut v3 = Vector3f::default();
        vec3_coordinate_system(&v1, &mut v2, &mut v3);
        assert!(vec3_dot_vec3f(&v1, &v2).abs() < 1e-5);
        assert!(vec3_dot_vec3f(&v1, &v3).abs() < 1e-5);
        assert!((v2.length() - 1.0).abs() < 1e-5);
        assert!((v3.length() - 1.0).abs() < 1e-5);
    }
}
