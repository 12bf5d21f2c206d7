//! Lane-packed structure-of-arrays geometry. One ray is tested against `K`
//! boxes, triangles, or line segments at a time; `K` is 4 for the QBVH and
//! 8 for the OBVH. The packs are plain fixed-size arrays written so the
//! per-lane loops vectorize, and the scalar shape tests remain the oracle:
//! both paths evaluate the same formulas and must agree on every lane.

// spica
use crate::core::base::Float;
use crate::core::geometry::{Bounds3f, Point3f, Ray, Vector3f};

/// A lane that must fail every slab test: min = +inf, max = -inf.
const EMPTY_MIN: Float = std::f32::INFINITY;
const EMPTY_MAX: Float = std::f32::NEG_INFINITY;

/// SIMD-replicated ray fields, materialized once per traversal.
#[derive(Debug, Copy, Clone)]
pub struct RayPack<const K: usize> {
    pub o_x: [Float; K],
    pub o_y: [Float; K],
    pub o_z: [Float; K],
    pub inv_d_x: [Float; K],
    pub inv_d_y: [Float; K],
    pub inv_d_z: [Float; K],
    pub t_min: Float,
}

impl<const K: usize> RayPack<K> {
    pub fn from_ray(ray: &Ray) -> Self {
        RayPack {
            o_x: [ray.o.x; K],
            o_y: [ray.o.y; K],
            o_z: [ray.o.z; K],
            inv_d_x: [ray.inv_d.x; K],
            inv_d_y: [ray.inv_d.y; K],
            inv_d_z: [ray.inv_d.z; K],
            t_min: ray.t_min,
        }
    }
}

/// `K` axis-aligned boxes in structure-of-arrays layout.
#[derive(Debug, Copy, Clone)]
pub struct BoundsPack<const K: usize> {
    pub min_x: [Float; K],
    pub min_y: [Float; K],
    pub min_z: [Float; K],
    pub max_x: [Float; K],
    pub max_y: [Float; K],
    pub max_z: [Float; K],
}

impl<const K: usize> Default for BoundsPack<K> {
    fn default() -> Self {
        BoundsPack {
            min_x: [EMPTY_MIN; K],
            min_y: [EMPTY_MIN; K],
            min_z: [EMPTY_MIN; K],
            max_x: [EMPTY_MAX; K],
            max_y: [EMPTY_MAX; K],
            max_z: [EMPTY_MAX; K],
        }
    }
}

impl<const K: usize> BoundsPack<K> {
    pub fn set_lane(&mut self, lane: usize, b: &Bounds3f) {
        self.min_x[lane] = b.p_min.x;
        self.min_y[lane] = b.p_min.y;
        self.min_z[lane] = b.p_min.z;
        self.max_x[lane] = b.p_max.x;
        self.max_y[lane] = b.p_max.y;
        self.max_z[lane] = b.p_max.z;
    }
    /// K-wide slab test. Bit `i` of the returned mask is set iff lane `i`
    /// is hit with an entry parameter inside `[t_min, t_max]`; `t_near[i]`
    /// holds that entry parameter for set lanes.
    pub fn intersect(&self, ray: &RayPack<K>, t_max: Float, t_near: &mut [Float; K]) -> u32 {
        let mut mask: u32 = 0;
        for i in 0..K {
            let tx0 = (self.min_x[i] - ray.o_x[i]) * ray.inv_d_x[i];
            let tx1 = (self.max_x[i] - ray.o_x[i]) * ray.inv_d_x[i];
            let ty0 = (self.min_y[i] - ray.o_y[i]) * ray.inv_d_y[i];
            let ty1 = (self.max_y[i] - ray.o_y[i]) * ray.inv_d_y[i];
            let tz0 = (self.min_z[i] - ray.o_z[i]) * ray.inv_d_z[i];
            let tz1 = (self.max_z[i] - ray.o_z[i]) * ray.inv_d_z[i];
            let t0 = tx0
                .min(tx1)
                .max(ty0.min(ty1))
                .max(tz0.min(tz1))
                .max(ray.t_min);
            let t1 = tx0.max(tx1).min(ty0.max(ty1)).min(tz0.max(tz1)).min(t_max);
            if t0 <= t1 {
                t_near[i] = t0;
                mask |= 1_u32 << i;
            }
        }
        mask
    }
}

/// A packed triangle hit: hit parameter, barycentrics, and the lane index.
#[derive(Debug, Default, Copy, Clone)]
pub struct PackHit {
    pub t: Float,
    pub b1: Float,
    pub b2: Float,
    pub lane: usize,
}

/// `K` triangles (point + two edges) in structure-of-arrays layout, with
/// the primitive index each lane came from. Lanes past `count` are padding
/// and carry degenerate edges that fail the determinant test.
#[derive(Debug, Copy, Clone)]
pub struct TrianglePack<const K: usize> {
    pub p0_x: [Float; K],
    pub p0_y: [Float; K],
    pub p0_z: [Float; K],
    pub e1_x: [Float; K],
    pub e1_y: [Float; K],
    pub e1_z: [Float; K],
    pub e2_x: [Float; K],
    pub e2_y: [Float; K],
    pub e2_z: [Float; K],
    pub prim: [u32; K],
    pub count: usize,
}

impl<const K: usize> Default for TrianglePack<K> {
    fn default() -> Self {
        TrianglePack {
            p0_x: [0.0; K],
            p0_y: [0.0; K],
            p0_z: [0.0; K],
            e1_x: [0.0; K],
            e1_y: [0.0; K],
            e1_z: [0.0; K],
            e2_x: [0.0; K],
            e2_y: [0.0; K],
            e2_z: [0.0; K],
            prim: [u32::max_value(); K],
            count: 0,
        }
    }
}

impl<const K: usize> TrianglePack<K> {
    pub fn set_lane(&mut self, lane: usize, p0: &Point3f, p1: &Point3f, p2: &Point3f, prim: u32) {
        self.p0_x[lane] = p0.x;
        self.p0_y[lane] = p0.y;
        self.p0_z[lane] = p0.z;
        self.e1_x[lane] = p1.x - p0.x;
        self.e1_y[lane] = p1.y - p0.y;
        self.e1_z[lane] = p1.z - p0.z;
        self.e2_x[lane] = p2.x - p0.x;
        self.e2_y[lane] = p2.y - p0.y;
        self.e2_z[lane] = p2.z - p0.z;
        self.prim[lane] = prim;
        self.count = self.count.max(lane + 1);
    }
    /// Moller-Trumbore over all lanes; returns the nearest accepted hit.
    pub fn intersect(&self, ray: &Ray) -> Option<PackHit> {
        let mut best: Option<PackHit> = None;
        let mut t_max: Float = ray.t_max.get();
        for i in 0..self.count {
            // pvec = d x e2
            let px = ray.d.y * self.e2_z[i] - ray.d.z * self.e2_y[i];
            let py = ray.d.z * self.e2_x[i] - ray.d.x * self.e2_z[i];
            let pz = ray.d.x * self.e2_y[i] - ray.d.y * self.e2_x[i];
            let det = self.e1_x[i] * px + self.e1_y[i] * py + self.e1_z[i] * pz;
            if det.abs() < 1e-12 {
                continue;
            }
            let inv_det = 1.0 as Float / det;
            let tx = ray.o.x - self.p0_x[i];
            let ty = ray.o.y - self.p0_y[i];
            let tz = ray.o.z - self.p0_z[i];
            let b1 = (tx * px + ty * py + tz * pz) * inv_det;
            if !(0.0..=1.0).contains(&b1) {
                continue;
            }
            // qvec = tvec x e1
            let qx = ty * self.e1_z[i] - tz * self.e1_y[i];
            let qy = tz * self.e1_x[i] - tx * self.e1_z[i];
            let qz = tx * self.e1_y[i] - ty * self.e1_x[i];
            let b2 = (ray.d.x * qx + ray.d.y * qy + ray.d.z * qz) * inv_det;
            if b2 < 0.0 || b1 + b2 > 1.0 {
                continue;
            }
            let t = (self.e2_x[i] * qx + self.e2_y[i] * qy + self.e2_z[i] * qz) * inv_det;
            if t < ray.t_min || t > t_max {
                continue;
            }
            t_max = t;
            best = Some(PackHit {
                t,
                b1,
                b2,
                lane: i,
            });
        }
        best
    }
    /// Returns as soon as one lane reports a hit.
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        for i in 0..self.count {
            let px = ray.d.y * self.e2_z[i] - ray.d.z * self.e2_y[i];
            let py = ray.d.z * self.e2_x[i] - ray.d.x * self.e2_z[i];
            let pz = ray.d.x * self.e2_y[i] - ray.d.y * self.e2_x[i];
            let det = self.e1_x[i] * px + self.e1_y[i] * py + self.e1_z[i] * pz;
            if det.abs() < 1e-12 {
                continue;
            }
            let inv_det = 1.0 as Float / det;
            let tx = ray.o.x - self.p0_x[i];
            let ty = ray.o.y - self.p0_y[i];
            let tz = ray.o.z - self.p0_z[i];
            let b1 = (tx * px + ty * py + tz * pz) * inv_det;
            if !(0.0..=1.0).contains(&b1) {
                continue;
            }
            let qx = ty * self.e1_z[i] - tz * self.e1_y[i];
            let qy = tz * self.e1_x[i] - tx * self.e1_z[i];
            let qz = tx * self.e1_y[i] - ty * self.e1_x[i];
            let b2 = (ray.d.x * qx + ray.d.y * qy + ray.d.z * qz) * inv_det;
            if b2 < 0.0 || b1 + b2 > 1.0 {
                continue;
            }
            let t = (self.e2_x[i] * qx + self.e2_y[i] * qy + self.e2_z[i] * qz) * inv_det;
            if t >= ray.t_min && t <= ray.t_max.get() {
                return true;
            }
        }
        false
    }
}

/// `K` hair segments in structure-of-arrays layout.
#[derive(Debug, Copy, Clone)]
pub struct LinePack<const K: usize> {
    pub p0_x: [Float; K],
    pub p0_y: [Float; K],
    pub p0_z: [Float; K],
    pub p1_x: [Float; K],
    pub p1_y: [Float; K],
    pub p1_z: [Float; K],
    pub width0: [Float; K],
    pub width1: [Float; K],
    pub prim: [u32; K],
    pub count: usize,
}

impl<const K: usize> Default for LinePack<K> {
    fn default() -> Self {
        LinePack {
            p0_x: [0.0; K],
            p0_y: [0.0; K],
            p0_z: [0.0; K],
            p1_x: [0.0; K],
            p1_y: [0.0; K],
            p1_z: [0.0; K],
            width0: [0.0; K],
            width1: [0.0; K],
            prim: [u32::max_value(); K],
            count: 0,
        }
    }
}

impl<const K: usize> LinePack<K> {
    #[allow(clippy::too_many_arguments)]
    pub fn set_lane(
        &mut self,
        lane: usize,
        p0: &Point3f,
        p1: &Point3f,
        w0: Float,
        w1: Float,
        prim: u32,
    ) {
        self.p0_x[lane] = p0.x;
        self.p0_y[lane] = p0.y;
        self.p0_z[lane] = p0.z;
        self.p1_x[lane] = p1.x;
        self.p1_y[lane] = p1.y;
        self.p1_z[lane] = p1.z;
        self.width0[lane] = w0;
        self.width1[lane] = w1;
        self.prim[lane] = prim;
        self.count = self.count.max(lane + 1);
    }
    /// Closest-approach segment test per lane (see `shapes::line` for the
    /// scalar derivation); returns the nearest accepted hit.
    pub fn intersect(&self, ray: &Ray) -> Option<(Float, Float, usize)> {
        let mut best: Option<(Float, Float, usize)> = None;
        let mut t_max: Float = ray.t_max.get();
        for i in 0..self.count {
            let p0 = Point3f {
                x: self.p0_x[i],
                y: self.p0_y[i],
                z: self.p0_z[i],
            };
            let axis = Vector3f {
                x: self.p1_x[i] - self.p0_x[i],
                y: self.p1_y[i] - self.p0_y[i],
                z: self.p1_z[i] - self.p0_z[i],
            };
            if let Some((t, s)) =
                crate::shapes::line::ray_segment_nearest(ray, &p0, &axis, self.width0[i], self.width1[i])
            {
                if t >= ray.t_min && t <= t_max {
                    t_max = t;
                    best = Some((t, s, i));
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Bounds3f;

    fn unit_box(offset: Float) -> Bounds3f {
        Bounds3f::new(
            Point3f {
                x: -1.0 + offset,
                y: -1.0,
                z: -1.0,
            },
            Point3f {
                x: 1.0 + offset,
                y: 1.0,
                z: 1.0,
            },
        )
    }

    #[test]
    fn packed_slab_matches_scalar() {
        let boxes: Vec<Bounds3f> = (0..4).map(|i| unit_box(i as Float * 3.0)).collect();
        let mut pack: BoundsPack<4> = BoundsPack::default();
        for (i, b) in boxes.iter().enumerate() {
            pack.set_lane(i, b);
        }
        let ray = Ray::new(
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
        let rp: RayPack<4> = RayPack::from_ray(&ray);
        let mut t_near = [0.0 as Float; 4];
        let mask = pack.intersect(&rp, ray.t_max.get(), &mut t_near);
        for (i, b) in boxes.iter().enumerate() {
            let scalar = b.intersect_span(&ray);
            let lane_hit = mask & (1 << i) != 0;
            assert_eq!(scalar >= 0.0, lane_hit, "lane {}", i);
            if lane_hit {
                assert!((scalar - t_near[i]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn empty_lanes_never_hit() {
        let mut pack: BoundsPack<8> = BoundsPack::default();
        pack.set_lane(0, &unit_box(0.0));
        let ray = Ray::new(
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
        let rp: RayPack<8> = RayPack::from_ray(&ray);
        let mut t_near = [0.0 as Float; 8];
        let mask = pack.intersect(&rp, ray.t_max.get(), &mut t_near);
        assert_eq!(mask, 1);
    }

    #[test]
    fn packed_triangles_pick_nearest() {
        let mut pack: TrianglePack<4> = TrianglePack::default();
        // two parallel triangles at z = 2 and z = 1; the nearer one wins
        for (lane, z) in [(0_usize, 2.0 as Float), (1_usize, 1.0 as Float)] {
            pack.set_lane(
                lane,
                &Point3f {
                    x: -1.0,
                    y: -1.0,
                    z,
                },
                &Point3f { x: 1.0, y: -1.0, z },
                &Point3f { x: 0.0, y: 1.0, z },
                lane as u32,
            );
        }
        let ray = Ray::new(
            Point3f::default(),
            Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        );
        let hit = pack.intersect(&ray).unwrap();
        assert_eq!(hit.lane, 1);
        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!(pack.intersect_p(&ray));
    }
}
