//! Triangle meshes and the Moller-Trumbore intersection test.

// std
use std::sync::Arc;
// spica
use crate::core::base::Float;
use crate::core::geometry::{
    bnd3_union_pnt3f, nrm_faceforward_nrm, vec3_cross_vec3, Bounds3f, Normal3f, Point2f, Point3f,
    Ray, Vector3f,
};
use crate::core::interaction::SurfaceInteraction;
use crate::core::sampling::uniform_sample_triangle;

#[derive(Debug)]
pub struct TriangleMesh {
    pub n_triangles: usize,
    pub vertex_indices: Vec<u32>,
    pub p: Vec<Point3f>,
    /// Per-vertex shading normals; empty when the mesh is faceted.
    pub n: Vec<Normal3f>,
    pub uv: Vec<Point2f>,
}

impl TriangleMesh {
    pub fn new(
        vertex_indices: Vec<u32>,
        p: Vec<Point3f>,
        n: Vec<Normal3f>,
        uv: Vec<Point2f>,
    ) -> Self {
        assert_eq!(vertex_indices.len() % 3, 0);
        TriangleMesh {
            n_triangles: vertex_indices.len() / 3,
            vertex_indices,
            p,
            n,
            uv,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Triangle {
    pub mesh: Arc<TriangleMesh>,
    pub tri_index: u32,
}

impl Triangle {
    pub fn new(mesh: Arc<TriangleMesh>, tri_index: u32) -> Self {
        Triangle { mesh, tri_index }
    }
    pub fn vertices(&self) -> (Point3f, Point3f, Point3f) {
        let idx = 3 * self.tri_index as usize;
        let i0 = self.mesh.vertex_indices[idx] as usize;
        let i1 = self.mesh.vertex_indices[idx + 1] as usize;
        let i2 = self.mesh.vertex_indices[idx + 2] as usize;
        (self.mesh.p[i0], self.mesh.p[i1], self.mesh.p[i2])
    }
    pub fn world_bound(&self) -> Bounds3f {
        let (p0, p1, p2) = self.vertices();
        bnd3_union_pnt3f(&Bounds3f::new(p0, p1), &p2)
    }
    pub fn area(&self) -> Float {
        let (p0, p1, p2) = self.vertices();
        0.5 as Float * vec3_cross_vec3(&(p1 - p0), &(p2 - p0)).length()
    }
    pub fn intersect(&self, ray: &Ray, t_hit: &mut Float, isect: &mut SurfaceInteraction) -> bool {
        let (p0, p1, p2) = self.vertices();
        let e1: Vector3f = p1 - p0;
        let e2: Vector3f = p2 - p0;
        let pvec: Vector3f = vec3_cross_vec3(&ray.d, &e2);
        let det: Float = e1.x * pvec.x + e1.y * pvec.y + e1.z * pvec.z;
        // degenerate or edge-on triangles never hit
        if det.abs() < 1e-12 {
            return false;
        }
        let inv_det: Float = 1.0 as Float / det;
        let tvec: Vector3f = ray.o - p0;
        let b1: Float = (tvec.x * pvec.x + tvec.y * pvec.y + tvec.z * pvec.z) * inv_det;
        if !(0.0..=1.0).contains(&b1) {
            return false;
        }
        let qvec: Vector3f = vec3_cross_vec3(&tvec, &e1);
        let b2: Float = (ray.d.x * qvec.x + ray.d.y * qvec.y + ray.d.z * qvec.z) * inv_det;
        if b2 < 0.0 || b1 + b2 > 1.0 {
            return false;
        }
        let t: Float = (e2.x * qvec.x + e2.y * qvec.y + e2.z * qvec.z) * inv_det;
        if t < ray.t_min || t > ray.t_max.get() {
            return false;
        }
        *t_hit = t;
        self.fill_interaction(ray, t, b1, b2, isect);
        true
    }
    /// Fill the geometric fields of `isect` from precomputed barycentrics;
    /// the packed triangle path funnels through here as well so both paths
    /// shade identically.
    pub fn fill_interaction(
        &self,
        ray: &Ray,
        t: Float,
        b1: Float,
        b2: Float,
        isect: &mut SurfaceInteraction,
    ) {
        let (p0, p1, p2) = self.vertices();
        let b0: Float = 1.0 as Float - b1 - b2;
        let ng: Normal3f = Normal3f::from(vec3_cross_vec3(&(p1 - p0), &(p2 - p0)).normalize());
        isect.t = t;
        isect.p = p0 * b0 + Vector3f::from(p1 * b1) + Vector3f::from(p2 * b2);
        isect.wo = -ray.d;
        isect.n = ng;
        isect.dpdu = (p1 - p0).normalize();
        let idx = 3 * self.tri_index as usize;
        let i0 = self.mesh.vertex_indices[idx] as usize;
        let i1 = self.mesh.vertex_indices[idx + 1] as usize;
        let i2 = self.mesh.vertex_indices[idx + 2] as usize;
        if !self.mesh.n.is_empty() {
            let ns: Normal3f = (self.mesh.n[i0] * b0 + self.mesh.n[i1] * b1
                + self.mesh.n[i2] * b2)
                .normalize();
            isect.shading_n = ns;
            isect.n = nrm_faceforward_nrm(&isect.n, &ns);
        } else {
            isect.shading_n = ng;
        }
        if !self.mesh.uv.is_empty() {
            let uv0 = self.mesh.uv[i0];
            let uv1 = self.mesh.uv[i1];
            let uv2 = self.mesh.uv[i2];
            isect.uv = Point2f {
                x: b0 * uv0.x + b1 * uv1.x + b2 * uv2.x,
                y: b0 * uv0.y + b1 * uv1.y + b2 * uv2.y,
            };
        } else {
            isect.uv = Point2f { x: b1, y: b2 };
        }
    }
    pub fn sample(&self, u: Point2f) -> (Point3f, Normal3f) {
        let (p0, p1, p2) = self.vertices();
        let b: Point2f = uniform_sample_triangle(u);
        let p: Point3f = p0 * b.x
            + Vector3f::from(p1 * b.y)
            + Vector3f::from(p2 * (1.0 as Float - b.x - b.y));
        let n: Normal3f = Normal3f::from(vec3_cross_vec3(&(p1 - p0), &(p2 - p0)).normalize());
        (p, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ground_triangle() -> Triangle {
        // one triangle with vertices (-1,0,-1), (1,0,-1), (0,0,1)
        let mesh = Arc::new(TriangleMesh::new(
            vec![0, 1, 2],
            vec![
                Point3f {
                    x: -1.0,
                    y: 0.0,
                    z: -1.0,
                },
                Point3f {
                    x: 1.0,
                    y: 0.0,
                    z: -1.0,
                },
                Point3f {
                    x: 0.0,
                    y: 0.0,
                    z: 1.0,
                },
            ],
            vec![],
            vec![],
        ));
        Triangle::new(mesh, 0)
    }

    #[test]
    fn downward_ray_hits_origin_at_t_one() {
        let tri = ground_triangle();
        let ray = Ray::new(
            Point3f {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
            Vector3f {
                x: 0.0,
                y: -1.0,
                z: 0.0,
            },
        );
        let mut t_hit: Float = 0.0;
        let mut isect = SurfaceInteraction::no_hit();
        assert!(tri.intersect(&ray, &mut t_hit, &mut isect));
        assert!((t_hit - 1.0).abs() < 1e-5);
        assert!(isect.p.x.abs() < 1e-5);
        assert!(isect.p.y.abs() < 1e-5);
        assert!(isect.p.z.abs() < 1e-5);
    }

    #[test]
    fn parallel_ray_misses() {
        let tri = ground_triangle();
        let ray = Ray::new(
            Point3f {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
            Vector3f {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            },
        );
        let mut t_hit: Float = 0.0;
        let mut isect = SurfaceInteraction::no_hit();
        assert!(!tri.intersect(&ray, &mut t_hit, &mut isect));
    }
}
