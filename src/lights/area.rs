//! Diffuse area lights attached to a shape.

// std
use std::f32::consts::PI;
// spica
use crate::core::base::{Float, Spectrum, INV_PI};
use crate::core::geometry::{
    nrm_dot_vec3f, pnt3_distance_squaredf, vec3_coordinate_system, Normal3f, Point2f, Ray,
    Vector3f,
};
use crate::core::interaction::SurfaceInteraction;
use crate::core::sampling::cosine_sample_hemisphere;
use crate::lights::{LightRef, VisibilityTester};
use crate::shapes::Shape;

#[derive(Debug)]
pub struct DiffuseAreaLight {
    pub l_emit: Spectrum,
    pub shape: Shape,
    pub two_sided: bool,
    area: Float,
}

impl DiffuseAreaLight {
    pub fn new(l_emit: Spectrum, shape: Shape, two_sided: bool) -> Self {
        let area = shape.area();
        DiffuseAreaLight {
            l_emit,
            shape,
            two_sided,
            area,
        }
    }
    /// Emitted radiance leaving a point with surface normal `n` toward `w`.
    pub fn l(&self, n: &Normal3f, w: &Vector3f) -> Spectrum {
        if self.two_sided || nrm_dot_vec3f(n, w) > 0.0 as Float {
            self.l_emit
        } else {
            Spectrum::default()
        }
    }
    pub fn power(&self) -> Spectrum {
        let sides: Float = if self.two_sided { 2.0 } else { 1.0 };
        self.l_emit * (sides * self.area * PI)
    }
    pub fn sample_li(
        &self,
        iref: &LightRef,
        u: Point2f,
        wi: &mut Vector3f,
        pdf: &mut Float,
        vis: &mut VisibilityTester,
    ) -> Spectrum {
        let mut area_pdf: Float = 0.0;
        let (p_light, n_light) = self.shape.sample(u, &mut area_pdf);
        let to_light: Vector3f = p_light - iref.p;
        let dist2: Float = to_light.length_squared();
        if dist2 <= 0.0 as Float {
            *pdf = 0.0 as Float;
            return Spectrum::default();
        }
        *wi = to_light / dist2.sqrt();
        // convert the area density to solid angle at the receiver
        let cos_light: Float = nrm_dot_vec3f(&n_light, &-(*wi)).abs();
        if cos_light <= 1e-6 as Float {
            *pdf = 0.0 as Float;
            return Spectrum::default();
        }
        *pdf = area_pdf * dist2 / cos_light;
        vis.p0 = iref.p;
        vis.n0 = iref.n;
        vis.p1 = p_light;
        self.l(&n_light, &-(*wi))
    }
    pub fn pdf_li(&self, iref: &LightRef, wi: &Vector3f) -> Float {
        // find the point on the shape seen along wi, then convert its
        // area density to solid angle
        let ray = Ray::new(iref.p + *wi * 1e-4 as Float, *wi);
        let mut t_hit: Float = 0.0;
        let mut isect = SurfaceInteraction::no_hit();
        if !self.shape.intersect(&ray, &mut t_hit, &mut isect) {
            return 0.0 as Float;
        }
        let dist2: Float = pnt3_distance_squaredf(&iref.p, &isect.p);
        let cos_light: Float = nrm_dot_vec3f(&isect.n, &-(*wi)).abs();
        if cos_light <= 1e-6 as Float {
            return 0.0 as Float;
        }
        dist2 / (cos_light * self.area)
    }
    pub fn sample_le(
        &self,
        u1: Point2f,
        u2: Point2f,
        ray: &mut Ray,
        n_light: &mut Normal3f,
        pdf_pos: &mut Float,
        pdf_dir: &mut Float,
    ) -> Spectrum {
        let (p_light, n) = self.shape.sample(u1, pdf_pos);
        *n_light = n;
        // cosine-distributed emission about the light normal
        let mut w_local: Vector3f = cosine_sample_hemisphere(&u2);
        *pdf_dir = crate::core::sampling::cosine_hemisphere_pdf(w_local.z);
        if self.two_sided && u2.x < 0.5 as Float {
            w_local.z *= -1.0 as Float;
            *pdf_dir *= 0.5 as Float;
        }
        let nv: Vector3f = Vector3f::from(n);
        let mut v1: Vector3f = Vector3f::default();
        let mut v2: Vector3f = Vector3f::default();
        vec3_coordinate_system(&nv, &mut v1, &mut v2);
        let w: Vector3f = v1 * w_local.x + v2 * w_local.y + nv * w_local.z;
        *ray = Ray::new(p_light + w * 1e-4 as Float, w);
        self.l(&n, &w)
    }
    pub fn pdf_le(&self, ray: &Ray, n_light: &Normal3f, pdf_pos: &mut Float, pdf_dir: &mut Float) {
        *pdf_pos = 1.0 as Float / self.area;
        let cos: Float = nrm_dot_vec3f(n_light, &ray.d);
        *pdf_dir = if self.two_sided {
            0.5 as Float * cos.abs() * INV_PI
        } else if cos > 0.0 as Float {
            cos * INV_PI
        } else {
            0.0 as Float
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Point3f;
    use crate::shapes::quad::Quad;

    fn unit_quad_light() -> DiffuseAreaLight {
        DiffuseAreaLight::new(
            Spectrum::new(4.0),
            Shape::Quad(Quad::new(
                Point3f {
                    x: -0.5,
                    y: -0.5,
                    z: 2.0,
                },
                Vector3f {
                    x: 1.0,
                    y: 0.0,
                    z: 0.0,
                },
                Vector3f {
                    x: 0.0,
                    y: 1.0,
                    z: 0.0,
                },
            )),
            false,
        )
    }

    #[test]
    fn sample_li_pdf_agrees_with_pdf_li() {
        let light = unit_quad_light();
        let iref = LightRef {
            p: Point3f::default(),
            n: Normal3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        };
        let mut rng = crate::core::rng::Rng::new(4);
        for _ in 0..256 {
            let u = Point2f {
                x: rng.uniform_float(),
                y: rng.uniform_float(),
            };
            let mut wi = Vector3f::default();
            let mut pdf: Float = 0.0;
            let mut vis = VisibilityTester::default();
            let li = light.sample_li(&iref, u, &mut wi, &mut pdf, &mut vis);
            if pdf == 0.0 {
                continue;
            }
            assert!(!li.is_black());
            let pdf_query = light.pdf_li(&iref, &wi);
            assert!(
                (pdf / pdf_query - 1.0).abs() < 1e-2,
                "sampled {} queried {}",
                pdf,
                pdf_query
            );
        }
    }

    #[test]
    fn one_sided_light_is_dark_from_behind() {
        let light = unit_quad_light();
        // the quad normal is +z; looking from above means w points -z
        let n = Normal3f {
            x: 0.0,
            y: 0.0,
            z: 1.0,
        };
        assert!(!light
            .l(
                &n,
                &Vector3f {
                    x: 0.0,
                    y: 0.0,
                    z: 1.0
                }
            )
            .is_black());
        assert!(light
            .l(
                &n,
                &Vector3f {
                    x: 0.0,
                    y: 0.0,
                    z: -1.0
                }
            )
            .is_black());
    }
}
