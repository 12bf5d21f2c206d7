//! Isotropic point lights.

// std
use std::f32::consts::PI;
// spica
use crate::core::base::{Float, Spectrum, INV_4_PI};
use crate::core::geometry::{Normal3f, Point2f, Point3f, Ray, Vector3f};
use crate::core::sampling::uniform_sample_sphere;
use crate::lights::{LightRef, VisibilityTester};

#[derive(Debug)]
pub struct PointLight {
    pub p: Point3f,
    pub intensity: Spectrum,
}

impl PointLight {
    pub fn new(p: Point3f, intensity: Spectrum) -> Self {
        PointLight { p, intensity }
    }
    pub fn power(&self) -> Spectrum {
        self.intensity * (4.0 as Float * PI)
    }
    pub fn sample_li(
        &self,
        iref: &LightRef,
        _u: Point2f,
        wi: &mut Vector3f,
        pdf: &mut Float,
        vis: &mut VisibilityTester,
    ) -> Spectrum {
        let to_light: Vector3f = self.p - iref.p;
        let dist2: Float = to_light.length_squared();
        if dist2 <= 0.0 as Float {
            *pdf = 0.0 as Float;
            return Spectrum::default();
        }
        *wi = to_light / dist2.sqrt();
        *pdf = 1.0 as Float;
        vis.p0 = iref.p;
        vis.n0 = iref.n;
        vis.p1 = self.p;
        self.intensity / dist2
    }
    pub fn pdf_li(&self, _iref: &LightRef, _wi: &Vector3f) -> Float {
        // delta distribution; never matched by a BSDF sample
        0.0 as Float
    }
    pub fn sample_le(
        &self,
        u1: Point2f,
        _u2: Point2f,
        ray: &mut Ray,
        n_light: &mut Normal3f,
        pdf_pos: &mut Float,
        pdf_dir: &mut Float,
    ) -> Spectrum {
        let d: Vector3f = uniform_sample_sphere(u1);
        *ray = Ray::new(self.p, d);
        *n_light = Normal3f::from(d);
        *pdf_pos = 1.0 as Float;
        *pdf_dir = INV_4_PI;
        self.intensity
    }
    pub fn pdf_le(&self, _ray: &Ray, _n_light: &Normal3f, pdf_pos: &mut Float, pdf_dir: &mut Float) {
        *pdf_pos = 0.0 as Float;
        *pdf_dir = INV_4_PI;
    }
}
