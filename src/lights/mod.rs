//! Light sources. Area lights wrap a shape; the sky light closes the
//! scene from infinity.

pub mod area;
pub mod distant;
pub mod infinite;
pub mod point;

// spica
use crate::core::base::{Float, Spectrum};
use crate::core::geometry::{
    pnt3_offset_ray_origin, Bounds3f, Normal3f, Point2f, Point3f, Ray, Vector3f,
};
use crate::core::scene::Scene;
use crate::lights::area::DiffuseAreaLight;
use crate::lights::distant::DistantLight;
use crate::lights::infinite::SkyLight;
use crate::lights::point::PointLight;

#[repr(u8)]
pub enum LightFlags {
    DeltaPosition = 1,
    DeltaDirection = 2,
    Area = 4,
    Infinite = 8,
}

pub fn is_delta_light(flags: u8) -> bool {
    flags & LightFlags::DeltaPosition as u8 > 0 || flags & LightFlags::DeltaDirection as u8 > 0
}

/// The receiving end of a light sample: a surface (or camera) point and
/// its normal.
#[derive(Debug, Default, Copy, Clone)]
pub struct LightRef {
    pub p: Point3f,
    pub n: Normal3f,
}

/// Endpoints of a potential direct-lighting connection; checked against
/// the scene after both ends are known.
#[derive(Debug, Default, Copy, Clone)]
pub struct VisibilityTester {
    pub p0: Point3f,
    pub n0: Normal3f,
    pub p1: Point3f,
}

impl VisibilityTester {
    pub fn unoccluded(&self, scene: &Scene) -> bool {
        let d: Vector3f = self.p1 - self.p0;
        let o: Point3f = pnt3_offset_ray_origin(&self.p0, &self.n0, &d);
        let ray = Ray::new_with_span(o, d, 0.0 as Float, 1.0 as Float - 1e-3 as Float);
        !scene.intersect_p(&ray)
    }
}

#[derive(Debug)]
pub enum Light {
    Area(DiffuseAreaLight),
    Sky(SkyLight),
    Point(PointLight),
    Distant(DistantLight),
}

impl Light {
    /// Sample an incident direction toward the light from `iref`; `pdf`
    /// is with respect to solid angle at the receiver.
    pub fn sample_li(
        &self,
        iref: &LightRef,
        u: Point2f,
        wi: &mut Vector3f,
        pdf: &mut Float,
        vis: &mut VisibilityTester,
    ) -> Spectrum {
        match self {
            Light::Area(light) => light.sample_li(iref, u, wi, pdf, vis),
            Light::Sky(light) => light.sample_li(iref, u, wi, pdf, vis),
            Light::Point(light) => light.sample_li(iref, u, wi, pdf, vis),
            Light::Distant(light) => light.sample_li(iref, u, wi, pdf, vis),
        }
    }
    /// Density `sample_li` would have drawn `wi` with (solid angle).
    pub fn pdf_li(&self, iref: &LightRef, wi: &Vector3f) -> Float {
        match self {
            Light::Area(light) => light.pdf_li(iref, wi),
            Light::Sky(light) => light.pdf_li(iref, wi),
            Light::Point(light) => light.pdf_li(iref, wi),
            Light::Distant(light) => light.pdf_li(iref, wi),
        }
    }
    /// Sample an emitted ray leaving the light.
    pub fn sample_le(
        &self,
        u1: Point2f,
        u2: Point2f,
        ray: &mut Ray,
        n_light: &mut Normal3f,
        pdf_pos: &mut Float,
        pdf_dir: &mut Float,
    ) -> Spectrum {
        match self {
            Light::Area(light) => light.sample_le(u1, u2, ray, n_light, pdf_pos, pdf_dir),
            Light::Sky(light) => light.sample_le(u1, u2, ray, n_light, pdf_pos, pdf_dir),
            Light::Point(light) => light.sample_le(u1, u2, ray, n_light, pdf_pos, pdf_dir),
            Light::Distant(light) => light.sample_le(u1, u2, ray, n_light, pdf_pos, pdf_dir),
        }
    }
    pub fn pdf_le(&self, ray: &Ray, n_light: &Normal3f, pdf_pos: &mut Float, pdf_dir: &mut Float) {
        match self {
            Light::Area(light) => light.pdf_le(ray, n_light, pdf_pos, pdf_dir),
            Light::Sky(light) => light.pdf_le(ray, n_light, pdf_pos, pdf_dir),
            Light::Point(light) => light.pdf_le(ray, n_light, pdf_pos, pdf_dir),
            Light::Distant(light) => light.pdf_le(ray, n_light, pdf_pos, pdf_dir),
        }
    }
    /// Emitted radiance toward `w` from a point on the light with surface
    /// normal `n`; zero for everything but area lights.
    pub fn l(&self, n: &Normal3f, w: &Vector3f) -> Spectrum {
        match self {
            Light::Area(light) => light.l(n, w),
            _ => Spectrum::default(),
        }
    }
    /// Radiance contributed to a ray that escaped the scene.
    pub fn le(&self, ray: &Ray) -> Spectrum {
        match self {
            Light::Sky(light) => light.le(ray),
            _ => Spectrum::default(),
        }
    }
    pub fn power(&self) -> Spectrum {
        match self {
            Light::Area(light) => light.power(),
            Light::Sky(light) => light.power(),
            Light::Point(light) => light.power(),
            Light::Distant(light) => light.power(),
        }
    }
    pub fn get_flags(&self) -> u8 {
        match self {
            Light::Area(_) => LightFlags::Area as u8,
            Light::Sky(_) => LightFlags::Infinite as u8,
            Light::Point(_) => LightFlags::DeltaPosition as u8,
            Light::Distant(_) => LightFlags::DeltaDirection as u8,
        }
    }
    pub fn is_delta(&self) -> bool {
        is_delta_light(self.get_flags())
    }
    pub fn is_infinite(&self) -> bool {
        self.get_flags() & LightFlags::Infinite as u8 > 0
    }
    /// Lights that need the scene bounds learn them here, after the scene
    /// geometry is final.
    pub fn preprocess(&self, world_bound: &Bounds3f) {
        match self {
            Light::Sky(light) => light.preprocess(world_bound),
            Light::Distant(light) => light.preprocess(world_bound),
            _ => {}
        }
    }
}
