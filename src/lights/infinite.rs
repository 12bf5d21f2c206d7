//! Constant-radiance sky dome closing the scene from infinity.

// std
use std::f32::consts::PI;
use std::sync::RwLock;
// spica
use crate::core::base::{Float, Spectrum, INV_4_PI};
use crate::core::geometry::{
    vec3_coordinate_system, Bounds3f, Normal3f, Point2f, Point3f, Ray, Vector3f,
};
use crate::core::sampling::{concentric_sample_disk, uniform_sample_sphere, uniform_sphere_pdf};
use crate::lights::{LightRef, VisibilityTester};

#[derive(Debug)]
pub struct SkyLight {
    pub l: Spectrum,
    world_center: RwLock<Point3f>,
    world_radius: RwLock<Float>,
}

impl SkyLight {
    pub fn new(l: Spectrum) -> Self {
        SkyLight {
            l,
            world_center: RwLock::new(Point3f::default()),
            world_radius: RwLock::new(1.0),
        }
    }
    /// Needs the scene bounds, which exist only after all geometry is in
    /// place; called at scene finalization.
    pub fn preprocess(&self, world_bound: &Bounds3f) {
        let mut center = self.world_center.write().unwrap();
        let mut radius = self.world_radius.write().unwrap();
        world_bound.bounding_sphere(&mut center, &mut radius);
        if *radius <= 0.0 as Float {
            *radius = 1.0 as Float;
        }
    }
    pub fn le(&self, _ray: &Ray) -> Spectrum {
        self.l
    }
    pub fn power(&self) -> Spectrum {
        let world_radius: Float = *self.world_radius.read().unwrap();
        self.l * (PI * world_radius * world_radius)
    }
    pub fn sample_li(
        &self,
        iref: &LightRef,
        u: Point2f,
        wi: &mut Vector3f,
        pdf: &mut Float,
        vis: &mut VisibilityTester,
    ) -> Spectrum {
        *wi = uniform_sample_sphere(u);
        *pdf = uniform_sphere_pdf();
        let world_radius: Float = *self.world_radius.read().unwrap();
        vis.p0 = iref.p;
        vis.n0 = iref.n;
        vis.p1 = iref.p + *wi * (2.0 as Float * world_radius);
        self.l
    }
    pub fn pdf_li(&self, _iref: &LightRef, _wi: &Vector3f) -> Float {
        uniform_sphere_pdf()
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
        // pick an inward direction, then an offset disk point for the
        // ray origin outside the scene
        let d: Vector3f = -uniform_sample_sphere(u1);
        let world_center: Point3f = *self.world_center.read().unwrap();
        let world_radius: Float = *self.world_radius.read().unwrap();
        let mut v1: Vector3f = Vector3f::default();
        let mut v2: Vector3f = Vector3f::default();
        vec3_coordinate_system(&(-d), &mut v1, &mut v2);
        let cd: Point2f = concentric_sample_disk(&u2);
        let p_disk: Point3f = world_center + (v1 * cd.x + v2 * cd.y) * world_radius;
        *ray = Ray::new(p_disk + (-d) * world_radius, d);
        *n_light = Normal3f::from(ray.d);
        *pdf_pos = 1.0 as Float / (PI * world_radius * world_radius);
        *pdf_dir = uniform_sphere_pdf();
        self.l
    }
    pub fn pdf_le(&self, _ray: &Ray, _n_light: &Normal3f, pdf_pos: &mut Float, pdf_dir: &mut Float) {
        let world_radius: Float = *self.world_radius.read().unwrap();
        *pdf_pos = 1.0 as Float / (PI * world_radius * world_radius);
        *pdf_dir = INV_4_PI;
    }
}
