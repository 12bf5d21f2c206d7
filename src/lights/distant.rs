//! Directional lights infinitely far away.

// std
use std::f32::consts::PI;
use std::sync::RwLock;
// spica
use crate::core::base::{Float, Spectrum};
use crate::core::geometry::{
    vec3_coordinate_system, Bounds3f, Normal3f, Point2f, Point3f, Ray, Vector3f,
};
use crate::core::sampling::concentric_sample_disk;
use crate::lights::{LightRef, VisibilityTester};

#[derive(Debug)]
pub struct DistantLight {
    pub l: Spectrum,
    /// Direction toward the light.
    pub w_light: Vector3f,
    world_center: RwLock<Point3f>,
    world_radius: RwLock<Float>,
}

impl DistantLight {
    pub fn new(l: Spectrum, w_light: Vector3f) -> Self {
        DistantLight {
            l,
            w_light: w_light.normalize(),
            world_center: RwLock::new(Point3f::default()),
            world_radius: RwLock::new(1.0),
        }
    }
    /// The scene bounds are not known when lights are built; this runs at
    /// scene finalization.
    pub fn preprocess(&self, world_bound: &Bounds3f) {
        let mut center = self.world_center.write().unwrap();
        let mut radius = self.world_radius.write().unwrap();
        world_bound.bounding_sphere(&mut center, &mut radius);
        if *radius <= 0.0 as Float {
            *radius = 1.0 as Float;
        }
    }
    pub fn power(&self) -> Spectrum {
        let world_radius: Float = *self.world_radius.read().unwrap();
        self.l * (PI * world_radius * world_radius)
    }
    pub fn sample_li(
        &self,
        iref: &LightRef,
        _u: Point2f,
        wi: &mut Vector3f,
        pdf: &mut Float,
        vis: &mut VisibilityTester,
    ) -> Spectrum {
        *wi = self.w_light;
        *pdf = 1.0 as Float;
        let world_radius: Float = *self.world_radius.read().unwrap();
        vis.p0 = iref.p;
        vis.n0 = iref.n;
        vis.p1 = iref.p + self.w_light * (2.0 as Float * world_radius);
        self.l
    }
    pub fn pdf_li(&self, _iref: &LightRef, _wi: &Vector3f) -> Float {
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
        // choose a point on a disk oriented toward the light direction
        let mut v1: Vector3f = Vector3f::default();
        let mut v2: Vector3f = Vector3f::default();
        vec3_coordinate_system(&self.w_light, &mut v1, &mut v2);
        let cd: Point2f = concentric_sample_disk(&u1);
        let world_center: Point3f = *self.world_center.read().unwrap();
        let world_radius: Float = *self.world_radius.read().unwrap();
        let p_disk: Point3f = world_center + (v1 * cd.x + v2 * cd.y) * world_radius;
        *ray = Ray::new(p_disk + self.w_light * world_radius, -self.w_light);
        *n_light = Normal3f::from(ray.d);
        *pdf_pos = 1.0 as Float / (PI * world_radius * world_radius);
        *pdf_dir = 1.0 as Float;
        self.l
    }
    pub fn pdf_le(&self, _ray: &Ray, _n_light: &Normal3f, pdf_pos: &mut Float, pdf_dir: &mut Float) {
        let world_radius: Float = *self.world_radius.read().unwrap();
        *pdf_pos = 1.0 as Float / (PI * world_radius * world_radius);
        *pdf_dir = 0.0 as Float;
    }
}
