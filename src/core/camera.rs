//! Camera interface: primary-ray generation plus the importance queries
//! light tracing and bidirectional connections need.

// spica
use crate::cameras::perspective::PerspectiveCamera;
use crate::core::base::{Float, Spectrum};
use crate::core::geometry::{Point2f, Point3f, Ray, Vector3f};

#[derive(Debug, Default, Copy, Clone)]
pub struct CameraSample {
    /// Sample position on the film in raster coordinates.
    pub p_film: Point2f,
    pub p_lens: Point2f,
}

#[derive(Debug)]
pub enum Camera {
    Perspective(PerspectiveCamera),
}

impl Camera {
    pub fn generate_ray(&self, sample: &CameraSample) -> Ray {
        match self {
            Camera::Perspective(camera) => camera.generate_ray(sample),
        }
    }
    /// Importance carried by a ray leaving the camera, with the raster
    /// position it corresponds to; `None` when the ray misses the film.
    pub fn we(&self, ray: &Ray) -> Option<(Spectrum, Point2f)> {
        match self {
            Camera::Perspective(camera) => camera.we(ray),
        }
    }
    pub fn pdf_we(&self, ray: &Ray) -> (Float, Float) {
        match self {
            Camera::Perspective(camera) => camera.pdf_we(ray),
        }
    }
    /// Sample a direction from `p_ref` toward the camera; returns the
    /// importance, incident direction, solid-angle pdf, and the raster
    /// position hit.
    pub fn sample_wi(
        &self,
        p_ref: &Point3f,
        wi: &mut Vector3f,
        pdf: &mut Float,
    ) -> Option<(Spectrum, Point2f)> {
        match self {
            Camera::Perspective(camera) => camera.sample_wi(p_ref, wi, pdf),
        }
    }
    pub fn eye(&self) -> Point3f {
        match self {
            Camera::Perspective(camera) => camera.eye,
        }
    }
    pub fn forward(&self) -> Vector3f {
        match self {
            Camera::Perspective(camera) => camera.forward,
        }
    }
    pub fn resolution(&self) -> (usize, usize) {
        match self {
            Camera::Perspective(camera) => (camera.width, camera.height),
        }
    }
}
