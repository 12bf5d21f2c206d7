//! Thin-lens perspective camera. With a zero lens radius it degenerates
//! to a pinhole; the importance functions treat the lens as a delta in
//! that case.

// spica
use crate::core::base::{radians, Float, Spectrum};
use crate::core::camera::CameraSample;
use crate::core::geometry::{
    vec3_cross_vec3, vec3_dot_vec3f, Point2f, Point3f, Ray, Vector3f,
};
use crate::core::sampling::concentric_sample_disk;

#[derive(Debug)]
pub struct PerspectiveCamera {
    pub eye: Point3f,
    pub forward: Vector3f,
    pub right: Vector3f,
    pub up: Vector3f,
    pub width: usize,
    pub height: usize,
    pub lens_radius: Float,
    pub focal_distance: Float,
    tan_half_fov: Float,
    aspect: Float,
    /// Area of the film window on the plane at unit distance.
    film_area: Float,
}

impl PerspectiveCamera {
    pub fn new(
        eye: Point3f,
        target: Point3f,
        up_hint: Vector3f,
        fov_degrees: Float,
        width: usize,
        height: usize,
        lens_radius: Float,
        focal_distance: Float,
    ) -> Self {
        let forward: Vector3f = (target - eye).normalize();
        let right: Vector3f = vec3_cross_vec3(&forward, &up_hint).normalize();
        let up: Vector3f = vec3_cross_vec3(&right, &forward);
        let tan_half_fov: Float = radians(fov_degrees * 0.5).tan();
        let aspect: Float = width as Float / height as Float;
        PerspectiveCamera {
            eye,
            forward,
            right,
            up,
            width,
            height,
            lens_radius,
            focal_distance: focal_distance.max(1e-3),
            tan_half_fov,
            aspect,
            film_area: 4.0 as Float * tan_half_fov * tan_half_fov * aspect,
        }
    }
    fn lens_area(&self) -> Float {
        if self.lens_radius > 0.0 as Float {
            std::f32::consts::PI * self.lens_radius * self.lens_radius
        } else {
            1.0 as Float
        }
    }
    /// Raster sample position to a world-space primary ray; pixel (0, 0)
    /// is the film's top-left corner.
    pub fn generate_ray(&self, sample: &CameraSample) -> Ray {
        let ndc_x: Float = 2.0 as Float * (sample.p_film.x / self.width as Float) - 1.0 as Float;
        let ndc_y: Float = 1.0 as Float - 2.0 as Float * (sample.p_film.y / self.height as Float);
        let dir_cam = Vector3f {
            x: ndc_x * self.tan_half_fov * self.aspect,
            y: ndc_y * self.tan_half_fov,
            z: 1.0,
        };
        let mut origin: Point3f = self.eye;
        let mut dir_world: Vector3f =
            (self.right * dir_cam.x + self.up * dir_cam.y + self.forward * dir_cam.z).normalize();
        if self.lens_radius > 0.0 as Float {
            // defocus: shift the origin on the lens and re-aim at the
            // focal plane
            let lens: Point2f = concentric_sample_disk(&sample.p_lens) * self.lens_radius;
            let ft: Float = self.focal_distance / vec3_dot_vec3f(&dir_world, &self.forward);
            let p_focus: Point3f = self.eye + dir_world * ft;
            origin = self.eye + self.right * lens.x + self.up * lens.y;
            dir_world = (p_focus - origin).normalize();
        }
        Ray::new(origin, dir_world)
    }
    fn raster_from_direction(&self, d: &Vector3f) -> Option<Point2f> {
        let cos_theta: Float = vec3_dot_vec3f(d, &self.forward);
        if cos_theta <= 1e-6 as Float {
            return None;
        }
        let x_cam: Float = vec3_dot_vec3f(d, &self.right) / cos_theta;
        let y_cam: Float = vec3_dot_vec3f(d, &self.up) / cos_theta;
        let ndc_x: Float = x_cam / (self.tan_half_fov * self.aspect);
        let ndc_y: Float = y_cam / self.tan_half_fov;
        let px: Float = (ndc_x + 1.0 as Float) * 0.5 as Float * self.width as Float;
        let py: Float = (1.0 as Float - ndc_y) * 0.5 as Float * self.height as Float;
        if px < 0.0 || px >= self.width as Float || py < 0.0 || py >= self.height as Float {
            return None;
        }
        Some(Point2f { x: px, y: py })
    }
    pub fn we(&self, ray: &Ray) -> Option<(Spectrum, Point2f)> {
        let raster = self.raster_from_direction(&ray.d)?;
        let cos_theta: Float = vec3_dot_vec3f(&ray.d, &self.forward);
        let cos2: Float = cos_theta * cos_theta;
        let importance: Float =
            1.0 as Float / (self.film_area * self.lens_area() * cos2 * cos2);
        Some((Spectrum::new(importance), raster))
    }
    pub fn pdf_we(&self, ray: &Ray) -> (Float, Float) {
        if self.raster_from_direction(&ray.d).is_none() {
            return (0.0 as Float, 0.0 as Float);
        }
        let cos_theta: Float = vec3_dot_vec3f(&ray.d, &self.forward);
        let pdf_pos: Float = 1.0 as Float / self.lens_area();
        let pdf_dir: Float = 1.0 as Float / (self.film_area * cos_theta * cos_theta * cos_theta);
        (pdf_pos, pdf_dir)
    }
    pub fn sample_wi(
        &self,
        p_ref: &Point3f,
        wi: &mut Vector3f,
        pdf: &mut Float,
    ) -> Option<(Spectrum, Point2f)> {
        let to_cam: Vector3f = self.eye - p_ref;
        let dist2: Float = to_cam.length_squared();
        if dist2 <= 0.0 as Float {
            return None;
        }
        let dist: Float = dist2.sqrt();
        *wi = to_cam / dist;
        // the direction leaving the camera toward the reference point
        let d: Vector3f = -(*wi);
        let cos_theta: Float = vec3_dot_vec3f(&d, &self.forward);
        if cos_theta <= 1e-6 as Float {
            return None;
        }
        let (importance, raster) = self.we(&Ray::new(self.eye, d))?;
        *pdf = dist2 / (cos_theta * self.lens_area());
        Some((importance, raster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> PerspectiveCamera {
        PerspectiveCamera::new(
            Point3f::default(),
            Point3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
            Vector3f {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
            60.0,
            128,
            96,
            0.0,
            5.0,
        )
    }

    #[test]
    fn center_pixel_looks_forward() {
        let camera = test_camera();
        let ray = camera.generate_ray(&CameraSample {
            p_film: Point2f { x: 64.0, y: 48.0 },
            p_lens: Point2f::default(),
        });
        assert!((ray.d.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn we_inverts_generate_ray() {
        let camera = test_camera();
        for &(px, py) in [(10.3, 20.9), (64.0, 48.0), (120.7, 90.1)].iter() {
            let ray = camera.generate_ray(&CameraSample {
                p_film: Point2f { x: px, y: py },
                p_lens: Point2f::default(),
            });
            let (_we, raster) = camera.we(&ray).expect("ray must land on film");
            assert!((raster.x - px).abs() < 1e-2, "{} vs {}", raster.x, px);
            assert!((raster.y - py).abs() < 1e-2, "{} vs {}", raster.y, py);
        }
    }

    #[test]
    fn top_left_is_up_and_left() {
        let camera = test_camera();
        let ray = camera.generate_ray(&CameraSample {
            p_film: Point2f { x: 0.0, y: 0.0 },
            p_lens: Point2f::default(),
        });
        // raster origin maps to negative x (left) and positive y (up)
        assert!(ray.d.x < 0.0);
        assert!(ray.d.y > 0.0);
    }
}
