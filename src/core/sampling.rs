//! Draw random samples from a chosen probability distribution.

// std
use std::f32::consts::PI;
// spica
use crate::core::base::{clamp_t, Float};
use crate::core::base::{INV_2_PI, INV_4_PI, INV_PI, PI_OVER_2, PI_OVER_4};
use crate::core::geometry::{Point2f, Vector2f, Vector3f, XYEnum};
use crate::core::rng::Rng;
use crate::core::rng::FLOAT_ONE_MINUS_EPSILON;

#[derive(Debug, Default, Clone)]
pub struct Distribution1D {
    pub func: Vec<Float>,
    pub cdf: Vec<Float>,
    pub func_int: Float,
}

impl Distribution1D {
    pub fn new(f: Vec<Float>) -> Self {
        let n: usize = f.len();
        // compute integral of step function at $x_i$
        let mut cdf: Vec<Float> = Vec::with_capacity(n + 1);
        cdf.push(0.0 as Float);
        for i in 1..=n {
            let previous: Float = cdf[i - 1];
            cdf.push(previous + f[i - 1] / n as Float);
        }
        // transform step function integral into CDF
        let func_int: Float = cdf[n];
        if func_int == 0.0 as Float {
            for (i, item) in cdf.iter_mut().enumerate().skip(1).take(n) {
                *item = i as Float / n as Float;
            }
        } else {
            for item in cdf.iter_mut().skip(1).take(n) {
                *item /= func_int;
            }
        }
        Distribution1D {
            func: f,
            cdf,
            func_int,
        }
    }
    pub fn count(&self) -> usize {
        self.func.len()
    }
    fn find_interval(&self, u: Float) -> usize {
        let mut first: usize = 0;
        let mut len: usize = self.cdf.len();
        while len > 0_usize {
            let half: usize = len >> 1;
            let middle: usize = first + half;
            if self.cdf[middle] <= u {
                first = middle + 1;
                len -= half + 1;
            } else {
                len = half;
            }
        }
        clamp_t(
            first as isize - 1_isize,
            0_isize,
            self.cdf.len() as isize - 2_isize,
        ) as usize
    }
    pub fn sample_continuous(&self, u: Float, pdf: Option<&mut Float>) -> Float {
        let offset: usize = self.find_interval(u);
        let mut du: Float = u - self.cdf[offset];
        if (self.cdf[offset + 1] - self.cdf[offset]) > 0.0 as Float {
            du /= self.cdf[offset + 1] - self.cdf[offset];
        }
        if let Some(value) = pdf {
            if self.func_int > 0.0 as Float {
                *value = self.func[offset] / self.func_int;
            } else {
                *value = 0.0;
            }
        }
        (offset as Float + du) / self.count() as Float
    }
    pub fn sample_discrete(&self, u: Float, pdf: Option<&mut Float>) -> usize {
        let offset: usize = self.find_interval(u);
        if let Some(value) = pdf {
            if self.func_int > 0.0 as Float {
                *value = self.func[offset] / (self.func_int * self.func.len() as Float);
            } else {
                *value = 0.0;
            }
        }
        offset
    }
    pub fn discrete_pdf(&self, index: usize) -> Float {
        if self.func_int <= 0.0 as Float {
            return 0.0 as Float;
        }
        self.func[index] / (self.func_int * self.func.len() as Float)
    }
}

/// Randomly permute an array of *count* sample values, each of which has
/// *n_dimensions* dimensions.
pub fn shuffle<T>(samp: &mut [T], count: i32, n_dimensions: i32, rng: &mut Rng) {
    for i in 0..count {
        let other: i32 = i + rng.uniform_uint32_bounded((count - i) as u32) as i32;
        for j in 0..n_dimensions {
            samp.swap(
                (n_dimensions * i + j) as usize,
                (n_dimensions * other + j) as usize,
            );
        }
    }
}

pub fn stratified_sample_1d(samp: &mut [Float], n_samples: i32, rng: &mut Rng, jitter: bool) {
    let inv_n_samples: Float = 1.0 as Float / n_samples as Float;
    for i in 0..n_samples {
        let delta = if jitter {
            rng.uniform_float()
        } else {
            0.5 as Float
        };
        samp[i as usize] = ((i as Float + delta) * inv_n_samples).min(FLOAT_ONE_MINUS_EPSILON);
    }
}

pub fn stratified_sample_2d(samp: &mut [Point2f], nx: i32, ny: i32, rng: &mut Rng, jitter: bool) {
    let dx: Float = 1.0 as Float / nx as Float;
    let dy: Float = 1.0 as Float / ny as Float;
    let mut samp_idx: usize = 0;
    for y in 0..ny {
        for x in 0..nx {
            let jx = if jitter {
                rng.uniform_float()
            } else {
                0.5 as Float
            };
            let jy = if jitter {
                rng.uniform_float()
            } else {
                0.5 as Float
            };
            samp[samp_idx].x = ((x as Float + jx) * dx).min(FLOAT_ONE_MINUS_EPSILON);
            samp[samp_idx].y = ((y as Float + jy) * dy).min(FLOAT_ONE_MINUS_EPSILON);
            samp_idx += 1;
        }
    }
}

pub fn latin_hypercube(samples: &mut [Point2f], n_samples: u32, rng: &mut Rng) {
    // generate LHS samples along diagonal
    let inv_n_samples: Float = 1.0 as Float / n_samples as Float;
    for i in 0..n_samples {
        let sx: Float = (i as Float + rng.uniform_float()) * inv_n_samples;
        let sy: Float = (i as Float + rng.uniform_float()) * inv_n_samples;
        samples[i as usize].x = sx.min(FLOAT_ONE_MINUS_EPSILON);
        samples[i as usize].y = sy.min(FLOAT_ONE_MINUS_EPSILON);
    }
    // permute LHS samples in each dimension
    for i in 0..2_usize {
        for j in 0..n_samples {
            let other: u32 = j + rng.uniform_uint32_bounded(n_samples - j);
            if i == 0 {
                let tmp = samples[j as usize].x;
                samples[j as usize].x = samples[other as usize].x;
                samples[other as usize].x = tmp;
            } else {
                let tmp = samples[j as usize].y;
                samples[j as usize].y = samples[other as usize].y;
                samples[other as usize].y = tmp;
            }
        }
    }
}

/// Cosine-weighted hemisphere sampling using Malley's method.
pub fn cosine_sample_hemisphere(u: &Point2f) -> Vector3f {
    let d: Point2f = concentric_sample_disk(u);
    let z: Float = (0.0 as Float)
        .max(1.0 as Float - d.x * d.x - d.y * d.y)
        .sqrt();
    Vector3f { x: d.x, y: d.y, z }
}

/// Returns a weight of cos_theta / PI.
pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * INV_PI
}

pub fn uniform_sample_hemisphere(u: &Point2f) -> Vector3f {
    let z: Float = u[XYEnum::X];
    let r: Float = (0.0 as Float).max(1.0 as Float - z * z).sqrt();
    let phi: Float = 2.0 as Float * PI * u[XYEnum::Y];
    Vector3f {
        x: r * phi.cos(),
        y: r * phi.sin(),
        z,
    }
}

pub fn uniform_hemisphere_pdf() -> Float {
    INV_2_PI
}

pub fn uniform_sample_sphere(u: Point2f) -> Vector3f {
    let z: Float = 1.0 as Float - 2.0 as Float * u[XYEnum::X];
    let r: Float = (0.0 as Float).max(1.0 as Float - z * z).sqrt();
    let phi: Float = 2.0 as Float * PI * u[XYEnum::Y];
    Vector3f {
        x: r * phi.cos(),
        y: r * phi.sin(),
        z,
    }
}

pub fn uniform_sphere_pdf() -> Float {
    INV_4_PI
}

/// Uniformly distribute samples over a unit disk.
pub fn concentric_sample_disk(u: &Point2f) -> Point2f {
    // map uniform random numbers to $[-1,1]^2$
    let u_offset: Point2f = u * 2.0 as Float - Vector2f { x: 1.0, y: 1.0 };
    // handle degeneracy at the origin
    if u_offset.x == 0.0 as Float && u_offset.y == 0.0 as Float {
        return Point2f::default();
    }
    // apply concentric mapping to point
    let theta: Float;
    let r: Float;
    if u_offset.x.abs() > u_offset.y.abs() {
        r = u_offset.x;
        theta = PI_OVER_4 * (u_offset.y / u_offset.x);
    } else {
        r = u_offset.y;
        theta = PI_OVER_2 - PI_OVER_4 * (u_offset.x / u_offset.y);
    }
    Point2f {
        x: theta.cos(),
        y: theta.sin(),
    } * r
}

pub fn uniform_cone_pdf(cos_theta_max: Float) -> Float {
    1.0 as Float / (2.0 as Float * PI * (1.0 as Float - cos_theta_max))
}

/// Samples in a cone of directions about the (0, 0, 1) axis.
pub fn uniform_sample_cone(u: Point2f, cos_theta_max: Float) -> Vector3f {
    let cos_theta: Float = (1.0 as Float - u[XYEnum::X]) + u[XYEnum::X] * cos_theta_max;
    let sin_theta: Float = (1.0 as Float - cos_theta * cos_theta).sqrt();
    let phi: Float = u[XYEnum::Y] * 2.0 as Float * PI;
    Vector3f {
        x: phi.cos() * sin_theta,
        y: phi.sin() * sin_theta,
        z: cos_theta,
    }
}

/// Uniform barycentrics over a triangle.
pub fn uniform_sample_triangle(u: Point2f) -> Point2f {
    let su0: Float = u[XYEnum::X].sqrt();
    Point2f {
        x: 1.0 as Float - su0,
        y: u[XYEnum::Y] * su0,
    }
}

/// Veach's balance heuristic, `n_f p_f / (n_f p_f + n_g p_g)`.
pub fn balance_heuristic(nf: u8, f_pdf: Float, ng: u8, g_pdf: Float) -> Float {
    let f: Float = nf as Float * f_pdf;
    let g: Float = ng as Float * g_pdf;
    f / (f + g)
}

/// Power heuristic with beta = 2; reduces variance further than balance for
/// low-sample-count estimators.
pub fn power_heuristic(nf: u8, f_pdf: Float, ng: u8, g_pdf: Float) -> Float {
    let f: Float = nf as Float * f_pdf;
    let g: Float = ng as Float * g_pdf;
    (f * f) / (f * f + g * g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_matches_weights() {
        let d = Distribution1D::new(vec![1.0, 3.0]);
        let mut pdf: Float = 0.0;
        let idx = d.sample_discrete(0.1, Some(&mut pdf));
        assert_eq!(idx, 0);
        assert!((pdf - 0.125).abs() < 1e-6);
        let idx = d.sample_discrete(0.9, Some(&mut pdf));
        assert_eq!(idx, 1);
        assert!((pdf - 0.375).abs() < 1e-6);
        assert!((d.discrete_pdf(0) + d.discrete_pdf(1) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn cosine_samples_stay_in_upper_hemisphere() {
        let mut rng = Rng::new(3);
        for _ in 0..256 {
            let u = Point2f {
                x: rng.uniform_float(),
                y: rng.uniform_float(),
            };
            let w = cosine_sample_hemisphere(&u);
            assert!(w.z >= 0.0);
            assert!((w.length() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn heuristics_are_normalized() {
        let b = balance_heuristic(1, 0.25, 1, 0.75);
        assert!((b + balance_heuristic(1, 0.75, 1, 0.25) - 1.0).abs() < 1e-6);
        let p = power_heuristic(1, 0.25, 1, 0.75);
        assert!((p + power_heuristic(1, 0.75, 1, 0.25) - 1.0).abs() < 1e-6);
    }
}
