//! Microfacet normal distributions and shadowing terms.

// std
use std::f32::consts::PI;
// spica
use crate::core::base::{clamp_t, sqr, Float};
use crate::core::geometry::{spherical_direction, vec3_dot_vec3f, Point2f, Vector3f, XYEnum};
use crate::core::reflection::{
    abs_cos_theta, cos_2_phi, cos_2_theta, sin_2_phi, tan_2_theta, tan_theta,
    vec3_same_hemisphere_vec3,
};

/// Map the artist-facing [0, 1] roughness to an alpha for the
/// distributions below.
pub fn roughness_to_alpha(roughness: Float) -> Float {
    let roughness = roughness.max(1e-3 as Float);
    let x: Float = roughness.ln();
    1.62142
        + 0.819_955 * x
        + 0.173_4 * x * x
        + 0.017_120_1 * x * x * x
        + 0.000_640_711 * x * x * x * x
}

#[derive(Debug, Copy, Clone)]
pub enum MicrofacetDistribution {
    Beckmann(BeckmannDistribution),
    TrowbridgeReitz(TrowbridgeReitzDistribution),
    Blinn(BlinnDistribution),
}

impl MicrofacetDistribution {
    pub fn d(&self, wh: &Vector3f) -> Float {
        match self {
            MicrofacetDistribution::Beckmann(distrib) => distrib.d(wh),
            MicrofacetDistribution::TrowbridgeReitz(distrib) => distrib.d(wh),
            MicrofacetDistribution::Blinn(distrib) => distrib.d(wh),
        }
    }
    pub fn lambda(&self, w: &Vector3f) -> Float {
        match self {
            MicrofacetDistribution::Beckmann(distrib) => distrib.lambda(w),
            MicrofacetDistribution::TrowbridgeReitz(distrib) => distrib.lambda(w),
            MicrofacetDistribution::Blinn(distrib) => distrib.lambda(w),
        }
    }
    pub fn g1(&self, w: &Vector3f) -> Float {
        1.0 as Float / (1.0 as Float + self.lambda(w))
    }
    /// Smith shadowing-masking from the distribution's own lambda.
    pub fn g(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        1.0 as Float / (1.0 as Float + self.lambda(wo) + self.lambda(wi))
    }
    pub fn sample_wh(&self, wo: &Vector3f, u: &Point2f) -> Vector3f {
        match self {
            MicrofacetDistribution::Beckmann(distrib) => distrib.sample_wh(wo, u),
            MicrofacetDistribution::TrowbridgeReitz(distrib) => distrib.sample_wh(wo, u),
            MicrofacetDistribution::Blinn(distrib) => distrib.sample_wh(wo, u),
        }
    }
    /// Density `sample_wh` draws microfacet normals with.
    pub fn pdf(&self, _wo: &Vector3f, wh: &Vector3f) -> Float {
        self.d(wh) * abs_cos_theta(wh)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct BeckmannDistribution {
    pub alpha_x: Float,
    pub alpha_y: Float,
}

impl BeckmannDistribution {
    pub fn new(alpha_x: Float, alpha_y: Float) -> Self {
        BeckmannDistribution {
            alpha_x: alpha_x.max(1e-4),
            alpha_y: alpha_y.max(1e-4),
        }
    }
    pub fn d(&self, wh: &Vector3f) -> Float {
        let tan_2_theta: Float = tan_2_theta(wh);
        if tan_2_theta.is_infinite() {
            return 0.0 as Float;
        }
        let cos_4_theta: Float = cos_2_theta(wh) * cos_2_theta(wh);
        (-tan_2_theta
            * (cos_2_phi(wh) / (self.alpha_x * self.alpha_x)
                + sin_2_phi(wh) / (self.alpha_y * self.alpha_y)))
            .exp()
            / (PI * self.alpha_x * self.alpha_y * cos_4_theta)
    }
    pub fn lambda(&self, w: &Vector3f) -> Float {
        let abs_tan_theta: Float = tan_theta(w).abs();
        if abs_tan_theta.is_infinite() {
            return 0.0 as Float;
        }
        let alpha: Float = (cos_2_phi(w) * self.alpha_x * self.alpha_x
            + sin_2_phi(w) * self.alpha_y * self.alpha_y)
            .sqrt();
        let a: Float = 1.0 as Float / (alpha * abs_tan_theta);
        if a >= 1.6 as Float {
            return 0.0 as Float;
        }
        (1.0 as Float - 1.259 * a + 0.396 * a * a) / (3.535 * a + 2.181 * a * a)
    }
    pub fn sample_wh(&self, wo: &Vector3f, u: &Point2f) -> Vector3f {
        // sample the full distribution of normals
        let log_sample: Float = (1.0 as Float - u[XYEnum::X]).ln();
        let (tan_2_theta, phi) = if self.alpha_x == self.alpha_y {
            (
                -self.alpha_x * self.alpha_x * log_sample,
                u[XYEnum::Y] * 2.0 as Float * PI,
            )
        } else {
            // anisotropic case
            let mut phi: Float = (self.alpha_y / self.alpha_x
                * (2.0 as Float * PI * u[XYEnum::Y] + 0.5 as Float * PI).tan())
            .atan();
            if u[XYEnum::Y] > 0.5 as Float {
                phi += PI;
            }
            let sin_phi: Float = phi.sin();
            let cos_phi: Float = phi.cos();
            let alpha_x2: Float = self.alpha_x * self.alpha_x;
            let alpha_y2: Float = self.alpha_y * self.alpha_y;
            (
                -log_sample / (cos_phi * cos_phi / alpha_x2 + sin_phi * sin_phi / alpha_y2),
                phi,
            )
        };
        let cos_theta: Float = 1.0 as Float / (1.0 as Float + tan_2_theta).sqrt();
        let sin_theta: Float = (0.0 as Float)
            .max(1.0 as Float - cos_theta * cos_theta)
            .sqrt();
        let mut wh: Vector3f = spherical_direction(sin_theta, cos_theta, phi);
        if !vec3_same_hemisphere_vec3(wo, &wh) {
            wh = -wh;
        }
        wh
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TrowbridgeReitzDistribution {
    pub alpha_x: Float,
    pub alpha_y: Float,
}

impl TrowbridgeReitzDistribution {
    pub fn new(alpha_x: Float, alpha_y: Float) -> Self {
        TrowbridgeReitzDistribution {
            alpha_x: alpha_x.max(1e-4),
            alpha_y: alpha_y.max(1e-4),
        }
    }
    pub fn d(&self, wh: &Vector3f) -> Float {
        let tan_2_theta: Float = tan_2_theta(wh);
        if tan_2_theta.is_infinite() {
            return 0.0 as Float;
        }
        let cos_4_theta: Float = cos_2_theta(wh) * cos_2_theta(wh);
        let e: Float = (cos_2_phi(wh) / (self.alpha_x * self.alpha_x)
            + sin_2_phi(wh) / (self.alpha_y * self.alpha_y))
            * tan_2_theta;
        1.0 as Float
            / (PI
                * self.alpha_x
                * self.alpha_y
                * cos_4_theta
                * (1.0 as Float + e)
                * (1.0 as Float + e))
    }
    pub fn lambda(&self, w: &Vector3f) -> Float {
        let abs_tan_theta: Float = tan_theta(w).abs();
        if abs_tan_theta.is_infinite() {
            return 0.0 as Float;
        }
        let alpha: Float = (cos_2_phi(w) * self.alpha_x * self.alpha_x
            + sin_2_phi(w) * self.alpha_y * self.alpha_y)
            .sqrt();
        let alpha_2_tan_2_theta: Float = sqr(alpha * abs_tan_theta);
        (-1.0 as Float + (1.0 as Float + alpha_2_tan_2_theta).sqrt()) / 2.0 as Float
    }
    pub fn sample_wh(&self, wo: &Vector3f, u: &Point2f) -> Vector3f {
        let cos_theta: Float;
        let mut phi: Float = 2.0 as Float * PI * u[XYEnum::Y];
        if self.alpha_x == self.alpha_y {
            let tan_theta_2: Float =
                self.alpha_x * self.alpha_x * u[XYEnum::X] / (1.0 as Float - u[XYEnum::X]);
            cos_theta = 1.0 as Float / (1.0 as Float + tan_theta_2).sqrt();
        } else {
            phi = (self.alpha_y / self.alpha_x
                * (2.0 as Float * PI * u[XYEnum::Y] + 0.5 as Float * PI).tan())
            .atan();
            if u[XYEnum::Y] > 0.5 as Float {
                phi += PI;
            }
            let sin_phi: Float = phi.sin();
            let cos_phi: Float = phi.cos();
            let alpha_x2: Float = self.alpha_x * self.alpha_x;
            let alpha_y2: Float = self.alpha_y * self.alpha_y;
            let alpha_2: Float =
                1.0 as Float / (cos_phi * cos_phi / alpha_x2 + sin_phi * sin_phi / alpha_y2);
            let tan_theta_2: Float = alpha_2 * u[XYEnum::X] / (1.0 as Float - u[XYEnum::X]);
            cos_theta = 1.0 as Float / (1.0 as Float + tan_theta_2).sqrt();
        }
        let sin_theta: Float = (0.0 as Float)
            .max(1.0 as Float - cos_theta * cos_theta)
            .sqrt();
        let mut wh: Vector3f = spherical_direction(sin_theta, cos_theta, phi);
        if !vec3_same_hemisphere_vec3(wo, &wh) {
            wh = -wh;
        }
        wh
    }
}

/// Classic Blinn-Phong lobe kept for scenes authored against it.
#[derive(Debug, Copy, Clone)]
pub struct BlinnDistribution {
    pub exponent: Float,
}

impl BlinnDistribution {
    pub fn new(roughness: Float) -> Self {
        let alpha = roughness.max(1e-3);
        BlinnDistribution {
            exponent: (2.0 as Float / (alpha * alpha) - 2.0 as Float).max(0.0 as Float),
        }
    }
    pub fn d(&self, wh: &Vector3f) -> Float {
        (self.exponent + 2.0 as Float) * crate::core::base::INV_2_PI
            * abs_cos_theta(wh).powf(self.exponent)
    }
    pub fn lambda(&self, w: &Vector3f) -> Float {
        // Walter's approximate mapping from exponent to Beckmann alpha
        let alpha: Float = (2.0 as Float / (self.exponent + 2.0 as Float)).sqrt();
        BeckmannDistribution::new(alpha, alpha).lambda(w)
    }
    pub fn sample_wh(&self, wo: &Vector3f, u: &Point2f) -> Vector3f {
        let cos_theta: Float = u[XYEnum::X].powf(1.0 as Float / (self.exponent + 1.0 as Float));
        let sin_theta: Float = (0.0 as Float)
            .max(1.0 as Float - cos_theta * cos_theta)
            .sqrt();
        let phi: Float = 2.0 as Float * PI * u[XYEnum::Y];
        let mut wh: Vector3f = spherical_direction(sin_theta, cos_theta, phi);
        if !vec3_same_hemisphere_vec3(wo, &wh) {
            wh = -wh;
        }
        wh
    }
}

/// Geometric shadowing-masking terms selectable per material. `Smith` and
/// `SmithJoint` use the distribution's lambda; the rest are the classic
/// closed forms over (n.v, n.l).
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GeometricShadow {
    Implicit,
    Neumann,
    Kelemen,
    Schlick,
    CookTorrance,
    Smith,
    SmithJoint,
}

impl Default for GeometricShadow {
    fn default() -> Self {
        GeometricShadow::Smith
    }
}

impl GeometricShadow {
    pub fn g(
        &self,
        wo: &Vector3f,
        wi: &Vector3f,
        wh: &Vector3f,
        distrib: &MicrofacetDistribution,
        roughness: Float,
    ) -> Float {
        let n_v: Float = abs_cos_theta(wo);
        let n_l: Float = abs_cos_theta(wi);
        if n_v == 0.0 as Float || n_l == 0.0 as Float {
            return 0.0 as Float;
        }
        match self {
            GeometricShadow::Implicit => n_l * n_v,
            GeometricShadow::Neumann => n_l * n_v / n_l.max(n_v),
            GeometricShadow::Kelemen => {
                let v_h: Float = vec3_dot_vec3f(wo, wh).abs().max(1e-6);
                n_l * n_v / (v_h * v_h)
            }
            GeometricShadow::Schlick => {
                let k: Float = roughness * roughness * (2.0 as Float / PI).sqrt();
                (n_v / (n_v * (1.0 as Float - k) + k)) * (n_l / (n_l * (1.0 as Float - k) + k))
            }
            GeometricShadow::CookTorrance => {
                let n_h: Float = abs_cos_theta(wh);
                let v_h: Float = vec3_dot_vec3f(wo, wh).abs().max(1e-6);
                clamp_t(
                    (2.0 as Float * n_h * n_v / v_h).min(2.0 as Float * n_h * n_l / v_h),
                    0.0 as Float,
                    1.0 as Float,
                )
            }
            GeometricShadow::Smith => distrib.g1(wo) * distrib.g1(wi),
            GeometricShadow::SmithJoint => distrib.g(wo, wi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::Rng;

    fn distributions() -> Vec<MicrofacetDistribution> {
        vec![
            MicrofacetDistribution::Beckmann(BeckmannDistribution::new(0.3, 0.3)),
            MicrofacetDistribution::TrowbridgeReitz(TrowbridgeReitzDistribution::new(0.5, 0.5)),
            MicrofacetDistribution::Blinn(BlinnDistribution::new(0.4)),
        ]
    }

    #[test]
    fn sampled_normals_match_pdf() {
        let wo = Vector3f {
            x: 0.2,
            y: -0.1,
            z: 0.9,
        }
        .normalize();
        let mut rng = Rng::new(11);
        for distrib in distributions() {
            for _ in 0..512 {
                let u = Point2f {
                    x: rng.uniform_float(),
                    y: rng.uniform_float(),
                };
                let wh = distrib.sample_wh(&wo, &u);
                let pdf = distrib.pdf(&wo, &wh);
                assert!(pdf > 0.0, "zero pdf for sampled half vector");
                assert!((wh.length() - 1.0).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn d_integrates_to_projected_area() {
        // Monte Carlo check that the projected distribution integrates to
        // ~1 over the hemisphere for each D.
        let mut rng = Rng::new(5);
        for distrib in distributions() {
            let n = 200_000;
            let mut sum: f64 = 0.0;
            for _ in 0..n {
                let u = Point2f {
                    x: rng.uniform_float(),
                    y: rng.uniform_float(),
                };
                let wh = crate::core::sampling::uniform_sample_hemisphere(&u);
                sum += (distrib.d(&wh) * abs_cos_theta(&wh)) as f64;
            }
            let integral = sum / n as f64 * 2.0 * std::f64::consts::PI;
            assert!(
                (integral - 1.0).abs() < 0.05,
                "projected area integral {} off for {:?}",
                integral,
                distrib
            );
        }
    }
}
