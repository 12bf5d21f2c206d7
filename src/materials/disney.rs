//! The Disney principled BRDF as a single composite lobe. Sampling draws
//! one internal lobe from a weighted one-sample mixture and reports the
//! mixture pdf summed over all lobes with the same weights; anything else
//! breaks energy consistency across the layered model.

// std
use std::f32::consts::PI;
// spica
use crate::core::base::{clamp_t, lerp, sqr, Float, Spectrum, INV_PI};
use crate::core::geometry::{spherical_direction, vec3_dot_vec3f, Point2f, Vector3f, XYEnum};
use crate::core::microfacet::{MicrofacetDistribution, TrowbridgeReitzDistribution};
use crate::core::reflection::{
    abs_cos_theta, reflect, schlick_r0_from_eta, vec3_same_hemisphere_vec3, BxdfType,
    DisneyFresnel, MicrofacetTransmission,
};
use crate::core::rng::FLOAT_ONE_MINUS_EPSILON;
use crate::core::sampling::cosine_sample_hemisphere;

fn schlick_weight(cos_theta: Float) -> Float {
    let m = clamp_t(1.0 - cos_theta, 0.0, 1.0);
    (m * m) * (m * m) * m
}

/// Generalized Trowbridge-Reitz with gamma = 1, used by the clearcoat
/// layer. The 2 pi ln(alpha^2) normalization is analytic.
fn gtr1(cos_theta_h: Float, alpha: Float) -> Float {
    let alpha2: Float = alpha * alpha;
    (alpha2 - 1.0)
        / (PI * alpha2.ln() * (1.0 as Float + (alpha2 - 1.0) * cos_theta_h * cos_theta_h))
}

/// Separable Smith term with fixed roughness, paired with `gtr1`.
fn smith_g_ggx(cos_theta: Float, alpha: Float) -> Float {
    let alpha2: Float = alpha * alpha;
    let cos2: Float = cos_theta * cos_theta;
    1.0 as Float / (cos_theta + (alpha2 + cos2 - alpha2 * cos2).sqrt())
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum DisneyLobe {
    DiffuseReflection,
    SpecularReflection,
    Clearcoat,
    SpecularTransmission,
    DiffuseTransmission,
}

#[derive(Debug, Clone)]
pub struct DisneyBrdf {
    pub base_color: Spectrum,
    pub metallic: Float,
    pub eta: Float,
    pub roughness: Float,
    pub specular_tint: Float,
    pub anisotropic: Float,
    pub sheen: Float,
    pub sheen_tint: Float,
    pub clearcoat: Float,
    pub clearcoat_gloss: Float,
    pub spec_trans: Float,
    pub flatness: Float,
    pub diff_trans: Float,
    pub thin: bool,
    /// Set when a BSSRDF handles the diffuse transport instead.
    suppress_diffuse: bool,
    // derived
    distribution: TrowbridgeReitzDistribution,
    fresnel: DisneyFresnel,
    cspec0: Spectrum,
    c_sheen: Spectrum,
    clearcoat_alpha: Float,
    spec_trans_lobe: Option<MicrofacetTransmission>,
}

impl DisneyBrdf {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        base_color: Spectrum,
        metallic: Float,
        eta: Float,
        roughness: Float,
        specular_tint: Float,
        anisotropic: Float,
        sheen: Float,
        sheen_tint: Float,
        clearcoat: Float,
        clearcoat_gloss: Float,
        spec_trans: Float,
        flatness: Float,
        diff_trans: Float,
        thin: bool,
    ) -> Self {
        let lum: Float = base_color.y();
        // hue and saturation with luminance divided out
        let c_tint: Spectrum = if lum > 0.0 {
            base_color / lum
        } else {
            Spectrum::new(1.0)
        };
        let c_sheen: Spectrum = lerp(sheen_tint, Spectrum::new(1.0), c_tint);
        let cspec0: Spectrum = lerp(
            metallic,
            lerp(specular_tint, Spectrum::new(1.0), c_tint) * schlick_r0_from_eta(eta),
            base_color,
        );
        let aspect: Float = (1.0 as Float - anisotropic * 0.9).sqrt();
        let ax: Float = (sqr(roughness) / aspect).max(1e-3);
        let ay: Float = (sqr(roughness) * aspect).max(1e-3);
        let spec_trans_lobe = if spec_trans > 0.0 {
            let t: Spectrum = base_color.sqrt() * spec_trans;
            let distribution = if thin {
                // scale roughness with the index of refraction for thin
                // surfaces (Burley 2015)
                let rscaled: Float = (0.65 * eta - 0.35) * roughness;
                TrowbridgeReitzDistribution::new(
                    (sqr(rscaled) / aspect).max(1e-3),
                    (sqr(rscaled) * aspect).max(1e-3),
                )
            } else {
                TrowbridgeReitzDistribution::new(ax, ay)
            };
            Some(MicrofacetTransmission::new(
                t,
                MicrofacetDistribution::TrowbridgeReitz(distribution),
                1.0,
                eta,
            ))
        } else {
            None
        };
        DisneyBrdf {
            base_color,
            metallic,
            eta,
            roughness,
            specular_tint,
            anisotropic,
            sheen,
            sheen_tint,
            clearcoat,
            clearcoat_gloss,
            spec_trans,
            flatness,
            diff_trans,
            thin,
            suppress_diffuse: false,
            distribution: TrowbridgeReitzDistribution::new(ax, ay),
            fresnel: DisneyFresnel::new(cspec0, metallic, eta),
            cspec0,
            c_sheen,
            clearcoat_alpha: lerp(clearcoat_gloss, 0.1, 0.001),
            spec_trans_lobe,
        }
    }
    pub fn with_suppressed_diffuse(mut self) -> Self {
        self.suppress_diffuse = true;
        self
    }
    fn diffuse_weight(&self) -> Float {
        (1.0 as Float - self.metallic) * (1.0 as Float - self.spec_trans)
    }
    /// Sampling weights per lobe, derived from each lobe's approximate
    /// contribution.
    fn lobe_weights(&self) -> [(DisneyLobe, Float); 5] {
        let base_lum: Float = self.base_color.y();
        let dw: Float = self.diffuse_weight();
        let w_diffuse: Float =
            base_lum * dw * if self.thin { 1.0 - self.diff_trans } else { 1.0 };
        let w_spec: Float = self.cspec0.y() * self.metallic;
        let w_clearcoat: Float = self.clearcoat * 0.04;
        let w_spec_trans: Float =
            base_lum * (1.0 as Float - self.metallic) * self.spec_trans;
        let w_diff_trans: Float = if self.thin {
            base_lum * dw * self.diff_trans
        } else {
            0.0
        };
        [
            (DisneyLobe::DiffuseReflection, w_diffuse),
            (DisneyLobe::SpecularReflection, w_spec),
            (DisneyLobe::Clearcoat, w_clearcoat),
            (DisneyLobe::SpecularTransmission, w_spec_trans),
            (DisneyLobe::DiffuseTransmission, w_diff_trans),
        ]
    }
    fn f_diffuse_group(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        let cos_o: Float = abs_cos_theta(wo);
        let cos_i: Float = abs_cos_theta(wi);
        let mut wh: Vector3f = *wo + *wi;
        if wh.x == 0.0 && wh.y == 0.0 && wh.z == 0.0 {
            return Spectrum::default();
        }
        wh = wh.normalize();
        let cos_theta_d: Float = vec3_dot_vec3f(wi, &wh);
        let fo: Float = schlick_weight(cos_o);
        let fi: Float = schlick_weight(cos_i);
        let dw: Float = self.diffuse_weight();
        let dt: Float = if self.thin { self.diff_trans } else { 0.0 };
        let mut f: Spectrum = Spectrum::default();
        // base diffuse and the Hanrahan-Krueger flat approximation
        let diffuse_scale: Float = if self.suppress_diffuse {
            0.0
        } else if self.thin {
            dw * (1.0 - self.flatness) * (1.0 - dt)
        } else {
            dw
        };
        if diffuse_scale > 0.0 {
            f += self.base_color
                * (INV_PI * diffuse_scale * (1.0 - 0.5 * fo) * (1.0 - 0.5 * fi));
        }
        if self.thin && self.flatness > 0.0 {
            let fss90: Float = cos_theta_d * cos_theta_d * self.roughness;
            let fss: Float = lerp(fo, 1.0, fss90) * lerp(fi, 1.0, fss90);
            let ss: Float = 1.25
                * (fss * (1.0 as Float / (cos_o + cos_i).max(1e-4) - 0.5 as Float)
                    + 0.5 as Float);
            f += self.base_color * (INV_PI * dw * self.flatness * (1.0 - dt) * ss);
        }
        // retro-reflection
        let rr: Float = 2.0 as Float * self.roughness * cos_theta_d * cos_theta_d;
        f += self.base_color * (INV_PI * dw * rr * (fo + fi + fo * fi * (rr - 1.0)));
        // sheen
        if self.sheen > 0.0 {
            f += self.c_sheen * (dw * self.sheen * schlick_weight(cos_theta_d));
        }
        f
    }
    fn f_specular(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        let cos_o: Float = abs_cos_theta(wo);
        let cos_i: Float = abs_cos_theta(wi);
        if cos_o == 0.0 || cos_i == 0.0 {
            return Spectrum::default();
        }
        let mut wh: Vector3f = *wo + *wi;
        if wh.x == 0.0 && wh.y == 0.0 && wh.z == 0.0 {
            return Spectrum::default();
        }
        wh = wh.normalize();
        let fr: Spectrum = self.fresnel.evaluate(vec3_dot_vec3f(wo, &wh));
        let distribution = MicrofacetDistribution::TrowbridgeReitz(self.distribution);
        distribution.d(&wh) * distribution.g(wo, wi) * fr
            / (4.0 as Float * cos_o * cos_i)
    }
    fn f_clearcoat(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        let cos_o: Float = abs_cos_theta(wo);
        let cos_i: Float = abs_cos_theta(wi);
        if cos_o == 0.0 || cos_i == 0.0 {
            return Spectrum::default();
        }
        let mut wh: Vector3f = *wo + *wi;
        if wh.x == 0.0 && wh.y == 0.0 && wh.z == 0.0 {
            return Spectrum::default();
        }
        wh = wh.normalize();
        let dr: Float = gtr1(abs_cos_theta(&wh), self.clearcoat_alpha);
        let fr: Float = lerp(schlick_weight(vec3_dot_vec3f(wo, &wh)), 0.04, 1.0);
        let gr: Float = smith_g_ggx(cos_o, 0.25) * smith_g_ggx(cos_i, 0.25);
        Spectrum::new(self.clearcoat * gr * fr * dr * 0.25 as Float)
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if vec3_same_hemisphere_vec3(wo, wi) {
            let mut f: Spectrum = self.f_diffuse_group(wo, wi);
            f += self.f_specular(wo, wi);
            if self.clearcoat > 0.0 {
                f += self.f_clearcoat(wo, wi);
            }
            f
        } else {
            let mut f: Spectrum = Spectrum::default();
            if let Some(ref lobe) = self.spec_trans_lobe {
                f += lobe.f(wo, wi);
            }
            if self.thin && self.diff_trans > 0.0 {
                f += self.base_color
                    * (INV_PI * self.diffuse_weight() * self.diff_trans);
            }
            f
        }
    }
    fn lobe_pdf(&self, lobe: DisneyLobe, wo: &Vector3f, wi: &Vector3f) -> Float {
        match lobe {
            DisneyLobe::DiffuseReflection => {
                if vec3_same_hemisphere_vec3(wo, wi) {
                    abs_cos_theta(wi) * INV_PI
                } else {
                    0.0
                }
            }
            DisneyLobe::SpecularReflection => {
                if !vec3_same_hemisphere_vec3(wo, wi) {
                    return 0.0;
                }
                let wh: Vector3f = (*wo + *wi).normalize();
                let distribution = MicrofacetDistribution::TrowbridgeReitz(self.distribution);
                distribution.pdf(wo, &wh) / (4.0 * vec3_dot_vec3f(wo, &wh))
            }
            DisneyLobe::Clearcoat => {
                if !vec3_same_hemisphere_vec3(wo, wi) {
                    return 0.0;
                }
                let wh: Vector3f = (*wo + *wi).normalize();
                let dr: Float = gtr1(abs_cos_theta(&wh), self.clearcoat_alpha);
                dr * abs_cos_theta(&wh) / (4.0 * vec3_dot_vec3f(wo, &wh)).max(1e-6)
            }
            DisneyLobe::SpecularTransmission => {
                if let Some(ref lobe) = self.spec_trans_lobe {
                    lobe.pdf(wo, wi)
                } else {
                    0.0
                }
            }
            DisneyLobe::DiffuseTransmission => {
                if !vec3_same_hemisphere_vec3(wo, wi) {
                    abs_cos_theta(wi) * INV_PI
                } else {
                    0.0
                }
            }
        }
    }
    /// Mixture pdf summed over all lobes with the sampling weights.
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        let weights = self.lobe_weights();
        let total: Float = weights.iter().map(|(_, w)| *w).sum();
        if total <= 0.0 as Float {
            return 0.0 as Float;
        }
        let mut pdf: Float = 0.0;
        for (lobe, w) in weights.iter() {
            if *w > 0.0 {
                pdf += w * self.lobe_pdf(*lobe, wo, wi);
            }
        }
        pdf / total
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        u: &Point2f,
        pdf: &mut Float,
        _sampled_type: &mut u8,
    ) -> Spectrum {
        *pdf = 0.0 as Float;
        if wo.z == 0.0 as Float {
            return Spectrum::default();
        }
        let weights = self.lobe_weights();
        let total: Float = weights.iter().map(|(_, w)| *w).sum();
        if total <= 0.0 as Float {
            return Spectrum::default();
        }
        // pick one lobe proportional to its weight and remap the sample
        let pick: Float = u[XYEnum::X] * total;
        let mut acc: Float = 0.0;
        let mut chosen: DisneyLobe = DisneyLobe::DiffuseReflection;
        let mut u_remap: Float = 0.0;
        for (lobe, w) in weights.iter() {
            if *w <= 0.0 {
                continue;
            }
            if pick < acc + w {
                chosen = *lobe;
                u_remap = clamp_t((pick - acc) / w, 0.0 as Float, FLOAT_ONE_MINUS_EPSILON);
                break;
            }
            acc += w;
        }
        let u2 = Point2f {
            x: u_remap,
            y: u[XYEnum::Y],
        };
        match chosen {
            DisneyLobe::DiffuseReflection => {
                *wi = cosine_sample_hemisphere(&u2);
                if wo.z < 0.0 {
                    wi.z *= -1.0;
                }
            }
            DisneyLobe::SpecularReflection => {
                let distribution = MicrofacetDistribution::TrowbridgeReitz(self.distribution);
                let wh: Vector3f = distribution.sample_wh(wo, &u2);
                if vec3_dot_vec3f(wo, &wh) < 0.0 {
                    return Spectrum::default();
                }
                *wi = reflect(wo, &wh);
                if !vec3_same_hemisphere_vec3(wo, wi) {
                    return Spectrum::default();
                }
            }
            DisneyLobe::Clearcoat => {
                // gtr1 can be importance sampled in closed form
                let alpha2: Float = self.clearcoat_alpha * self.clearcoat_alpha;
                let cos_theta_h: Float = ((1.0 as Float - alpha2.powf(1.0 - u2.x))
                    / (1.0 as Float - alpha2))
                    .max(0.0)
                    .sqrt();
                let sin_theta_h: Float = (0.0 as Float)
                    .max(1.0 as Float - cos_theta_h * cos_theta_h)
                    .sqrt();
                let phi: Float = 2.0 as Float * PI * u2.y;
                let mut wh: Vector3f = spherical_direction(sin_theta_h, cos_theta_h, phi);
                if !vec3_same_hemisphere_vec3(wo, &wh) {
                    wh = -wh;
                }
                *wi = reflect(wo, &wh);
                if !vec3_same_hemisphere_vec3(wo, wi) {
                    return Spectrum::default();
                }
            }
            DisneyLobe::SpecularTransmission => {
                if let Some(ref lobe) = self.spec_trans_lobe {
                    let mut lobe_pdf: Float = 0.0;
                    let mut st: u8 = 0;
                    let _ = lobe.sample_f(wo, wi, &u2, &mut lobe_pdf, &mut st);
                    if lobe_pdf == 0.0 as Float {
                        return Spectrum::default();
                    }
                } else {
                    return Spectrum::default();
                }
            }
            DisneyLobe::DiffuseTransmission => {
                *wi = cosine_sample_hemisphere(&u2);
                if wo.z > 0.0 {
                    wi.z *= -1.0;
                }
            }
        }
        *pdf = self.pdf(wo, wi);
        if *pdf == 0.0 as Float {
            return Spectrum::default();
        }
        self.f(wo, wi)
    }
    pub fn get_type(&self) -> u8 {
        let mut t: u8 = BxdfType::BsdfReflection as u8
            | BxdfType::BsdfDiffuse as u8
            | BxdfType::BsdfGlossy as u8;
        if self.spec_trans > 0.0 || (self.thin && self.diff_trans > 0.0) {
            t |= BxdfType::BsdfTransmission as u8;
        }
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::Rng;

    fn test_brdf() -> DisneyBrdf {
        DisneyBrdf::new(
            Spectrum::rgb(0.8, 0.4, 0.2),
            0.8,  // metallic
            1.5,  // eta
            0.3,  // roughness
            0.0,  // specular tint
            0.0,  // anisotropic
            0.0,  // sheen
            0.5,  // sheen tint
            0.5,  // clearcoat
            1.0,  // clearcoat gloss
            0.0,  // spec trans
            0.0,  // flatness
            0.0,  // diff trans
            false,
        )
    }

    #[test]
    fn sampled_pdf_matches_queried_pdf() {
        let brdf = test_brdf();
        let wo = Vector3f {
            x: 0.3,
            y: 0.2,
            z: 0.9,
        }
        .normalize();
        let mut rng = Rng::new(42);
        let mut checked = 0;
        for _ in 0..4096 {
            let u = Point2f {
                x: rng.uniform_float(),
                y: rng.uniform_float(),
            };
            let mut wi = Vector3f::default();
            let mut pdf: Float = 0.0;
            let mut st: u8 = 0;
            let f = brdf.sample_f(&wo, &mut wi, &u, &mut pdf, &mut st);
            if pdf == 0.0 {
                continue;
            }
            checked += 1;
            let pdf_query = brdf.pdf(&wo, &wi);
            assert!(
                (pdf / pdf_query - 1.0).abs() < 0.01,
                "pdf mismatch: sampled {} queried {}",
                pdf,
                pdf_query
            );
            let f_query = brdf.f(&wo, &wi);
            for c in 0..3 {
                assert!((f.c[c] - f_query.c[c]).abs() < 1e-4);
            }
        }
        assert!(checked > 3000);
    }

    #[test]
    fn diffuse_disney_conserves_energy() {
        let brdf = DisneyBrdf::new(
            Spectrum::new(0.9),
            0.0,
            1.5,
            0.5,
            0.0,
            0.0,
            0.0,
            0.5,
            0.0,
            1.0,
            0.0,
            0.0,
            0.0,
            false,
        );
        let wo = Vector3f {
            x: 0.0,
            y: 0.0,
            z: 1.0,
        };
        let mut rng = Rng::new(9);
        let n = 100_000;
        let mut sum = [0.0_f64; 3];
        for _ in 0..n {
            let u = Point2f {
                x: rng.uniform_float(),
                y: rng.uniform_float(),
            };
            let mut wi = Vector3f::default();
            let mut pdf: Float = 0.0;
            let mut st: u8 = 0;
            let f = brdf.sample_f(&wo, &mut wi, &u, &mut pdf, &mut st);
            if pdf > 0.0 {
                for c in 0..3 {
                    sum[c] += (f.c[c] * abs_cos_theta(&wi) / pdf) as f64;
                }
            }
        }
        for s in sum.iter() {
            assert!(s / n as f64 <= 1.01, "energy gain: {}", s / n as f64);
        }
    }
}
