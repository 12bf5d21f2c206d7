//! When light is incident on a surface, the surface scatters it. Each
//! scattering lobe is a `Bxdf`; the `Bsdf` aggregates the lobes active at
//! one shading point and converts between world space and the local
//! shading frame.

// std
use std::f32::consts::PI;
// others
use smallvec::SmallVec;
// spica
use crate::core::base::{clamp_t, lerp, radians, Float, Spectrum, INV_PI};
use crate::core::geometry::{
    nrm_cross_vec3, nrm_dot_vec3f, nrm_faceforward_vec3, vec3_dot_nrmf, vec3_dot_vec3f, Normal3f,
    Point2f, Vector3f, XYEnum,
};
use crate::core::interaction::SurfaceInteraction;
use crate::core::microfacet::{GeometricShadow, MicrofacetDistribution};
use crate::core::rng::FLOAT_ONE_MINUS_EPSILON;
use crate::core::sampling::cosine_sample_hemisphere;
use crate::materials::disney::DisneyBrdf;
use crate::materials::hair::HairBsdf;
use crate::materials::measured::{FourierBsdf, MerlBrdf};

const MAX_BXDFS: u8 = 8_u8;

fn schlick_weight(cos_theta: Float) -> Float {
    let m = clamp_t(1.0 - cos_theta, 0.0, 1.0);
    (m * m) * (m * m) * m
}

pub fn fr_schlick(r0: Float, cos_theta: Float) -> Float {
    lerp(schlick_weight(cos_theta), r0, 1.0)
}

pub fn fr_schlick_spectrum(r0: Spectrum, cos_theta: Float) -> Spectrum {
    lerp(schlick_weight(cos_theta), r0, Spectrum::from(1.0))
}

pub fn schlick_r0_from_eta(eta: Float) -> Float {
    let r = (eta - 1.0) / (eta + 1.0);
    r * r
}

#[repr(u8)]
pub enum BxdfType {
    BsdfReflection = 1,
    BsdfTransmission = 2,
    BsdfDiffuse = 4,
    BsdfGlossy = 8,
    BsdfSpecular = 16,
    BsdfAll = 31,
}

/// The lobes active at one shading point, sharing a local frame built from
/// the shading normal and surface tangent. Lobes carry a sampling weight;
/// `sample_f` draws one lobe proportional to weight and reports the
/// weighted mixture pdf, which keeps multi-lobe estimators unbiased.
#[derive(Debug, Default, Clone)]
pub struct Bsdf {
    pub eta: Float,
    /// shading normal
    pub ns: Normal3f,
    /// geometric normal
    pub ng: Normal3f,
    pub ss: Vector3f,
    pub ts: Vector3f,
    pub bxdfs: SmallVec<[Bxdf; 8]>,
    lobe_weights: SmallVec<[Float; 8]>,
}

impl Bsdf {
    pub fn new(si: &SurfaceInteraction, eta: Float) -> Self {
        // orthogonalize the tangent against the shading normal
        let ns = si.shading_n;
        let mut ss = si.dpdu;
        let proj: Float = vec3_dot_nrmf(&ss, &ns);
        ss = ss - Vector3f::from(ns) * proj;
        if ss.length_squared() > 1e-9 as Float {
            ss = ss.normalize();
        } else {
            let mut s2 = Vector3f::default();
            let mut t2 = Vector3f::default();
            crate::core::geometry::vec3_coordinate_system(&Vector3f::from(ns), &mut s2, &mut t2);
            ss = s2;
        }
        Bsdf {
            eta,
            ns,
            ng: si.n,
            ss,
            ts: nrm_cross_vec3(&ns, &ss),
            bxdfs: SmallVec::new(),
            lobe_weights: SmallVec::new(),
        }
    }
    pub fn add(&mut self, b: Bxdf) {
        self.add_weighted(b, 1.0 as Float);
    }
    pub fn add_weighted(&mut self, b: Bxdf, weight: Float) {
        assert!(self.bxdfs.len() < MAX_BXDFS as usize);
        self.bxdfs.push(b);
        self.lobe_weights.push(weight.max(1e-4 as Float));
    }
    pub fn num_components(&self, flags: u8) -> u8 {
        let mut num: u8 = 0;
        for b in &self.bxdfs {
            if b.matches_flags(flags) {
                num += 1;
            }
        }
        num
    }
    pub fn world_to_local(&self, v: &Vector3f) -> Vector3f {
        Vector3f {
            x: vec3_dot_vec3f(v, &self.ss),
            y: vec3_dot_vec3f(v, &self.ts),
            z: vec3_dot_vec3f(v, &Vector3f::from(self.ns)),
        }
    }
    pub fn local_to_world(&self, v: &Vector3f) -> Vector3f {
        Vector3f {
            x: self.ss.x * v.x + self.ts.x * v.y + self.ns.x * v.z,
            y: self.ss.y * v.x + self.ts.y * v.y + self.ns.y * v.z,
            z: self.ss.z * v.x + self.ts.z * v.y + self.ns.z * v.z,
        }
    }
    pub fn f(&self, wo_w: &Vector3f, wi_w: &Vector3f, flags: u8) -> Spectrum {
        let wi: Vector3f = self.world_to_local(wi_w);
        let wo: Vector3f = self.world_to_local(wo_w);
        if wo.z == 0.0 as Float {
            return Spectrum::default();
        }
        let reflect: bool =
            vec3_dot_nrmf(wi_w, &self.ng) * vec3_dot_nrmf(wo_w, &self.ng) > 0.0 as Float;
        let mut f: Spectrum = Spectrum::default();
        for b in &self.bxdfs {
            if b.matches_flags(flags)
                && ((reflect && (b.get_type() & BxdfType::BsdfReflection as u8 > 0_u8))
                    || (!reflect && (b.get_type() & BxdfType::BsdfTransmission as u8 > 0_u8)))
            {
                f += b.f(&wo, &wi);
            }
        }
        f
    }
    fn matching_weight_sum(&self, flags: u8) -> Float {
        let mut sum: Float = 0.0;
        for (i, b) in self.bxdfs.iter().enumerate() {
            if b.matches_flags(flags) {
                sum += self.lobe_weights[i];
            }
        }
        sum
    }
    /// Draw one lobe proportional to weight and sample it; the returned
    /// pdf is the weighted mixture over all matching lobes.
    pub fn sample_f(
        &self,
        wo_world: &Vector3f,
        wi_world: &mut Vector3f,
        u: &Point2f,
        pdf: &mut Float,
        bsdf_flags: u8,
        sampled_type: &mut u8,
    ) -> Spectrum {
        let matching_comps: u8 = self.num_components(bsdf_flags);
        if matching_comps == 0 {
            *pdf = 0.0 as Float;
            *sampled_type = 0_u8;
            return Spectrum::default();
        }
        let weight_sum: Float = self.matching_weight_sum(bsdf_flags);
        // choose which lobe to sample, proportional to weight; round-off
        // past the last interval falls back to the last matching lobe
        let mut chosen: usize = usize::max_value();
        let mut chosen_weight: Float = 0.0;
        let mut u_remap: Float = 0.0;
        let mut cdf: Float = 0.0;
        let pick: Float = u[XYEnum::X] * weight_sum;
        for (i, b) in self.bxdfs.iter().enumerate() {
            if !b.matches_flags(bsdf_flags) {
                continue;
            }
            let w = self.lobe_weights[i];
            chosen = i;
            chosen_weight = w;
            u_remap = clamp_t((pick - cdf) / w, 0.0 as Float, FLOAT_ONE_MINUS_EPSILON);
            if pick < cdf + w {
                break;
            }
            cdf += w;
        }
        if chosen == usize::max_value() {
            *pdf = 0.0 as Float;
            return Spectrum::default();
        }
        let bxdf = &self.bxdfs[chosen];
        let u_remapped: Point2f = Point2f {
            x: u_remap,
            y: u[XYEnum::Y],
        };
        let mut wi: Vector3f = Vector3f::default();
        let wo: Vector3f = self.world_to_local(wo_world);
        if wo.z == 0.0 as Float {
            return Spectrum::default();
        }
        *pdf = 0.0 as Float;
        if *sampled_type != 0_u8 {
            *sampled_type = bxdf.get_type();
        }
        let mut f: Spectrum = bxdf.sample_f(&wo, &mut wi, &u_remapped, pdf, sampled_type);
        if *pdf == 0.0 as Float {
            if *sampled_type != 0_u8 {
                *sampled_type = 0_u8;
            }
            return Spectrum::default();
        }
        *wi_world = self.local_to_world(&wi);
        // mixture pdf over all matching lobes, weighted as chosen
        if (bxdf.get_type() & BxdfType::BsdfSpecular as u8 == 0_u8) && matching_comps > 1_u8 {
            *pdf *= chosen_weight;
            for (i, b) in self.bxdfs.iter().enumerate() {
                if i != chosen && b.matches_flags(bsdf_flags) {
                    *pdf += self.lobe_weights[i] * b.pdf(&wo, &wi);
                }
            }
            *pdf /= weight_sum;
        } else if bxdf.get_type() & BxdfType::BsdfSpecular as u8 != 0_u8 {
            *pdf *= chosen_weight / weight_sum;
        }
        // re-evaluate the full set of matching lobes for the sampled wi
        if bxdf.get_type() & BxdfType::BsdfSpecular as u8 == 0_u8 {
            let reflect: bool = vec3_dot_nrmf(&*wi_world, &self.ng)
                * vec3_dot_nrmf(wo_world, &self.ng)
                > 0.0 as Float;
            f = Spectrum::default();
            for b in &self.bxdfs {
                if b.matches_flags(bsdf_flags)
                    && ((reflect && ((b.get_type() & BxdfType::BsdfReflection as u8) != 0_u8))
                        || (!reflect
                            && ((b.get_type() & BxdfType::BsdfTransmission as u8) != 0_u8)))
                {
                    f += b.f(&wo, &wi);
                }
            }
        }
        f
    }
    pub fn pdf(&self, wo_world: &Vector3f, wi_world: &Vector3f, bsdf_flags: u8) -> Float {
        if self.bxdfs.is_empty() {
            return 0.0 as Float;
        }
        let wo: Vector3f = self.world_to_local(wo_world);
        let wi: Vector3f = self.world_to_local(wi_world);
        if wo.z == 0.0 as Float {
            return 0.0 as Float;
        }
        let weight_sum: Float = self.matching_weight_sum(bsdf_flags);
        if weight_sum <= 0.0 as Float {
            return 0.0 as Float;
        }
        let mut pdf: Float = 0.0;
        for (i, b) in self.bxdfs.iter().enumerate() {
            if b.matches_flags(bsdf_flags) {
                pdf += self.lobe_weights[i] * b.pdf(&wo, &wi);
            }
        }
        pdf / weight_sum
    }
}

#[derive(Debug, Clone)]
pub enum Bxdf {
    SpecRefl(SpecularReflection),
    FresnelSpec(FresnelSpecular),
    LambertianRefl(LambertianReflection),
    LambertianTrans(LambertianTransmission),
    OrenNayarRefl(OrenNayar),
    MicrofacetRefl(MicrofacetReflection),
    MicrofacetTrans(MicrofacetTransmission),
    AshikhminShirley(AshikhminShirley),
    Phong(PhongLobe),
    DistBrdf(DistributionBrdf),
    Fabric(Fabric),
    Coat(Coat),
    DoubleSided(DoubleSided),
    // materials/disney.rs
    Disney(DisneyBrdf),
    // materials/hair.rs
    Hair(HairBsdf),
    // materials/measured.rs
    Merl(MerlBrdf),
    Fourier(FourierBsdf),
}

impl Bxdf {
    pub fn matches_flags(&self, t: u8) -> bool {
        self.get_type() & t == self.get_type()
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        match self {
            Bxdf::SpecRefl(bxdf) => bxdf.f(wo, wi),
            Bxdf::FresnelSpec(bxdf) => bxdf.f(wo, wi),
            Bxdf::LambertianRefl(bxdf) => bxdf.f(wo, wi),
            Bxdf::LambertianTrans(bxdf) => bxdf.f(wo, wi),
            Bxdf::OrenNayarRefl(bxdf) => bxdf.f(wo, wi),
            Bxdf::MicrofacetRefl(bxdf) => bxdf.f(wo, wi),
            Bxdf::MicrofacetTrans(bxdf) => bxdf.f(wo, wi),
            Bxdf::AshikhminShirley(bxdf) => bxdf.f(wo, wi),
            Bxdf::Phong(bxdf) => bxdf.f(wo, wi),
            Bxdf::DistBrdf(bxdf) => bxdf.f(wo, wi),
            Bxdf::Fabric(bxdf) => bxdf.f(wo, wi),
            Bxdf::Coat(bxdf) => bxdf.f(wo, wi),
            Bxdf::DoubleSided(bxdf) => bxdf.f(wo, wi),
            Bxdf::Disney(bxdf) => bxdf.f(wo, wi),
            Bxdf::Hair(bxdf) => bxdf.f(wo, wi),
            Bxdf::Merl(bxdf) => bxdf.f(wo, wi),
            Bxdf::Fourier(bxdf) => bxdf.f(wo, wi),
        }
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        u: &Point2f,
        pdf: &mut Float,
        sampled_type: &mut u8,
    ) -> Spectrum {
        match self {
            Bxdf::SpecRefl(bxdf) => bxdf.sample_f(wo, wi, u, pdf, sampled_type),
            Bxdf::FresnelSpec(bxdf) => bxdf.sample_f(wo, wi, u, pdf, sampled_type),
            Bxdf::MicrofacetRefl(bxdf) => bxdf.sample_f(wo, wi, u, pdf, sampled_type),
            Bxdf::MicrofacetTrans(bxdf) => bxdf.sample_f(wo, wi, u, pdf, sampled_type),
            Bxdf::AshikhminShirley(bxdf) => bxdf.sample_f(wo, wi, u, pdf, sampled_type),
            Bxdf::Phong(bxdf) => bxdf.sample_f(wo, wi, u, pdf, sampled_type),
            Bxdf::DistBrdf(bxdf) => bxdf.sample_f(wo, wi, u, pdf, sampled_type),
            Bxdf::Coat(bxdf) => bxdf.sample_f(wo, wi, u, pdf, sampled_type),
            Bxdf::DoubleSided(bxdf) => bxdf.sample_f(wo, wi, u, pdf, sampled_type),
            Bxdf::Disney(bxdf) => bxdf.sample_f(wo, wi, u, pdf, sampled_type),
            Bxdf::Hair(bxdf) => bxdf.sample_f(wo, wi, u, pdf, sampled_type),
            Bxdf::LambertianTrans(bxdf) => bxdf.sample_f(wo, wi, u, pdf, sampled_type),
            // the remaining lobes share the cosine-weighted default
            _ => self.default_sample_f(wo, wi, u, pdf, sampled_type),
        }
    }
    fn default_sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        u: &Point2f,
        pdf: &mut Float,
        _sampled_type: &mut u8,
    ) -> Spectrum {
        *wi = cosine_sample_hemisphere(u);
        if wo.z < 0.0 {
            wi.z *= -1.0;
        }
        *pdf = self.pdf(wo, wi);
        self.f(wo, wi)
    }
    /// Needs to agree with `sample_f` for every lobe; the Monte Carlo
    /// estimators fall apart otherwise.
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        match self {
            Bxdf::SpecRefl(bxdf) => bxdf.pdf(wo, wi),
            Bxdf::FresnelSpec(bxdf) => bxdf.pdf(wo, wi),
            Bxdf::MicrofacetRefl(bxdf) => bxdf.pdf(wo, wi),
            Bxdf::MicrofacetTrans(bxdf) => bxdf.pdf(wo, wi),
            Bxdf::AshikhminShirley(bxdf) => bxdf.pdf(wo, wi),
            Bxdf::Phong(bxdf) => bxdf.pdf(wo, wi),
            Bxdf::DistBrdf(bxdf) => bxdf.pdf(wo, wi),
            Bxdf::Coat(bxdf) => bxdf.pdf(wo, wi),
            Bxdf::DoubleSided(bxdf) => bxdf.pdf(wo, wi),
            Bxdf::Disney(bxdf) => bxdf.pdf(wo, wi),
            Bxdf::Hair(bxdf) => bxdf.pdf(wo, wi),
            Bxdf::LambertianTrans(bxdf) => bxdf.pdf(wo, wi),
            _ => self.default_pdf(wo, wi),
        }
    }
    fn default_pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if vec3_same_hemisphere_vec3(wo, wi) {
            abs_cos_theta(wi) * INV_PI
        } else {
            0.0
        }
    }
    pub fn get_type(&self) -> u8 {
        match self {
            Bxdf::SpecRefl(bxdf) => bxdf.get_type(),
            Bxdf::FresnelSpec(bxdf) => bxdf.get_type(),
            Bxdf::LambertianRefl(bxdf) => bxdf.get_type(),
            Bxdf::LambertianTrans(bxdf) => bxdf.get_type(),
            Bxdf::OrenNayarRefl(bxdf) => bxdf.get_type(),
            Bxdf::MicrofacetRefl(bxdf) => bxdf.get_type(),
            Bxdf::MicrofacetTrans(bxdf) => bxdf.get_type(),
            Bxdf::AshikhminShirley(bxdf) => bxdf.get_type(),
            Bxdf::Phong(bxdf) => bxdf.get_type(),
            Bxdf::DistBrdf(bxdf) => bxdf.get_type(),
            Bxdf::Fabric(bxdf) => bxdf.get_type(),
            Bxdf::Coat(bxdf) => bxdf.get_type(),
            Bxdf::DoubleSided(bxdf) => bxdf.get_type(),
            Bxdf::Disney(bxdf) => bxdf.get_type(),
            Bxdf::Hair(bxdf) => bxdf.get_type(),
            Bxdf::Merl(bxdf) => bxdf.get_type(),
            Bxdf::Fourier(bxdf) => bxdf.get_type(),
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub enum Fresnel {
    NoOp(FresnelNoOp),
    Constant(FresnelConstant),
    Conductor(FresnelConductor),
    Dielectric(FresnelDielectric),
    Schlick(FresnelSchlick),
    Disney(DisneyFresnel),
}

impl Fresnel {
    pub fn evaluate(&self, cos_theta_i: Float) -> Spectrum {
        match self {
            Fresnel::NoOp(fresnel) => fresnel.evaluate(cos_theta_i),
            Fresnel::Constant(fresnel) => fresnel.evaluate(cos_theta_i),
            Fresnel::Conductor(fresnel) => fresnel.evaluate(cos_theta_i),
            Fresnel::Dielectric(fresnel) => fresnel.evaluate(cos_theta_i),
            Fresnel::Schlick(fresnel) => fresnel.evaluate(cos_theta_i),
            Fresnel::Disney(fresnel) => fresnel.evaluate(cos_theta_i),
        }
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct FresnelNoOp {}

impl FresnelNoOp {
    pub fn evaluate(&self, _cos_theta_i: Float) -> Spectrum {
        Spectrum::new(1.0 as Float)
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct FresnelConstant {
    pub value: Spectrum,
}

impl FresnelConstant {
    pub fn evaluate(&self, _cos_theta_i: Float) -> Spectrum {
        self.value
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct FresnelConductor {
    pub eta_i: Spectrum,
    pub eta_t: Spectrum,
    pub k: Spectrum,
}

impl FresnelConductor {
    pub fn evaluate(&self, cos_theta_i: Float) -> Spectrum {
        fr_conductor(cos_theta_i.abs(), self.eta_i, self.eta_t, self.k)
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct FresnelDielectric {
    pub eta_i: Float,
    pub eta_t: Float,
}

impl FresnelDielectric {
    pub fn evaluate(&self, cos_theta_i: Float) -> Spectrum {
        Spectrum::new(fr_dielectric(cos_theta_i, self.eta_i, self.eta_t))
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct FresnelSchlick {
    pub r0: Spectrum,
}

impl FresnelSchlick {
    pub fn evaluate(&self, cos_theta_i: Float) -> Spectrum {
        fr_schlick_spectrum(self.r0, cos_theta_i.abs())
    }
}

/// Specialized Fresnel used by the Disney specular lobe: a metallic-driven
/// mixture of dielectric Fresnel and the Schlick approximation.
#[derive(Debug, Default, Copy, Clone)]
pub struct DisneyFresnel {
    pub r0: Spectrum,
    pub metallic: Float,
    pub eta: Float,
}

impl DisneyFresnel {
    pub fn new(r0: Spectrum, metallic: Float, eta: Float) -> DisneyFresnel {
        DisneyFresnel { r0, metallic, eta }
    }
    pub fn evaluate(&self, cos_i: Float) -> Spectrum {
        lerp(
            self.metallic,
            Spectrum::from(fr_dielectric(cos_i, 1.0, self.eta)),
            fr_schlick_spectrum(self.r0, cos_i),
        )
    }
}

/// Perfect mirror.
#[derive(Debug, Copy, Clone)]
pub struct SpecularReflection {
    pub r: Spectrum,
    pub fresnel: Fresnel,
}

impl SpecularReflection {
    pub fn new(r: Spectrum, fresnel: Fresnel) -> Self {
        SpecularReflection { r, fresnel }
    }
    pub fn f(&self, _wo: &Vector3f, _wi: &Vector3f) -> Spectrum {
        Spectrum::new(0.0 as Float)
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        _sample: &Point2f,
        pdf: &mut Float,
        _sampled_type: &mut u8,
    ) -> Spectrum {
        // compute perfect specular reflection direction
        *wi = Vector3f {
            x: -wo.x,
            y: -wo.y,
            z: wo.z,
        };
        *pdf = 1.0 as Float;
        let cos_theta_i: Float = cos_theta(wi);
        self.fresnel.evaluate(cos_theta_i) * self.r / abs_cos_theta(wi)
    }
    pub fn pdf(&self, _wo: &Vector3f, _wi: &Vector3f) -> Float {
        0.0 as Float
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfReflection as u8 | BxdfType::BsdfSpecular as u8
    }
}

/// Smooth dielectric: Fresnel-weighted choice between perfect reflection
/// and refraction.
#[derive(Debug, Copy, Clone)]
pub struct FresnelSpecular {
    pub r: Spectrum,
    pub t: Spectrum,
    pub eta_a: Float,
    pub eta_b: Float,
}

impl FresnelSpecular {
    pub fn new(r: Spectrum, t: Spectrum, eta_a: Float, eta_b: Float) -> Self {
        FresnelSpecular { r, t, eta_a, eta_b }
    }
    pub fn f(&self, _wo: &Vector3f, _wi: &Vector3f) -> Spectrum {
        Spectrum::new(0.0 as Float)
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        sample: &Point2f,
        pdf: &mut Float,
        sampled_type: &mut u8,
    ) -> Spectrum {
        let ct: Float = cos_theta(wo);
        let f: Float = fr_dielectric(ct, self.eta_a, self.eta_b);
        if sample[XYEnum::X] < f {
            // specular reflection
            *wi = Vector3f {
                x: -wo.x,
                y: -wo.y,
                z: wo.z,
            };
            if *sampled_type != 0_u8 {
                *sampled_type = BxdfType::BsdfReflection as u8 | BxdfType::BsdfSpecular as u8;
            }
            *pdf = f;
            self.r * f / abs_cos_theta(wi)
        } else {
            // specular transmission
            let entering: bool = ct > 0.0 as Float;
            let eta_i = if entering { self.eta_a } else { self.eta_b };
            let eta_t = if entering { self.eta_b } else { self.eta_a };
            if !refract(
                wo,
                &nrm_faceforward_vec3(
                    &Normal3f {
                        x: 0.0,
                        y: 0.0,
                        z: 1.0,
                    },
                    wo,
                ),
                eta_i / eta_t,
                wi,
            ) {
                return Spectrum::default();
            }
            let mut ft: Spectrum = self.t * (1.0 as Float - f);
            // account for non-symmetry of refraction in radiance transport
            ft *= Spectrum::new((eta_i * eta_i) / (eta_t * eta_t));
            if *sampled_type != 0_u8 {
                *sampled_type = BxdfType::BsdfTransmission as u8 | BxdfType::BsdfSpecular as u8;
            }
            *pdf = 1.0 as Float - f;
            ft / abs_cos_theta(wi)
        }
    }
    pub fn pdf(&self, _wo: &Vector3f, _wi: &Vector3f) -> Float {
        0.0 as Float
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfReflection as u8
            | BxdfType::BsdfTransmission as u8
            | BxdfType::BsdfSpecular as u8
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct LambertianReflection {
    pub r: Spectrum,
}

impl LambertianReflection {
    pub fn new(r: Spectrum) -> Self {
        LambertianReflection { r }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        self.r * Spectrum::new(INV_PI)
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfDiffuse as u8 | BxdfType::BsdfReflection as u8
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct LambertianTransmission {
    pub t: Spectrum,
}

impl LambertianTransmission {
    pub fn new(t: Spectrum) -> Self {
        LambertianTransmission { t }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        self.t * INV_PI
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        u: &Point2f,
        pdf: &mut Float,
        _sampled_type: &mut u8,
    ) -> Spectrum {
        *wi = cosine_sample_hemisphere(u);
        if wo.z > 0.0 as Float {
            wi.z *= -1.0 as Float;
        }
        *pdf = self.pdf(wo, wi);
        self.f(wo, wi)
    }
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            abs_cos_theta(wi) * INV_PI
        } else {
            0.0 as Float
        }
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfDiffuse as u8 | BxdfType::BsdfTransmission as u8
    }
}

#[derive(Debug, Copy, Clone)]
pub struct OrenNayar {
    pub r: Spectrum,
    pub a: Float,
    pub b: Float,
}

impl OrenNayar {
    /// `sigma` is the surface roughness standard deviation in degrees.
    pub fn new(r: Spectrum, sigma: Float) -> Self {
        let sigma = radians(sigma);
        let sigma2: Float = sigma * sigma;
        OrenNayar {
            r,
            a: 1.0 - (sigma2 / (2.0 * (sigma2 + 0.33))),
            b: 0.45 * sigma2 / (sigma2 + 0.09),
        }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        let sin_theta_i: Float = sin_theta(wi);
        let sin_theta_o: Float = sin_theta(wo);
        // cosine term of the Oren-Nayar model
        let max_cos = if sin_theta_i > 1.0e-4 && sin_theta_o > 1.0e-4 {
            let d_cos: Float = cos_phi(wi) * cos_phi(wo) + sin_phi(wi) * sin_phi(wo);
            d_cos.max(0.0 as Float)
        } else {
            0.0 as Float
        };
        let sin_alpha: Float;
        let tan_beta = if abs_cos_theta(wi) > abs_cos_theta(wo) {
            sin_alpha = sin_theta_o;
            sin_theta_i / abs_cos_theta(wi)
        } else {
            sin_alpha = sin_theta_i;
            sin_theta_o / abs_cos_theta(wo)
        };
        self.r * Spectrum::new(INV_PI * (self.a + self.b * max_cos * sin_alpha * tan_beta))
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfDiffuse as u8 | BxdfType::BsdfReflection as u8
    }
}

/// Torrance-Sparrow reflection with pluggable distribution, shadowing term,
/// and Fresnel model.
#[derive(Debug, Copy, Clone)]
pub struct MicrofacetReflection {
    pub r: Spectrum,
    pub distribution: MicrofacetDistribution,
    pub geometry: GeometricShadow,
    pub fresnel: Fresnel,
    pub roughness: Float,
}

impl MicrofacetReflection {
    pub fn new(
        r: Spectrum,
        distribution: MicrofacetDistribution,
        geometry: GeometricShadow,
        fresnel: Fresnel,
        roughness: Float,
    ) -> Self {
        MicrofacetReflection {
            r,
            distribution,
            geometry,
            fresnel,
            roughness,
        }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        let cos_theta_o: Float = abs_cos_theta(wo);
        let cos_theta_i: Float = abs_cos_theta(wi);
        let mut wh: Vector3f = *wi + *wo;
        // degenerate cases
        if cos_theta_i == 0.0 || cos_theta_o == 0.0 {
            return Spectrum::new(0.0);
        }
        if wh.x == 0.0 && wh.y == 0.0 && wh.z == 0.0 {
            return Spectrum::new(0.0);
        }
        wh = wh.normalize();
        let f: Spectrum = self.fresnel.evaluate(vec3_dot_vec3f(wi, &wh));
        let g: Float = self
            .geometry
            .g(wo, wi, &wh, &self.distribution, self.roughness);
        self.r * self.distribution.d(&wh) * g * f / (4.0 as Float * cos_theta_i * cos_theta_o)
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        u: &Point2f,
        pdf: &mut Float,
        _sampled_type: &mut u8,
    ) -> Spectrum {
        // sample microfacet orientation wh and reflect wo about it
        if wo.z == 0.0 as Float {
            return Spectrum::default();
        }
        let wh: Vector3f = self.distribution.sample_wh(wo, u);
        if vec3_dot_vec3f(wo, &wh) < 0.0 as Float {
            return Spectrum::default();
        }
        *wi = reflect(wo, &wh);
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        *pdf = self.distribution.pdf(wo, &wh) / (4.0 * vec3_dot_vec3f(wo, &wh));
        self.f(wo, wi)
    }
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return 0.0 as Float;
        }
        let wh: Vector3f = (*wo + *wi).normalize();
        self.distribution.pdf(wo, &wh) / (4.0 * vec3_dot_vec3f(wo, &wh))
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfReflection as u8 | BxdfType::BsdfGlossy as u8
    }
}

/// Walter et al. rough dielectric transmission. The half vector is
/// `normalize(wo + eta * wi)`; total internal reflection reports a zero
/// spectrum and zero pdf.
#[derive(Debug, Copy, Clone)]
pub struct MicrofacetTransmission {
    pub t: Spectrum,
    pub distribution: MicrofacetDistribution,
    pub eta_a: Float,
    pub eta_b: Float,
    pub fresnel: FresnelDielectric,
}

impl MicrofacetTransmission {
    pub fn new(
        t: Spectrum,
        distribution: MicrofacetDistribution,
        eta_a: Float,
        eta_b: Float,
    ) -> Self {
        MicrofacetTransmission {
            t,
            distribution,
            eta_a,
            eta_b,
            fresnel: FresnelDielectric {
                eta_i: eta_a,
                eta_t: eta_b,
            },
        }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if vec3_same_hemisphere_vec3(wo, wi) {
            // transmission only
            return Spectrum::default();
        }
        let cos_theta_o = cos_theta(wo);
        let cos_theta_i = cos_theta(wi);
        if cos_theta_o == 0.0 || cos_theta_i == 0.0 {
            return Spectrum::default();
        }
        let eta = if cos_theta_o > 0.0 {
            self.eta_b / self.eta_a
        } else {
            self.eta_a / self.eta_b
        };
        let mut wh: Vector3f = (*wo + *wi * eta).normalize();
        if wh.z < 0.0 {
            wh = -wh;
        }
        if vec3_dot_vec3f(wo, &wh) * vec3_dot_vec3f(wi, &wh) > 0.0 as Float {
            return Spectrum::default();
        }
        let f = self.fresnel.evaluate(vec3_dot_vec3f(wo, &wh));
        let sqrt_denom = vec3_dot_vec3f(wo, &wh) + eta * vec3_dot_vec3f(wi, &wh);
        let factor = 1.0 as Float / eta;
        (Spectrum::new(1.0) - f)
            * self.t
            * Float::abs(
                self.distribution.d(&wh)
                    * self.distribution.g(wo, wi)
                    * eta
                    * eta
                    * vec3_dot_vec3f(wi, &wh).abs()
                    * vec3_dot_vec3f(wo, &wh).abs()
                    * factor
                    * factor
                    / (cos_theta_i * cos_theta_o * sqrt_denom * sqrt_denom),
            )
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        u: &Point2f,
        pdf: &mut Float,
        _sampled_type: &mut u8,
    ) -> Spectrum {
        if wo.z == 0.0 {
            return Spectrum::default();
        }
        let wh: Vector3f = self.distribution.sample_wh(wo, u);
        if vec3_dot_vec3f(wo, &wh) < 0.0 as Float {
            return Spectrum::default();
        }
        let eta = if cos_theta(wo) > 0.0 {
            self.eta_a / self.eta_b
        } else {
            self.eta_b / self.eta_a
        };
        if refract(wo, &Normal3f::from(wh), eta, wi) {
            *pdf = self.pdf(wo, wi);
            self.f(wo, wi)
        } else {
            // total internal reflection
            *pdf = 0.0 as Float;
            Spectrum::default()
        }
    }
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if vec3_same_hemisphere_vec3(wo, wi) {
            return 0.0;
        }
        let eta = if cos_theta(wo) > 0.0 {
            self.eta_b / self.eta_a
        } else {
            self.eta_a / self.eta_b
        };
        let wh: Vector3f = (*wo + *wi * eta).normalize();
        let wo_dot_wh = vec3_dot_vec3f(wo, &wh);
        let wi_dot_wh = vec3_dot_vec3f(wi, &wh);
        if wo_dot_wh * wi_dot_wh > 0.0 as Float {
            return 0.0 as Float;
        }
        // change of variables from wh to wi
        let sqrt_denom = wo_dot_wh + eta * wi_dot_wh;
        let dwh_dwi = ((eta * eta * wi_dot_wh) / (sqrt_denom * sqrt_denom)).abs();
        self.distribution.pdf(wo, &wh) * dwh_dwi
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfTransmission as u8 | BxdfType::BsdfGlossy as u8
    }
}

/// Ashikhmin-Shirley coupled diffuse/glossy model.
#[derive(Debug, Copy, Clone)]
pub struct AshikhminShirley {
    pub rd: Spectrum,
    pub rs: Spectrum,
    pub distribution: MicrofacetDistribution,
}

impl AshikhminShirley {
    pub fn new(rd: Spectrum, rs: Spectrum, distribution: MicrofacetDistribution) -> Self {
        AshikhminShirley {
            rd,
            rs,
            distribution,
        }
    }
    fn schlick_fresnel(&self, cos_theta: Float) -> Spectrum {
        self.rs + (Spectrum::new(1.0) - self.rs) * pow5(1.0 - cos_theta)
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        let diffuse: Spectrum = self.rd
            * (Spectrum::new(1.0 as Float) - self.rs)
            * (28.0 as Float / (23.0 as Float * PI))
            * (1.0 - pow5(1.0 - 0.5 * abs_cos_theta(wi)))
            * (1.0 - pow5(1.0 - 0.5 * abs_cos_theta(wo)));
        let mut wh: Vector3f = *wi + *wo;
        if wh.x == 0.0 && wh.y == 0.0 && wh.z == 0.0 {
            return Spectrum::new(0.0 as Float);
        }
        wh = wh.normalize();
        let specular: Spectrum = self.schlick_fresnel(vec3_dot_vec3f(wi, &wh))
            * (self.distribution.d(&wh)
                / (4.0
                    * vec3_dot_vec3f(wi, &wh).abs()
                    * f32::max(abs_cos_theta(wi), abs_cos_theta(wo))));
        diffuse + specular
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        u_orig: &Point2f,
        pdf: &mut Float,
        _sampled_type: &mut u8,
    ) -> Spectrum {
        let mut u: Point2f = *u_orig;
        if u[XYEnum::X] < 0.5 as Float {
            u.x = Float::min(2.0 * u.x, FLOAT_ONE_MINUS_EPSILON);
            *wi = cosine_sample_hemisphere(&u);
            if wo.z < 0.0 as Float {
                wi.z *= -1.0 as Float;
            }
        } else {
            u.x = Float::min(2.0 * (u.x - 0.5 as Float), FLOAT_ONE_MINUS_EPSILON);
            let wh: Vector3f = self.distribution.sample_wh(wo, &u);
            *wi = reflect(wo, &wh);
            if !vec3_same_hemisphere_vec3(wo, wi) {
                return Spectrum::new(0.0);
            }
        }
        *pdf = self.pdf(wo, wi);
        self.f(wo, wi)
    }
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return 0.0 as Float;
        }
        let wh: Vector3f = (*wo + *wi).normalize();
        let pdf_wh: Float = self.distribution.pdf(wo, &wh);
        0.5 as Float * (abs_cos_theta(wi) * INV_PI + pdf_wh / (4.0 * vec3_dot_vec3f(wo, &wh)))
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfReflection as u8 | BxdfType::BsdfGlossy as u8
    }
}

/// Normalized Phong lobe around the mirror direction.
#[derive(Debug, Copy, Clone)]
pub struct PhongLobe {
    pub rd: Spectrum,
    pub rs: Spectrum,
    pub exponent: Float,
}

impl PhongLobe {
    pub fn new(rd: Spectrum, rs: Spectrum, exponent: Float) -> Self {
        PhongLobe { rd, rs, exponent }
    }
    fn mirror(wo: &Vector3f) -> Vector3f {
        Vector3f {
            x: -wo.x,
            y: -wo.y,
            z: wo.z,
        }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        let diffuse: Spectrum = self.rd * INV_PI;
        let cos_alpha: Float = vec3_dot_vec3f(wi, &PhongLobe::mirror(wo)).max(0.0 as Float);
        let specular: Spectrum = self.rs
            * ((self.exponent + 2.0 as Float)
                * crate::core::base::INV_2_PI
                * cos_alpha.powf(self.exponent));
        diffuse + specular
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        u_orig: &Point2f,
        pdf: &mut Float,
        _sampled_type: &mut u8,
    ) -> Spectrum {
        let mut u: Point2f = *u_orig;
        if u.x < 0.5 as Float {
            u.x = Float::min(2.0 * u.x, FLOAT_ONE_MINUS_EPSILON);
            *wi = cosine_sample_hemisphere(&u);
            if wo.z < 0.0 as Float {
                wi.z *= -1.0 as Float;
            }
        } else {
            u.x = Float::min(2.0 * (u.x - 0.5 as Float), FLOAT_ONE_MINUS_EPSILON);
            // sample around the mirror direction with a cos^e density
            let cos_alpha: Float = u.x.powf(1.0 as Float / (self.exponent + 1.0 as Float));
            let sin_alpha: Float = (0.0 as Float)
                .max(1.0 as Float - cos_alpha * cos_alpha)
                .sqrt();
            let phi: Float = 2.0 as Float * PI * u.y;
            let local = Vector3f {
                x: sin_alpha * phi.cos(),
                y: sin_alpha * phi.sin(),
                z: cos_alpha,
            };
            let r: Vector3f = PhongLobe::mirror(wo);
            let mut t0 = Vector3f::default();
            let mut t1 = Vector3f::default();
            crate::core::geometry::vec3_coordinate_system(&r, &mut t0, &mut t1);
            *wi = t0 * local.x + t1 * local.y + r * local.z;
            if !vec3_same_hemisphere_vec3(wo, wi) {
                *pdf = 0.0 as Float;
                return Spectrum::default();
            }
        }
        *pdf = self.pdf(wo, wi);
        self.f(wo, wi)
    }
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return 0.0 as Float;
        }
        let cos_alpha: Float = vec3_dot_vec3f(wi, &PhongLobe::mirror(wo)).max(0.0 as Float);
        let spec_pdf: Float = (self.exponent + 1.0 as Float)
            * crate::core::base::INV_2_PI
            * cos_alpha.powf(self.exponent);
        0.5 as Float * (abs_cos_theta(wi) * INV_PI + spec_pdf)
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfReflection as u8 | BxdfType::BsdfGlossy as u8
    }
}

/// Ashikhmin's distribution-based BRDF: the lobe is defined directly by a
/// microfacet normal distribution with a smooth-shadowing denominator.
#[derive(Debug, Copy, Clone)]
pub struct DistributionBrdf {
    pub r: Spectrum,
    pub distribution: MicrofacetDistribution,
}

impl DistributionBrdf {
    pub fn new(r: Spectrum, distribution: MicrofacetDistribution) -> Self {
        DistributionBrdf { r, distribution }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
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
        let denom: Float = 4.0 as Float * (cos_o + cos_i - cos_o * cos_i);
        self.r * (self.distribution.d(&wh) / denom)
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        u: &Point2f,
        pdf: &mut Float,
        _sampled_type: &mut u8,
    ) -> Spectrum {
        if wo.z == 0.0 as Float {
            return Spectrum::default();
        }
        let wh: Vector3f = self.distribution.sample_wh(wo, u);
        if vec3_dot_vec3f(wo, &wh) < 0.0 as Float {
            return Spectrum::default();
        }
        *wi = reflect(wo, &wh);
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        *pdf = self.distribution.pdf(wo, &wh) / (4.0 * vec3_dot_vec3f(wo, &wh));
        self.f(wo, wi)
    }
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return 0.0 as Float;
        }
        let wh: Vector3f = (*wo + *wi).normalize();
        self.distribution.pdf(wo, &wh) / (4.0 * vec3_dot_vec3f(wo, &wh))
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfReflection as u8 | BxdfType::BsdfGlossy as u8
    }
}

/// Sheen-style cloth lobe with a rim-weighted distribution.
#[derive(Debug, Copy, Clone)]
pub struct Fabric {
    pub r: Spectrum,
    inv_roughness: Float,
    norm: Float,
}

impl Fabric {
    pub fn new(r: Spectrum, roughness: Float) -> Self {
        let inv_roughness = 1.0 as Float / clamp_t(roughness, 0.05, 1.0);
        Fabric {
            r,
            inv_roughness,
            norm: (2.0 as Float + inv_roughness) * crate::core::base::INV_2_PI,
        }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
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
        let sin_2_theta_h: Float = sin_2_theta(&wh);
        let d: Float = self.norm * sin_2_theta_h.powf(0.5 as Float * self.inv_roughness);
        let denom: Float = 4.0 as Float * (cos_o + cos_i - cos_o * cos_i);
        self.r * (d / denom)
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfReflection as u8 | BxdfType::BsdfGlossy as u8
    }
}

/// A thin dielectric coating over a boxed base lobe. The coat reflects
/// specularly off a GGX layer; whatever enters is attenuated on the way in
/// and out and scattered by the base.
#[derive(Debug, Clone)]
pub struct Coat {
    pub base: Box<Bxdf>,
    pub ior: Float,
    pub sigma: Spectrum,
    pub thickness: Float,
    pub distribution: MicrofacetDistribution,
}

impl Coat {
    pub fn new(
        base: Bxdf,
        ior: Float,
        sigma: Spectrum,
        thickness: Float,
        distribution: MicrofacetDistribution,
    ) -> Self {
        Coat {
            base: Box::new(base),
            ior,
            sigma,
            thickness,
            distribution,
        }
    }
    fn coat_lobe(&self) -> MicrofacetReflection {
        MicrofacetReflection::new(
            Spectrum::new(1.0),
            self.distribution,
            GeometricShadow::Smith,
            Fresnel::Dielectric(FresnelDielectric {
                eta_i: 1.0,
                eta_t: self.ior,
            }),
            0.0,
        )
    }
    fn attenuation(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        let cos_o: Float = abs_cos_theta(wo).max(1e-4);
        let cos_i: Float = abs_cos_theta(wi).max(1e-4);
        let distance: Float = self.thickness * (1.0 as Float / cos_o + 1.0 as Float / cos_i);
        (self.sigma * -distance).exp()
    }
    fn reflect_weight(&self, wo: &Vector3f) -> Float {
        clamp_t(
            fr_dielectric(cos_theta(wo), 1.0, self.ior),
            0.05 as Float,
            0.95 as Float,
        )
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        let spec: Spectrum = self.coat_lobe().f(wo, wi);
        let t_o: Float = 1.0 as Float - fr_dielectric(cos_theta(wo), 1.0, self.ior);
        let t_i: Float = 1.0 as Float - fr_dielectric(cos_theta(wi), 1.0, self.ior);
        spec + self.base.f(wo, wi) * self.attenuation(wo, wi) * (t_o * t_i)
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        u: &Point2f,
        pdf: &mut Float,
        sampled_type: &mut u8,
    ) -> Spectrum {
        let w: Float = self.reflect_weight(wo);
        let mut u = *u;
        if u.x < w {
            u.x = (u.x / w).min(FLOAT_ONE_MINUS_EPSILON);
            let mut lobe_pdf: Float = 0.0;
            let _ = self
                .coat_lobe()
                .sample_f(wo, wi, &u, &mut lobe_pdf, sampled_type);
            if lobe_pdf == 0.0 as Float {
                *pdf = 0.0 as Float;
                return Spectrum::default();
            }
        } else {
            u.x = ((u.x - w) / (1.0 as Float - w)).min(FLOAT_ONE_MINUS_EPSILON);
            let mut lobe_pdf: Float = 0.0;
            let _ = self.base.sample_f(wo, wi, &u, &mut lobe_pdf, sampled_type);
            if lobe_pdf == 0.0 as Float {
                *pdf = 0.0 as Float;
                return Spectrum::default();
            }
        }
        *pdf = self.pdf(wo, wi);
        self.f(wo, wi)
    }
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return 0.0 as Float;
        }
        let w: Float = self.reflect_weight(wo);
        w * self.coat_lobe().pdf(wo, wi) + (1.0 as Float - w) * self.base.pdf(wo, wi)
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfReflection as u8 | BxdfType::BsdfGlossy as u8
    }
}

/// Presents different lobes to the two sides of a surface.
#[derive(Debug, Clone)]
pub struct DoubleSided {
    pub front: Box<Bxdf>,
    pub back: Box<Bxdf>,
}

impl DoubleSided {
    pub fn new(front: Bxdf, back: Bxdf) -> Self {
        DoubleSided {
            front: Box::new(front),
            back: Box::new(back),
        }
    }
    fn flip(w: &Vector3f) -> Vector3f {
        Vector3f {
            x: w.x,
            y: w.y,
            z: -w.z,
        }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if wo.z >= 0.0 as Float {
            self.front.f(wo, wi)
        } else {
            self.back.f(&DoubleSided::flip(wo), &DoubleSided::flip(wi))
        }
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        u: &Point2f,
        pdf: &mut Float,
        sampled_type: &mut u8,
    ) -> Spectrum {
        if wo.z >= 0.0 as Float {
            self.front.sample_f(wo, wi, u, pdf, sampled_type)
        } else {
            let mut wi_flipped: Vector3f = Vector3f::default();
            let f = self.back.sample_f(
                &DoubleSided::flip(wo),
                &mut wi_flipped,
                u,
                pdf,
                sampled_type,
            );
            *wi = DoubleSided::flip(&wi_flipped);
            f
        }
    }
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if wo.z >= 0.0 as Float {
            self.front.pdf(wo, wi)
        } else {
            self.back.pdf(&DoubleSided::flip(wo), &DoubleSided::flip(wi))
        }
    }
    pub fn get_type(&self) -> u8 {
        self.front.get_type() | self.back.get_type()
    }
}

/// Utility functions over directions in the local shading frame, where the
/// normal is (0, 0, 1).
pub fn cos_theta(w: &Vector3f) -> Float {
    w.z
}

pub fn cos_2_theta(w: &Vector3f) -> Float {
    w.z * w.z
}

pub fn abs_cos_theta(w: &Vector3f) -> Float {
    w.z.abs()
}

pub fn sin_2_theta(w: &Vector3f) -> Float {
    (0.0 as Float).max(1.0 as Float - cos_2_theta(w))
}

pub fn sin_theta(w: &Vector3f) -> Float {
    sin_2_theta(w).sqrt()
}

pub fn tan_theta(w: &Vector3f) -> Float {
    sin_theta(w) / cos_theta(w)
}

pub fn tan_2_theta(w: &Vector3f) -> Float {
    sin_2_theta(w) / cos_2_theta(w)
}

pub fn cos_phi(w: &Vector3f) -> Float {
    let sin_theta: Float = sin_theta(w);
    if sin_theta == 0.0 as Float {
        1.0 as Float
    } else {
        clamp_t(w.x / sin_theta, -1.0, 1.0)
    }
}

pub fn sin_phi(w: &Vector3f) -> Float {
    let sin_theta: Float = sin_theta(w);
    if sin_theta == 0.0 as Float {
        0.0 as Float
    } else {
        clamp_t(w.y / sin_theta, -1.0, 1.0)
    }
}

pub fn cos_2_phi(w: &Vector3f) -> Float {
    cos_phi(w) * cos_phi(w)
}

pub fn sin_2_phi(w: &Vector3f) -> Float {
    sin_phi(w) * sin_phi(w)
}

pub fn cos_d_phi(wa: &Vector3f, wb: &Vector3f) -> Float {
    let waxy: Float = wa.x * wa.x + wa.y * wa.y;
    let wbxy: Float = wb.x * wb.x + wb.y * wb.y;
    if waxy == 0.0 as Float || wbxy == 0.0 as Float {
        1.0 as Float
    } else {
        clamp_t(
            (wa.x * wb.x + wa.y * wb.y) / (waxy * wbxy).sqrt(),
            -1.0 as Float,
            1.0 as Float,
        )
    }
}

pub fn reflect(wo: &Vector3f, n: &Vector3f) -> Vector3f {
    -(*wo) + *n * 2.0 as Float * vec3_dot_vec3f(wo, n)
}

pub fn refract(wi: &Vector3f, n: &Normal3f, eta: Float, wt: &mut Vector3f) -> bool {
    // compute cos theta_t with Snell's law
    let cos_theta_i: Float = nrm_dot_vec3f(n, wi);
    let sin2_theta_i: Float = (0.0 as Float).max(1.0 as Float - cos_theta_i * cos_theta_i);
    let sin2_theta_t: Float = eta * eta * sin2_theta_i;
    // total internal reflection
    if sin2_theta_t >= 1.0 as Float {
        return false;
    }
    let cos_theta_t: Float = (1.0 as Float - sin2_theta_t).sqrt();
    *wt = -(*wi) * eta + Vector3f::from(*n) * (eta * cos_theta_i - cos_theta_t);
    true
}

pub fn vec3_same_hemisphere_vec3(w: &Vector3f, wp: &Vector3f) -> bool {
    w.z * wp.z > 0.0 as Float
}

/// Fresnel reflection for dielectrics and unpolarized light.
pub fn fr_dielectric(cos_theta_i: Float, eta_i: Float, eta_t: Float) -> Float {
    let mut cos_theta_i = clamp_t(cos_theta_i, -1.0, 1.0);
    let entering: bool = cos_theta_i > 0.0;
    let mut local_eta_i = eta_i;
    let mut local_eta_t = eta_t;
    if !entering {
        std::mem::swap(&mut local_eta_i, &mut local_eta_t);
        cos_theta_i = cos_theta_i.abs();
    }
    // compute cos theta_t with Snell's law
    let sin_theta_i: Float = (0.0 as Float)
        .max(1.0 as Float - cos_theta_i * cos_theta_i)
        .sqrt();
    let sin_theta_t: Float = local_eta_i / local_eta_t * sin_theta_i;
    // total internal reflection
    if sin_theta_t >= 1.0 as Float {
        return 1.0 as Float;
    }
    let cos_theta_t: Float = (0.0 as Float)
        .max(1.0 as Float - sin_theta_t * sin_theta_t)
        .sqrt();
    let r_parl: Float = ((local_eta_t * cos_theta_i) - (local_eta_i * cos_theta_t))
        / ((local_eta_t * cos_theta_i) + (local_eta_i * cos_theta_t));
    let r_perp: Float = ((local_eta_i * cos_theta_i) - (local_eta_t * cos_theta_t))
        / ((local_eta_i * cos_theta_i) + (local_eta_t * cos_theta_t));
    (r_parl * r_parl + r_perp * r_perp) / 2.0
}

/// Fresnel reflectance at the boundary between a conductor and a
/// dielectric medium.
pub fn fr_conductor(cos_theta_i: Float, eta_i: Spectrum, eta_t: Spectrum, k: Spectrum) -> Spectrum {
    let cos_theta_i: Float = clamp_t(cos_theta_i, -1.0, 1.0);
    let eta: Spectrum = eta_t / eta_i;
    let eta_k: Spectrum = k / eta_i;
    let cos_theta_i2: Float = cos_theta_i * cos_theta_i;
    let sin_theta_i2: Float = 1.0 as Float - cos_theta_i2;
    let eta_2: Spectrum = eta * eta;
    let eta_k2: Spectrum = eta_k * eta_k;
    let t0: Spectrum = eta_2 - eta_k2 - Spectrum::new(sin_theta_i2);
    let a2_plus_b2: Spectrum = (t0 * t0 + eta_2 * eta_k2 * Spectrum::new(4.0 as Float)).sqrt();
    let t1: Spectrum = a2_plus_b2 + Spectrum::new(cos_theta_i2);
    let a: Spectrum = ((a2_plus_b2 + t0) * 0.5 as Float).sqrt();
    let t2: Spectrum = a * 2.0 as Float * cos_theta_i;
    let rs: Spectrum = (t1 - t2) / (t1 + t2);
    let t3: Spectrum = a2_plus_b2 * cos_theta_i2 + Spectrum::new(sin_theta_i2 * sin_theta_i2);
    let t4: Spectrum = t2 * sin_theta_i2;
    let rp: Spectrum = rs * (t3 - t4) / (t3 + t4);
    (rp + rs) * Spectrum::new(0.5 as Float)
}

pub fn pow5(v: Float) -> Float {
    (v * v) * (v * v) * v
}
