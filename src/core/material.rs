//! Materials consume a shader closure tree and instantiate concrete BxDF
//! lobes into a scattering event, multiplying closure weights down the
//! tree. Measured-data closures resolve their tables when the material is
//! instantiated, not per hit.

// spica
use crate::core::base::{Float, Spectrum};
use crate::core::bssrdf::Bssrdf;
use crate::core::interaction::SurfaceInteraction;
use crate::core::microfacet::{
    roughness_to_alpha, BeckmannDistribution, BlinnDistribution, GeometricShadow,
    MicrofacetDistribution, TrowbridgeReitzDistribution,
};
use crate::core::reflection::{
    AshikhminShirley, Bsdf, Bxdf, Coat, DistributionBrdf, DoubleSided, Fabric, Fresnel,
    FresnelConductor, FresnelDielectric, FresnelSpecular, LambertianReflection,
    LambertianTransmission, MicrofacetReflection, MicrofacetTransmission, OrenNayar, PhongLobe,
    SpecularReflection,
};
use crate::materials::disney::DisneyBrdf;
use crate::materials::hair::{sigma_a_from_reflectance, HairBsdf};
use crate::materials::measured::{FourierBsdf, MerlBrdf};

/// Which kind of normal distribution a microfacet closure asked for.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DistributionKind {
    Beckmann,
    Ggx,
    Blinn,
}

impl DistributionKind {
    pub fn build(self, roughness: Float) -> MicrofacetDistribution {
        match self {
            DistributionKind::Blinn => {
                MicrofacetDistribution::Blinn(BlinnDistribution::new(roughness))
            }
            DistributionKind::Beckmann => {
                let alpha = roughness_to_alpha(roughness);
                MicrofacetDistribution::Beckmann(BeckmannDistribution::new(alpha, alpha))
            }
            DistributionKind::Ggx => {
                let alpha = roughness_to_alpha(roughness);
                MicrofacetDistribution::TrowbridgeReitz(TrowbridgeReitzDistribution::new(
                    alpha, alpha,
                ))
            }
        }
    }
}

/// One node of the resolved shader closure tree. The scene loader maps its
/// serialized description into this form, loading measured tables along
/// the way.
#[derive(Debug, Clone)]
pub enum Closure {
    Weighted {
        weight: Spectrum,
        inner: Box<Closure>,
    },
    Add {
        nodes: Vec<Closure>,
    },
    Lambert {
        albedo: Spectrum,
    },
    LambertTransmission {
        transmittance: Spectrum,
    },
    OrenNayar {
        albedo: Spectrum,
        sigma: Float,
    },
    Microfacet {
        albedo: Spectrum,
        roughness: Float,
        distribution: DistributionKind,
        geometry: GeometricShadow,
        eta: Spectrum,
        k: Spectrum,
    },
    MicrofacetDielectric {
        albedo: Spectrum,
        roughness: Float,
        distribution: DistributionKind,
        geometry: GeometricShadow,
        ior: Float,
    },
    MicrofacetRefraction {
        transmittance: Spectrum,
        roughness: Float,
        distribution: DistributionKind,
        ior_in: Float,
        ior_ex: Float,
    },
    AshikhminShirley {
        diffuse: Spectrum,
        specular: Spectrum,
        roughness: Float,
    },
    Phong {
        diffuse: Spectrum,
        specular: Spectrum,
        power: Float,
    },
    Mirror {
        reflectance: Spectrum,
    },
    Dielectric {
        reflectance: Spectrum,
        transmittance: Spectrum,
        ior: Float,
    },
    Disney {
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
        scatter_distance: Spectrum,
        flatness: Float,
        diff_trans: Float,
        thin: bool,
    },
    Hair {
        color: Spectrum,
        beta_m: Float,
        beta_n: Float,
        ior: Float,
    },
    Merl {
        brdf: MerlBrdf,
    },
    Fourier {
        brdf: FourierBsdf,
    },
    Coat {
        ior: Float,
        roughness: Float,
        sigma: Spectrum,
        thickness: Float,
        base: Box<Closure>,
    },
    DoubleSided {
        front: Box<Closure>,
        back: Box<Closure>,
    },
    DistributionBrdf {
        albedo: Spectrum,
        roughness: Float,
    },
    Fabric {
        albedo: Spectrum,
        roughness: Float,
    },
    Sss {
        albedo: Spectrum,
        scatter_distance: Spectrum,
        ior: Float,
    },
}

#[derive(Debug, Clone)]
pub struct Material {
    pub closure: Closure,
}

impl Material {
    pub fn new(closure: Closure) -> Self {
        Material { closure }
    }
    /// Build the scattering event for a hit: walk the closure tree, push
    /// lobes into the BSDF, and attach a BSSRDF when a subsurface closure
    /// is present.
    pub fn compute_scattering_functions(&self, si: &mut SurfaceInteraction, material_id: usize) {
        let mut bsdf = Bsdf::new(si, 1.0 as Float);
        let mut bssrdf: Option<Bssrdf> = None;
        walk_closure(
            &self.closure,
            Spectrum::new(1.0),
            si,
            material_id,
            &mut bsdf,
            &mut bssrdf,
        );
        si.bsdf = Some(bsdf);
        si.bssrdf = bssrdf;
    }
}

/// Convert a single leaf closure into one lobe, already scaled by the
/// accumulated tree weight.
#[allow(clippy::boxed_local)]
fn leaf_to_bxdf(
    closure: &Closure,
    weight: Spectrum,
    si: &SurfaceInteraction,
    material_id: usize,
    eta_out: &mut Float,
    bssrdf: &mut Option<Bssrdf>,
) -> Option<Bxdf> {
    match closure {
        Closure::Lambert { albedo } => Some(Bxdf::LambertianRefl(LambertianReflection::new(
            weight * *albedo,
        ))),
        Closure::LambertTransmission { transmittance } => Some(Bxdf::LambertianTrans(
            LambertianTransmission::new(weight * *transmittance),
        )),
        Closure::OrenNayar { albedo, sigma } => Some(Bxdf::OrenNayarRefl(OrenNayar::new(
            weight * *albedo,
            *sigma,
        ))),
        Closure::Microfacet {
            albedo,
            roughness,
            distribution,
            geometry,
            eta,
            k,
        } => Some(Bxdf::MicrofacetRefl(MicrofacetReflection::new(
            weight * *albedo,
            distribution.build(*roughness),
            *geometry,
            Fresnel::Conductor(FresnelConductor {
                eta_i: Spectrum::new(1.0),
                eta_t: *eta,
                k: *k,
            }),
            *roughness,
        ))),
        Closure::MicrofacetDielectric {
            albedo,
            roughness,
            distribution,
            geometry,
            ior,
        } => Some(Bxdf::MicrofacetRefl(MicrofacetReflection::new(
            weight * *albedo,
            distribution.build(*roughness),
            *geometry,
            Fresnel::Dielectric(FresnelDielectric {
                eta_i: 1.0,
                eta_t: *ior,
            }),
            *roughness,
        ))),
        Closure::MicrofacetRefraction {
            transmittance,
            roughness,
            distribution,
            ior_in,
            ior_ex,
        } => {
            *eta_out = *ior_in / *ior_ex;
            Some(Bxdf::MicrofacetTrans(MicrofacetTransmission::new(
                weight * *transmittance,
                distribution.build(*roughness),
                *ior_ex,
                *ior_in,
            )))
        }
        Closure::AshikhminShirley {
            diffuse,
            specular,
            roughness,
        } => Some(Bxdf::AshikhminShirley(AshikhminShirley::new(
            weight * *diffuse,
            *specular,
            DistributionKind::Ggx.build(*roughness),
        ))),
        Closure::Phong {
            diffuse,
            specular,
            power,
        } => Some(Bxdf::Phong(PhongLobe::new(
            weight * *diffuse,
            weight * *specular,
            *power,
        ))),
        Closure::Mirror { reflectance } => Some(Bxdf::SpecRefl(SpecularReflection::new(
            weight * *reflectance,
            Fresnel::NoOp(Default::default()),
        ))),
        Closure::Dielectric {
            reflectance,
            transmittance,
            ior,
        } => {
            *eta_out = *ior;
            Some(Bxdf::FresnelSpec(FresnelSpecular::new(
                weight * *reflectance,
                weight * *transmittance,
                1.0,
                *ior,
            )))
        }
        Closure::Disney {
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
            scatter_distance,
            flatness,
            diff_trans,
            thin,
        } => {
            *eta_out = *eta;
            let mut brdf = DisneyBrdf::new(
                weight * *base_color,
                *metallic,
                *eta,
                *roughness,
                *specular_tint,
                *anisotropic,
                *sheen,
                *sheen_tint,
                *clearcoat,
                *clearcoat_gloss,
                *spec_trans,
                *flatness,
                *diff_trans,
                *thin,
            );
            if !thin && !scatter_distance.is_black() {
                // diffusion replaces the diffuse lobe for true subsurface
                brdf = brdf.with_suppressed_diffuse();
                *bssrdf = Some(Bssrdf::new(
                    weight * *base_color,
                    *scatter_distance,
                    *eta,
                    material_id,
                ));
            }
            Some(Bxdf::Disney(brdf))
        }
        Closure::Hair {
            color,
            beta_m,
            beta_n,
            ior,
        } => {
            let sigma_a = sigma_a_from_reflectance(color, *beta_n);
            let h: Float = -1.0 as Float + 2.0 as Float * si.uv.y;
            Some(Bxdf::Hair(HairBsdf::new(
                sigma_a, *beta_m, *beta_n, *ior, h,
            )))
        }
        Closure::Merl { brdf } => Some(Bxdf::Merl(brdf.clone())),
        Closure::Fourier { brdf } => Some(Bxdf::Fourier(brdf.clone())),
        Closure::Coat {
            ior,
            roughness,
            sigma,
            thickness,
            base,
        } => {
            let base_bxdf =
                leaf_to_bxdf(base, weight, si, material_id, eta_out, bssrdf)?;
            Some(Bxdf::Coat(Coat::new(
                base_bxdf,
                *ior,
                *sigma,
                *thickness,
                DistributionKind::Ggx.build(*roughness),
            )))
        }
        Closure::DoubleSided { front, back } => {
            let front_bxdf =
                leaf_to_bxdf(front, weight, si, material_id, eta_out, bssrdf)?;
            let back_bxdf = leaf_to_bxdf(back, weight, si, material_id, eta_out, bssrdf)?;
            Some(Bxdf::DoubleSided(DoubleSided::new(front_bxdf, back_bxdf)))
        }
        Closure::DistributionBrdf { albedo, roughness } => {
            Some(Bxdf::DistBrdf(DistributionBrdf::new(
                weight * *albedo,
                DistributionKind::Ggx.build(*roughness),
            )))
        }
        Closure::Fabric { albedo, roughness } => {
            Some(Bxdf::Fabric(Fabric::new(weight * *albedo, *roughness)))
        }
        Closure::Sss {
            albedo,
            scatter_distance,
            ior,
        } => {
            *eta_out = *ior;
            *bssrdf = Some(Bssrdf::new(
                weight * *albedo,
                *scatter_distance,
                *ior,
                material_id,
            ));
            // the entry event is a smooth dielectric transmission
            Some(Bxdf::FresnelSpec(FresnelSpecular::new(
                Spectrum::new(1.0),
                Spectrum::new(1.0),
                1.0,
                *ior,
            )))
        }
        Closure::Weighted { .. } | Closure::Add { .. } => None,
    }
}

fn walk_closure(
    closure: &Closure,
    weight: Spectrum,
    si: &SurfaceInteraction,
    material_id: usize,
    bsdf: &mut Bsdf,
    bssrdf: &mut Option<Bssrdf>,
) {
    match closure {
        Closure::Weighted { weight: w, inner } => {
            walk_closure(inner, weight * *w, si, material_id, bsdf, bssrdf);
        }
        Closure::Add { nodes } => {
            for node in nodes {
                walk_closure(node, weight, si, material_id, bsdf, bssrdf);
            }
        }
        leaf => {
            let mut eta: Float = bsdf.eta.max(1.0 as Float);
            if let Some(bxdf) = leaf_to_bxdf(leaf, weight, si, material_id, &mut eta, bssrdf) {
                bsdf.eta = eta;
                let lobe_weight: Float = weight.y().max(1e-3 as Float);
                bsdf.add_weighted(bxdf, lobe_weight);
            }
        }
    }
}

/// A plain white diffuse material, handy as a fallback and in tests.
pub fn matte(albedo: Spectrum) -> Material {
    Material::new(Closure::Lambert { albedo })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{Normal3f, Vector3f};

    fn shading_point() -> SurfaceInteraction {
        SurfaceInteraction {
            t: 1.0,
            n: Normal3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
            shading_n: Normal3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
            dpdu: Vector3f {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            },
            primitive: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn weighted_tree_scales_albedo() {
        let material = Material::new(Closure::Weighted {
            weight: Spectrum::new(0.5),
            inner: Box::new(Closure::Lambert {
                albedo: Spectrum::new(1.0),
            }),
        });
        let mut si = shading_point();
        material.compute_scattering_functions(&mut si, 0);
        let bsdf = si.bsdf.as_ref().unwrap();
        assert_eq!(bsdf.bxdfs.len(), 1);
        let wo = Vector3f {
            x: 0.0,
            y: 0.0,
            z: 1.0,
        };
        let f = bsdf.f(&wo, &wo, crate::core::reflection::BxdfType::BsdfAll as u8);
        assert!((f.c[0] - 0.5 * crate::core::base::INV_PI).abs() < 1e-5);
    }

    #[test]
    fn add_node_stacks_lobes() {
        let material = Material::new(Closure::Add {
            nodes: vec![
                Closure::Lambert {
                    albedo: Spectrum::new(0.4),
                },
                Closure::Phong {
                    diffuse: Spectrum::default(),
                    specular: Spectrum::new(0.4),
                    power: 32.0,
                },
            ],
        });
        let mut si = shading_point();
        material.compute_scattering_functions(&mut si, 0);
        assert_eq!(si.bsdf.as_ref().unwrap().bxdfs.len(), 2);
    }

    #[test]
    fn sss_closure_attaches_bssrdf() {
        let material = Material::new(Closure::Sss {
            albedo: Spectrum::new(0.9),
            scatter_distance: Spectrum::new(1.0),
            ior: 1.33,
        });
        let mut si = shading_point();
        material.compute_scattering_functions(&mut si, 7);
        assert!(si.bssrdf.is_some());
        assert_eq!(si.bssrdf.as_ref().unwrap().material_id, 7);
    }
}
