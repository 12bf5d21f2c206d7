//! Scene input. A scene stream opens with a four-byte magic and a
//! little-endian version word; streams with an unknown version are
//! refused. The header is followed by a JSON scene document (camera,
//! film, integrator, sampler, lights, materials as closure trees,
//! primitive records) and raw little-endian mesh payloads.

// std
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
// others
use byteorder::{LittleEndian, ReadBytesExt};
use serde::Deserialize;
use std::str::FromStr;
use strum_macros::EnumString;
use thiserror::Error;
// spica
use crate::accelerators::Accelerator;
use crate::core::base::{Float, Spectrum};
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::geometry::{Normal3f, Point2f, Point3f, Vector3f};
use crate::core::integrator::Integrator;
use crate::core::material::{Closure, DistributionKind, Material};
use crate::core::microfacet::GeometricShadow;
use crate::core::primitive::Primitive;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::cameras::perspective::PerspectiveCamera;
use crate::filters::{BoxFilter, Filter, TriangleFilter};
use crate::integrators::ao::AoIntegrator;
use crate::integrators::bdpt::BdptIntegrator;
use crate::integrators::direct::DirectLightingIntegrator;
use crate::integrators::instantradiosity::InstantRadiosityIntegrator;
use crate::integrators::lighttracer::LightTracerIntegrator;
use crate::integrators::path::PathIntegrator;
use crate::integrators::whitted::WhittedIntegrator;
use crate::lights::area::DiffuseAreaLight;
use crate::lights::distant::DistantLight;
use crate::lights::infinite::SkyLight;
use crate::lights::point::PointLight;
use crate::lights::Light;
use crate::materials::measured::{FourierBsdf, FourierTable, MerlBrdf, MerlTable};
use crate::shapes::disk::Disk;
use crate::shapes::line::LineSegment;
use crate::shapes::quad::Quad;
use crate::shapes::sphere::Sphere;
use crate::shapes::triangle::{Triangle, TriangleMesh};
use crate::shapes::Shape;

pub const SCENE_MAGIC: [u8; 4] = *b"SPCA";
pub const SCENE_VERSION: u32 = 2;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("i/o error reading scene: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed scene document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not a scene stream (bad magic)")]
    BadMagic,
    #[error("unsupported scene stream version {0}")]
    UnsupportedVersion(u32),
    #[error("scene has no camera")]
    MissingCamera,
    #[error("unknown shader closure kind `{0}`")]
    UnknownClosure(String),
    #[error("degenerate mesh: {0}")]
    DegenerateMesh(String),
    #[error("primitive references missing mesh {0}")]
    MissingMesh(usize),
    #[error("primitive references missing material {0}")]
    MissingMaterial(usize),
    #[error("unknown integrator `{0}`")]
    UnknownIntegrator(String),
}

fn rgb(v: &[Float; 3]) -> Spectrum {
    Spectrum::from_rgb(v)
}

#[derive(Debug, Deserialize)]
struct CameraDesc {
    eye: [Float; 3],
    target: [Float; 3],
    #[serde(default = "default_up")]
    up: [Float; 3],
    #[serde(default = "default_fov")]
    fov: Float,
    #[serde(default)]
    lens_radius: Float,
    #[serde(default = "default_focal")]
    focal_distance: Float,
}

fn default_up() -> [Float; 3] {
    [0.0, 1.0, 0.0]
}
fn default_fov() -> Float {
    45.0
}
fn default_focal() -> Float {
    5.0
}

#[derive(Debug, Deserialize)]
struct FilmDesc {
    width: usize,
    height: usize,
    #[serde(default)]
    filter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SamplerDesc {
    #[serde(default = "default_sampler")]
    kind: String,
    #[serde(default = "default_spp")]
    spp: usize,
}

fn default_sampler() -> String {
    "stratified".to_string()
}
fn default_spp() -> usize {
    16
}

impl Default for SamplerDesc {
    fn default() -> Self {
        SamplerDesc {
            kind: default_sampler(),
            spp: default_spp(),
        }
    }
}

#[derive(Debug, Copy, Clone, EnumString)]
#[strum(serialize_all = "snake_case")]
enum IntegratorKind {
    Ao,
    Whitted,
    Direct,
    Path,
    Bdpt,
    LightTracing,
    InstantRadiosity,
}

#[derive(Debug, Deserialize)]
struct IntegratorDesc {
    kind: String,
    #[serde(default = "default_max_depth")]
    max_depth: u32,
    #[serde(default = "default_n_samples")]
    n_samples: usize,
    #[serde(default = "default_rr")]
    rr_threshold: Float,
    #[serde(default = "default_n_light_paths")]
    n_light_paths: usize,
    #[serde(default = "default_g_clamp")]
    g_clamp_distance: Float,
    #[serde(default = "default_true")]
    cos_sample: bool,
    #[serde(default)]
    max_distance: Float,
}

fn default_max_depth() -> u32 {
    8
}
fn default_n_samples() -> usize {
    16
}
fn default_rr() -> Float {
    1.0
}
fn default_n_light_paths() -> usize {
    4096
}
fn default_g_clamp() -> Float {
    0.1
}
fn default_true() -> bool {
    true
}

impl Default for IntegratorDesc {
    fn default() -> Self {
        IntegratorDesc {
            kind: "path".to_string(),
            max_depth: default_max_depth(),
            n_samples: default_n_samples(),
            rr_threshold: default_rr(),
            n_light_paths: default_n_light_paths(),
            g_clamp_distance: default_g_clamp(),
            cos_sample: true,
            max_distance: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum LightDesc {
    Sky {
        radiance: [Float; 3],
    },
    Point {
        position: [Float; 3],
        intensity: [Float; 3],
    },
    Distant {
        direction: [Float; 3],
        radiance: [Float; 3],
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ShapeDesc {
    Sphere {
        center: [Float; 3],
        radius: Float,
    },
    Disk {
        center: [Float; 3],
        normal: [Float; 3],
        radius: Float,
    },
    Quad {
        p: [Float; 3],
        e0: [Float; 3],
        e1: [Float; 3],
    },
    Line {
        p0: [Float; 3],
        p1: [Float; 3],
        width0: Float,
        width1: Float,
    },
    Mesh {
        mesh: usize,
    },
}

#[derive(Debug, Deserialize)]
struct PrimitiveDesc {
    shape: ShapeDesc,
    #[serde(default)]
    material: Option<usize>,
    /// Present when the primitive is an area light.
    #[serde(default)]
    emission: Option<[Float; 3]>,
    #[serde(default)]
    two_sided: bool,
}

#[derive(Debug, Deserialize)]
struct MeshDesc {
    /// Payload sizes, validated against the binary section.
    vertices: usize,
    triangles: usize,
    #[serde(default)]
    has_normals: bool,
    #[serde(default)]
    has_uvs: bool,
}

#[derive(Debug, Deserialize)]
struct SceneDesc {
    camera: Option<CameraDesc>,
    film: FilmDesc,
    #[serde(default)]
    integrator: Option<IntegratorDesc>,
    #[serde(default)]
    sampler: Option<SamplerDesc>,
    #[serde(default)]
    accelerator: Option<String>,
    #[serde(default)]
    lights: Vec<LightDesc>,
    #[serde(default)]
    materials: Vec<serde_json::Value>,
    #[serde(default)]
    meshes: Vec<MeshDesc>,
    #[serde(default)]
    primitives: Vec<PrimitiveDesc>,
}

/// The serialized closure tree; resolved into `core::material::Closure`
/// with measured tables loaded from disk.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ClosureDesc {
    Weighted {
        weight: [Float; 3],
        inner: Box<ClosureDesc>,
    },
    Add {
        nodes: Vec<ClosureDesc>,
    },
    Lambert {
        albedo: [Float; 3],
    },
    LambertTransmission {
        transmittance: [Float; 3],
    },
    OrenNayar {
        albedo: [Float; 3],
        sigma: Float,
    },
    Microfacet {
        albedo: [Float; 3],
        roughness: Float,
        #[serde(default = "default_distribution")]
        distribution: String,
        #[serde(default = "default_geometry")]
        geometry: String,
        eta: [Float; 3],
        k: [Float; 3],
    },
    MicrofacetDielectric {
        albedo: [Float; 3],
        roughness: Float,
        #[serde(default = "default_distribution")]
        distribution: String,
        #[serde(default = "default_geometry")]
        geometry: String,
        #[serde(default = "default_ior")]
        ior: Float,
    },
    MicrofacetRefraction {
        transmittance: [Float; 3],
        roughness: Float,
        #[serde(default = "default_distribution")]
        distribution: String,
        #[serde(default = "default_ior")]
        ior_in: Float,
        #[serde(default = "default_one")]
        ior_ex: Float,
    },
    AshikhminShirley {
        diffuse: [Float; 3],
        specular: [Float; 3],
        roughness: Float,
    },
    Phong {
        diffuse: [Float; 3],
        specular: [Float; 3],
        power: Float,
    },
    Mirror {
        reflectance: [Float; 3],
    },
    Dielectric {
        reflectance: [Float; 3],
        transmittance: [Float; 3],
        #[serde(default = "default_ior")]
        ior: Float,
    },
    Disney {
        base_color: [Float; 3],
        #[serde(default)]
        metallic: Float,
        #[serde(default = "default_ior")]
        eta: Float,
        #[serde(default = "default_half")]
        roughness: Float,
        #[serde(default)]
        specular_tint: Float,
        #[serde(default)]
        anisotropic: Float,
        #[serde(default)]
        sheen: Float,
        #[serde(default = "default_half")]
        sheen_tint: Float,
        #[serde(default)]
        clearcoat: Float,
        #[serde(default = "default_one")]
        clearcoat_gloss: Float,
        #[serde(default)]
        spec_trans: Float,
        #[serde(default)]
        scatter_distance: [Float; 3],
        #[serde(default)]
        flatness: Float,
        #[serde(default)]
        diff_trans: Float,
        #[serde(default)]
        thin: bool,
    },
    Hair {
        color: [Float; 3],
        #[serde(default = "default_beta")]
        beta_m: Float,
        #[serde(default = "default_beta")]
        beta_n: Float,
        #[serde(default = "default_hair_ior")]
        ior: Float,
    },
    Merl {
        path: String,
    },
    FourierBrdf {
        path: String,
    },
    Coat {
        #[serde(default = "default_ior")]
        ior: Float,
        #[serde(default = "default_tenth")]
        roughness: Float,
        #[serde(default)]
        sigma: [Float; 3],
        #[serde(default = "default_one")]
        thickness: Float,
        base: Box<ClosureDesc>,
    },
    DoubleSided {
        front: Box<ClosureDesc>,
        back: Box<ClosureDesc>,
    },
    DistributionBrdf {
        albedo: [Float; 3],
        roughness: Float,
    },
    Fabric {
        albedo: [Float; 3],
        roughness: Float,
    },
    Sss {
        albedo: [Float; 3],
        scatter_distance: [Float; 3],
        #[serde(default = "default_sss_ior")]
        ior: Float,
    },
}

fn default_distribution() -> String {
    "ggx".to_string()
}
fn default_geometry() -> String {
    "smith".to_string()
}
fn default_ior() -> Float {
    1.5
}
fn default_one() -> Float {
    1.0
}
fn default_half() -> Float {
    0.5
}
fn default_tenth() -> Float {
    0.1
}
fn default_beta() -> Float {
    0.3
}
fn default_hair_ior() -> Float {
    1.55
}
fn default_sss_ior() -> Float {
    1.33
}

fn parse_distribution(name: &str) -> DistributionKind {
    match name {
        "beckmann" => DistributionKind::Beckmann,
        "blinn" => DistributionKind::Blinn,
        _ => DistributionKind::Ggx,
    }
}

fn parse_geometry(name: &str) -> GeometricShadow {
    match name {
        "implicit" => GeometricShadow::Implicit,
        "neumann" => GeometricShadow::Neumann,
        "kelemen" => GeometricShadow::Kelemen,
        "schlick" => GeometricShadow::Schlick,
        "cook_torrance" => GeometricShadow::CookTorrance,
        "smith_joint" => GeometricShadow::SmithJoint,
        _ => GeometricShadow::Smith,
    }
}

fn resolve_closure(desc: ClosureDesc, base_dir: &Path) -> Result<Closure, SceneError> {
    Ok(match desc {
        ClosureDesc::Weighted { weight, inner } => Closure::Weighted {
            weight: rgb(&weight),
            inner: Box::new(resolve_closure(*inner, base_dir)?),
        },
        ClosureDesc::Add { nodes } => Closure::Add {
            nodes: nodes
                .into_iter()
                .map(|n| resolve_closure(n, base_dir))
                .collect::<Result<Vec<_>, _>>()?,
        },
        ClosureDesc::Lambert { albedo } => Closure::Lambert {
            albedo: rgb(&albedo),
        },
        ClosureDesc::LambertTransmission { transmittance } => Closure::LambertTransmission {
            transmittance: rgb(&transmittance),
        },
        ClosureDesc::OrenNayar { albedo, sigma } => Closure::OrenNayar {
            albedo: rgb(&albedo),
            sigma,
        },
        ClosureDesc::Microfacet {
            albedo,
            roughness,
            distribution,
            geometry,
            eta,
            k,
        } => Closure::Microfacet {
            albedo: rgb(&albedo),
            roughness,
            distribution: parse_distribution(&distribution),
            geometry: parse_geometry(&geometry),
            eta: rgb(&eta),
            k: rgb(&k),
        },
        ClosureDesc::MicrofacetDielectric {
            albedo,
            roughness,
            distribution,
            geometry,
            ior,
        } => Closure::MicrofacetDielectric {
            albedo: rgb(&albedo),
            roughness,
            distribution: parse_distribution(&distribution),
            geometry: parse_geometry(&geometry),
            ior,
        },
        ClosureDesc::MicrofacetRefraction {
            transmittance,
            roughness,
            distribution,
            ior_in,
            ior_ex,
        } => Closure::MicrofacetRefraction {
            transmittance: rgb(&transmittance),
            roughness,
            distribution: parse_distribution(&distribution),
            ior_in,
            ior_ex,
        },
        ClosureDesc::AshikhminShirley {
            diffuse,
            specular,
            roughness,
        } => Closure::AshikhminShirley {
            diffuse: rgb(&diffuse),
            specular: rgb(&specular),
            roughness,
        },
        ClosureDesc::Phong {
            diffuse,
            specular,
            power,
        } => Closure::Phong {
            diffuse: rgb(&diffuse),
            specular: rgb(&specular),
            power,
        },
        ClosureDesc::Mirror { reflectance } => Closure::Mirror {
            reflectance: rgb(&reflectance),
        },
        ClosureDesc::Dielectric {
            reflectance,
            transmittance,
            ior,
        } => Closure::Dielectric {
            reflectance: rgb(&reflectance),
            transmittance: rgb(&transmittance),
            ior,
        },
        ClosureDesc::Disney {
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
        } => Closure::Disney {
            base_color: rgb(&base_color),
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
            scatter_distance: rgb(&scatter_distance),
            flatness,
            diff_trans,
            thin,
        },
        ClosureDesc::Hair {
            color,
            beta_m,
            beta_n,
            ior,
        } => Closure::Hair {
            color: rgb(&color),
            beta_m,
            beta_n,
            ior,
        },
        ClosureDesc::Merl { path } => {
            let table = MerlTable::read(&base_dir.join(path))?;
            Closure::Merl {
                brdf: MerlBrdf::new(Arc::new(table)),
            }
        }
        ClosureDesc::FourierBrdf { path } => {
            let table = FourierTable::read(&base_dir.join(path))?;
            Closure::Fourier {
                brdf: FourierBsdf::new(Arc::new(table)),
            }
        }
        ClosureDesc::Coat {
            ior,
            roughness,
            sigma,
            thickness,
            base,
        } => Closure::Coat {
            ior,
            roughness,
            sigma: rgb(&sigma),
            thickness,
            base: Box::new(resolve_closure(*base, base_dir)?),
        },
        ClosureDesc::DoubleSided { front, back } => Closure::DoubleSided {
            front: Box::new(resolve_closure(*front, base_dir)?),
            back: Box::new(resolve_closure(*back, base_dir)?),
        },
        ClosureDesc::DistributionBrdf { albedo, roughness } => Closure::DistributionBrdf {
            albedo: rgb(&albedo),
            roughness,
        },
        ClosureDesc::Fabric { albedo, roughness } => Closure::Fabric {
            albedo: rgb(&albedo),
            roughness,
        },
        ClosureDesc::Sss {
            albedo,
            scatter_distance,
            ior,
        } => Closure::Sss {
            albedo: rgb(&albedo),
            scatter_distance: rgb(&scatter_distance),
            ior,
        },
    })
}

fn closure_from_value(
    value: serde_json::Value,
    base_dir: &Path,
) -> Result<Closure, SceneError> {
    let kind = value
        .get("kind")
        .and_then(|k| k.as_str())
        .unwrap_or("<missing>")
        .to_string();
    let desc: ClosureDesc = serde_json::from_value(value).map_err(|e| {
        if e.to_string().contains("unknown variant") {
            SceneError::UnknownClosure(kind)
        } else {
            SceneError::Json(e)
        }
    })?;
    resolve_closure(desc, base_dir)
}

fn point(v: &[Float; 3]) -> Point3f {
    Point3f {
        x: v[0],
        y: v[1],
        z: v[2],
    }
}

fn vector(v: &[Float; 3]) -> Vector3f {
    Vector3f {
        x: v[0],
        y: v[1],
        z: v[2],
    }
}

/// Everything the binary needs to run a render.
pub struct RenderSetup {
    pub scene: Scene,
    pub camera: Camera,
    pub film: Film,
    pub sampler: Sampler,
    pub integrator: Integrator,
}

pub fn load_scene(path: &Path) -> Result<RenderSetup, SceneError> {
    let base_dir: PathBuf = path.parent().map(PathBuf::from).unwrap_or_default();
    let mut reader = BufReader::new(File::open(path)?);
    // header
    let mut magic = [0_u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != SCENE_MAGIC {
        return Err(SceneError::BadMagic);
    }
    let version = reader.read_u32::<LittleEndian>()?;
    if version != SCENE_VERSION {
        return Err(SceneError::UnsupportedVersion(version));
    }
    let json_len = reader.read_u64::<LittleEndian>()? as usize;
    let mut json_bytes = vec![0_u8; json_len];
    reader.read_exact(&mut json_bytes)?;
    let desc: SceneDesc = serde_json::from_slice(&json_bytes)?;
    // mesh payloads follow the document in declaration order
    let mut meshes: Vec<Arc<TriangleMesh>> = Vec::with_capacity(desc.meshes.len());
    for (mesh_index, mesh_desc) in desc.meshes.iter().enumerate() {
        let n_vertices = reader.read_u32::<LittleEndian>()? as usize;
        let n_indices = reader.read_u32::<LittleEndian>()? as usize;
        if n_vertices != mesh_desc.vertices || n_indices != mesh_desc.triangles * 3 {
            return Err(SceneError::DegenerateMesh(format!(
                "mesh {} payload does not match its declaration",
                mesh_index
            )));
        }
        if n_vertices == 0 || n_indices == 0 {
            return Err(SceneError::DegenerateMesh(format!("mesh {} is empty", mesh_index)));
        }
        let mut positions: Vec<Point3f> = Vec::with_capacity(n_vertices);
        for _ in 0..n_vertices {
            let x = reader.read_f32::<LittleEndian>()?;
            let y = reader.read_f32::<LittleEndian>()?;
            let z = reader.read_f32::<LittleEndian>()?;
            positions.push(Point3f { x, y, z });
        }
        let mut normals: Vec<Normal3f> = Vec::new();
        if mesh_desc.has_normals {
            normals.reserve_exact(n_vertices);
            for _ in 0..n_vertices {
                let x = reader.read_f32::<LittleEndian>()?;
                let y = reader.read_f32::<LittleEndian>()?;
                let z = reader.read_f32::<LittleEndian>()?;
                normals.push(Normal3f { x, y, z });
            }
        }
        let mut uvs: Vec<Point2f> = Vec::new();
        if mesh_desc.has_uvs {
            uvs.reserve_exact(n_vertices);
            for _ in 0..n_vertices {
                let x = reader.read_f32::<LittleEndian>()?;
                let y = reader.read_f32::<LittleEndian>()?;
                uvs.push(Point2f { x, y });
            }
        }
        let mut indices: Vec<u32> = Vec::with_capacity(n_indices);
        for _ in 0..n_indices {
            let i = reader.read_u32::<LittleEndian>()?;
            if i as usize >= n_vertices {
                return Err(SceneError::DegenerateMesh(format!(
                    "mesh {} index {} out of range",
                    mesh_index, i
                )));
            }
            indices.push(i);
        }
        meshes.push(Arc::new(TriangleMesh::new(indices, positions, normals, uvs)));
    }
    // materials
    let mut materials: Vec<Arc<Material>> = Vec::with_capacity(desc.materials.len());
    for value in desc.materials.into_iter() {
        let closure = closure_from_value(value, &base_dir)?;
        materials.push(Arc::new(Material::new(closure)));
    }
    // non-area lights
    let mut lights: Vec<Arc<Light>> = Vec::new();
    for light_desc in &desc.lights {
        lights.push(Arc::new(match light_desc {
            LightDesc::Sky { radiance } => Light::Sky(SkyLight::new(rgb(radiance))),
            LightDesc::Point {
                position,
                intensity,
            } => Light::Point(PointLight::new(point(position), rgb(intensity))),
            LightDesc::Distant {
                direction,
                radiance,
            } => Light::Distant(DistantLight::new(rgb(radiance), -vector(direction))),
        }));
    }
    // primitives; emissive ones also spawn an area light each
    let mut primitives: Vec<Arc<Primitive>> = Vec::new();
    for prim_desc in &desc.primitives {
        let material: Option<Arc<Material>> = match prim_desc.material {
            Some(index) => Some(
                materials
                    .get(index)
                    .cloned()
                    .ok_or(SceneError::MissingMaterial(index))?,
            ),
            None => None,
        };
        let shapes: Vec<Shape> = match &prim_desc.shape {
            ShapeDesc::Sphere { center, radius } => {
                vec![Shape::Sphere(Sphere::new(point(center), *radius))]
            }
            ShapeDesc::Disk {
                center,
                normal,
                radius,
            } => vec![Shape::Disk(Disk::new(
                point(center),
                Normal3f {
                    x: normal[0],
                    y: normal[1],
                    z: normal[2],
                },
                *radius,
            ))],
            ShapeDesc::Quad { p, e0, e1 } => {
                vec![Shape::Quad(Quad::new(point(p), vector(e0), vector(e1)))]
            }
            ShapeDesc::Line {
                p0,
                p1,
                width0,
                width1,
            } => vec![Shape::Line(LineSegment::new(
                point(p0),
                point(p1),
                *width0,
                *width1,
            ))],
            ShapeDesc::Mesh { mesh } => {
                let mesh_arc = meshes
                    .get(*mesh)
                    .cloned()
                    .ok_or(SceneError::MissingMesh(*mesh))?;
                (0..mesh_arc.n_triangles)
                    .map(|i| Shape::Triangle(Triangle::new(mesh_arc.clone(), i as u32)))
                    .collect()
            }
        };
        for shape in shapes {
            let index = primitives.len() as u32;
            let mut primitive = Primitive::new(shape.clone(), material.clone(), index);
            if let Some(emission) = prim_desc.emission {
                let light_index = lights.len() as u32;
                lights.push(Arc::new(Light::Area(DiffuseAreaLight::new(
                    rgb(&emission),
                    shape,
                    prim_desc.two_sided,
                ))));
                primitive.area_light = Some(light_index);
            }
            primitives.push(Arc::new(primitive));
        }
    }
    // camera
    let camera_desc = desc.camera.ok_or(SceneError::MissingCamera)?;
    let film_desc = desc.film;
    let camera = Camera::Perspective(PerspectiveCamera::new(
        point(&camera_desc.eye),
        point(&camera_desc.target),
        vector(&camera_desc.up),
        camera_desc.fov,
        film_desc.width,
        film_desc.height,
        camera_desc.lens_radius,
        camera_desc.focal_distance,
    ));
    let filter = match film_desc.filter.as_deref() {
        Some("triangle") => Filter::Triangle(TriangleFilter { radius: 1.0 }),
        _ => Filter::BoxFilter(BoxFilter { radius: 0.5 }),
    };
    let film = Film::new(film_desc.width, film_desc.height, filter);
    // sampler and integrator
    let sampler_desc = desc.sampler.unwrap_or_default();
    let sampler = Sampler::create(&sampler_desc.kind, sampler_desc.spp);
    let integrator_desc = desc.integrator.unwrap_or_default();
    let kind = IntegratorKind::from_str(&integrator_desc.kind)
        .map_err(|_| SceneError::UnknownIntegrator(integrator_desc.kind.clone()))?;
    let integrator = match kind {
        IntegratorKind::Ao => Integrator::Ao(AoIntegrator::new(
            integrator_desc.cos_sample,
            integrator_desc.n_samples,
            integrator_desc.max_distance,
        )),
        IntegratorKind::Whitted => {
            Integrator::Whitted(WhittedIntegrator::new(integrator_desc.max_depth))
        }
        IntegratorKind::Direct => {
            Integrator::Direct(DirectLightingIntegrator::new(integrator_desc.n_samples))
        }
        IntegratorKind::Path => Integrator::Path(PathIntegrator::new(
            integrator_desc.max_depth,
            integrator_desc.rr_threshold,
        )),
        IntegratorKind::Bdpt => Integrator::Bdpt(BdptIntegrator::new(integrator_desc.max_depth)),
        IntegratorKind::LightTracing => {
            Integrator::LightTracer(LightTracerIntegrator::new(integrator_desc.max_depth))
        }
        IntegratorKind::InstantRadiosity => {
            Integrator::InstantRadiosity(InstantRadiosityIntegrator::new(
                integrator_desc.n_light_paths,
                integrator_desc.max_depth,
                integrator_desc.g_clamp_distance,
            ))
        }
    };
    // accelerator and scene
    let wide = matches!(desc.accelerator.as_deref(), Some("obvh"));
    let aggregate = Accelerator::build(primitives, wide);
    let scene = Scene::new(aggregate, lights);
    log::info!(
        "loaded scene: {} primitives, {} lights",
        scene.primitives().len(),
        scene.lights.len()
    );
    Ok(RenderSetup {
        scene,
        camera,
        film,
        sampler,
        integrator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, WriteBytesExt};
    use std::io::Write;

    fn write_stream(path: &Path, version: u32, json: &str) {
        let mut f = File::create(path).unwrap();
        f.write_all(&SCENE_MAGIC).unwrap();
        f.write_u32::<LittleEndian>(version).unwrap();
        f.write_u64::<LittleEndian>(json.len() as u64).unwrap();
        f.write_all(json.as_bytes()).unwrap();
    }

    fn minimal_json() -> String {
        r#"{
            "camera": {"eye": [0,0,-5], "target": [0,0,0]},
            "film": {"width": 16, "height": 16},
            "lights": [{"kind": "sky", "radiance": [1,1,1]}],
            "materials": [{"kind": "lambert", "albedo": [0.5,0.5,0.5]}],
            "primitives": [
                {"shape": {"kind": "sphere", "center": [0,0,0], "radius": 1.0},
                 "material": 0}
            ]
        }"#
        .to_string()
    }

    #[test]
    fn loads_minimal_scene() {
        let dir = std::env::temp_dir();
        let path = dir.join("spica_loader_ok.scn");
        write_stream(&path, SCENE_VERSION, &minimal_json());
        let setup = load_scene(&path).unwrap();
        assert_eq!(setup.scene.primitives().len(), 1);
        assert_eq!(setup.scene.lights.len(), 1);
        assert_eq!(setup.film.width, 16);
    }

    #[test]
    fn refuses_unknown_version() {
        let dir = std::env::temp_dir();
        let path = dir.join("spica_loader_badver.scn");
        write_stream(&path, SCENE_VERSION + 9, &minimal_json());
        match load_scene(&path) {
            Err(SceneError::UnsupportedVersion(v)) => assert_eq!(v, SCENE_VERSION + 9),
            other => panic!("expected version error, got {:?}", other.err()),
        }
    }

    #[test]
    fn refuses_bad_magic() {
        let dir = std::env::temp_dir();
        let path = dir.join("spica_loader_badmagic.scn");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"NOPE").unwrap();
        f.write_u32::<LittleEndian>(SCENE_VERSION).unwrap();
        f.write_u64::<LittleEndian>(0).unwrap();
        drop(f);
        assert!(matches!(load_scene(&path), Err(SceneError::BadMagic)));
    }

    #[test]
    fn unknown_closure_is_reported_by_name() {
        let dir = std::env::temp_dir();
        let path = dir.join("spica_loader_badclosure.scn");
        let json = minimal_json().replace("\"kind\": \"lambert\"", "\"kind\": \"velvetron\"");
        write_stream(&path, SCENE_VERSION, &json);
        match load_scene(&path) {
            Err(SceneError::UnknownClosure(name)) => assert_eq!(name, "velvetron"),
            other => panic!("expected closure error, got {:?}", other.err()),
        }
    }

    #[test]
    fn missing_camera_is_fatal() {
        let dir = std::env::temp_dir();
        let path = dir.join("spica_loader_nocam.scn");
        let json = r#"{"film": {"width": 8, "height": 8}}"#;
        write_stream(&path, SCENE_VERSION, json);
        assert!(matches!(load_scene(&path), Err(SceneError::MissingCamera)));
    }
}
