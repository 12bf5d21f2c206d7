//! Bidirectional path tracing. One camera subpath and one light subpath
//! are traced per pixel sample; every pair of prefix lengths (s, t) forms
//! a connection strategy, weighted with the balance heuristic over all
//! decompositions of the same path length. Strategies with t = 1 connect
//! a light vertex straight to the camera and splat onto the film.

// spica
use crate::core::base::{Float, Spectrum};
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::geometry::{
    nrm_dot_vec3f, pnt3_offset_ray_origin, vec3_abs_dot_nrmf, Normal3f, Point3f, Ray, Vector3f,
};
use crate::core::interaction::SurfaceInteraction;
use crate::core::reflection::{Bsdf, BxdfType};
use crate::core::sampler::Sampler;
use crate::core::sampling::balance_heuristic;
use crate::core::scene::Scene;
use crate::lights::{LightRef, VisibilityTester};

#[derive(Debug, Clone, PartialEq)]
pub enum VertexKind {
    Camera,
    Light,
    Surface,
}

/// One subpath vertex. `pdf_fwd` and `pdf_rev` are area densities of
/// generating this vertex from the previous/next vertex, which the
/// balance-heuristic weight walks over.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub kind: VertexKind,
    pub beta: Spectrum,
    pub p: Point3f,
    pub n: Normal3f,
    pub ns: Normal3f,
    /// Toward the previous vertex on the subpath.
    pub wo: Vector3f,
    pub bsdf: Option<Bsdf>,
    pub primitive: Option<u32>,
    pub light_index: Option<usize>,
    pub delta: bool,
    pub pdf_fwd: Float,
    pub pdf_rev: Float,
}

impl Vertex {
    fn camera(p: Point3f, n: Normal3f) -> Vertex {
        Vertex {
            kind: VertexKind::Camera,
            beta: Spectrum::new(1.0),
            p,
            n,
            ns: n,
            wo: Vector3f::default(),
            bsdf: None,
            primitive: None,
            light_index: None,
            delta: false,
            pdf_fwd: 1.0,
            pdf_rev: 0.0,
        }
    }
    fn light(light_index: usize, p: Point3f, n: Normal3f, le: Spectrum, pdf_fwd: Float) -> Vertex {
        Vertex {
            kind: VertexKind::Light,
            beta: le,
            p,
            n,
            ns: n,
            wo: Vector3f::default(),
            bsdf: None,
            primitive: None,
            light_index: Some(light_index),
            delta: false,
            pdf_fwd,
            pdf_rev: 0.0,
        }
    }
    fn surface(isect: &SurfaceInteraction, beta: Spectrum, pdf_fwd: Float, scene: &Scene) -> Vertex {
        let light_index = isect
            .primitive
            .and_then(|i| scene.primitive(i).area_light)
            .map(|i| i as usize);
        Vertex {
            kind: VertexKind::Surface,
            beta,
            p: isect.p,
            n: isect.n,
            ns: isect.shading_n,
            wo: isect.wo,
            bsdf: isect.bsdf.clone(),
            primitive: isect.primitive,
            light_index,
            delta: false,
            pdf_fwd,
            pdf_rev: 0.0,
        }
    }
    fn is_on_light(&self) -> bool {
        self.kind == VertexKind::Light || self.light_index.is_some()
    }
    fn is_connectible(&self) -> bool {
        match self.kind {
            VertexKind::Surface => {
                let flags = BxdfType::BsdfAll as u8 & !(BxdfType::BsdfSpecular as u8);
                self.bsdf
                    .as_ref()
                    .map(|b| b.num_components(flags) > 0)
                    .unwrap_or(false)
            }
            _ => true,
        }
    }
    /// Emitted radiance toward `w` when this vertex lies on an area
    /// light.
    fn le(&self, scene: &Scene, w: &Vector3f) -> Spectrum {
        match self.light_index {
            Some(index) => scene.lights[index].l(&self.n, w),
            None => Spectrum::default(),
        }
    }
    /// BSDF value toward another vertex.
    fn f(&self, next: &Vertex) -> Spectrum {
        let wi = (next.p - self.p).normalize();
        match self.bsdf {
            Some(ref bsdf) => bsdf.f(&self.wo, &wi, BxdfType::BsdfAll as u8),
            None => Spectrum::default(),
        }
    }
    /// Convert a solid-angle density at this vertex into an area density
    /// at `next`.
    fn convert_density(&self, pdf: Float, next: &Vertex) -> Float {
        let w = next.p - self.p;
        let dist2 = w.length_squared();
        if dist2 <= 0.0 as Float {
            return 0.0;
        }
        let mut pdf = pdf / dist2;
        if next.kind == VertexKind::Surface || next.kind == VertexKind::Light {
            pdf *= nrm_dot_vec3f(&next.n, &(w / dist2.sqrt())).abs();
        }
        pdf
    }
    /// Area density of generating `next` from this vertex, given the
    /// previous vertex.
    fn pdf(&self, scene: &Scene, prev: Option<&Vertex>, next: &Vertex, camera: &Camera) -> Float {
        let wn = (next.p - self.p).normalize();
        let pdf_dir: Float = match self.kind {
            VertexKind::Camera => {
                let (_, pdf_dir) = camera.pdf_we(&Ray::new(self.p, wn));
                pdf_dir
            }
            VertexKind::Light => {
                return self.pdf_light(scene, next);
            }
            VertexKind::Surface => {
                let wp = match prev {
                    Some(prev) => (prev.p - self.p).normalize(),
                    None => self.wo,
                };
                match self.bsdf {
                    Some(ref bsdf) => bsdf.pdf(&wp, &wn, BxdfType::BsdfAll as u8),
                    None => 0.0,
                }
            }
        };
        self.convert_density(pdf_dir, next)
    }
    /// Area density of the light at this vertex emitting toward `next`.
    fn pdf_light(&self, scene: &Scene, next: &Vertex) -> Float {
        let light_index = match self.light_index {
            Some(i) => i,
            None => return 0.0,
        };
        let w = next.p - self.p;
        let dist2 = w.length_squared();
        if dist2 <= 0.0 as Float {
            return 0.0;
        }
        let w = w / dist2.sqrt();
        let mut pdf_pos: Float = 0.0;
        let mut pdf_dir: Float = 0.0;
        scene.lights[light_index].pdf_le(&Ray::new(self.p, w), &self.n, &mut pdf_pos, &mut pdf_dir);
        let mut pdf = pdf_dir / dist2;
        if next.kind == VertexKind::Surface {
            pdf *= nrm_dot_vec3f(&next.n, &w).abs();
        }
        pdf
    }
    /// Density of choosing this light vertex as a path origin.
    fn pdf_light_origin(&self, scene: &Scene, next: &Vertex) -> Float {
        let light_index = match self.light_index {
            Some(i) => i,
            None => return 0.0,
        };
        let w = (next.p - self.p).normalize();
        let mut pdf_pos: Float = 0.0;
        let mut pdf_dir: Float = 0.0;
        scene.lights[light_index].pdf_le(&Ray::new(self.p, w), &self.n, &mut pdf_pos, &mut pdf_dir);
        scene.light_pdf(light_index) * pdf_pos
    }
}

pub struct BdptIntegrator {
    pub max_depth: u32,
}

impl BdptIntegrator {
    pub fn new(max_depth: u32) -> Self {
        BdptIntegrator { max_depth }
    }
    pub fn preprocess(&mut self, _scene: &Scene, _sampler: &mut Sampler) {}
    fn random_walk(
        &self,
        scene: &Scene,
        sampler: &mut Sampler,
        mut ray: Ray,
        mut beta: Spectrum,
        mut pdf_dir: Float,
        max_depth: u32,
        path: &mut Vec<Vertex>,
    ) -> Option<(Spectrum, Ray, Float, bool)> {
        // returns escape information for environment handling on camera
        // subpaths
        if max_depth == 0 {
            return None;
        }
        let mut bounces: u32 = 0;
        loop {
            let mut isect = match scene.intersect(&ray) {
                Some(isect) => isect,
                None => {
                    let last_delta = path.last().map(|v| v.delta).unwrap_or(false);
                    return Some((beta, ray.clone(), pdf_dir, last_delta));
                }
            };
            scene.compute_scattering_functions(&mut isect);
            if isect.bsdf.is_none() {
                ray = isect.spawn_ray(&ray.d);
                continue;
            }
            let prev_index = path.len() - 1;
            let pdf_fwd_area = path[prev_index].convert_density(
                pdf_dir,
                &Vertex::surface(&isect, beta, 0.0, scene),
            );
            let mut vertex = Vertex::surface(&isect, beta, pdf_fwd_area, scene);
            bounces += 1;
            if bounces >= max_depth {
                path.push(vertex);
                return None;
            }
            // extend the walk
            let wo = isect.wo;
            let mut wi: Vector3f = Vector3f::default();
            let mut pdf: Float = 0.0;
            let mut sampled_type: u8 = u8::max_value();
            let f: Spectrum = isect
                .bsdf
                .as_ref()
                .map(|b| {
                    b.sample_f(
                        &wo,
                        &mut wi,
                        &sampler.get_2d(),
                        &mut pdf,
                        BxdfType::BsdfAll as u8,
                        &mut sampled_type,
                    )
                })
                .unwrap_or_default();
            if f.is_black() || pdf == 0.0 as Float {
                path.push(vertex);
                return None;
            }
            beta *= f * vec3_abs_dot_nrmf(&wi, &isect.shading_n) / pdf;
            let specular = sampled_type & BxdfType::BsdfSpecular as u8 != 0;
            vertex.delta = specular;
            // reverse density back toward the previous vertex
            let pdf_rev_solid = match isect.bsdf {
                Some(ref bsdf) => bsdf.pdf(&wi, &wo, BxdfType::BsdfAll as u8),
                None => 0.0,
            };
            path[prev_index].pdf_rev = if specular {
                0.0
            } else {
                vertex.convert_density(pdf_rev_solid, &path[prev_index])
            };
            pdf_dir = if specular { 0.0 } else { pdf };
            ray = isect.spawn_ray(&wi);
            path.push(vertex);
        }
    }
    fn generate_camera_subpath(
        &self,
        scene: &Scene,
        sampler: &mut Sampler,
        camera: &Camera,
        ray: &Ray,
    ) -> (Vec<Vertex>, Option<(Spectrum, Ray, Float, bool)>) {
        let mut path: Vec<Vertex> = Vec::with_capacity(self.max_depth as usize + 2);
        path.push(Vertex::camera(ray.o, Normal3f::from(camera.forward())));
        let (_pdf_pos, pdf_dir) = camera.pdf_we(ray);
        let escape = self.random_walk(
            scene,
            sampler,
            ray.clone(),
            Spectrum::new(1.0),
            pdf_dir,
            self.max_depth + 1,
            &mut path,
        );
        (path, escape)
    }
    fn generate_light_subpath(&self, scene: &Scene, sampler: &mut Sampler) -> Vec<Vertex> {
        let mut path: Vec<Vertex> = Vec::with_capacity(self.max_depth as usize + 1);
        let mut pick_pdf: Float = 0.0;
        let (light_index, light) = match scene.sample_light(sampler.get_1d(), &mut pick_pdf) {
            Some(pair) => pair,
            None => return path,
        };
        if pick_pdf <= 0.0 as Float {
            return path;
        }
        let mut ray: Ray = Ray::default();
        let mut n_light: Normal3f = Normal3f::default();
        let mut pdf_pos: Float = 0.0;
        let mut pdf_dir: Float = 0.0;
        let le: Spectrum = light.sample_le(
            sampler.get_2d(),
            sampler.get_2d(),
            &mut ray,
            &mut n_light,
            &mut pdf_pos,
            &mut pdf_dir,
        );
        if le.is_black() || pdf_pos == 0.0 as Float || pdf_dir == 0.0 as Float {
            return path;
        }
        path.push(Vertex::light(
            light_index,
            ray.o,
            n_light,
            le,
            pdf_pos * pick_pdf,
        ));
        let beta: Spectrum =
            le * vec3_abs_dot_nrmf(&ray.d, &n_light) / (pick_pdf * pdf_pos * pdf_dir);
        let _ = self.random_walk(
            scene,
            sampler,
            ray,
            beta,
            pdf_dir,
            self.max_depth,
            &mut path,
        );
        path
    }
    /// Geometry term with visibility between two vertices.
    fn g(&self, scene: &Scene, v0: &Vertex, v1: &Vertex) -> Float {
        let d = v1.p - v0.p;
        let dist2 = d.length_squared();
        if dist2 <= 0.0 as Float {
            return 0.0;
        }
        let w = d / dist2.sqrt();
        let mut g: Float = 1.0 / dist2;
        if v0.kind == VertexKind::Surface {
            g *= nrm_dot_vec3f(&v0.ns, &w).abs();
        }
        if v1.kind == VertexKind::Surface {
            g *= nrm_dot_vec3f(&v1.ns, &w).abs();
        }
        let o = pnt3_offset_ray_origin(&v0.p, &v0.n, &d);
        let shadow = Ray::new_with_span(o, d, 0.0 as Float, 1.0 as Float - 1e-3 as Float);
        if scene.intersect_p(&shadow) {
            return 0.0;
        }
        g
    }
    /// Balance-heuristic weight for strategy (s, t), walking the densities
    /// of every other decomposition of the same path.
    #[allow(clippy::too_many_arguments)]
    fn mis_weight(
        &self,
        scene: &Scene,
        camera: &Camera,
        light_vs: &[Vertex],
        camera_vs: &[Vertex],
        sampled: Option<&Vertex>,
        s: usize,
        t: usize,
    ) -> Float {
        if s + t == 2 {
            return 1.0;
        }
        let remap0 = |f: Float| -> Float {
            if f != 0.0 {
                f
            } else {
                1.0
            }
        };
        // local copies of the strategy endpoints with their reverse
        // densities rewritten for this connection
        let qs: Option<Vertex> = if s > 0 {
            if s == 1 {
                sampled.cloned()
            } else {
                Some(light_vs[s - 1].clone())
            }
        } else {
            None
        };
        let pt: Option<Vertex> = if t == 1 {
            sampled.cloned()
        } else {
            Some(camera_vs[t - 1].clone())
        };
        let mut pt = match pt {
            Some(v) => v,
            None => return 0.0,
        };
        pt.delta = false;
        let mut qs = qs;
        if let Some(ref mut q) = qs {
            q.delta = false;
        }
        // pdf_rev overrides at the junction
        let pt_rev: Float = match qs {
            Some(ref q) => {
                let q_prev = if s >= 2 { Some(&light_vs[s - 2]) } else { None };
                q.pdf(scene, q_prev, &pt, camera)
            }
            None => {
                // s == 0: the camera path endpoint doubles as the light
                let pt_prev = &camera_vs[t - 2];
                pt.pdf_light_origin(scene, pt_prev)
            }
        };
        let pt_minus_rev: Float = if t >= 2 {
            match qs {
                Some(ref q) => pt.pdf(scene, Some(q), &camera_vs[t - 2], camera),
                None => pt.pdf_light(scene, &camera_vs[t - 2]),
            }
        } else {
            0.0
        };
        let qs_rev: Float = match qs {
            Some(ref q) => {
                let pt_prev = if t >= 2 { Some(&camera_vs[t - 2]) } else { None };
                pt.pdf(scene, pt_prev, q, camera)
            }
            None => 0.0,
        };
        let qs_minus_rev: Float = match qs {
            Some(ref q) => {
                if s >= 2 {
                    q.pdf(scene, Some(&pt), &light_vs[s - 2], camera)
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        let mut sum_ri: Float = 0.0;
        // camera side: strategies that shorten the camera subpath
        let mut ri: Float = 1.0;
        for i in (1..t).rev() {
            let pdf_rev = if i == t - 1 {
                pt_rev
            } else if i == t - 2 && t >= 2 {
                pt_minus_rev
            } else {
                camera_vs[i].pdf_rev
            };
            let pdf_fwd = camera_vs[i].pdf_fwd;
            ri *= remap0(pdf_rev) / remap0(pdf_fwd);
            let delta_i = if i == t - 1 { false } else { camera_vs[i].delta };
            let delta_prev = if i >= 1 { camera_vs[i - 1].delta } else { false };
            if !delta_i && !delta_prev {
                sum_ri += ri;
            }
        }
        // light side
        let mut ri: Float = 1.0;
        for i in (0..s).rev() {
            let pdf_rev = if i == s - 1 {
                qs_rev
            } else if i + 2 == s && s >= 2 {
                qs_minus_rev
            } else {
                light_vs[i].pdf_rev
            };
            let pdf_fwd = light_vs[i].pdf_fwd;
            ri *= remap0(pdf_rev) / remap0(pdf_fwd);
            let delta_i = if i == s - 1 { false } else { light_vs[i].delta };
            let delta_prev = if i >= 1 {
                light_vs[i - 1].delta
            } else {
                // a delta light origin cannot be hit by a camera path
                scene.lights[light_vs[0].light_index.unwrap_or(0)].is_delta()
            };
            if !delta_i && !delta_prev {
                sum_ri += ri;
            }
        }
        1.0 as Float / (1.0 as Float + sum_ri)
    }
    /// Evaluate one (s, t) connection strategy. t = 1 strategies return
    /// the raster position to splat instead of contributing to the pixel.
    #[allow(clippy::too_many_arguments)]
    fn connect(
        &self,
        scene: &Scene,
        camera: &Camera,
        light_vs: &[Vertex],
        camera_vs: &[Vertex],
        s: usize,
        t: usize,
        sampler: &mut Sampler,
        film: &Film,
    ) -> Spectrum {
        let mut l: Spectrum = Spectrum::default();
        let mut sampled: Option<Vertex> = None;
        if s == 0 {
            // the camera subpath alone, ending on an emitter
            let pt = &camera_vs[t - 1];
            if pt.is_on_light() {
                let w = (camera_vs[t - 2].p - pt.p).normalize();
                l = pt.le(scene, &w) * pt.beta;
            }
        } else if t == 1 {
            // connect a light vertex straight to the camera and splat
            let qs = &light_vs[s - 1];
            if qs.is_connectible() {
                let mut wi: Vector3f = Vector3f::default();
                let mut pdf: Float = 0.0;
                if let Some((importance, raster)) = camera.sample_wi(&qs.p, &mut wi, &mut pdf) {
                    if pdf > 0.0 as Float && !importance.is_black() {
                        let cam_v = Vertex::camera(camera.eye(), Normal3f::from(camera.forward()));
                        sampled = Some(cam_v.clone());
                        let f = qs.f(&cam_v);
                        if !f.is_black() {
                            let vis = VisibilityTester {
                                p0: qs.p,
                                n0: qs.n,
                                p1: cam_v.p,
                            };
                            if vis.unoccluded(scene) {
                                let contrib = qs.beta
                                    * f
                                    * vec3_abs_dot_nrmf(&wi, &qs.ns)
                                    * importance
                                    / pdf;
                                if !contrib.is_black() {
                                    let weight = self.mis_weight(
                                        scene,
                                        camera,
                                        light_vs,
                                        camera_vs,
                                        sampled.as_ref(),
                                        s,
                                        t,
                                    );
                                    film.add_splat(raster, contrib * weight);
                                }
                            }
                        }
                    }
                }
            }
            return Spectrum::default();
        } else if s == 1 {
            // sample a light toward the camera endpoint
            let pt = &camera_vs[t - 1];
            if pt.is_connectible() {
                let mut pick_pdf: Float = 0.0;
                if let Some((light_index, light)) =
                    scene.sample_light(sampler.get_1d(), &mut pick_pdf)
                {
                    if pick_pdf > 0.0 as Float {
                        let iref = LightRef { p: pt.p, n: pt.n };
                        let mut wi: Vector3f = Vector3f::default();
                        let mut light_pdf: Float = 0.0;
                        let mut vis = VisibilityTester::default();
                        let li = light.sample_li(
                            &iref,
                            sampler.get_2d(),
                            &mut wi,
                            &mut light_pdf,
                            &mut vis,
                        );
                        if light_pdf > 0.0 as Float && !li.is_black() && vis.unoccluded(scene) {
                            // synthesize the sampled light vertex
                            let mut light_v = Vertex::light(
                                light_index,
                                vis.p1,
                                Normal3f::from(-wi),
                                li / (light_pdf * pick_pdf),
                                0.0,
                            );
                            light_v.pdf_fwd = light_v.pdf_light_origin(scene, pt);
                            let f = match pt.bsdf {
                                Some(ref bsdf) => {
                                    bsdf.f(&pt.wo, &wi, BxdfType::BsdfAll as u8)
                                }
                                None => Spectrum::default(),
                            };
                            l = pt.beta * f * vec3_abs_dot_nrmf(&wi, &pt.ns) * light_v.beta;
                            sampled = Some(light_v);
                        }
                    }
                }
            }
        } else {
            // general vertex-to-vertex connection
            let qs = &light_vs[s - 1];
            let pt = &camera_vs[t - 1];
            if qs.is_connectible() && pt.is_connectible() {
                l = qs.beta * qs.f(pt) * pt.f(qs) * pt.beta;
                if !l.is_black() {
                    l *= self.g(scene, qs, pt);
                }
            }
        }
        if l.is_black() {
            return l;
        }
        let weight = self.mis_weight(
            scene,
            camera,
            light_vs,
            camera_vs,
            sampled.as_ref(),
            s,
            t,
        );
        l * weight
    }
    pub fn li(
        &self,
        ray: &Ray,
        scene: &Scene,
        sampler: &mut Sampler,
        camera: &Camera,
        film: &Film,
    ) -> Spectrum {
        let (camera_vs, escape) = self.generate_camera_subpath(scene, sampler, camera, ray);
        let light_vs = self.generate_light_subpath(scene, sampler);
        let mut l: Spectrum = Spectrum::default();
        // environment radiance for escaped camera subpaths: weighted
        // against the light-sampling strategy at the previous vertex
        if let Some((beta, escape_ray, pdf_dir, last_delta)) = escape {
            for (index, light) in scene.lights.iter().enumerate() {
                if !light.is_infinite() {
                    continue;
                }
                let le = light.le(&escape_ray);
                if le.is_black() {
                    continue;
                }
                if camera_vs.len() <= 1 || last_delta || pdf_dir == 0.0 as Float {
                    l += beta * le;
                } else {
                    let iref = LightRef {
                        p: escape_ray.o,
                        n: Normal3f::default(),
                    };
                    let light_pdf =
                        light.pdf_li(&iref, &escape_ray.d) * scene.light_pdf(index);
                    let weight = balance_heuristic(1, pdf_dir, 1, light_pdf);
                    l += beta * le * weight;
                }
            }
        }
        for t in 1..=camera_vs.len() {
            for s in 0..=light_vs.len() {
                let depth = (s + t) as i32 - 2;
                if (s == 1 && t == 1) || depth < 0 || depth > self.max_depth as i32 {
                    continue;
                }
                l += self.connect(scene, camera, &light_vs, &camera_vs, s, t, sampler, film);
            }
        }
        l
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::pnt3_distance_squaredf;

    #[test]
    fn camera_vertex_density_converts_to_area() {
        let v0 = Vertex::camera(
            Point3f::default(),
            Normal3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        );
        let mut v1 = Vertex::camera(
            Point3f {
                x: 0.0,
                y: 0.0,
                z: 2.0,
            },
            Normal3f {
                x: 0.0,
                y: 0.0,
                z: -1.0,
            },
        );
        v1.kind = VertexKind::Surface;
        // area density falls off with the squared distance and the
        // receiver cosine (here exactly 1)
        let pdf = v0.convert_density(1.0, &v1);
        assert!((pdf - 0.25).abs() < 1e-5);
        assert!(pnt3_distance_squaredf(&v0.p, &v1.p) > 0.0);
    }
}
