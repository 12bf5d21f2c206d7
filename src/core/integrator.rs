//! The integrator interface, the shared direct-lighting estimator, and
//! the tile-parallel render driver.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// spica
use crate::blockqueue::BlockQueue;
use crate::core::base::{Float, Spectrum};
use crate::core::camera::{Camera, CameraSample};
use crate::core::film::{Film, FilmTile};
use crate::core::geometry::{vec3_abs_dot_nrmf, Point2f, Point2i, Ray, Vector3f};
use crate::core::interaction::SurfaceInteraction;
use crate::core::sampler::{PixelSample, Sampler};
use crate::core::sampling::power_heuristic;
use crate::core::scene::Scene;
use crate::core::stats;
use crate::integrators::ao::AoIntegrator;
use crate::integrators::bdpt::BdptIntegrator;
use crate::integrators::direct::DirectLightingIntegrator;
use crate::integrators::instantradiosity::InstantRadiosityIntegrator;
use crate::integrators::lighttracer::LightTracerIntegrator;
use crate::integrators::path::PathIntegrator;
use crate::integrators::whitted::WhittedIntegrator;
use crate::lights::{Light, LightRef, VisibilityTester};
use crate::core::reflection::BxdfType;

pub const TILE_SIZE: u32 = 16;

pub enum Integrator {
    Ao(AoIntegrator),
    Whitted(WhittedIntegrator),
    Direct(DirectLightingIntegrator),
    Path(PathIntegrator),
    Bdpt(BdptIntegrator),
    LightTracer(LightTracerIntegrator),
    InstantRadiosity(InstantRadiosityIntegrator),
}

impl Integrator {
    /// Register per-pixel sample tables and do any pre-render work (VPL
    /// tracing, light distributions).
    pub fn preprocess(&mut self, scene: &Scene, sampler: &mut Sampler) {
        match self {
            Integrator::Ao(integrator) => integrator.preprocess(scene, sampler),
            Integrator::Whitted(integrator) => integrator.preprocess(scene, sampler),
            Integrator::Direct(integrator) => integrator.preprocess(scene, sampler),
            Integrator::Path(integrator) => integrator.preprocess(scene, sampler),
            Integrator::Bdpt(integrator) => integrator.preprocess(scene, sampler),
            Integrator::LightTracer(integrator) => integrator.preprocess(scene, sampler),
            Integrator::InstantRadiosity(integrator) => integrator.preprocess(scene, sampler),
        }
    }
    /// Radiance arriving along `ray`. Splat-style integrators write film
    /// contributions directly and return only the part that belongs to
    /// this pixel.
    pub fn li(
        &self,
        ray: &Ray,
        scene: &Scene,
        sampler: &mut Sampler,
        ps: &PixelSample,
        camera: &Camera,
        film: &Film,
    ) -> Spectrum {
        match self {
            Integrator::Ao(integrator) => integrator.li(ray, scene, ps),
            Integrator::Whitted(integrator) => integrator.li(ray, scene, sampler, 0),
            Integrator::Direct(integrator) => integrator.li(ray, scene, sampler, ps),
            Integrator::Path(integrator) => integrator.li(ray, scene, sampler, ps),
            Integrator::Bdpt(integrator) => integrator.li(ray, scene, sampler, camera, film),
            Integrator::LightTracer(integrator) => integrator.li(scene, sampler, camera, film),
            Integrator::InstantRadiosity(integrator) => integrator.li(ray, scene, sampler),
        }
    }
    /// True when part of the image arrives through film splats and the
    /// final image needs the splat plane scaled in.
    pub fn uses_splats(&self) -> bool {
        matches!(
            self,
            Integrator::Bdpt(_) | Integrator::LightTracer(_)
        )
    }
}

/// Sample one light (chosen by emitted power) with multiple importance
/// sampling; the workhorse behind every integrator's direct lighting.
pub fn uniform_sample_one_light(
    isect: &SurfaceInteraction,
    scene: &Scene,
    u_pick: Float,
    u_light: Point2f,
    u_scattering: Point2f,
) -> Spectrum {
    let mut pick_pdf: Float = 0.0;
    let (light_index, light) = match scene.sample_light(u_pick, &mut pick_pdf) {
        Some(pair) => pair,
        None => return Spectrum::default(),
    };
    if pick_pdf <= 0.0 as Float {
        return Spectrum::default();
    }
    estimate_direct(isect, scene, light_index, light, u_light, u_scattering) / pick_pdf
}

/// One light sample plus one BSDF sample against a single light, combined
/// with the power heuristic.
pub fn estimate_direct(
    isect: &SurfaceInteraction,
    scene: &Scene,
    light_index: usize,
    light: &Light,
    u_light: Point2f,
    u_scattering: Point2f,
) -> Spectrum {
    let bsdf = match isect.bsdf {
        Some(ref bsdf) => bsdf,
        None => return Spectrum::default(),
    };
    let bsdf_flags: u8 = BxdfType::BsdfAll as u8 & !(BxdfType::BsdfSpecular as u8);
    let mut ld: Spectrum = Spectrum::default();
    let iref = LightRef {
        p: isect.p,
        n: isect.n,
    };
    // sample the light with MIS
    let mut wi: Vector3f = Vector3f::default();
    let mut light_pdf: Float = 0.0;
    let mut vis: VisibilityTester = VisibilityTester::default();
    let li: Spectrum = light.sample_li(&iref, u_light, &mut wi, &mut light_pdf, &mut vis);
    if light_pdf > 0.0 as Float && !li.is_black() {
        let f: Spectrum =
            bsdf.f(&isect.wo, &wi, bsdf_flags) * vec3_abs_dot_nrmf(&wi, &isect.shading_n);
        let scattering_pdf: Float = bsdf.pdf(&isect.wo, &wi, bsdf_flags);
        if !f.is_black() && vis.unoccluded(scene) {
            if light.is_delta() {
                ld += f * li / light_pdf;
            } else {
                let weight: Float = power_heuristic(1, light_pdf, 1, scattering_pdf);
                ld += f * li * weight / light_pdf;
            }
        }
    }
    // sample the BSDF with MIS
    if !light.is_delta() {
        let mut wi: Vector3f = Vector3f::default();
        let mut scattering_pdf: Float = 0.0;
        let mut sampled_type: u8 = u8::max_value();
        let mut f: Spectrum = bsdf.sample_f(
            &isect.wo,
            &mut wi,
            &u_scattering,
            &mut scattering_pdf,
            bsdf_flags,
            &mut sampled_type,
        );
        f *= vec3_abs_dot_nrmf(&wi, &isect.shading_n);
        let sampled_specular: bool = sampled_type & BxdfType::BsdfSpecular as u8 != 0_u8;
        if !f.is_black() && scattering_pdf > 0.0 as Float {
            let mut weight: Float = 1.0;
            if !sampled_specular {
                let light_pdf: Float = light.pdf_li(&iref, &wi);
                if light_pdf == 0.0 as Float {
                    return ld;
                }
                weight = power_heuristic(1, scattering_pdf, 1, light_pdf);
            }
            // see whether the sampled direction actually reaches this
            // light
            let ray: Ray = isect.spawn_ray(&wi);
            let mut li: Spectrum = Spectrum::default();
            if let Some(light_isect) = scene.intersect(&ray) {
                if let Some(prim_index) = light_isect.primitive {
                    if scene.primitive(prim_index).area_light == Some(light_index as u32) {
                        li = scene.le(&light_isect, &-wi);
                    }
                }
            } else if light.is_infinite() {
                li = light.le(&ray);
            }
            if !li.is_black() {
                ld += f * li * weight / scattering_pdf;
            }
        }
    }
    ld
}

/// Render the scene into `film` with a fixed worker pool pulling film
/// tiles from a work queue. Workers never block on each other; splats go
/// through per-pixel atomics and finished tiles are merged after the pool
/// drains. `cancel` is only checked at tile boundaries.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    film: &mut Film,
    sampler: &mut Sampler,
    integrator: &mut Integrator,
    num_threads: usize,
    cancel: &AtomicBool,
) {
    integrator.preprocess(scene, sampler);
    let spp = sampler.samples_per_pixel();
    let width = film.width;
    let height = film.height;
    let num_threads = if num_threads == 0 {
        num_cpus::get()
    } else {
        num_threads
    };
    log::info!(
        "rendering {}x{} at {} spp on {} threads",
        width,
        height,
        spp,
        num_threads
    );
    let queue = BlockQueue::new((width as u32, height as u32), TILE_SIZE);
    let (tx, rx) = crossbeam_channel::unbounded::<FilmTile>();
    let filter = film.filter;
    let mut tiles: Vec<FilmTile> = Vec::with_capacity(queue.len());
    {
        let film_ref: &Film = film;
        let integrator_ref: &Integrator = integrator;
        crossbeam::thread::scope(|scope| {
            for tid in 0..num_threads {
                let tx = tx.clone();
                let queue = &queue;
                let mut worker_sampler = sampler.clone_with_seed(tid as u64 + 1);
                scope.spawn(move |_| {
                    while let Some((x0, y0, x1, y1)) = queue.next() {
                        if cancel.load(Ordering::Relaxed) {
                            break;
                        }
                        let mut tile =
                            FilmTile::new(x0, y0, x1, y1, filter, width, height);
                        for y in y0..y1 {
                            for x in x0..x1 {
                                worker_sampler.start_pixel(Point2i {
                                    x: x as i32,
                                    y: y as i32,
                                });
                                for s in 0..spp {
                                    let ps = worker_sampler.start_sample(s);
                                    let jitter = worker_sampler.get_2d();
                                    let p_film = Point2f {
                                        x: x as Float + jitter.x,
                                        y: y as Float + jitter.y,
                                    };
                                    let camera_sample = CameraSample {
                                        p_film,
                                        p_lens: worker_sampler.get_2d(),
                                    };
                                    let ray = camera.generate_ray(&camera_sample);
                                    let l = integrator_ref.li(
                                        &ray,
                                        scene,
                                        &mut worker_sampler,
                                        &ps,
                                        camera,
                                        film_ref,
                                    );
                                    tile.add_sample(p_film, l);
                                }
                            }
                        }
                        if tx.send(tile).is_err() {
                            break;
                        }
                    }
                    stats::flush_thread_stats();
                });
            }
            drop(tx);
            for tile in rx.iter() {
                tiles.push(tile);
            }
        })
        .expect("render worker panicked");
    }
    for tile in tiles {
        film.merge_film_tile(tile);
    }
    stats::log_summary();
}
