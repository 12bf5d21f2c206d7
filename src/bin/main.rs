//! Command-line renderer: load a scene stream, render it, write the HDR
//! image. `--unittest` runs the embedded property suite instead.

// std
use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;
// others
use structopt::StructOpt;
// spica
use spica::core::base::Float;
use spica::core::integrator::render;
use spica::core::loader::load_scene;
use spica::core::stats;
use spica::selftest;

#[derive(Debug, StructOpt)]
#[structopt(name = "spica", about = "physically based offline renderer")]
struct Opt {
    /// Scene stream to render.
    #[structopt(short = "i", long = "scene", parse(from_os_str))]
    scene: Option<PathBuf>,
    /// Output image path.
    #[structopt(
        short = "o",
        long = "output",
        parse(from_os_str),
        default_value = "output.hdr"
    )]
    output: PathBuf,
    /// Worker threads; 0 uses every core.
    #[structopt(short = "t", long = "threads", default_value = "0")]
    threads: usize,
    /// Run the embedded property tests and exit.
    #[structopt(long = "unittest")]
    unittest: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::from_args();
    if opt.unittest {
        let failures = selftest::run_all();
        if failures > 0 {
            log::error!("{} selftest check(s) failed", failures);
            process::exit(1);
        }
        log::info!("all selftest checks passed");
        return;
    }
    let scene_path = match opt.scene {
        Some(path) => path,
        None => {
            log::error!("no scene given; use --scene <path> (or --unittest)");
            process::exit(2);
        }
    };
    let mut setup = match load_scene(&scene_path) {
        Ok(setup) => setup,
        Err(err) => {
            log::error!("failed to load {:?}: {}", scene_path, err);
            process::exit(2);
        }
    };
    let cancel = AtomicBool::new(false);
    render(
        &setup.scene,
        &setup.camera,
        &mut setup.film,
        &mut setup.sampler,
        &mut setup.integrator,
        opt.threads,
        &cancel,
    );
    let splat_scale: Float = 1.0 as Float / setup.sampler.samples_per_pixel() as Float;
    if let Err(err) = setup.film.write_image(&opt.output, splat_scale) {
        log::error!("failed to write {:?}: {}", opt.output, err);
        process::exit(3);
    }
    let s = stats::global_summary();
    log::info!("done ({} rays)", s.rays + s.shadow_rays);
}
