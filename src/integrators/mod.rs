//! Light-transport integrators. All of them implement
//! `li(ray, ...) -> Spectrum`; the bidirectional family additionally
//! splats contributions straight onto the film.

pub mod ao;
pub mod bdpt;
pub mod direct;
pub mod instantradiosity;
pub mod lighttracer;
pub mod path;
pub mod whitted;
