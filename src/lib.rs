//! **spica** is an offline, physically based Monte Carlo ray tracer. The
//! crate contains the rendering core: geometric kernel, BxDF library, wide
//! (4/8-ary) bounding volume hierarchy, low-discrepancy samplers, and a
//! family of light-transport integrators. Scene description comes in
//! through a versioned binary stream; radiance goes out as a linear HDR
//! image.

#[macro_use]
extern crate impl_ops;
#[macro_use]
extern crate lazy_static;

pub mod accelerators;
pub mod blockqueue;
pub mod cameras;
pub mod core;
pub mod filters;
pub mod integrators;
pub mod lights;
pub mod materials;
pub mod samplers;
pub mod selftest;
pub mod shapes;
