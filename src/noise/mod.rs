//! Coherent noise generation for terrain initialization.

mod fractal;

pub use fractal::{sample_torus_noise, NoiseLayer, Shaping};
