//! Procedural field initialization from layered fractal noise.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::grid::TerrainField;
use crate::noise::{sample_torus_noise, NoiseLayer};

/// Configuration for procedural initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    /// Noise seed.
    pub seed: i32,
    /// Noise layers summed into the bedrock, each with its own shaping.
    pub layers: Vec<NoiseLayer>,
    /// Vertical scale applied to the summed noise, in height units.
    pub relief: f32,
    /// Constant blanket of loose material laid over the bedrock.
    pub loose_blanket: f32,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            layers: vec![NoiseLayer::ridged_mountains(), NoiseLayer::billowed_hills()],
            relief: 24.0,
            loose_blanket: 0.3,
        }
    }
}

impl InitConfig {
    /// Creates the default layer stack with the given seed.
    pub fn with_seed(seed: i32) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }
}

/// Fills the field's bedrock from layered fractal noise, lays down the
/// loose blanket, and normalizes the base level to zero.
///
/// Per-cell sampling is embarrassingly parallel and runs across rayon's
/// thread pool; each cell's output depends only on its own coordinates.
pub fn initialize(field: &mut TerrainField, config: &InitConfig) {
    let width = field.width();
    let height = field.height();
    let layers = &config.layers;
    let seed = config.seed;
    let relief = config.relief;
    let loose = config.loose_blanket;

    field.cells_mut().par_iter_mut().enumerate().for_each(|(i, cell)| {
        let x = (i as u32) % width;
        let y = (i as u32) / width;
        let u = (x as f32 + 0.5) / width as f32;
        let v = (y as f32 + 0.5) / height as f32;

        let mut sum = 0.0f32;
        for (li, layer) in layers.iter().enumerate() {
            let layer_seed = seed.wrapping_add(li as i32 * 7919);
            sum += sample_torus_noise(u, v, layer, layer_seed);
        }

        cell.hard = sum * relief;
        cell.loose = loose;
        cell.erosion = 0.0;
        cell.moving_water = 0.0;
        cell.carrying = 0.0;
    });

    set_base_level(field);
}

/// Shifts the field so the minimum total height is exactly zero.
///
/// The shift is taken from `hard` first and spills into `loose` where
/// `hard` runs out, so the lowest cell bottoms out at zero even under a
/// uniform loose blanket. A negative minimum (noise layers can produce
/// negative values) raises `hard` instead.
pub fn set_base_level(field: &mut TerrainField) {
    let min = field.min_height();
    field.cells_mut().par_iter_mut().for_each(|cell| {
        let from_hard = cell.hard.min(min);
        cell.hard -= from_hard;
        cell.loose = (cell.loose - (min - from_hard)).max(0.0);
    });
}
