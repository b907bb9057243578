//! Tuning parameters for the simulation stages.
//!
//! Defaults are aesthetic knobs, not semantically load-bearing; they are
//! documented where they are used. Out-of-range values fail fast at
//! configuration time, never mid-tick.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::InitConfig;

/// Errors raised by configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
    #[error("{name} must be nonzero")]
    Zero { name: &'static str },
}

fn check_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            min,
            max,
            value,
        })
    }
}

/// Tuning for the per-particle hydraulic step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydraulicConfig {
    /// Cell crossings attempted per particle per sub-step.
    pub cells_per_run: u32,
    /// Fraction of last-frame velocity blended into the new direction.
    pub momentum: f32,
    /// Scale of the random turbulence vector blended into the direction.
    pub turbulence: f32,
    /// Fractional distance from a cell edge below which the position is
    /// nudged inward before the boundary query.
    pub edge_epsilon: f32,
    /// Low-pass blend factor for scalar speed.
    pub speed_blend: f32,
    /// Drag multiplier applied to instantaneous speed.
    pub drag: f32,
    /// Carrying capacity per unit speed.
    pub capacity_coefficient: f32,
    /// Low-pass blend factor for carrying capacity.
    pub capacity_blend: f32,
    /// Upper clamp on carrying capacity.
    pub max_capacity: f32,
    /// Minimum speed before a particle erodes at all.
    pub min_speed: f32,
    /// Erosion strength per squared speed excess over `min_speed`.
    pub erosion_coefficient: f32,
    /// Flat erosion bonus while the particle is younger than `young_age`.
    pub min_erosion: f32,
    /// Age below which the flat erosion bonus applies.
    pub young_age: u32,
    /// Fraction of the leftover erosion budget hard material yields.
    pub hard_erosion_factor: f32,
    /// Fraction of over-capacity sediment dropped per unit cross distance.
    pub drop_proportion: f32,
    /// Ticks a particle may survive with negligible carry before reset.
    pub max_age: u32,
    /// Carry below this counts as negligible for the age check.
    pub min_carry_to_survive: f32,
    /// Moving-water accumulated per unit cross distance.
    pub water_per_crossing: f32,
    /// Blend factor for the per-cell carrying visualization.
    pub carrying_blend: f32,
    /// Redistribution fraction for the inline collapse smoothing.
    pub collapse_amount: f32,
    /// Height difference tolerated before inline collapse pulls material.
    pub collapse_threshold: f32,
}

impl Default for HydraulicConfig {
    fn default() -> Self {
        Self {
            cells_per_run: 8,
            momentum: 0.0,
            turbulence: 0.0,
            edge_epsilon: 0.05,
            speed_blend: 0.35,
            drag: 0.95,
            capacity_coefficient: 1.0,
            capacity_blend: 0.25,
            max_capacity: 4.0,
            min_speed: 0.05,
            erosion_coefficient: 0.25,
            min_erosion: 0.02,
            young_age: 16,
            hard_erosion_factor: 0.15,
            drop_proportion: 0.5,
            max_age: 160,
            min_carry_to_survive: 0.01,
            water_per_crossing: 1.0,
            carrying_blend: 0.1,
            collapse_amount: 0.1,
            collapse_threshold: 1.0,
        }
    }
}

impl HydraulicConfig {
    /// Validates the parameter set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cells_per_run == 0 {
            return Err(ConfigError::Zero {
                name: "cells_per_run",
            });
        }
        check_range("momentum", self.momentum, 0.0, 1.0)?;
        check_range("turbulence", self.turbulence, 0.0, 1.0)?;
        check_range("edge_epsilon", self.edge_epsilon, 1e-4, 0.49)?;
        check_range("speed_blend", self.speed_blend, 0.0, 1.0)?;
        check_range("drag", self.drag, 0.0, 1.0)?;
        check_range("capacity_blend", self.capacity_blend, 0.0, 1.0)?;
        check_range("carrying_blend", self.carrying_blend, 0.0, 1.0)?;
        check_range("hard_erosion_factor", self.hard_erosion_factor, 0.0, 1.0)?;
        check_range("drop_proportion", self.drop_proportion, 0.0, 1.0)?;
        check_range("collapse_amount", self.collapse_amount, 0.0, 0.5)?;
        check_positive("max_capacity", self.max_capacity)?;
        check_positive("capacity_coefficient", self.capacity_coefficient)?;
        Ok(())
    }
}

/// One slump (thermal relaxation) pass parameter set.
///
/// The same shape serves the loose-material creep passes and the rarer
/// hard-material rockfall pass; they differ only in numbers and target
/// layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlumpConfig {
    /// Random cells sampled per invocation.
    pub iterations: u32,
    /// Height difference a neighbor pair must exceed before material
    /// creeps (scaled by sqrt(2) for diagonal pairs).
    pub threshold: f32,
    /// Fraction of the excess moved per sampled pair.
    pub amount: f32,
}

impl SlumpConfig {
    /// Validates the parameter set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("slump threshold", self.threshold)?;
        check_range("slump amount", self.amount, 0.0, 1.0)?;
        Ok(())
    }
}

/// Tuning for the cliff-collapse operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliffCollapseConfig {
    /// Random cells sampled per invocation.
    pub iterations: u32,
    /// Lower bound of the randomized collapse threshold.
    pub threshold_min: f32,
    /// Upper bound of the randomized collapse threshold.
    pub threshold_max: f32,
    /// Fraction of the excess moved per collapse.
    pub amount: f32,
    /// Maximum cascade rounds after the initial collapse.
    pub cascade_rounds: u32,
    /// Threshold multiplier per cascade round.
    pub cascade_threshold_decay: f32,
    /// Amount multiplier per cascade round.
    pub cascade_amount_growth: f32,
    /// Fraction of the remaining requirement hard material yields.
    pub hard_fraction: f32,
    /// Redistribution fraction for the post-cascade smoothing pass.
    pub smoothing_amount: f32,
}

impl Default for CliffCollapseConfig {
    fn default() -> Self {
        Self {
            iterations: 64,
            threshold_min: 3.0,
            threshold_max: 6.0,
            amount: 0.1,
            cascade_rounds: 8,
            cascade_threshold_decay: 0.9,
            cascade_amount_growth: 1.1,
            hard_fraction: 0.2,
            smoothing_amount: 0.1,
        }
    }
}

impl CliffCollapseConfig {
    /// Validates the parameter set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("cliff threshold_min", self.threshold_min)?;
        if self.threshold_max < self.threshold_min {
            return Err(ConfigError::OutOfRange {
                name: "cliff threshold_max",
                min: self.threshold_min,
                max: f32::INFINITY,
                value: self.threshold_max,
            });
        }
        check_range("cliff amount", self.amount, 0.0, 1.0)?;
        check_range("hard_fraction", self.hard_fraction, 0.0, 1.0)?;
        check_range(
            "cascade_threshold_decay",
            self.cascade_threshold_decay,
            0.1,
            1.0,
        )?;
        check_range("cascade_amount_growth", self.cascade_amount_growth, 1.0, 2.0)?;
        check_range("smoothing_amount", self.smoothing_amount, 0.0, 0.5)?;
        Ok(())
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Master random seed.
    pub seed: u64,
    /// Particle pool capacity.
    pub particles: usize,
    /// Hydraulic sub-steps per tick.
    pub water_iterations_per_frame: u32,
    /// Per-particle hydraulic tuning.
    pub hydraulic: HydraulicConfig,
    /// Aggressive loose-material slump run every tick.
    pub slump_common: SlumpConfig,
    /// Gentler, wider smoothing slump run every tick.
    pub slump_smoothing: SlumpConfig,
    /// Hard-material slump (rockfall), steeper threshold, fewer samples.
    pub collapse: SlumpConfig,
    /// Cliff-collapse tuning.
    pub cliff: CliffCollapseConfig,
    /// Per-tick multiplier on `moving_water`.
    pub water_decay: f32,
    /// Per-tick multiplier on the carrying visualization.
    pub carrying_decay: f32,
    /// Scale from `moving_water` to the water-augmented height nudge.
    pub water_height_factor: f32,
    /// Procedural initialization parameters.
    pub init: InitConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            seed: 42,
            particles: 4000,
            water_iterations_per_frame: 2,
            hydraulic: HydraulicConfig::default(),
            slump_common: SlumpConfig {
                iterations: 4000,
                threshold: 0.6,
                amount: 0.1,
            },
            slump_smoothing: SlumpConfig {
                iterations: 800,
                threshold: 0.2,
                amount: 0.03,
            },
            collapse: SlumpConfig {
                iterations: 250,
                threshold: 4.0,
                amount: 0.05,
            },
            cliff: CliffCollapseConfig::default(),
            water_decay: 0.92,
            carrying_decay: 0.85,
            water_height_factor: 0.25,
            init: InitConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Validates every parameter set, failing fast on the first error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::Zero { name: "width" });
        }
        if self.height == 0 {
            return Err(ConfigError::Zero { name: "height" });
        }
        if self.particles == 0 {
            return Err(ConfigError::Zero { name: "particles" });
        }
        self.hydraulic.validate()?;
        self.slump_common.validate()?;
        self.slump_smoothing.validate()?;
        self.collapse.validate()?;
        self.cliff.validate()?;
        check_range("water_decay", self.water_decay, 0.0, 1.0)?;
        check_range("carrying_decay", self.carrying_decay, 0.0, 1.0)?;
        check_range("water_height_factor", self.water_height_factor, 0.0, 10.0)?;
        Ok(())
    }

    /// Creates the default configuration with the given seed and size.
    pub fn with_seed(seed: u64, width: u32, height: u32) -> Self {
        Self {
            seed,
            width,
            height,
            init: InitConfig::with_seed(seed as i32),
            ..Default::default()
        }
    }
}
