//! Stylized terrain-erosion simulation.
//!
//! This crate simulates hydraulic and thermal erosion on a toroidal
//! height field: mobile water particles carve and deposit sediment while
//! randomized relaxation operators keep slopes and cliffs plausible.

pub mod erosion;
pub mod export;
pub mod field;
pub mod geometry;
pub mod noise;
pub mod particle;
pub mod sim;

pub use erosion::{CliffCollapseConfig, HydraulicConfig, SimulationConfig, SlumpConfig};
pub use field::{Cell, TerrainField, TerrainFileError};
pub use particle::{ErosionParticle, ParticlePool};
pub use sim::TerrainSim;
