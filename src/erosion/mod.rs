//! Erosion operators: the per-particle hydraulic step and the
//! diffusion-style relaxation passes that keep the terrain plausible.

mod cliff;
mod config;
mod hydraulic;
mod slump;

pub use cliff::cliff_collapse;
pub use config::{
    CliffCollapseConfig, ConfigError, HydraulicConfig, SimulationConfig, SlumpConfig,
};
pub use hydraulic::hydraulic_pass;
pub use slump::{
    apply_deltas, collapse_from, collapse_to, compute_slump_deltas, slump, SlumpMaterial,
};
