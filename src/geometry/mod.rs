//! Pure geometric helpers for particle trajectories.

mod ray;

pub use ray::{intersect_cell_boundary, CellExit};
