//! Ray / unit-cell boundary intersection.
//!
//! Operates in the particle's local cell frame: each grid cell is the unit
//! square `[cx, cx+1) x [cy, cy+1)` in continuous cell-space.

use glam::Vec2;

/// Direction components smaller than this are treated as zero.
const DIR_EPSILON: f32 = 1e-6;

/// How far past the boundary the exit position is pushed, so that
/// `floor()` of the result lands in the next cell.
const BOUNDARY_PUSH: f32 = 1e-4;

/// Where a ray leaves its current cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellExit {
    /// Position just past the crossed boundary (unwrapped cell-space).
    pub position: Vec2,
    /// Unwrapped x coordinate of the cell entered.
    pub cell_x: i32,
    /// Unwrapped y coordinate of the cell entered.
    pub cell_y: i32,
}

/// Computes where the ray from `position` along `direction` exits cell
/// `(cell_x, cell_y)`, and which neighboring cell it enters.
///
/// `direction` need not be normalized but must be nonzero for a useful
/// answer. If it is degenerate (both components near zero) the returned
/// cell equals the input cell; callers treat that as a failed step.
///
/// Corner crossings step diagonally: when the ray exits exactly through a
/// corner, both cell coordinates advance.
pub fn intersect_cell_boundary(
    position: Vec2,
    direction: Vec2,
    cell_x: i32,
    cell_y: i32,
) -> CellExit {
    let local = position - Vec2::new(cell_x as f32, cell_y as f32);

    let tx = if direction.x > DIR_EPSILON {
        (1.0 - local.x) / direction.x
    } else if direction.x < -DIR_EPSILON {
        -local.x / direction.x
    } else {
        f32::INFINITY
    };

    let ty = if direction.y > DIR_EPSILON {
        (1.0 - local.y) / direction.y
    } else if direction.y < -DIR_EPSILON {
        -local.y / direction.y
    } else {
        f32::INFINITY
    };

    if !tx.is_finite() && !ty.is_finite() {
        return CellExit {
            position,
            cell_x,
            cell_y,
        };
    }

    let t = tx.min(ty).max(0.0);
    let mut next_x = cell_x;
    let mut next_y = cell_y;
    if tx <= ty {
        next_x += if direction.x > 0.0 { 1 } else { -1 };
    }
    if ty <= tx {
        next_y += if direction.y > 0.0 { 1 } else { -1 };
    }

    CellExit {
        position: position + direction * (t + BOUNDARY_PUSH),
        cell_x: next_x,
        cell_y: next_y,
    }
}
