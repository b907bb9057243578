//! Toroidal grid storage and wraparound indexing.

use serde::{Deserialize, Serialize};

/// The four orthogonal neighbor offsets.
pub const ORTHO_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// All eight neighbor offsets, orthogonals first.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// One grid cell's material layers and transient accumulators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Bedrock amount. Dense, slow to erode.
    pub hard: f32,
    /// Loose sediment. Fast to erode and deposit.
    pub loose: f32,
    /// Cumulative disturbance, for visualization only.
    pub erosion: f32,
    /// How much water recently crossed this cell; decayed each tick.
    pub moving_water: f32,
    /// Low-passed sediment-in-transit, for visualization only.
    pub carrying: f32,
}

impl Cell {
    /// Total terrain height: bedrock plus loose sediment.
    pub fn height(&self) -> f32 {
        self.hard + self.loose
    }
}

/// Toroidal 2D grid of terrain cells, stored row-major.
///
/// Both axes wrap, so neighbor queries always succeed and the terrain has
/// no edges. Dimensions are arbitrary positive integers; wraparound uses
/// `rem_euclid`, not bit masking, so non-power-of-two sizes and negative
/// coordinates are handled correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainField {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    /// Scale from `moving_water` to the water-augmented height nudge.
    pub water_height_factor: f32,
}

impl TerrainField {
    /// Creates a field of the given dimensions with all cells zeroed.
    ///
    /// # Panics
    /// Panics if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "field dimensions must be positive");
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::default(); size],
            water_height_factor: 0.25,
        }
    }

    /// Grid width in cells.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Maps `(x, y)` onto the torus and returns the flat index.
    ///
    /// Any integer coordinates are valid, including negative and far
    /// out-of-range values.
    pub fn index(&self, x: i32, y: i32) -> usize {
        let xw = x.rem_euclid(self.width as i32) as usize;
        let yw = y.rem_euclid(self.height as i32) as usize;
        yw * self.width as usize + xw
    }

    /// Returns the cell at wrapped `(x, y)`.
    pub fn cell(&self, x: i32, y: i32) -> &Cell {
        let i = self.index(x, y);
        &self.cells[i]
    }

    /// Returns the cell at wrapped `(x, y)` mutably.
    pub fn cell_mut(&mut self, x: i32, y: i32) -> &mut Cell {
        let i = self.index(x, y);
        &mut self.cells[i]
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// All cells, row-major, mutable.
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Total terrain height at wrapped `(x, y)`.
    pub fn height_at(&self, x: i32, y: i32) -> f32 {
        self.cell(x, y).height()
    }

    /// Water-augmented height at wrapped `(x, y)`.
    ///
    /// Used for flow direction so particles are nudged away from cells
    /// where water has recently pooled.
    pub fn wheight_at(&self, x: i32, y: i32) -> f32 {
        let c = self.cell(x, y);
        c.height() + c.moving_water * self.water_height_factor
    }

    /// Resets every cell to a constant bedrock height with no loose
    /// material or water.
    pub fn clear(&mut self, value: f32) {
        for c in &mut self.cells {
            *c = Cell {
                hard: value,
                ..Cell::default()
            };
        }
    }

    /// Decays the transient water and carrying accumulators so visualized
    /// wetness fades without a persistent water-depth simulation.
    pub fn decay_water(&mut self, water_decay: f32, carrying_decay: f32) {
        for c in &mut self.cells {
            c.moving_water *= water_decay;
            c.carrying *= carrying_decay;
        }
    }

    /// Clamps both material layers to be non-negative.
    ///
    /// Compounding float operations across operators in a tick can leave
    /// tiny negative dust; this is applied once at the end of every tick.
    pub fn clamp_layers(&mut self) {
        for c in &mut self.cells {
            c.hard = c.hard.max(0.0);
            c.loose = c.loose.max(0.0);
        }
    }

    /// Flattened row-major total heights, for texture or mesh upload.
    pub fn height_field(&self) -> Vec<f32> {
        self.cells.iter().map(Cell::height).collect()
    }

    /// Flattened row-major moving-water values.
    pub fn wetness_field(&self) -> Vec<f32> {
        self.cells.iter().map(|c| c.moving_water).collect()
    }

    /// Minimum total height over the field.
    pub fn min_height(&self) -> f32 {
        self.cells.iter().map(Cell::height).fold(f32::MAX, f32::min)
    }

    /// Maximum total height over the field.
    pub fn max_height(&self) -> f32 {
        self.cells.iter().map(Cell::height).fold(f32::MIN, f32::max)
    }

    /// Sum of `hard + loose` over the whole field, accumulated in f64.
    pub fn total_material(&self) -> f64 {
        self.cells.iter().map(|c| c.height() as f64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_wraps_negative_and_out_of_range() {
        let field = TerrainField::new(7, 5);

        for &(x, y) in &[(0, 0), (3, 2), (6, 4), (-1, -1), (13, 9), (-20, 17)] {
            for k in -3i32..=3 {
                for m in -3i32..=3 {
                    assert_eq!(
                        field.index(x, y),
                        field.index(x + k * 7, y + m * 5),
                        "index({}, {}) should equal index({}, {})",
                        x,
                        y,
                        x + k * 7,
                        y + m * 5
                    );
                }
            }
        }
    }

    #[test]
    fn test_index_row_major() {
        let field = TerrainField::new(4, 3);
        assert_eq!(field.index(0, 0), 0);
        assert_eq!(field.index(3, 0), 3);
        assert_eq!(field.index(0, 1), 4);
        assert_eq!(field.index(2, 2), 10);
    }

    #[test]
    fn test_non_power_of_two_dimensions() {
        let field = TerrainField::new(13, 11);
        assert_eq!(field.index(-1, 0), 12);
        assert_eq!(field.index(13, 0), 0);
        assert_eq!(field.index(0, -1), 130);
    }

    #[test]
    fn test_derived_heights() {
        let mut field = TerrainField::new(4, 4);
        let c = field.cell_mut(1, 1);
        c.hard = 3.0;
        c.loose = 0.5;
        c.moving_water = 2.0;

        assert_eq!(field.height_at(1, 1), 3.5);
        assert_eq!(field.wheight_at(1, 1), 3.5 + 2.0 * field.water_height_factor);
        // Wrapped access hits the same cell.
        assert_eq!(field.height_at(5, -3), 3.5);
    }

    #[test]
    fn test_clear() {
        let mut field = TerrainField::new(3, 3);
        field.cell_mut(0, 0).loose = 4.0;
        field.cell_mut(2, 2).moving_water = 1.0;

        field.clear(10.0);
        for c in field.cells() {
            assert_eq!(c.hard, 10.0);
            assert_eq!(c.loose, 0.0);
            assert_eq!(c.moving_water, 0.0);
        }
        assert_eq!(field.min_height(), 10.0);
        assert_eq!(field.max_height(), 10.0);
    }

    #[test]
    fn test_decay_water() {
        let mut field = TerrainField::new(2, 2);
        field.cell_mut(0, 0).moving_water = 1.0;
        field.cell_mut(0, 0).carrying = 1.0;

        field.decay_water(0.5, 0.25);
        assert_eq!(field.cell(0, 0).moving_water, 0.5);
        assert_eq!(field.cell(0, 0).carrying, 0.25);
    }

    #[test]
    fn test_clamp_layers() {
        let mut field = TerrainField::new(2, 2);
        field.cell_mut(0, 0).loose = -1e-5;
        field.cell_mut(1, 1).hard = -0.5;

        field.clamp_layers();
        assert_eq!(field.cell(0, 0).loose, 0.0);
        assert_eq!(field.cell(1, 1).hard, 0.0);
    }

    #[test]
    fn test_height_field_flattening() {
        let mut field = TerrainField::new(3, 2);
        field.cell_mut(2, 1).hard = 7.0;

        let flat = field.height_field();
        assert_eq!(flat.len(), 6);
        assert_eq!(flat[5], 7.0);
    }
}
