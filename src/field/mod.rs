//! Toroidal terrain field: storage, initialization, and binary I/O.

mod grid;
mod init;
mod io;

pub use grid::{Cell, TerrainField, NEIGHBOR_OFFSETS, ORTHO_OFFSETS};
pub use init::{initialize, set_base_level, InitConfig};
pub use io::{expected_file_size, load_field, save_field, TerrainFileError, TERRAIN_MAGIC};
