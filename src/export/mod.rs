//! Heightmap export to common interchange formats.

mod png;
mod raw;

pub use png::{export_heightmap_png, export_wetness_png, PngExportError, PngExportOptions};
pub use raw::{expected_raw_size, export_heightmap_raw, RawExportError, RawFormat};
