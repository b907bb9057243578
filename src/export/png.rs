//! PNG export functionality for heightmaps.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Luma};
use thiserror::Error;

use crate::field::TerrainField;

/// Errors that can occur during PNG export.
#[derive(Error, Debug)]
pub enum PngExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid height range: min ({0}) >= max ({1})")]
    InvalidHeightRange(f32, f32),
}

/// Options for PNG export.
#[derive(Debug, Clone)]
pub struct PngExportOptions {
    /// Minimum height value for normalization.
    pub min_height: f32,
    /// Maximum height value for normalization.
    pub max_height: f32,
    /// PNG compression type.
    pub compression: CompressionType,
    /// PNG filter type.
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            min_height: 0.0,
            max_height: 1.0,
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

impl PngExportOptions {
    /// Creates options with the height range taken from the field.
    pub fn auto_range(field: &TerrainField) -> Self {
        Self {
            min_height: field.min_height(),
            max_height: field.max_height(),
            ..Default::default()
        }
    }
}

fn write_l16(
    width: u32,
    height: u32,
    data: &[f32],
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), PngExportError> {
    let min = options.min_height;
    let max = options.max_height;
    if min >= max {
        return Err(PngExportError::InvalidHeightRange(min, max));
    }
    let range = max - min;

    let mut img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = data[(y * width + x) as usize];
            let normalized = ((v - min) / range).clamp(0.0, 1.0);
            let value = (normalized * 65535.0) as u16;
            img.put_pixel(x, y, Luma([value]));
        }
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);
    let byte_slice: &[u8] = bytemuck::cast_slice(img.as_raw());
    encoder.write_image(byte_slice, width, height, image::ExtendedColorType::L16)?;
    Ok(())
}

/// Exports the field's total heights as a 16-bit grayscale PNG.
pub fn export_heightmap_png(
    field: &TerrainField,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), PngExportError> {
    write_l16(
        field.width(),
        field.height(),
        &field.height_field(),
        path,
        options,
    )
}

/// Exports the field's moving-water accumulator as a 16-bit grayscale
/// PNG, normalized by the options' height range.
pub fn export_wetness_png(
    field: &TerrainField,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), PngExportError> {
    write_l16(
        field.width(),
        field.height(),
        &field.wetness_field(),
        path,
        options,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{initialize, InitConfig};
    use tempfile::tempdir;

    #[test]
    fn test_export_heightmap_png() {
        let mut field = TerrainField::new(48, 32);
        initialize(&mut field, &InitConfig::with_seed(6));

        let dir = tempdir().unwrap();
        let path = dir.path().join("height.png");
        let options = PngExportOptions::auto_range(&field);
        export_heightmap_png(&field, &path, &options).unwrap();

        assert!(path.exists());
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_invalid_height_range() {
        let field = TerrainField::new(16, 16);
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.png");

        let options = PngExportOptions {
            min_height: 1.0,
            max_height: -1.0,
            ..Default::default()
        };
        assert!(export_heightmap_png(&field, &path, &options).is_err());
    }

    #[test]
    fn test_auto_range_tracks_field() {
        let mut field = TerrainField::new(8, 8);
        field.cell_mut(0, 0).hard = 3.0;
        field.cell_mut(7, 7).hard = 17.0;

        let options = PngExportOptions::auto_range(&field);
        assert_eq!(options.min_height, 0.0);
        assert_eq!(options.max_height, 17.0);
    }
}
