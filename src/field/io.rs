//! Binary terrain file format.
//!
//! Layout: `i32` magic, `i32` width, `i32` height, then `width * height`
//! cells of `(hard, loose, erosion, moving_water)` as little-endian f32 in
//! row-major order. A wrong magic or mismatched dimensions is a hard
//! failure that leaves the target field untouched.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

use super::grid::{Cell, TerrainField};

/// Format version tag: `WASH` as little-endian bytes on disk.
pub const TERRAIN_MAGIC: i32 = 0x4853_4157;

/// Errors that can occur reading or writing a terrain file.
#[derive(Error, Debug)]
pub enum TerrainFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: i32, found: i32 },
    #[error("dimension mismatch: file is {file_width}x{file_height}, field is {field_width}x{field_height}")]
    DimensionMismatch {
        file_width: i32,
        file_height: i32,
        field_width: u32,
        field_height: u32,
    },
}

/// Writes the field to `path` in the binary terrain format.
pub fn save_field(field: &TerrainField, path: &Path) -> Result<(), TerrainFileError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(&TERRAIN_MAGIC.to_le_bytes())?;
    writer.write_all(&(field.width() as i32).to_le_bytes())?;
    writer.write_all(&(field.height() as i32).to_le_bytes())?;

    for cell in field.cells() {
        writer.write_all(&cell.hard.to_le_bytes())?;
        writer.write_all(&cell.loose.to_le_bytes())?;
        writer.write_all(&cell.erosion.to_le_bytes())?;
        writer.write_all(&cell.moving_water.to_le_bytes())?;
    }

    writer.flush()?;
    Ok(())
}

/// Loads a terrain file into `field`.
///
/// Fails without modifying the field if the magic is wrong, the stored
/// dimensions differ from the field's, or the payload is truncated. The
/// `erosion` and `moving_water` channels are read but zeroed: this
/// simulation variant rebuilds its transients from scratch.
pub fn load_field(field: &mut TerrainField, path: &Path) -> Result<(), TerrainFileError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let magic = read_i32(&mut reader)?;
    if magic != TERRAIN_MAGIC {
        return Err(TerrainFileError::BadMagic {
            expected: TERRAIN_MAGIC,
            found: magic,
        });
    }

    let file_width = read_i32(&mut reader)?;
    let file_height = read_i32(&mut reader)?;
    if file_width != field.width() as i32 || file_height != field.height() as i32 {
        return Err(TerrainFileError::DimensionMismatch {
            file_width,
            file_height,
            field_width: field.width(),
            field_height: field.height(),
        });
    }

    // Read the full payload into a scratch buffer first so a truncated
    // file cannot leave the field half-applied.
    let mut cells = Vec::with_capacity(field.cell_count());
    for _ in 0..field.cell_count() {
        let hard = read_f32(&mut reader)?;
        let loose = read_f32(&mut reader)?;
        let _erosion = read_f32(&mut reader)?;
        let _moving_water = read_f32(&mut reader)?;
        cells.push(Cell {
            hard,
            loose,
            ..Cell::default()
        });
    }

    field.cells_mut().copy_from_slice(&cells);
    Ok(())
}

fn read_i32<R: Read>(reader: &mut R) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f32<R: Read>(reader: &mut R) -> std::io::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Returns the expected file size in bytes for a field of the given
/// dimensions.
pub fn expected_file_size(width: u32, height: u32) -> u64 {
    12 + (width as u64) * (height as u64) * 16
}
