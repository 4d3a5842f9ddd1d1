use bevy_math::Vec3;
use std::{fs, path::Path};
use tracing::{debug, instrument};

use crate::{
    error::TerrainError,
    heightfield::{HeightField, validate_dimensions},
};

// ============================================================================
// Raw Height Map Import
// ============================================================================

// Headerless file of `width * length` u8 samples, row-major, with file row 0 at the maximum-Z edge.
#[instrument(skip(path, scale))]
pub fn import_raw(path: impl AsRef<Path>, width: usize, length: usize, scale: Vec3) -> Result<HeightField, TerrainError> {
    let path = path.as_ref();
    validate_dimensions(width, length)?;

    let bytes = fs::read(path).map_err(|source| TerrainError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let expected = width * length;
    if bytes.len() < expected {
        return Err(TerrainError::ShortFile {
            path: path.to_path_buf(),
            expected,
            actual: bytes.len(),
        });
    }
    if bytes.len() > expected {
        debug!(extra = bytes.len() - expected, "ignoring trailing bytes");
    }

    let field = from_raw_bytes(&bytes[..expected], width, length, scale)?;
    debug!(width, length, "imported height map");
    Ok(field)
}

// Converts file-ordered bytes into a grid-ordered height field by mirroring the rows.
pub fn from_raw_bytes(bytes: &[u8], width: usize, length: usize, scale: Vec3) -> Result<HeightField, TerrainError> {
    validate_dimensions(width, length)?;

    let expected = width * length;
    if bytes.len() != expected {
        return Err(TerrainError::SampleCount {
            expected,
            actual: bytes.len(),
        });
    }

    let samples = flip_rows(bytes, width);
    HeightField::new(width, length, scale, samples)
}

fn flip_rows(bytes: &[u8], width: usize) -> Vec<u8> {
    bytes.chunks_exact(width).rev().flatten().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn first_grid_row_is_last_file_row() {
        // Asymmetric 3x2 pattern: file row 0 is the max-Z edge.
        let bytes = [1, 2, 3, 7, 8, 9];
        let hf = from_raw_bytes(&bytes, 3, 2, Vec3::ONE).unwrap();
        assert_eq!(&hf.samples()[..3], &[7, 8, 9]);
        assert_eq!(&hf.samples()[3..], &[1, 2, 3]);
        assert_eq!(hf.sample(0, 0), 7);
        assert_eq!(hf.sample(2, 1), 3);
    }

    #[test]
    fn imports_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let bytes: Vec<u8> = (0..16).collect();
        file.write_all(&bytes).unwrap();

        let hf = import_raw(file.path(), 4, 4, Vec3::new(1.0, 0.5, 1.0)).unwrap();
        assert_eq!(hf.width(), 4);
        assert_eq!(hf.length(), 4);
        assert_eq!(&hf.samples()[..4], &[12, 13, 14, 15]);
        assert_eq!(&hf.samples()[12..], &[0, 1, 2, 3]);
    }

    #[test]
    fn short_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0; 10]).unwrap();

        let err = import_raw(file.path(), 4, 4, Vec3::ONE).unwrap_err();
        assert!(matches!(err, TerrainError::ShortFile { expected: 16, actual: 10, .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = import_raw("/definitely/not/here.raw", 4, 4, Vec3::ONE).unwrap_err();
        assert!(matches!(err, TerrainError::Io { .. }));
    }
}
