use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Terrain Construction Errors
// ============================================================================

// Raised only while building a terrain. Queries never fail; they fall back to sentinel values.
#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("failed to read height map {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("height map {path:?} holds {actual} bytes, expected at least {expected}")]
    ShortFile {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("height field must be at least 2x2 samples, got {width}x{length}")]
    InvalidDimensions { width: usize, length: usize },

    #[error("sample buffer holds {actual} values, expected {expected}")]
    SampleCount { expected: usize, actual: usize },

    #[error("block size {block_width}x{block_length} must be a positive multiple of 4 on both axes")]
    BlockNotDivisible { block_width: usize, block_length: usize },

    #[error("block size {block_width}x{block_length} does not fit a {width}x{length} height field")]
    BlockTooLarge {
        block_width: usize,
        block_length: usize,
        width: usize,
        length: usize,
    },

    #[error("scale components must be finite and x/z must be non-zero, got {0:?}")]
    InvalidScale([f32; 3]),
}
