use bevy_math::Vec3;

use crate::error::TerrainError;

// ============================================================================
// Height Field
// ============================================================================

/// Grid of 8-bit elevation samples in image space.
///
/// Row `z = 0` is the minimum-Z edge of the world. Heights returned by [`HeightField::height`] are
/// in raw sample units; the caller applies `scale.y`. Normals use grid units horizontally and
/// `scale.y` vertically.
#[derive(Debug, Clone)]
pub struct HeightField {
    width: usize,
    length: usize,
    scale: Vec3,
    samples: Vec<u8>,
}

impl HeightField {
    // ============================================================================
    // Constructors
    // ============================================================================

    // `samples` must already be in grid order (row 0 = minimum Z).
    pub fn new(width: usize, length: usize, scale: Vec3, samples: Vec<u8>) -> Result<Self, TerrainError> {
        validate_dimensions(width, length)?;
        validate_scale(scale)?;

        let expected = width * length;
        if samples.len() != expected {
            return Err(TerrainError::SampleCount {
                expected,
                actual: samples.len(),
            });
        }

        Ok(Self {
            width,
            length,
            scale,
            samples,
        })
    }

    pub fn flat(width: usize, length: usize, scale: Vec3, value: u8) -> Result<Self, TerrainError> {
        validate_dimensions(width, length)?;
        Self::new(width, length, scale, vec![value; width * length])
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    #[must_use]
    pub const fn scale(&self) -> Vec3 {
        self.scale
    }

    #[must_use]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    // Raw sample with indices clamped to the last row/column.
    #[must_use]
    pub fn sample(&self, x: usize, z: usize) -> u8 {
        let x = x.min(self.width - 1);
        let z = z.min(self.length - 1);
        self.samples[x + z * self.width]
    }

    // True when (x, z) lies in [0, width) x [0, length). NaN is never inside.
    #[must_use]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= 0.0 && z >= 0.0 && x < self.width as f32 && z < self.length as f32
    }

    // ============================================================================
    // Queries
    // ============================================================================

    /// Bilinear height at a fractional grid coordinate, in raw sample units.
    ///
    /// Returns `0.0` outside the grid.
    #[must_use]
    pub fn height(&self, x: f32, z: f32) -> f32 {
        if !self.contains(x, z) {
            return 0.0;
        }

        let ix = x.floor();
        let iz = z.floor();
        let fx = x - ix;
        let fz = z - iz;
        let ix = ix as usize;
        let iz = iz as usize;

        let left_top = f32::from(self.sample(ix, iz + 1));
        let right_top = f32::from(self.sample(ix + 1, iz + 1));
        let left_bottom = f32::from(self.sample(ix, iz));
        let right_bottom = f32::from(self.sample(ix + 1, iz));

        let top = left_top.mul_add(1.0 - fx, right_top * fx);
        let bottom = left_bottom.mul_add(1.0 - fx, right_bottom * fx);
        bottom.mul_add(1.0 - fz, top * fz)
    }

    /// Surface normal of the tangent plane through the cell's sample and its +X / +Z neighbours.
    ///
    /// The last column and row use the -1 neighbour instead, so boundary normals are one-sided.
    /// Returns world up outside the grid.
    #[must_use]
    pub fn normal(&self, x: i32, z: i32) -> Vec3 {
        if x < 0 || z < 0 {
            return Vec3::Y;
        }
        let (x, z) = (x as usize, z as usize);
        if x >= self.width || z >= self.length {
            return Vec3::Y;
        }

        let next_x = if x + 1 < self.width { x + 1 } else { x - 1 };
        let next_z = if z + 1 < self.length { z + 1 } else { z - 1 };

        let p1 = self.grid_point(x, z);
        let p2 = self.grid_point(next_x, z);
        let p3 = self.grid_point(x, next_z);

        let normal = (p3 - p1).cross(p2 - p1);
        // A backward neighbour flips the winding; keep the normal on the upper side.
        let normal = if normal.y < 0.0 { -normal } else { normal };
        normal.try_normalize().unwrap_or(Vec3::Y)
    }

    // Horizontal axes stay in grid units; only the height is scaled.
    fn grid_point(&self, x: usize, z: usize) -> Vec3 {
        Vec3::new(x as f32, f32::from(self.sample(x, z)) * self.scale.y, z as f32)
    }
}

// ============================================================================
// Validation Helpers
// ============================================================================

pub(crate) fn validate_dimensions(width: usize, length: usize) -> Result<(), TerrainError> {
    if width < 2 || length < 2 {
        return Err(TerrainError::InvalidDimensions { width, length });
    }
    Ok(())
}

pub(crate) fn validate_scale(scale: Vec3) -> Result<(), TerrainError> {
    if !scale.is_finite() || scale.x == 0.0 || scale.z == 0.0 {
        return Err(TerrainError::InvalidScale(scale.to_array()));
    }
    Ok(())
}
