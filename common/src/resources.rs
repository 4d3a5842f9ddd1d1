#[allow(clippy::wildcard_imports)]
use bevy_ecs::prelude::*;

use crate::terrain::Terrain;

// ============================================================================
// Terrains
// ============================================================================

// Every terrain in the scene. Footprints are not expected to overlap; the first match wins.
#[derive(Resource, Debug, Default)]
pub struct Terrains(pub Vec<Terrain>);

impl Terrains {
    // Index of the terrain whose footprint contains (x, z).
    #[must_use]
    pub fn find(&self, x: f32, z: f32) -> Option<usize> {
        self.0.iter().position(|terrain| terrain.contains(x, z))
    }

    #[must_use]
    pub fn get(&self, index: Option<usize>) -> Option<&Terrain> {
        index.and_then(|index| self.0.get(index))
    }
}

// ============================================================================
// Input
// ============================================================================

/// Input state for the local player, sampled once per tick.
///
/// `throttle` and `strafe` are in [-1, 1]; rotations are in radians for this tick.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PlayerInput {
    pub throttle: f32,
    pub strafe: f32,
    pub climb: f32,
    pub yaw_delta: f32,
    pub pitch_delta: f32,
    pub fire: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gpu::{ShaderHandle, TextureHandle},
        heightfield::HeightField,
    };
    use bevy_math::Vec3;

    fn terrain_at(x: f32, z: f32) -> Terrain {
        let field = HeightField::flat(5, 5, Vec3::ONE, 0).unwrap();
        let mut terrain = Terrain::new(field, 4, 4, ShaderHandle(0), TextureHandle(0)).unwrap();
        terrain.set_position(Vec3::new(x, 0.0, z));
        terrain
    }

    #[test]
    fn find_scans_footprints_in_order() {
        let terrains = Terrains(vec![terrain_at(0.0, 0.0), terrain_at(10.0, 0.0)]);
        assert_eq!(terrains.find(2.0, 2.0), Some(0));
        assert_eq!(terrains.find(12.0, 1.0), Some(1));
        assert_eq!(terrains.find(7.5, 1.0), None);
        // Shared edges resolve to the earlier terrain.
        assert_eq!(terrains.find(5.0, 1.0), Some(0));
    }
}
