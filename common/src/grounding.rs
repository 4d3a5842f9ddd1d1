use bevy_math::{Quat, Vec3};

use crate::terrain::Terrain;

// ============================================================================
// Ground Following
// ============================================================================

// Normals closer to world up than this are treated as flat ground.
const FLAT_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightSource {
    // Bilinear sample of the height field.
    Bilinear,
    // Quartic patch of the containing block, matching the tessellated surface.
    Smoothed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroundPolicy {
    // Always sit at `height + offset`.
    Snap { offset: f32 },
    // Only lift the entity when it drops below `height + clearance`.
    Clearance { clearance: f32 },
}

// Result of one ground-follow step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundFollow {
    pub position: Vec3,
    pub normal: Vec3,
    pub look: Vec3,
}

#[must_use]
pub fn ground_height(terrain: &Terrain, x: f32, z: f32, source: HeightSource) -> f32 {
    match source {
        HeightSource::Bilinear => terrain.height(x, z),
        HeightSource::Smoothed => terrain.smoothed_height(x, z),
    }
}

/// Clamps `position` onto `terrain` and tilts `forward` to follow the local slope.
///
/// Shared by every entity that stays attached to the ground; the policy decides how the vertical
/// position is adjusted.
#[must_use]
pub fn ground_follow(
    terrain: &Terrain,
    position: Vec3,
    forward: Vec3,
    policy: GroundPolicy,
    source: HeightSource,
) -> GroundFollow {
    let height = ground_height(terrain, position.x, position.z, source);
    let y = match policy {
        GroundPolicy::Snap { offset } => height + offset,
        GroundPolicy::Clearance { clearance } => position.y.max(height + clearance),
    };

    let normal = terrain.normal(position.x, position.z);
    GroundFollow {
        position: Vec3::new(position.x, y, position.z),
        normal,
        look: align_to_normal(forward, normal),
    }
}

// Rotation taking world up onto `normal`, about cross(up, normal).
#[must_use]
pub fn slope_rotation(normal: Vec3) -> Quat {
    if normal.abs_diff_eq(Vec3::Y, FLAT_EPSILON) {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(Vec3::Y, normal.normalize())
}

#[must_use]
pub fn align_to_normal(forward: Vec3, normal: Vec3) -> Vec3 {
    if normal.abs_diff_eq(Vec3::Y, FLAT_EPSILON) {
        return forward;
    }
    slope_rotation(normal) * forward
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gpu::{ShaderHandle, TextureHandle},
        heightfield::HeightField,
    };

    const EPS: f32 = 1e-4;

    fn terrain(samples: Vec<u8>, size: usize) -> Terrain {
        let field = HeightField::new(size, size, Vec3::ONE, samples).unwrap();
        Terrain::new(field, 4, 4, ShaderHandle(0), TextureHandle(0)).unwrap()
    }

    #[test]
    fn flat_ground_applies_no_rotation() {
        let terrain = terrain(vec![128; 25], 5);
        let forward = Vec3::new(0.6, 0.0, 0.8);
        let result = ground_follow(
            &terrain,
            Vec3::new(2.0, 50.0, 2.0),
            forward,
            GroundPolicy::Snap { offset: 0.0 },
            HeightSource::Bilinear,
        );
        assert_eq!(result.look, forward);
        assert!((result.position.y - 128.0).abs() < EPS);
        assert!((result.normal - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn clearance_only_lifts() {
        let terrain = terrain(vec![10; 25], 5);
        let policy = GroundPolicy::Clearance { clearance: 0.5 };

        let below = ground_follow(&terrain, Vec3::new(1.0, 3.0, 1.0), Vec3::Z, policy, HeightSource::Bilinear);
        assert!((below.position.y - 10.5).abs() < EPS);

        let above = ground_follow(&terrain, Vec3::new(1.0, 40.0, 1.0), Vec3::Z, policy, HeightSource::Bilinear);
        assert!((above.position.y - 40.0).abs() < EPS);
    }

    #[test]
    fn slope_tilts_forward_vector_uphill() {
        // Rises along +X by 1 unit per sample.
        let samples = (0..5).flat_map(|_| (0..5).map(|x| x as u8)).collect();
        let terrain = terrain(samples, 5);
        let result = ground_follow(
            &terrain,
            Vec3::new(1.5, 0.0, 1.5),
            Vec3::X,
            GroundPolicy::Snap { offset: 0.0 },
            HeightSource::Bilinear,
        );

        // 45 degree slope: facing +X now points up the hill.
        assert!(result.normal.x < 0.0);
        assert!((result.look - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < EPS);
        assert!(result.look.dot(result.normal).abs() < EPS);
    }

    #[test]
    fn rotation_maps_up_onto_normal() {
        let normal = Vec3::new(0.3, 0.9, -0.2).normalize();
        assert!((slope_rotation(normal) * Vec3::Y - normal).length() < EPS);
        assert_eq!(slope_rotation(Vec3::Y), Quat::IDENTITY);
    }
}
