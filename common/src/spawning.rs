use bevy_ecs::prelude::*;
use bevy_math::Vec3;

use crate::{
    components::{Billboard, BillboardBasis, Bullet, FollowCamera, GroundedOn, Orientation, Player, Position, Velocity},
    config::SceneConfig,
    constants::BULLET_SPAWN_HEIGHT,
};

// ============================================================================
// Entity Bundles
// ============================================================================

#[must_use]
pub fn player_bundle(config: &SceneConfig, position: Vec3) -> (Player, Position, Velocity, Orientation, GroundedOn) {
    let player = Player {
        max_speed: config.player.max_speed,
        friction: config.player.friction,
        acceleration: config.player.acceleration,
    };
    (
        player,
        Position(position),
        Velocity::default(),
        Orientation::default(),
        GroundedOn::default(),
    )
}

#[must_use]
pub fn camera_bundle(config: &SceneConfig, target: Entity, target_position: Vec3) -> (FollowCamera, Position) {
    let camera = FollowCamera::new(
        target,
        Vec3::from_array(config.camera.offset),
        config.camera.distance,
        config.camera.delay,
    );
    let eye = target_position + camera.offset * camera.distance;
    (camera, Position(eye))
}

// Bullet leaving a shooter at `shooter` along `look`.
#[must_use]
pub fn bullet_bundle(config: &SceneConfig, shooter: Vec3, look: Vec3) -> (Bullet, Position) {
    let origin = shooter + Vec3::new(0.0, BULLET_SPAWN_HEIGHT, 0.0);
    let bullet = Bullet::new(
        origin,
        look,
        config.bullet.speed,
        config.bullet.max_range,
    );
    (bullet, Position(origin))
}

#[must_use]
pub fn explosion_bundle(position: Vec3, check_terrain: bool) -> (Billboard, BillboardBasis, Position, GroundedOn) {
    (
        Billboard::explosion(check_terrain),
        BillboardBasis::default(),
        Position(position),
        GroundedOn::default(),
    )
}

// ============================================================================
// Scene Setup
// ============================================================================

// Spawns the player and its camera. Returns (player, camera).
pub fn spawn_player_with_camera(world: &mut World, config: &SceneConfig, position: Vec3) -> (Entity, Entity) {
    let player = world.spawn(player_bundle(config, position)).id();
    let camera = world.spawn(camera_bundle(config, player, position)).id();
    (player, camera)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullet_starts_above_shooter() {
        let config = SceneConfig::default();
        let (bullet, position) = bullet_bundle(&config, Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(position.0, Vec3::new(1.0, 2.5, 3.0));
        assert_eq!(bullet.origin, position.0);
        assert_eq!(bullet.direction, Vec3::Z);
        assert_eq!(bullet.speed, config.bullet.speed);
    }

    #[test]
    fn camera_starts_behind_player() {
        let mut world = World::new();
        let config = SceneConfig::default();
        let (player, camera) = spawn_player_with_camera(&mut world, &config, Vec3::new(10.0, 0.0, 10.0));

        let follow = world.get::<FollowCamera>(camera).unwrap();
        assert_eq!(follow.target, player);
        let eye = world.get::<Position>(camera).unwrap().0;
        assert!(eye.z < 10.0 && eye.y > 0.0);
        assert!((eye.distance(Vec3::new(10.0, 0.0, 10.0)) - follow.distance).abs() < 1e-4);
    }
}
