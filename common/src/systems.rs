#[allow(clippy::wildcard_imports)]
use bevy_ecs::prelude::*;
use bevy_math::{Quat, Vec3};
use bevy_time::Time;
use tracing::{debug, trace};

use crate::{
    components::{Billboard, BillboardBasis, Bullet, FollowCamera, GroundedOn, Orientation, Player, Position, Velocity},
    config::SceneConfig,
    grounding::{GroundPolicy, HeightSource, ground_follow},
    resources::{PlayerInput, Terrains},
    spawning::{bullet_bundle, explosion_bundle},
};

// ============================================================================
// Schedule
// ============================================================================

// One frame of the scene update. Systems run strictly in order.
#[must_use]
pub fn update_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            terrain_resolve_system,
            player_input_system,
            player_movement_system,
            camera_follow_system,
            fire_system,
            bullets_system,
            billboards_system,
        )
            .chain(),
    );
    schedule
}

// ============================================================================
// Terrain Resolution
// ============================================================================

// Re-resolves which terrain lies under every grounded entity.
pub fn terrain_resolve_system(terrains: Res<Terrains>, mut query: Query<(&Position, &mut GroundedOn)>) {
    for (pos, mut grounded) in &mut query {
        let found = terrains.find(pos.0.x, pos.0.z);
        if grounded.0 != found {
            trace!(from = ?grounded.0, to = ?found, "entity changed terrain");
            grounded.0 = found;
        }
    }
}

// ============================================================================
// Player Systems
// ============================================================================

// Applies rotation and accelerates along the body axes.
pub fn player_input_system(
    time: Res<Time>,
    input: Res<PlayerInput>,
    mut query: Query<(&Player, &mut Velocity, &mut Orientation)>,
) {
    let delta = time.delta_secs();

    for (player, mut vel, mut orientation) in &mut query {
        orientation.rotate(input.yaw_delta, input.pitch_delta);

        let push = orientation.front() * input.throttle + orientation.right() * input.strafe + Vec3::Y * input.climb;
        if push != Vec3::ZERO {
            vel.0 = player.add_velocity(vel.0, push * player.acceleration * delta);
        }
    }
}

// Integrates velocity, keeps the player on its terrain, then applies friction.
pub fn player_movement_system(
    time: Res<Time>,
    terrains: Res<Terrains>,
    config: Res<SceneConfig>,
    mut query: Query<(&Player, &mut Position, &mut Velocity, &mut Orientation, &GroundedOn)>,
) {
    let delta = time.delta_secs();
    let grounding = config.grounding;
    let source = if grounding.smooth_player {
        HeightSource::Smoothed
    } else {
        HeightSource::Bilinear
    };

    for (player, mut pos, mut vel, mut orientation, grounded) in &mut query {
        pos.0 += vel.0 * delta;

        let indoors = grounding.indoor_threshold.is_some_and(|threshold| pos.0.y > threshold);
        match terrains.get(grounded.0) {
            Some(terrain) if !indoors => {
                let follow = ground_follow(
                    terrain,
                    pos.0,
                    orientation.front(),
                    GroundPolicy::Snap {
                        offset: grounding.player_offset,
                    },
                    source,
                );
                pos.0 = follow.position;
                orientation.normal = follow.normal;
                orientation.look = follow.look;
            }
            _ => {
                orientation.normal = Vec3::Y;
                orientation.look = orientation.front();
            }
        }

        vel.0 = player.apply_friction(vel.0, delta);
    }
}

// ============================================================================
// Camera System
// ============================================================================

// Eases each camera towards its spot behind the target and keeps it above ground.
pub fn camera_follow_system(
    time: Res<Time>,
    terrains: Res<Terrains>,
    config: Res<SceneConfig>,
    targets: Query<(&Position, &Orientation), Without<FollowCamera>>,
    mut cameras: Query<(&mut Position, &mut FollowCamera)>,
) {
    let delta = time.delta_secs();

    for (mut eye, mut camera) in &mut cameras {
        let Ok((target, orientation)) = targets.get(camera.target) else {
            continue;
        };

        let rotation = Quat::from_rotation_y(orientation.yaw) * Quat::from_rotation_x(-orientation.pitch);
        let destination = target.0 + rotation * camera.offset * camera.distance;
        let step = (destination - eye.0) * camera.follow_factor(delta);
        eye.0 += step;

        if let Some(index) = terrains.find(eye.0.x, eye.0.z) {
            let follow = ground_follow(
                &terrains.0[index],
                eye.0,
                camera.look,
                GroundPolicy::Clearance {
                    clearance: config.grounding.camera_clearance,
                },
                HeightSource::Bilinear,
            );
            eye.0 = follow.position;
        }

        if let Some(look) = (target.0 - eye.0).try_normalize() {
            camera.look = look;
        }
    }
}

// ============================================================================
// Bullet Systems
// ============================================================================

pub fn fire_system(
    mut commands: Commands,
    mut input: ResMut<PlayerInput>,
    config: Res<SceneConfig>,
    players: Query<(&Position, &Orientation), With<Player>>,
) {
    if !input.fire {
        return;
    }
    input.fire = false;

    for (pos, orientation) in &players {
        debug!(pos = ?pos.0, look = ?orientation.look, "bullet fired");
        commands.spawn(bullet_bundle(&config, pos.0, orientation.look));
    }
}

// Moves bullets and replaces them with an explosion once they hit the ground or run out of range.
pub fn bullets_system(
    mut commands: Commands,
    time: Res<Time>,
    terrains: Res<Terrains>,
    config: Res<SceneConfig>,
    mut query: Query<(Entity, &mut Position, &Bullet)>,
) {
    let delta = time.delta_secs();

    for (entity, mut pos, bullet) in &mut query {
        pos.0 += bullet.direction * bullet.speed * delta;

        let below_ground = terrains
            .find(pos.0.x, pos.0.z)
            .is_some_and(|index| pos.0.y < terrains.0[index].height(pos.0.x, pos.0.z));
        if below_ground || bullet.out_of_range(pos.0) {
            debug!(pos = ?pos.0, below_ground, "bullet removed");
            commands.entity(entity).despawn();
            commands.spawn(explosion_bundle(pos.0, config.grounding.ground_explosions));
        }
    }
}

// ============================================================================
// Billboard System
// ============================================================================

// Ages billboards, turns them towards the camera and keeps them above the ground.
pub fn billboards_system(
    mut commands: Commands,
    time: Res<Time>,
    terrains: Res<Terrains>,
    config: Res<SceneConfig>,
    cameras: Query<&Position, With<FollowCamera>>,
    mut query: Query<(Entity, &mut Position, &mut Billboard, &mut BillboardBasis, &GroundedOn), Without<FollowCamera>>,
) {
    let frame_time = time.delta();
    let eye = cameras.iter().next().map(|pos| pos.0);

    for (entity, mut pos, mut billboard, mut basis, grounded) in &mut query {
        billboard.lifetime.tick(frame_time);
        if billboard.lifetime.is_finished() {
            commands.entity(entity).despawn();
            continue;
        }

        if let Some(eye) = eye {
            *basis = BillboardBasis::facing(pos.0, eye, Vec3::Y);
        }

        if !billboard.check_terrain {
            continue;
        }
        if let Some(terrain) = terrains.get(grounded.0) {
            let follow = ground_follow(
                terrain,
                pos.0,
                basis.look,
                GroundPolicy::Snap {
                    offset: config.grounding.billboard_offset,
                },
                HeightSource::Bilinear,
            );
            pos.0 = follow.position;
        }
    }
}
