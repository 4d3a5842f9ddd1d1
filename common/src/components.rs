#[allow(clippy::wildcard_imports)]
use bevy_ecs::prelude::*;
use bevy_math::Vec3;
use bevy_time::{Timer, TimerMode};

use crate::constants::*;

// ============================================================================
// Transform Components
// ============================================================================

#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Position(pub Vec3);

#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity(pub Vec3);

/// Heading of a grounded entity.
///
/// `yaw` and `pitch` are in radians. The body only turns about world up; `pitch` is the aim
/// elevation. `normal` and `look` are refreshed by ground following every tick.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub normal: Vec3,
    pub look: Vec3,
}

impl Default for Orientation {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            normal: Vec3::Y,
            look: Vec3::Z,
        }
    }
}

impl Orientation {
    // Horizontal forward direction. Yaw 0 faces +Z.
    #[must_use]
    pub fn front(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        Vec3::Y.cross(self.front())
    }

    // Adds to yaw and pitch, keeping pitch inside [MIN_PITCH, MAX_PITCH].
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.yaw += yaw;
        self.pitch = (self.pitch + pitch).clamp(MIN_PITCH.to_radians(), MAX_PITCH.to_radians());
    }
}

// Index into `Terrains` of the terrain under this entity, resolved every tick.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroundedOn(pub Option<usize>);

// ============================================================================
// Player
// ============================================================================

#[derive(Component, Debug, Clone, Copy)]
pub struct Player {
    pub max_speed: f32,
    pub friction: f32,
    pub acceleration: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            max_speed: PLAYER_MAX_SPEED,
            friction: PLAYER_FRICTION,
            acceleration: PLAYER_ACCELERATION,
        }
    }
}

impl Player {
    // Adds `increase` and rescales the result down to `max_speed` if it got faster.
    #[must_use]
    pub fn add_velocity(&self, velocity: Vec3, increase: Vec3) -> Vec3 {
        let velocity = velocity + increase;
        let speed = velocity.length();
        if speed > self.max_speed {
            velocity * (self.max_speed / speed)
        } else {
            velocity
        }
    }

    // Friction decay for a tick of `delta` seconds.
    #[must_use]
    pub fn apply_friction(&self, velocity: Vec3, delta: f32) -> Vec3 {
        velocity * self.friction.powf(-delta * FRICTION_REFERENCE_HZ)
    }
}

// ============================================================================
// Camera
// ============================================================================

/// Third-person camera trailing the entity it targets.
///
/// The eye is pulled towards `target + offset * distance` every tick, rotated by the target's
/// yaw and pitch.
#[derive(Component, Debug, Clone, Copy)]
pub struct FollowCamera {
    pub target: Entity,
    pub offset: Vec3,
    pub distance: f32,
    pub delay: f32,
    pub look: Vec3,
}

impl FollowCamera {
    #[must_use]
    pub fn new(target: Entity, offset: Vec3, distance: f32, delay: f32) -> Self {
        Self {
            target,
            offset: offset.try_normalize().unwrap_or(Vec3::NEG_Z),
            distance: distance.clamp(CAMERA_MIN_DISTANCE, CAMERA_MAX_DISTANCE),
            delay: delay.clamp(0.0, 1.0),
            look: Vec3::Z,
        }
    }

    // Fraction of the remaining distance covered this tick. Capped at 1 so a long frame never
    // carries the eye past its destination.
    #[must_use]
    pub fn follow_factor(&self, delta: f32) -> f32 {
        ((1.0 - self.delay) * delta * CAMERA_FOLLOW_RATE).clamp(CAMERA_MIN_FOLLOW, 1.0)
    }
}

// ============================================================================
// Bullets
// ============================================================================

#[derive(Component, Debug, Clone, Copy)]
pub struct Bullet {
    pub origin: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub max_range: f32,
}

impl Bullet {
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3, speed: f32, max_range: f32) -> Self {
        Self {
            origin,
            direction: direction.try_normalize().unwrap_or(Vec3::Z),
            speed,
            max_range,
        }
    }

    #[must_use]
    pub fn out_of_range(&self, position: Vec3) -> bool {
        position.distance_squared(self.origin) > self.max_range * self.max_range
    }
}

// ============================================================================
// Billboards
// ============================================================================

#[derive(Component, Debug, Clone)]
pub struct Billboard {
    pub check_terrain: bool,
    pub lifetime: Timer,
}

impl Billboard {
    // `check_terrain: false` leaves the billboard at the height it was spawned at.
    #[must_use]
    pub fn new(check_terrain: bool, lifetime_secs: f32) -> Self {
        Self {
            check_terrain,
            lifetime: Timer::from_seconds(lifetime_secs, TimerMode::Once),
        }
    }

    #[must_use]
    pub fn explosion(check_terrain: bool) -> Self {
        Self::new(check_terrain, EXPLOSION_LIFETIME)
    }
}

// Camera-facing frame of a billboard.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BillboardBasis {
    pub right: Vec3,
    pub up: Vec3,
    pub look: Vec3,
}

impl Default for BillboardBasis {
    fn default() -> Self {
        Self {
            right: Vec3::X,
            up: Vec3::Y,
            look: Vec3::Z,
        }
    }
}

impl BillboardBasis {
    // Basis looking from `position` at `eye`, keeping `up` fixed.
    #[must_use]
    pub fn facing(position: Vec3, eye: Vec3, up: Vec3) -> Self {
        let look = (eye - position).try_normalize().unwrap_or(Vec3::Z);
        let right = up.cross(look).try_normalize().unwrap_or(Vec3::X);
        Self { right, up, look }
    }
}
