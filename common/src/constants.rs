// ============================================================================
// Terrain
// ============================================================================

pub const DEFAULT_TERRAIN_SIZE: usize = 257; // samples per side
pub const DEFAULT_BLOCK_SIZE: usize = 12; // cells per block side
pub const DEFAULT_TERRAIN_SCALE: [f32; 3] = [1.0, 0.2, 1.0];

// ============================================================================
// Grounding
// ============================================================================

pub const PLAYER_GROUND_OFFSET: f32 = 0.5; // meters above the surface
pub const CAMERA_GROUND_CLEARANCE: f32 = 0.5; // minimum meters above the surface
pub const BILLBOARD_GROUND_OFFSET: f32 = 5.0; // meters above the surface

// ============================================================================
// Player
// ============================================================================

pub const PLAYER_MAX_SPEED: f32 = 10.0; // meters per second
pub const PLAYER_FRICTION: f32 = 1.1; // velocity divisor per reference frame
pub const PLAYER_ACCELERATION: f32 = 10.0; // meters per second squared
pub const FRICTION_REFERENCE_HZ: f32 = 60.0;

// Pitch limits (degrees)
pub const MAX_PITCH: f32 = 60.0;
pub const MIN_PITCH: f32 = -80.0;

// ============================================================================
// Camera
// ============================================================================

pub const CAMERA_DISTANCE: f32 = 5.0;
pub const CAMERA_MIN_DISTANCE: f32 = 3.0;
pub const CAMERA_MAX_DISTANCE: f32 = 20.0;
pub const CAMERA_DELAY: f32 = 0.01; // 0 = snap, 1 = never catches up
pub const CAMERA_OFFSET: [f32; 3] = [0.0, 1.0, -5.0]; // normalized at load time
pub const CAMERA_MIN_FOLLOW: f32 = 0.01; // lower bound of the per-tick follow factor
pub const CAMERA_FOLLOW_RATE: f32 = 10.0;

// ============================================================================
// Bullets
// ============================================================================

pub const BULLET_SPEED: f32 = 100.0; // meters per second
pub const BULLET_MAX_RANGE: f32 = 300.0; // meters from the muzzle
pub const BULLET_SPAWN_HEIGHT: f32 = 0.5; // meters above the player origin

// ============================================================================
// Billboards
// ============================================================================

pub const EXPLOSION_LIFETIME: f32 = 0.75; // seconds
