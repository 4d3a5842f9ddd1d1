use bevy_ecs::prelude::Resource;
use bevy_math::Vec3;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, instrument};

use crate::{
    constants::*,
    error::TerrainError,
    gpu::{ShaderHandle, TextureHandle},
    heightfield::HeightField,
    import::import_raw,
    terrain::Terrain,
};

// ============================================================================
// Scene Configuration
// ============================================================================

// Every field falls back to its default, so `{}` is a complete scene.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub terrains: Vec<TerrainConfig>,
    pub grounding: GroundingConfig,
    pub player: PlayerConfig,
    pub bullet: BulletConfig,
    pub camera: CameraConfig,
}

#[cfg(feature = "json")]
impl SceneConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        use anyhow::Context;
        let mut config: Self = serde_json::from_str(json).context("Failed to parse scene config")?;
        config.fill_defaults();
        Ok(config)
    }

    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid scene config {}", path.display()))
    }
}

impl SceneConfig {
    // A scene without terrains gets the stock one.
    pub fn fill_defaults(&mut self) {
        if self.terrains.is_empty() {
            self.terrains.push(TerrainConfig::default());
        }
    }
}

// ============================================================================
// Terrain Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    // Headerless 8-bit .raw file; `None` generates rolling hills.
    pub heightmap: Option<PathBuf>,
    pub width: usize,
    pub length: usize,
    pub block_width: usize,
    pub block_length: usize,
    pub scale: [f32; 3],
    pub position: [f32; 3],
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            heightmap: None,
            width: DEFAULT_TERRAIN_SIZE,
            length: DEFAULT_TERRAIN_SIZE,
            block_width: DEFAULT_BLOCK_SIZE,
            block_length: DEFAULT_BLOCK_SIZE,
            scale: DEFAULT_TERRAIN_SCALE,
            position: [0.0; 3],
        }
    }
}

impl TerrainConfig {
    #[instrument(skip(self), fields(heightmap = ?self.heightmap))]
    pub fn build(&self, shader: ShaderHandle, texture: TextureHandle) -> Result<Terrain, TerrainError> {
        let scale = Vec3::from_array(self.scale);
        let field = match &self.heightmap {
            Some(path) => import_raw(path, self.width, self.length, scale)?,
            None => {
                debug!("generating rolling hills");
                rolling_hills(self.width, self.length, scale)?
            }
        };

        let mut terrain = Terrain::new(field, self.block_width, self.block_length, shader, texture)?;
        terrain.set_position(Vec3::from_array(self.position));
        Ok(terrain)
    }
}

// Smooth synthetic relief spanning most of the 8-bit range.
pub fn rolling_hills(width: usize, length: usize, scale: Vec3) -> Result<HeightField, TerrainError> {
    let samples = (0..length)
        .flat_map(|z| {
            (0..width).map(move |x| {
                let (xf, zf) = (x as f32, z as f32);
                let wave = (xf * 0.045).sin().mul_add(0.6, (zf * 0.031).cos() * 0.4);
                let ripple = (xf.mul_add(0.11, zf * 0.09)).sin() * 0.15;
                (wave + ripple).mul_add(100.0, 128.0).clamp(0.0, 255.0) as u8
            })
        })
        .collect();
    HeightField::new(width, length, scale, samples)
}

// ============================================================================
// Entity Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingConfig {
    pub player_offset: f32,
    pub camera_clearance: f32,
    pub billboard_offset: f32,
    // Players above this world height are indoors and skip grounding.
    pub indoor_threshold: Option<f32>,
    // Follow the quartic block patch instead of the bilinear height.
    pub smooth_player: bool,
    // Explosions float at `billboard_offset` above the ground; when off they stay where the
    // bullet stopped.
    pub ground_explosions: bool,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            player_offset: PLAYER_GROUND_OFFSET,
            camera_clearance: CAMERA_GROUND_CLEARANCE,
            billboard_offset: BILLBOARD_GROUND_OFFSET,
            indoor_threshold: None,
            smooth_player: true,
            ground_explosions: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_speed: f32,
    pub friction: f32,
    pub acceleration: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_speed: PLAYER_MAX_SPEED,
            friction: PLAYER_FRICTION,
            acceleration: PLAYER_ACCELERATION,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletConfig {
    pub speed: f32,
    pub max_range: f32,
}

impl Default for BulletConfig {
    fn default() -> Self {
        Self {
            speed: BULLET_SPEED,
            max_range: BULLET_MAX_RANGE,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    // Clamped to [CAMERA_MIN_DISTANCE, CAMERA_MAX_DISTANCE] when the camera is spawned.
    pub distance: f32,
    pub delay: f32,
    pub offset: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: CAMERA_DISTANCE,
            delay: CAMERA_DELAY,
            offset: CAMERA_OFFSET,
        }
    }
}
