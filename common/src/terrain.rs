use bevy_math::Vec3;
use tracing::{debug, instrument, warn};

use crate::{
    block::TerrainBlock,
    error::TerrainError,
    gpu::{CommandSink, GpuResourceProvider, ShaderHandle, TextureHandle},
    heightfield::HeightField,
};

// ============================================================================
// Terrain
// ============================================================================

/// Height field placed in the world and split into tessellation blocks.
///
/// All world-space ground queries go through here; the height field knows nothing about placement.
#[derive(Debug, Clone)]
pub struct Terrain {
    field: HeightField,
    blocks: Vec<TerrainBlock>,
    blocks_x: usize,
    blocks_z: usize,
    block_width: usize,
    block_length: usize,
    position: Vec3,
}

impl Terrain {
    // ============================================================================
    // Constructor
    // ============================================================================

    // Block sizes are counted in cells and must be multiples of 4 so each patch gets 5x5 samples.
    #[instrument(skip(field, shader, texture), fields(width = field.width(), length = field.length()))]
    pub fn new(
        field: HeightField,
        block_width: usize,
        block_length: usize,
        shader: ShaderHandle,
        texture: TextureHandle,
    ) -> Result<Self, TerrainError> {
        if block_width == 0 || block_length == 0 || block_width % 4 != 0 || block_length % 4 != 0 {
            return Err(TerrainError::BlockNotDivisible {
                block_width,
                block_length,
            });
        }

        let width = field.width();
        let length = field.length();
        if block_width > width - 1 || block_length > length - 1 {
            return Err(TerrainError::BlockTooLarge {
                block_width,
                block_length,
                width,
                length,
            });
        }

        let blocks_x = (width - 1) / block_width;
        let blocks_z = (length - 1) / block_length;

        let mut blocks = Vec::with_capacity(blocks_x * blocks_z);
        for bz in 0..blocks_z {
            for bx in 0..blocks_x {
                blocks.push(TerrainBlock::new(
                    &field,
                    bx * block_width,
                    bz * block_length,
                    block_width,
                    block_length,
                    shader,
                    texture,
                ));
            }
        }

        debug!(blocks_x, blocks_z, "built terrain blocks");

        Ok(Self {
            field,
            blocks,
            blocks_x,
            blocks_z,
            block_width,
            block_length,
            position: Vec3::ZERO,
        })
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    #[must_use]
    pub const fn field(&self) -> &HeightField {
        &self.field
    }

    #[must_use]
    pub fn blocks(&self) -> &[TerrainBlock] {
        &self.blocks
    }

    #[must_use]
    pub const fn block_grid(&self) -> (usize, usize) {
        (self.blocks_x, self.blocks_z)
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.field.width()
    }

    #[must_use]
    pub const fn length(&self) -> usize {
        self.field.length()
    }

    #[must_use]
    pub const fn block_width(&self) -> usize {
        self.block_width
    }

    #[must_use]
    pub const fn block_length(&self) -> usize {
        self.block_length
    }

    #[must_use]
    pub const fn scale(&self) -> Vec3 {
        self.field.scale()
    }

    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    // ============================================================================
    // Placement
    // ============================================================================

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        for block in &mut self.blocks {
            block.set_position(position);
        }
    }

    pub fn translate(&mut self, shift: Vec3) {
        self.set_position(self.position + shift);
    }

    pub fn set_shader(&mut self, shader: ShaderHandle) {
        for block in &mut self.blocks {
            block.set_shader(shader);
        }
    }

    // ============================================================================
    // World-Space Queries
    // ============================================================================

    // World (x, z) to fractional grid coordinates.
    #[must_use]
    pub fn to_grid(&self, x: f32, z: f32) -> (f32, f32) {
        let scale = self.scale();
        ((x - self.position.x) / scale.x, (z - self.position.z) / scale.z)
    }

    // Footprint test, inclusive on both edges.
    #[must_use]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        let scale = self.scale();
        let max_x = (self.width() as f32).mul_add(scale.x, self.position.x);
        let max_z = (self.length() as f32).mul_add(scale.z, self.position.z);
        self.position.x <= x && x <= max_x && self.position.z <= z && z <= max_z
    }

    #[must_use]
    pub fn height(&self, x: f32, z: f32) -> f32 {
        let (gx, gz) = self.to_grid(x, z);
        self.field.height(gx, gz).mul_add(self.scale().y, self.position.y)
    }

    // Bilinear blend of the four surrounding cell normals.
    #[must_use]
    pub fn normal(&self, x: f32, z: f32) -> Vec3 {
        let (gx, gz) = self.to_grid(x, z);
        if !self.field.contains(gx, gz) {
            return Vec3::Y;
        }

        let ix = gx.floor();
        let iz = gz.floor();
        let fx = gx - ix;
        let fz = gz - iz;

        let max_x = self.width() as i32 - 1;
        let max_z = self.length() as i32 - 1;
        let (ix, iz) = (ix as i32, iz as i32);
        let (ix1, iz1) = ((ix + 1).min(max_x), (iz + 1).min(max_z));

        let left_top = self.field.normal(ix, iz1);
        let left_bottom = self.field.normal(ix, iz);
        let right_top = self.field.normal(ix1, iz1);
        let right_bottom = self.field.normal(ix1, iz);

        let bottom = left_bottom.lerp(right_bottom, fx);
        let top = left_top.lerp(right_top, fx);
        bottom.lerp(top, fz).try_normalize().unwrap_or(Vec3::Y)
    }

    // Lower corner of the block containing (x, z), at y = 0.
    #[must_use]
    pub fn block_position(&self, x: f32, z: f32) -> Vec3 {
        let scale = self.scale();
        let extent_x = self.block_width as f32 * scale.x;
        let extent_z = self.block_length as f32 * scale.z;

        let corner_x = ((x - self.position.x) / extent_x).floor().mul_add(extent_x, self.position.x);
        let corner_z = ((z - self.position.z) / extent_z).floor().mul_add(extent_z, self.position.z);
        Vec3::new(corner_x, 0.0, corner_z)
    }

    #[must_use]
    pub fn block_at(&self, x: f32, z: f32) -> Option<&TerrainBlock> {
        let (gx, gz) = self.to_grid(x, z);
        if !self.field.contains(gx, gz) {
            return None;
        }
        let bx = (gx / self.block_width as f32).floor() as usize;
        let bz = (gz / self.block_length as f32).floor() as usize;
        if bx >= self.blocks_x || bz >= self.blocks_z {
            return None;
        }
        self.blocks.get(bz * self.blocks_x + bx)
    }

    /// Height from the quartic Bezier patch of the containing block.
    ///
    /// Follows the tessellated surface without the creases of [`Terrain::height`]. Points outside
    /// every block fall back to the bilinear height.
    #[must_use]
    pub fn smoothed_height(&self, x: f32, z: f32) -> f32 {
        let Some(block) = self.block_at(x, z) else {
            return self.height(x, z);
        };

        let scale = self.scale();
        let corner = self.block_position(x, z);
        let u = (x - corner.x) / (self.block_width as f32 * scale.x);
        // Patch rows run from max Z to min Z.
        let v = 1.0 - (z - corner.z) / (self.block_length as f32 * scale.z);

        block.evaluate(u, v).mul_add(scale.y, self.position.y)
    }

    // ============================================================================
    // GPU
    // ============================================================================

    // Returns the number of blocks that now have a vertex buffer.
    pub fn upload(&mut self, provider: &mut dyn GpuResourceProvider) -> usize {
        let uploaded = self
            .blocks
            .iter_mut()
            .map(|block| block.upload(provider))
            .filter(|uploaded| *uploaded)
            .count();
        let failed = self.blocks.len() - uploaded;
        if failed > 0 {
            warn!(failed, "terrain blocks without vertex buffers will not be drawn");
        }
        uploaded
    }

    pub fn release_upload_buffers(&mut self, provider: &mut dyn GpuResourceProvider) {
        if !provider.retire_uploads() {
            debug!("uploads still in flight, keeping staging data");
            return;
        }
        for block in &mut self.blocks {
            block.release_staging();
        }
    }

    pub fn render(&self, sink: &mut dyn CommandSink) {
        for block in &self.blocks {
            block.render(sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{BufferHandle, CommandRecorder, RecordedCommand};

    const EPS: f32 = 1e-4;

    fn terrain_from(width: usize, length: usize, scale: Vec3, samples: Vec<u8>, block: usize) -> Terrain {
        let field = HeightField::new(width, length, scale, samples).unwrap();
        Terrain::new(field, block, block, ShaderHandle(0), TextureHandle(0)).unwrap()
    }

    fn bumpy(width: usize, length: usize) -> Vec<u8> {
        (0..width * length).map(|i| ((i * 53 + i / width * 29) % 251) as u8).collect()
    }

    #[derive(Default)]
    struct CountingProvider {
        next: u32,
        pending: bool,
    }

    impl GpuResourceProvider for CountingProvider {
        fn create_vertex_buffer(&mut self, data: &[u8], stride: u32, count: u32) -> Option<BufferHandle> {
            assert_eq!(data.len(), (stride * count) as usize);
            self.next += 1;
            self.pending = true;
            Some(BufferHandle(self.next))
        }

        fn retire_uploads(&mut self) -> bool {
            self.pending = false;
            true
        }
    }

    #[test]
    fn world_coordinates_map_onto_grid() {
        let samples = bumpy(9, 9);
        let mut terrain = terrain_from(9, 9, Vec3::new(2.0, 1.0, 2.0), samples, 4);
        terrain.set_position(Vec3::new(10.0, 0.0, 20.0));

        for gz in 0..8 {
            for gx in 0..8 {
                let (wx, wz) = (10.0 + 2.0 * gx as f32, 20.0 + 2.0 * gz as f32);
                assert_eq!(terrain.to_grid(wx, wz), (gx as f32, gz as f32));
                let expected = terrain.field().height(gx as f32, gz as f32);
                assert!((terrain.height(wx, wz) - expected).abs() < EPS);
            }
        }
    }

    #[test]
    fn height_applies_vertical_scale_and_offset() {
        let mut terrain = terrain_from(5, 5, Vec3::new(1.0, 0.2, 1.0), vec![128; 25], 4);
        terrain.set_position(Vec3::new(-3.0, 7.0, 4.0));
        for (x, z) in [(-3.0, 4.0), (-1.5, 5.25), (0.9, 7.9)] {
            assert!((terrain.height(x, z) - (128.0f32.mul_add(0.2, 7.0))).abs() < EPS);
            assert!((terrain.normal(x, z) - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn footprint_includes_min_edge_and_excludes_beyond_max() {
        let mut terrain = terrain_from(9, 9, Vec3::new(2.0, 1.0, 3.0), vec![0; 81], 4);
        terrain.set_position(Vec3::new(10.0, 0.0, 20.0));
        assert!(terrain.contains(10.0, 20.0));
        assert!(terrain.contains(10.0 + 18.0, 20.0 + 27.0));
        assert!(!terrain.contains(10.0 + 18.0 + 1.0, 25.0));
        assert!(!terrain.contains(15.0, 20.0 + 27.0 + 1.0));
        assert!(!terrain.contains(9.0, 25.0));
    }

    #[test]
    fn normals_are_unit_and_default_up_outside() {
        let terrain = terrain_from(9, 9, Vec3::new(1.0, 0.3, 1.0), bumpy(9, 9), 4);
        for step in 0..40 {
            let x = step as f32 * 0.21;
            let z = step as f32 * 0.17;
            assert!((terrain.normal(x, z).length() - 1.0).abs() < EPS);
        }
        assert_eq!(terrain.normal(-0.5, 2.0), Vec3::Y);
        assert_eq!(terrain.normal(2.0, 9.5), Vec3::Y);
    }

    #[test]
    fn normal_blends_between_cells() {
        let terrain = terrain_from(9, 9, Vec3::ONE, bumpy(9, 9), 4);
        let field = terrain.field();
        // At an integer coordinate the blend collapses to that cell's normal.
        assert!((terrain.normal(3.0, 5.0) - field.normal(3, 5)).length() < EPS);
        let mid = terrain.normal(3.5, 5.0);
        let expected = field.normal(3, 5).lerp(field.normal(4, 5), 0.5).normalize();
        assert!((mid - expected).length() < EPS);
    }

    #[test]
    fn far_edge_normal_reuses_last_column_and_row() {
        let terrain = terrain_from(9, 9, Vec3::ONE, bumpy(9, 9), 4);
        let field = terrain.field();
        assert!((terrain.normal(8.0, 8.0) - field.normal(8, 8)).length() < EPS);
        let edge = terrain.normal(8.0, 3.5);
        let expected = field.normal(8, 3).lerp(field.normal(8, 4), 0.5).normalize();
        assert!((edge - expected).length() < EPS);
    }

    #[test]
    fn block_position_returns_lower_corner() {
        let mut terrain = terrain_from(17, 17, Vec3::new(2.0, 1.0, 0.5), vec![0; 289], 8);
        terrain.set_position(Vec3::new(100.0, 5.0, -4.0));
        assert_eq!(terrain.block_position(100.0, -4.0), Vec3::new(100.0, 0.0, -4.0));
        assert_eq!(terrain.block_position(117.0, 0.5), Vec3::new(116.0, 0.0, 0.0));
        assert_eq!(terrain.block_position(117.0, -0.5), Vec3::new(116.0, 0.0, -4.0));
        assert_eq!(terrain.block_position(131.9, 3.9), Vec3::new(116.0, 0.0, 0.0));
    }

    #[test]
    fn blocks_tile_the_grid() {
        let terrain = terrain_from(257, 257, Vec3::new(1.0, 0.2, 1.0), vec![0; 257 * 257], 12);
        assert_eq!(terrain.block_grid(), (21, 21));
        assert_eq!(terrain.blocks().len(), 441);
        let last = terrain.blocks().last().unwrap();
        assert_eq!((last.x_start(), last.z_start()), (240, 240));
    }

    #[test]
    fn construction_validates_block_sizes() {
        let field = HeightField::flat(9, 9, Vec3::ONE, 0).unwrap();
        assert!(matches!(
            Terrain::new(field.clone(), 6, 4, ShaderHandle(0), TextureHandle(0)),
            Err(TerrainError::BlockNotDivisible { .. })
        ));
        assert!(matches!(
            Terrain::new(field.clone(), 0, 4, ShaderHandle(0), TextureHandle(0)),
            Err(TerrainError::BlockNotDivisible { .. })
        ));
        assert!(matches!(
            Terrain::new(field, 12, 4, ShaderHandle(0), TextureHandle(0)),
            Err(TerrainError::BlockTooLarge { .. })
        ));
    }

    #[test]
    fn smoothed_height_on_flat_ground_is_constant() {
        let mut terrain = terrain_from(13, 13, Vec3::new(1.5, 0.25, 1.5), vec![77; 169], 4);
        terrain.set_position(Vec3::new(3.0, -2.0, 1.0));
        let expected = 77.0f32.mul_add(0.25, -2.0);
        for step in 0..30 {
            let x = (step as f32).mul_add(0.6, 3.0);
            let z = (step as f32).mul_add(0.55, 1.0);
            assert!((terrain.smoothed_height(x, z) - expected).abs() < EPS, "at ({x}, {z})");
        }
    }

    #[test]
    fn smoothed_height_matches_patch_corners() {
        let terrain = terrain_from(9, 9, Vec3::ONE, bumpy(9, 9), 4);
        // Block corners coincide with control points, which the patch interpolates.
        for (x, z) in [(0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (4.0, 4.0)] {
            let bilinear = terrain.height(x, z);
            assert!((terrain.smoothed_height(x, z) - bilinear).abs() < EPS, "at ({x}, {z})");
        }
    }

    #[test]
    fn shader_and_position_propagate_to_every_block() {
        let mut terrain = terrain_from(9, 9, Vec3::ONE, vec![0; 81], 4);
        terrain.set_position(Vec3::new(1.0, 2.0, 3.0));
        terrain.translate(Vec3::new(1.0, 0.0, -1.0));
        terrain.set_shader(ShaderHandle(9));
        for block in terrain.blocks() {
            assert_eq!(block.position(), Vec3::new(2.0, 2.0, 2.0));
            assert_eq!(block.shader(), ShaderHandle(9));
        }
    }

    #[test]
    fn render_draws_uploaded_blocks_and_staging_is_released() {
        let mut terrain = terrain_from(9, 9, Vec3::ONE, vec![0; 81], 4);
        let mut provider = CountingProvider::default();
        assert_eq!(terrain.upload(&mut provider), 4);

        let mut recorder = CommandRecorder::default();
        terrain.render(&mut recorder);
        assert_eq!(recorder.draw_count(), 4);
        assert!(recorder.commands.contains(&RecordedCommand::DrawPatches {
            vertices: BufferHandle(1),
            control_points: 25,
            vertex_count: 25,
        }));

        terrain.release_upload_buffers(&mut provider);
        assert!(!provider.pending);
        assert!(terrain.blocks().iter().all(|block| block.staging().is_none()));
    }
}
