use bevy_math::Vec3;
use tracing::trace;

use crate::{
    bezier::{ControlGrid, PATCH_SIZE, evaluate_patch},
    gpu::{BufferHandle, CommandSink, GpuResourceProvider, PatchVertex, ShaderHandle, TextureHandle},
    heightfield::HeightField,
};

pub const PATCH_CONTROL_POINTS: usize = PATCH_SIZE * PATCH_SIZE;

// ============================================================================
// Patch Generation
// ============================================================================

/// Generated control patch of one terrain block.
///
/// Vertices are ordered from the (min X, max Z) corner, scanning +X within a row and rows towards
/// min Z. The tessellation stage depends on this order.
#[derive(Debug, Clone)]
pub struct Patch {
    pub vertices: [PatchVertex; PATCH_CONTROL_POINTS],
    // Raw sample heights in the same row order as `vertices`.
    pub heights: ControlGrid,
}

#[must_use]
pub fn generate_patch(field: &HeightField, x_start: usize, z_start: usize, width: usize, length: usize) -> Patch {
    let scale = field.scale();
    let x_stride = width / (PATCH_SIZE - 1);
    let z_stride = length / (PATCH_SIZE - 1);
    let u_extent = (field.width() - 1) as f32;
    let v_extent = (field.length() - 1) as f32;

    let mut vertices = [PatchVertex::default(); PATCH_CONTROL_POINTS];
    let mut heights = [[0.0; PATCH_SIZE]; PATCH_SIZE];

    for row in 0..PATCH_SIZE {
        let z = z_start + length - row * z_stride;
        for col in 0..PATCH_SIZE {
            let x = x_start + col * x_stride;
            let (xf, zf) = (x as f32, z as f32);
            let height = field.height(xf, zf);

            heights[row][col] = height;
            vertices[row * PATCH_SIZE + col] = PatchVertex::new(
                [xf * scale.x, height * scale.y, zf * scale.z],
                [xf / u_extent, (v_extent - zf) / v_extent],
                [xf / scale.x, zf / scale.z],
            );
        }
    }

    Patch { vertices, heights }
}

// ============================================================================
// Terrain Block
// ============================================================================

#[derive(Debug, Clone)]
pub struct TerrainBlock {
    x_start: usize,
    z_start: usize,
    width: usize,
    length: usize,
    // CPU copy kept until the provider has retired the upload.
    staging: Option<Box<[PatchVertex; PATCH_CONTROL_POINTS]>>,
    heights: ControlGrid,
    vertex_buffer: Option<BufferHandle>,
    shader: ShaderHandle,
    texture: TextureHandle,
    position: Vec3,
}

impl TerrainBlock {
    #[must_use]
    pub fn new(
        field: &HeightField,
        x_start: usize,
        z_start: usize,
        width: usize,
        length: usize,
        shader: ShaderHandle,
        texture: TextureHandle,
    ) -> Self {
        let patch = generate_patch(field, x_start, z_start, width, length);
        Self {
            x_start,
            z_start,
            width,
            length,
            staging: Some(Box::new(patch.vertices)),
            heights: patch.heights,
            vertex_buffer: None,
            shader,
            texture,
            position: Vec3::ZERO,
        }
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    #[must_use]
    pub const fn x_start(&self) -> usize {
        self.x_start
    }

    #[must_use]
    pub const fn z_start(&self) -> usize {
        self.z_start
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    #[must_use]
    pub const fn shader(&self) -> ShaderHandle {
        self.shader
    }

    #[must_use]
    pub const fn texture(&self) -> TextureHandle {
        self.texture
    }

    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    #[must_use]
    pub const fn vertex_buffer(&self) -> Option<BufferHandle> {
        self.vertex_buffer
    }

    #[must_use]
    pub fn staging(&self) -> Option<&[PatchVertex]> {
        self.staging.as_deref().map(<[PatchVertex; PATCH_CONTROL_POINTS]>::as_slice)
    }

    pub const fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub const fn set_shader(&mut self, shader: ShaderHandle) {
        self.shader = shader;
    }

    // ============================================================================
    // Queries
    // ============================================================================

    // Raw patch height at block-local (u, v), with v = 0 on the max-Z edge.
    #[must_use]
    pub fn evaluate(&self, u: f32, v: f32) -> f32 {
        evaluate_patch(&self.heights, u, v)
    }

    // ============================================================================
    // GPU
    // ============================================================================

    // Returns false when the provider could not allocate a buffer.
    pub fn upload(&mut self, provider: &mut dyn GpuResourceProvider) -> bool {
        if self.vertex_buffer.is_some() {
            return true;
        }
        let Some(vertices) = self.staging.as_deref() else {
            return false;
        };

        self.vertex_buffer = provider.create_vertex_buffer(
            bytemuck::cast_slice(vertices.as_slice()),
            PatchVertex::STRIDE,
            PATCH_CONTROL_POINTS as u32,
        );
        self.vertex_buffer.is_some()
    }

    pub fn release_staging(&mut self) {
        if self.vertex_buffer.is_some() {
            self.staging = None;
        }
    }

    pub fn render(&self, sink: &mut dyn CommandSink) {
        let Some(vertices) = self.vertex_buffer else {
            trace!(x = self.x_start, z = self.z_start, "skipping block without vertex buffer");
            return;
        };

        sink.set_shader(self.shader);
        sink.set_texture(self.texture);
        sink.set_world_offset(self.position);
        sink.draw_patches(vertices, PATCH_CONTROL_POINTS as u32, PATCH_CONTROL_POINTS as u32);
    }
}
