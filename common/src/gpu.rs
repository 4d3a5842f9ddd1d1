use bevy_math::Vec3;
use bytemuck::{Pod, Zeroable};

// ============================================================================
// Resource Handles
// ============================================================================

// Handles are non-owning ids. The GPU resource provider owns what they refer to.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

// ============================================================================
// Patch Vertex
// ============================================================================

// Control point of a terrain tessellation patch.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable, Default)]
pub struct PatchVertex {
    pub position: [f32; 3],
    pub base_uv: [f32; 2],
    pub detail_uv: [f32; 2],
}

impl PatchVertex {
    pub const STRIDE: u32 = std::mem::size_of::<Self>() as u32;

    #[must_use]
    pub const fn new(position: [f32; 3], base_uv: [f32; 2], detail_uv: [f32; 2]) -> Self {
        Self {
            position,
            base_uv,
            detail_uv,
        }
    }
}

// ============================================================================
// External Collaborators
// ============================================================================

/// Turns CPU-side vertex data into drawable buffers.
///
/// Uploads are staged: the provider keeps its staging copies alive until `retire_uploads` reports
/// that the recorded copies have completed. A `None` handle means allocation failed; the caller
/// must carry on without drawing that geometry.
pub trait GpuResourceProvider {
    fn create_vertex_buffer(&mut self, data: &[u8], stride: u32, count: u32) -> Option<BufferHandle>;

    // Records, submits and waits for pending copies. Returns true once nothing is in flight.
    fn retire_uploads(&mut self) -> bool;
}

// Receives draw submissions for one frame.
pub trait CommandSink {
    fn set_shader(&mut self, shader: ShaderHandle);
    fn set_texture(&mut self, texture: TextureHandle);
    fn set_world_offset(&mut self, offset: Vec3);
    fn draw_patches(&mut self, vertices: BufferHandle, control_points: u32, vertex_count: u32);
}

// ============================================================================
// Recording Sink
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordedCommand {
    SetShader(ShaderHandle),
    SetTexture(TextureHandle),
    SetWorldOffset(Vec3),
    DrawPatches {
        vertices: BufferHandle,
        control_points: u32,
        vertex_count: u32,
    },
}

// Command sink that keeps every submission, for headless frames and tests.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    pub commands: Vec<RecordedCommand>,
}

impl CommandRecorder {
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, RecordedCommand::DrawPatches { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl CommandSink for CommandRecorder {
    fn set_shader(&mut self, shader: ShaderHandle) {
        self.commands.push(RecordedCommand::SetShader(shader));
    }

    fn set_texture(&mut self, texture: TextureHandle) {
        self.commands.push(RecordedCommand::SetTexture(texture));
    }

    fn set_world_offset(&mut self, offset: Vec3) {
        self.commands.push(RecordedCommand::SetWorldOffset(offset));
    }

    fn draw_patches(&mut self, vertices: BufferHandle, control_points: u32, vertex_count: u32) {
        self.commands.push(RecordedCommand::DrawPatches {
            vertices,
            control_points,
            vertex_count,
        });
    }
}
