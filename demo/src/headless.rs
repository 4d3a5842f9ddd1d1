use common::gpu::{BufferHandle, GpuResourceProvider};
use tracing::{debug, warn};

// ============================================================================
// Headless GPU Resource Provider
// ============================================================================

/// Stands in for a device: uploads are copied into staging memory and only count as resident once
/// `retire_uploads` has run, mirroring a record, submit and wait cycle. Retiring frees the
/// staging copies. `budget` caps the total bytes that may be allocated so the
/// no-buffer path can be exercised from the command line.
#[derive(Debug, Default)]
pub struct HeadlessProvider {
    resident: u32,
    staged: Vec<Vec<u8>>,
    allocated: usize,
    budget: Option<usize>,
}

impl HeadlessProvider {
    #[must_use]
    pub fn with_budget(budget: Option<usize>) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn allocated(&self) -> usize {
        self.allocated
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.staged.len()
    }

    #[must_use]
    pub const fn resident(&self) -> u32 {
        self.resident
    }
}

impl GpuResourceProvider for HeadlessProvider {
    fn create_vertex_buffer(&mut self, data: &[u8], stride: u32, count: u32) -> Option<BufferHandle> {
        let expected = stride as usize * count as usize;
        if data.len() != expected {
            warn!(len = data.len(), expected, "vertex data does not match stride * count");
            return None;
        }
        if self.budget.is_some_and(|budget| self.allocated + data.len() > budget) {
            return None;
        }

        self.allocated += data.len();
        self.staged.push(data.to_vec());
        Some(BufferHandle(self.resident + self.staged.len() as u32))
    }

    fn retire_uploads(&mut self) -> bool {
        if !self.staged.is_empty() {
            debug!(buffers = self.staged.len(), "retiring staged uploads");
        }
        self.resident += self.staged.len() as u32;
        self.staged.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploads_become_resident_on_retire() {
        let mut provider = HeadlessProvider::default();
        assert_eq!(provider.create_vertex_buffer(&[0; 8], 4, 2), Some(BufferHandle(1)));
        assert_eq!(provider.create_vertex_buffer(&[0; 4], 4, 1), Some(BufferHandle(2)));
        assert_eq!(provider.pending(), 2);
        assert!(provider.retire_uploads());
        assert_eq!(provider.pending(), 0);
        assert_eq!(provider.resident(), 2);
        assert_eq!(provider.create_vertex_buffer(&[0; 4], 4, 1), Some(BufferHandle(3)));
    }

    #[test]
    fn budget_and_size_mismatch_fail() {
        let mut provider = HeadlessProvider::with_budget(Some(10));
        assert!(provider.create_vertex_buffer(&[0; 8], 4, 2).is_some());
        assert!(provider.create_vertex_buffer(&[0; 8], 4, 2).is_none());
        assert!(provider.create_vertex_buffer(&[0; 3], 4, 1).is_none());
        assert_eq!(provider.allocated(), 8);
    }
}
