use thiserror::Error;

/// Specific error type for `Octree` configuration.
#[derive(Debug, Clone, Copy, Error)]
pub enum OctreeError {
    #[error("Octree resolution must be a power of two between 32 and 512, got: {resolution}")]
    InvalidResolution { resolution: usize },

    #[error("Octree cannot be built over an empty or degenerate bounding volume")]
    DegenerateVolume,
}
