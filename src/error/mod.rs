//! Error handling for the spatial acceleration core.

mod geometry;
mod numeric;
mod octree;
mod transformation;
mod tree;

pub use geometry::GeometryError;
pub use numeric::NumericError;
pub use octree::OctreeError;
pub use transformation::TransformationError;
pub use tree::TreeError;

use thiserror::Error;

/// Umbrella error type for the acceleration core.
#[derive(Error, Debug)]
pub enum AccelError {
    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Tree lifecycle error: {0}")]
    Tree(#[from] TreeError),

    #[error("Octree configuration error: {0}")]
    Octree(#[from] OctreeError),

    #[error("Invalid transformation: {0}")]
    Transformation(#[from] TransformationError),

    #[error("Numeric conversion error: {0}")]
    Numeric(#[from] NumericError),
}

/// Result type alias used throughout the acceleration core.
pub type Result<T> = std::result::Result<T, AccelError>;
