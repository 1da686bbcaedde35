//! Concrete spatial-acceleration trees: the `create_*` family in §6, each
//! implementing [`crate::traits::ApiNode`] over the shared
//! [`crate::builder::TreeBuilder`].

mod bih;
mod bvh;
mod bvh_config;
mod kdop_bvh;
mod octree;
mod svbvh;
mod vbvh;

pub use bih::Bih;
pub use bvh::Bvh;
pub use bvh_config::BvhConfig;
pub use kdop_bvh::KdopBvh;
pub use octree::{Octree, OctreeConfig};
pub use svbvh::{LaneBounds, Svbvh};
pub use vbvh::Vbvh;
