//! A polymorphic spatial acceleration core for ray-traced triangle and quad
//! geometry: a tagged ray-object handle ([`RayObject`]) dispatching into one
//! of several interchangeable tree kinds (binary SAH BVH, variable-fanout
//! BVH, SIMD-lane-packed BVH, 4-way bounding interval hierarchy, fixed-
//! resolution voxel octree, or an affine-transformed instance of any of the
//! above), all behind the shared [`traits::ApiNode`] capability table.
//!
//! Construct a tree with one of the `create_*` functions in [`api`], `add`
//! primitives, call [`api::done`] to build it, then query with
//! [`api::raycast`] (which replays the shadow-ray last-hit cache and any
//! seeded [`hint::TraversalHint`]) or [`api::intersect`] (a plain traversal
//! with neither).

pub mod api;
pub mod builder;
pub mod config;
pub mod empty;
pub mod error;
pub mod geometry;
pub mod hint;
pub mod instance;
pub mod object;
pub mod primitive;
pub mod rt;
pub mod traits;
pub mod tree;

/// Re-exports the crate's public surface for `use raytrace_accel::prelude::*;`.
pub mod prelude {
    pub use crate::api::{
        add, bb, create_bih, create_bvh, create_empty, create_instance, create_kdop_bvh, create_octree,
        create_svbvh, create_vbvh, done, intersect, raycast,
    };
    pub use crate::config::*;
    pub use crate::empty::Empty;
    pub use crate::error::{AccelError, GeometryError, NumericError, OctreeError, Result, TransformationError, TreeError};
    pub use crate::geometry::{Aabb, Quad, Triangle};
    pub use crate::hint::TraversalHint;
    pub use crate::instance::Instance;
    pub use crate::object::{CachedHit, RayObject, Tag};
    pub use crate::primitive::{Primitive, PrimitiveGeometry};
    pub use crate::rt::{CheckFlags, FaceHandle, Hit, ObjectHandle, Ray, RayMode, RayObjectId, RayState, SkipFlags};
    pub use crate::traits::{ApiNode, Bounded, CancelToken, FallibleNumeric, Traceable};
    pub use crate::tree::{Bih, Bvh, BvhConfig, KdopBvh, LaneBounds, Octree, OctreeConfig, Svbvh, Vbvh};
}
