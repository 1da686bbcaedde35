//! Tunable defaults shared by every tree kind's `*Config` struct.

/// Relative estimated cost of traversing an internal tree node.
pub const DEFAULT_TRAVERSE_COST: f64 = 1.0;
/// Relative estimated cost of performing a ray-primitive intersection test.
pub const DEFAULT_INTERSECT_COST: f64 = 1.25;
/// Reserved for a bucketed-SAH fallback on very large primitive ranges; the
/// current `builder::TreeBuilder::split_sah` always runs the exact sweep and
/// does not yet consult this value.
pub const DEFAULT_SAH_BUCKETS: usize = 16;
/// Maximum number of primitives per leaf before a tree attempts to split further.
pub const DEFAULT_MAX_SHAPES_PER_NODE: usize = 4;
/// Maximum recursion depth of a built tree.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Per-axis voxel resolutions the octree may be constructed with.
pub const OCTREE_RESOLUTIONS: [usize; 5] = [32, 64, 128, 256, 512];
/// Default octree resolution when the caller has no better estimate.
pub const DEFAULT_OCTREE_RESOLUTION: usize = 128;

/// Fixed capacity of a [`crate::hint::TraversalHint`] stack.
pub const HINT_CAPACITY: usize = 256;

/// World-space distance within which a ray leaving a face is allowed to
/// re-strike geometry sharing that face's handle, when
/// `SkipFlags::VLR_NEIGHBOUR` is set. Scene-scale dependent; override per
/// scene via `RayState` if the default does not suit.
pub const NEIGHBOUR_EPSILON: f64 = 0.1;

/// Number of children fanned out by the BIH tree at each internal node.
pub const BIH_FANOUT: usize = 4;
/// Number of lanes packed per SV-BVH node.
pub const SVBVH_LANES: usize = 4;
