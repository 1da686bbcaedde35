//! Mutable per-query ray state threaded through tree traversal.

use nalgebra::RealField;
use std::any::Any;

use crate::{
    hint::TraversalHint,
    object::CachedHit,
    rt::{
        handles::{FaceHandle, ObjectHandle},
        hit::Hit,
        mode::{CheckFlags, RayMode, SkipFlags},
        ray::Ray,
    },
};

/// Identifies the face a ray is leaving, used to suppress self-intersection
/// and to drive the `skip-vlr-neighbour` near-hit re-test.
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginInfo {
    pub object: Option<ObjectHandle>,
    pub face: Option<FaceHandle>,
}

/// Everything a tree traversal needs beyond the geometric [`Ray`] itself.
///
/// Built once per query and passed by `&mut` reference down every recursive
/// call; trees read the ray and flags, and write `hit`/`last_hit` as they go.
pub struct RayState<'a, T: RealField + Copy> {
    pub ray: Ray<T>,
    pub max_distance: T,
    pub mode: RayMode,
    pub layer_mask: u32,
    pub skip: SkipFlags,
    pub check: CheckFlags,
    pub render_check: Option<&'a dyn Fn(ObjectHandle) -> bool>,
    /// Caller-supplied solidity predicate, consulted by
    /// [`crate::primitive::Primitive::raycast`] whenever
    /// `SkipFlags::VLR_NON_SOLID_MATERIAL` or `CheckFlags::SOLID_MATERIAL`
    /// is set (§4.1's "skip-vlr-non-solid-material discards non-solid
    /// materials"). `None` with either flag set means every material is
    /// treated as solid, matching the render-check predicate's default.
    pub solid_material: Option<&'a dyn Fn(ObjectHandle) -> bool>,
    pub user_data: Option<&'a dyn Any>,
    pub hit: Option<Hit<T>>,
    pub origin: OriginInfo,
    /// The specific primitive or node that produced the most recent hit, for
    /// shadow-ray replay on a subsequent query against the same scene (§4.3).
    /// Named at leaf granularity when the hit was a bare primitive, so the
    /// common case re-tests a single face rather than the whole tree it came
    /// from.
    ///
    /// This is a raw pointer rather than an id-and-lookup-table because the
    /// trees a [`RayState`] is cast against are immutable for the lifetime of
    /// any query: a `RayState` only ever borrows a ray-object, never owns one
    /// (see the crate's ownership invariants), so a pointer captured during
    /// one query is still valid when dereferenced during the next, as long as
    /// the caller keeps the scene alive -- exactly the same lifetime the
    /// caller already has to uphold for `raycast`/`intersect` to be callable
    /// at all.
    pub last_hit: Option<CachedHit<T>>,
    pub hint: Option<TraversalHint<T>>,
}

impl<'a, T: RealField + Copy> RayState<'a, T> {
    /// Begin a new query along `ray`, considering hits no farther than `max_distance`.
    pub fn new(ray: Ray<T>, max_distance: T, mode: RayMode) -> Self {
        Self {
            ray,
            max_distance,
            mode,
            layer_mask: u32::MAX,
            skip: SkipFlags::NONE,
            check: CheckFlags::NONE,
            render_check: None,
            solid_material: None,
            user_data: None,
            hit: None,
            origin: OriginInfo::default(),
            last_hit: None,
            hint: None,
        }
    }

    #[must_use]
    pub fn with_skip(mut self, skip: SkipFlags) -> Self {
        self.skip = skip;
        self
    }

    #[must_use]
    pub fn with_check(mut self, check: CheckFlags) -> Self {
        self.check = check;
        self
    }

    #[must_use]
    pub fn with_origin(mut self, object: ObjectHandle, face: FaceHandle) -> Self {
        self.origin = OriginInfo {
            object: Some(object),
            face: Some(face),
        };
        self
    }

    #[must_use]
    pub fn with_render_check(mut self, predicate: &'a dyn Fn(ObjectHandle) -> bool) -> Self {
        self.render_check = Some(predicate);
        self.skip = self.skip | SkipFlags::VLR_RENDER_CHECK;
        self
    }

    /// Discard primitives whose owning object is not a solid material,
    /// per §4.1's `skip-vlr-non-solid-material`.
    #[must_use]
    pub fn with_solid_material_check(mut self, predicate: &'a dyn Fn(ObjectHandle) -> bool) -> Self {
        self.solid_material = Some(predicate);
        self.skip = self.skip | SkipFlags::VLR_NON_SOLID_MATERIAL;
        self
    }

    /// The farthest distance still worth testing: the caller's limit, tightened
    /// to the closest hit recorded so far.
    pub fn search_distance(&self) -> T {
        self.hit.as_ref().map_or(self.max_distance, |hit| hit.distance)
    }

    /// Record `hit` as the new closest intersection found so far.
    pub fn record(&mut self, hit: Hit<T>) {
        self.hit = Some(hit);
    }

    /// Whether the query can stop as soon as any blocking hit is found.
    pub fn is_shadow(&self) -> bool {
        self.mode == RayMode::Shadow
    }
}
