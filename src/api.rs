//! The public entry points of §6: thin constructors over each tree kind and
//! dispatch wrappers around the tagged [`RayObject`] handle, mirroring the
//! original's flat operation table (`create_octree`, `add`, `done`,
//! `raycast`, `intersect`, `bb`). There is no `free`: dropping the owning
//! `RayObject` frees the subtree, which is what `Drop` already does.

use nalgebra::{Matrix4, RealField};
use num_traits::ToPrimitive;
use std::sync::Arc;

use crate::{
    empty::Empty,
    error::{Result, TreeError},
    geometry::Aabb,
    instance::Instance,
    object::RayObject,
    rt::{ObjectHandle, RayState},
    traits::{ApiNode, CancelToken},
    tree::{Bih, Bvh, BvhConfig, KdopBvh, Octree, OctreeConfig, Svbvh, Vbvh},
};

/// Build an empty octree ready to `add` primitives into, at one of the fixed
/// resolutions in [`crate::config::OCTREE_RESOLUTIONS`].
pub fn create_octree<T: RealField + Copy + ToPrimitive>(config: OctreeConfig) -> Result<RayObject<T>> {
    Ok(RayObject::Node(Box::new(Octree::new(config)?)))
}

/// Build an empty standalone binary SAH BVH.
pub fn create_bvh<T: RealField + Copy>(config: BvhConfig) -> RayObject<T> {
    RayObject::Node(Box::new(Bvh::new(config)))
}

/// Build an empty variable-fanout BVH.
pub fn create_vbvh<T: RealField + Copy>(config: BvhConfig) -> RayObject<T> {
    RayObject::Node(Box::new(Vbvh::new(config)))
}

/// Build an empty SIMD-lane-packed BVH.
pub fn create_svbvh<T: RealField + Copy>(config: BvhConfig) -> RayObject<T> {
    RayObject::Node(Box::new(Svbvh::new(config)))
}

/// Build an empty 4-way bounding interval hierarchy.
pub fn create_bih<T: RealField + Copy>(config: BvhConfig) -> RayObject<T> {
    RayObject::Node(Box::new(Bih::new(config)))
}

/// Build an empty library-provided ("k-dop") BVH adapter.
pub fn create_kdop_bvh<T: RealField + Copy>(config: BvhConfig) -> RayObject<T> {
    RayObject::Node(Box::new(KdopBvh::new(config)))
}

/// Build the always-miss sentinel node.
#[must_use]
pub fn create_empty<T: RealField + Copy>() -> RayObject<T> {
    RayObject::Node(Box::new(Empty::new()))
}

/// Wrap an already-finished `target` under `local_to_world`, per §4.6. The
/// target is shared (`Arc`) rather than owned outright, so the same built
/// tree can back many instances at different transforms.
///
/// # Errors
///
/// Returns an error if `local_to_world` is not invertible.
pub fn create_instance<T: RealField + Copy>(
    target: Arc<RayObject<T>>,
    local_to_world: Matrix4<T>,
    owner_object: ObjectHandle,
    owner_target_object: ObjectHandle,
) -> Result<RayObject<T>> {
    Ok(RayObject::Node(Box::new(Instance::new(
        target,
        local_to_world,
        owner_object,
        owner_target_object,
    )?)))
}

/// Insert `object` into `tree`. Only valid before [`done`].
pub fn add<T: RealField + Copy>(tree: &mut RayObject<T>, object: RayObject<T>) -> Result<()> {
    match tree {
        RayObject::Node(node) => node.add(object),
        RayObject::Primitive(_) => Err(TreeError::NotBuildable.into()),
    }
}

/// Finalise `tree`, making it ready for queries.
pub fn done<T: RealField + Copy>(tree: &mut RayObject<T>, cancel: &CancelToken) -> Result<()> {
    match tree {
        RayObject::Node(node) => node.done(cancel),
        RayObject::Primitive(_) => Ok(()),
    }
}

/// Find the nearest (primary) or any (shadow) intersection along `state.ray`,
/// consulting the shadow-ray last-hit cache and any seeded traversal hint
/// before falling through to a full traversal of `tree`, per §4.3/§4.7.
///
/// # Safety
///
/// The pointers cached in `state.last_hit` and `state.hint` are only ever
/// produced by a prior call with this same `tree` (or a scene containing it)
/// still alive; dereferencing them here is sound under that same caller
/// contract `tree: &RayObject<T>` already requires.
pub fn raycast<T: RealField + Copy>(tree: &RayObject<T>, state: &mut RayState<'_, T>) -> Result<bool> {
    if state.is_shadow() {
        if let Some(cached) = state.last_hit {
            if cached.raycast(state)? {
                return Ok(true);
            }
        }
    }

    if let Some(hint) = state.hint.take() {
        for ptr in hint.iter() {
            let node = unsafe { &*ptr };
            if node.raycast(state)? && state.is_shadow() {
                state.hint = Some(hint);
                return Ok(true);
            }
        }
        state.hint = Some(hint);
    }

    // A primary ray's search distance is already tightened by any hint hits
    // above; still fall through so a closer primitive the hint didn't name
    // can be found.
    tree.cast(state)
}

/// Dispatch `tree` against `state.ray` without consulting or updating the
/// shadow-ray last-hit cache, per §4.3's plain `intersect` entry point.
pub fn intersect<T: RealField + Copy>(tree: &RayObject<T>, state: &mut RayState<'_, T>) -> Result<bool> {
    let saved = state.last_hit.take();
    let result = tree.cast(state);
    state.last_hit = saved;
    result
}

/// The world-space bounding box of `tree`.
#[must_use]
pub fn bb<T: RealField + Copy>(tree: &RayObject<T>) -> Aabb<T> {
    tree.bb().into_owned()
}
