//! Instance wrapper: places an already-built ray-object under a world-to-local
//! transform, per §4.6.
//!
//! Grounded in the teacher's `scene/instance.rs`: the same save-transform-
//! dispatch-restore shape, generalised from a fixed `&'a Mesh<T>` target to an
//! arbitrary shared [`RayObject<T>`] (so an instance can wrap a whole tree, a
//! bare primitive, or another instance) and from a `Scene`-specific hit type
//! to the crate's own [`crate::rt::Hit`]. The target is held behind an `Arc`
//! rather than a borrow: a `RayObject::Node` is boxed as `dyn ApiNode<T>`,
//! which Rust gives an implicit `'static` bound, and the usual instancing
//! motivation -- many instances sharing one built tree -- is exactly what
//! `Arc` is for; [`crate::traits::CancelToken`] already reaches for it in
//! this crate for the same reason (shared, cheaply-cloned, immutable data).

use nalgebra::{Matrix4, RealField, Unit};
use std::{borrow::Cow, sync::Arc};

use crate::{
    error::{Result, TransformationError, TreeError},
    geometry::Aabb,
    hint::{self, HintAction, TraversalHint},
    object::RayObject,
    rt::{ObjectHandle, Ray, RayObjectId, RayState},
    traits::{ApiNode, CancelToken},
};

/// A ray-object wrapped by a world-to-local affine transform.
///
/// `add` and `done` are disabled (the wrapper is not itself buildable): the
/// target must already be a finished ray-object by the time it is handed to
/// [`Instance::new`].
pub struct Instance<T: RealField + Copy> {
    target: Arc<RayObject<T>>,
    world_to_local: Matrix4<T>,
    normal_transform: Matrix4<T>,
    world_bb: Aabb<T>,
    owner_object: ObjectHandle,
    owner_target_object: ObjectHandle,
    id: RayObjectId,
}

impl<T: RealField + Copy> Instance<T> {
    /// Wrap `target` under `local_to_world`. A ray hitting the instance is
    /// reported with `owner_object`; a ray leaving the instance through one of
    /// its own faces has its self-intersection origin rewritten to
    /// `owner_target_object`, the handle `target`'s own primitives were built
    /// with.
    ///
    /// # Errors
    ///
    /// Returns an error if `local_to_world` is not invertible.
    pub fn new(
        target: Arc<RayObject<T>>,
        local_to_world: Matrix4<T>,
        owner_object: ObjectHandle,
        owner_target_object: ObjectHandle,
    ) -> Result<Self> {
        let world_to_local = local_to_world
            .try_inverse()
            .ok_or(TransformationError::NonInvertibleMatrix)?;
        let normal_transform = world_to_local.transpose();
        let world_bb = target.bb().transform(&local_to_world);

        Ok(Self {
            target,
            world_to_local,
            normal_transform,
            world_bb,
            owner_object,
            owner_target_object,
            id: RayObjectId::next(),
        })
    }
}

impl<T: RealField + Copy> ApiNode<T> for Instance<T> {
    fn raycast(&self, state: &mut RayState<'_, T>) -> Result<bool> {
        // 1. Save everything the dispatch into local space is about to overwrite.
        let saved_ray = state.ray.clone();
        let saved_max_distance = state.max_distance;
        let saved_hit = state.hit.take();
        let saved_origin_object = state.origin.object;

        // 2. A ray leaving this instance's own surface must not immediately
        // re-hit the target's geometry at the origin face.
        state.origin.object = Some(self.owner_target_object);

        // 3. Transform the ray into the target's local space. The direction is
        // not renormalised, so its length carries the local/world distance
        // ratio; a local hit distance times that length is the world distance.
        let local_origin = self.world_to_local.transform_point(&saved_ray.origin);
        let local_direction_raw = self.world_to_local.transform_vector(&saved_ray.direction.into_inner());
        let length = local_direction_raw.norm();
        if length <= T::zero() || !length.is_finite() {
            state.ray = saved_ray;
            state.max_distance = saved_max_distance;
            state.hit = saved_hit;
            state.origin.object = saved_origin_object;
            return Ok(false);
        }
        let local_direction = Unit::new_unchecked(local_direction_raw / length);

        let world_search = saved_hit.as_ref().map_or(saved_max_distance, |hit| hit.distance);

        // 4. Recompute the cached slab-test direction/sign for the new ray.
        // A local hit parameter is a world distance divided by `length`
        // (the local ray direction is unit length), so the search ceiling
        // converts the other way: multiply by `length`.
        state.ray = Ray::new(local_origin, local_direction);
        state.max_distance = world_search * length;
        state.hit = None;

        // 5. Dispatch into the wrapped target.
        let found = self.target.cast(state)?;

        // 6. Convert a local hit back into world space, and rewrite its owner
        // to this instance, restoring the caller's prior hit on a miss.
        if found {
            if let Some(mut hit) = state.hit.take() {
                hit.distance /= length;
                hit.geometric_normal =
                    Unit::new_normalize(self.normal_transform.transform_vector(&hit.geometric_normal.into_inner()));
                hit.interpolated_normal =
                    Unit::new_normalize(self.normal_transform.transform_vector(&hit.interpolated_normal.into_inner()));
                hit.object = Some(self.owner_object);
                state.hit = Some(hit);
            }
        } else {
            state.hit = saved_hit;
        }

        // 7. Restore the ray and origin regardless of outcome.
        state.ray = saved_ray;
        state.max_distance = saved_max_distance;
        state.origin.object = saved_origin_object;

        Ok(found)
    }

    fn add(&mut self, _object: RayObject<T>) -> Result<()> {
        Err(TreeError::NotBuildable.into())
    }

    fn done(&mut self, _cancel: &CancelToken) -> Result<()> {
        Err(TreeError::NotBuildable.into())
    }

    fn bb(&self) -> Cow<'_, Aabb<T>> {
        Cow::Borrowed(&self.world_bb)
    }

    fn cost(&self) -> T {
        self.target.bb().surface_area()
    }

    fn hint_bb(&self, bb: &Aabb<T>, hint: &mut TraversalHint<T>) {
        // The instance's local-space target has no meaningful relationship to
        // a world-space query box, so hinting stops here: either this whole
        // instance is worth recording, or it isn't.
        match hint::classify(&self.world_bb, bb) {
            HintAction::Skip => {}
            HintAction::Accept | HintAction::Recurse => {
                let _ = hint.accept(self as *const dyn ApiNode<T>);
            }
        }
    }

    fn id(&self) -> RayObjectId {
        self.id
    }
}
