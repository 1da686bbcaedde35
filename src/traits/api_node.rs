//! The capability table every concrete tree and instance wrapper implements.
//!
//! Mirrors `RayObjectAPI` (`rayobject.h`): a fixed set of operations --
//! `raycast`, `add`, `done`, `bb`, `cost`, and an optional `hint_bb` -- that
//! let [`crate::object::RayObject`] dispatch without knowing which concrete
//! tree it holds. `free` has no method here: dropping the owning `RayObject`
//! frees the subtree, which is what `Drop` is for.

use nalgebra::RealField;
use std::borrow::Cow;

use crate::{
    error::Result,
    geometry::Aabb,
    hint::TraversalHint,
    object::RayObject,
    rt::{RayObjectId, RayState},
};

/// A cooperative cancellation flag, polled at safe points during `done`.
#[derive(Clone, Default)]
pub struct CancelToken(std::sync::Arc<std::sync::atomic::AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, std::sync::atomic::Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// The capability table of a ray-object node: a tree, an instance wrapper, or the
/// always-miss empty node.
pub trait ApiNode<T: RealField + Copy>: Send + Sync {
    /// Find the nearest (primary) or any (shadow) intersection along `state.ray`.
    ///
    /// Returns whether a qualifying hit was recorded into `state.hit`.
    fn raycast(&self, state: &mut RayState<'_, T>) -> Result<bool>;

    /// Insert `object` into this node. Only valid before [`ApiNode::done`].
    fn add(&mut self, object: RayObject<T>) -> Result<()>;

    /// Finalise construction, making the node ready for queries.
    fn done(&mut self, cancel: &CancelToken) -> Result<()>;

    /// The node's world-space bounding box.
    fn bb(&self) -> Cow<'_, Aabb<T>>;

    /// The relative traversal cost of this node, used by SAH split evaluation
    /// of an enclosing tree.
    fn cost(&self) -> T;

    /// Extend `hint` with this node's children that overlap `bb`, for the
    /// optional traversal-hint acceleration of §4.7. The default no-op is
    /// always a valid implementation.
    fn hint_bb(&self, _bb: &Aabb<T>, _hint: &mut TraversalHint<T>) {}

    /// A process-unique id, recorded by [`RayState::record`] as the `last_hit`.
    fn id(&self) -> RayObjectId;
}
