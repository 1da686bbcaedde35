//! Adapter tree standing in for the original engine's separate K-DOP BVH
//! library (`rayobject_blibvh.cpp` delegates every `RayObjectAPI` call through
//! to that external library's own tree type). This crate has no second BVH
//! implementation to delegate to, so the adapter wraps the crate's own
//! [`Bvh`](super::bvh::Bvh) -- it contributes only the adapter, per the
//! "library-provided BVH" description, while keeping `create_kdop_bvh` a
//! distinct, stably-named constructible tree kind.

use nalgebra::RealField;
use std::borrow::Cow;

use crate::{
    error::Result,
    geometry::Aabb,
    hint::TraversalHint,
    object::RayObject,
    rt::{RayObjectId, RayState},
    traits::{ApiNode, CancelToken},
};

use super::{bvh::Bvh, bvh_config::BvhConfig};

pub struct KdopBvh<T: RealField + Copy>(Bvh<T>);

impl<T: RealField + Copy> KdopBvh<T> {
    #[must_use]
    pub fn new(config: BvhConfig) -> Self {
        Self(Bvh::new(config))
    }
}

impl<T: RealField + Copy> Default for KdopBvh<T> {
    fn default() -> Self {
        Self(Bvh::default())
    }
}

impl<T: RealField + Copy> ApiNode<T> for KdopBvh<T> {
    fn raycast(&self, state: &mut RayState<'_, T>) -> Result<bool> {
        self.0.raycast(state)
    }

    fn add(&mut self, object: RayObject<T>) -> Result<()> {
        self.0.add(object)
    }

    fn done(&mut self, cancel: &CancelToken) -> Result<()> {
        self.0.done(cancel)
    }

    fn bb(&self) -> Cow<'_, Aabb<T>> {
        self.0.bb()
    }

    fn cost(&self) -> T {
        self.0.cost()
    }

    fn hint_bb(&self, bb: &Aabb<T>, hint: &mut TraversalHint<T>) {
        self.0.hint_bb(bb, hint);
    }

    fn id(&self) -> RayObjectId {
        self.0.id()
    }
}
