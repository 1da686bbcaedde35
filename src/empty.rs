//! The always-miss sentinel node, grounded in `rayobject_empty.cpp`: a node
//! that accepts no children, reports a degenerate (inverted) bounding box, and
//! never reports a hit. Used as `create_empty()` and as the builder's
//! placeholder for slots it has already handed out.

use nalgebra::RealField;
use std::borrow::Cow;

use crate::{
    error::{Result, TreeError},
    geometry::Aabb,
    object::RayObject,
    rt::{RayObjectId, RayState},
    traits::{ApiNode, CancelToken},
};

pub struct Empty<T: RealField + Copy> {
    bb: Aabb<T>,
    id: RayObjectId,
}

impl<T: RealField + Copy> Empty<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bb: Aabb::empty(),
            id: RayObjectId::next(),
        }
    }
}

impl<T: RealField + Copy> Default for Empty<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RealField + Copy> ApiNode<T> for Empty<T> {
    fn raycast(&self, _state: &mut RayState<'_, T>) -> Result<bool> {
        Ok(false)
    }

    fn add(&mut self, _object: RayObject<T>) -> Result<()> {
        Err(TreeError::AlreadyDone.into())
    }

    fn done(&mut self, _cancel: &CancelToken) -> Result<()> {
        Ok(())
    }

    fn bb(&self) -> Cow<'_, Aabb<T>> {
        Cow::Borrowed(&self.bb)
    }

    fn cost(&self) -> T {
        T::zero()
    }

    fn id(&self) -> RayObjectId {
        self.id
    }
}
