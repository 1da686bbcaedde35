//! Tagged ray-object dispatch.
//!
//! The original engine packs a discriminant into the low bits of an aligned
//! pointer (`RayObject_align`/`RayObject_unalignRayFace`/`RayObject_unalignAPI`
//! in `rayobject.h`): a primitive face, or a node behind a capability-table
//! vtable. Rust has no need for the pointer trick -- an enum already carries
//! its own discriminant -- so [`RayObject`] is the direct translation: the tag
//! the C code computed from two stolen bits is simply `std::mem::discriminant`
//! here, always valid, never requiring the caller to mask anything out.

use nalgebra::RealField;
use std::borrow::Cow;

use crate::{
    error::Result,
    geometry::Aabb,
    hint::TraversalHint,
    primitive::Primitive,
    rt::{RayObjectId, RayState},
    traits::{ApiNode, CancelToken},
};

/// Which variant a [`RayObject`] holds, mirroring the two live tag values of
/// the original pointer scheme (`RayObject_isRayFace`/`RayObject_isRayAPI`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Primitive,
    Node,
}

/// A single entry in a tree: either a leaf primitive, or a nested node behind
/// the [`ApiNode`] capability table (a tree, an instance wrapper, or the
/// always-miss empty node).
pub enum RayObject<T: RealField + Copy> {
    Primitive(Primitive<T>),
    Node(Box<dyn ApiNode<T>>),
}

/// What a successful query last hit, named at whatever granularity the hit
/// actually occurred at: a single leaf primitive, or (when the hit came from
/// inside a nested node without bubbling up a specific leaf) that node.
///
/// Raw pointers rather than `RayObjectId` or `Arc` for the same reason as
/// [`crate::hint::TraversalHint`]: the referent is owned by a tree that has
/// already finished building and outlives every query run against it, so a
/// thin non-owning pointer costs nothing to store or copy. Naming the
/// primitive directly (rather than only ever the containing node) is what
/// lets shadow-ray coherence actually retest the single occluding face
/// instead of re-walking the whole tree it came from.
#[derive(Clone, Copy)]
pub enum CachedHit<T: RealField + Copy> {
    Primitive(*const Primitive<T>),
    Node(*const dyn ApiNode<T>),
}

impl<T: RealField + Copy> CachedHit<T> {
    /// Re-test the cached referent against `state`'s current ray.
    ///
    /// # Safety
    ///
    /// Sound as long as the tree that produced this `CachedHit` is still
    /// alive, which holds for every caller in this crate: a finished tree is
    /// immutable and a `RayState` never outlives the tree it queries.
    pub(crate) fn raycast(&self, state: &mut RayState<'_, T>) -> Result<bool> {
        match *self {
            Self::Primitive(ptr) => unsafe { &*ptr }.raycast(state),
            Self::Node(ptr) => unsafe { &*ptr }.raycast(state),
        }
    }
}

impl<T: RealField + Copy> RayObject<T> {
    #[must_use]
    pub fn tag(&self) -> Tag {
        match self {
            Self::Primitive(_) => Tag::Primitive,
            Self::Node(_) => Tag::Node,
        }
    }

    #[must_use]
    pub fn bb(&self) -> Cow<'_, Aabb<T>> {
        match self {
            Self::Primitive(primitive) => primitive.aabb(),
            Self::Node(node) => node.bb(),
        }
    }

    pub fn cast(&self, state: &mut RayState<'_, T>) -> Result<bool> {
        match self {
            Self::Primitive(primitive) => {
                let found = primitive.raycast(state)?;
                if found {
                    state.last_hit = Some(CachedHit::Primitive(primitive as *const Primitive<T>));
                }
                Ok(found)
            }
            Self::Node(node) => {
                let found = node.raycast(state)?;
                if found {
                    state.last_hit = Some(CachedHit::Node(node.as_ref() as *const dyn ApiNode<T>));
                }
                Ok(found)
            }
        }
    }

    pub fn hint_bb(&self, bb: &Aabb<T>, hint: &mut TraversalHint<T>) {
        if let Self::Node(node) = self {
            node.hint_bb(bb, hint);
        }
    }

    /// A process-unique identity for a nested node, exposed for diagnostics
    /// and equality checks. Primitives carry no id of their own.
    #[must_use]
    pub fn id(&self) -> Option<RayObjectId> {
        match self {
            Self::Primitive(_) => None,
            Self::Node(node) => Some(node.id()),
        }
    }

    pub(crate) fn done_inner(&mut self, cancel: &CancelToken) -> Result<()> {
        if let Self::Node(node) = self {
            node.done(cancel)?;
        }
        Ok(())
    }
}
