//! Traversal hint: a fixed-capacity record of "recently useful" subtrees.
//!
//! Grounded in `rayobject_hint.h`'s 256-entry hint stack: descending into a
//! sub-node whose bounds fully contain the box of interest is a
//! `HINT_RECURSE`, recording a non-containing node along the way is a
//! `HINT_ACCEPT`. Omitting the hint (an empty stack, or simply not seeding
//! one) must never change which primitives a query can reach -- it is a
//! pure accelerant, folded in here as a fixed-size array rather than a
//! dependency on a small-vector crate, since 256 handles is cheap to inline.
//!
//! Entries are raw `*const dyn ApiNode<T>` pointers to the concrete nested
//! node accepted, for the same reason `RayState::last_hit` is also a raw
//! pointer: the scene a hint was seeded against is immutable and outlives
//! every query run against it. Only a node actually implementing [`ApiNode`]
//! can be named this way, so a hint can only ever point at a whole tree, an
//! instance wrapper, or a nested node embedded inside a leaf -- never at a
//! bare primitive, or a plain (non-dyn) internal node of a tree's own
//! private structure. That is a coarser granularity than the original's
//! per-node hint (and than `last_hit`, which can name a primitive directly),
//! recorded here rather than silently: it costs some potential sharpness of
//! the accelerant, never correctness.

use nalgebra::RealField;

use crate::{
    config::HINT_CAPACITY,
    error::{Result, TreeError},
    geometry::Aabb,
    object::RayObject,
    traits::ApiNode,
};

/// A fixed-capacity stack of node pointers accepted as relevant to a
/// particular bounding volume of interest.
pub struct TraversalHint<T: RealField + Copy> {
    entries: [Option<*const dyn ApiNode<T>>; HINT_CAPACITY],
    len: usize,
}

impl<T: RealField + Copy> Default for TraversalHint<T> {
    fn default() -> Self {
        Self {
            entries: [None; HINT_CAPACITY],
            len: 0,
        }
    }
}

impl<T: RealField + Copy> TraversalHint<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `node` as accepted (`HINT_ACCEPT`). Errs if the fixed capacity
    /// is exhausted; callers should treat this as "stop seeding", not as a
    /// query failure.
    pub fn accept(&mut self, node: *const dyn ApiNode<T>) -> Result<()> {
        if self.len == self.entries.len() {
            return Err(TreeError::HintOverflow {
                capacity: self.entries.len(),
            }
            .into());
        }
        self.entries[self.len] = Some(node);
        self.len += 1;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = *const dyn ApiNode<T>> + '_ {
        self.entries[..self.len].iter().filter_map(|entry| *entry)
    }
}

/// Seed `hint` by descending `root`: a node whose bounds are fully contained by
/// `bb` is accepted outright (`HINT_ACCEPT`); one that only overlaps `bb`
/// recurses into its children (`HINT_RECURSE`), relying on `RayObject::hint_bb`
/// to keep walking.
pub fn seed<T: RealField + Copy>(root: &RayObject<T>, bb: &Aabb<T>, hint: &mut TraversalHint<T>) {
    root.hint_bb(bb, hint);
}

fn contains<T: RealField + Copy>(outer: &Aabb<T>, inner: &Aabb<T>) -> bool {
    outer.mins.x <= inner.mins.x
        && outer.mins.y <= inner.mins.y
        && outer.mins.z <= inner.mins.z
        && outer.maxs.x >= inner.maxs.x
        && outer.maxs.y >= inner.maxs.y
        && outer.maxs.z >= inner.maxs.z
}

fn overlaps<T: RealField + Copy>(a: &Aabb<T>, b: &Aabb<T>) -> bool {
    a.mins.x <= b.maxs.x
        && a.maxs.x >= b.mins.x
        && a.mins.y <= b.maxs.y
        && a.maxs.y >= b.mins.y
        && a.mins.z <= b.maxs.z
        && a.maxs.z >= b.mins.z
}

/// Helper used by concrete trees' `hint_bb` implementations: decide whether a
/// child node should be accepted wholesale, recursed into, or skipped.
pub enum HintAction {
    Accept,
    Recurse,
    Skip,
}

/// Per spec §4.7: a sub-node that still fully contains the box of interest
/// is too coarse to be useful on its own -- descend further looking for a
/// tighter container (`HINT_RECURSE`). One that overlaps but does not fully
/// contain the box is exactly the kind of non-containing node the DFS
/// records directly (`HINT_ACCEPT`); one that does not overlap at all is
/// irrelevant to this box of interest (`Skip`).
#[must_use]
pub fn classify<T: RealField + Copy>(child_bb: &Aabb<T>, bb: &Aabb<T>) -> HintAction {
    if !overlaps(child_bb, bb) {
        HintAction::Skip
    } else if contains(child_bb, bb) {
        HintAction::Recurse
    } else {
        HintAction::Accept
    }
}
