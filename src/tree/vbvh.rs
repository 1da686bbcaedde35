//! Variable-fanout BVH (left-child/sibling representation).
//!
//! Built the same way as [`super::bvh::Bvh`] -- recursive exact-sweep SAH --
//! and then reorganized in a single post-build pass grounded in
//! `reorganize.h`'s three named transforms:
//!
//! - *remove-useless*: an internal node with a single child contributes
//!   nothing over its child directly, so it is spliced out.
//! - *push-down*: an internal child whose own bounding box is not meaningfully
//!   tighter than its parent's is flattened into the parent's child list,
//!   trading one fewer traversal step for a wider fan-out.
//! - *push-up* is the dual of push-down (promoting a deeply nested lone
//!   grandchild back up a level) and falls out of applying remove-useless and
//!   push-down repeatedly to a fixpoint, which is what the pass below does.
//!
//! A left-child/next-sibling *pointer chain* has no well-typed safe Rust
//! translation as a chain of raw links; a `Vec` of owned children is the
//! idiomatic equivalent -- same variable fan-out, same traversal order, no
//! unsafe pointer splicing.

use nalgebra::RealField;
use std::borrow::Cow;

use crate::{
    builder::TreeBuilder,
    error::{Result, TreeError},
    geometry::Aabb,
    hint::{self, HintAction, TraversalHint},
    object::RayObject,
    rt::{RayObjectId, RayState},
    traits::{ApiNode, Bounded, CancelToken},
};

type NodePtr<T> = *const dyn ApiNode<T>;

use super::bvh_config::BvhConfig;

/// Crate-visible so [`super::svbvh`] can seal a built, reorganized tree of
/// these into its own lane-packed node layout without re-running the build.
pub(crate) enum Node<T: RealField + Copy> {
    Leaf {
        bb: Aabb<T>,
        objects: Vec<RayObject<T>>,
    },
    Internal {
        bb: Aabb<T>,
        children: Vec<Node<T>>,
    },
}

impl<T: RealField + Copy> Node<T> {
    pub(crate) fn bb(&self) -> &Aabb<T> {
        match self {
            Self::Leaf { bb, .. } | Self::Internal { bb, .. } => bb,
        }
    }

    fn raycast(&self, state: &mut RayState<'_, T>) -> Result<bool> {
        if self.bb().intersect_distance(&state.ray).is_none_or(|d| d > state.search_distance()) {
            return Ok(false);
        }

        match self {
            Self::Leaf { objects, .. } => {
                let mut found = false;
                for object in objects {
                    if object.cast(state)? {
                        found = true;
                        if state.is_shadow() {
                            return Ok(true);
                        }
                    }
                }
                Ok(found)
            }
            Self::Internal { children, .. } => {
                let mut found = false;
                for child in children {
                    if child.raycast(state)? {
                        found = true;
                        if state.is_shadow() {
                            return Ok(true);
                        }
                    }
                }
                Ok(found)
            }
        }
    }

    fn hint_bb(&self, query: &Aabb<T>, hint: &mut TraversalHint<T>, self_ptr: NodePtr<T>) {
        match hint::classify(self.bb(), query) {
            HintAction::Skip => {}
            HintAction::Accept => {
                let _ = hint.accept(self_ptr);
            }
            HintAction::Recurse => match self {
                Self::Internal { children, .. } => {
                    for child in children {
                        child.hint_bb(query, hint, self_ptr);
                    }
                }
                Self::Leaf { objects, .. } => {
                    for object in objects {
                        object.hint_bb(query, hint);
                    }
                }
            },
        }
    }

    /// Reorganize this subtree to a fixpoint: splice out single-child
    /// internal nodes, and flatten internal children whose bounding box is
    /// nearly as large as their parent's into the parent's own child list.
    pub(crate) fn reorganize(self) -> Self {
        match self {
            Self::Leaf { .. } => self,
            Self::Internal { bb, children } => {
                let mut flattened = Vec::with_capacity(children.len());
                for child in children {
                    let child = child.reorganize();
                    match child {
                        Self::Internal {
                            bb: child_bb,
                            children: grandchildren,
                        } if useless_wrapper(&bb, &child_bb) => {
                            flattened.extend(grandchildren);
                        }
                        other => flattened.push(other),
                    }
                }

                if flattened.len() == 1 {
                    return flattened.into_iter().next().unwrap();
                }

                Self::Internal { bb, children: flattened }
            }
        }
    }
}

fn useless_wrapper<T: RealField + Copy>(parent: &Aabb<T>, child: &Aabb<T>) -> bool {
    let ratio_threshold = T::from_f64(0.9).unwrap_or_else(T::one);
    parent.surface_area() <= T::zero() || child.surface_area() / parent.surface_area() > ratio_threshold
}

pub(crate) fn build<T: RealField + Copy>(
    builder: &mut TreeBuilder<T>,
    range: std::ops::Range<usize>,
    config: &BvhConfig,
    depth: usize,
) -> Node<T> {
    let bb = builder.range_bb(range.clone());

    if range.len() <= config.max_shapes_per_leaf || depth >= config.max_depth {
        let indices: Vec<usize> = builder.axis_view(0, range).to_vec();
        let objects = indices.into_iter().map(|index| builder.take(index)).collect();
        return Node::Leaf { bb, objects };
    }

    match builder.split_sah(range.clone()) {
        Some(split) => {
            let (left_range, right_range) = builder.partition(range, split);
            let left = build(builder, left_range, config, depth + 1);
            let right = build(builder, right_range, config, depth + 1);
            Node::Internal {
                bb,
                children: vec![left, right],
            }
        }
        None => {
            let indices: Vec<usize> = builder.axis_view(0, range).to_vec();
            let objects = indices.into_iter().map(|index| builder.take(index)).collect();
            Node::Leaf { bb, objects }
        }
    }
}

/// A variable-fanout BVH: `create_vbvh` in §6.
pub struct Vbvh<T: RealField + Copy> {
    config: BvhConfig,
    builder: Option<TreeBuilder<T>>,
    root: Option<Node<T>>,
    id: RayObjectId,
}

impl<T: RealField + Copy> Vbvh<T> {
    #[must_use]
    pub fn new(config: BvhConfig) -> Self {
        Self {
            config,
            builder: Some(TreeBuilder::new()),
            root: None,
            id: RayObjectId::next(),
        }
    }
}

impl<T: RealField + Copy> Default for Vbvh<T> {
    fn default() -> Self {
        Self::new(BvhConfig::default())
    }
}

impl<T: RealField + Copy> ApiNode<T> for Vbvh<T> {
    fn raycast(&self, state: &mut RayState<'_, T>) -> Result<bool> {
        let Some(root) = &self.root else {
            return Err(TreeError::NotDone.into());
        };
        root.raycast(state)
    }

    fn add(&mut self, object: RayObject<T>) -> Result<()> {
        let Some(builder) = &mut self.builder else {
            return Err(TreeError::AlreadyDone.into());
        };
        builder.add(object)?;
        Ok(())
    }

    fn done(&mut self, cancel: &CancelToken) -> Result<()> {
        let Some(mut builder) = self.builder.take() else {
            return Err(TreeError::AlreadyDone.into());
        };
        builder.done(cancel)?;
        let n = builder.len();
        let root = build(&mut builder, 0..n, &self.config, 0);
        self.root = Some(root.reorganize());
        Ok(())
    }

    fn bb(&self) -> Cow<'_, Aabb<T>> {
        match &self.root {
            Some(root) => Cow::Borrowed(root.bb()),
            None => Cow::Owned(Aabb::empty()),
        }
    }

    fn cost(&self) -> T {
        self.bb().surface_area()
    }

    fn hint_bb(&self, bb: &Aabb<T>, hint: &mut TraversalHint<T>) {
        if let Some(root) = &self.root {
            root.hint_bb(bb, hint, self as *const dyn ApiNode<T>);
        }
    }

    fn id(&self) -> RayObjectId {
        self.id
    }
}
