//! N-ary (binary) surface-area-heuristic BVH.
//!
//! Generalises the teacher's `Bvh`/`BvhNode`/`BvhBuilder` (a flat
//! `Vec<BvhNode<T>>` arena built by centroid bucketing) to build from the
//! shared exact-sweep [`TreeBuilder`] instead, per §4.4. The recursive build
//! shape -- accumulate a leaf once a range is small enough or no split beats
//! the leaf cost, otherwise partition and recurse -- is kept from the
//! teacher.

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

enum Node<T: RealField + Copy> {
    Leaf {
        bb: Aabb<T>,
        objects: Vec<RayObject<T>>,
    },
    Internal {
        bb: Aabb<T>,
        axis: usize,
        left: Box<Node<T>>,
        right: Box<Node<T>>,
    },
}

impl<T: RealField + Copy> Node<T> {
    fn bb(&self) -> &Aabb<T> {
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
            Self::Internal { axis, left, right, .. } => {
                let (near, far) = if state.ray.sign[*axis] == 0 {
                    (left.as_ref(), right.as_ref())
                } else {
                    (right.as_ref(), left.as_ref())
                };
                let mut found = near.raycast(state)?;
                if found && state.is_shadow() {
                    return Ok(true);
                }
                found |= far.raycast(state)?;
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
                Self::Internal { left, right, .. } => {
                    left.hint_bb(query, hint, self_ptr);
                    right.hint_bb(query, hint, self_ptr);
                }
                Self::Leaf { objects, .. } => {
                    for object in objects {
                        object.hint_bb(query, hint);
                    }
                }
            },
        }
    }
}

fn build<T: RealField + Copy>(
    builder: &mut TreeBuilder<T>,
    range: std::ops::Range<usize>,
    config: &BvhConfig,
    depth: usize,
) -> Node<T> {
    let bb = builder.range_bb(range.clone());

    if range.len() <= config.max_shapes_per_leaf || depth >= config.max_depth {
        return leaf(builder, range, bb);
    }

    match builder.split_sah(range.clone()) {
        Some(split) => {
            let axis = split.axis;
            let (left_range, right_range) = builder.partition(range, split);
            let left = build(builder, left_range, config, depth + 1);
            let right = build(builder, right_range, config, depth + 1);
            Node::Internal {
                bb,
                axis,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        None => leaf(builder, range, bb),
    }
}

fn leaf<T: RealField + Copy>(builder: &mut TreeBuilder<T>, range: std::ops::Range<usize>, bb: Aabb<T>) -> Node<T> {
    let indices: Vec<usize> = builder.axis_view(0, range).to_vec();
    let objects = indices.into_iter().map(|index| builder.take(index)).collect();
    Node::Leaf { bb, objects }
}

/// A standalone, self-contained bounding volume hierarchy: `create_bvh` in §6.
pub struct Bvh<T: RealField + Copy> {
    config: BvhConfig,
    builder: Option<TreeBuilder<T>>,
    root: Option<Node<T>>,
    id: RayObjectId,
}

impl<T: RealField + Copy> Bvh<T> {
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

impl<T: RealField + Copy> Default for Bvh<T> {
    fn default() -> Self {
        Self::new(BvhConfig::default())
    }
}

impl<T: RealField + Copy> ApiNode<T> for Bvh<T> {
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
        self.root = Some(build(&mut builder, 0..n, &self.config, 0));
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
