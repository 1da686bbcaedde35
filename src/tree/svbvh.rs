//! SIMD-lane-packed sealing of a finished [`Vbvh`].
//!
//! Grounded in `svbvh.h`: each node's up-to-four children are copied into
//! parallel per-axis-min/max arrays ("lanes"), padding unused lanes with a
//! bounding box that can never be hit, so a slab test can run as one pass over
//! fixed-size arrays instead of one recursive call per child. The lanes here
//! are plain `[T; SVBVH_LANES]` arrays processed with ordinary loops --
//! auto-vectorization-friendly, and requiring no `wide`/`packed_simd`/
//! `std::simd` dependency the teacher's stack never carries.
//!
//! The seal runs once, in `done`: a [`Vbvh`] is built and reorganized exactly
//! as it would be on its own, then its internal nodes are consumed and
//! re-packed into [`SealedNode`]s whose own `raycast`/`hint_bb` walk the lane
//! arrays directly rather than delegating to `Vbvh`'s per-child recursion. An
//! internal node with more than four children (`Vbvh`'s reorganize pass can
//! widen fan-out past four) is packed into multiple lane groups of up to four
//! children each; the last, possibly partial, group is padded the same way a
//! fully-packed group would be.

use nalgebra::RealField;
use std::borrow::Cow;

use crate::{
    builder::TreeBuilder,
    config::SVBVH_LANES,
    error::{Result, TreeError},
    geometry::Aabb,
    hint::{self, HintAction, TraversalHint},
    object::RayObject,
    rt::{Ray, RayObjectId, RayState},
    traits::{ApiNode, Bounded, CancelToken},
};

use super::{bvh_config::BvhConfig, vbvh};

type NodePtr<T> = *const dyn ApiNode<T>;

/// A sealed, SIMD-friendly summary of one lane group's children: per-axis
/// min/max lanes, padded with an inverted (never-hit) box past `n_children`.
#[derive(Debug, Clone)]
pub struct LaneBounds<T: RealField + Copy> {
    pub mins: [[T; SVBVH_LANES]; 3],
    pub maxs: [[T; SVBVH_LANES]; 3],
    pub n_children: usize,
}

impl<T: RealField + Copy> LaneBounds<T> {
    #[must_use]
    pub fn from_children(children: &[Cow<'_, Aabb<T>>]) -> Self {
        let mut mins = [[T::max_value().unwrap(); SVBVH_LANES]; 3];
        let mut maxs = [[T::min_value().unwrap(); SVBVH_LANES]; 3];
        for (lane, bb) in children.iter().enumerate().take(SVBVH_LANES) {
            for axis in 0..3 {
                mins[axis][lane] = bb.mins[axis];
                maxs[axis][lane] = bb.maxs[axis];
            }
        }
        Self {
            mins,
            maxs,
            n_children: children.len().min(SVBVH_LANES),
        }
    }

    /// Slab-test every lane at once, returning a per-lane hit mask. Lanes past
    /// `n_children` carry an inverted box (`mins > maxs`) and always miss, so
    /// callers need not special-case padding.
    #[must_use]
    pub fn test(&self, ray: &Ray<T>, search_distance: T) -> [bool; SVBVH_LANES] {
        let mut live = [true; SVBVH_LANES];
        let mut t_min = [T::zero(); SVBVH_LANES];
        let mut t_max = [T::max_value().unwrap(); SVBVH_LANES];

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let inv_dir = ray.inv_direction[axis];
            let sign = ray.sign[axis];

            for lane in 0..SVBVH_LANES {
                if !live[lane] {
                    continue;
                }

                let box_min = self.mins[axis][lane];
                let box_max = self.maxs[axis][lane];

                if !inv_dir.is_finite() {
                    if origin < box_min || origin > box_max {
                        live[lane] = false;
                    }
                    continue;
                }

                let t0 = (box_min - origin) * inv_dir;
                let t1 = (box_max - origin) * inv_dir;
                let (t_near, t_far) = if sign == 0 { (t0, t1) } else { (t1, t0) };

                t_min[lane] = t_min[lane].max(t_near);
                t_max[lane] = t_max[lane].min(t_far);
                if t_min[lane] > t_max[lane] {
                    live[lane] = false;
                }
            }
        }

        for lane in 0..SVBVH_LANES {
            if t_max[lane] < T::zero() || t_min[lane] > search_distance {
                live[lane] = false;
            }
        }

        live
    }
}

/// One 4-wide lane test plus the (up to four) sealed children it summarises,
/// in the same order as the lanes.
struct LaneGroup<T: RealField + Copy> {
    lanes: LaneBounds<T>,
    children: Vec<SealedNode<T>>,
}

impl<T: RealField + Copy> LaneGroup<T> {
    fn raycast(&self, state: &mut RayState<'_, T>) -> Result<bool> {
        let mask = self.lanes.test(&state.ray, state.search_distance());
        let mut found = false;
        for (lane, child) in self.children.iter().enumerate() {
            if !mask[lane] {
                continue;
            }
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

/// A sealed node: either a leaf carrying the original `Vbvh` primitives, or an
/// internal node whose children are packed into one or more [`LaneGroup`]s.
enum SealedNode<T: RealField + Copy> {
    Leaf {
        bb: Aabb<T>,
        objects: Vec<RayObject<T>>,
    },
    Internal {
        bb: Aabb<T>,
        groups: Vec<LaneGroup<T>>,
    },
}

impl<T: RealField + Copy> SealedNode<T> {
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
            Self::Internal { groups, .. } => {
                let mut found = false;
                for group in groups {
                    if group.raycast(state)? {
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
                Self::Internal { groups, .. } => {
                    for group in groups {
                        for child in &group.children {
                            child.hint_bb(query, hint, self_ptr);
                        }
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
}

/// Consume a built, reorganized `Vbvh` node tree and pack it into sealed,
/// lane-grouped nodes.
fn seal<T: RealField + Copy>(node: vbvh::Node<T>) -> SealedNode<T> {
    match node {
        vbvh::Node::Leaf { bb, objects } => SealedNode::Leaf { bb, objects },
        vbvh::Node::Internal { bb, children } => {
            let sealed_children: Vec<SealedNode<T>> = children.into_iter().map(seal).collect();

            let mut groups = Vec::new();
            let mut remaining = sealed_children;
            while !remaining.is_empty() {
                let split = remaining.len().min(SVBVH_LANES);
                let rest = remaining.split_off(split);
                let chunk = std::mem::replace(&mut remaining, rest);

                let boxes: Vec<Cow<'_, Aabb<T>>> = chunk.iter().map(|child| Cow::Borrowed(child.bb())).collect();
                let lanes = LaneBounds::from_children(&boxes);
                groups.push(LaneGroup { lanes, children: chunk });
            }

            SealedNode::Internal { bb, groups }
        }
    }
}

/// A sealing pass over a finished [`Vbvh`]: §4.5's SV-BVH.
pub struct Svbvh<T: RealField + Copy> {
    config: BvhConfig,
    builder: Option<TreeBuilder<T>>,
    root: Option<SealedNode<T>>,
    id: RayObjectId,
}

impl<T: RealField + Copy> Svbvh<T> {
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

impl<T: RealField + Copy> Default for Svbvh<T> {
    fn default() -> Self {
        Self::new(BvhConfig::default())
    }
}

impl<T: RealField + Copy> ApiNode<T> for Svbvh<T> {
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
        let root = vbvh::build(&mut builder, 0..n, &self.config, 0).reorganize();
        self.root = Some(seal(root));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        object::RayObject,
        primitive::Primitive,
        rt::{FaceHandle, ObjectHandle, RayMode},
    };
    use nalgebra::{Point3, Unit, Vector3};

    fn triangle(object: u64, a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> RayObject<f64> {
        let n = Unit::new_normalize((b - a).cross(&(c - a)));
        RayObject::Primitive(Primitive::triangle(
            ObjectHandle(object),
            FaceHandle(0),
            crate::geometry::Triangle::new([a, b, c], [n, n, n]),
        ))
    }

    fn cancel() -> CancelToken {
        CancelToken::new()
    }

    #[test]
    fn seals_more_than_one_lane_group() {
        let mut svbvh = Svbvh::<f64>::new(BvhConfig {
            max_shapes_per_leaf: 1,
            ..BvhConfig::default()
        });

        // Nine well-separated triangles with a one-shape leaf cap force a
        // multi-level tree deep enough to exercise more than one lane group
        // along some path from root to leaf.
        for i in 0..9i64 {
            let x = (i * 10) as f64;
            svbvh
                .add(triangle(
                    i as u64,
                    Point3::new(x, 0.0, 0.0),
                    Point3::new(x + 1.0, 0.0, 0.0),
                    Point3::new(x, 1.0, 0.0),
                ))
                .unwrap();
        }

        svbvh.done(&cancel()).unwrap();

        for i in 0..9i64 {
            let x = (i * 10) as f64 + 0.1;
            let ray = Ray::new(Point3::new(x, 0.1, -5.0), Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0)));
            let mut state = RayState::new(ray, 1000.0, RayMode::Mirror);
            assert!(svbvh.raycast(&mut state).unwrap(), "expected a hit near triangle {i}");
            assert_eq!(state.hit.unwrap().object, Some(ObjectHandle(i as u64)));
        }
    }

    #[test]
    fn misses_ray_that_clears_every_lane() {
        let mut svbvh = Svbvh::<f64>::new(BvhConfig::default());
        svbvh
            .add(triangle(0, Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)))
            .unwrap();
        svbvh.done(&cancel()).unwrap();

        let ray = Ray::new(Point3::new(100.0, 100.0, -5.0), Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0)));
        let mut state = RayState::new(ray, 1000.0, RayMode::Mirror);
        assert!(!svbvh.raycast(&mut state).unwrap());
    }
}
