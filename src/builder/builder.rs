//! Shared tree-construction machinery: three axis-sorted primitive views and
//! an exact-sweep surface-area-heuristic split, used by every concrete tree in
//! [`crate::tree`].
//!
//! Grounded in `rayobject_rtbuild.cpp`: primitives are added to a flat list
//! (`rtbuild_add`, silently dropping degenerate input), sorted once per axis
//! (`object_sort`/`obj_bb_compare<Axis>`), and every split request walks the
//! same pre-sorted order rather than re-sorting at each node
//! (`rtbuild_get_child`). The split evaluation itself
//! (`rtbuild_heuristic_object_split`) sweeps suffix cost right-to-left into a
//! scratch array before walking left-to-right comparing
//! `area(left)*cost(left) + area(right)*cost(right)` at every boundary,
//! breaking ties toward the lowest axis index -- reproduced here exactly,
//! rather than the bucketed approximation some BVH builders use.

use nalgebra::{Point3, RealField};
use std::ops::Range;

use crate::{
    config::{DEFAULT_INTERSECT_COST, DEFAULT_TRAVERSE_COST},
    error::Result,
    geometry::Aabb,
    object::RayObject,
    traits::{Bounded, FallibleNumeric},
};

struct Entry<T: RealField + Copy> {
    object: RayObject<T>,
    bb: Aabb<T>,
}

/// The outcome of a successful SAH split: an axis and an index into that
/// axis's sorted view marking the end of the left child's range.
#[derive(Debug, Clone, Copy)]
pub struct Split {
    pub axis: usize,
    pub split_at: usize,
}

/// Collects objects for a tree under construction and exposes them through
/// three per-axis sorted index views, plus SAH/mean split evaluation over any
/// contiguous sub-range of a view.
pub struct TreeBuilder<T: RealField + Copy> {
    entries: Vec<Entry<T>>,
    sorted: [Vec<usize>; 3],
    done: bool,
}

impl<T: RealField + Copy> Default for TreeBuilder<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            sorted: [Vec::new(), Vec::new(), Vec::new()],
            done: false,
        }
    }
}

impl<T: RealField + Copy> TreeBuilder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Insert `object`. Returns `Ok(false)` without error if the object's
    /// bounding box is degenerate (inverted, non-finite, zero-area, or
    /// zero-extent on all three axes); the build simply continues without
    /// it, matching `rtbuild_add`'s silent rejection.
    pub fn add(&mut self, object: RayObject<T>) -> Result<bool> {
        let bb = object.bb().into_owned();
        let extent = bb.maxs - bb.mins;
        let finite = extent.x.is_finite() && extent.y.is_finite() && extent.z.is_finite();
        let non_negative = extent.x >= T::zero() && extent.y >= T::zero() && extent.z >= T::zero();
        if !finite || !non_negative {
            return Ok(false);
        }
        if let RayObject::Primitive(primitive) = &object {
            if primitive.is_degenerate() {
                return Ok(false);
            }
        }

        let index = self.entries.len();
        self.entries.push(Entry { object, bb });
        for axis_list in &mut self.sorted {
            axis_list.push(index);
        }
        Ok(true)
    }

    /// Finalise the per-axis sorted views. Must be called before any split or
    /// range query. `cancel` is polled between each axis sort.
    ///
    /// Sorts each view by `(min-corner, index)` on its own axis, per §4.4 --
    /// `obj_bb_compare<Axis>` compares the box's min corner, not its centroid,
    /// and the index tiebreaker (standing in for the original's
    /// object-pointer tiebreaker) guarantees identical ordering across axes
    /// for primitives sharing a min corner.
    pub fn done(&mut self, cancel: &crate::traits::CancelToken) -> Result<()> {
        for axis in 0..3 {
            if cancel.is_cancelled() {
                return Err(crate::error::TreeError::Cancelled.into());
            }
            let entries = &self.entries;
            self.sorted[axis].sort_by(|&a, &b| {
                let ca = entries[a].bb.mins[axis];
                let cb = entries[b].bb.mins[axis];
                ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b))
            });
        }
        self.done = true;
        Ok(())
    }

    /// The primitive indices (original insertion order) covered by `range` on
    /// `axis`'s sorted view.
    #[must_use]
    pub fn axis_view(&self, axis: usize, range: Range<usize>) -> &[usize] {
        &self.sorted[axis][range]
    }

    /// Merge the bounding boxes of every object covered by `range` (on any
    /// axis -- all three views of the same range cover the same set).
    #[must_use]
    pub fn range_bb(&self, range: Range<usize>) -> Aabb<T> {
        let mut bb = Aabb::empty();
        for &index in &self.sorted[0][range] {
            bb = bb.merge(&self.entries[index].bb);
        }
        bb
    }

    /// The bounding box of the object at raw insertion index `index`, as
    /// opposed to [`TreeBuilder::range_bb`] which takes a position range into
    /// a sorted axis view.
    #[must_use]
    pub fn bb_of(&self, index: usize) -> Aabb<T> {
        self.entries[index].bb.clone()
    }

    /// Consume the builder's object at `index`, for leaf construction. Panics
    /// if called twice for the same index; trees call this exactly once per
    /// leaf primitive during their build pass.
    pub fn take(&mut self, index: usize) -> RayObject<T> {
        // Swap in a placeholder empty node so the Vec stays densely indexed;
        // trees visit every index exactly once during their single build pass.
        let empty = RayObject::Node(Box::new(crate::empty::Empty::<T>::new()));
        let entry = std::mem::replace(
            &mut self.entries[index],
            Entry {
                object: empty,
                bb: Aabb::empty(),
            },
        );
        entry.object
    }

    /// Exact-sweep SAH split of `range`, per §4.4. Returns `None` when no
    /// split improves on leaving `range` as a single leaf (including when
    /// `range` has fewer than two objects).
    #[must_use]
    pub fn split_sah(&self, range: Range<usize>) -> Option<Split> {
        let n = range.len();
        if n < 2 {
            return None;
        }

        let traverse_cost = T::try_from_f64(DEFAULT_TRAVERSE_COST).ok()?;
        let intersect_cost = T::try_from_f64(DEFAULT_INTERSECT_COST).ok()?;
        let leaf_cost = intersect_cost * T::try_from_usize(n).ok()?;

        let mut best: Option<(T, Split)> = None;

        for axis in 0..3 {
            let ids = &self.sorted[axis][range.clone()];

            // Right-to-left suffix sweep: suffix_area[i] / suffix_count[i]
            // describe objects ids[i..n].
            let mut suffix_area = vec![T::zero(); n + 1];
            let mut suffix_bb = Aabb::empty();
            for i in (0..n).rev() {
                suffix_bb = suffix_bb.merge(&self.entries[ids[i]].bb);
                suffix_area[i] = suffix_bb.surface_area();
            }

            // Left-to-right prefix sweep, evaluating the split after each
            // boundary 1..n.
            let mut prefix_bb = Aabb::empty();
            for i in 0..(n - 1) {
                prefix_bb = prefix_bb.merge(&self.entries[ids[i]].bb);
                let left_count = T::try_from_usize(i + 1).ok()?;
                let right_count = T::try_from_usize(n - i - 1).ok()?;
                let cost = traverse_cost
                    + intersect_cost
                        * (prefix_bb.surface_area() * left_count + suffix_area[i + 1] * right_count);

                let candidate = Split {
                    axis,
                    split_at: range.start + i + 1,
                };
                match &best {
                    Some((best_cost, _)) if *best_cost <= cost => {}
                    _ => best = Some((cost, candidate)),
                }
            }
        }

        match best {
            Some((cost, split)) if cost < leaf_cost => Some(split),
            _ => None,
        }
    }

    /// Reorder every axis view so that `range` splits cleanly into two
    /// contiguous sub-ranges agreeing with `split` (computed by
    /// [`TreeBuilder::split_sah`] against `axis`'s view), preserving each
    /// axis's relative min-corner order within each half. This is what lets a
    /// single up-front sort per axis serve every node of the build: after a
    /// split the invariant that "the same contiguous range on every axis view
    /// names the same object set" is restored for both children.
    pub fn partition(&mut self, range: Range<usize>, split: Split) -> (Range<usize>, Range<usize>) {
        let pivot = split.split_at - range.start;
        let mut in_left = vec![false; self.entries.len()];
        for &index in &self.sorted[split.axis][range.start..split.split_at] {
            in_left[index] = true;
        }

        for axis in 0..3 {
            let slice = &self.sorted[axis][range.clone()];
            let mut left = Vec::with_capacity(pivot);
            let mut right = Vec::with_capacity(slice.len() - pivot);
            for &index in slice {
                if in_left[index] {
                    left.push(index);
                } else {
                    right.push(index);
                }
            }
            let rearranged: Vec<usize> = left.into_iter().chain(right).collect();
            self.sorted[axis][range.clone()].copy_from_slice(&rearranged);
        }

        (range.start..split.split_at, split.split_at..range.end)
    }

    /// Split `range` into up to `n_children` contiguous sub-ranges of roughly
    /// equal size along the axis of largest extent, mirroring
    /// `rtbuild_mean_split_largest_axis`, and reorder every axis view so the
    /// usual "same range, same object set on every axis" invariant holds for
    /// each child afterwards.
    pub fn split_mean(&mut self, range: Range<usize>, n_children: usize) -> Vec<Range<usize>> {
        let n = range.len();
        if n_children <= 1 || n <= n_children {
            return vec![range];
        }

        let bb = self.range_bb(range.clone());
        let extent = bb.maxs - bb.mins;
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };

        let base = n / n_children;
        let remainder = n % n_children;
        let mut group_of = vec![0usize; self.entries.len()];
        let mut start = 0;
        let mut bounds = Vec::with_capacity(n_children);
        for child in 0..n_children {
            let size = base + usize::from(child < remainder);
            bounds.push(start + size);
            start += size;
        }
        for (position, &index) in self.sorted[axis][range.clone()].iter().enumerate() {
            let group = bounds.iter().position(|&b| position < b).unwrap_or(n_children - 1);
            group_of[index] = group;
        }

        for a in 0..3 {
            let slice = &self.sorted[a][range.clone()];
            let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); n_children];
            for &index in slice {
                buckets[group_of[index]].push(index);
            }
            let rearranged: Vec<usize> = buckets.into_iter().flatten().collect();
            self.sorted[a][range.clone()].copy_from_slice(&rearranged);
        }

        let mut ranges = Vec::with_capacity(n_children);
        let mut cursor = range.start;
        for child in 0..n_children {
            let size = base + usize::from(child < remainder);
            ranges.push(cursor..cursor + size);
            cursor += size;
        }
        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::Triangle,
        primitive::Primitive,
        rt::{FaceHandle, ObjectHandle},
        traits::CancelToken,
    };
    use nalgebra::{Unit, Vector3};

    fn triangle_at(x: f64) -> RayObject<f64> {
        let n = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
        let triangle = Triangle::new(
            [
                Point3::new(x - 0.5, -0.5, 0.0),
                Point3::new(x + 0.5, -0.5, 0.0),
                Point3::new(x, 0.5, 0.0),
            ],
            [n, n, n],
        );
        RayObject::Primitive(Primitive::triangle(ObjectHandle(0), FaceHandle(0), triangle))
    }

    #[test]
    fn split_sah_separates_two_clusters() {
        let mut builder = TreeBuilder::new();
        for x in [0.0, 0.1, 10.0, 10.1] {
            builder.add(triangle_at(x)).unwrap();
        }
        builder.done(&CancelToken::new()).unwrap();

        let split = builder.split_sah(0..4).expect("expected a beneficial split");
        assert_eq!(split.axis, 0);
        assert_eq!(split.split_at, 2);
    }

    #[test]
    fn split_sah_refuses_singleton_range() {
        let mut builder = TreeBuilder::new();
        builder.add(triangle_at(0.0)).unwrap();
        builder.done(&CancelToken::new()).unwrap();
        assert!(builder.split_sah(0..1).is_none());
    }

    #[test]
    fn partition_preserves_every_axis_view() {
        let mut builder = TreeBuilder::new();
        for x in [0.0, 0.1, 10.0, 10.1] {
            builder.add(triangle_at(x)).unwrap();
        }
        builder.done(&CancelToken::new()).unwrap();

        let split = builder.split_sah(0..4).unwrap();
        let (left, right) = builder.partition(0..4, split);
        assert_eq!(left.len() + right.len(), 4);
        for axis in 0..3 {
            let mut seen: Vec<usize> = builder.axis_view(axis, left.clone()).to_vec();
            seen.extend_from_slice(builder.axis_view(axis, right.clone()));
            seen.sort_unstable();
            assert_eq!(seen, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn add_rejects_degenerate_bounds() {
        let mut builder = TreeBuilder::new();
        let n = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
        let degenerate = Triangle::new(
            [
                Point3::new(f64::NAN, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            [n, n, n],
        );
        let object = RayObject::Primitive(Primitive::triangle(ObjectHandle(0), FaceHandle(0), degenerate));
        assert!(!builder.add(object).unwrap());
        assert_eq!(builder.len(), 0);
    }

    #[test]
    fn add_rejects_collinear_triangle() {
        let mut builder = TreeBuilder::new();
        let n = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
        let collinear = Triangle::new(
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
            [n, n, n],
        );
        let object = RayObject::Primitive(Primitive::triangle(ObjectHandle(0), FaceHandle(0), collinear));
        assert!(!builder.add(object).unwrap());
        assert_eq!(builder.len(), 0);
    }
}
