//! Bounded geometry trait.

use nalgebra::RealField;
use std::borrow::Cow;

use crate::geometry::Aabb;

/// Types implementing this trait can report an axis-aligned bounding box.
pub trait Bounded<T: RealField + Copy> {
    /// Get the axis-aligned bounding box of the geometry.
    fn aabb(&self) -> Cow<'_, Aabb<T>>;
}
