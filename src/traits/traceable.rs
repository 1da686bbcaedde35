//! Traceable trait.

use nalgebra::RealField;

use crate::{
    error::Result,
    rt::{Hit, Ray},
};

/// Trait for types which can be intersected by a [`Ray`].
pub trait Traceable<T: RealField + Copy> {
    /// Test for an intersection between `ray` and this geometry.
    fn intersect(&self, ray: &Ray<T>) -> Result<Option<Hit<T>>>;
}
