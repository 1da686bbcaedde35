//! Leaf geometry stored by every tree: a triangle or quad plus the caller's
//! owning (object, face) handles, carrying the self-intersection and
//! skip-flag semantics of §4.1.

use nalgebra::RealField;
use std::borrow::Cow;

use crate::{
    error::Result,
    geometry::{Aabb, Quad, Triangle},
    rt::{CheckFlags, FaceHandle, Hit, ObjectHandle, Ray, RayState, SkipFlags},
    traits::{Bounded, FallibleNumeric, Traceable},
};

/// The concrete shape of a [`Primitive`].
#[derive(Debug)]
pub enum PrimitiveGeometry<T: RealField + Copy> {
    Triangle(Triangle<T>),
    Quad(Quad<T>),
}

impl<T: RealField + Copy> Bounded<T> for PrimitiveGeometry<T> {
    fn aabb(&self) -> Cow<'_, Aabb<T>> {
        match self {
            Self::Triangle(triangle) => triangle.aabb(),
            Self::Quad(quad) => quad.aabb(),
        }
    }
}

impl<T: RealField + Copy> Traceable<T> for PrimitiveGeometry<T> {
    fn intersect(&self, ray: &Ray<T>) -> Result<Option<Hit<T>>> {
        match self {
            Self::Triangle(triangle) => triangle.intersect(ray),
            Self::Quad(quad) => quad.intersect(ray),
        }
    }
}

impl<T: RealField + Copy> PrimitiveGeometry<T> {
    /// A point on this geometry's plane and its normal.
    fn plane(&self) -> (nalgebra::Point3<T>, nalgebra::Unit<nalgebra::Vector3<T>>) {
        match self {
            Self::Triangle(triangle) => triangle.plane(),
            Self::Quad(quad) => quad.plane(),
        }
    }
}

/// A single indexable piece of geometry, tagged with the scene object and face
/// it belongs to. This is the leaf payload every tree stores; it is never
/// itself a tree node.
#[derive(Debug)]
pub struct Primitive<T: RealField + Copy> {
    pub object: ObjectHandle,
    pub face: FaceHandle,
    pub geometry: PrimitiveGeometry<T>,
}

impl<T: RealField + Copy> Primitive<T> {
    pub fn triangle(object: ObjectHandle, face: FaceHandle, triangle: Triangle<T>) -> Self {
        Self {
            object,
            face,
            geometry: PrimitiveGeometry::Triangle(triangle),
        }
    }

    pub fn quad(object: ObjectHandle, face: FaceHandle, quad: Quad<T>) -> Self {
        Self {
            object,
            face,
            geometry: PrimitiveGeometry::Quad(quad),
        }
    }

    #[must_use]
    pub fn aabb(&self) -> Cow<'_, Aabb<T>> {
        self.geometry.aabb()
    }

    /// A point on this primitive's plane and its normal, used by
    /// [`crate::tree::Octree`]'s triangle-plane cell-refinement test (§4.5).
    #[must_use]
    pub fn plane(&self) -> (nalgebra::Point3<T>, nalgebra::Unit<nalgebra::Vector3<T>>) {
        self.geometry.plane()
    }

    /// Whether this primitive is so close to zero extent that it should be
    /// silently dropped by a builder rather than inserted, mirroring
    /// `rtbuild_add`'s rejection of inverted or zero-area input.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let bb = self.aabb();
        let extent = bb.maxs - bb.mins;
        let area = bb.surface_area();
        !(extent.x.is_finite() && extent.y.is_finite() && extent.z.is_finite())
            || area <= T::default_epsilon() * T::default_epsilon()
    }

    /// Test this primitive against the ray carried by `state`, honouring the
    /// skip-flags and self-intersection suppression rules of §4.1.
    ///
    /// Returns `true` if a qualifying hit closer than `state.search_distance()`
    /// was found and recorded into `state.hit`.
    pub fn raycast(&self, state: &mut RayState<'_, T>) -> Result<bool> {
        if state.skip.contains(SkipFlags::CULLFACE) {
            let facing = self.geometric_normal().into_inner().dot(&state.ray.direction);
            if facing >= T::zero() {
                return Ok(false);
            }
        }

        if state.skip.contains(SkipFlags::VLR_RENDER_CHECK) {
            if let Some(predicate) = state.render_check {
                if !predicate(self.object) {
                    return Ok(false);
                }
            }
        }

        // skip-vlr-non-solid-material / CheckFlags::SOLID_MATERIAL: both
        // gate the same caller-supplied solidity predicate, one via the
        // skip-flag path and one via the check-flag path (§4.1).
        if state.skip.contains(SkipFlags::VLR_NON_SOLID_MATERIAL) || state.check.contains(CheckFlags::SOLID_MATERIAL) {
            if let Some(predicate) = state.solid_material {
                if !predicate(self.object) {
                    return Ok(false);
                }
            }
        }

        // Never let a ray re-hit the exact face it left.
        if state.origin.object == Some(self.object) && state.origin.face == Some(self.face) {
            return self.neighbour_retest(state);
        }

        let search = state.search_distance();
        let Some(hit) = self.geometry.intersect(&state.ray)? else {
            return Ok(false);
        };

        if hit.distance >= search {
            return Ok(false);
        }

        state.record(hit.with_owner(self.object, self.face));
        Ok(true)
    }

    /// The `skip-vlr-neighbour` re-test: a ray leaving `self` may legitimately
    /// re-enter geometry sharing the same face handle (e.g. a coplanar
    /// neighbour) within a small world-space tolerance; retry with a slightly
    /// offset effective origin instead of unconditionally suppressing.
    fn neighbour_retest(&self, state: &mut RayState<'_, T>) -> Result<bool> {
        if !state.skip.contains(SkipFlags::VLR_NEIGHBOUR) {
            return Ok(false);
        }

        let search = state.search_distance();
        let Some(hit) = self.geometry.intersect(&state.ray)? else {
            return Ok(false);
        };

        let epsilon = T::try_from_f64(crate::config::NEIGHBOUR_EPSILON)?;
        if hit.distance <= T::default_epsilon() + epsilon || hit.distance >= search {
            return Ok(false);
        }

        state.record(hit.with_owner(self.object, self.face));
        Ok(true)
    }

    fn geometric_normal(&self) -> nalgebra::Unit<nalgebra::Vector3<T>> {
        match &self.geometry {
            PrimitiveGeometry::Triangle(triangle) => triangle.geometric_normal(),
            PrimitiveGeometry::Quad(quad) => quad.geometric_normal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Unit, Vector3};

    #[test]
    fn is_degenerate_detects_point_triangle() {
        let n = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
        let point = Triangle::new([Point3::new(1.0, 1.0, 1.0); 3], [n, n, n]);
        let primitive = Primitive::triangle(ObjectHandle(0), FaceHandle(0), point);
        assert!(primitive.is_degenerate());
    }

    #[test]
    fn is_degenerate_passes_well_formed_triangle() {
        let n = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
        let triangle = Triangle::new(
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            [n, n, n],
        );
        let primitive = Primitive::triangle(ObjectHandle(0), FaceHandle(0), triangle);
        assert!(!primitive.is_degenerate());
    }
}
