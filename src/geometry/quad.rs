//! Quad geometry, represented internally as two triangles sharing a diagonal.

use nalgebra::{Point3, RealField, Unit, Vector3};
use std::borrow::Cow;

use crate::{
    error::Result,
    geometry::{triangle::intersect_raw, Aabb},
    rt::{Hit, Ray},
    traits::{Bounded, Traceable},
};

/// Planar (or near-planar) quadrilateral `v0, v1, v2, v3`, split along the
/// `v0`-`v2` diagonal into two triangles for intersection purposes.
/// `Hit::quad_half` reports which half (0 for `v0,v1,v2`, 1 for `v0,v2,v3`)
/// was struck.
#[derive(Debug)]
pub struct Quad<T: RealField + Copy> {
    vertex0: Point3<T>,
    normals: [Unit<Vector3<T>>; 4],
    edge_a1: Vector3<T>,
    edge_a2: Vector3<T>,
    edge_b1: Vector3<T>,
    edge_b2: Vector3<T>,
    geometric_normal: Unit<Vector3<T>>,
}

impl<T: RealField + Copy> Quad<T> {
    /// Construct a new `Quad` from four vertices and their shading normals, in
    /// winding order.
    pub fn new(vertices: [Point3<T>; 4], normals: [Unit<Vector3<T>>; 4]) -> Self {
        let edge_a1 = vertices[1] - vertices[0];
        let edge_a2 = vertices[2] - vertices[0];
        let edge_b1 = vertices[2] - vertices[0];
        let edge_b2 = vertices[3] - vertices[0];
        let geometric_normal = Unit::new_normalize(edge_a1.cross(&edge_a2));

        Self {
            vertex0: vertices[0],
            normals,
            edge_a1,
            edge_a2,
            edge_b1,
            edge_b2,
            geometric_normal,
        }
    }
}

impl<T: RealField + Copy> Quad<T> {
    pub(crate) fn geometric_normal(&self) -> Unit<Vector3<T>> {
        self.geometric_normal
    }

    /// A point on the quad's plane and its normal, for the octree's
    /// triangle-plane cell-refinement test.
    pub(crate) fn plane(&self) -> (Point3<T>, Unit<Vector3<T>>) {
        (self.vertex0, self.geometric_normal)
    }
}

impl<T: RealField + Copy> Bounded<T> for Quad<T> {
    fn aabb(&self) -> Cow<'_, Aabb<T>> {
        let candidates = [
            self.vertex0,
            self.vertex0 + self.edge_a1,
            self.vertex0 + self.edge_a2,
            self.vertex0 + self.edge_b2,
        ];

        let mut mins = candidates[0];
        let mut maxs = candidates[0];
        for corner in &candidates[1..] {
            mins = Point3::new(mins.x.min(corner.x), mins.y.min(corner.y), mins.z.min(corner.z));
            maxs = Point3::new(maxs.x.max(corner.x), maxs.y.max(corner.y), maxs.z.max(corner.z));
        }

        Cow::Owned(Aabb::new(mins, maxs))
    }
}

impl<T: RealField + Copy> Traceable<T> for Quad<T> {
    fn intersect(&self, ray: &Ray<T>) -> Result<Option<Hit<T>>> {
        if let Some((t, u, v)) = intersect_raw(self.vertex0, self.edge_a1, self.edge_a2, ray) {
            let w = T::one() - u - v;
            let normal = Unit::new_normalize(
                self.normals[0].scale(w) + self.normals[1].scale(u) + self.normals[2].scale(v),
            );
            return Ok(Some(Hit::new(0, t, u, v, self.geometric_normal, normal)?));
        }

        if let Some((t, u, v)) = intersect_raw(self.vertex0, self.edge_b1, self.edge_b2, ray) {
            let w = T::one() - u - v;
            let normal = Unit::new_normalize(
                self.normals[0].scale(w) + self.normals[2].scale(u) + self.normals[3].scale(v),
            );
            return Ok(Some(Hit::new(1, t, u, v, self.geometric_normal, normal)?));
        }

        Ok(None)
    }
}
