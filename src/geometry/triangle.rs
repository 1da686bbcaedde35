use nalgebra::{Point3, RealField, Unit, Vector3};
use std::borrow::Cow;

use crate::{
    error::Result,
    geometry::Aabb,
    rt::{Hit, Ray},
    traits::{Bounded, Traceable},
};

/// Möller–Trumbore intersection against a triangle defined by `vertex0` and the
/// two edges leading away from it. Returns `(distance, u, v)` in barycentric
/// coordinates on a hit. Shared by [`Triangle`] and the two halves of
/// [`crate::geometry::Quad`].
pub(crate) fn intersect_raw<T: RealField + Copy>(
    vertex0: Point3<T>,
    edge1: Vector3<T>,
    edge2: Vector3<T>,
    ray: &Ray<T>,
) -> Option<(T, T, T)> {
    let edge_length_sq = edge1.norm_squared().max(edge2.norm_squared());
    let epsilon = T::default_epsilon() * edge_length_sq.sqrt();

    let h = ray.direction.cross(&edge2);
    let a = edge1.dot(&h);

    if a.abs() < epsilon {
        return None;
    }

    let inv_a = T::one() / a;
    let s = ray.origin - vertex0;
    let u = inv_a * s.dot(&h);

    if u < T::zero() || u > T::one() {
        return None;
    }

    let q = s.cross(&edge1);
    let v = inv_a * ray.direction.dot(&q);

    if v < T::zero() || u + v > T::one() {
        return None;
    }

    let t = inv_a * edge2.dot(&q);

    if t <= epsilon {
        return None;
    }

    Some((t, u, v))
}

/// `Triangle` geometry embedded in 3D space.
#[derive(Debug)]
pub struct Triangle<T: RealField + Copy> {
    /// First vertex position (vertex 0).
    vertex0: Point3<T>,
    /// Vertex normals for interpolation.
    normals: [Unit<Vector3<T>>; 3],
    /// Edge from vertex 0 to vertex 1.
    edge1: Vector3<T>,
    /// Edge from vertex 0 to vertex 2.
    edge2: Vector3<T>,
    /// Geometric normal.
    geometric_normal: Unit<Vector3<T>>,
}

impl<T: RealField + Copy> Triangle<T> {
    /// Construct a new `Triangle` instance.
    pub fn new(vertices: [Point3<T>; 3], normals: [Unit<Vector3<T>>; 3]) -> Self {
        let edge1 = vertices[1] - vertices[0];
        let edge2 = vertices[2] - vertices[0];
        let geometric_normal = Unit::new_normalize(edge1.cross(&edge2));

        Self {
            vertex0: vertices[0],
            normals,
            edge1,
            edge2,
            geometric_normal,
        }
    }

    /// Whether the triangle has zero area (all three vertices collinear or coincident).
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.edge1.cross(&self.edge2).norm_squared() <= T::default_epsilon() * T::default_epsilon()
    }

    pub(crate) fn geometric_normal(&self) -> Unit<Vector3<T>> {
        self.geometric_normal
    }

    /// A point on the triangle's plane and its normal, for the octree's
    /// triangle-plane cell-refinement test.
    pub(crate) fn plane(&self) -> (Point3<T>, Unit<Vector3<T>>) {
        (self.vertex0, self.geometric_normal)
    }
}

impl<T: RealField + Copy> Bounded<T> for Triangle<T> {
    fn aabb(&self) -> Cow<'_, Aabb<T>> {
        let min_x = self
            .vertex0
            .x
            .min(self.vertex0.x + self.edge1.x)
            .min(self.vertex0.x + self.edge2.x);
        let min_y = self
            .vertex0
            .y
            .min(self.vertex0.y + self.edge1.y)
            .min(self.vertex0.y + self.edge2.y);
        let min_z = self
            .vertex0
            .z
            .min(self.vertex0.z + self.edge1.z)
            .min(self.vertex0.z + self.edge2.z);

        let max_x = self
            .vertex0
            .x
            .max(self.vertex0.x + self.edge1.x)
            .max(self.vertex0.x + self.edge2.x);
        let max_y = self
            .vertex0
            .y
            .max(self.vertex0.y + self.edge1.y)
            .max(self.vertex0.y + self.edge2.y);
        let max_z = self
            .vertex0
            .z
            .max(self.vertex0.z + self.edge1.z)
            .max(self.vertex0.z + self.edge2.z);

        Cow::Owned(Aabb::new(
            Point3::new(min_x, min_y, min_z),
            Point3::new(max_x, max_y, max_z),
        ))
    }
}

impl<T: RealField + Copy> Traceable<T> for Triangle<T> {
    fn intersect(&self, ray: &Ray<T>) -> Result<Option<Hit<T>>> {
        let Some((t, u, v)) = intersect_raw(self.vertex0, self.edge1, self.edge2, ray) else {
            return Ok(None);
        };

        let w = T::one() - u - v;
        let interpolated_normal =
            Unit::new_normalize(self.normals[0].scale(w) + self.normals[1].scale(u) + self.normals[2].scale(v));

        Ok(Some(Hit::new(0, t, u, v, self.geometric_normal, interpolated_normal)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle<f64> {
        let n = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
        Triangle::new(
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            [n, n, n],
        )
    }

    #[test]
    fn hits_through_interior() {
        let triangle = unit_triangle();
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)));
        let hit = triangle.intersect(&ray).unwrap().expect("expected a hit");
        assert!((hit.distance - 1.0).abs() < 1e-9);
        assert!(hit.u + hit.v <= 1.0);
    }

    #[test]
    fn misses_outside_interior() {
        let triangle = unit_triangle();
        let ray = Ray::new(Point3::new(0.9, 0.9, 1.0), Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)));
        assert!(triangle.intersect(&ray).unwrap().is_none());
    }

    #[test]
    fn misses_parallel_ray() {
        let triangle = unit_triangle();
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Unit::new_normalize(Vector3::new(1.0, 0.0, 0.0)));
        assert!(triangle.intersect(&ray).unwrap().is_none());
    }

    #[test]
    fn is_degenerate_detects_collinear_vertices() {
        let n = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
        let collinear = Triangle::new(
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
            [n, n, n],
        );
        assert!(collinear.is_degenerate());
        assert!(!unit_triangle().is_degenerate());
    }
}
