use nalgebra::{RealField, Unit, Vector3};

use crate::{
    error::{GeometryError, Result},
    rt::handles::{FaceHandle, ObjectHandle},
};

/// Records details of a ray intersection with a geometric surface.
#[derive(Debug, Clone)]
pub struct Hit<T: RealField + Copy> {
    /// Which half of a quad was struck (always 0 for a triangle).
    pub quad_half: usize,
    /// The distance to intersection.
    pub distance: T,
    /// First barycentric coordinate of the struck half.
    pub u: T,
    /// Second barycentric coordinate of the struck half.
    pub v: T,
    /// The geometric normal at the intersection point.
    pub geometric_normal: Unit<Vector3<T>>,
    /// The Phong shading normal at the intersection point.
    pub interpolated_normal: Unit<Vector3<T>>,
    /// The scene object the hit belongs to, filled in by the primitive (or
    /// rewritten to the enclosing instance's handle by [`crate::instance::Instance`]).
    pub object: Option<ObjectHandle>,
    /// The face within `object` that was struck.
    pub face: Option<FaceHandle>,
}

impl<T: RealField + Copy> Hit<T> {
    /// Construct a new `Hit` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the distance is negative.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quad_half: usize,
        distance: T,
        u: T,
        v: T,
        geometric_normal: Unit<Vector3<T>>,
        interpolated_normal: Unit<Vector3<T>>,
    ) -> Result<Self> {
        if distance < T::zero() {
            return Err(GeometryError::NegativeIntersectionDistance {
                distance: distance.to_string(),
            }
            .into());
        }

        Ok(Self {
            quad_half,
            distance,
            u,
            v,
            geometric_normal,
            interpolated_normal,
            object: None,
            face: None,
        })
    }

    /// Attach the owning object and face handles, as the primitive that
    /// produced this hit (or the instance that rewrote it) sees them.
    #[must_use]
    pub fn with_owner(mut self, object: ObjectHandle, face: FaceHandle) -> Self {
        self.object = Some(object);
        self.face = Some(face);
        self
    }
}
