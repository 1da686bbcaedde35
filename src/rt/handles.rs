//! Opaque caller-facing handles.
//!
//! The core never interprets these beyond equality: they exist so callers can
//! recognise which object/face a hit belongs to, and so the self-intersection
//! suppression logic in [`crate::primitive`] can compare a candidate hit
//! against the ray's point of origin.

/// Identifies the owning scene object of a primitive, from the caller's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u64);

/// Identifies a single face (triangle or quad) within its owning object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceHandle(pub u64);

/// Identifies a built tree node, used to remember the last node a shadow ray
/// intersected so a repeated shadow query against the same ray can retry it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RayObjectId(u64);

impl RayObjectId {
    /// Allocate a fresh, process-unique id.
    pub fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}
