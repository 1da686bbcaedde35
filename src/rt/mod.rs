//! Ray representation and per-query traversal state.

mod handles;
mod hit;
mod mode;
mod ray;
mod state;

pub use handles::{FaceHandle, ObjectHandle, RayObjectId};
pub use hit::Hit;
pub use mode::{CheckFlags, RayMode, SkipFlags};
pub use ray::Ray;
pub use state::{OriginInfo, RayState};
