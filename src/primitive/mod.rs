mod primitive;

pub use primitive::{Primitive, PrimitiveGeometry};
