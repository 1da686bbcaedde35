mod api_node;
mod bounded;
mod failable_numeric;
mod traceable;

pub use api_node::{ApiNode, CancelToken};
pub use bounded::Bounded;
pub use failable_numeric::FallibleNumeric;
pub use traceable::Traceable;
