mod builder;

pub use builder::{Split, TreeBuilder};
