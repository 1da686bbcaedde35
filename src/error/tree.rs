use thiserror::Error;

/// Misuse of a tree's build/query lifecycle, or a cooperative build cancellation.
#[derive(Debug, Clone, Copy, Error)]
pub enum TreeError {
    #[error("Cannot add to a tree which has already been finalised with `done`")]
    AlreadyDone,

    #[error("Cannot query a tree before it has been finalised with `done`")]
    NotDone,

    #[error("Build was cancelled before completion")]
    Cancelled,

    #[error("Traversal hint stack exceeded its fixed capacity of {capacity}")]
    HintOverflow { capacity: usize },

    #[error("This tree kind does not support add/done (it is not buildable, e.g. an instance wrapper)")]
    NotBuildable,
}
