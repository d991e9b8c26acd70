//! The five structural primitives: two composites and three decorators.
//! Everything else (leaves, custom composites) is an external collaborator
//! implementing `Node` directly.

pub mod force_failure;
pub mod force_success;
pub mod invert;
pub mod selector;
pub mod sequence;

pub use force_failure::ForceFailure;
pub use force_success::ForceSuccess;
pub use invert::Invert;
pub use selector::Selector;
pub use sequence::Sequence;
