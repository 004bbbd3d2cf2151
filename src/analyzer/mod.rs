//! Analysis engine for determining change levels from commits

pub mod classifier;

pub use classifier::{classify, classify_commit};
