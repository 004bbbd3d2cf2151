//! Command-line contracts, independent of argument parsing

pub mod orchestration;

pub use orchestration::{run_bump, run_tag, BumpArgs, BumpReport, BumpTarget, TagArgs, TagReport};
