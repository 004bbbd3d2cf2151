//! Release engine: selecting libraries, deriving versions, reconstructing release
//! commits from manifest history and tagging them.

pub mod bump;
pub mod coupling;
pub mod detect;
pub mod reconstruct;
pub mod scanner;
pub mod tagger;

pub use bump::{apply_plan, plan_all, plan_single, BumpContext, BumpMode, BumpPlan, PlannedBump};
pub use coupling::{
    derive_next_preview, resolve_preview_version, BranchManifestSource, CatchUpStrategy,
    NextMinorPreview, NextPatchPreview, StableVersionSource,
};
pub use detect::find_released_libraries;
pub use reconstruct::{find_release_commit, ReleaseCommit};
pub use scanner::{scan_changes, Candidate, ScanOutcome, ScanTarget, TagMode};
pub use tagger::{apply_tags, plan_tags, PlannedTag};
