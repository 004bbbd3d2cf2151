//! User interface module - terminal output.
//!
//! Commands never prompt; everything the user needs to decide on is reported and the
//! process exit code carries the outcome.

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_bump_plan, display_error, display_status,
    display_success, display_tags, format_bump, format_tag,
};
