//! Pure formatting functions for UI output.
//!
//! `format_*` functions build the text and are unit-tested; `display_*` functions
//! print it with colour.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::domain::manifest::short;
use crate::release::{BumpPlan, PlannedBump, PlannedTag};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// One line describing a planned bump, e.g. `lib1: 1.0.0 -> 1.1.0`
pub fn format_bump(bump: &PlannedBump) -> String {
    if bump.previous.is_empty() {
        format!("{}: (unreleased) -> {}", bump.library, bump.next)
    } else {
        format!("{}: {} -> {}", bump.library, bump.previous, bump.next)
    }
}

/// One line describing a tag, e.g. `lib1/v1.1.0 at 0123abc`
pub fn format_tag(tag: &PlannedTag) -> String {
    format!("{} at {}", tag.name, short(&tag.commit))
}

/// Display every warning, then every bump of the plan.
pub fn display_bump_plan(plan: &BumpPlan, dry_run: bool) {
    for warning in &plan.warnings {
        display_boundary_warning(warning);
    }
    if plan.is_empty() {
        return;
    }

    let heading = if dry_run {
        "Would release:"
    } else {
        "Released:"
    };
    println!("\n{}", style(heading).bold());
    for bump in &plan.bumps {
        println!("  {}", format_bump(bump));
    }
}

/// Display the tags created (or to be created) at a release commit.
pub fn display_tags(tags: &[PlannedTag], dry_run: bool) {
    for tag in tags {
        if dry_run {
            display_status(&format!("Would create tag {}", format_tag(tag)));
        } else {
            display_success(&format!("Created tag {}", format_tag(tag)));
        }
    }
}
