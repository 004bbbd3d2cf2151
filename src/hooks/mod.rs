//! Per-ecosystem "apply version" hook
//!
//! The release engine decides *which* version a library gets; writing that version
//! into the library's own files (Cargo.toml, package.json, version.go, ...) is left
//! to a [`VersionApplier`]. The stock applier runs a user script with the details in
//! `LIBRARIAN_*` environment variables.

pub mod applier;
pub mod context;
pub mod executor;

pub use applier::{NoopApplier, ScriptApplier, VersionApplier};
pub use context::HookContext;
pub use executor::HookExecutor;
