pub mod analyzer;
pub mod boundary;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod hooks;
pub mod policy;
pub mod release;
pub mod telemetry;
pub mod ui;
pub mod version;

pub use error::{LibrarianError, Result};
