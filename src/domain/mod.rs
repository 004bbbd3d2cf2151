//! Domain logic - pure data and rules independent of git operations

pub mod channel;
pub mod commit;
pub mod library;
pub mod manifest;
pub mod prerelease;
pub mod tag;
pub mod version;

pub use channel::ReleaseChannel;
pub use commit::{parse_message, ConventionalCommitRecord};
pub use library::LibraryVersionRecord;
pub use manifest::{Manifest, ManifestSnapshot, ReleaseSettings};
pub use prerelease::{PreRelease, PreReleaseType};
pub use tag::TagFormat;
pub use version::{ChangeLevel, Version};
