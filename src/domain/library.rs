use crate::domain::tag::TagFormat;
use crate::domain::version::{parse_version, Version};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Version state of one library as recorded in the manifest.
///
/// Identity is `name`. An empty `version` means the library was onboarded but never
/// released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryVersionRecord {
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_publish: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag_format: String,

    /// Directory holding the generated library, relative to the repository root
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_roots: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub release_exclude_paths: Vec<String>,
}

impl LibraryVersionRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        LibraryVersionRecord {
            name: name.into(),
            version: version.into(),
            skip_publish: false,
            tag_format: String::new(),
            output: String::new(),
            source_roots: Vec::new(),
            release_exclude_paths: Vec::new(),
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_tag_format(mut self, tag_format: impl Into<String>) -> Self {
        self.tag_format = tag_format.into();
        self
    }

    pub fn is_released(&self) -> bool {
        !self.version.trim().is_empty()
    }

    /// Parsed version, `None` when unreleased
    pub fn parsed_version(&self) -> Result<Option<Version>> {
        if !self.is_released() {
            return Ok(None);
        }
        parse_version(&self.version).map(Some)
    }

    pub fn tag_format(&self) -> TagFormat {
        TagFormat::new(self.tag_format.clone())
    }

    /// Tag naming this library's current version
    pub fn release_tag(&self) -> Result<String> {
        self.tag_format().render(&self.name, self.version.trim())
    }

    /// Directory whose changes count towards this library.
    ///
    /// Falls back to the first source root, then to a directory named after the library.
    pub fn output_dir(&self) -> PathBuf {
        let dir = if !self.output.trim().is_empty() {
            self.output.trim()
        } else if let Some(root) = self.source_roots.first() {
            root.trim()
        } else {
            self.name.as_str()
        };
        PathBuf::from(dir.trim_end_matches('/'))
    }

    /// True when `path` lies under the output directory and outside every exclude path.
    ///
    /// Matching is per path component: "ai" does not own "aiplatform/x".
    pub fn owns_path(&self, path: &Path) -> bool {
        path.starts_with(self.output_dir())
            && !self
                .release_exclude_paths
                .iter()
                .any(|excluded| path.starts_with(excluded.trim_end_matches('/')))
    }
}
