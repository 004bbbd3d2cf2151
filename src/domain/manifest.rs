//! The release manifest: per-library version records plus release settings.
//!
//! A [`Manifest`] is the parsed YAML document. A [`ManifestSnapshot`] pins one to the
//! commit it was read from; snapshots are never written back.

use crate::domain::library::LibraryVersionRecord;
use crate::error::{LibrarianError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Repository-wide release settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSettings {
    /// Path prefixes whose changes never trigger a release
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_changes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Ecosystem identifier, e.g. "rust" or "go"
    #[serde(default)]
    pub language: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<ReleaseSettings>,

    #[serde(default)]
    pub libraries: Vec<LibraryVersionRecord>,
}

impl Manifest {
    /// Parse and validate a manifest document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: Manifest = if content.trim().is_empty() {
            Manifest::default()
        } else {
            serde_yaml::from_str(content)?
        };
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Library names must be unique and recorded versions plain semver
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for library in &self.libraries {
            if library.name.trim().is_empty() {
                return Err(LibrarianError::config("Library with empty name in manifest"));
            }
            if !seen.insert(library.name.as_str()) {
                return Err(LibrarianError::config(format!(
                    "Duplicate library name in manifest: {}",
                    library.name
                )));
            }
            library.parsed_version().map_err(|e| {
                LibrarianError::config(format!("Library '{}': {}", library.name, e))
            })?;
        }
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&LibraryVersionRecord> {
        self.libraries.iter().find(|l| l.name == name)
    }

    /// Look up a library, failing with the name that was not found
    pub fn require(&self, name: &str) -> Result<&LibraryVersionRecord> {
        self.find(name)
            .ok_or_else(|| LibrarianError::library_not_found(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut LibraryVersionRecord> {
        self.libraries.iter_mut().find(|l| l.name == name)
    }

    /// Release settings, required by every release operation
    pub fn release_settings(&self) -> Result<&ReleaseSettings> {
        self.release.as_ref().ok_or_else(|| {
            LibrarianError::precondition("Manifest has no 'release' configuration section")
        })
    }
}

/// A manifest as it existed at one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSnapshot {
    pub commit: String,
    pub manifest: Manifest,
}

impl ManifestSnapshot {
    pub fn new(commit: impl Into<String>, manifest: Manifest) -> Self {
        ManifestSnapshot {
            commit: commit.into(),
            manifest,
        }
    }

    /// Parse a snapshot from file content at `commit`; absent content is an empty manifest
    pub fn parse(commit: &str, content: Option<&str>) -> Result<Self> {
        let manifest = Manifest::from_yaml(content.unwrap_or_default()).map_err(|e| {
            LibrarianError::config(format!("Manifest at commit {}: {}", short(commit), e))
        })?;
        Ok(ManifestSnapshot::new(commit, manifest))
    }
}

/// Load the working-tree manifest
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = fs::read_to_string(path).map_err(|e| {
        LibrarianError::config(format!("Cannot read manifest {}: {}", path.display(), e))
    })?;
    Manifest::from_yaml(&content)
}

/// Rewrite the working-tree manifest; committing it is left to the caller
pub fn save_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    manifest.validate()?;
    fs::write(path, manifest.to_yaml()?)?;
    Ok(())
}

/// Abbreviated commit hash for messages
pub fn short(commit: &str) -> &str {
    commit.get(..7).unwrap_or(commit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
language: rust
release:
  ignored_changes:
    - .github/
libraries:
  - name: lib1
    version: 1.0.0
    output: packages/lib1
  - name: lib2
    version: ""
    skip_publish: true
    tag_format: "v{version}"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_yaml(SAMPLE).unwrap();
        assert_eq!(manifest.language, "rust");
        assert_eq!(manifest.libraries.len(), 2);
        assert_eq!(
            manifest.release_settings().unwrap().ignored_changes,
            vec![".github/".to_string()]
        );

        let lib2 = manifest.find("lib2").unwrap();
        assert!(lib2.skip_publish);
        assert!(!lib2.is_released());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let yaml = "libraries:\n  - name: a\n    version: 1.0.0\n  - name: a\n    version: 2.0.0\n";
        let err = Manifest::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate library name"));
    }

    #[test]
    fn test_missing_release_section() {
        let manifest = Manifest::from_yaml("libraries: []").unwrap();
        let err = manifest.release_settings().unwrap_err();
        assert!(matches!(err, LibrarianError::Precondition(_)));
    }

    #[test]
    fn test_require_reports_name() {
        let manifest = Manifest::from_yaml(SAMPLE).unwrap();
        let err = manifest.require("missing-lib").unwrap_err();
        assert!(matches!(err, LibrarianError::LibraryNotFound(ref n) if n == "missing-lib"));
    }

    #[test]
    fn test_empty_content_is_empty_manifest() {
        let snapshot = ManifestSnapshot::parse("abc", None).unwrap();
        assert!(snapshot.manifest.libraries.is_empty());
    }

    #[test]
    fn test_snapshot_parse_error_names_commit() {
        let err = ManifestSnapshot::parse("0123456789abcdef", Some("libraries: [")).unwrap_err();
        assert!(err.to_string().contains("0123456"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("librarian.yaml");
        let mut manifest = Manifest::from_yaml(SAMPLE).unwrap();
        manifest.find_mut("lib1").unwrap().version = "1.1.0".to_string();

        save_manifest(&path, &manifest).unwrap();
        let reloaded = load_manifest(&path).unwrap();
        assert_eq!(reloaded, manifest);
        assert_eq!(reloaded.find("lib1").unwrap().version, "1.1.0");
    }
}
