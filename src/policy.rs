//! Per-ecosystem versioning policy.
//!
//! Policies are resolved once per command from the manifest's `language` and passed
//! down explicitly; nothing here is mutable global state.

use crate::domain::prerelease::{PreRelease, PreReleaseType};
use crate::domain::version::Version;
use crate::error::{LibrarianError, Result};
use crate::version::VersioningOptions;
use std::collections::BTreeMap;

/// What an ecosystem contributes to version derivation
pub trait VersionPolicy: Send + Sync {
    /// Ecosystem identifier as written in the manifest
    fn ecosystem(&self) -> &str;

    fn options(&self) -> VersioningOptions {
        VersioningOptions::default()
    }

    /// Bootstrap version for a library's first stable release
    fn default_stable_version(&self) -> Version {
        Version::new(0, 1, 0)
    }

    /// Label used for preview-channel versions
    fn preview_label(&self) -> PreReleaseType {
        PreReleaseType::Preview
    }

    /// Bootstrap version for a library's first preview release
    fn default_preview_version(&self) -> Result<Version> {
        PreRelease::first(self.preview_label()).apply_to(&self.default_stable_version())
    }
}

/// Policy backed by compiled-in data
#[derive(Debug, Clone)]
pub struct StaticPolicy {
    ecosystem: &'static str,
    options: VersioningOptions,
    stable_default: (u64, u64, u64),
    preview_label: PreReleaseType,
}

impl VersionPolicy for StaticPolicy {
    fn ecosystem(&self) -> &str {
        self.ecosystem
    }

    fn options(&self) -> VersioningOptions {
        self.options
    }

    fn default_stable_version(&self) -> Version {
        let (major, minor, patch) = self.stable_default;
        Version::new(major, minor, patch)
    }

    fn preview_label(&self) -> PreReleaseType {
        self.preview_label.clone()
    }
}

fn builtin_policies() -> Vec<StaticPolicy> {
    let plain = VersioningOptions::default();
    vec![
        StaticPolicy {
            ecosystem: "rust",
            options: VersioningOptions {
                bump_version_core: true,
                downgrade_pre_ga_changes: true,
            },
            stable_default: (0, 1, 0),
            preview_label: PreReleaseType::Preview,
        },
        StaticPolicy {
            ecosystem: "go",
            options: plain,
            stable_default: (0, 1, 0),
            preview_label: PreReleaseType::Preview,
        },
        StaticPolicy {
            ecosystem: "python",
            options: plain,
            stable_default: (0, 1, 0),
            preview_label: PreReleaseType::Preview,
        },
        StaticPolicy {
            ecosystem: "java",
            options: plain,
            stable_default: (0, 1, 0),
            preview_label: PreReleaseType::Preview,
        },
        StaticPolicy {
            ecosystem: "node",
            options: plain,
            stable_default: (0, 1, 0),
            preview_label: PreReleaseType::Preview,
        },
        StaticPolicy {
            ecosystem: "dart",
            options: VersioningOptions {
                bump_version_core: true,
                downgrade_pre_ga_changes: false,
            },
            stable_default: (0, 1, 0),
            preview_label: PreReleaseType::Preview,
        },
        StaticPolicy {
            ecosystem: "dotnet",
            options: plain,
            stable_default: (1, 0, 0),
            preview_label: PreReleaseType::Beta,
        },
    ]
}

/// Lookup table from ecosystem identifier to policy
pub struct PolicyRegistry {
    policies: BTreeMap<String, Box<dyn VersionPolicy>>,
}

impl PolicyRegistry {
    pub fn empty() -> Self {
        PolicyRegistry {
            policies: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in ecosystem
    pub fn builtin() -> Self {
        let mut registry = PolicyRegistry::empty();
        for policy in builtin_policies() {
            registry.register(Box::new(policy));
        }
        registry
    }

    /// Add or replace the policy for its ecosystem
    pub fn register(&mut self, policy: Box<dyn VersionPolicy>) {
        self.policies
            .insert(policy.ecosystem().to_lowercase(), policy);
    }

    pub fn get(&self, ecosystem: &str) -> Result<&dyn VersionPolicy> {
        self.policies
            .get(&ecosystem.trim().to_lowercase())
            .map(|p| p.as_ref())
            .ok_or_else(|| {
                LibrarianError::config(format!(
                    "Unsupported ecosystem '{}' (known: {})",
                    ecosystem,
                    self.ecosystems().join(", ")
                ))
            })
    }

    pub fn ecosystems(&self) -> Vec<&str> {
        self.policies.keys().map(|k| k.as_str()).collect()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
