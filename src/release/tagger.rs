use crate::domain::manifest::short;
use crate::error::Result;
use crate::git::Repository;
use crate::release::reconstruct::ReleaseCommit;
use tracing::info;

/// One tag to create (or created) for a released library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTag {
    pub library: String,
    pub version: String,
    pub name: String,
    pub commit: String,
}

/// Tags for the libraries released at `release`, narrowed to `filter` when given.
pub fn plan_tags(release: &ReleaseCommit, filter: Option<&str>) -> Result<Vec<PlannedTag>> {
    let manifest = &release.snapshot.manifest;
    release
        .released
        .iter()
        .filter(|name| filter.map(|f| f == name.as_str()).unwrap_or(true))
        .map(|name| {
            let record = manifest.require(name)?;
            Ok(PlannedTag {
                library: record.name.clone(),
                version: record.version.trim().to_string(),
                name: record.release_tag()?,
                commit: release.commit.clone(),
            })
        })
        .collect()
}

/// Create a lightweight tag per planned entry.
///
/// Stops at the first failure; tags already created stay in place. Duplicate names
/// are reported as errors, never retried.
pub fn apply_tags<R: Repository + ?Sized>(repo: &R, tags: &[PlannedTag]) -> Result<()> {
    for tag in tags {
        repo.create_tag(&tag.name, &tag.commit)?;
        info!(tag = %tag.name, commit = short(&tag.commit), "created tag");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::manifest::ManifestSnapshot;
    use crate::git::MockRepository;

    fn release(commit: &str) -> ReleaseCommit {
        let yaml = r#"
libraries:
  - name: lib1
    version: 1.1.0
  - name: storage
    version: 2.0.0
    tag_format: "storage-v{version}"
  - name: quiet
    version: 0.3.0
"#;
        ReleaseCommit {
            commit: commit.to_string(),
            snapshot: ManifestSnapshot::parse(commit, Some(yaml)).unwrap(),
            released: vec!["lib1".to_string(), "storage".to_string()],
        }
    }

    #[test]
    fn test_plan_renders_each_format() {
        let tags = plan_tags(&release("abc"), None).unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["lib1/v1.1.0", "storage-v2.0.0"]);
        assert!(tags.iter().all(|t| t.commit == "abc"));
    }

    #[test]
    fn test_plan_with_filter() {
        let tags = plan_tags(&release("abc"), Some("storage")).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].library, "storage");
        assert_eq!(tags[0].version, "2.0.0");
    }

    #[test]
    fn test_plan_unknown_released_library() {
        let mut release = release("abc");
        release.released.push("ghost".to_string());
        assert!(plan_tags(&release, None).is_err());
    }

    #[test]
    fn test_apply_creates_tags_at_release_commit() {
        let mut repo = MockRepository::new();
        let commit = repo.commit("release", &[("librarian.yaml", Some("x"))]);
        repo.commit("later", &[("lib1/a.rs", Some("y"))]);

        let tags = plan_tags(&release(&commit), None).unwrap();
        apply_tags(&repo, &tags).unwrap();

        assert_eq!(
            repo.tags(),
            vec![
                ("lib1/v1.1.0".to_string(), commit.clone()),
                ("storage-v2.0.0".to_string(), commit),
            ]
        );
    }

    #[test]
    fn test_apply_surfaces_duplicate_tag() {
        let mut repo = MockRepository::new();
        let commit = repo.commit("release", &[("librarian.yaml", Some("x"))]);
        repo.add_tag("storage-v2.0.0", commit.clone());

        let tags = plan_tags(&release(&commit), None).unwrap();
        let err = apply_tags(&repo, &tags).unwrap_err();
        assert!(err.to_string().contains("storage-v2.0.0"));
        assert_eq!(repo.resolve_tag("lib1/v1.1.0").unwrap(), Some(commit));
    }
}
