use crate::domain::{ChangeLevel, ConventionalCommitRecord};

/// Change level of a single commit.
///
/// Nested commits come from bulk regeneration sweeps, so they never produce more
/// than a minor bump even when marked breaking.
pub fn classify_commit(commit: &ConventionalCommitRecord) -> ChangeLevel {
    if commit.is_breaking {
        return if commit.is_nested {
            ChangeLevel::Minor
        } else {
            ChangeLevel::Major
        };
    }

    match commit.r#type.as_str() {
        "feat" => ChangeLevel::Minor,
        "fix" => ChangeLevel::Patch,
        _ => ChangeLevel::None,
    }
}

/// Highest change level over a set of commits; `None` for an empty set.
pub fn classify<'a, I>(commits: I) -> ChangeLevel
where
    I: IntoIterator<Item = &'a ConventionalCommitRecord>,
{
    commits
        .into_iter()
        .map(classify_commit)
        .max()
        .unwrap_or(ChangeLevel::None)
}
