use crate::domain::manifest::Manifest;
use crate::error::{LibrarianError, Result};
use crate::version::{validate_override, VersioningOptions};
use tracing::debug;

/// Libraries whose version moved forward between two snapshots of the same manifest.
///
/// Names are returned in the order they appear in `after`. Libraries present only in
/// `before` are ignored. Any illegal transition (a version cleared, a regression, an
/// invalid bootstrap version) fails the whole comparison. `options` are the
/// ecosystem's, so a pre-GA downgrade its overrides allow is also a release here.
pub fn find_released_libraries(
    before: &Manifest,
    after: &Manifest,
    options: VersioningOptions,
) -> Result<Vec<String>> {
    let mut released = Vec::new();

    for library in &after.libraries {
        let invalid = |e: LibrarianError| {
            LibrarianError::version(format!("Library '{}': {}", library.name, e))
        };
        let after_version = library.parsed_version().map_err(invalid)?;
        let before_version = match before.find(&library.name) {
            Some(previous) => previous.parsed_version().map_err(invalid)?,
            None => None,
        };

        match (before_version, after_version) {
            (Some(previous), None) => {
                return Err(LibrarianError::version(format!(
                    "Library '{}' version was cleared (previously {})",
                    library.name, previous
                )));
            }
            (None, None) => {}
            (None, Some(first)) => {
                debug!(library = %library.name, version = %first, "first release");
                released.push(library.name.clone());
            }
            (Some(previous), Some(next)) if previous == next => {}
            (Some(previous), Some(next)) => {
                validate_override(&previous.to_string(), &next.to_string(), options)
                    .map_err(invalid)?;
                debug!(
                    library = %library.name,
                    from = %previous,
                    to = %next,
                    "library released"
                );
                released.push(library.name.clone());
            }
        }
    }

    Ok(released)
}
