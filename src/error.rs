use thiserror::Error;

/// Unified error type for librarian operations
#[derive(Error, Debug)]
pub enum LibrarianError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Library not found: {0}")]
    LibraryNotFound(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("No release commit found: {0}")]
    NoReleaseCommit(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Hook error: {0}")]
    Hook(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Manifest parse error: {0}")]
    Manifest(#[from] serde_yaml::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in librarian
pub type Result<T> = std::result::Result<T, LibrarianError>;

impl LibrarianError {
    /// Create a usage error (bad flag combination)
    pub fn usage(msg: impl Into<String>) -> Self {
        LibrarianError::Usage(msg.into())
    }

    /// Create a precondition error (dirty tree, missing release section)
    pub fn precondition(msg: impl Into<String>) -> Self {
        LibrarianError::Precondition(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        LibrarianError::Config(msg.into())
    }

    /// Create a library lookup error for the given library name
    pub fn library_not_found(name: impl Into<String>) -> Self {
        LibrarianError::LibraryNotFound(name.into())
    }

    /// Create a lookup error for a tag, branch or revision
    pub fn lookup(msg: impl Into<String>) -> Self {
        LibrarianError::Lookup(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        LibrarianError::Version(msg.into())
    }

    /// Create a reconstruction error for the requested scope
    pub fn no_release_commit(msg: impl Into<String>) -> Self {
        LibrarianError::NoReleaseCommit(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        LibrarianError::Tag(msg.into())
    }

    /// Create a hook error with context
    pub fn hook(msg: impl Into<String>) -> Self {
        LibrarianError::Hook(msg.into())
    }

    /// Create a cancellation error naming the step that was aborted
    pub fn cancelled(msg: impl Into<String>) -> Self {
        LibrarianError::Cancelled(msg.into())
    }

    /// True when history held no qualifying release transition
    pub fn is_no_release_commit(&self) -> bool {
        matches!(self, LibrarianError::NoReleaseCommit(_))
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            LibrarianError::Usage(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LibrarianError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LibrarianError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_from_yaml() {
        let yaml_err = serde_yaml::from_str::<Vec<String>>("{ not: [a list").unwrap_err();
        let err: LibrarianError = yaml_err.into();
        assert!(err.to_string().starts_with("Manifest parse error"));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (LibrarianError::usage("x"), "Usage error"),
            (LibrarianError::precondition("x"), "Precondition failed"),
            (LibrarianError::library_not_found("x"), "Library not found"),
            (LibrarianError::lookup("x"), "Lookup failed"),
            (LibrarianError::version("x"), "Version error"),
            (LibrarianError::no_release_commit("x"), "No release commit found"),
            (LibrarianError::tag("x"), "Tag error"),
            (LibrarianError::cancelled("x"), "Operation cancelled"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }

    #[test]
    fn test_no_release_commit_is_checkable() {
        assert!(LibrarianError::no_release_commit("lib1").is_no_release_commit());
        assert!(!LibrarianError::version("1.0.0").is_no_release_commit());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(LibrarianError::usage("both --all and a library").exit_code(), 2);
        assert_eq!(LibrarianError::precondition("dirty").exit_code(), 1);
        assert_eq!(LibrarianError::no_release_commit("x").exit_code(), 1);
    }

    #[test]
    fn test_library_name_in_message() {
        let err = LibrarianError::library_not_found("google-cloud-storage");
        assert!(err.to_string().contains("google-cloud-storage"));
    }
}
