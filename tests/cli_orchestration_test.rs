use librarian::cli::{BumpArgs, BumpTarget, TagArgs};
use librarian::LibrarianError;

fn bump(library: Option<&str>, all: bool, version: Option<&str>) -> BumpArgs {
    BumpArgs {
        library: library.map(|s| s.to_string()),
        all,
        version: version.map(|s| s.to_string()),
        dry_run: false,
    }
}

#[test]
fn test_bump_args_default_is_invalid() {
    let err = BumpArgs::default().validate().unwrap_err();
    assert!(matches!(err, LibrarianError::Usage(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_bump_args_all_and_library_conflict() {
    let err = bump(Some("lib1"), true, None).validate().unwrap_err();
    assert!(matches!(err, LibrarianError::Usage(_)));
    assert!(err.to_string().contains("lib1"));
}

#[test]
fn test_bump_args_all_and_version_conflict() {
    let err = bump(None, true, Some("1.2.3")).validate().unwrap_err();
    assert!(matches!(err, LibrarianError::Usage(_)));
    assert!(err.to_string().contains("--version"));
}

#[test]
fn test_bump_args_library_trimmed() {
    let target = bump(Some("  lib1 "), false, Some(" 1.2.3 ")).validate().unwrap();
    assert_eq!(
        target,
        BumpTarget::Single {
            library: "lib1".to_string(),
            version: Some("1.2.3".to_string()),
        }
    );
}

#[test]
fn test_bump_args_dry_run_does_not_change_target() {
    let mut args = bump(None, true, None);
    args.dry_run = true;
    assert_eq!(args.validate().unwrap(), BumpTarget::All);
}

#[test]
fn test_tag_args_structure() {
    let args = TagArgs {
        library: Some("storage".to_string()),
        dry_run: true,
    };

    assert_eq!(args.library.as_deref(), Some("storage"));
    assert!(args.dry_run);
    assert_eq!(TagArgs::default().library, None);
}
