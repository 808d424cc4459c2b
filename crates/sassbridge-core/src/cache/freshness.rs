use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::error::{BridgeError, Result};

/// Modification time of `path` in milliseconds since the Unix epoch.
///
/// Files dated before the epoch contribute zero.
pub fn mtime_millis(path: &Path) -> Result<u128> {
    let metadata = std::fs::metadata(path).map_err(|source| BridgeError::io(path, source))?;
    let modified = metadata
        .modified()
        .map_err(|source| BridgeError::io(path, source))?;

    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default())
}

/// Sum of modification times over the primary file, every dependency, and
/// every extra root.
///
/// Order never matters and duplicates merely double-count, so the value is
/// only meaningful relative to another fingerprint over the same paths. A
/// missing path fails the whole computation; the error carries that path.
pub fn fingerprint(
    primary: &Path,
    dependencies: &[PathBuf],
    extra_roots: &[PathBuf],
) -> Result<u128> {
    let mut total = mtime_millis(primary)?;
    for path in dependencies.iter().chain(extra_roots.iter()) {
        total += mtime_millis(path)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_of_single_file_is_its_mtime() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("app.scss");
        std::fs::write(&file, ".a {}").unwrap();

        let expected = mtime_millis(&file).unwrap();
        assert_eq!(fingerprint(&file, &[], &[]).unwrap(), expected);
    }

    #[test]
    fn test_fingerprint_sums_dependencies_and_roots() {
        let dir = TempDir::new().unwrap();
        let primary = dir.path().join("app.scss");
        let dep = dir.path().join("button.scss");
        let root = dir.path().join("lib");
        std::fs::write(&primary, ".a {}").unwrap();
        std::fs::write(&dep, ".b {}").unwrap();
        std::fs::create_dir(&root).unwrap();

        let expected = mtime_millis(&primary).unwrap()
            + mtime_millis(&dep).unwrap()
            + mtime_millis(&root).unwrap();
        let total = fingerprint(&primary, &[dep], &[root]).unwrap();
        assert_eq!(total, expected);
    }

    #[test]
    fn test_duplicate_paths_double_count() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("app.scss");
        std::fs::write(&file, ".a {}").unwrap();

        let single = fingerprint(&file, &[], &[]).unwrap();
        let doubled = fingerprint(&file, &[file.clone()], &[]).unwrap();
        assert_eq!(doubled, single * 2);
    }

    #[test]
    fn test_missing_primary_is_io_error_with_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.scss");

        match fingerprint(&missing, &[], &[]) {
            Err(BridgeError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_dependency_is_io_error() {
        let dir = TempDir::new().unwrap();
        let primary = dir.path().join("app.scss");
        std::fs::write(&primary, ".a {}").unwrap();
        let missing = dir.path().join("vanished.scss");

        let result = fingerprint(&primary, &[missing.clone()], &[]);
        match result {
            Err(BridgeError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_directory_roots_participate() {
        let dir = TempDir::new().unwrap();
        let primary = dir.path().join("app.scss");
        std::fs::write(&primary, ".a {}").unwrap();

        let without = fingerprint(&primary, &[], &[]).unwrap();
        let with = fingerprint(&primary, &[], &[dir.path().to_path_buf()]).unwrap();
        assert!(with > without);
    }
}
