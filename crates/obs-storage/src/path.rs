//! Mapping object keys onto files inside a bucket directory.
//!
//! Resolution is purely lexical. A separate walk rejects symlinks so a
//! key cannot escape the bucket through a link planted on disk.

use std::path::{Component, Path, PathBuf};

use crate::error::{StorageError, StorageResult};

/// Lexically resolves an object key against a bucket directory.
///
/// Does not touch the filesystem. Rejects absolute keys, keys that climb
/// above the bucket with `..`, and keys that name the bucket itself.
///
/// # Errors
///
/// Returns [`StorageError::PathViolation`] for any of the above.
pub fn resolve_object_path(bucket_root: &Path, key: &str) -> StorageResult<PathBuf> {
    let req = Path::new(key);

    if req.is_absolute() {
        return Err(StorageError::PathViolation(
            "absolute object keys are not allowed".into(),
        ));
    }

    let mut resolved = bucket_root.to_path_buf();

    for component in req.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(StorageError::PathViolation(
                    "prefix or root components are not allowed".into(),
                ));
            },
            Component::CurDir => {},
            Component::ParentDir => {
                if resolved == bucket_root {
                    return Err(StorageError::PathViolation(
                        "object key climbs above the bucket".into(),
                    ));
                }
                resolved.pop();
            },
            Component::Normal(p) => {
                resolved.push(p);
            },
        }
    }

    if resolved == bucket_root {
        return Err(StorageError::PathViolation(
            "object key must name a file inside the bucket".into(),
        ));
    }

    Ok(resolved)
}

/// Reject the path if any existing component between `bucket_root` and
/// `target` is a symlink.
///
/// # Errors
///
/// Returns [`StorageError::PathViolation`] on a symlink, or
/// [`StorageError::Io`] if metadata cannot be read.
pub(crate) async fn reject_symlinks(bucket_root: &Path, target: &Path) -> StorageResult<()> {
    let Ok(relative) = target.strip_prefix(bucket_root) else {
        return Err(StorageError::PathViolation(
            "object path is outside the bucket".into(),
        ));
    };

    let mut current = bucket_root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        match tokio::fs::symlink_metadata(&current).await {
            Ok(meta) if meta.is_symlink() => {
                return Err(StorageError::PathViolation(
                    "symlinks are not allowed inside buckets".into(),
                ));
            },
            Ok(_) => {},
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_key() {
        let base = Path::new("/srv/obs/photos");
        let res = resolve_object_path(base, "2026/cat.jpg").unwrap();
        assert_eq!(res, Path::new("/srv/obs/photos/2026/cat.jpg"));
    }

    #[test]
    fn test_inner_parent_allowed() {
        let base = Path::new("/srv/obs/photos");
        let res = resolve_object_path(base, "a/./../b.txt").unwrap();
        assert_eq!(res, Path::new("/srv/obs/photos/b.txt"));
    }

    #[test]
    fn test_traversal_blocked() {
        let base = Path::new("/srv/obs/photos");
        for key in ["../other/x", "a/../../x", "/etc/passwd", "", ".", "a/.."] {
            assert!(
                matches!(
                    resolve_object_path(base, key),
                    Err(StorageError::PathViolation(_))
                ),
                "{key:?} should be rejected"
            );
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().join("photos");
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&bucket).unwrap();
        std::fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, bucket.join("link")).unwrap();

        let target = resolve_object_path(&bucket, "link/file.txt").unwrap();
        assert!(matches!(
            reject_symlinks(&bucket, &target).await,
            Err(StorageError::PathViolation(_))
        ));

        let target = resolve_object_path(&bucket, "plain/file.txt").unwrap();
        assert!(reject_symlinks(&bucket, &target).await.is_ok());
    }
}
