//! Filesystem helpers for pipeline working directories.

use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

use crate::error::MediaResult;

/// Create a directory if it does not exist yet.
///
/// "Already exists" is success. The parent must exist: callers build their
/// working tree top-down, and the gateway itself never creates directories.
pub async fn ensure_dir(path: impl AsRef<Path>) -> MediaResult<()> {
    match fs::create_dir(path.as_ref()).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ensure_dir_creates_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("work");

        ensure_dir(&target).await.unwrap();
        assert!(target.is_dir());

        // second call is a no-op, not an error
        ensure_dir(&target).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_dir_missing_parent_is_fatal() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("missing").join("work");

        assert!(ensure_dir(&target).await.is_err());
    }
}
