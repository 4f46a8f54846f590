//! Filesystem helpers for artifact output.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Create `dir` and its parents if missing.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> MediaResult<()> {
    let dir = dir.as_ref();
    if !fs::try_exists(dir).await? {
        fs::create_dir_all(dir).await?;
    }
    Ok(())
}

/// Create the parent directory of `path` if missing.
pub async fn ensure_parent_dir(path: impl AsRef<Path>) -> MediaResult<()> {
    match path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent).await,
        _ => Ok(()),
    }
}

/// Check that an artifact was written and is non-empty.
///
/// Returns the file size in bytes.
pub async fn verify_output(path: impl AsRef<Path>) -> MediaResult<u64> {
    let path = path.as_ref();

    let metadata = match fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    if metadata.len() == 0 {
        return Err(MediaError::EmptyOutput(path.to_path_buf()));
    }

    tracing::debug!(
        "Verified output file: {} ({} bytes)",
        path.display(),
        metadata.len()
    );

    Ok(metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_verify_output() {
        let temp = TempDir::new().unwrap();

        let missing = temp.path().join("missing.jpg");
        assert!(matches!(
            verify_output(&missing).await,
            Err(MediaError::FileNotFound(_))
        ));

        let empty = temp.path().join("empty.jpg");
        fs::write(&empty, b"").await.unwrap();
        assert!(matches!(
            verify_output(&empty).await,
            Err(MediaError::EmptyOutput(_))
        ));

        let good = temp.path().join("poster.jpg");
        fs::write(&good, b"jpeg").await.unwrap();
        assert_eq!(verify_output(&good).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_ensure_parent_dir() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b/poster.jpg");

        ensure_parent_dir(&nested).await.unwrap();
        assert!(temp.path().join("a/b").is_dir());

        // Idempotent
        ensure_parent_dir(&nested).await.unwrap();
    }
}
