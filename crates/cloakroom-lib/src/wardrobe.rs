//! Housekeeping for the directory artifacts are restored into.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum WardrobeError {
    #[error("Wardrobe {} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("Wardrobe {} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read wardrobe {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Removes everything inside `dir` but keeps `dir` itself. Returns the number
/// of entries removed.
pub async fn clean_wardrobe(dir: &Path) -> Result<usize, WardrobeError> {
    let metadata = match tokio::fs::metadata(dir).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(WardrobeError::NotFound {
                path: dir.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(WardrobeError::Read {
                path: dir.to_path_buf(),
                source,
            });
        }
    };
    if !metadata.is_dir() {
        return Err(WardrobeError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let read_err = |source| WardrobeError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(read_err)?;
        let result = if file_type.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        result.map_err(|source| WardrobeError::Remove {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Removed");
        removed += 1;
    }

    info!(wardrobe = %dir.display(), removed, "Cleaned wardrobe");
    Ok(removed)
}

/// Deletes one restored artifact. A file that is already gone only earns a
/// warning; returns whether anything was deleted.
pub async fn purge_artifact(path: &Path) -> Result<bool, WardrobeError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!(path = %path.display(), "Purged artifact");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Artifact not present, nothing to purge");
            Ok(false)
        }
        Err(source) => Err(WardrobeError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_clean_empties_but_keeps_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.jar"), b"a").unwrap();
        std::fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        std::fs::write(dir.path().join("nested/deeper/b.jar"), b"b").unwrap();

        let removed = clean_wardrobe(dir.path()).await.unwrap();

        assert_eq!(removed, 2);
        assert!(dir.path().is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_clean_rejects_missing_or_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            clean_wardrobe(&missing).await,
            Err(WardrobeError::NotFound { .. })
        ));

        let file = dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            clean_wardrobe(&file).await,
            Err(WardrobeError::NotADirectory { .. })
        ));
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_purge() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("widget.jar");
        std::fs::write(&artifact, b"w").unwrap();

        assert!(purge_artifact(&artifact).await.unwrap());
        assert!(!artifact.exists());
        assert!(!purge_artifact(&artifact).await.unwrap());
    }
}
