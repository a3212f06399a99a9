use super::error::{FetchError, TransportError};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

pub const PARTIAL_SUFFIX: &str = ".partial";

#[derive(Error, Debug)]
pub enum StagingError {
    #[error(transparent)]
    Body(#[from] TransportError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<StagingError> for FetchError {
    fn from(error: StagingError) -> Self {
        match error {
            StagingError::Body(e) => FetchError::Transport(e),
            StagingError::Io { path, source } => FetchError::LocalIo { path, source },
        }
    }
}

/// `<destination>.partial`, next to the destination so the final rename never
/// crosses a filesystem.
pub fn partial_path_for(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// A destination written through a temporary sibling and renamed into place.
///
/// The destination is only ever touched by [`StagedFile::promote`], so it is
/// either unchanged or complete.
#[derive(Clone, Debug)]
pub struct StagedFile {
    destination: PathBuf,
    partial: PathBuf,
}

impl StagedFile {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        let destination = destination.into();
        let partial = partial_path_for(&destination);
        Self {
            destination,
            partial,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn partial_path(&self) -> &Path {
        &self.partial
    }

    /// Removes the temporary file. A missing file is not an error.
    pub async fn discard(&self) -> io::Result<()> {
        match tokio::fs::remove_file(&self.partial).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Streams `body` into the temporary file, replacing any leftover from an
    /// earlier attempt. `on_chunk` sees the size of every chunk written.
    ///
    /// When `expected_len` is known, a shorter body is a transport failure.
    /// On any error the temporary file is removed.
    pub async fn write<S, F>(
        &self,
        body: S,
        expected_len: Option<u64>,
        on_chunk: F,
    ) -> Result<u64, StagingError>
    where
        S: Stream<Item = Result<Bytes, TransportError>> + Unpin,
        F: FnMut(u64),
    {
        let result = self.write_inner(body, expected_len, on_chunk).await;
        if result.is_err() {
            let _ = self.discard().await;
        }
        result
    }

    async fn write_inner<S, F>(
        &self,
        mut body: S,
        expected_len: Option<u64>,
        mut on_chunk: F,
    ) -> Result<u64, StagingError>
    where
        S: Stream<Item = Result<Bytes, TransportError>> + Unpin,
        F: FnMut(u64),
    {
        if let Some(parent) = self.destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StagingError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let io_err = |source| StagingError::Io {
            path: self.partial.clone(),
            source,
        };

        self.discard().await.map_err(io_err)?;
        let file = tokio::fs::File::create(&self.partial)
            .await
            .map_err(io_err)?;
        let mut writer = tokio::io::BufWriter::new(file);

        let mut received = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await.map_err(io_err)?;
            received += chunk.len() as u64;
            on_chunk(chunk.len() as u64);
        }

        if let Some(expected) = expected_len {
            if received < expected {
                return Err(TransportError::Truncated { expected, received }.into());
            }
        }

        writer.flush().await.map_err(io_err)?;
        writer.get_ref().sync_all().await.map_err(io_err)?;
        Ok(received)
    }

    /// Atomically renames the temporary file onto the destination.
    pub async fn promote(&self) -> Result<(), StagingError> {
        tokio::fs::rename(&self.partial, &self.destination)
            .await
            .map_err(|source| StagingError::Io {
                path: self.destination.clone(),
                source,
            })
    }
}
