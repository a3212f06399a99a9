use super::error::{FetchError, ValidationError};
use super::retry::{RetryDecision, RetryState};
use super::source::ArtifactSource;
use super::staging::StagedFile;
use super::types::{FetchOptions, FetchOutcome, FetchRequest};
use super::url::source_url;
use crate::progress::ProgressHandle;
use crate::verification::{Sha256Digest, Verification, verify_file};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// A request that passed validation: everything needed to start downloading.
#[derive(Clone, Debug)]
pub struct PreparedFetch {
    pub url: Url,
    pub digest: Option<Sha256Digest>,
    pub staged: StagedFile,
}

/// Downloads one artifact with retries. Cheap to clone; clones share the
/// underlying source.
pub struct Fetcher<S> {
    source: Arc<S>,
    options: FetchOptions,
}

impl<S> Clone for Fetcher<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            options: self.options.clone(),
        }
    }
}

impl<S: ArtifactSource> Fetcher<S> {
    pub fn new(source: S, options: FetchOptions) -> Self {
        Self::from_shared(Arc::new(source), options)
    }

    pub fn from_shared(source: Arc<S>, options: FetchOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Checks the request and derives its URL, digest and staging paths
    /// without touching the network or the filesystem.
    pub fn prepare(&self, request: &FetchRequest) -> Result<PreparedFetch, ValidationError> {
        let url = source_url(&self.options.host, request)?;
        let digest = request
            .expected_digest
            .as_deref()
            .map(str::parse::<Sha256Digest>)
            .transpose()?;

        Ok(PreparedFetch {
            url,
            digest,
            staged: StagedFile::new(&request.destination_path),
        })
    }

    pub async fn fetch(
        &self,
        cancel: &CancellationToken,
        request: &FetchRequest,
        progress: &mut dyn ProgressHandle,
    ) -> FetchOutcome {
        match self.prepare(request) {
            Ok(prepared) => self.fetch_prepared(cancel, request, &prepared, progress).await,
            Err(error) => FetchOutcome::Failed(error.into()),
        }
    }

    pub async fn fetch_prepared(
        &self,
        cancel: &CancellationToken,
        request: &FetchRequest,
        prepared: &PreparedFetch,
        progress: &mut dyn ProgressHandle,
    ) -> FetchOutcome {
        let mut state = RetryState::new(self.options.retry);

        loop {
            if cancel.is_cancelled() {
                return FetchOutcome::Failed(FetchError::Cancelled);
            }

            let attempt = state.attempt();
            debug!(
                key = %request.key,
                url = %prepared.url,
                attempt = attempt + 1,
                max_attempts = state.max_attempts(),
                "Fetching"
            );

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(FetchError::Cancelled),
                result = self.attempt(prepared, attempt, progress) => result,
            };

            let error = match result {
                Ok(()) => return FetchOutcome::Succeeded,
                Err(error) => error,
            };

            if !error.is_retryable() {
                let _ = prepared.staged.discard().await;
                return FetchOutcome::Failed(error);
            }

            let max_attempts = state.max_attempts();
            let delay = match state.record_failure(error) {
                RetryDecision::RetryAfter { delay, error } => {
                    warn!(
                        key = %request.key,
                        destination = %request.destination_path.display(),
                        attempt = attempt + 1,
                        max_attempts,
                        backoff = ?delay,
                        error = %error,
                        "Attempt failed, retrying"
                    );
                    progress.retry_scheduled(attempt, delay, error);
                    delay
                }
                RetryDecision::GiveUp(error) => return FetchOutcome::Failed(error),
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return FetchOutcome::Failed(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn attempt(
        &self,
        prepared: &PreparedFetch,
        attempt: u32,
        progress: &mut dyn ProgressHandle,
    ) -> Result<(), FetchError> {
        let response = self.source.get(&prepared.url).await?;
        progress.attempt_started(attempt, response.content_length);

        let staged = &prepared.staged;
        staged
            .write(response.body, response.content_length, |bytes| {
                progress.advanced(bytes)
            })
            .await?;

        if let Some(expected) = &prepared.digest {
            let verification = verify_file(staged.partial_path(), expected)
                .await
                .map_err(|source| FetchError::local_io(staged.partial_path(), source))?;

            if let Verification::Mismatch { expected, actual } = verification {
                let _ = staged.discard().await;
                return Err(FetchError::Verification { expected, actual });
            }
        }

        staged.promote().await?;
        Ok(())
    }
}
