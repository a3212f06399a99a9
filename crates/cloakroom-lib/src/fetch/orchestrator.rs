use super::error::{FetchError, ValidationError};
use super::fetcher::Fetcher;
use super::source::ArtifactSource;
use super::types::{AggregateResult, FetchOptions, FetchOutcome, FetchReport, FetchRequest};
use crate::progress::{ProgressReporter, SilentProgress};
use futures::stream::{FuturesUnordered, StreamExt};
use itertools::Itertools;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

enum Disposition {
    Fetch,
    Skip,
}

/// Runs many fetches at once and gathers every outcome.
///
/// Each dispatched request gets its own tokio task. There is no cap unless
/// [`FetchOptions::max_concurrency`] sets a non-zero one.
pub struct Orchestrator<S> {
    fetcher: Fetcher<S>,
    reporter: Arc<dyn ProgressReporter>,
}

impl<S: ArtifactSource + 'static> Orchestrator<S> {
    pub fn new(source: S, options: FetchOptions) -> Self {
        Self::from_fetcher(Fetcher::new(source, options))
    }

    pub fn from_fetcher(fetcher: Fetcher<S>) -> Self {
        Self {
            fetcher,
            reporter: Arc::new(SilentProgress),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub async fn run(
        &self,
        cancel: &CancellationToken,
        requests: Vec<FetchRequest>,
        overwrite: bool,
    ) -> AggregateResult {
        let duplicates: HashSet<PathBuf> = requests
            .iter()
            .map(|r| r.destination_path.clone())
            .duplicates()
            .collect();

        let semaphore = self
            .fetcher
            .options()
            .max_concurrency
            .filter(|&limit| limit > 0)
            .map(|limit| Arc::new(Semaphore::new(limit)));

        let mut outcomes: Vec<(usize, FetchOutcome)> = Vec::with_capacity(requests.len());
        let mut tasks = FuturesUnordered::new();

        for (index, request) in requests.iter().enumerate() {
            let destination = &request.destination_path;

            if duplicates.contains(destination) {
                let error = ValidationError::DuplicateDestination {
                    path: destination.clone(),
                };
                outcomes.push((index, report_early(request, FetchOutcome::Failed(error.into()))));
                continue;
            }

            let prepared = match self.fetcher.prepare(request) {
                Ok(prepared) => prepared,
                Err(error) => {
                    outcomes.push((index, report_early(request, FetchOutcome::Failed(error.into()))));
                    continue;
                }
            };

            match prepare_destination(destination, overwrite).await {
                Ok(Disposition::Fetch) => {}
                Ok(Disposition::Skip) => {
                    outcomes.push((index, report_early(request, FetchOutcome::Skipped)));
                    continue;
                }
                Err(error) => {
                    outcomes.push((index, report_early(request, FetchOutcome::Failed(error))));
                    continue;
                }
            }

            let fetcher = self.fetcher.clone();
            let cancel = cancel.clone();
            let semaphore = semaphore.clone();
            let request = request.clone();
            let mut progress = self.reporter.track(&request);

            let handle = tokio::spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            let outcome = FetchOutcome::Failed(FetchError::Cancelled);
                            progress.finished(&outcome);
                            return outcome;
                        }
                        permit = semaphore.acquire_owned() => permit.ok(),
                    },
                    None => None,
                };

                let outcome = fetcher
                    .fetch_prepared(&cancel, &request, &prepared, progress.as_mut())
                    .await;
                progress.finished(&outcome);
                outcome
            });
            tasks.push(async move { (index, handle.await) });
        }

        debug!(in_flight = tasks.len(), "Waiting for fetches to finish");

        while let Some((index, joined)) = tasks.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => FetchOutcome::Failed(FetchError::Cancelled),
            };
            log_outcome(&requests[index], &outcome);
            outcomes.push((index, outcome));
        }

        outcomes.sort_by_key(|(index, _)| *index);
        let reports = requests
            .into_iter()
            .zip(outcomes)
            .map(|(request, (_, outcome))| FetchReport { request, outcome })
            .collect();

        AggregateResult::new(reports)
    }
}

/// Applies the skip/overwrite policy to an existing destination.
async fn prepare_destination(destination: &Path, overwrite: bool) -> Result<Disposition, FetchError> {
    let metadata = match tokio::fs::symlink_metadata(destination).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Disposition::Fetch),
        Err(e) => return Err(FetchError::local_io(destination, e)),
    };

    if !overwrite {
        return Ok(Disposition::Skip);
    }

    info!(destination = %destination.display(), "Removing existing file");
    let removed = if metadata.is_dir() {
        tokio::fs::remove_dir_all(destination).await
    } else {
        tokio::fs::remove_file(destination).await
    };
    removed.map_err(|e| FetchError::local_io(destination, e))?;
    Ok(Disposition::Fetch)
}

fn report_early(request: &FetchRequest, outcome: FetchOutcome) -> FetchOutcome {
    log_outcome(request, &outcome);
    outcome
}

fn log_outcome(request: &FetchRequest, outcome: &FetchOutcome) {
    let key = &request.key;
    let destination = request.destination_path.display();
    match outcome {
        FetchOutcome::Skipped => {
            info!(%key, %destination, "Already present, skipping (use --force to overwrite)")
        }
        FetchOutcome::Succeeded => info!(%key, %destination, "Downloaded"),
        FetchOutcome::Failed(error) => warn!(%key, %destination, %error, "Fetch failed"),
    }
}
