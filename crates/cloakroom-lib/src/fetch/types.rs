use super::error::{FetchError, FetchErrorKind};
use super::retry::RetryPolicy;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "github.com";

/// One artifact to place on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    /// Source repository as `owner/repo`
    pub key: String,
    /// Release tag, or [`FetchRequest::LATEST`]
    pub version: String,
    /// File name of the release asset
    pub artifact_name: String,
    /// Where the artifact must end up
    pub destination_path: PathBuf,
    /// Hex SHA-256 of the artifact; `None` skips verification
    pub expected_digest: Option<String>,
}

impl FetchRequest {
    /// Version sentinel selecting the most recent release.
    pub const LATEST: &'static str = "latest";

    pub fn is_latest(&self) -> bool {
        self.version == Self::LATEST
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    /// Destination already present and overwriting was not requested
    Skipped,
    Succeeded,
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<FetchErrorKind> {
        self.error().map(FetchError::kind)
    }
}

#[derive(Debug)]
pub struct FetchReport {
    pub request: FetchRequest,
    pub outcome: FetchOutcome,
}

/// The failure surfaced to callers that only want a single error.
#[derive(Error, Debug)]
#[error("Failed to fetch {key} -> {}: {source}", destination.display())]
pub struct FailedFetch {
    pub key: String,
    pub destination: PathBuf,
    pub source: FetchError,
}

/// Outcomes of one orchestrator run, in request order.
#[derive(Debug, Default)]
pub struct AggregateResult {
    reports: Vec<FetchReport>,
}

impl AggregateResult {
    pub fn new(reports: Vec<FetchReport>) -> Self {
        Self { reports }
    }

    pub fn reports(&self) -> &[FetchReport] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<FetchReport> {
        self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        self.reports.iter().any(|r| r.outcome.is_failure())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FetchReport> {
        self.reports.iter().filter(|r| r.outcome.is_failure())
    }

    pub fn succeeded(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, FetchOutcome::Succeeded))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, FetchOutcome::Skipped))
            .count()
    }

    pub fn first_failure(&self) -> Option<&FetchReport> {
        self.failures().next()
    }

    /// Collapses the run into the first failure, if any.
    pub fn into_result(self) -> Result<(), FailedFetch> {
        match self
            .reports
            .into_iter()
            .find(|r| r.outcome.is_failure())
        {
            Some(FetchReport {
                request,
                outcome: FetchOutcome::Failed(source),
            }) => Err(FailedFetch {
                key: request.key,
                destination: request.destination_path,
                source,
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FetchOptions {
    /// Release host, either a bare authority or a base URL with a scheme
    pub host: String,
    pub retry: RetryPolicy,
    /// Upper bound on simultaneous fetches; `None` or `Some(0)` runs everything at once
    pub max_concurrency: Option<usize>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            retry: RetryPolicy::default(),
            max_concurrency: None,
        }
    }
}
