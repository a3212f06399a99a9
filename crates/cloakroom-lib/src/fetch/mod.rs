mod error;
mod fetcher;
mod orchestrator;
mod retry;
mod source;
mod staging;
mod types;
mod url;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{FetchError, FetchErrorKind, TransportError, ValidationError};
pub use fetcher::{Fetcher, PreparedFetch};
pub use orchestrator::Orchestrator;
pub use retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, RetryDecision, RetryPolicy, RetryState};
pub use source::{ArtifactResponse, ArtifactSource, BodyStream, HttpSource};
pub use staging::{PARTIAL_SUFFIX, StagedFile, StagingError, partial_path_for};
pub use types::{
    AggregateResult, DEFAULT_HOST, FailedFetch, FetchOptions, FetchOutcome, FetchReport,
    FetchRequest,
};
pub use self::url::{RepositoryKey, source_url};
