use super::error::FetchError;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after the failed attempt `attempt` (0-indexed): `base * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(attempt))
    }
}

#[derive(Debug)]
pub enum RetryDecision<'a> {
    /// Try again after `delay`; `error` is the failure just recorded
    RetryAfter {
        delay: Duration,
        error: &'a FetchError,
    },
    GiveUp(FetchError),
}

/// Per-request retry bookkeeping. Owned by one fetch and dropped with it.
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
    last_error: Option<FetchError>,
    backoff: Option<Duration>,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            last_error: None,
            backoff: None,
        }
    }

    /// The 0-indexed attempt about to run (or running).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn backoff(&self) -> Option<Duration> {
        self.backoff
    }

    /// Records a retryable failure of the current attempt. Returns the delay
    /// before the next attempt, or hands the error back once the attempts are
    /// exhausted.
    pub fn record_failure(&mut self, error: FetchError) -> RetryDecision<'_> {
        if self.attempt + 1 >= self.policy.max_attempts() {
            self.last_error = None;
            self.backoff = None;
            return RetryDecision::GiveUp(error);
        }

        let delay = self.policy.backoff(self.attempt);
        self.attempt += 1;
        self.backoff = Some(delay);
        let error = self.last_error.insert(error);
        RetryDecision::RetryAfter { delay, error }
    }
}
