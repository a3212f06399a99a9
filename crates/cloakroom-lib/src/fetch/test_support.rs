use super::error::TransportError;
use super::source::{ArtifactResponse, ArtifactSource};
use super::types::{FetchOutcome, FetchRequest};
use super::{FetchError, RetryPolicy};
use crate::progress::{ProgressHandle, ProgressReporter};
use bytes::Bytes;
use futures::stream;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// How the scripted source answers one GET.
#[derive(Clone, Debug)]
pub(crate) enum Reply {
    Body(Vec<u8>),
    /// Advertises zero length, i.e. unknown size
    UnsizedBody(Vec<u8>),
    Status(u16),
    /// Sends `partial` and then drops the connection
    Interrupted { partial: Vec<u8> },
    /// Advertises `advertised` bytes but ends early
    Truncated { body: Vec<u8>, advertised: u64 },
    /// Never answers
    Hang,
}

/// In-memory source. Each URL has a queue of replies; the last one repeats.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(self, url: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into_iter().collect());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    fn next_reply(&self, url: &str) -> Option<Reply> {
        self.calls.lock().unwrap().push(url.to_string());
        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn reset() -> TransportError {
    TransportError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
}

fn respond(
    content_length: Option<u64>,
    items: Vec<Result<Bytes, TransportError>>,
) -> ArtifactResponse {
    ArtifactResponse {
        content_length,
        body: Box::pin(stream::iter(items)),
    }
}

impl ArtifactSource for ScriptedSource {
    async fn get(&self, url: &Url) -> Result<ArtifactResponse, TransportError> {
        let reply = self.next_reply(url.as_str());
        match reply {
            None => Err(TransportError::Status {
                status: 404,
                url: url.to_string(),
            }),
            Some(Reply::Body(body)) => Ok(respond(
                Some(body.len() as u64).filter(|&len| len > 0),
                body.chunks(4)
                    .map(|c| Ok(Bytes::copy_from_slice(c)))
                    .collect(),
            )),
            Some(Reply::UnsizedBody(body)) => Ok(respond(None, vec![Ok(Bytes::from(body))])),
            Some(Reply::Status(status)) => Err(TransportError::Status {
                status,
                url: url.to_string(),
            }),
            Some(Reply::Interrupted { partial }) => Ok(respond(
                None,
                vec![Ok(Bytes::from(partial)), Err(reset())],
            )),
            Some(Reply::Truncated { body, advertised }) => {
                Ok(respond(Some(advertised), vec![Ok(Bytes::from(body))]))
            }
            Some(Reply::Hang) => futures::future::pending().await,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    Started { attempt: u32, total: Option<u64> },
    Advanced(u64),
    Retry { attempt: u32, delay: Duration },
    Finished(&'static str),
}

/// Records every progress callback, keyed by request key.
#[derive(Clone, Default)]
pub(crate) struct RecordingProgress {
    events: Arc<Mutex<Vec<(String, Event)>>>,
}

impl RecordingProgress {
    pub(crate) fn handle(&self, key: &str) -> RecordingHandle {
        RecordingHandle {
            key: key.to_string(),
            events: Arc::clone(&self.events),
        }
    }

    pub(crate) fn events_for(&self, key: &str) -> Vec<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub(crate) fn retry_delays(&self, key: &str) -> Vec<Duration> {
        self.events_for(key)
            .into_iter()
            .filter_map(|e| match e {
                Event::Retry { delay, .. } => Some(delay),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn tracked_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

impl ProgressReporter for RecordingProgress {
    fn track(&self, request: &FetchRequest) -> Box<dyn ProgressHandle> {
        Box::new(self.handle(&request.key))
    }
}

pub(crate) struct RecordingHandle {
    key: String,
    events: Arc<Mutex<Vec<(String, Event)>>>,
}

impl RecordingHandle {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push((self.key.clone(), event));
    }
}

impl ProgressHandle for RecordingHandle {
    fn attempt_started(&mut self, attempt: u32, total_bytes: Option<u64>) {
        self.push(Event::Started {
            attempt,
            total: total_bytes,
        });
    }

    fn advanced(&mut self, bytes: u64) {
        self.push(Event::Advanced(bytes));
    }

    fn retry_scheduled(&mut self, attempt: u32, delay: Duration, _error: &FetchError) {
        self.push(Event::Retry { attempt, delay });
    }

    fn finished(&mut self, outcome: &FetchOutcome) {
        self.push(Event::Finished(match outcome {
            FetchOutcome::Skipped => "skipped",
            FetchOutcome::Succeeded => "succeeded",
            FetchOutcome::Failed(_) => "failed",
        }));
    }
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub(crate) fn request(key: &str, version: &str, destination: &Path) -> FetchRequest {
    FetchRequest {
        key: key.to_string(),
        version: version.to_string(),
        artifact_name: destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        destination_path: destination.to_path_buf(),
        expected_digest: None,
    }
}

pub(crate) fn url_for(request: &FetchRequest) -> String {
    format!(
        "https://github.com/{}/releases/download/{}/{}",
        request.key, request.version, request.artifact_name
    )
}

pub(crate) fn fast_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::from_millis(1),
    }
}
