use super::error::TransportError;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use url::Url;

pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// A successful (2xx) response whose body has not been read yet.
pub struct ArtifactResponse {
    /// Advertised body length. `None` when absent or zero, i.e. unknown.
    pub content_length: Option<u64>,
    pub body: BodyStream,
}

impl std::fmt::Debug for ArtifactResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactResponse")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Where artifact bytes come from.
///
/// Implementations map non-2xx statuses to [`TransportError::Status`] so the
/// fetcher only ever sees a readable body or a retryable error.
pub trait ArtifactSource: Send + Sync {
    fn get(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<ArtifactResponse, TransportError>> + Send;
}

#[derive(Clone, Debug)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub const USER_AGENT: &'static str = concat!("cloakroom/", env!("CARGO_PKG_VERSION"));

    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ArtifactSource for HttpSource {
    async fn get(&self, url: &Url) -> Result<ArtifactResponse, TransportError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_length = response.content_length().filter(|&len| len > 0);
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from));

        Ok(ArtifactResponse {
            content_length,
            body: Box::pin(body),
        })
    }
}
