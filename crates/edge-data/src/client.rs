//! Platform fetch client with dependency tagging.

use std::time::Duration;

use edge_core::RequestId;
use url::Url;

use crate::dependency::DependencyTag;
use crate::timeout::{with_timeout, Timer};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Default cap on buffered response bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Error type for fetch operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Response body of {size} bytes exceeds limit of {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Per-fetch policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Upper bound on the whole exchange. `None` leaves bounding to the caller.
    pub timeout: Option<Duration>,
}

impl FetchPolicy {
    /// Policy using a dependency tag's default timeout.
    pub fn from_tag(tag: DependencyTag) -> Self {
        Self {
            timeout: Some(tag.default_timeout()),
        }
    }

    /// Policy without a timeout, for callers that race the fetch themselves.
    pub fn unbounded() -> Self {
        Self { timeout: None }
    }
}

/// Platform-controlled fetch client.
///
/// Wraps a [`Transport`] with request ID propagation, per-dependency
/// timeouts and a response size cap.
pub struct FetchClient<T, M> {
    transport: T,
    timer: M,
    request_id: RequestId,
    max_body_bytes: usize,
}

impl<T: Transport, M: Timer> FetchClient<T, M> {
    /// Create a new fetch client.
    pub fn new(transport: T, timer: M, request_id: RequestId) -> Self {
        Self {
            transport,
            timer,
            request_id,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Set the response size cap.
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Send a request bounded by the tag's default timeout.
    pub async fn send(
        &self,
        request: HttpRequest,
        tag: DependencyTag,
    ) -> Result<HttpResponse, FetchError> {
        self.send_with_policy(request, tag, FetchPolicy::from_tag(tag))
            .await
    }

    /// Send a request with an explicit policy.
    pub async fn send_with_policy(
        &self,
        request: HttpRequest,
        tag: DependencyTag,
        policy: FetchPolicy,
    ) -> Result<HttpResponse, FetchError> {
        let request = request.header("x-request-id", self.request_id.to_string());

        let response = match policy.timeout {
            Some(limit) => with_timeout(&self.timer, limit, self.transport.send(request))
                .await
                .map_err(|e| FetchError::Timeout(format!("{}: {}", tag, e)))??,
            None => self.transport.send(request).await?,
        };

        if response.body.len() > self.max_body_bytes {
            return Err(FetchError::TooLarge {
                size: response.body.len(),
                limit: self.max_body_bytes,
            });
        }

        Ok(response)
    }

    /// GET a URL and return its body as text. Non-2xx statuses are errors.
    pub async fn get_text(&self, url: &Url, tag: DependencyTag) -> Result<String, FetchError> {
        let response = self.send(HttpRequest::get(url.clone()), tag).await?;
        if !response.is_success() {
            return Err(FetchError::Http {
                status: response.status,
                url: url.to_string(),
            });
        }
        response.text().map(str::to_string)
    }

    /// Get the request ID.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }
}
